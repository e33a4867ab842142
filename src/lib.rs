pub mod app;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod progress;
pub mod session;
pub mod state;
pub mod trend;
pub mod ui;
pub mod view;

pub use app::router;
pub use config::Settings;
pub use state::AppState;

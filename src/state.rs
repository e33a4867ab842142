use crate::client::{HttpTrendingApi, TrendingApi};
use crate::config::Settings;
use crate::dashboard::{Dashboard, DashboardSettings};
use crate::session::CredentialStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<Dashboard>,
}

impl AppState {
    pub fn new(settings: &Settings) -> Result<Self, reqwest::Error> {
        let api = HttpTrendingApi::new(settings.api_base_url.clone(), settings.request_timeout)?;
        Ok(Self::with_api(Arc::new(api), settings))
    }

    pub fn with_api(api: Arc<dyn TrendingApi>, settings: &Settings) -> Self {
        let dashboard = Dashboard::new(
            api,
            CredentialStore::in_memory(),
            DashboardSettings {
                poll_interval: settings.poll_interval,
                history_depth: settings.history_depth,
            },
        );
        Self {
            dashboard: Arc::new(dashboard),
        }
    }
}

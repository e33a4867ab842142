use axum::http::StatusCode;
use thiserror::Error;

pub const LOGIN_REQUIRED: &str = "Please log in as administrator first";
pub const RELOGIN_REQUIRED: &str = "Please log in again to continue";

/// Failures of a call against the upstream trending backend, or of a
/// privileged action that was refused before reaching it.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("not authenticated")]
    Unauthorized,
    #[error("{detail}")]
    Http { status: u16, detail: String },
    #[error("{0}")]
    Application(String),
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("no admin session")]
    NotLoggedIn,
    #[error("stored credentials have no password")]
    MissingPassword,
    #[error("no records selected")]
    EmptySelection,
}

impl ClientError {
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            ClientError::Unauthorized | ClientError::NotLoggedIn | ClientError::MissingPassword
        )
    }
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: message.into(),
        }
    }

    /// Wraps a client failure with the action it interrupted, e.g. "Delete failed: ...".
    pub fn from_client(action: &str, err: ClientError) -> Self {
        match err {
            ClientError::Unauthorized | ClientError::NotLoggedIn => {
                Self::unauthorized(LOGIN_REQUIRED)
            }
            ClientError::MissingPassword => Self::unauthorized(RELOGIN_REQUIRED),
            ClientError::EmptySelection => Self::bad_request("Select the records to delete"),
            ClientError::Transport(_) => Self {
                status: StatusCode::BAD_GATEWAY,
                message: format!("{action} failed, please try again later"),
            },
            other => Self {
                status: StatusCode::BAD_GATEWAY,
                message: format!("{action} failed: {other}"),
            },
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}

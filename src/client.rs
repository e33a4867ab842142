//! Reqwest-backed client for the upstream trending backend. Statuses and
//! envelopes are mapped into `ClientError` so callers only branch on kinds.

use crate::errors::ClientError;
use crate::models::{
    ActionResponse, ApiEnvelope, Credential, HistoryEntry, ProgressState, Report, Statistics,
};
use async_trait::async_trait;
use reqwest::{header, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

#[async_trait]
pub trait ProgressSource: Send + Sync {
    async fn fetch_progress(&self) -> Result<ProgressState, ClientError>;
}

#[async_trait]
pub trait TrendingApi: ProgressSource {
    async fn latest(&self) -> Result<Report, ClientError>;
    async fn history(&self) -> Result<Vec<HistoryEntry>, ClientError>;
    async fn weekly_report(&self, id: i64) -> Result<Report, ClientError>;
    async fn report_by_id(&self, id: i64) -> Result<Report, ClientError>;
    async fn report_for_week(&self, year: i32, week: u32) -> Result<Report, ClientError>;
    async fn statistics(&self) -> Result<Statistics, ClientError>;
    async fn login(&self, username: &str, password: &str) -> Result<(), ClientError>;
    async fn trigger_update(&self, credential: &Credential) -> Result<Option<String>, ClientError>;
    async fn delete_report(&self, id: i64, credential: &Credential) -> Result<(), ClientError>;
}

pub struct HttpTrendingApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTrendingApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn fresh_get(&self, path: &str) -> RequestBuilder {
        self.client
            .get(self.url(path))
            .query(&[("_", chrono::Utc::now().timestamp_millis())])
            .header(header::CACHE_CONTROL, "no-cache")
    }

    fn with_credential(&self, method: Method, path: &str, credential: &Credential) -> RequestBuilder {
        self.client.request(method, self.url(path)).json(credential)
    }

    async fn send(request: RequestBuilder) -> Result<Response, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        debug!(url = %response.url(), status = status.as_u16(), "upstream response");
        if status == StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Http {
                status: status.as_u16(),
                detail: failure_detail(status, &body),
            });
        }
        Ok(response)
    }

    async fn envelope<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ClientError> {
        let response = Self::send(request).await?;
        let bytes = response.bytes().await?;
        let envelope: ApiEnvelope<T> =
            serde_json::from_slice(&bytes).map_err(|err| ClientError::Decode(err.to_string()))?;
        unwrap_envelope(envelope)
    }
}

fn unwrap_envelope<T>(envelope: ApiEnvelope<T>) -> Result<T, ClientError> {
    if !envelope.success {
        return Err(ClientError::Application(
            envelope
                .error
                .or(envelope.message)
                .unwrap_or_else(|| "unknown error".to_string()),
        ));
    }
    envelope
        .data
        .ok_or_else(|| ClientError::Decode("missing data field".to_string()))
}

/// Best human-readable reason from a failed response body.
pub fn failure_detail(status: StatusCode, body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|value| {
            ["detail", "message", "error"]
                .iter()
                .find_map(|key| value.get(*key).and_then(Value::as_str))
        })
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

#[async_trait]
impl ProgressSource for HttpTrendingApi {
    async fn fetch_progress(&self) -> Result<ProgressState, ClientError> {
        let response = Self::send(self.fresh_get("/api/update/trending/update/progress")).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|err| ClientError::Decode(err.to_string()))
    }
}

#[async_trait]
impl TrendingApi for HttpTrendingApi {
    async fn latest(&self) -> Result<Report, ClientError> {
        Self::envelope(self.fresh_get("/api/trending/latest")).await
    }

    async fn history(&self) -> Result<Vec<HistoryEntry>, ClientError> {
        Self::envelope(self.fresh_get("/api/trending/history")).await
    }

    async fn weekly_report(&self, id: i64) -> Result<Report, ClientError> {
        Self::envelope(self.fresh_get(&format!("/api/trending/weekly/{id}"))).await
    }

    async fn report_by_id(&self, id: i64) -> Result<Report, ClientError> {
        Self::envelope(self.fresh_get(&format!("/api/trending/id/{id}"))).await
    }

    async fn report_for_week(&self, year: i32, week: u32) -> Result<Report, ClientError> {
        Self::envelope(self.fresh_get(&format!("/api/trending/{year}/{week}"))).await
    }

    async fn statistics(&self) -> Result<Statistics, ClientError> {
        Self::envelope(self.fresh_get("/api/trending/statistics")).await
    }

    async fn login(&self, username: &str, password: &str) -> Result<(), ClientError> {
        let body = serde_json::json!({ "username": username, "password": password });
        Self::send(self.client.post(self.url("/api/auth/login")).json(&body)).await?;
        Ok(())
    }

    async fn trigger_update(&self, credential: &Credential) -> Result<Option<String>, ClientError> {
        let request = self.with_credential(Method::POST, "/api/update/trending/update", credential);
        let response = Self::send(request).await?;
        let bytes = response.bytes().await?;
        let body: ActionResponse =
            serde_json::from_slice(&bytes).map_err(|err| ClientError::Decode(err.to_string()))?;
        if body.success {
            Ok(body.message)
        } else {
            Err(ClientError::Application(
                body.message
                    .or(body.error)
                    .unwrap_or_else(|| "unknown error".to_string()),
            ))
        }
    }

    async fn delete_report(&self, id: i64, credential: &Credential) -> Result<(), ClientError> {
        let path = format!("/api/trending/id/{id}");
        let response = Self::send(self.with_credential(Method::DELETE, &path, credential)).await?;
        let bytes = response.bytes().await?;
        let body: ActionResponse =
            serde_json::from_slice(&bytes).map_err(|err| ClientError::Decode(err.to_string()))?;
        if body.success {
            Ok(())
        } else {
            Err(ClientError::Application(
                body.error
                    .or(body.message)
                    .unwrap_or_else(|| "unknown error".to_string()),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_detail_prefers_detail_field() {
        let body = r#"{"detail":"crawler script failed","message":"ignored"}"#;
        assert_eq!(
            failure_detail(StatusCode::INTERNAL_SERVER_ERROR, body),
            "crawler script failed"
        );
    }

    #[test]
    fn failure_detail_falls_back_to_status() {
        assert_eq!(failure_detail(StatusCode::BAD_GATEWAY, "<html>"), "HTTP 502");
        assert_eq!(failure_detail(StatusCode::NOT_FOUND, r#"{"other":1}"#), "HTTP 404");
    }

    #[test]
    fn unsuccessful_envelope_surfaces_server_error() {
        let envelope: ApiEnvelope<Report> =
            serde_json::from_str(r#"{"success":false,"error":"no report yet"}"#).unwrap();
        match unwrap_envelope(envelope) {
            Err(ClientError::Application(message)) => assert_eq!(message, "no report yet"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn successful_envelope_yields_data() {
        let envelope: ApiEnvelope<Vec<HistoryEntry>> = serde_json::from_str(
            r#"{"success":true,"data":[{"id":4,"week_start":"2026-01-05","report_title":"W2"}]}"#,
        )
        .unwrap();
        let history = unwrap_envelope(envelope).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, 4);
    }
}

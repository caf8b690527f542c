use crate::config::Config;
use crate::error::AppError;
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Blocking HTTP client bound to the backend base URL.
///
/// Endpoint modules build requests through the per-verb helpers and push the
/// responses through `send`, which owns the error-envelope handling.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AppError::network(err.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Self::new(
            &config.api_url(),
            Duration::from_secs(config.timeout_secs()),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.http.get(self.url(path))
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.http.post(self.url(path))
    }

    pub fn put(&self, path: &str) -> RequestBuilder {
        self.http.put(self.url(path))
    }

    pub fn patch(&self, path: &str) -> RequestBuilder {
        self.http.patch(self.url(path))
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.http.delete(self.url(path))
    }
}

/// Issue the request and map any non-success outcome to an error.
///
/// The UI-facing message comes from the response envelope (or `fallback`);
/// the status code itself is only distinguished in logs, except that 401
/// surfaces as `Unauthorized` so callers can react to a rejected session.
pub fn send(builder: RequestBuilder, fallback: &str) -> Result<Response, AppError> {
    let response = builder.send().map_err(|err| {
        tracing::debug!(error = %err, "transport failure");
        AppError::network(fallback)
    })?;

    let status = response.status();
    if status.is_success() {
        tracing::debug!(status = status.as_u16(), "request succeeded");
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    let message = error_message(&body, fallback);

    if status == StatusCode::UNAUTHORIZED {
        tracing::warn!(status = status.as_u16(), %message, "authentication rejected");
        return Err(AppError::unauthorized(message));
    }

    tracing::debug!(status = status.as_u16(), %message, "request rejected");
    Err(AppError::api(status.as_u16(), message))
}

pub fn decode<T: DeserializeOwned>(response: Response) -> Result<T, AppError> {
    response
        .json()
        .map_err(|err| AppError::invalid_data(err.to_string()))
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// The backend answers with either `{"error": {"message": ...}}` or
/// `{"detail": {"message": ...}}` depending on the failing layer; both are
/// checked, in that order, before giving up on the body.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<ErrorBody>,
    #[serde(default)]
    detail: Option<ErrorBody>,
}

/// Pull a human-readable message out of the error envelope. Bodies that do
/// not match a recognized envelope shape yield the fallback.
fn error_message(body: &str, fallback: &str) -> String {
    let envelope: ErrorEnvelope = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(_) => return fallback.to_string(),
    };

    [envelope.error, envelope.detail]
        .into_iter()
        .flatten()
        .filter_map(|body| body.message)
        .find(|message| !message.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

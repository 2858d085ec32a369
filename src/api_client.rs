// src/api_client.rs
// Thin JSON HTTP client for the chat backend. Non-2xx responses become HttpError.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ClientConfig;

/// A non-successful HTTP response.
///
/// `data` is the response body parsed as JSON, or an empty object when the
/// body was not JSON.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("HTTP Error: {status} {status_text}")]
pub struct HttpError {
    pub status: u16,
    pub status_text: String,
    pub data: Value,
}

impl HttpError {
    pub fn new(status: StatusCode, data: Value) -> Self {
        Self {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            data,
        }
    }

    /// Best-effort human message from the error body.
    ///
    /// Looks at `message`, then `detail.message`, then a string `detail`.
    /// Anything that is not a string is ignored.
    pub fn message(&self) -> Option<&str> {
        self.data
            .get("message")
            .and_then(Value::as_str)
            .or_else(|| {
                self.data
                    .get("detail")
                    .and_then(|detail| detail.get("message"))
                    .and_then(Value::as_str)
            })
            .or_else(|| self.data.get("detail").and_then(Value::as_str))
            .filter(|msg| !msg.trim().is_empty())
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error("Network error: {0}")]
    Transport(String),
    #[error("Failed to decode response: {0}")]
    Decode(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// Whether retrying the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Transport(_) => true,
            ApiError::Http(err) => err.status >= 500 || err.status == 408 || err.status == 429,
            ApiError::Decode(_) | ApiError::InvalidRequest(_) => false,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http(err) => Some(err.status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else if err.is_builder() {
            ApiError::InvalidRequest(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

/// Per-request options. JSON content type is always sent unless a header in
/// `headers` overrides it.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
    pub headers: HeaderMap,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(body: Value) -> Self {
        Self {
            method: Method::POST,
            body: Some(body),
            headers: HeaderMap::new(),
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Send a request and return the raw response if it was successful.
    pub async fn request(&self, path: &str, options: RequestOptions) -> Result<Response, ApiError> {
        let url = self.endpoint(path);

        let headers = merge_headers(&options.headers);
        debug!(method = %options.method, %url, "sending API request");

        let mut builder = self.client.request(options.method.clone(), &url).headers(headers);
        if let Some(body) = &options.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let data = serde_json::from_str::<Value>(&text).unwrap_or_else(|_| json!({}));
            warn!(method = %options.method, %url, status = status.as_u16(), "API request failed");
            return Err(HttpError::new(status, data).into());
        }

        Ok(response)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.request(path, RequestOptions::get()).await?;
        decode_json(response).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body).map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        let response = self.request(path, RequestOptions::post(body)).await?;
        decode_json(response).await
    }
}

// JSON content type unless the caller set one. Caller headers keep every value.
fn merge_headers(extra: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    for name in extra.keys() {
        headers.remove(name);
    }
    for (name, value) in extra.iter() {
        headers.append(name.clone(), value.clone());
    }
    headers
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::ACCEPT;

    #[test]
    fn test_http_error_display_and_fields() {
        let err = HttpError::new(StatusCode::NOT_FOUND, json!({}));
        assert_eq!(err.status, 404);
        assert_eq!(err.status_text, "Not Found");
        assert_eq!(err.to_string(), "HTTP Error: 404 Not Found");
    }

    #[test]
    fn test_http_error_message_lookup() {
        let top = HttpError::new(StatusCode::CONFLICT, json!({"message": "already exists"}));
        assert_eq!(top.message(), Some("already exists"));

        let fastapi = HttpError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({"detail": {"error_code": "VALIDATION_ERROR", "message": "bad url"}}),
        );
        assert_eq!(fastapi.message(), Some("bad url"));

        let plain_detail = HttpError::new(StatusCode::FORBIDDEN, json!({"detail": "nope"}));
        assert_eq!(plain_detail.message(), Some("nope"));
    }

    #[test]
    fn test_http_error_message_ignores_non_strings() {
        let list = HttpError::new(
            StatusCode::BAD_REQUEST,
            json!({"detail": {"message": [{"loc": ["body"], "msg": "field required"}]}}),
        );
        assert_eq!(list.message(), None);

        let blank = HttpError::new(StatusCode::IM_A_TEAPOT, json!({"message": "  "}));
        assert_eq!(blank.message(), None);

        let array_body = HttpError::new(StatusCode::IM_A_TEAPOT, json!(["message"]));
        assert_eq!(array_body.message(), None);
    }

    #[test]
    fn test_transient_classification() {
        let http = |code: StatusCode| ApiError::Http(HttpError::new(code, json!({})));

        assert!(ApiError::Transport("connection refused".into()).is_transient());
        assert!(http(StatusCode::INTERNAL_SERVER_ERROR).is_transient());
        assert!(http(StatusCode::BAD_GATEWAY).is_transient());
        assert!(http(StatusCode::TOO_MANY_REQUESTS).is_transient());
        assert!(!http(StatusCode::NOT_FOUND).is_transient());
        assert!(!http(StatusCode::BAD_REQUEST).is_transient());
        assert!(!ApiError::Decode("eof".into()).is_transient());
    }

    #[test]
    fn test_endpoint_joins_base_and_path() {
        let client = ApiClient::new("http://localhost:8000/");
        assert_eq!(client.endpoint("/api/v1/chats"), "http://localhost:8000/api/v1/chats");

        let client = ApiClient::new("http://localhost:8000");
        assert_eq!(client.endpoint("/api/v1/chats"), "http://localhost:8000/api/v1/chats");
    }

    #[test]
    fn test_request_options_defaults() {
        let opts = RequestOptions::get();
        assert_eq!(opts.method, Method::GET);
        assert!(opts.body.is_none());

        let opts = RequestOptions::post(json!({"a": 1}))
            .with_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        assert_eq!(opts.method, Method::POST);
        assert_eq!(opts.headers.get(CONTENT_TYPE).unwrap(), "text/plain");
    }

    #[test]
    fn test_merge_headers_keeps_repeated_values() {
        let merged = merge_headers(&HeaderMap::new());
        assert_eq!(merged.get(CONTENT_TYPE).unwrap(), "application/json");

        let mut extra = HeaderMap::new();
        extra.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        extra.append(ACCEPT, HeaderValue::from_static("application/json"));
        extra.append(ACCEPT, HeaderValue::from_static("text/event-stream"));

        let merged = merge_headers(&extra);
        let content_types: Vec<&str> = merged.get_all(CONTENT_TYPE).iter().map(|v| v.to_str().unwrap()).collect();
        assert_eq!(content_types, vec!["text/plain"]);
        let accepts: Vec<&str> = merged.get_all(ACCEPT).iter().map(|v| v.to_str().unwrap()).collect();
        assert_eq!(accepts, vec!["application/json", "text/event-stream"]);
    }
}

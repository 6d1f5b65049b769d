//! Proxmox API transport
//!
//! Provides the HTTP client used to talk to the cluster API (`/api2/json`).

use async_trait::async_trait;
use reqwest::{Client, Method, Response, StatusCode};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;

use crate::config::ClientConfig;

/// Proxmox API transport errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("API returned error: {status} - {message}")]
    Status { status: u16, message: String },

    #[error("Response parsing failed: {0}")]
    ParseError(String),
}

impl ApiError {
    /// HTTP status reported by the server, if the request got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Authentication(_) => Some(StatusCode::UNAUTHORIZED.as_u16()),
            ApiError::Http(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }
}

/// HTTP request representation
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API root, e.g. `cluster/sdn/zones`.
    pub path: String,
    pub query_params: BTreeMap<String, String>,
    /// Sent form-encoded; must be a flat JSON object.
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query_params: BTreeMap::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, path).with_body(body)
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PUT, path).with_body(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// HTTP response representation
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }
}

/// Trait for Proxmox API communication
#[async_trait]
pub trait ApiClient: Send + Sync {
    async fn call(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError>;
    async fn health_check(&self) -> Result<bool, ApiError>;
}

/// HTTP-based Proxmox API client implementation
pub struct HttpApiClient {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl HttpApiClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Option<Duration>,
        insecure: bool,
    ) -> Result<Self, ApiError> {
        let mut builder = Client::builder().danger_accept_invalid_certs(insecure);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let mut base_url = base_url.into();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ApiError::InvalidUrl(base_url));
        }
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
            api_token: None,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = Self::new(config.endpoint.clone(), config.timeout(), config.insecure)?;

        Ok(match &config.api_token {
            Some(token) => client.with_api_token(token.clone()),
            None => client,
        })
    }

    /// Authenticate with an API token of the form `user@realm!tokenid=secret`.
    pub fn with_api_token(mut self, token: String) -> Self {
        self.api_token = Some(token);
        self
    }

    fn build_url(&self, path: &str, query_params: &BTreeMap<String, String>) -> String {
        let mut url = format!("{}{}", self.base_url, path.trim_start_matches('/'));

        if !query_params.is_empty() {
            url.push('?');
            let query_string: Vec<String> = query_params
                .iter()
                .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                .collect();
            url.push_str(&query_string.join("&"));
        }

        url
    }

    async fn execute_request(&self, request: &ApiRequest) -> Result<Response, ApiError> {
        let url = self.build_url(&request.path, &request.query_params);

        let mut req_builder = self.client.request(request.method.clone(), &url);

        if let Some(ref token) = self.api_token {
            req_builder = req_builder.header("Authorization", format!("PVEAPIToken={}", token));
        }

        if let Some(ref body) = request.body {
            if !body.is_object() {
                return Err(ApiError::ParseError(
                    "request body must be a JSON object".to_string(),
                ));
            }
            req_builder = req_builder.form(body);
        }

        let response = req_builder.send().await?;
        Ok(response)
    }
}

#[async_trait]
impl ApiClient for HttpApiClient {
    async fn call(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        log::debug!("Calling Proxmox API: {} {}", request.method, request.path);

        let response = self.execute_request(request).await?;
        let status = response.status();
        let reason = response
            .extensions()
            .get::<hyper::ext::ReasonPhrase>()
            .and_then(|reason| std::str::from_utf8(reason.as_bytes()).ok())
            .map(str::to_string);

        let body_text = response.text().await?;
        let body: Value = if body_text.trim().is_empty() {
            Value::Null
        } else {
            match serde_json::from_str(&body_text) {
                Ok(body) => body,
                Err(e) if status.is_success() => {
                    return Err(ApiError::ParseError(format!("JSON parse error: {}", e)));
                }
                Err(_) => Value::Null,
            }
        };

        if status.is_client_error() || status.is_server_error() {
            let message = error_message(status, reason.as_deref(), &body);

            if status == StatusCode::UNAUTHORIZED {
                return Err(ApiError::Authentication(message));
            }

            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        log::debug!(
            "Proxmox API response: status={}, body_size={}",
            status,
            body_text.len()
        );

        Ok(ApiResponse {
            status: status.as_u16(),
            body,
        })
    }

    async fn health_check(&self) -> Result<bool, ApiError> {
        match self.call(&ApiRequest::get("version")).await {
            Ok(response) => Ok(response.status == 200),
            Err(ApiError::Authentication(message)) => Err(ApiError::Authentication(message)),
            Err(err) => {
                log::debug!("Proxmox API health check failed: {}", err);
                Ok(false)
            }
        }
    }
}

/// Assemble the error text of a failed call.
///
/// Proxmox puts the error text into the HTTP reason phrase; newer releases
/// also repeat it as `message` in the body. Parameter verification failures
/// come with a per-parameter `errors` object.
fn error_message(status: StatusCode, reason: Option<&str>, body: &Value) -> String {
    let mut message = body
        .get("message")
        .and_then(Value::as_str)
        .or(reason)
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error"))
        .to_string();

    if let Some(errors) = body.get("errors").and_then(Value::as_object) {
        let details: Vec<String> = errors
            .iter()
            .map(|(param, error)| match error.as_str() {
                Some(error) => format!("{}: {}", param, error.trim()),
                None => format!("{}: {}", param, error),
            })
            .collect();

        if !details.is_empty() {
            message = format!("{} ({})", message, details.join(", "));
        }
    }

    message
}

/// Canned reply of the mock client
#[derive(Debug, Clone)]
pub enum MockReply {
    Response(ApiResponse),
    Error { status: u16, message: String },
}

/// Mock Proxmox API client for testing
///
/// Replies are keyed by `"<METHOD> <path>"`; every call is recorded.
pub struct MockApiClient {
    responses: HashMap<String, MockReply>,
    requests: Mutex<Vec<ApiRequest>>,
    health_status: bool,
}

impl MockApiClient {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            requests: Mutex::new(Vec::new()),
            health_status: true,
        }
    }

    pub fn add_response(&mut self, method_path: impl Into<String>, response: ApiResponse) {
        self.responses
            .insert(method_path.into(), MockReply::Response(response));
    }

    pub fn add_error(&mut self, method_path: impl Into<String>, status: u16, message: &str) {
        self.responses.insert(
            method_path.into(),
            MockReply::Error {
                status,
                message: message.to_string(),
            },
        );
    }

    pub fn set_health_status(&mut self, healthy: bool) {
        self.health_status = healthy;
    }

    /// Requests received so far, in call order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn make_key(&self, request: &ApiRequest) -> String {
        format!("{} {}", request.method, request.path)
    }
}

impl Default for MockApiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ApiClient for MockApiClient {
    async fn call(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        let key = self.make_key(request);

        match self.responses.get(&key) {
            Some(MockReply::Response(response)) => Ok(response.clone()),
            Some(MockReply::Error { status, message }) => Err(ApiError::Status {
                status: *status,
                message: message.clone(),
            }),
            None => Err(ApiError::Status {
                status: 404,
                message: format!("Mock response not found for: {}", key),
            }),
        }
    }

    async fn health_check(&self) -> Result<bool, ApiError> {
        Ok(self.health_status)
    }
}

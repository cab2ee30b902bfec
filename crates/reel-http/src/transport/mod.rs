//! HTTP transport with connection pooling, default headers and cookies

use std::collections::BTreeMap;
use std::time::Duration;

use reel_config::ApiSettings;
use reel_core::error::{ReelError, ReelResult};
use reel_core::types::{Method, RequestDescriptor};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, ClientBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Replacement for credential header values in diagnostics
pub const REDACTED: &str = "[REDACTED]";

/// Headers whose values never appear in diagnostics
const SENSITIVE_HEADERS: [&str; 2] = ["authorization", "cookie"];

/// What was sent, as recorded for error diagnostics
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    pub method: Method,
    /// Fully resolved URL, or the relative path when resolution failed
    pub url: String,
    /// Outgoing headers with credentials redacted
    pub headers: BTreeMap<String, String>,
    pub params: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    pub timeout_ms: u64,
}

/// Failure of a single HTTP call
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Invalid request: {message}")]
    InvalidRequest {
        message: String,
        request: Box<RequestContext>,
    },

    #[error("Network error: {message}")]
    Network {
        message: String,
        request: Box<RequestContext>,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("Request timed out after {timeout_ms}ms")]
    Timeout {
        timeout_ms: u64,
        request: Box<RequestContext>,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("Server returned {status} {status_text}")]
    Status {
        request: Box<RequestContext>,
        status: u16,
        status_text: String,
        headers: BTreeMap<String, String>,
        /// Parsed JSON body; non-JSON text is kept as a string, empty as `None`
        body: Option<Value>,
    },

    #[error("Failed to decode response: {message}")]
    Decode {
        request: Box<RequestContext>,
        status: u16,
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },
}

impl TransportError {
    /// The request this error belongs to
    pub fn request(&self) -> &RequestContext {
        match self {
            TransportError::InvalidRequest { request, .. }
            | TransportError::Network { request, .. }
            | TransportError::Timeout { request, .. }
            | TransportError::Status { request, .. }
            | TransportError::Decode { request, .. } => request,
        }
    }

    /// HTTP status, when a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } | TransportError::Decode { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Short variant name used in diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            TransportError::InvalidRequest { .. } => "InvalidRequest",
            TransportError::Network { .. } => "NetworkError",
            TransportError::Timeout { .. } => "TimeoutError",
            TransportError::Status { .. } => "HttpError",
            TransportError::Decode { .. } => "DecodeError",
        }
    }
}

/// A successful (2xx) response with its body parsed as JSON
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    /// `Value::Null` for an empty body
    pub body: Value,
}

impl RawResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body,
        }
    }

    /// Decode the body into a typed value
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        T::deserialize(&self.body)
    }
}

/// Transport settings
#[derive(Debug, Clone, PartialEq)]
pub struct TransportConfig {
    /// Base URL joined with the API prefix
    pub root: String,
    pub timeout: Duration,
    pub user_agent: String,
    /// Sent with every request; keys are lower-case
    pub default_headers: BTreeMap<String, String>,
}

impl TransportConfig {
    pub fn new(root: impl Into<String>) -> Self {
        let mut default_headers = BTreeMap::new();
        default_headers.insert("content-type".to_string(), "application/json".to_string());
        default_headers.insert("accept".to_string(), "application/json".to_string());

        Self {
            root: root.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(30),
            user_agent: concat!("reelnet-client/", env!("CARGO_PKG_VERSION")).to_string(),
            default_headers,
        }
    }

    pub fn from_settings(settings: &ApiSettings) -> Self {
        let mut config = Self::new(settings.root());
        config.timeout = settings.timeout();
        config.user_agent = settings.user_agent.clone();
        config
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.default_headers
            .insert(name.to_ascii_lowercase(), value.into());
        self
    }
}

/// reqwest-backed transport for the ReelNet API
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: TransportConfig,
}

impl HttpTransport {
    /// Build the pooled client
    pub fn new(config: TransportConfig) -> ReelResult<Self> {
        Url::parse(&config.root)
            .map_err(|e| ReelError::invalid_config("api.base_url", e.to_string()))?;

        let client = ClientBuilder::new()
            // Connection pooling configuration
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(config.timeout)
            .gzip(true)
            .user_agent(config.user_agent.clone())
            // Session cookies travel with every request
            .cookie_store(true)
            .build()
            .map_err(|e| ReelError::network(format!("Failed to create HTTP client: {}", e), e))?;

        Ok(Self { client, config })
    }

    pub fn from_settings(settings: &ApiSettings) -> ReelResult<Self> {
        Self::new(TransportConfig::from_settings(settings))
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Root + relative path, with `params` appended as a query string
    pub fn resolve_url(
        &self,
        path: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&format!(
            "{}/{}",
            self.config.root,
            path.trim_start_matches('/')
        ))?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params.iter());
        }
        Ok(url)
    }

    /// Defaults, then the bearer token, then the descriptor's own headers
    fn merged_headers(
        &self,
        descriptor: &RequestDescriptor,
        token: Option<&str>,
    ) -> BTreeMap<String, String> {
        let mut headers = self.config.default_headers.clone();
        if let Some(token) = token {
            headers.insert("authorization".to_string(), format!("Bearer {}", token));
        }
        for (name, value) in &descriptor.headers {
            headers.insert(name.to_ascii_lowercase(), value.clone());
        }
        headers
    }

    fn context(
        &self,
        descriptor: &RequestDescriptor,
        url: &str,
        headers: &BTreeMap<String, String>,
    ) -> RequestContext {
        let headers = headers
            .iter()
            .map(|(name, value)| {
                let value = if SENSITIVE_HEADERS.contains(&name.as_str()) {
                    REDACTED.to_string()
                } else {
                    value.clone()
                };
                (name.clone(), value)
            })
            .collect();

        RequestContext {
            method: descriptor.method,
            url: url.to_string(),
            headers,
            params: descriptor.params.clone(),
            body: descriptor.body.clone(),
            timeout_ms: self.config.timeout.as_millis() as u64,
        }
    }

    fn classify(&self, error: reqwest::Error, request: RequestContext) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout {
                timeout_ms: request.timeout_ms,
                request: Box::new(request),
                source: Some(error),
            }
        } else {
            TransportError::Network {
                message: error.to_string(),
                request: Box::new(request),
                source: Some(error),
            }
        }
    }

    /// Perform one call. No retries happen here.
    pub async fn send(
        &self,
        descriptor: &RequestDescriptor,
        token: Option<&str>,
    ) -> Result<RawResponse, TransportError> {
        let headers = self.merged_headers(descriptor, token);

        let url = match self.resolve_url(&descriptor.url, &descriptor.params) {
            Ok(url) => url,
            Err(e) => {
                return Err(TransportError::InvalidRequest {
                    message: format!("Invalid URL '{}': {}", descriptor.url, e),
                    request: Box::new(self.context(descriptor, &descriptor.url, &headers)),
                })
            }
        };
        let context = self.context(descriptor, url.as_str(), &headers);

        let mut header_map = HeaderMap::new();
        for (name, value) in &headers {
            let parsed = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| e.to_string())
                .and_then(|name| {
                    HeaderValue::from_str(value)
                        .map(|value| (name, value))
                        .map_err(|e| e.to_string())
                });
            match parsed {
                Ok((name, value)) => {
                    header_map.insert(name, value);
                }
                Err(e) => {
                    return Err(TransportError::InvalidRequest {
                        message: format!("Invalid header '{}': {}", name, e),
                        request: Box::new(context),
                    })
                }
            }
        }

        debug!("{} {}", descriptor.method, url);

        let mut builder = self
            .client
            .request(reqwest_method(descriptor.method), url)
            .headers(header_map);
        if let Some(body) = &descriptor.body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => return Err(self.classify(e, context)),
        };

        let status = response.status();
        let response_headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return Err(self.classify(e, context)),
        };
        let is_empty = bytes.iter().all(u8::is_ascii_whitespace);

        debug!("{} {} -> {}", descriptor.method, context.url, status.as_u16());

        if !status.is_success() {
            let body = if is_empty {
                None
            } else {
                Some(
                    serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                        Value::String(String::from_utf8_lossy(&bytes).into_owned())
                    }),
                )
            };
            return Err(TransportError::Status {
                request: Box::new(context),
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                headers: response_headers,
                body,
            });
        }

        let body = if is_empty {
            Value::Null
        } else {
            match serde_json::from_slice(&bytes) {
                Ok(body) => body,
                Err(e) => {
                    return Err(TransportError::Decode {
                        request: Box::new(context),
                        status: status.as_u16(),
                        message: e.to_string(),
                        source: Some(e),
                    })
                }
            }
        };

        Ok(RawResponse {
            status: status.as_u16(),
            headers: response_headers,
            body,
        })
    }
}

fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

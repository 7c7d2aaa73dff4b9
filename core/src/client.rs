//! Authenticated request building and execution.
//!
//! # Design
//! `Client` holds only immutable configuration (base URL, token, user agent)
//! and an injected `reqwest::Client`, behind an `Arc` so clones are cheap and
//! safe to share across tasks. Each call is split into three steps:
//! `new_request` builds an `HttpRequest`, `send` performs one round trip and
//! applies the status check, and `decode` turns the body into a typed value.
//! Only `send` touches the network.

use std::fmt;
use std::sync::Arc;

use reqwest::header::HeaderValue;
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::context::Context;
use crate::error::{ApiError, Error, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::inventory::InventoryService;

/// Production endpoint of the inventory API.
pub const DEFAULT_BASE_URL: &str = "https://web.zaico.co.jp/api/v1";

/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("zaico-rust/", env!("CARGO_PKG_VERSION"));

/// Inventory API client.
///
/// ```no_run
/// use zaico_core::{Client, Context, ListQuery};
///
/// # async fn example() -> zaico_core::Result<()> {
/// let client = Client::new("api-token")?;
/// let query = ListQuery {
///     category: "Packaging".to_string(),
///     ..Default::default()
/// };
/// let items = client.inventory().list(&Context::background(), Some(&query)).await?;
/// println!("{} items", items.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    base_url: Url,
    authorization: String,
    user_agent: String,
}

impl fmt::Debug for ClientInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientInner")
            .field("base_url", &self.base_url.as_str())
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Client for the production endpoint.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::builder().token(token).build()
    }

    /// Client for an alternative endpoint, e.g. a staging host or a local mock.
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        Self::builder().token(token).base_url(base_url).build()
    }

    /// Base URL, always ending in `/`.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    pub fn user_agent(&self) -> &str {
        &self.inner.user_agent
    }

    /// Access the inventory endpoints.
    pub fn inventory(&self) -> InventoryService<'_> {
        InventoryService::new(self)
    }

    /// Build a request with no body.
    ///
    /// `path` is resolved as a relative reference against the base URL, so
    /// `inventories/1` lands under the base path and `?page=2` style query
    /// strings are kept.
    pub fn new_request(&self, method: HttpMethod, path: &str) -> Result<HttpRequest> {
        self.build(method, path, None)
    }

    /// Build a request carrying `body` as JSON.
    pub fn new_json_request<B>(&self, method: HttpMethod, path: &str, body: &B) -> Result<HttpRequest>
    where
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_string(body).map_err(Error::Encode)?;
        self.build(method, path, Some(body))
    }

    fn build(&self, method: HttpMethod, path: &str, body: Option<String>) -> Result<HttpRequest> {
        let url = self.inner.base_url.join(path)?;

        let mut headers = Vec::with_capacity(4);
        if body.is_some() {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }
        headers.push(("accept".to_string(), "application/json".to_string()));
        headers.push(("authorization".to_string(), self.inner.authorization.clone()));
        headers.push(("user-agent".to_string(), self.inner.user_agent.clone()));

        Ok(HttpRequest {
            method,
            url,
            headers,
            body,
        })
    }

    /// Perform one round trip and fail on a non-2xx status.
    ///
    /// The body is read to the end before returning on every path, including
    /// error statuses. Nothing is retried.
    pub async fn send(&self, cx: &Context, request: HttpRequest) -> Result<HttpResponse> {
        tracing::debug!(method = %request.method, url = %request.url, "sending request");
        let response = cx.run(self.round_trip(&request)).await?;
        tracing::debug!(
            method = %request.method,
            url = %request.url,
            status = response.status,
            "received response"
        );
        check_response(&request, &response)?;
        Ok(response)
    }

    /// Perform one round trip and decode a successful body as `T`.
    pub async fn execute<T: DeserializeOwned>(&self, cx: &Context, request: HttpRequest) -> Result<T> {
        let response = self.send(cx, request).await?;
        decode(&response)
    }

    async fn round_trip(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let mut builder = self
            .inner
            .http
            .request(request.method.to_reqwest(), request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.text().await?;

        Ok(HttpResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}

/// Convert a non-2xx response into [`Error::Api`].
pub fn check_response(request: &HttpRequest, response: &HttpResponse) -> Result<()> {
    if response.is_success() {
        return Ok(());
    }
    let err = ApiError::from_response(request.method, &request.url, response);
    tracing::debug!(error = %err, "API returned an error status");
    Err(Error::Api(err))
}

/// Decode a successful response body.
pub fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T> {
    serde_json::from_str(&response.body).map_err(Error::Decode)
}

/// Builder for [`Client`].
#[derive(Debug, Default)]
pub struct ClientBuilder {
    token: Option<String>,
    base_url: Option<String>,
    user_agent: Option<String>,
    http: Option<reqwest::Client>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bearer token sent with every request. Required.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Defaults to [`DEFAULT_BASE_URL`].
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Defaults to [`DEFAULT_USER_AGENT`].
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Use an existing `reqwest::Client` (connection pool, proxy, timeouts).
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    pub fn build(self) -> Result<Client> {
        let token = self
            .token
            .ok_or_else(|| Error::Config("token is required".to_string()))?;
        let authorization = format!("Bearer {token}");
        HeaderValue::from_str(&authorization)
            .map_err(|_| Error::Config("token contains invalid header characters".to_string()))?;

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        HeaderValue::from_str(&user_agent)
            .map_err(|_| Error::Config("user agent contains invalid header characters".to_string()))?;

        let base_url = self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let mut base_url =
            Url::parse(base_url).map_err(|e| Error::Config(format!("invalid base URL {base_url:?}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!("base URL {base_url} cannot be a base")));
        }
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        let http = match self.http {
            Some(http) => http,
            None => reqwest::Client::builder()
                .build()
                .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?,
        };

        Ok(Client {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                authorization,
                user_agent,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> Client {
        Client::with_base_url("test-token", "https://example.com/api/v1").unwrap()
    }

    #[test]
    fn debug_output_hides_token() {
        let debug = format!("{:?}", client());
        assert!(debug.contains("https://example.com/api/v1/"));
        assert!(!debug.contains("test-token"));
    }

    #[test]
    fn builder_requires_token() {
        let err = ClientBuilder::new().build().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn builder_rejects_token_with_newline() {
        let err = Client::new("bad\ntoken").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn builder_rejects_relative_base_url() {
        let err = Client::with_base_url("t", "/api/v1").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn default_base_url_is_production() {
        let client = Client::new("t").unwrap();
        assert_eq!(client.base_url().as_str(), "https://web.zaico.co.jp/api/v1/");
        assert_eq!(client.user_agent(), DEFAULT_USER_AGENT);
    }

    #[test]
    fn base_url_gains_trailing_slash() {
        assert_eq!(client().base_url().as_str(), "https://example.com/api/v1/");

        let client = Client::with_base_url("t", "https://example.com/api/v1/").unwrap();
        assert_eq!(client.base_url().as_str(), "https://example.com/api/v1/");
    }

    #[test]
    fn relative_path_appends_to_base_path() {
        let req = client().new_request(HttpMethod::Get, "inventories/7").unwrap();
        assert_eq!(req.url.as_str(), "https://example.com/api/v1/inventories/7");

        let req = client().new_request(HttpMethod::Get, "./inventories?page=2").unwrap();
        assert_eq!(req.url.as_str(), "https://example.com/api/v1/inventories?page=2");
    }

    #[test]
    fn bodyless_request_headers() {
        let req = client().new_request(HttpMethod::Delete, "inventories/1").unwrap();
        assert_eq!(req.method, HttpMethod::Delete);
        assert!(req.body.is_none());
        assert_eq!(req.header("authorization"), Some("Bearer test-token"));
        assert_eq!(req.header("accept"), Some("application/json"));
        assert_eq!(req.header("user-agent"), Some(DEFAULT_USER_AGENT));
        assert_eq!(req.header("content-type"), None);
    }

    #[test]
    fn json_request_sets_content_type_and_body() {
        let body = serde_json::json!({ "title": "Tape" });
        let req = client()
            .new_json_request(HttpMethod::Post, "inventories", &body)
            .unwrap();
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header("authorization"), Some("Bearer test-token"));
        let sent: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(sent, body);
    }

    #[test]
    fn unserializable_body_is_an_encode_error() {
        use std::collections::HashMap;

        // Non-string map keys cannot be represented in JSON.
        let mut body = HashMap::new();
        body.insert((1, 2), "x");
        let err = client()
            .new_json_request(HttpMethod::Post, "inventories", &body)
            .unwrap_err();
        assert!(matches!(err, Error::Encode(_)));
    }

    #[test]
    fn malformed_path_is_rejected() {
        let err = client().new_request(HttpMethod::Get, "http://[::1").unwrap_err();
        assert!(matches!(err, Error::InvalidPath(_)));
    }

    #[test]
    fn check_response_passes_2xx() {
        let req = client().new_request(HttpMethod::Delete, "inventories/1").unwrap();
        let response = HttpResponse {
            status: 204,
            reason: "No Content".to_string(),
            headers: Vec::new(),
            body: String::new(),
        };
        assert!(check_response(&req, &response).is_ok());
    }

    #[test]
    fn check_response_converts_404() {
        let req = client().new_request(HttpMethod::Get, "inventories/1").unwrap();
        let response = HttpResponse {
            status: 404,
            reason: "Not Found".to_string(),
            headers: Vec::new(),
            body: r#"{"code":404,"status":"error","message":"Inventory not found"}"#.to_string(),
        };
        let err = check_response(&req, &response).unwrap_err();
        let api = err.api_error().unwrap();
        assert_eq!(api.code, 404);
        assert_eq!(api.message, "Inventory not found");
        assert_eq!(api.url.as_str(), "https://example.com/api/v1/inventories/1");
    }

    #[test]
    fn decode_rejects_malformed_json() {
        let response = HttpResponse {
            status: 200,
            reason: "OK".to_string(),
            headers: Vec::new(),
            body: "not json".to_string(),
        };
        let err = decode::<serde_json::Value>(&response).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }
}

//! Authenticated HTTP transport against the FastSchema API.
//!
//! Every CRUD, schema and auth call goes through [`Transport::request`]. The
//! transport resolves paths against the base API URL, injects the stored
//! token, unwraps the `{ data, error }` response envelope and turns server
//! failures into [`FastSchemaError::TransportError`].

use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE, COOKIE};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Instant;

use crate::credentials::TokenStore;
use crate::error::{FastSchemaError, Result};
use crate::models::{ResponseEnvelope, UploadFile, UploadResult};

const JSON_CONTENT_TYPE: &str = "application/json;charset=utf-8";
const FALLBACK_ERROR: &str = "Network response was not ok";
const X_AUTH_TOKEN: HeaderName = HeaderName::from_static("x-auth-token");

/// Where the stored token goes on outgoing requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthHeaderMode {
    /// `Authorization: Bearer <token>`
    #[default]
    Bearer,
    /// `X-Auth-Token: <token>`
    XAuthToken,
    /// `Cookie: <name>=<token>`, appended to any cookie already on the request
    Cookie(String),
    /// Never attach the token
    Disabled,
}

impl AuthHeaderMode {
    /// Write the token into `headers` according to this mode. A missing
    /// token leaves the headers untouched.
    pub fn apply(&self, headers: &mut HeaderMap, token: Option<&str>) -> Result<()> {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return Ok(());
        };

        match self {
            AuthHeaderMode::Bearer => {
                headers.insert(AUTHORIZATION, header_value(&format!("Bearer {}", token))?);
            },
            AuthHeaderMode::XAuthToken => {
                headers.insert(X_AUTH_TOKEN, header_value(token)?);
            },
            AuthHeaderMode::Cookie(name) => {
                let existing = headers
                    .get(COOKIE)
                    .and_then(|v| v.to_str().ok())
                    .map(|v| format!("{}; ", v))
                    .unwrap_or_default();
                headers.insert(COOKIE, header_value(&format!("{}{}={}", existing, name, token))?);
            },
            AuthHeaderMode::Disabled => {},
        }
        Ok(())
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| FastSchemaError::invalid_argument(format!("Invalid header value: {}", e)))
}

/// Per-call request options.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Extra headers, applied before the auth header
    pub headers: HeaderMap,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            FastSchemaError::invalid_argument(format!("Invalid header name '{}': {}", name, e))
        })?;
        self.headers.insert(name, header_value(value)?);
        Ok(self)
    }
}

/// HTTP transport shared by every facade of a client.
#[derive(Clone)]
pub struct Transport {
    base_url: String,
    base_api_url: String,
    http_client: reqwest::Client,
    token_store: Arc<dyn TokenStore>,
    header_mode: AuthHeaderMode,
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("base_url", &self.base_url)
            .field("base_api_url", &self.base_api_url)
            .field("header_mode", &self.header_mode)
            .finish()
    }
}

impl Transport {
    pub(crate) fn new(
        base_url: &str,
        api_base_name: &str,
        http_client: reqwest::Client,
        token_store: Arc<dyn TokenStore>,
        header_mode: AuthHeaderMode,
    ) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        let parsed = Url::parse(&base_url).map_err(|e| {
            FastSchemaError::ConfigurationError(format!("Invalid base_url '{}': {}", base_url, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FastSchemaError::ConfigurationError(format!(
                "Unsupported base_url scheme '{}'; expected http or https",
                parsed.scheme()
            )));
        }

        let api_base_name = api_base_name.trim_matches('/');
        let base_api_url = if api_base_name.is_empty() {
            base_url.clone()
        } else {
            format!("{}/{}", base_url, api_base_name)
        };

        Ok(Self {
            base_url,
            base_api_url,
            http_client,
            token_store,
            header_mode,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn base_api_url(&self) -> &str {
        &self.base_api_url
    }

    pub fn header_mode(&self) -> &AuthHeaderMode {
        &self.header_mode
    }

    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.token_store
    }

    /// Current token from the store, if any.
    pub async fn auth_token(&self) -> Result<Option<String>> {
        self.token_store.get_token(None).await
    }

    /// Absolute URLs pass through; anything else is appended to the base API URL.
    pub fn resolve_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_api_url, path)
        }
    }

    /// Realtime content endpoint: the base API URL with its scheme swapped to
    /// `ws`/`wss`, path `<api prefix>/realtime/content` and the given query.
    pub fn realtime_url(&self, query: &str) -> Result<String> {
        let mut url = Url::parse(&self.base_api_url).map_err(|e| {
            FastSchemaError::ConfigurationError(format!(
                "Invalid base API URL '{}': {}",
                self.base_api_url, e
            ))
        })?;

        let ws_scheme = match url.scheme() {
            "http" => "ws",
            "https" => "wss",
            other => {
                return Err(FastSchemaError::ConfigurationError(format!(
                    "Unsupported base_url scheme '{}'; expected http or https",
                    other
                )))
            },
        };
        url.set_scheme(ws_scheme).map_err(|_| {
            FastSchemaError::ConfigurationError("Failed to set realtime URL scheme".to_string())
        })?;

        let path = format!("{}/realtime/content", url.path().trim_end_matches('/'));
        url.set_path(&path);
        url.set_query(if query.is_empty() { None } else { Some(query) });

        Ok(url.to_string())
    }

    /// Send a request and decode the envelope's `data` member into `T`.
    pub async fn request<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request_with(method, path, body, &RequestOptions::default()).await
    }

    /// [`Transport::request`] with extra headers.
    pub async fn request_with<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        options: &RequestOptions,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.resolve_url(path);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        headers.extend(options.headers.clone());
        let token = self.auth_token().await?;
        self.header_mode.apply(&mut headers, token.as_deref())?;

        let mut builder = self.http_client.request(method.clone(), &url).headers(headers);
        if let Some(body) = body {
            builder = builder.body(serde_json::to_vec(body)?);
        }

        self.send(method, &url, builder).await
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request::<T, ()>(Method::GET, path, None).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PATCH, path, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request::<T, ()>(Method::DELETE, path, None).await
    }

    pub async fn head<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request::<T, ()>(Method::HEAD, path, None).await
    }

    pub async fn options<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request::<T, ()>(Method::OPTIONS, path, None).await
    }

    /// Upload files as multipart form data to `/file/upload`, one `file`
    /// part per file.
    pub async fn upload(&self, files: Vec<UploadFile>) -> Result<UploadResult> {
        if files.is_empty() {
            return Err(FastSchemaError::invalid_argument("no files to upload"));
        }

        let mut form = reqwest::multipart::Form::new();
        for file in files {
            let mut part = reqwest::multipart::Part::bytes(file.bytes).file_name(file.name);
            if let Some(content_type) = file.content_type.as_deref() {
                part = part.mime_str(content_type)?;
            }
            form = form.part("file", part);
        }

        let url = self.resolve_url("/file/upload");
        let mut headers = HeaderMap::new();
        let token = self.auth_token().await?;
        self.header_mode.apply(&mut headers, token.as_deref())?;

        let builder = self.http_client.post(&url).headers(headers).multipart(form);
        self.send(Method::POST, &url, builder).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        builder: reqwest::RequestBuilder,
    ) -> Result<T> {
        let start = Instant::now();
        debug!("[FS_HTTP] Sending {} {}", method, url);

        let response = builder.send().await.map_err(|e| {
            warn!(
                "[FS_HTTP] Request failed: {} {} error={} duration_ms={}",
                method,
                url,
                e,
                start.elapsed().as_millis()
            );
            FastSchemaError::from(e)
        })?;

        let status = response.status();
        let text = response.text().await?;
        debug!(
            "[FS_HTTP] Response received: {} {} status={} duration_ms={}",
            method,
            url,
            status,
            start.elapsed().as_millis()
        );

        if !status.is_success() {
            let fallback = status.canonical_reason().unwrap_or(FALLBACK_ERROR);
            let message = serde_json::from_str::<ResponseEnvelope<JsonValue>>(&text)
                .ok()
                .and_then(|envelope| envelope.error)
                .map(|error| error.message(fallback))
                .unwrap_or_else(|| fallback.to_string());
            warn!(
                "[FS_HTTP] Server error: status={} message=\"{}\"",
                status.as_u16(),
                message
            );
            return Err(FastSchemaError::TransportError {
                status: Some(status.as_u16()),
                message,
            });
        }

        decode_envelope(status.as_u16(), &text)
    }
}

/// Unwrap a successful response body. An empty body decodes as JSON `null`.
pub(crate) fn decode_envelope<T: DeserializeOwned>(status: u16, text: &str) -> Result<T> {
    if text.trim().is_empty() {
        return serde_json::from_value(JsonValue::Null)
            .map_err(|e| FastSchemaError::decode(format!("Empty response body: {}", e)));
    }

    let envelope: ResponseEnvelope<JsonValue> = serde_json::from_str(text)
        .map_err(|e| FastSchemaError::decode(format!("Invalid response envelope: {}", e)))?;

    if let Some(error) = envelope.error {
        let message = error.message("");
        warn!("[FS_HTTP] Error envelope in {} response: \"{}\"", status, message);
        return Err(FastSchemaError::TransportError {
            status: Some(status),
            message,
        });
    }

    serde_json::from_value(envelope.data.unwrap_or(JsonValue::Null))
        .map_err(|e| FastSchemaError::decode(format!("Invalid response data: {}", e)))
}

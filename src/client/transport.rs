//! HTTP plumbing between the client and a Galaxy server.

use super::payloads::ErrorResponse;
use crate::error::{GalaxyError, Result};
use reqwest::blocking::Client;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Request timeout when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        };
        write!(f, "{}", name)
    }
}

/// One JSON request/response exchange against `/api/<path>`.
///
/// Implementations surface failures unchanged; nothing above this trait
/// retries.
pub trait Transport: Send + Sync {
    fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value>;
}

/// Blocking `reqwest` transport authenticating with an API key.
pub struct HttpTransport {
    api_root: Url,
    api_key: String,
    http: Client,
}

impl HttpTransport {
    /// Create a transport for the server at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUrl` unless `base_url` is an absolute http(s) URL.
    pub fn new(base_url: &str, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let mut root = Url::parse(base_url)
            .map_err(|e| GalaxyError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if root.scheme() != "http" && root.scheme() != "https" {
            return Err(GalaxyError::InvalidUrl(format!(
                "URL must start with http:// or https://, got: {}",
                base_url
            )));
        }
        if !root.path().ends_with('/') {
            let path = format!("{}/", root.path());
            root.set_path(&path);
        }
        let api_root = root
            .join("api/")
            .map_err(|e| GalaxyError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_root,
            api_key: api_key.into(),
            http,
        })
    }

    /// Full URL for an API path such as `histories/abc/contents`.
    pub fn url(&self, path: &str) -> Result<Url> {
        let path = path.trim_start_matches('/');
        self.api_root
            .join(path)
            .map_err(|e| GalaxyError::InvalidUrl(format!("{}: {}", path, e)))
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("api_root", &self.api_root.as_str())
            .finish_non_exhaustive()
    }
}

impl Transport for HttpTransport {
    fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value> {
        let url = self.url(path)?;
        debug!(%method, %url, "galaxy request");

        let builder = match method {
            Method::Get => self.http.get(url),
            Method::Post => self.http.post(url),
            Method::Delete => self.http.delete(url),
        };
        let mut builder = builder.header("x-api-key", &self.api_key).query(query);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send()?;
        let status = response.status();
        let text = response.text()?;
        debug!(status = status.as_u16(), bytes = text.len(), "galaxy response");

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .ok()
                .and_then(|body| body.text().map(str::to_string))
                .unwrap_or(text);
            return Err(GalaxyError::Api {
                status: status.as_u16(),
                message,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

//! Transport capability consumed by the resolver, plus the concrete HTTP
//! implementation used against the Streamify backend.

use std::future::Future;

use serde_json::Value;
use url::Url;

use crate::error::TransportError;

/// Capability to perform one HTTP GET and decode the body as JSON. The
/// resolver never sees protocol details; it only needs "decoded body" or
/// "transport failed".
pub trait Transport: Send + Sync {
    fn fetch(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> impl Future<Output = Result<Value, TransportError>> + Send;
}

/// HTTP transport over a fixed API base URL, with an optional bearer token
/// attached to every request.
pub struct HttpTransport {
    base: Url,
    client: reqwest::Client,
    bearer: Option<String>,
}

impl HttpTransport {
    pub fn new(base: &str) -> Result<Self, TransportError> {
        let base = Url::parse(base).map_err(|e| TransportError::network(e.to_string()))?;
        Ok(Self {
            base,
            client: reqwest::Client::new(),
            bearer: None,
        })
    }

    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// Appends `path` to the base path. `Url::join` would discard the base
    /// path for absolute inputs like `/likes`, so splice by hand.
    fn endpoint_url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, TransportError> {
        let mut url = self.base.clone();
        let joined = format!(
            "{}/{}",
            url.path().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        url.set_path(&joined);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }
}

impl Transport for HttpTransport {
    fn fetch(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> impl Future<Output = Result<Value, TransportError>> + Send {
        let builder = self.endpoint_url(path, query).map(|url| {
            log::debug!(target: "streamify::transport", "GET {}", url);
            let mut builder = self.client.get(url);
            if let Some(token) = &self.bearer {
                builder = builder.bearer_auth(token);
            }
            builder
        });
        async move {
            let response = builder?
                .send()
                .await
                .map_err(|e| TransportError::network(e.to_string()))?;
            let status = response.status();
            if !status.is_success() {
                return Err(TransportError::Http {
                    status: status.as_u16(),
                });
            }
            response
                .json::<Value>()
                .await
                .map_err(|e| TransportError::Decode(e.to_string()))
        }
    }
}

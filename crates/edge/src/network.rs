//! Fetching from the site origin.

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::error::NetworkError;
use crate::exchange::{EdgeRequest, EdgeResponse, end_to_end_headers};

/// Something that can answer a request, normally the origin over HTTP.
///
/// Any response the origin produces is `Ok`, whatever its status; only a
/// transport failure is an error.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &EdgeRequest) -> Result<EdgeResponse, NetworkError>;
}

/// Forwards requests to the site with `reqwest`.
///
/// Redirects are handed back to the client rather than followed, so the
/// browser sees the site's `303`s and any cookies set on them.
#[derive(Debug, Clone)]
pub struct OriginNetwork {
    client: reqwest::Client,
    origin: String,
}

impl OriginNetwork {
    /// Create a client for `origin`, e.g. `http://127.0.0.1:3000`.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::InvalidUrl` if `origin` is not an absolute
    /// http(s) URL, or `NetworkError::Client` if the client cannot be built.
    pub fn new(origin: &str) -> Result<Self, NetworkError> {
        let parsed =
            url::Url::parse(origin).map_err(|e| NetworkError::InvalidUrl(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(NetworkError::InvalidUrl(origin.to_string()));
        }

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            origin: origin.trim_end_matches('/').to_string(),
        })
    }

    fn url_for(&self, request: &EdgeRequest) -> String {
        format!("{}{}", self.origin, request.path_and_query)
    }
}

#[async_trait]
impl Network for OriginNetwork {
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path()))]
    async fn fetch(&self, request: &EdgeRequest) -> Result<EdgeResponse, NetworkError> {
        let response = self
            .client
            .request(request.method.clone(), self.url_for(request))
            .headers(end_to_end_headers(&request.headers))
            .body(request.body.clone())
            .send()
            .await?;

        let status = response.status();
        let headers = end_to_end_headers(response.headers());
        let body = response.bytes().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "Origin responded");

        Ok(EdgeResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn origin_must_be_http() {
        assert!(matches!(
            OriginNetwork::new("ftp://127.0.0.1"),
            Err(NetworkError::InvalidUrl(_))
        ));
        assert!(matches!(
            OriginNetwork::new("not a url"),
            Err(NetworkError::InvalidUrl(_))
        ));
    }

    #[test]
    fn urls_keep_the_query() {
        let network = OriginNetwork::new("http://127.0.0.1:3000/").unwrap();
        let request = EdgeRequest::get("/api/availability?date=2026-03-10");
        assert_eq!(
            network.url_for(&request),
            "http://127.0.0.1:3000/api/availability?date=2026-03-10"
        );
    }
}

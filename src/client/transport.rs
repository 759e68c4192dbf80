//! Outbound request to the plugin API.

use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use thiserror::Error;

use crate::external::client::HTTP_CLIENT;

/// Header carrying the host API key.
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// The request could not be completed or produced no usable body.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Server answered with status {status}")]
    Status { status: u16 },

    #[error("Response body is not JSON: {0}")]
    Decode(#[source] serde_json::Error),
}

/// POSTs a JSON body to a path relative to the host API.
#[async_trait]
pub trait PluginApi: Send + Sync {
    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, TransportError>;
}

/// reqwest-backed `PluginApi` using the shared HTTP client.
#[derive(Debug, Clone)]
pub struct HttpPluginApi {
    base_url: Url,
    api_key: Option<String>,
}

impl HttpPluginApi {
    /// `base_url` is the host API root, e.g. `http://octopi.local/api/`.
    /// A missing trailing slash is added so relative paths resolve below it.
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, TransportError> {
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };

        let base_url = Url::parse(&normalized).map_err(|e| TransportError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        if base_url.cannot_be_a_base() {
            return Err(TransportError::InvalidBaseUrl {
                url: normalized,
                reason: "URL cannot be used as a base".to_string(),
            });
        }

        Ok(Self {
            base_url,
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| TransportError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl PluginApi for HttpPluginApi {
    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, TransportError> {
        let url = self.endpoint(path)?;

        let mut request = HTTP_CLIENT
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json; charset=UTF-8")
            .header(reqwest::header::ACCEPT, "application/json")
            .body(body.to_string());
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(TransportError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let api = HttpPluginApi::new("http://octopi.local/api", None).unwrap();
        assert_eq!(
            api.endpoint("plugin/octobullet").unwrap().as_str(),
            "http://octopi.local/api/plugin/octobullet"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HttpPluginApi::new("octopi", None),
            Err(TransportError::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            HttpPluginApi::new("mailto:someone@example.com", None),
            Err(TransportError::InvalidBaseUrl { .. })
        ));
    }

    #[tokio::test]
    async fn test_post_json_sends_body_and_key() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/plugin/octobullet")
            .match_header("x-api-key", "secret")
            .match_header("content-type", Matcher::Regex("application/json".to_string()))
            .match_body(Matcher::Json(json!({"command": "test"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"result": true}"#)
            .create_async()
            .await;

        let api = HttpPluginApi::new(&format!("{}/api/", server.url()), Some("secret".to_string()))
            .unwrap();
        let response = api
            .post_json("plugin/octobullet", &json!({"command": "test"}))
            .await
            .unwrap();

        assert_eq!(response, json!({"result": true}));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_transport_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/plugin/octobullet")
            .with_status(403)
            .with_body("Insufficient rights")
            .create_async()
            .await;

        let api = HttpPluginApi::new(&format!("{}/api", server.url()), None).unwrap();
        let err = api
            .post_json("plugin/octobullet", &json!({}))
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Status { status: 403 }));
    }

    #[tokio::test]
    async fn test_unparseable_body_is_transport_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/plugin/octobullet")
            .with_status(200)
            .with_body("<html>oops</html>")
            .create_async()
            .await;

        let api = HttpPluginApi::new(&format!("{}/api/", server.url()), None).unwrap();
        let err = api
            .post_json("plugin/octobullet", &json!({}))
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Decode(_)));
    }
}

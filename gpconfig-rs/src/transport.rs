/* Request transport: the only place that performs I/O. */

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};

/* The transport interface used by the configuration client.
 *
 * Implementations issue one request against `path` (relative to whatever
 * base they were configured with) and hand back the decoded JSON body. An
 * empty body decodes to `Value::Null`. */
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, path: &str) -> ApiResult<Value>;

    async fn post(&self, path: &str, body: &Value) -> ApiResult<Value>;
}

/* `reqwest`-backed transport talking to the controller's web server. */
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::InvalidBaseUrl {
                url: config.base_url.clone(),
                reason: "expected an http:// or https:// URL".to_string(),
            });
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn read_body(
        &self,
        url: &str,
        path: &str,
        response: reqwest::Response,
    ) -> ApiResult<Value> {
        let status = response.status();
        let text = response.text().await.map_err(|e| ApiError::Unreachable {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        decode_body(path, status, text)
    }
}

/* Turn a status and body into a JSON value, rejecting non-2xx statuses. */
fn decode_body(path: &str, status: reqwest::StatusCode, text: String) -> ApiResult<Value> {
    if !status.is_success() {
        return Err(ApiError::Rejected {
            path: path.to_string(),
            status: status.as_u16(),
            body: text,
        });
    }

    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text).map_err(|e| ApiError::malformed(path, e))
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str) -> ApiResult<Value> {
        let url = self.url(path);
        debug!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiError::Unreachable {
                url: url.clone(),
                message: e.to_string(),
            })?;
        self.read_body(&url, path, response).await
    }

    async fn post(&self, path: &str, body: &Value) -> ApiResult<Value> {
        let url = self.url(path);
        debug!("POST {}", url);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::Unreachable {
                url: url.clone(),
                message: e.to_string(),
            })?;
        self.read_body(&url, path, response).await
    }
}

/* Scripted in-memory transport for unit tests. */

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::*;

    #[test]
    fn url_joins_base_and_path() {
        let config = ClientConfig::new("http://192.168.7.1/");
        let transport = HttpTransport::new(&config).expect("valid config");
        assert_eq!(transport.base_url(), "http://192.168.7.1");
        assert_eq!(
            transport.url("/api/getPinMappings"),
            "http://192.168.7.1/api/getPinMappings"
        );
    }

    #[test]
    fn rejects_non_http_base_url() {
        let config = ClientConfig::new("192.168.7.1");
        match HttpTransport::new(&config) {
            Err(ApiError::InvalidBaseUrl { url, .. }) => assert_eq!(url, "192.168.7.1"),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected InvalidBaseUrl"),
        }
    }

    #[test]
    fn non_success_status_is_a_rejection() {
        let err = decode_body(
            "/api/setPinMappings",
            StatusCode::BAD_REQUEST,
            "bad pin".to_string(),
        )
        .unwrap_err();
        assert!(err.is_rejection());
        assert!(!err.is_unreachable());
        match err {
            ApiError::Rejected { status, body, .. } => {
                assert_eq!(status, 400);
                assert_eq!(body, "bad pin");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn success_bodies_decode() {
        let path = "/api/getFirmwareVersion";
        assert_eq!(
            decode_body(path, StatusCode::OK, r#"{"version":"0.7.9"}"#.to_string()).unwrap(),
            serde_json::json!({ "version": "0.7.9" })
        );
        assert_eq!(
            decode_body(path, StatusCode::OK, "  \n".to_string()).unwrap(),
            Value::Null
        );
        assert!(matches!(
            decode_body(path, StatusCode::OK, "<html>".to_string()),
            Err(ApiError::MalformedBody { .. })
        ));
    }
}

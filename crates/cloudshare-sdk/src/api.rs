// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! The API seam: one synchronous call in, decoded JSON (or a typed error) out.

use cloudshare_http::{HttpClient, HttpClientConfig, HttpRequest, Method, RequestSigner, api_url};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::config::SdkConfig;
use crate::error::{Result, SdkError};

/// Anything that can execute a CloudShare API call.
///
/// Implementations return the decoded JSON body on a 2xx reply (or `Value::Null`
/// when the body is empty or not JSON) and `SdkError::Api` otherwise.
pub trait ApiClient {
    fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Value>;

    fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        self.request(Method::Get, path, query, None)
    }

    fn post(&self, path: &str, body: &Value) -> Result<Value> {
        self.request(Method::Post, path, &[], Some(body))
    }

    fn put(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        self.request(Method::Put, path, query, None)
    }

    fn delete(&self, path: &str) -> Result<Value> {
        self.request(Method::Delete, path, &[], None)
    }
}

/// Production client: signs every request and sends it over HTTPS.
pub struct HttpApiClient {
    http: HttpClient,
    signer: RequestSigner,
    hostname: String,
}

impl HttpApiClient {
    pub fn new(config: &SdkConfig) -> Result<Self> {
        if !config.credentials.is_complete() {
            return Err(SdkError::Config(
                "API id and API key are required".to_string(),
            ));
        }

        let http = HttpClient::new(HttpClientConfig {
            connect_timeout: config.connect_timeout,
            request_timeout: config.request_timeout,
        });

        Ok(Self {
            http,
            signer: RequestSigner::new(&config.credentials.api_id, &config.credentials.api_key),
            hostname: config.hostname.clone(),
        })
    }
}

impl ApiClient for HttpApiClient {
    #[instrument(skip(self, query, body), fields(method = %method, path = %path))]
    fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Value> {
        let url = api_url(&self.hostname, path, query);

        let mut request = HttpRequest::new(method, &url)
            .with_header("Content-Type", "application/json")
            .with_header("Accept", "application/json")
            .with_header("Authorization", self.signer.authorization(&url));
        if let Some(body) = body {
            request = request.with_body(serde_json::to_string(body)?);
        }

        let response = self.http.send(&request)?;
        debug!(status = response.status, "api response");

        let content = parse_body(&response.body);
        if !response.is_success() {
            return Err(api_error(response.status, &content, &response.body));
        }
        Ok(content)
    }
}

/// Decode a reply body; anything that is not JSON becomes `Value::Null`.
pub(crate) fn parse_body(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or(Value::Null)
}

fn api_error(status: u16, content: &Value, raw: &str) -> SdkError {
    let message = content
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| {
            let raw = raw.trim();
            if raw.is_empty() {
                "no message".to_string()
            } else {
                raw.to_string()
            }
        });
    SdkError::Api { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;
    use serde_json::json;

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(r#"{"a":1}"#), json!({"a": 1}));
        assert_eq!(parse_body(""), Value::Null);
        assert_eq!(parse_body("<html>oops</html>"), Value::Null);
    }

    #[test]
    fn test_api_error_prefers_message_field() {
        let err = api_error(404, &json!({"message": "Environment not found"}), "ignored");
        match err {
            SdkError::Api { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Environment not found");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_api_error_falls_back_to_raw_body() {
        let err = api_error(502, &Value::Null, " Bad Gateway ");
        assert_eq!(err.to_string(), "api error [502]: Bad Gateway");

        let err = api_error(500, &Value::Null, "");
        assert_eq!(err.to_string(), "api error [500]: no message");
    }

    #[test]
    fn test_http_client_requires_credentials() {
        let err = HttpApiClient::new(&SdkConfig::default()).err().unwrap();
        assert!(matches!(err, SdkError::Config(_)));

        let config = SdkConfig::new().with_credentials(Credentials::new("id", "key"));
        assert!(HttpApiClient::new(&config).is_ok());
    }
}

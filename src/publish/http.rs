//! HTTP transport and submission endpoint discovery

use std::time::Duration;

use serde_json::Value;

use crate::config::ResolvedServer;
use crate::error::RoxError;

/// Link relation of the payload submission endpoint
pub const TEST_PAYLOADS_REL: &str = "v1:test-payloads";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Outgoing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// POST with a JSON body
    pub fn post_json(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: Some(body.into()),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Value of a header, case-insensitive
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Received response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Blocking HTTP transport
pub trait HttpClient {
    /// Send a request; only transport-level failures are errors
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, RoxError>;
}

/// [`HttpClient`] backed by reqwest
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Build HTTP client with timeout
    pub fn new() -> Result<Self, RoxError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("rox-client/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RoxError::transport_error(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, RoxError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().map_err(|e| {
            RoxError::transport_error(format!("unable to reach {}: {}", request.url, e))
        })?;
        let status = response.status().as_u16();
        let body = response.text().map_err(|e| {
            RoxError::transport_error(format!("unable to read response from {}: {}", request.url, e))
        })?;

        Ok(HttpResponse { status, body })
    }
}

/// Find the payload submission URL from the server root resource
///
/// Any failure here is a configuration error.
pub fn discover_submission_endpoint(
    http: &dyn HttpClient,
    server: &ResolvedServer,
) -> Result<String, RoxError> {
    let request = HttpRequest::get(&server.api_url)
        .header("Authorization", server.credentials.authorization());

    let response = http.send(request).map_err(|e| {
        RoxError::config_error(format!("unable to reach ROX server {}: {}", server.name, e))
    })?;
    if !response.is_success() {
        return Err(RoxError::config_error(format!(
            "ROX server {} ({}) returned an HTTP {} error.",
            server.name, server.api_url, response.status
        )));
    }

    let resources: Value = serde_json::from_str(&response.body).map_err(|e| {
        RoxError::config_error(format!(
            "invalid JSON in {} response: {}",
            server.name, e
        ))
    })?;

    resources
        .pointer(&format!("/_links/{}/href", TEST_PAYLOADS_REL))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            RoxError::config_error(format!(
                "missing link for {} in {} response.",
                TEST_PAYLOADS_REL, server.name
            ))
        })
}

#[cfg(test)]
pub(crate) mod fake {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::*;

    /// Scripted transport recording every request
    #[derive(Default)]
    pub struct FakeHttp {
        pub responses: RefCell<VecDeque<Result<HttpResponse, RoxError>>>,
        pub requests: RefCell<Vec<HttpRequest>>,
    }

    impl FakeHttp {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(self, status: u16, body: &str) -> Self {
            self.responses.borrow_mut().push_back(Ok(HttpResponse {
                status,
                body: body.to_string(),
            }));
            self
        }

        pub fn fail(self, message: &str) -> Self {
            self.responses
                .borrow_mut()
                .push_back(Err(RoxError::transport_error(message)));
            self
        }

        pub fn sent(&self) -> Vec<HttpRequest> {
            self.requests.borrow().clone()
        }
    }

    impl HttpClient for FakeHttp {
        fn send(&self, request: HttpRequest) -> Result<HttpResponse, RoxError> {
            self.requests.borrow_mut().push(request);
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(RoxError::transport_error("no scripted response")))
        }
    }

    impl HttpClient for std::rc::Rc<FakeHttp> {
        fn send(&self, request: HttpRequest) -> Result<HttpResponse, RoxError> {
            self.as_ref().send(request)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeHttp;
    use super::*;
    use crate::config::Credentials;

    fn server() -> ResolvedServer {
        ResolvedServer {
            name: "dev".to_string(),
            api_url: "https://rox.example.com/api".to_string(),
            credentials: Credentials {
                key_id: "id1".to_string(),
                secret: "s3cr3t".to_string(),
            },
        }
    }

    #[test]
    fn test_discover_submission_endpoint() {
        let http = FakeHttp::new().respond(
            200,
            r#"{"_links":{"self":{"href":"https://rox.example.com/api"},"v1:test-payloads":{"href":"https://rox.example.com/api/payloads"}}}"#,
        );

        let url = discover_submission_endpoint(&http, &server()).unwrap();
        assert_eq!(url, "https://rox.example.com/api/payloads");

        let sent = http.sent();
        assert_eq!(sent[0].method, Method::Get);
        assert_eq!(
            sent[0].header_value("authorization"),
            Some(r#"RoxApiKey id="id1" secret="s3cr3t""#)
        );
    }

    #[test]
    fn test_missing_link_is_a_configuration_error() {
        let http = FakeHttp::new().respond(200, r#"{"_links":{}}"#);
        let err = discover_submission_endpoint(&http, &server()).unwrap_err();
        assert!(err.is_fatal_to_publishing());
        assert!(err.to_string().contains("missing link for v1:test-payloads in dev"));
    }

    #[test]
    fn test_discovery_failures_are_configuration_errors() {
        let http = FakeHttp::new()
            .respond(401, "unauthorized")
            .respond(200, "<html>")
            .fail("connection refused");

        for _ in 0..3 {
            let err = discover_submission_endpoint(&http, &server()).unwrap_err();
            assert!(err.is_fatal_to_publishing(), "{}", err);
        }
    }

    #[test]
    fn test_post_json_sets_content_type() {
        let request = HttpRequest::post_json("http://x", "{}");
        assert_eq!(request.header_value("content-type"), Some("application/json"));
        assert_eq!(request.body.as_deref(), Some("{}"));
    }
}

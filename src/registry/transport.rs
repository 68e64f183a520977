//! HTTP capability consumed by the registry client
//!
//! The client only needs "send a request, get status, headers and a text
//! body back". [`HttpTransport`] captures that so the challenge flow and the
//! typed operations can run against reqwest in production and against
//! scripted responses in tests.

use crate::cli::config::AuthConfig;
use crate::error::handlers::NetworkErrorHandler;
use crate::error::{RegistryError, Result};
use crate::logging::Logger;
use async_trait::async_trait;
use reqwest::{Client, Method};
use std::time::Duration;

/// Outgoing request
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// Send the configured credentials along with the request
    pub with_credentials: bool,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            with_credentials: false,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn with_credentials(mut self, with_credentials: bool) -> Self {
        self.with_credentials = with_credentials;
        self
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Response as seen by the client; non-2xx statuses are values, not errors
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Abstract HTTP client. Implementations only fail for transport problems
/// (connection, TLS, undecodable body).
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// reqwest-backed transport. "Credentials" are HTTP basic credentials.
pub struct ReqwestTransport {
    client: Client,
    credentials: Option<AuthConfig>,
    output: Logger,
}

pub struct ReqwestTransportBuilder {
    credentials: Option<AuthConfig>,
    skip_tls: bool,
    timeout: u64,
    output: Logger,
}

impl ReqwestTransportBuilder {
    pub fn new() -> Self {
        Self {
            credentials: None,
            skip_tls: false,
            timeout: 60,
            output: Logger::default(),
        }
    }

    pub fn with_credentials(mut self, credentials: Option<AuthConfig>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_skip_tls(mut self, skip_tls: bool) -> Self {
        self.skip_tls = skip_tls;
        self
    }

    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_logger(mut self, output: Logger) -> Self {
        self.output = output;
        self
    }

    pub fn build(self) -> Result<ReqwestTransport> {
        let mut builder = Client::builder().timeout(Duration::from_secs(self.timeout));
        if self.skip_tls {
            builder = builder
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true);
        }
        let client = builder
            .build()
            .map_err(|e| RegistryError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(ReqwestTransport {
            client,
            credentials: self.credentials,
            output: self.output,
        })
    }
}

impl Default for ReqwestTransportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReqwestTransport {
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::new()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        self.output
            .trace(&format!("{} {}", request.method, request.url));

        let mut builder = self.client.request(request.method.clone(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if request.with_credentials {
            if let Some(credentials) = &self.credentials {
                builder = builder.basic_auth(&credentials.username, Some(&credentials.password));
            }
        }

        let response = builder
            .send()
            .await
            .map_err(|e| NetworkErrorHandler::handle_network_error(&e, &request.url))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RegistryError::Network(format!("Failed to read response body: {}", e)))?;
        let body = String::from_utf8(bytes.to_vec())?;

        self.output
            .trace(&format!("{} {} -> {}", request.method, request.url, status));

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

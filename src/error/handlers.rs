//! Standardized error handling patterns for registry responses

use crate::error::RegistryError;
use reqwest::StatusCode;
use serde_json::Value;

/// Standard error handler for HTTP responses
pub struct HttpErrorHandler;

impl HttpErrorHandler {
    /// Build an HTTP error, preferring the message the registry put in a JSON body
    pub fn from_response(status: u16, body: &str) -> RegistryError {
        let message = Self::server_message(body).unwrap_or_else(|| Self::status_text(status));
        RegistryError::Http { status, message }
    }

    /// Extract the server-provided message from a registry JSON error body.
    ///
    /// Registries answer with `{"errors":[{"code":..,"message":..}]}`; some
    /// proxies use a flat `{"message":..}` instead.
    pub fn server_message(body: &str) -> Option<String> {
        let json: Value = serde_json::from_str(body).ok()?;

        let from_errors = json
            .get("errors")
            .and_then(|e| e.as_array())
            .and_then(|arr| arr.first())
            .and_then(|first| first.get("message"))
            .and_then(|m| m.as_str());

        from_errors
            .or_else(|| json.get("message").and_then(|m| m.as_str()))
            .filter(|m| !m.is_empty())
            .map(|m| m.to_string())
    }

    /// Canonical reason phrase for a status code
    pub fn status_text(status: u16) -> String {
        StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .map(|r| r.to_string())
            .unwrap_or_else(|| format!("HTTP status {}", status))
    }

    /// Describe a failed registry operation for log output
    pub fn describe(status: u16, message: &str, operation: &str) -> String {
        match status {
            401 => format!("Unauthorized to perform {}: {}", operation, message),
            403 => format!("Forbidden: insufficient permissions for {}: {}", operation, message),
            404 => format!("Resource not found for {}: {}", operation, message),
            405 => format!("{} not allowed by the registry: {}", operation, message),
            429 => format!("Rate limited during {}: {}", operation, message),
            500 => format!("Registry server error during {}: {}", operation, message),
            502 | 503 => format!("Registry unavailable for {}: {}", operation, message),
            _ => format!("{} failed (status {}): {}", operation, status, message),
        }
    }
}

/// Network error categorization and handling
pub struct NetworkErrorHandler;

impl NetworkErrorHandler {
    /// Categorize and format network errors with helpful context
    pub fn handle_network_error(error: &reqwest::Error, context: &str) -> RegistryError {
        if error.is_timeout() {
            RegistryError::Network(format!("{} timeout: {}", context, error))
        } else if error.is_connect() {
            RegistryError::Network(format!("Connection error during {}: {}", context, error))
        } else if error.to_string().contains("dns") {
            RegistryError::Network(format!("DNS resolution error for {}: {}", context, error))
        } else if error.to_string().contains("certificate") {
            RegistryError::Network(format!(
                "TLS certificate error during {}: {}",
                context, error
            ))
        } else {
            RegistryError::Network(format!("{} network error: {}", context, error))
        }
    }
}

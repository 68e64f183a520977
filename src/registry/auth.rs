//! Bearer token challenge handling for Docker registry access
//!
//! A registry that wants a token answers 401 with
//! `WWW-Authenticate: Bearer realm="…",service="…",scope="…"`. The client
//! fetches a token from the realm and repeats the request with it.

use crate::error::{RegistryError, Result};
use crate::logging::Logger;
use crate::registry::transport::{HttpRequest, HttpTransport};
use serde::Deserialize;
use std::collections::HashMap;
use url::Url;

/// Parameters of a `WWW-Authenticate: Bearer` challenge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerChallenge {
    pub realm: String,
    pub service: String,
    pub scope: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
    access_token: Option<String>,
}

impl BearerChallenge {
    /// Parse the header value. Returns `None` unless the scheme is Bearer and
    /// realm, service and scope are all present.
    pub fn parse(header: &str) -> Option<Self> {
        let header = header.trim();
        let (scheme, params) = header.split_once(char::is_whitespace)?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return None;
        }

        let params = parse_params(params);
        Some(Self {
            realm: params.get("realm")?.clone(),
            service: params.get("service")?.clone(),
            scope: params.get("scope")?.clone(),
        })
    }

    /// `realm?service=<service>&scope=<scope>` with both values form-encoded
    pub fn token_url(&self) -> Result<String> {
        let mut url = Url::parse(&self.realm).map_err(|e| {
            RegistryError::AuthChallenge(format!("Invalid token realm {}: {}", self.realm, e))
        })?;
        url.query_pairs_mut()
            .append_pair("service", &self.service)
            .append_pair("scope", &self.scope);
        Ok(url.to_string())
    }
}

/// Split `key="value",key2="value, with comma"` respecting quotes
fn parse_params(input: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    let mut chars = input.chars().peekable();

    loop {
        while matches!(chars.peek(), Some(c) if c.is_whitespace() || *c == ',') {
            chars.next();
        }

        let mut key = String::new();
        while let Some(&c) = chars.peek() {
            if c == '=' || c == ',' {
                break;
            }
            key.push(c);
            chars.next();
        }
        if key.trim().is_empty() {
            break;
        }

        if chars.next() != Some('=') {
            continue;
        }

        let mut value = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            value.push(escaped);
                        }
                    }
                    '"' => break,
                    other => value.push(other),
                }
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c == ',' {
                    break;
                }
                value.push(c);
                chars.next();
            }
        }

        params.insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
    }

    params
}

/// Token endpoint access
pub struct Auth;

impl Auth {
    /// Fetch a token for the challenge using the same credential mode as the
    /// request that was challenged. `Ok(None)` means the endpoint answered but
    /// gave no token.
    pub async fn fetch_token(
        transport: &dyn HttpTransport,
        challenge: &BearerChallenge,
        with_credentials: bool,
        output: &Logger,
    ) -> Result<Option<String>> {
        let url = challenge.token_url()?;
        output.detail(&format!("Requesting token from: {}", url));

        let request = HttpRequest::get(url).with_credentials(with_credentials);
        let response = transport
            .send(&request)
            .await
            .map_err(|e| RegistryError::AuthChallenge(format!("Token request failed: {}", e)))?;

        if !response.is_success() {
            return Err(RegistryError::AuthChallenge(format!(
                "Token request to {} failed with status {}",
                challenge.realm, response.status
            )));
        }

        let token_response: TokenResponse = serde_json::from_str(&response.body).map_err(|e| {
            RegistryError::AuthChallenge(format!("Failed to parse token response: {}", e))
        })?;

        let token = token_response.token.or(token_response.access_token);
        match &token {
            Some(token) => output.detail(&format!("Token obtained (length: {} chars)", token.len())),
            None => output.warning("Token endpoint returned no token"),
        }

        Ok(token)
    }
}

//! Registry API client
//!
//! Every request goes through [`AttemptState`]: send, and on a 401 carrying a
//! Bearer challenge fetch a token once and repeat the request with it. The
//! typed operations on top (catalog, tags, manifests, blobs, delete) are the
//! only calls the rest of the crate makes against a registry.

use crate::common::{DigestUtils, FormatUtils};
use crate::error::handlers::HttpErrorHandler;
use crate::error::{RegistryError, Result};
use crate::logging::Logger;
use crate::registry::auth::{Auth, BearerChallenge};
use crate::registry::cache::ResponseCache;
use crate::registry::manifest::{
    CatalogResponse, Manifest, TagListResponse, manifest_accept, manifest_list_accept,
};
use crate::registry::transport::{HttpRequest, HttpResponse, HttpTransport};
use serde::de::DeserializeOwned;
use std::sync::Arc;

pub const DOCKER_CONTENT_DIGEST: &str = "Docker-Content-Digest";

/// One step of a request's lifecycle
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptState {
    /// Request ready to go out; `retried` marks the second and last attempt
    Sent { request: HttpRequest, retried: bool },
    /// 401 with a usable Bearer challenge; `request` is the original request
    Challenge {
        request: HttpRequest,
        challenge: BearerChallenge,
    },
    /// Original request rewritten with the fetched token
    Retry { request: HttpRequest },
    Done(HttpResponse),
    Failed(RegistryError),
}

impl AttemptState {
    pub fn start(request: HttpRequest) -> Self {
        AttemptState::Sent {
            request,
            retried: false,
        }
    }

    /// Transition after a response to a `Sent` request
    pub fn received(request: HttpRequest, retried: bool, response: HttpResponse) -> Self {
        if response.is_success() {
            return AttemptState::Done(response);
        }

        if response.status == 401 && !retried {
            let challenge = response
                .header("WWW-Authenticate")
                .and_then(BearerChallenge::parse);
            if let Some(challenge) = challenge {
                return AttemptState::Challenge { request, challenge };
            }
        }

        AttemptState::Failed(HttpErrorHandler::from_response(response.status, &response.body))
    }

    /// Transition once the token endpoint answered
    pub fn token_fetched(request: HttpRequest, token: Option<String>) -> Self {
        AttemptState::Retry {
            request: retry_request(&request, token.as_deref()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AttemptState::Done(_) | AttemptState::Failed(_))
    }
}

/// The original request with `Authorization: Bearer` added. Bearer and
/// credentials are never sent together.
pub fn retry_request(original: &HttpRequest, token: Option<&str>) -> HttpRequest {
    let mut request = original.clone();
    request
        .headers
        .retain(|(name, _)| !name.eq_ignore_ascii_case("authorization"));
    match token {
        Some(token) => {
            request
                .headers
                .push(("Authorization".to_string(), format!("Bearer {}", token)));
            request.with_credentials = false;
        }
        None => request.with_credentials = original.with_credentials,
    }
    request
}

pub struct RegistryClientBuilder {
    transport: Arc<dyn HttpTransport>,
    cache: Option<ResponseCache>,
    output: Logger,
}

impl RegistryClientBuilder {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            cache: None,
            output: Logger::default(),
        }
    }

    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_logger(mut self, output: Logger) -> Self {
        self.output = output;
        self
    }

    pub fn build(self) -> RegistryClient {
        RegistryClient {
            transport: self.transport,
            cache: self.cache.unwrap_or_default(),
            output: self.output,
        }
    }
}

#[derive(Clone)]
pub struct RegistryClient {
    transport: Arc<dyn HttpTransport>,
    cache: ResponseCache,
    output: Logger,
}

impl RegistryClient {
    pub fn builder(transport: Arc<dyn HttpTransport>) -> RegistryClientBuilder {
        RegistryClientBuilder::new(transport)
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn logger(&self) -> &Logger {
        &self.output
    }

    /// Drive a request to a terminal state, retrying at most once
    pub async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut state = AttemptState::start(request);

        loop {
            state = match state {
                AttemptState::Sent { request, retried } => {
                    self.output
                        .trace(&format!("{} {} (retry: {})", request.method, request.url, retried));
                    match self.transport.send(&request).await {
                        Ok(response) => AttemptState::received(request, retried, response),
                        Err(e) => AttemptState::Failed(e),
                    }
                }
                AttemptState::Challenge { request, challenge } => {
                    self.output.verbose(&format!(
                        "Registry requested a token for scope {}",
                        challenge.scope
                    ));
                    match Auth::fetch_token(
                        self.transport.as_ref(),
                        &challenge,
                        request.with_credentials,
                        &self.output,
                    )
                    .await
                    {
                        Ok(token) => AttemptState::token_fetched(request, token),
                        Err(e) => AttemptState::Failed(e),
                    }
                }
                AttemptState::Retry { request } => AttemptState::Sent {
                    request,
                    retried: true,
                },
                AttemptState::Done(response) => return Ok(response),
                AttemptState::Failed(error) => return Err(error),
            };
        }
    }

    fn parse_json<T: DeserializeOwned>(body: &str, what: &str) -> Result<T> {
        serde_json::from_str(body)
            .map_err(|e| RegistryError::Parse(format!("Failed to parse {}: {}", what, e)))
    }

    /// Store a content-addressed body, but only if it hashes to its address
    fn cache_verified(&self, url: &str, reference: &str, body: &str, digest: Option<&str>) {
        if !DigestUtils::is_sha256_reference(reference) {
            return;
        }
        if !DigestUtils::matches(body.as_bytes(), reference) {
            self.output.warning(&format!(
                "Content of {} does not match its digest, not caching",
                url
            ));
            return;
        }
        if self.cache.set(url, body, digest) {
            self.output.detail(&format!("Cached {}", url));
        }
    }

    /// `GET /v2/_catalog?n=<limit>`
    pub async fn list_catalog(
        &self,
        base_url: &str,
        limit: usize,
        with_credentials: bool,
    ) -> Result<Vec<String>> {
        let url = format!("{}/v2/_catalog?n={}", FormatUtils::trim_base(base_url), limit);
        let request = HttpRequest::get(url).with_credentials(with_credentials);
        let response = self.execute(request).await?;
        let catalog: CatalogResponse = Self::parse_json(&response.body, "catalog")?;
        Ok(catalog.repositories.unwrap_or_default())
    }

    /// `GET /v2/<name>/tags/list`
    pub async fn list_tags(
        &self,
        base_url: &str,
        name: &str,
        with_credentials: bool,
    ) -> Result<Vec<String>> {
        let url = format!("{}/v2/{}/tags/list", FormatUtils::trim_base(base_url), name);
        let request = HttpRequest::get(url).with_credentials(with_credentials);
        let response = self.execute(request).await?;
        let tags: TagListResponse = Self::parse_json(&response.body, "tag list")?;
        Ok(tags.tags.unwrap_or_default())
    }

    pub async fn count_tags(
        &self,
        base_url: &str,
        name: &str,
        with_credentials: bool,
    ) -> Result<usize> {
        Ok(self.list_tags(base_url, name, with_credentials).await?.len())
    }

    /// Raw manifest body. Digest references are served from and stored in
    /// the response cache.
    pub async fn get_manifest_text(
        &self,
        base_url: &str,
        name: &str,
        reference: &str,
        with_credentials: bool,
        accept_list: bool,
        no_cache: bool,
    ) -> Result<String> {
        let url = format!(
            "{}/v2/{}/manifests/{}",
            FormatUtils::trim_base(base_url),
            name,
            reference
        );

        if let Some(cached) = self.cache.get(&url) {
            self.output.detail(&format!("Cache hit for {}", url));
            return Ok(cached.body);
        }

        let accept = if accept_list {
            manifest_list_accept()
        } else {
            manifest_accept()
        };
        let mut request = HttpRequest::get(url.clone())
            .with_header("Accept", accept)
            .with_credentials(with_credentials);
        if no_cache {
            request = request.with_header("Cache-Control", "no-store, no-cache");
        }

        let response = self.execute(request).await?;
        self.cache_verified(
            &url,
            reference,
            &response.body,
            response.header(DOCKER_CONTENT_DIGEST),
        );
        Ok(response.body)
    }

    /// `GET /v2/<name>/manifests/<reference>`
    pub async fn get_manifest(
        &self,
        base_url: &str,
        name: &str,
        reference: &str,
        with_credentials: bool,
        accept_list: bool,
        no_cache: bool,
    ) -> Result<Manifest> {
        let body = self
            .get_manifest_text(base_url, name, reference, with_credentials, accept_list, no_cache)
            .await?;
        Self::parse_json(&body, "manifest")
    }

    /// The `Docker-Content-Digest` a GET of the manifest reports, accepting
    /// every manifest type so lists resolve to their own digest
    pub async fn get_manifest_digest(
        &self,
        base_url: &str,
        name: &str,
        reference: &str,
        with_credentials: bool,
    ) -> Result<Option<String>> {
        let url = format!(
            "{}/v2/{}/manifests/{}",
            FormatUtils::trim_base(base_url),
            name,
            reference
        );
        let request = HttpRequest::get(url)
            .with_header("Accept", manifest_list_accept())
            .with_credentials(with_credentials);
        let response = self.execute(request).await?;
        Ok(response.header(DOCKER_CONTENT_DIGEST).map(|d| d.to_string()))
    }

    /// Raw blob body; only `sha256:<hex>` digests use the cache
    pub async fn get_blob_text(
        &self,
        base_url: &str,
        name: &str,
        digest: &str,
        with_credentials: bool,
    ) -> Result<String> {
        let url = format!("{}/v2/{}/blobs/{}", FormatUtils::trim_base(base_url), name, digest);
        let use_cache = DigestUtils::is_sha256_reference(digest);

        if use_cache {
            if let Some(cached) = self.cache.get(&url) {
                self.output.detail(&format!("Cache hit for {}", url));
                return Ok(cached.body);
            }
        }

        let request = HttpRequest::get(url.clone())
            .with_header("Accept", manifest_accept())
            .with_credentials(with_credentials);
        let response = self.execute(request).await?;

        if use_cache {
            self.cache_verified(
                &url,
                digest,
                &response.body,
                response.header(DOCKER_CONTENT_DIGEST),
            );
        }
        Ok(response.body)
    }

    /// `GET /v2/<name>/blobs/<digest>` decoded as JSON
    pub async fn get_blob<T: DeserializeOwned>(
        &self,
        base_url: &str,
        name: &str,
        digest: &str,
        with_credentials: bool,
    ) -> Result<T> {
        let body = self
            .get_blob_text(base_url, name, digest, with_credentials)
            .await?;
        Self::parse_json(&body, "blob")
    }

    /// `DELETE /v2/<name>/manifests/<digest>`; registries only delete by digest
    pub async fn delete_manifest(
        &self,
        base_url: &str,
        name: &str,
        digest: &str,
        with_credentials: bool,
        expected_digest: &str,
    ) -> Result<()> {
        let url = format!(
            "{}/v2/{}/manifests/{}",
            FormatUtils::trim_base(base_url),
            name,
            digest
        );
        let request = HttpRequest::delete(url)
            .with_header(DOCKER_CONTENT_DIGEST, expected_digest)
            .with_credentials(with_credentials);
        self.execute(request).await?;
        self.output
            .verbose(&format!("Deleted manifest {} of {}", digest, name));
        Ok(())
    }
}

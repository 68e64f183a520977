//! Registry client against a scripted registry: token challenge, caching,
//! manifest digests

mod common;

use common::{BASE, ScriptedTransport, client, json};
use docker_registry_browser::RegistryError;
use docker_registry_browser::common::DigestUtils;
use docker_registry_browser::registry::HttpResponse;
use std::collections::HashMap;

const CHALLENGE: &str = r#"Bearer realm="https://auth",service="reg",scope="repository:app:pull""#;

fn unauthorized() -> HttpResponse {
    HttpResponse::new(401, r#"{"errors":[{"code":"UNAUTHORIZED","message":"authentication required"}]}"#)
        .with_header("WWW-Authenticate", CHALLENGE)
}

#[tokio::test]
async fn test_challenge_fetches_token_once_and_retries_with_bearer() {
    let transport = ScriptedTransport::new();
    transport.route(
        reqwest::Method::GET,
        "http://reg/v2/app/tags/list",
        vec![unauthorized(), json(r#"{"name":"app","tags":["v1","v2"]}"#)],
    );
    transport.get("https://auth", json(r#"{"token":"tok"}"#));

    let tags = client(&transport).list_tags(BASE, "app", true).await.unwrap();
    assert_eq!(tags, vec!["v1", "v2"]);

    let requests = transport.requests();
    assert_eq!(requests.len(), 3);

    let token_request = &requests[1];
    assert!(token_request.with_credentials);
    let token_url = url::Url::parse(&token_request.url).unwrap();
    assert_eq!(token_url.host_str(), Some("auth"));
    let query: HashMap<String, String> = token_url.query_pairs().into_owned().collect();
    assert_eq!(query.get("service").map(String::as_str), Some("reg"));
    assert_eq!(query.get("scope").map(String::as_str), Some("repository:app:pull"));
    assert!(token_request.url.contains("scope=repository%3Aapp%3Apull"));

    let retry = &requests[2];
    assert_eq!(retry.url, "http://reg/v2/app/tags/list");
    assert_eq!(retry.header("Authorization"), Some("Bearer tok"));
    assert!(!retry.with_credentials);
}

#[tokio::test]
async fn test_second_unauthorized_is_not_retried() {
    let transport = ScriptedTransport::new();
    transport.get("http://reg/v2/app/tags/list", unauthorized());
    transport.get("https://auth", json(r#"{"access_token":"tok"}"#));

    let err = client(&transport).list_tags(BASE, "app", false).await.unwrap_err();
    assert!(matches!(err, RegistryError::Http { status: 401, .. }));
    assert_eq!(err.user_message(), "authentication required");
    assert_eq!(transport.requests_to("https://auth").len(), 1);
    assert_eq!(transport.requests().len(), 3);
}

#[tokio::test]
async fn test_missing_token_keeps_credential_mode() {
    let transport = ScriptedTransport::new();
    transport.route(
        reqwest::Method::GET,
        "http://reg/v2/app/tags/list",
        vec![unauthorized(), json(r#"{"name":"app","tags":[]}"#)],
    );
    transport.get("https://auth", json("{}"));

    let tags = client(&transport).list_tags(BASE, "app", true).await.unwrap();
    assert!(tags.is_empty());

    let retry = &transport.requests()[2];
    assert_eq!(retry.header("Authorization"), None);
    assert!(retry.with_credentials);
}

#[tokio::test]
async fn test_failed_token_request_is_auth_error() {
    let transport = ScriptedTransport::new();
    transport.get("http://reg/v2/_catalog", unauthorized());
    transport.get("https://auth", HttpResponse::new(500, "boom"));

    let err = client(&transport).list_catalog(BASE, 100, false).await.unwrap_err();
    assert!(matches!(err, RegistryError::AuthChallenge(_)));
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test]
async fn test_unusable_challenge_surfaces_status() {
    let transport = ScriptedTransport::new();
    transport.get(
        "http://reg/v2/_catalog",
        HttpResponse::new(401, "").with_header("WWW-Authenticate", r#"Basic realm="reg""#),
    );

    let err = client(&transport).list_catalog(BASE, 100, false).await.unwrap_err();
    assert_eq!(
        err,
        RegistryError::Http {
            status: 401,
            message: "Unauthorized".to_string()
        }
    );
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn test_verified_blob_is_served_from_cache() {
    let body = r#"{"architecture":"amd64","os":"linux"}"#;
    let digest = DigestUtils::compute_docker_digest(body.as_bytes());
    let url = format!("http://reg/v2/app/blobs/{}", digest);

    let transport = ScriptedTransport::new();
    transport.get(&url, json(body).with_header("Docker-Content-Digest", digest.clone()));
    let client = client(&transport);

    assert_eq!(client.get_blob_text(BASE, "app", &digest, false).await.unwrap(), body);
    assert_eq!(client.get_blob_text(BASE, "app", &digest, false).await.unwrap(), body);
    assert_eq!(transport.requests().len(), 1);

    // The key is the digest suffix, shared across repositories and registries
    let elsewhere = format!("https://other/v2/mirror/app/blobs/{}", digest);
    let cached = client.cache().get(&elsewhere).unwrap();
    assert_eq!(cached.body, body);
    assert_eq!(cached.digest.as_deref(), Some(digest.as_str()));
}

#[tokio::test]
async fn test_mismatched_blob_is_not_cached() {
    let digest = DigestUtils::compute_docker_digest(b"expected");
    let url = format!("http://reg/v2/app/blobs/{}", digest);

    let transport = ScriptedTransport::new();
    transport.get(&url, json(r#""tampered""#));
    let client = client(&transport);

    client.get_blob_text(BASE, "app", &digest, false).await.unwrap();
    client.get_blob_text(BASE, "app", &digest, false).await.unwrap();
    assert_eq!(transport.requests().len(), 2);
    assert!(client.cache().get(&url).is_none());
}

#[tokio::test]
async fn test_manifest_by_tag_is_never_cached() {
    let transport = ScriptedTransport::new();
    transport.get(
        "http://reg/v2/app/manifests/latest",
        json(r#"{"schemaVersion":2,"layers":[{"digest":"sha256:aa","size":10},{"digest":"sha256:bb","size":5}]}"#),
    );
    let client = client(&transport);

    for _ in 0..2 {
        let manifest = client
            .get_manifest(BASE, "app", "latest", false, false, true)
            .await
            .unwrap();
        assert_eq!(manifest.total_size(), Some(15));
    }

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].header("Cache-Control"), Some("no-store, no-cache"));
    assert!(requests[0].header("Accept").unwrap().contains("application/vnd.oci.image.manifest.v1+json"));
}

#[tokio::test]
async fn test_manifest_digest_header() {
    let transport = ScriptedTransport::new();
    transport.get(
        "http://reg/v2/app/manifests/v1",
        json("{}").with_header("docker-content-digest", "sha256:abc"),
    );
    transport.get("http://reg/v2/app/manifests/v2", json("{}"));
    let client = client(&transport);

    assert_eq!(
        client.get_manifest_digest(BASE, "app", "v1", false).await.unwrap(),
        Some("sha256:abc".to_string())
    );
    assert_eq!(client.get_manifest_digest(BASE, "app", "v2", false).await.unwrap(), None);

    let accept = transport.requests()[0].header("Accept").unwrap().to_string();
    assert!(accept.contains("application/vnd.docker.distribution.manifest.list.v2+json"));
    assert!(accept.contains("application/vnd.oci.image.index.v1+json"));
}

#[tokio::test]
async fn test_not_found_reports_registry_message() {
    let transport = ScriptedTransport::new();
    let err = client(&transport)
        .get_manifest(BASE, "app", "missing", false, true, false)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.user_message(), "manifest unknown");
}

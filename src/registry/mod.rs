//! Registry module for Docker registry interactions
//!
//! This module provides the transport abstraction, Bearer challenge handling,
//! the content-addressed response cache and the typed client for the Docker
//! Registry HTTP API v2.

pub mod auth;
pub mod cache;
pub mod client;
pub mod manifest;
pub mod transport;

pub use crate::cli::config::AuthConfig;
pub use auth::{Auth, BearerChallenge};
pub use cache::{CachedResponse, ResponseCache};
pub use client::{AttemptState, RegistryClient, RegistryClientBuilder};
pub use manifest::{Descriptor, ImageConfig, Manifest, Platform};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};

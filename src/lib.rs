//! Docker Registry Browser Library
//!
//! This file serves as the library root for the docker-registry-browser crate,
//! organizing and exposing the modules that make up the application: registry
//! access with Bearer challenge handling, the response cache, the catalog
//! namespace tree, tag ordering, paging and enrichment, and persisted state.

pub mod catalog;
pub mod cli;
pub mod common;
pub mod error;
pub mod logging;
pub mod registry;
pub mod state;
pub mod tags;

pub use cli::config::{AuthConfig, BrowserConfig};
pub use error::{RegistryError, Result};
pub use logging::{Logger, Notifier};
pub use registry::{RegistryClient, ResponseCache};

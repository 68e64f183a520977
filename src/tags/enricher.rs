//! Tag metadata enrichment
//!
//! Every tag of a list is enriched concurrently: its manifest gives size and
//! architecture, its config blob gives the creation date, and a separate
//! digest request gives the content digest used for deletion. Failures leave
//! the record partially filled and are reported through a [`Notifier`].

use crate::error::{RegistryError, Result};
use crate::logging::Notifier;
use crate::registry::manifest::{ImageConfig, Manifest};
use crate::registry::RegistryClient;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;

/// One row of the tag list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagRecord {
    pub name: String,
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_digest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
}

impl TagRecord {
    pub fn new(name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag: tag.into(),
            size: None,
            creation_date: None,
            content_digest: None,
            arch: None,
        }
    }

    /// `name:tag`
    pub fn reference(&self) -> String {
        format!("{}:{}", self.name, self.tag)
    }
}

/// Manifest-derived part of a record
#[derive(Debug, Default)]
struct ManifestMetadata {
    size: Option<u64>,
    arch: Option<String>,
    creation_date: Option<DateTime<Utc>>,
}

pub struct TagMetadataEnricher<'a> {
    client: &'a RegistryClient,
    base_url: String,
    with_credentials: bool,
    no_cache: bool,
}

impl<'a> TagMetadataEnricher<'a> {
    pub fn new(client: &'a RegistryClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            with_credentials: false,
            no_cache: false,
        }
    }

    pub fn with_credentials(mut self, with_credentials: bool) -> Self {
        self.with_credentials = with_credentials;
        self
    }

    /// Ask intermediaries not to serve cached manifests
    pub fn with_no_cache(mut self, no_cache: bool) -> Self {
        self.no_cache = no_cache;
        self
    }

    /// Enrich all records, waiting for every one to settle. Order is kept.
    pub async fn enrich(&self, records: Vec<TagRecord>, notifier: &dyn Notifier) -> Vec<TagRecord> {
        if records.is_empty() {
            return records;
        }
        self.client
            .logger()
            .verbose(&format!("Loading metadata for {} tags", records.len()));

        join_all(records.into_iter().map(|record| self.enrich_one(record, notifier))).await
    }

    pub async fn enrich_one(&self, mut record: TagRecord, notifier: &dyn Notifier) -> TagRecord {
        let mut metadata = ManifestMetadata::default();
        let (filled, digest) = futures::join!(
            self.manifest_metadata(&record.name, &record.tag, &mut metadata),
            self.client.get_manifest_digest(
                &self.base_url,
                &record.name,
                &record.tag,
                self.with_credentials
            )
        );

        record.size = metadata.size;
        record.arch = metadata.arch;
        record.creation_date = metadata.creation_date;

        let mut failure: Option<RegistryError> = filled.err();
        match digest {
            Ok(digest) => record.content_digest = digest,
            Err(e) => {
                if failure.is_none() {
                    failure = Some(e);
                }
            }
        }

        if let Some(e) = failure {
            notifier.error(&format!(
                "Failed to load metadata for {}: {}",
                record.reference(),
                e.user_message()
            ));
        }

        record
    }

    /// Fills `metadata` step by step, so whatever was known before a failing
    /// fetch is kept
    async fn manifest_metadata(
        &self,
        name: &str,
        tag: &str,
        metadata: &mut ManifestMetadata,
    ) -> Result<()> {
        let manifest = self
            .client
            .get_manifest(&self.base_url, name, tag, self.with_credentials, true, self.no_cache)
            .await?;

        if manifest.is_list() {
            return self.list_metadata(name, &manifest, metadata).await;
        }

        if !manifest.layers.is_empty() {
            metadata.size = manifest.total_size();
        }

        if let Some(config) = &manifest.config {
            let blob: ImageConfig = self
                .client
                .get_blob(&self.base_url, name, &config.digest, self.with_credentials)
                .await?;
            metadata.arch = blob.platform_summary();
            metadata.creation_date = blob.created();
        }

        Ok(())
    }

    /// Architectures come from the list itself; the creation date from the
    /// first sub-manifest's config
    async fn list_metadata(
        &self,
        name: &str,
        list: &Manifest,
        metadata: &mut ManifestMetadata,
    ) -> Result<()> {
        let arch = list.architectures();
        if !arch.is_empty() {
            metadata.arch = Some(arch);
        }

        let Some(first) = list.manifests.first() else {
            return Ok(());
        };

        let sub_manifest = self
            .client
            .get_manifest(&self.base_url, name, &first.digest, self.with_credentials, false, self.no_cache)
            .await?;
        if let Some(config) = &sub_manifest.config {
            let blob: ImageConfig = self
                .client
                .get_blob(&self.base_url, name, &config.digest, self.with_credentials)
                .await?;
            metadata.creation_date = blob.created();
        }

        Ok(())
    }
}

//! Batch tag deletion
//!
//! Registries delete manifests by digest only, so each tag is first resolved
//! to its `Docker-Content-Digest` and then deleted with that digest as both
//! path and header. All tags are attempted concurrently and independently.

use crate::cli::config::BrowserConfig;
use crate::error::{RegistryError, Result};
use crate::logging::Notifier;
use crate::registry::RegistryClient;
use crate::tags::enricher::TagRecord;
use futures::future::join_all;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted { digest: String },
    /// The registry reported no digest; nothing was deleted
    MissingDigest,
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteReport {
    pub outcomes: Vec<(String, DeleteOutcome)>,
}

impl DeleteReport {
    pub fn deleted(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, DeleteOutcome::Deleted { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.deleted()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

async fn delete_one(
    client: &RegistryClient,
    config: &BrowserConfig,
    record: &TagRecord,
    notifier: &dyn Notifier,
) -> DeleteOutcome {
    let base = &config.registry_url;
    let secured = config.is_registry_secured;

    let digest = match client
        .get_manifest_digest(base, &record.name, &record.tag, secured)
        .await
    {
        Ok(Some(digest)) => digest,
        Ok(None) => {
            notifier.error(&format!("Could not get digest for {}", record.reference()));
            return DeleteOutcome::MissingDigest;
        }
        Err(e) => {
            notifier.error(&e.user_message());
            return DeleteOutcome::Failed(e.user_message());
        }
    };

    match client
        .delete_manifest(base, &record.name, &digest, secured, &digest)
        .await
    {
        Ok(()) => DeleteOutcome::Deleted { digest },
        Err(e) => {
            notifier.error(&e.user_message());
            DeleteOutcome::Failed(e.user_message())
        }
    }
}

/// Delete every record. Refused outright unless image deletion is enabled.
pub async fn delete_tags(
    client: &RegistryClient,
    config: &BrowserConfig,
    records: &[TagRecord],
    notifier: &dyn Notifier,
) -> Result<DeleteReport> {
    if !config.delete_images {
        return Err(RegistryError::Validation(
            "Image deletion is disabled for this registry".to_string(),
        ));
    }

    let outcomes = join_all(records.iter().map(|record| async move {
        let outcome = delete_one(client, config, record, notifier).await;
        (record.reference(), outcome)
    }))
    .await;

    let report = DeleteReport { outcomes };
    client.logger().verbose(&format!(
        "Deleted {} of {} tags",
        report.deleted(),
        report.outcomes.len()
    ));
    Ok(report)
}

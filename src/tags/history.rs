//! Image history of a tag
//!
//! The history view shows the image config's main settings followed by the
//! build history, newest step first. Multi-arch tags expose one tab per
//! platform; each tab resolves its own manifest and config blob.

use crate::cli::config::BrowserConfig;
use crate::error::{RegistryError, Result};
use crate::registry::manifest::{Manifest, parse_date};
use crate::registry::RegistryClient;
use serde::Serialize;
use serde_json::{Map, Value};

/// Config keys shown in the details block, in display order
pub const DETAIL_KEYS: &[&str] = &[
    "architecture",
    "User",
    "created",
    "docker_version",
    "os",
    "Cmd",
    "Entrypoint",
    "Env",
    "Labels",
    "Volumes",
    "WorkingDir",
    "author",
    "id",
    "ExposedPorts",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchTab {
    pub title: String,
    pub digest: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryField {
    pub key: String,
    pub value: Value,
}

impl HistoryField {
    fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    /// Value as display text; strings are shown without quotes
    pub fn display_value(&self) -> String {
        match &self.value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TagHistory {
    /// Platform tabs; empty for single-arch images
    pub archs: Vec<ArchTab>,
    pub details: Vec<HistoryField>,
    /// Build steps, newest first
    pub entries: Vec<Vec<HistoryField>>,
}

fn render_date(value: &Value) -> Value {
    match value.as_str().and_then(parse_date) {
        Some(date) => Value::String(date.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
        None => value.clone(),
    }
}

/// Details block: each key read from the nested `config` object first, then
/// from the top level
fn details(blob: &Map<String, Value>, custom_labels: &[String]) -> Vec<HistoryField> {
    let nested = blob.get("config").and_then(Value::as_object);
    let lookup = |key: &str| -> Option<&Value> {
        nested
            .and_then(|c| c.get(key))
            .filter(|v| !v.is_null())
            .or_else(|| blob.get(key).filter(|v| !v.is_null()))
    };

    let mut fields = Vec::new();
    for key in DETAIL_KEYS {
        if let Some(value) = lookup(key) {
            let value = if *key == "created" {
                render_date(value)
            } else {
                value.clone()
            };
            fields.push(HistoryField::new(*key, value));
        }
    }

    if let Some(labels) = lookup("Labels").and_then(Value::as_object) {
        for label in custom_labels {
            if let Some(value) = labels.get(label).filter(|v| !v.is_null()) {
                fields.push(HistoryField::new(label.clone(), value.clone()));
            }
        }
    }

    fields
}

/// History steps in reverse order. `empty_layer` is not shown; steps that
/// produced a layer get that layer's size.
fn entries(
    blob: &Map<String, Value>,
    layer_sizes: &[u64],
    client: &RegistryClient,
) -> Vec<Vec<HistoryField>> {
    let Some(history) = blob.get("history").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut layer_index = 0usize;
    let mut result = Vec::with_capacity(history.len());

    for step in history {
        let Some(step) = step.as_object() else {
            continue;
        };
        let empty = step
            .get("empty_layer")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let mut fields: Vec<HistoryField> = step
            .iter()
            .filter(|(key, _)| key.as_str() != "empty_layer")
            .map(|(key, value)| {
                if key == "created" {
                    HistoryField::new(key.clone(), render_date(value))
                } else {
                    HistoryField::new(key.clone(), value.clone())
                }
            })
            .collect();

        if !empty {
            if let Some(size) = layer_sizes.get(layer_index) {
                fields.push(HistoryField::new(
                    "size",
                    Value::String(client.logger().format_size(Some(*size))),
                ));
            }
            layer_index += 1;
        }

        result.push(fields);
    }

    result.reverse();
    result
}

async fn history_from_manifest(
    client: &RegistryClient,
    config: &BrowserConfig,
    name: &str,
    manifest: &Manifest,
) -> Result<TagHistory> {
    let Some(config_descriptor) = &manifest.config else {
        return Ok(TagHistory::default());
    };

    let blob: Value = client
        .get_blob(
            &config.registry_url,
            name,
            &config_descriptor.digest,
            config.is_registry_secured,
        )
        .await?;
    let blob = blob.as_object().ok_or_else(|| {
        RegistryError::Parse(format!(
            "Config blob {} is not a JSON object",
            config_descriptor.digest
        ))
    })?;

    let layer_sizes: Vec<u64> = manifest
        .layers
        .iter()
        .map(|l| l.size.unwrap_or(0))
        .collect();

    Ok(TagHistory {
        archs: Vec::new(),
        details: details(blob, &config.history_custom_labels),
        entries: entries(blob, &layer_sizes, client),
    })
}

/// History of one platform manifest, addressed by digest
pub async fn history_for(
    client: &RegistryClient,
    config: &BrowserConfig,
    name: &str,
    digest: &str,
) -> Result<TagHistory> {
    let manifest = client
        .get_manifest(
            &config.registry_url,
            name,
            digest,
            config.is_registry_secured,
            false,
            config.use_control_cache_header,
        )
        .await?;
    history_from_manifest(client, config, name, &manifest).await
}

/// History of `name:tag`. For multi-arch tags the first platform is loaded
/// and all platforms are listed in `archs`.
pub async fn load_history(
    client: &RegistryClient,
    config: &BrowserConfig,
    name: &str,
    tag: &str,
) -> Result<TagHistory> {
    let manifest = client
        .get_manifest(
            &config.registry_url,
            name,
            tag,
            config.is_registry_secured,
            true,
            config.use_control_cache_header,
        )
        .await?;

    if !manifest.manifests.is_empty() {
        let archs: Vec<ArchTab> = manifest
            .manifests
            .iter()
            .map(|m| ArchTab {
                title: m.platform.clone().unwrap_or_default().title(),
                digest: m.digest.clone(),
            })
            .collect();

        let mut history = history_for(client, config, name, &archs[0].digest).await?;
        history.archs = archs;
        return Ok(history);
    }

    history_from_manifest(client, config, name, &manifest).await
}

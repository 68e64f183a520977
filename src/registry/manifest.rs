//! Wire models for registry responses

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DOCKER_MANIFEST_V2: &str = "application/vnd.docker.distribution.manifest.v2+json";
pub const OCI_MANIFEST_V1: &str = "application/vnd.oci.image.manifest.v1+json";
pub const DOCKER_MANIFEST_LIST_V2: &str =
    "application/vnd.docker.distribution.manifest.list.v2+json";
pub const OCI_IMAGE_INDEX_V1: &str = "application/vnd.oci.image.index.v1+json";

/// Accept header for single-image manifests
pub fn manifest_accept() -> String {
    [DOCKER_MANIFEST_V2, OCI_MANIFEST_V1].join(", ")
}

/// Accept header that also admits multi-arch lists and indexes
pub fn manifest_list_accept() -> String {
    [
        DOCKER_MANIFEST_V2,
        OCI_MANIFEST_V1,
        DOCKER_MANIFEST_LIST_V2,
        OCI_IMAGE_INDEX_V1,
    ]
    .join(", ")
}

/// `GET /v2/_catalog`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogResponse {
    #[serde(default)]
    pub repositories: Option<Vec<String>>,
}

/// `GET /v2/<name>/tags/list`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagListResponse {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    #[serde(default)]
    pub os: Option<String>,
    #[serde(default)]
    pub architecture: Option<String>,
    #[serde(default)]
    pub variant: Option<String>,
}

impl Platform {
    /// `os/architecture` with the variant appended, e.g. `linux/arm64v8`
    pub fn title(&self) -> String {
        format!(
            "{}/{}{}",
            self.os.as_deref().unwrap_or("unknown"),
            self.architecture.as_deref().unwrap_or("unknown"),
            self.variant.as_deref().unwrap_or("")
        )
    }

    /// `os/architecture[/variant]`, as shown in the tag list
    pub fn summary(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(os) = self.os.as_deref() {
            parts.push(os);
        }
        if let Some(arch) = self.architecture.as_deref() {
            parts.push(arch);
        }
        if let Some(variant) = self.variant.as_deref() {
            parts.push(variant);
        }
        parts.join("/")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    #[serde(default)]
    pub media_type: Option<String>,
    pub digest: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub platform: Option<Platform>,
}

/// Single-image manifest or multi-arch list, distinguished by `manifests`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub config: Option<Descriptor>,
    #[serde(default)]
    pub layers: Vec<Descriptor>,
    #[serde(default)]
    pub manifests: Vec<Descriptor>,
}

impl Manifest {
    pub fn is_list(&self) -> bool {
        !self.manifests.is_empty()
            || matches!(
                self.media_type.as_deref(),
                Some(DOCKER_MANIFEST_LIST_V2) | Some(OCI_IMAGE_INDEX_V1)
            )
    }

    /// Sum of layer sizes; `None` when no layer reports one
    pub fn total_size(&self) -> Option<u64> {
        let sizes: Vec<u64> = self.layers.iter().filter_map(|l| l.size).collect();
        if sizes.is_empty() && !self.layers.is_empty() {
            None
        } else {
            Some(sizes.iter().sum())
        }
    }

    /// Comma separated platform summaries of a manifest list
    pub fn architectures(&self) -> String {
        self.manifests
            .iter()
            .map(|m| m.platform.clone().unwrap_or_default().summary())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Parse a config date. RFC 3339 first, then the space-separated and
/// zone-less forms some builders write (read as UTC), then a bare date.
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(date) = value.parse::<DateTime<Utc>>() {
        return Some(date);
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn parse_date_value(value: &Value) -> Option<DateTime<Utc>> {
    value.as_str().and_then(parse_date)
}

/// Runtime section nested inside an image config blob
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContainerConfig {
    #[serde(default)]
    pub os: Option<String>,
    #[serde(default)]
    pub architecture: Option<String>,
    #[serde(default)]
    pub created: Option<Value>,
}

/// The parts of an image config blob used for tag metadata
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageConfig {
    #[serde(default)]
    pub os: Option<String>,
    #[serde(default)]
    pub architecture: Option<String>,
    #[serde(default)]
    pub variant: Option<String>,
    #[serde(default)]
    pub created: Option<Value>,
    #[serde(default)]
    pub config: Option<ContainerConfig>,
}

impl ImageConfig {
    pub fn os(&self) -> Option<&str> {
        self.os
            .as_deref()
            .or_else(|| self.config.as_ref().and_then(|c| c.os.as_deref()))
    }

    pub fn architecture(&self) -> Option<&str> {
        self.architecture
            .as_deref()
            .or_else(|| self.config.as_ref().and_then(|c| c.architecture.as_deref()))
    }

    /// Creation date; an unreadable top-level value falls back to the nested one
    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.created
            .as_ref()
            .and_then(parse_date_value)
            .or_else(|| {
                self.config
                    .as_ref()
                    .and_then(|c| c.created.as_ref())
                    .and_then(parse_date_value)
            })
    }

    /// `os/architecture[/variant]` when both halves are known
    pub fn platform_summary(&self) -> Option<String> {
        let os = self.os()?;
        let arch = self.architecture()?;
        Some(match self.variant.as_deref() {
            Some(variant) => format!("{}/{}/{}", os, arch, variant),
            None => format!("{}/{}", os, arch),
        })
    }
}

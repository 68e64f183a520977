//! Configuration management module
//!
//! [`BrowserConfig`] is assembled from defaults, an optional JSON file,
//! environment variables and finally command-line flags. File and
//! environment values share one loose normalizer: booleans, numbers and
//! lists may arrive as strings.

use crate::common::FormatUtils;
use crate::error::{RegistryError, Result};
use crate::state::Theme;
use crate::tags::order::{DEFAULT_TAGLIST_ORDER, parse_order};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

pub const DEFAULT_TITLE: &str = "Docker Registry UI";

/// Authentication configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
}

impl AuthConfig {
    pub fn new(username: String, password: String) -> Self {
        Self { username, password }
    }

    /// Credentials when both halves are given
    pub fn from_parts(username: Option<String>, password: Option<String>) -> Option<Self> {
        match (username, password) {
            (Some(username), Some(password)) => Some(Self::new(username, password)),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.username.is_empty() {
            return Err(RegistryError::Validation(
                "Username cannot be empty".to_string(),
            ));
        }
        if self.password.is_empty() {
            return Err(RegistryError::Validation(
                "Password cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Runtime configuration of the browser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrowserConfig {
    pub registry_url: String,
    pub name: String,
    pub pull_url: String,
    pub title: String,
    pub single_registry: bool,
    pub delete_images: bool,
    pub show_content_digest: bool,
    pub show_tag_history: bool,
    pub catalog_elements_limit: i64,
    pub show_catalog_nb_tags: bool,
    pub catalog_default_expanded: bool,
    pub catalog_min_branches: i64,
    pub catalog_max_branches: i64,
    pub tags_per_page: i64,
    pub taglist_order: String,
    pub use_control_cache_header: bool,
    pub is_registry_secured: bool,
    pub default_registries: Vec<String>,
    pub read_only_registries: bool,
    pub history_custom_labels: Vec<String>,
    pub theme: String,
    pub enable_version_notification: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            registry_url: String::new(),
            name: String::new(),
            pull_url: String::new(),
            title: DEFAULT_TITLE.to_string(),
            single_registry: false,
            delete_images: false,
            show_content_digest: false,
            show_tag_history: true,
            catalog_elements_limit: 1000,
            show_catalog_nb_tags: false,
            catalog_default_expanded: false,
            catalog_min_branches: 1,
            catalog_max_branches: 1,
            tags_per_page: 100,
            taglist_order: DEFAULT_TAGLIST_ORDER.to_string(),
            use_control_cache_header: false,
            is_registry_secured: false,
            default_registries: Vec::new(),
            read_only_registries: false,
            history_custom_labels: Vec::new(),
            theme: "auto".to_string(),
            enable_version_notification: true,
        }
    }
}

/// Environment variable for each configuration key
pub const ENV_KEYS: &[(&str, &str)] = &[
    ("REGISTRY_URL", "registryUrl"),
    ("REGISTRY_TITLE", "title"),
    ("PULL_URL", "pullUrl"),
    ("SINGLE_REGISTRY", "singleRegistry"),
    ("DELETE_IMAGES", "deleteImages"),
    ("SHOW_CONTENT_DIGEST", "showContentDigest"),
    ("SHOW_TAG_HISTORY", "showTagHistory"),
    ("CATALOG_ELEMENTS_LIMIT", "catalogElementsLimit"),
    ("SHOW_CATALOG_NB_TAGS", "showCatalogNbTags"),
    ("CATALOG_DEFAULT_EXPANDED", "catalogDefaultExpanded"),
    ("CATALOG_MIN_BRANCHES", "catalogMinBranches"),
    ("CATALOG_MAX_BRANCHES", "catalogMaxBranches"),
    ("TAGLIST_PAGE_SIZE", "tagsPerPage"),
    ("TAGLIST_ORDER", "taglistOrder"),
    ("USE_CONTROL_CACHE_HEADER", "useControlCacheHeader"),
    ("REGISTRY_SECURED", "isRegistrySecured"),
    ("DEFAULT_REGISTRIES", "defaultRegistries"),
    ("READ_ONLY_REGISTRIES", "readOnlyRegistries"),
    ("HISTORY_CUSTOM_LABELS", "historyCustomLabels"),
    ("THEME", "theme"),
    ("ENABLE_VERSION_NOTIFICATION", "enableVersionNotification"),
];

fn to_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s == "true",
        _ => false,
    }
}

/// Integer value, or `default` when unparsable or zero
fn to_num(value: &Value, default: i64) -> i64 {
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => leading_int(s),
        _ => None,
    };
    match parsed {
        Some(0) | None => default,
        Some(n) => n,
    }
}

/// Leading integer of a string, ignoring trailing garbage (`"12px"` is 12)
fn leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| n * sign)
}

fn to_str(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn to_list(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .iter()
            .map(to_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        other => to_str(other)
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
    }
}

impl BrowserConfig {
    /// Apply one loosely typed setting; unknown keys are ignored
    pub fn apply_value(&mut self, key: &str, value: &Value) {
        let defaults = BrowserConfig::default();
        let non_empty = |v: &Value, default: &str| {
            let s = to_str(v);
            if s.is_empty() { default.to_string() } else { s }
        };

        match key {
            "registryUrl" => self.registry_url = FormatUtils::normalize_url(&to_str(value)),
            "name" => self.name = to_str(value),
            "pullUrl" => self.pull_url = to_str(value),
            "title" | "dockerRegistryUiTitle" => self.title = non_empty(value, DEFAULT_TITLE),
            "singleRegistry" => self.single_registry = to_bool(value),
            "deleteImages" => self.delete_images = to_bool(value),
            "showContentDigest" => self.show_content_digest = to_bool(value),
            "showTagHistory" => self.show_tag_history = to_bool(value),
            "catalogElementsLimit" => {
                self.catalog_elements_limit = to_num(value, defaults.catalog_elements_limit)
            }
            "showCatalogNbTags" => self.show_catalog_nb_tags = to_bool(value),
            "catalogDefaultExpanded" => self.catalog_default_expanded = to_bool(value),
            "catalogMinBranches" => {
                self.catalog_min_branches = to_num(value, defaults.catalog_min_branches)
            }
            "catalogMaxBranches" => {
                self.catalog_max_branches = to_num(value, defaults.catalog_max_branches)
            }
            "tagsPerPage" => self.tags_per_page = to_num(value, defaults.tags_per_page),
            "taglistOrder" => self.taglist_order = non_empty(value, DEFAULT_TAGLIST_ORDER),
            "useControlCacheHeader" => self.use_control_cache_header = to_bool(value),
            "isRegistrySecured" => self.is_registry_secured = to_bool(value),
            "defaultRegistries" => {
                self.default_registries = to_list(value)
                    .iter()
                    .map(|s| FormatUtils::normalize_url(s))
                    .collect()
            }
            "readOnlyRegistries" => self.read_only_registries = to_bool(value),
            "historyCustomLabels" => self.history_custom_labels = to_list(value),
            "theme" => self.theme = non_empty(value, "auto"),
            "enableVersionNotification" => self.enable_version_notification = to_bool(value),
            _ => {}
        }
    }

    pub fn apply_map(&mut self, values: &Map<String, Value>) {
        for (key, value) in values {
            self.apply_value(key, value);
        }
    }

    /// Merge a JSON configuration file
    pub fn apply_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            RegistryError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let value: Value = serde_json::from_str(&contents).map_err(|e| {
            RegistryError::Config(format!("Failed to parse config file {}: {}", path.display(), e))
        })?;
        match value {
            Value::Object(map) => {
                self.apply_map(&map);
                Ok(())
            }
            _ => Err(RegistryError::Config(format!(
                "Config file {} must contain a JSON object",
                path.display()
            ))),
        }
    }

    /// Merge environment-style variables through `lookup`
    pub fn apply_lookup<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for (env, key) in ENV_KEYS {
            if let Some(value) = lookup(env) {
                self.apply_value(key, &Value::String(value));
            }
        }
    }

    /// Merge the process environment
    pub fn apply_env(&mut self) {
        self.apply_lookup(|key| std::env::var(key).ok());
    }

    /// Fill `name` and `pullUrl` from the registry URL when unset
    pub fn finalize(mut self) -> Self {
        self.registry_url = FormatUtils::normalize_url(&self.registry_url);
        if self.name.is_empty() {
            self.name = FormatUtils::strip_https(&self.registry_url).to_string();
        }
        if self.pull_url.is_empty() {
            self.pull_url = FormatUtils::strip_https(&self.registry_url).to_string();
        }
        self
    }

    pub fn theme(&self) -> Result<Theme> {
        self.theme.parse()
    }

    pub fn validate(&self) -> Result<()> {
        if self.registry_url.is_empty() {
            return Err(RegistryError::Validation(
                "Registry URL cannot be empty".to_string(),
            ));
        }

        if !self.registry_url.starts_with("http://") && !self.registry_url.starts_with("https://")
        {
            return Err(RegistryError::Validation(format!(
                "Invalid registry URL: {}. Must start with http:// or https://",
                self.registry_url
            )));
        }

        url::Url::parse(&self.registry_url)?;
        self.theme()?;
        Ok(())
    }

    /// Whether the configured order string parses; the tag list falls back
    /// to unsorted output otherwise
    pub fn has_valid_order(&self) -> bool {
        parse_order(&self.taglist_order).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = BrowserConfig::default();
        assert!(config.show_tag_history);
        assert!(!config.delete_images);
        assert_eq!(config.catalog_elements_limit, 1000);
        assert_eq!(config.tags_per_page, 100);
        assert_eq!(config.taglist_order, "alpha-asc;num-desc");
        assert_eq!(config.title, "Docker Registry UI");
        assert_eq!(config.theme, "auto");
    }

    #[test]
    fn test_loose_values() {
        let mut config = BrowserConfig::default();
        let values = json!({
            "registryUrl": "https://reg.example.com/",
            "deleteImages": "true",
            "showTagHistory": "yes",
            "catalogMaxBranches": "3",
            "catalogElementsLimit": "abc",
            "tagsPerPage": 0,
            "defaultRegistries": "https://a/, ,https://b",
            "historyCustomLabels": ["maintainer", " version "],
            "taglistOrder": "",
            "dockerRegistryUiTitle": "My registry"
        });
        config.apply_map(values.as_object().unwrap());
        let config = config.finalize();

        assert_eq!(config.registry_url, "https://reg.example.com");
        assert!(config.delete_images);
        assert!(!config.show_tag_history);
        assert_eq!(config.catalog_max_branches, 3);
        assert_eq!(config.catalog_elements_limit, 1000);
        assert_eq!(config.tags_per_page, 100);
        assert_eq!(config.default_registries, vec!["https://a", "https://b"]);
        assert_eq!(config.history_custom_labels, vec!["maintainer", "version"]);
        assert_eq!(config.taglist_order, DEFAULT_TAGLIST_ORDER);
        assert_eq!(config.title, "My registry");
        assert_eq!(config.name, "reg.example.com");
        assert_eq!(config.pull_url, "reg.example.com");
    }

    #[test]
    fn test_env_lookup() {
        let env: HashMap<&str, &str> = [
            ("REGISTRY_URL", "http://localhost:5000"),
            ("PULL_URL", "pull.example.com"),
            ("TAGLIST_PAGE_SIZE", "25"),
            ("REGISTRY_SECURED", "true"),
        ]
        .into_iter()
        .collect();

        let mut config = BrowserConfig::default();
        config.apply_lookup(|key| env.get(key).map(|v| v.to_string()));
        let config = config.finalize();

        assert_eq!(config.tags_per_page, 25);
        assert!(config.is_registry_secured);
        assert_eq!(config.pull_url, "pull.example.com");
        assert_eq!(config.name, "localhost:5000");
    }

    #[test]
    fn test_file_source() {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), r#"{"registryUrl": "https://r", "catalogMinBranches": 2}"#).unwrap();
        let mut config = BrowserConfig::default();
        config.apply_file(file.path()).unwrap();
        assert_eq!(config.catalog_min_branches, 2);

        fs::write(file.path(), "[1, 2]").unwrap();
        assert!(matches!(
            BrowserConfig::default().apply_file(file.path()),
            Err(RegistryError::Config(_))
        ));
    }

    #[test]
    fn test_validate() {
        let mut config = BrowserConfig::default();
        assert!(config.validate().is_err());
        config.registry_url = "ftp://reg".to_string();
        assert!(config.validate().is_err());
        config.registry_url = "https://reg".to_string();
        assert!(config.validate().is_ok());
        config.theme = "purple".to_string();
        assert!(matches!(config.validate(), Err(RegistryError::Config(_))));
    }

    #[test]
    fn test_leading_int() {
        assert_eq!(leading_int("12px"), Some(12));
        assert_eq!(leading_int("-3"), Some(-3));
        assert_eq!(leading_int("x1"), None);
    }

    #[test]
    fn test_auth_from_parts() {
        assert!(AuthConfig::from_parts(Some("u".into()), None).is_none());
        let auth = AuthConfig::from_parts(Some("u".into()), Some("p".into())).unwrap();
        assert!(auth.validate().is_ok());
    }
}

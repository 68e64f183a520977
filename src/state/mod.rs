//! Persisted client state: known registry servers and theme preference

pub mod signal;
pub mod storage;

pub use signal::{Signal, SubscriptionId};
pub use storage::{FileStore, KeyValueStore, MemoryStore};

use crate::common::FormatUtils;
use crate::error::{RegistryError, Result};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub const REGISTRY_SERVER_KEY: &str = "registryServer";
pub const THEME_KEY: &str = "registryUiTheme";

/// Known registry base URLs, most recently used first
#[derive(Clone)]
pub struct RegistryServers {
    store: Arc<dyn KeyValueStore>,
}

impl RegistryServers {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Stored servers; a missing or corrupt value reads as empty
    pub fn list(&self) -> Vec<String> {
        let raw = match self.store.get(REGISTRY_SERVER_KEY) {
            Ok(Some(raw)) => raw,
            _ => return Vec::new(),
        };
        serde_json::from_str::<Vec<String>>(&raw)
            .map(|servers| {
                servers
                    .iter()
                    .map(|s| FormatUtils::normalize_url(s))
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Replace the whole list
    pub fn set(&self, servers: &[String]) -> Result<()> {
        let normalized: Vec<String> = servers
            .iter()
            .map(|s| FormatUtils::normalize_url(s))
            .filter(|s| !s.is_empty())
            .collect();
        let json = serde_json::to_string(&normalized)?;
        self.store.set(REGISTRY_SERVER_KEY, &json)
    }

    /// Put `url` at the front, dropping any earlier occurrence
    pub fn add(&self, url: &str) -> Result<Vec<String>> {
        let url = FormatUtils::normalize_url(url);
        if url.is_empty() {
            return Err(RegistryError::Validation(
                "Registry URL cannot be empty".to_string(),
            ));
        }
        let mut servers = vec![url.clone()];
        servers.extend(self.list().into_iter().filter(|s| *s != url));
        self.set(&servers)?;
        Ok(servers)
    }

    pub fn remove(&self, url: &str) -> Result<Vec<String>> {
        let url = FormatUtils::normalize_url(url);
        let servers: Vec<String> = self.list().into_iter().filter(|s| *s != url).collect();
        self.set(&servers)?;
        Ok(servers)
    }

    /// Seed an empty list with configured defaults
    pub fn init_defaults(&self, defaults: &[String]) -> Result<()> {
        if self.list().is_empty() && !defaults.is_empty() {
            self.set(defaults)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
    Auto,
}

impl FromStr for Theme {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "auto" | "" => Ok(Theme::Auto),
            other => Err(RegistryError::Config(format!(
                "Unknown theme `{}` (expected light, dark or auto)",
                other
            ))),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::Auto => "auto",
        };
        write!(f, "{}", name)
    }
}

/// Stored light/dark choice
#[derive(Clone)]
pub struct ThemePreference {
    store: Arc<dyn KeyValueStore>,
}

impl ThemePreference {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Only `light` and `dark` are ever stored
    pub fn stored(&self) -> Option<Theme> {
        match self.store.get(THEME_KEY) {
            Ok(Some(value)) => match value.parse() {
                Ok(Theme::Auto) | Err(_) => None,
                Ok(theme) => Some(theme),
            },
            _ => None,
        }
    }

    pub fn store(&self, theme: Theme) -> Result<()> {
        match theme {
            Theme::Auto => self.store.remove(THEME_KEY),
            theme => self.store.set(THEME_KEY, &theme.to_string()),
        }
    }

    /// Effective theme: a fixed configured theme wins, `auto` uses the
    /// stored choice and then the system preference
    pub fn resolve(&self, configured: Theme, system_dark: bool) -> Theme {
        match configured {
            Theme::Auto => self.stored().unwrap_or(if system_dark {
                Theme::Dark
            } else {
                Theme::Light
            }),
            fixed => fixed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> Arc<dyn KeyValueStore> {
        Arc::new(MemoryStore::new())
    }

    #[test]
    fn test_add_moves_to_front_and_dedupes() {
        let servers = RegistryServers::new(store());
        servers.add("https://a/").unwrap();
        servers.add(" https://b").unwrap();
        let list = servers.add("https://a").unwrap();
        assert_eq!(list, vec!["https://a".to_string(), "https://b".to_string()]);
        assert_eq!(servers.list(), list);
    }

    #[test]
    fn test_remove() {
        let servers = RegistryServers::new(store());
        servers
            .set(&["https://a".to_string(), "https://b".to_string()])
            .unwrap();
        assert_eq!(servers.remove("https://a/").unwrap(), vec!["https://b".to_string()]);
        assert!(servers.add("  ").is_err());
    }

    #[test]
    fn test_corrupt_value_reads_empty() {
        let backing = store();
        backing.set(REGISTRY_SERVER_KEY, "{not a list").unwrap();
        let servers = RegistryServers::new(backing);
        assert!(servers.list().is_empty());
        servers.init_defaults(&["https://default".to_string()]).unwrap();
        assert_eq!(servers.list(), vec!["https://default".to_string()]);
    }

    #[test]
    fn test_theme_resolution() {
        let prefs = ThemePreference::new(store());
        assert_eq!(prefs.resolve(Theme::Auto, true), Theme::Dark);
        assert_eq!(prefs.resolve(Theme::Auto, false), Theme::Light);
        prefs.store(Theme::Dark).unwrap();
        assert_eq!(prefs.resolve(Theme::Auto, false), Theme::Dark);
        assert_eq!(prefs.resolve(Theme::Light, true), Theme::Light);
        prefs.store(Theme::Auto).unwrap();
        assert_eq!(prefs.stored(), None);
    }

    #[test]
    fn test_theme_parse() {
        assert_eq!("Dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert!("blue".parse::<Theme>().is_err());
    }
}

//! Common utilities and helper functions

use crate::logging::Logger;
use std::time::{Duration, Instant};

/// Timing utilities
pub struct Timer {
    start: Instant,
    description: String,
}

impl Timer {
    /// Start a new timer
    pub fn start(description: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            description: description.into(),
        }
    }

    /// Get elapsed time
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Log elapsed time using provided logger
    pub fn log_elapsed(&self, logger: &Logger) {
        logger.verbose(&format!(
            "{} completed in {:.2}s",
            self.description,
            self.elapsed().as_secs_f64()
        ));
    }
}

/// String formatting helpers shared by the views
pub struct FormatUtils;

impl FormatUtils {
    /// Remove a leading `http://` or `https://`
    pub fn strip_https(url: &str) -> &str {
        url.strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
            .unwrap_or(url)
    }

    /// Trim whitespace and trailing slashes from a registry URL
    pub fn normalize_url(url: &str) -> String {
        url.trim().trim_end_matches('/').to_string()
    }

    /// Base URL without trailing slashes, for joining `/v2/...` paths
    pub fn trim_base(url: &str) -> &str {
        url.trim_end_matches('/')
    }

    /// Case-insensitive substring match; an empty search matches everything.
    /// The search is expected to be lower-cased already.
    pub fn match_search(search: &str, value: &str) -> bool {
        search.is_empty() || value.to_lowercase().contains(search)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_https() {
        assert_eq!(FormatUtils::strip_https("https://reg.example.com"), "reg.example.com");
        assert_eq!(FormatUtils::strip_https("http://localhost:5000"), "localhost:5000");
        assert_eq!(FormatUtils::strip_https("reg.example.com"), "reg.example.com");
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(FormatUtils::normalize_url("  https://reg/// "), "https://reg");
        assert_eq!(FormatUtils::normalize_url("https://reg"), "https://reg");
        assert_eq!(FormatUtils::trim_base("http://reg:5000//"), "http://reg:5000");
    }

    #[test]
    fn test_match_search() {
        assert!(FormatUtils::match_search("", "anything"));
        assert!(FormatUtils::match_search("app", "Org/MyApp"));
        assert!(!FormatUtils::match_search("web", "org/api"));
    }

    #[test]
    fn test_timer() {
        let timer = Timer::start("test operation");
        std::thread::sleep(Duration::from_millis(10));
        assert!(timer.elapsed() >= Duration::from_millis(10));
    }
}

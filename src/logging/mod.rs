//! Logging and output control
//!
//! This module provides the [`Logger`] for controlling output verbosity and
//! formatting values for display, and the [`Notifier`] side channel through
//! which batch operations report per-item failures without aborting.

use chrono::{DateTime, Utc};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Logger responsible for all user-visible output
#[derive(Debug, Clone)]
pub struct Logger {
    pub verbose: bool,
    pub quiet: bool,
    pub start_time: Option<Instant>,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Logger {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            quiet: false,
            start_time: Some(Instant::now()),
        }
    }

    pub fn new_quiet() -> Self {
        Self {
            verbose: false,
            quiet: true,
            start_time: Some(Instant::now()),
        }
    }

    /// Main section heading
    pub fn section(&self, title: &str) {
        if !self.quiet {
            println!("\n=== {} ===", title);
        }
    }

    /// Sub-section heading
    pub fn subsection(&self, title: &str) {
        if !self.quiet {
            println!("\n--- {} ---", title);
        }
    }

    // Structured logging levels
    pub fn trace(&self, message: &str) {
        if self.verbose && !self.quiet {
            println!("🔍 TRACE: {}", message);
        }
    }

    pub fn debug(&self, message: &str) {
        if self.verbose && !self.quiet {
            println!("🐛 DEBUG: {}", message);
        }
    }

    pub fn verbose(&self, message: &str) {
        if self.verbose && !self.quiet {
            println!("📝 {}", message);
        }
    }

    /// Information message
    pub fn info(&self, message: &str) {
        if !self.quiet {
            println!("ℹ️  {}", message);
        }
    }

    /// Success message
    pub fn success(&self, message: &str) {
        if !self.quiet {
            println!("✅ {}", message);
        }
    }

    /// Warning message
    pub fn warning(&self, message: &str) {
        if !self.quiet {
            println!("⚠️  WARNING: {}", message);
        }
    }

    /// Error message
    pub fn error(&self, message: &str) {
        eprintln!("❌ ERROR: {}", message);
    }

    /// Step information
    pub fn step(&self, message: &str) {
        if !self.quiet {
            println!("▶️  {}", message);
        }
    }

    /// Plain output line, used for tables and trees
    pub fn line(&self, message: &str) {
        if !self.quiet {
            println!("{}", message);
            let _ = io::stdout().flush();
        }
    }

    /// Detailed information (only shown in verbose mode)
    pub fn detail(&self, message: &str) {
        if self.verbose && !self.quiet {
            println!("   {}", message);
        }
    }

    /// Key-value pair summary display
    pub fn summary_kv(&self, title: &str, items: &[(&str, String)]) {
        if !self.quiet {
            self.subsection(title);
            for (key, value) in items {
                println!("  {}: {}", key, value);
            }
        }
    }

    // Structured list output
    pub fn list(&self, title: &str, items: &[String]) {
        if !self.quiet {
            self.subsection(title);
            for (i, item) in items.iter().enumerate() {
                println!("  {}. {}", i + 1, item);
            }

            if items.is_empty() {
                println!("  (No items to display)");
            }
        }
    }

    /// Format a size the way the tag list renders it: one truncated decimal
    /// below ten units, rounded up above
    pub fn format_size(&self, bytes: Option<u64>) -> String {
        const SIZES: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

        let bytes = match bytes {
            Some(b) => b,
            None => return "?".to_string(),
        };
        if bytes == 0 {
            return "0 Byte".to_string();
        }

        let mut i = 0usize;
        while i + 1 < SIZES.len() && bytes >= 1024u64.pow(i as u32 + 1) {
            i += 1;
        }
        let unit = 1024u64.pow(i as u32) as f64;
        let number = bytes as f64 / unit;

        if number < 10.0 {
            let whole = number.floor();
            let decimal = (bytes as f64 - whole * unit) / unit;
            format!("{}.{} {}", whole as u64, (decimal * 10.0).floor() as u64, SIZES[i])
        } else {
            format!("{} {}", number.ceil() as u64, SIZES[i])
        }
    }

    /// Format duration in human-readable format
    pub fn format_duration(&self, duration: Duration) -> String {
        let secs = duration.as_secs();
        if secs < 60 {
            format!("{}s", secs)
        } else if secs < 3600 {
            format!("{}m{}s", secs / 60, secs % 60)
        } else {
            format!("{}h{}m{}s", secs / 3600, (secs % 3600) / 60, secs % 60)
        }
    }

    /// Relative age such as "3 days ago"
    pub fn format_relative(&self, date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
        let date = match date {
            Some(d) => d,
            None => return "-".to_string(),
        };

        let diff_ms = (now - date).num_milliseconds();
        if diff_ms < 0 {
            return "just now".to_string();
        }

        let sec = diff_ms / 1000;
        let min = sec / 60;
        let hr = min / 60;
        let day = hr / 24;
        let month = day / 30;
        let year = day / 365;

        let plural = |n: i64, unit: &str| format!("{} {}{} ago", n, unit, if n == 1 { "" } else { "s" });

        if sec < 60 {
            plural(sec.max(1), "second")
        } else if min < 60 {
            plural(min, "minute")
        } else if hr < 24 {
            plural(hr, "hour")
        } else if day < 30 {
            plural(day, "day")
        } else if month < 12 {
            plural(month, "month")
        } else {
            plural(year, "year")
        }
    }

    /// Time since the logger was created
    pub fn elapsed(&self) -> Duration {
        self.start_time.map(|t| t.elapsed()).unwrap_or_default()
    }
}

/// Severity of a side-channel notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Receives per-item failures from batch operations
pub trait Notifier: Send + Sync {
    fn notify(&self, level: NoticeLevel, message: &str);

    fn error(&self, message: &str) {
        self.notify(NoticeLevel::Error, message);
    }

    fn info(&self, message: &str) {
        self.notify(NoticeLevel::Info, message);
    }
}

impl Notifier for Logger {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Error => Logger::error(self, message),
            NoticeLevel::Info => Logger::info(self, message),
        }
    }
}

/// Notifier that keeps every notice, for embedders that render them later
#[derive(Debug, Clone, Default)]
pub struct CollectingNotifier {
    notices: Arc<Mutex<Vec<(NoticeLevel, String)>>>,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<(NoticeLevel, String)> {
        self.notices.lock().map(|n| n.clone()).unwrap_or_default()
    }

    pub fn errors(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter(|(level, _)| *level == NoticeLevel::Error)
            .map(|(_, message)| message)
            .collect()
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push((level, message.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_size() {
        let logger = Logger::new_quiet();
        assert_eq!(logger.format_size(None), "?");
        assert_eq!(logger.format_size(Some(0)), "0 Byte");
        assert_eq!(logger.format_size(Some(512)), "512 Bytes");
        assert_eq!(logger.format_size(Some(1536)), "1.5 KB");
        assert_eq!(logger.format_size(Some(1024 * 1024)), "1.0 MB");
        assert_eq!(logger.format_size(Some(12 * 1024 * 1024 + 1)), "13 MB");
    }

    #[test]
    fn test_format_relative() {
        let logger = Logger::new_quiet();
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();

        assert_eq!(logger.format_relative(None, now), "-");
        assert_eq!(logger.format_relative(Some(now), now), "1 second ago");
        assert_eq!(
            logger.format_relative(Some(now + chrono::Duration::seconds(5)), now),
            "just now"
        );
        assert_eq!(
            logger.format_relative(Some(now - chrono::Duration::minutes(1)), now),
            "1 minute ago"
        );
        assert_eq!(
            logger.format_relative(Some(now - chrono::Duration::days(3)), now),
            "3 days ago"
        );
        assert_eq!(
            logger.format_relative(Some(now - chrono::Duration::days(400)), now),
            "1 year ago"
        );
    }

    #[test]
    fn test_collecting_notifier() {
        let notifier = CollectingNotifier::new();
        notifier.error("boom");
        notifier.info("fyi");
        assert_eq!(notifier.notices().len(), 2);
        assert_eq!(notifier.errors(), vec!["boom".to_string()]);
    }
}

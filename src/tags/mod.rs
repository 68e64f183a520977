//! Tag list of a repository: ordering, paging, metadata, history, deletion

pub mod deletion;
pub mod enricher;
pub mod history;
pub mod order;
pub mod pagination;

pub use deletion::{DeleteOutcome, DeleteReport, delete_tags};
pub use enricher::{TagMetadataEnricher, TagRecord};
pub use history::{TagHistory, history_for, load_history};
pub use order::{TaglistOrder, parse_order};
pub use pagination::{PageLabel, page, page_count, page_labels};

use crate::cli::config::BrowserConfig;
use crate::common::FormatUtils;
use crate::error::Result;
use crate::logging::Notifier;
use crate::registry::RegistryClient;
use crate::state::{Signal, SubscriptionId};
use std::sync::Arc;

/// Ordered, enriched tags of one repository. Page, order direction and
/// filter live in signals; the pager labels follow the page.
pub struct TagListView {
    pub name: String,
    /// Every tag, in display order
    pub tags: Vec<TagRecord>,
    pub page_size: i64,
    pub page_count: usize,
    page: Signal<usize>,
    ascending: Signal<bool>,
    filter: Signal<String>,
    labels: Signal<Vec<PageLabel>>,
}

impl TagListView {
    pub fn new(name: impl Into<String>, tags: Vec<TagRecord>, page: usize, page_size: i64) -> Self {
        let count = page_count(tags.len(), page_size);
        let page = Signal::new(page.min(count).max(1));
        let labels = Signal::new(page_labels(page.get(), count));

        let follower = labels.clone();
        page.subscribe(move |page| follower.set(page_labels(*page, count)));

        Self {
            name: name.into(),
            tags,
            page_size,
            page_count: count,
            page,
            ascending: Signal::new(true),
            filter: Signal::new(String::new()),
            labels,
        }
    }

    pub fn page(&self) -> usize {
        self.page.get()
    }

    pub fn labels(&self) -> Vec<PageLabel> {
        self.labels.get()
    }

    /// Whether the configured order is applied as is or reversed
    pub fn is_ascending(&self) -> bool {
        self.ascending.get()
    }

    pub fn filter(&self) -> String {
        self.filter.get()
    }

    /// Tags of the current page
    pub fn current_page(&self) -> &[TagRecord] {
        page(&self.tags, self.page(), self.page_size)
    }

    /// Current page restricted to tags containing the filter (case-insensitive)
    pub fn visible(&self) -> Vec<&TagRecord> {
        let filter = self.filter().to_lowercase();
        self.current_page()
            .iter()
            .filter(|t| FormatUtils::match_search(&filter, &t.tag))
            .collect()
    }

    pub fn set_filter(&self, filter: &str) {
        self.filter.set(filter.to_string());
    }

    pub fn reverse(&mut self) {
        self.tags.reverse();
        self.ascending.update(|ascending| !ascending);
    }

    /// Move to another page, clamped to the valid range
    pub fn set_page(&self, page: usize) {
        self.page.set(page.min(self.page_count).max(1));
    }

    /// Run `callback` whenever the page, direction or filter changes
    pub fn on_change<F>(&self, callback: F) -> [SubscriptionId; 3]
    where
        F: Fn() + Send + Sync + 'static,
    {
        let callback = Arc::new(callback);
        let on_page = Arc::clone(&callback);
        let on_order = Arc::clone(&callback);
        [
            self.page.subscribe(move |_| on_page()),
            self.ascending.subscribe(move |_| on_order()),
            self.filter.subscribe(move |_| callback()),
        ]
    }
}

/// Load, order and enrich the tags of `name`. An unrecognized order is
/// notified and the registry's order is kept.
pub async fn load_tag_list(
    client: &RegistryClient,
    config: &BrowserConfig,
    name: &str,
    requested_page: usize,
    notifier: &dyn Notifier,
) -> Result<TagListView> {
    let order = match parse_order(&config.taglist_order) {
        Ok(order) => Some(order),
        Err(e) => {
            notifier.error(&e.to_string());
            None
        }
    };

    let tags = client
        .list_tags(&config.registry_url, name, config.is_registry_secured)
        .await?;
    let mut records: Vec<TagRecord> = tags.into_iter().map(|tag| TagRecord::new(name, tag)).collect();

    if let Some(order) = order {
        order.sort_by_tag(&mut records, |r| r.tag.as_str());
    }

    let enriched = TagMetadataEnricher::new(client, config.registry_url.clone())
        .with_credentials(config.is_registry_secured)
        .with_no_cache(config.use_control_cache_header)
        .enrich(records, notifier)
        .await;

    Ok(TagListView::new(name, enriched, requested_page, config.tags_per_page))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    fn records(n: usize) -> Vec<TagRecord> {
        (0..n).map(|i| TagRecord::new("app", format!("v{}", i))).collect()
    }

    #[test]
    fn test_page_is_clamped() {
        let view = TagListView::new("app", records(5), 9, 2);
        assert_eq!(view.page_count, 3);
        assert_eq!(view.page(), 3);
        assert_eq!(view.current_page().len(), 1);

        let view = TagListView::new("app", records(5), 0, 2);
        assert_eq!(view.page(), 1);
    }

    #[test]
    fn test_reverse_and_filter() {
        let mut view = TagListView::new("app", records(3), 1, 100);
        view.reverse();
        assert!(!view.is_ascending());
        assert_eq!(view.tags[0].tag, "v2");
        view.set_filter("V1");
        assert_eq!(view.visible().len(), 1);
        view.set_filter("");
        assert_eq!(view.visible().len(), 3);
    }

    #[test]
    fn test_set_page_updates_labels() {
        let view = TagListView::new("app", records(30), 1, 2);
        assert_eq!(view.page_count, 16);
        view.set_page(16);
        assert!(view.labels().iter().any(|l| l.current && l.page == 16));
        view.set_page(100);
        assert_eq!(view.page(), 16);
    }

    #[test]
    fn test_changes_notify_subscribers() {
        let mut view = TagListView::new("app", records(30), 1, 2);
        let changes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&changes);
        view.on_change(move || {
            counter.fetch_add(1, AtomicOrdering::SeqCst);
        });

        view.set_page(2);
        view.set_page(2);
        view.reverse();
        view.set_filter("v1");
        view.set_filter("v1");
        assert_eq!(changes.load(AtomicOrdering::SeqCst), 3);
    }
}

//! Page slicing and pager labels for tag lists

use serde::Serialize;

/// Page size used when the configured one is not positive
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Numbered labels shown at most in a pager window
const MAX_LABELS: i64 = 10;

/// Navigation glyph attached to a pager label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageIcon {
    First,
    Prev,
    Next,
    Last,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLabel {
    pub page: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<PageIcon>,
    pub current: bool,
    #[serde(rename = "space-left")]
    pub space_left: bool,
    #[serde(rename = "space-right")]
    pub space_right: bool,
}

impl PageLabel {
    fn nav(icon: PageIcon, page: usize) -> Self {
        Self {
            page,
            icon: Some(icon),
            current: false,
            space_left: false,
            space_right: false,
        }
    }
}

pub fn effective_page_size(page_size: i64) -> usize {
    if page_size <= 0 {
        DEFAULT_PAGE_SIZE
    } else {
        page_size as usize
    }
}

/// Items of the 1-based page `page`; out of range pages are empty
pub fn page<T>(items: &[T], page: usize, page_size: i64) -> &[T] {
    let size = effective_page_size(page_size);
    if page == 0 {
        return &[];
    }
    let Some(start) = (page - 1).checked_mul(size) else {
        return &[];
    };
    if start >= items.len() {
        return &[];
    }
    let end = page.saturating_mul(size).min(items.len());
    &items[start..end]
}

/// `len / size + 1`: an evenly divisible list reports one trailing empty page
pub fn page_count(len: usize, page_size: i64) -> usize {
    len / effective_page_size(page_size) + 1
}

/// Pager labels: a window of up to ten numbered pages around `current`,
/// framed by first/prev and next/last links once there are ten pages or more
pub fn page_labels(current: usize, page_count: usize) -> Vec<PageLabel> {
    let mut labels = Vec::new();
    if page_count == 1 {
        return labels;
    }

    let cur = current as i64;
    let n = page_count as i64;

    if cur != 1 && n >= MAX_LABELS {
        labels.push(PageLabel::nav(PageIcon::First, 1));
        labels.push(PageLabel::nav(PageIcon::Prev, current.saturating_sub(1)));
    }

    let start = (cur - MAX_LABELS / 2).min(n - MAX_LABELS + 1).max(1);
    let end = (n + 1).min(start + MAX_LABELS);
    for i in start..end {
        labels.push(PageLabel {
            page: i as usize,
            icon: None,
            current: i == cur,
            space_left: cur == 1 && n > MAX_LABELS,
            space_right: cur == n && n > MAX_LABELS,
        });
    }

    if cur != n && n >= MAX_LABELS {
        labels.push(PageLabel::nav(PageIcon::Next, current + 1));
        labels.push(PageLabel::nav(PageIcon::Last, page_count));
    }

    labels
}

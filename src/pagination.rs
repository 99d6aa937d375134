//! This module defines the navigation model shown under the expense list.
//!
//! Page indices are zero-based throughout; only [PageNavigation::label] shows
//! one-based page numbers.

/// One element of the pagination indicator, holding the zero-based page index it links to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationIndicator {
    /// A link to another page.
    Page(u64),
    /// The page being displayed.
    CurrPage(u64),
    /// Pages left out of the indicator.
    Ellipsis,
    /// A link to the next page.
    NextButton(u64),
    /// A link to the previous page.
    BackButton(u64),
}

/// Build the pagination indicator for the page at `curr_index` of `page_count` pages.
///
/// At most `max_pages` page links are shown around the current page, plus the
/// first and last page when they fall outside that window.
pub fn create_pagination_indicators(
    curr_index: u64,
    page_count: u64,
    max_pages: u64,
) -> Vec<PaginationIndicator> {
    if page_count == 0 {
        return Vec::new();
    }

    let curr_index = curr_index.min(page_count - 1);
    let width = max_pages.max(1).min(page_count);
    let first = curr_index.saturating_sub(width / 2).min(page_count - width);
    let last = first + width - 1;

    let map_page = |page| {
        if page == curr_index {
            PaginationIndicator::CurrPage(page)
        } else {
            PaginationIndicator::Page(page)
        }
    };

    let mut indicators = Vec::new();

    if curr_index > 0 {
        indicators.push(PaginationIndicator::BackButton(curr_index - 1));
    }

    if first > 0 {
        indicators.push(PaginationIndicator::Page(0));

        if first > 1 {
            indicators.push(PaginationIndicator::Ellipsis);
        }
    }

    indicators.extend((first..=last).map(map_page));

    if last < page_count - 1 {
        if last < page_count - 2 {
            indicators.push(PaginationIndicator::Ellipsis);
        }

        indicators.push(PaginationIndicator::Page(page_count - 1));
    }

    if curr_index + 1 < page_count {
        indicators.push(PaginationIndicator::NextButton(curr_index + 1));
    }

    indicators
}

/// Everything needed to draw the pagination controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageNavigation {
    /// E.g. "Page 2 of 3 (21 total)".
    pub label: String,
    /// Whether there is a previous page.
    pub can_go_back: bool,
    /// Whether there is a next page.
    pub can_go_forward: bool,
    /// Links to nearby pages.
    pub indicators: Vec<PaginationIndicator>,
}

impl PageNavigation {
    /// Describe the controls for the page at `page_index`.
    ///
    /// An empty list is labelled as page 1 of 1.
    pub fn new(page_index: u64, total_pages: u64, total_elements: u64, max_pages: u64) -> Self {
        Self {
            label: format!(
                "Page {} of {} ({total_elements} total)",
                page_index + 1,
                total_pages.max(1)
            ),
            can_go_back: page_index > 0,
            can_go_forward: page_index + 1 < total_pages,
            indicators: create_pagination_indicators(page_index, total_pages, max_pages),
        }
    }
}

//! Page maths for the inventory and log tables.
//!
//! Pages are 1-based.  Page sizes are restricted to the four the tables
//! offer; a jump-to-page request is clamped into `[1, page_count]` instead
//! of being rejected, so typing "999" lands on the last page.

use serde::{Deserialize, Serialize};

/// Page sizes offered by the tables.
pub const PAGE_SIZES: [usize; 4] = [10, 20, 50, 100];

/// Page size used when none (or an unsupported one) is configured.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// A page request.  `page` is clamped, `page_size` normalised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: usize,
    pub page_size: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of results plus the numbers the pager needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// The page actually returned, after clamping.
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub page_count: usize,
}

/// Returns `requested` if it is an offered size, otherwise the default.
pub fn normalize_page_size(requested: usize) -> usize {
    if PAGE_SIZES.contains(&requested) {
        requested
    } else {
        DEFAULT_PAGE_SIZE
    }
}

/// Number of pages for `total` items; an empty table still has one page.
pub fn page_count(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size.max(1)).max(1)
}

/// Clamps a jump-to-page request into `[1, page_count]`.
pub fn clamp_page(requested: usize, total: usize, page_size: usize) -> usize {
    requested.clamp(1, page_count(total, page_size))
}

/// Cuts `items` down to the requested page.
pub fn paginate<T>(items: Vec<T>, request: PageRequest) -> Page<T> {
    let page_size = normalize_page_size(request.page_size);
    let total = items.len();
    let page = clamp_page(request.page, total, page_size);
    let items = items
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .collect();

    Page {
        items,
        page,
        page_size,
        total,
        page_count: page_count(total, page_size),
    }
}

//! Pagination types
//!
//! `PageNumber` is what a client asks for, `ListParams` is a validated page
//! ready to turn into LIMIT/OFFSET, and `PagedResult` carries one page of
//! items back out together with the numbers a template needs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a requested page cannot be served
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidPage {
    #[error("That page number is not an integer")]
    NotAnInteger,

    #[error("That page number is less than 1")]
    LessThanOne,

    #[error("That page contains no results")]
    NoResults,
}

/// Page requested through the `page` query parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageNumber {
    Number(i64),
    Last,
}

impl Default for PageNumber {
    fn default() -> Self {
        Self::Number(1)
    }
}

impl PageNumber {
    /// Parse the raw query value. A missing or empty parameter means the
    /// first page.
    pub fn parse(raw: Option<&str>) -> Result<Self, InvalidPage> {
        match raw.filter(|s| !s.is_empty()).map(str::trim) {
            None => Ok(Self::default()),
            Some("last") => Ok(Self::Last),
            Some(s) => s
                .parse::<i64>()
                .map(Self::Number)
                .map_err(|_| InvalidPage::NotAnInteger),
        }
    }

    /// Validate against the number of matching rows.
    ///
    /// An empty collection still has one (empty) first page.
    pub fn resolve(self, total: i64, per_page: u32) -> Result<ListParams, InvalidPage> {
        let pages = num_pages(total, per_page);
        let page = match self {
            Self::Last => pages,
            Self::Number(n) if n < 1 => return Err(InvalidPage::LessThanOne),
            Self::Number(n) if n > pages as i64 => return Err(InvalidPage::NoResults),
            Self::Number(n) => n as u32,
        };
        Ok(ListParams::new(page, per_page))
    }
}

/// Number of pages needed for `total` rows, never less than one
pub fn num_pages(total: i64, per_page: u32) -> u32 {
    let per_page = per_page.max(1) as i64;
    let total = total.max(0);
    (((total + per_page - 1) / per_page) as u32).max(1)
}

/// Pagination parameters for list queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListParams {
    /// Page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
        }
    }
}

impl ListParams {
    /// Create new pagination parameters
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    /// Calculate the offset for database queries
    pub fn offset(&self) -> i64 {
        (self.page.saturating_sub(1) as i64) * self.per_page as i64
    }

    /// Get the limit for database queries
    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

/// Paginated result container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    /// Items in the current page
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: i64,
    /// Current page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl<T> PagedResult<T> {
    /// Create a new paginated result
    pub fn new(items: Vec<T>, total: i64, params: &ListParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            per_page: params.per_page,
        }
    }

    /// Calculate the total number of pages
    pub fn total_pages(&self) -> u32 {
        num_pages(self.total, self.per_page)
    }

    /// Check if there is a next page
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    /// Check if there is a previous page
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Check if the result is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the number of items in the current page
    pub fn len(&self) -> usize {
        self.items.len()
    }
}

//! Pagination types for list endpoints.
//!
//! Pages are 0-indexed to match the mobile client contract.

use serde::{Deserialize, Serialize};

/// Largest page size a client may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Request parameters for paginated queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number (0-indexed).
    #[serde(default)]
    pub page: u32,
    /// Number of items per page.
    #[serde(default = "default_size")]
    pub size: u32,
}

fn default_size() -> u32 {
    20
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: default_size(),
        }
    }
}

impl PageRequest {
    /// Creates a page request, clamping the size into `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size }.clamped()
    }

    /// Returns a copy with the size clamped into `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            page: self.page,
            size: self.size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Calculates the offset for database queries.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }

    /// Returns the limit for database queries.
    #[must_use]
    pub fn limit(&self) -> u64 {
        u64::from(self.size)
    }
}

/// A page of results, in the shape the client expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    /// The items in the current page.
    pub content: Vec<T>,
    /// Total number of items across all pages.
    pub total_elements: u64,
    /// Total number of pages.
    pub total_pages: u64,
    /// Requested page size.
    pub size: u32,
    /// Current page number (0-indexed).
    pub number: u32,
}

impl<T> PageResponse<T> {
    /// Creates a new paginated response.
    #[must_use]
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: u64) -> Self {
        let size = request.size.max(1);
        Self {
            content,
            total_elements,
            total_pages: total_elements.div_ceil(u64::from(size)),
            size,
            number: request.page,
        }
    }

    /// Converts every item, keeping the paging metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageResponse<U> {
        PageResponse {
            content: self.content.into_iter().map(f).collect(),
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            size: self.size,
            number: self.number,
        }
    }
}

//! Offset pagination for list endpoints.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult, FieldViolation};

pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// A validated 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PageRequest {
    /// Page 1 and [`DEFAULT_PAGE_LIMIT`] fill in whatever is absent.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> DomainResult<Self> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);

        let mut out = Vec::new();
        if page == 0 {
            out.push(FieldViolation::new("page", "must be at least 1"));
        }
        if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
            out.push(FieldViolation::new(
                "limit",
                format!("must be between 1 and {MAX_PAGE_LIMIT}"),
            ));
        }
        DomainError::check(out)?;
        Ok(Self { page, limit })
    }

    /// Rows to skip before this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    pub fn describe(&self, total: u64) -> Pagination {
        let limit = u64::from(self.limit.max(1));
        Pagination {
            page: self.page,
            limit: self.limit,
            total,
            pages: total.div_ceil(limit),
        }
    }
}

/// Where a page sits in the full listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

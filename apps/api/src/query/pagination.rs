//! Pagination parameters and limits
//!
//! Page/limit values are validated here, before any query is built, so a bad
//! request never reaches the store.

use crate::error::{ApiError, ApiResult};

/// Page size used when the caller does not ask for one
pub const DEFAULT_LIMIT: u32 = 20;

/// Maximum items per page for top-level list queries
pub const MAX_LIMIT: u32 = 100;

/// Maximum items for nested relationship fields
pub const MAX_NESTED_LIMIT: u32 = 50;

/// Validated 1-based page number and page size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    /// Parse raw query-string values; absent values take the defaults
    pub fn from_query(page: Option<&str>, limit: Option<&str>) -> ApiResult<Self> {
        let page = match page {
            Some(raw) => parse_positive("page", raw)?,
            None => 1,
        };
        let limit = match limit {
            Some(raw) => parse_positive("limit", raw)?,
            None => DEFAULT_LIMIT,
        };
        Ok(Self {
            page,
            limit: limit.min(MAX_LIMIT),
        })
    }

    /// Validate integer arguments (GraphQL)
    pub fn from_ints(page: i32, limit: i32) -> ApiResult<Self> {
        let page = positive("page", page)?;
        let limit = positive("limit", limit)?;
        Ok(Self {
            page,
            limit: limit.min(MAX_LIMIT),
        })
    }

    /// Number of rows to skip
    pub fn skip(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }

    pub fn take(&self) -> i64 {
        i64::from(self.limit)
    }
}

fn parse_positive(name: &'static str, raw: &str) -> ApiResult<u32> {
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| ApiError::InvalidQueryParam {
            name,
            reason: format!("'{}' is not an integer", raw),
        })?;
    if value < 1 || value > i64::from(u32::MAX) {
        return Err(ApiError::InvalidQueryParam {
            name,
            reason: "must be a positive integer".to_string(),
        });
    }
    Ok(value as u32)
}

fn positive(name: &'static str, value: i32) -> ApiResult<u32> {
    if value < 1 {
        return Err(ApiError::InvalidQueryParam {
            name,
            reason: "must be a positive integer".to_string(),
        });
    }
    Ok(value as u32)
}

/// Clamp a nested-list limit to the valid range
#[inline]
pub fn clamp_limit(limit: i32, max: u32) -> usize {
    limit.clamp(1, max as i32) as usize
}

/// Clamp an offset to non-negative
#[inline]
pub fn clamp_offset(offset: i32) -> usize {
    offset.max(0) as usize
}

//! Pagination for list endpoints
//!
//! Lists take `skip` and `limit` query parameters. Missing values fall back
//! to defaults; out-of-range values are clamped rather than rejected.

/// Page size when `limit` is absent
pub const DEFAULT_LIMIT: i64 = 100;

/// Largest page a single request may ask for
pub const MAX_LIMIT: i64 = 1000;

/// Sanitized `OFFSET` / `LIMIT` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: i64,
    pub limit: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Clamp raw query values into a usable page
///
/// # Examples
/// ```
/// use gallery_api::pagination::page;
///
/// let p = page(Some(-5), Some(5000));
/// assert_eq!(p.skip, 0);
/// assert_eq!(p.limit, 1000);
/// ```
pub fn page(skip: Option<i64>, limit: Option<i64>) -> Page {
    Page {
        skip: skip.unwrap_or(0).max(0),
        limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
    }
}

use serde::Serialize;

/// Page metadata for list responses; `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub total: i64,
    pub pages: i64,
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    /// `limit` must be positive.
    pub fn new(total: i64, page: i64, limit: i64) -> Self {
        Self {
            total,
            pages: (total + limit - 1) / limit,
            page,
            limit,
        }
    }

    /// Saturates instead of wrapping for out-of-range pages.
    pub fn offset(page: i64, limit: i64) -> i64 {
        page.saturating_sub(1).saturating_mul(limit)
    }
}

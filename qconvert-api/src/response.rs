/// Success envelope and pagination helpers
///
/// Every successful JSON response is `{ "success": true, "data": ... }`;
/// list endpoints put `{ items, pagination }` inside `data`.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::extract::Json;

/// Default page size
pub const DEFAULT_LIMIT: i64 = 10;

/// Largest page size a client may request
pub const MAX_LIMIT: i64 = 100;

/// Success envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Wraps data in the success envelope
pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data,
        message: None,
    })
}

/// Wraps data with a human-readable message
pub fn ok_with_message<T: Serialize>(data: T, message: impl Into<String>) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data,
        message: Some(message.into()),
    })
}

/// `201 Created` with the success envelope
pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    (StatusCode::CREATED, ok(data))
}

/// `page` and `limit` query parameters
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Resolved page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub limit: i64,
}

impl PageQuery {
    /// Applies defaults and clamps out-of-range values
    pub fn resolve(&self) -> Page {
        Page {
            page: self.page.unwrap_or(1).max(1),
            limit: self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }
}

impl Page {
    /// Rows to skip; saturates for absurd page numbers, which then yield an
    /// empty page
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

/// One page of a listing
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, page: Page, total: i64) -> Self {
        let pages = if total == 0 {
            0
        } else {
            (total + page.limit - 1) / page.limit
        };

        Self {
            items,
            pagination: Pagination {
                page: page.page,
                limit: page.limit,
                total,
                pages,
            },
        }
    }

    pub fn empty(page: Page) -> Self {
        Self::new(Vec::new(), page, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_defaults_and_clamping() {
        assert_eq!(PageQuery::default().resolve(), Page { page: 1, limit: 10 });

        let page = PageQuery {
            page: Some(0),
            limit: Some(500),
        }
        .resolve();
        assert_eq!(page, Page { page: 1, limit: 100 });

        let page = PageQuery {
            page: Some(3),
            limit: Some(-4),
        }
        .resolve();
        assert_eq!(page, Page { page: 3, limit: 1 });
    }

    #[test]
    fn test_offset() {
        let page = PageQuery {
            page: Some(3),
            limit: Some(20),
        }
        .resolve();
        assert_eq!(page.offset(), 40);
    }

    #[test]
    fn test_offset_saturates_for_huge_pages() {
        let page = PageQuery {
            page: Some(i64::MAX),
            limit: Some(10),
        }
        .resolve();

        assert_eq!(page.page, i64::MAX);
        assert_eq!(page.offset(), i64::MAX);

        let Json(body) = ok(Paginated::<u8>::new(vec![], page, 25));
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["data"]["pagination"]["pages"], 3);
    }

    #[test]
    fn test_page_count() {
        let page = Page { page: 1, limit: 10 };
        assert_eq!(Paginated::<()>::new(vec![], page, 0).pagination.pages, 0);
        assert_eq!(Paginated::<()>::new(vec![], page, 10).pagination.pages, 1);
        assert_eq!(Paginated::<()>::new(vec![], page, 11).pagination.pages, 2);
    }

    #[test]
    fn test_envelope_shape() {
        let Json(body) = ok(Paginated::<u8>::empty(Page { page: 2, limit: 5 }));
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(value["success"], true);
        assert_eq!(value["data"]["items"], serde_json::json!([]));
        assert_eq!(value["data"]["pagination"]["page"], 2);
        assert!(value.get("message").is_none());
    }
}

/// List-query plumbing shared by every paginated endpoint
///
/// Clients send `page`, `limit`, optional filters, and a sort key; responses
/// carry the page of rows plus a fixed-shape pagination descriptor:
///
/// ```json
/// {"currentPage": 2, "totalPages": 5, "totalItems": 42, "itemsPerPage": 10}
/// ```
///
/// Page numbers are 1-based. Requests past the last page return an empty
/// list, not an error. Sort keys are resolved against a per-model whitelist
/// and every ORDER BY gets `id` appended as a tie-break so pagination is
/// deterministic when the sort column has duplicates.
use serde::{Deserialize, Serialize};

/// Hard cap on page size; larger requests are clamped, not rejected
pub const MAX_PAGE_SIZE: i64 = 100;

/// Default page size when the client sends none
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Raw list parameters as they arrive in the query string
///
/// Filter values stay as strings here; each endpoint parses them against its
/// own enums so an unknown value produces a 400 rather than a decode error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    /// 1-based page number (default 1)
    pub page: Option<i64>,

    /// Items per page (default 10, capped at 100)
    pub limit: Option<i64>,

    /// Status filter, matched exactly against the model's status enum
    pub status: Option<String>,

    /// Priority filter, matched exactly against the model's priority enum
    pub priority: Option<String>,

    /// Case-insensitive substring match over title/name and description
    pub search: Option<String>,

    /// Sort column (camelCase wire name, resolved against a whitelist)
    pub sort_by: Option<String>,

    /// "ASC" or "DESC" (default DESC)
    pub sort_order: Option<String>,
}

impl ListParams {
    /// Page number clamped to at least 1
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Page size clamped to 1..=MAX_PAGE_SIZE
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// OFFSET for the current page
    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Parses "asc"/"desc" case-insensitively; anything else is None
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }

    /// SQL keyword for this direction
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Resolves a wire sort key against a whitelist of (wire name, column) pairs
pub fn resolve_sort_column(
    requested: Option<&str>,
    allowed: &[(&str, &'static str)],
    default: &'static str,
) -> Option<&'static str> {
    match requested {
        None => Some(default),
        Some(key) => allowed
            .iter()
            .find(|(wire, _)| *wire == key)
            .map(|(_, col)| *col),
    }
}

/// Builds an ORDER BY clause with the id tie-break appended
pub fn order_by_clause(column: &str, order: SortOrder) -> String {
    format!("ORDER BY {} {}, id ASC", column, order.as_sql())
}

/// Fixed-shape pagination descriptor returned with every list response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// 1-based page that was returned
    pub current_page: i64,

    /// ceil(total_items / items_per_page)
    pub total_pages: i64,

    /// Total rows matching the filter, across all pages
    pub total_items: i64,

    /// Requested page size
    pub items_per_page: i64,
}

impl Pagination {
    /// Computes the descriptor for a page of a filtered count
    pub fn new(total_items: i64, page: i64, limit: i64) -> Self {
        let total_pages = if limit > 0 {
            (total_items + limit - 1) / limit
        } else {
            0
        };
        Self {
            current_page: page,
            total_pages,
            total_items,
            items_per_page: limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages_is_ceiling() {
        // 15 rows at 10 per page -> 2 pages, page 2 holds 5 items.
        let p = Pagination::new(15, 2, 10);
        assert_eq!(p.total_pages, 2);
        assert_eq!(p.total_items, 15);
        assert_eq!(p.current_page, 2);
        assert_eq!(p.items_per_page, 10);

        assert_eq!(Pagination::new(20, 1, 10).total_pages, 2);
        assert_eq!(Pagination::new(21, 1, 10).total_pages, 3);
        assert_eq!(Pagination::new(0, 1, 10).total_pages, 0);
        assert_eq!(Pagination::new(1, 1, 10).total_pages, 1);
    }

    #[test]
    fn test_params_defaults_and_clamping() {
        let params = ListParams::default();
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), 10);
        assert_eq!(params.offset(), 0);

        let params = ListParams {
            page: Some(0),
            limit: Some(5000),
            ..Default::default()
        };
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), MAX_PAGE_SIZE);

        let params = ListParams {
            page: Some(3),
            limit: Some(10),
            ..Default::default()
        };
        assert_eq!(params.offset(), 20);
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!(SortOrder::parse("asc"), Some(SortOrder::Asc));
        assert_eq!(SortOrder::parse("DESC"), Some(SortOrder::Desc));
        assert_eq!(SortOrder::parse("sideways"), None);
    }

    #[test]
    fn test_sort_column_whitelist() {
        let allowed = [("createdAt", "created_at"), ("dueDate", "due_date")];
        assert_eq!(
            resolve_sort_column(Some("dueDate"), &allowed, "created_at"),
            Some("due_date")
        );
        assert_eq!(
            resolve_sort_column(None, &allowed, "created_at"),
            Some("created_at")
        );
        // Unknown keys are rejected rather than interpolated into SQL.
        assert_eq!(resolve_sort_column(Some("evil; DROP"), &allowed, "created_at"), None);
    }

    #[test]
    fn test_order_by_has_id_tiebreak() {
        assert_eq!(
            order_by_clause("due_date", SortOrder::Desc),
            "ORDER BY due_date DESC, id ASC"
        );
    }

    #[test]
    fn test_pagination_serializes_camel_case() {
        let json = serde_json::to_value(Pagination::new(15, 2, 10)).unwrap();
        assert_eq!(json["currentPage"], 2);
        assert_eq!(json["totalPages"], 2);
        assert_eq!(json["totalItems"], 15);
        assert_eq!(json["itemsPerPage"], 10);
    }
}

//! Page-number pagination.

use serde::Serialize;

use crate::config::MAX_PAGE_SIZE;
use crate::error::ValidationError;

/// A requested page: 1-based page number and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Read `page` and `limit` from query pairs.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` when either value is not a positive
    /// integer or `limit` exceeds the maximum page size.
    pub fn from_query(
        pairs: &[(String, String)],
        default_limit: u32,
    ) -> Result<Self, ValidationError> {
        let mut request = Self {
            page: 1,
            limit: default_limit,
        };
        for (key, value) in pairs {
            match key.as_str() {
                "page" => request.page = parse_positive("page", value)?,
                "limit" => {
                    let limit = parse_positive("limit", value)?;
                    if limit > MAX_PAGE_SIZE {
                        return Err(ValidationError::new(
                            "limit",
                            format!("must be at most {MAX_PAGE_SIZE}"),
                        ));
                    }
                    request.limit = limit;
                }
                _ => {}
            }
        }
        Ok(request)
    }

    /// Rows to skip.
    #[must_use]
    pub fn offset(self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.limit)
    }

    /// Rows to fetch.
    #[must_use]
    pub fn limit(self) -> i64 {
        i64::from(self.limit)
    }
}

fn parse_positive(field: &str, value: &str) -> Result<u32, ValidationError> {
    match value.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ValidationError::new(field, "must be a positive integer")),
    }
}

/// A page of results.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    /// Total rows across all pages.
    pub count: i64,
    /// Next page number, if any.
    pub next: Option<u32>,
    /// Previous page number, if any.
    pub previous: Option<u32>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Assemble a page from one slice of rows and the total row count.
    #[must_use]
    pub fn new(results: Vec<T>, count: i64, request: PageRequest) -> Self {
        let seen = request.offset() + i64::from(request.limit);
        let next = (seen < count).then(|| request.page + 1);
        let previous = (request.page > 1).then(|| request.page - 1);
        Self {
            count,
            next,
            previous,
            results,
        }
    }

    /// Convert every result, keeping the page metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            count: self.count,
            next: self.next,
            previous: self.previous,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let request = PageRequest::from_query(&[], 6).unwrap();
        assert_eq!(request, PageRequest { page: 1, limit: 6 });
        assert_eq!(request.offset(), 0);
    }

    #[test]
    fn test_explicit_values() {
        let request = PageRequest::from_query(&pairs(&[("page", "3"), ("limit", "10")]), 6).unwrap();
        assert_eq!(request.offset(), 20);
        assert_eq!(request.limit(), 10);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(PageRequest::from_query(&pairs(&[("page", "0")]), 6).is_err());
        assert!(PageRequest::from_query(&pairs(&[("page", "x")]), 6).is_err());
        assert!(PageRequest::from_query(&pairs(&[("limit", "1000")]), 6).is_err());
    }

    #[test]
    fn test_page_links() {
        let first = Page::new(vec![1, 2], 5, PageRequest { page: 1, limit: 2 });
        assert_eq!((first.previous, first.next), (None, Some(2)));

        let middle = Page::new(vec![3, 4], 5, PageRequest { page: 2, limit: 2 });
        assert_eq!((middle.previous, middle.next), (Some(1), Some(3)));

        let last = Page::new(vec![5], 5, PageRequest { page: 3, limit: 2 });
        assert_eq!((last.previous, last.next), (Some(2), None));
    }

    #[test]
    fn test_map_keeps_metadata() {
        let page = Page::new(vec![1, 2], 4, PageRequest { page: 1, limit: 2 }).map(|n| n * 10);
        assert_eq!(page.results, vec![10, 20]);
        assert_eq!(page.count, 4);
        assert_eq!(page.next, Some(2));
    }
}

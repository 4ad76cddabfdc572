use serde::Serialize;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;
/// Keeps `skip()` representable as a BSON `i64`.
pub const MAX_PAGE: u64 = i64::MAX as u64 / MAX_LIMIT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    pub fn new(page: u64, limit: u64) -> Self {
        Self {
            page: page.clamp(1, MAX_PAGE),
            limit: limit.clamp(1, MAX_LIMIT),
        }
    }

    /// Lenient parse of `?page=&limit=`: anything unparsable or zero falls back to the default.
    pub fn from_query(page: Option<&str>, limit: Option<&str>) -> Self {
        let parse = |raw: Option<&str>, default: u64| {
            raw.and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(default)
        };
        Self::new(parse(page, DEFAULT_PAGE), parse(limit, DEFAULT_LIMIT))
    }

    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

pub fn total_pages(total: u64, limit: u64) -> u64 {
    if limit == 0 {
        return 0;
    }
    total.div_ceil(limit)
}

/// One page of results, shaped like the aggregate-paginate envelope clients expect.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub docs: Vec<T>,
    pub total_docs: u64,
    pub limit: u64,
    pub page: u64,
    pub total_pages: u64,
    pub has_prev_page: bool,
    pub has_next_page: bool,
}

impl<T> Page<T> {
    pub fn new(docs: Vec<T>, total_docs: u64, request: PageRequest) -> Self {
        let total_pages = total_pages(total_docs, request.limit);
        Self {
            docs,
            total_docs,
            limit: request.limit,
            page: request.page,
            total_pages,
            has_prev_page: request.page > 1,
            has_next_page: request.page < total_pages,
        }
    }

    pub fn empty(request: PageRequest) -> Self {
        Self::new(Vec::new(), 0, request)
    }

    /// Cut a page out of an already filtered and ordered sequence.
    pub fn slice(items: Vec<T>, request: PageRequest) -> Self {
        let total = items.len() as u64;
        let docs = items
            .into_iter()
            .skip(request.skip() as usize)
            .take(request.limit as usize)
            .collect();
        Self::new(docs, total, request)
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            docs: self.docs.into_iter().map(f).collect(),
            total_docs: self.total_docs,
            limit: self.limit,
            page: self.page,
            total_pages: self.total_pages,
            has_prev_page: self.has_prev_page,
            has_next_page: self.has_next_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_query_is_missing_or_junk() {
        assert_eq!(PageRequest::from_query(None, None), PageRequest::default());
        assert_eq!(
            PageRequest::from_query(Some("abc"), Some("0")),
            PageRequest::new(1, 10)
        );
    }

    #[test]
    fn test_limit_is_capped() {
        let req = PageRequest::from_query(Some("2"), Some("5000"));
        assert_eq!(req.limit, MAX_LIMIT);
        assert_eq!(req.skip(), MAX_LIMIT);
    }

    #[test]
    fn test_huge_page_is_capped() {
        let req = PageRequest::from_query(Some("18446744073709551615"), Some("100"));
        assert_eq!(req.page, MAX_PAGE);
        assert!(i64::try_from(req.skip()).is_ok());

        let page = Page::slice(vec![1, 2, 3], req);
        assert!(page.is_empty());
        assert!(!page.has_next_page);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
    }

    #[test]
    fn test_slice_reports_neighbours() {
        let page = Page::slice((1..=25).collect::<Vec<_>>(), PageRequest::new(2, 10));
        assert_eq!(page.docs, (11..=20).collect::<Vec<_>>());
        assert_eq!(page.total_docs, 25);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_prev_page);
        assert!(page.has_next_page);
    }

    #[test]
    fn test_page_past_the_end_is_empty() {
        let page = Page::slice(vec![1, 2, 3], PageRequest::new(5, 10));
        assert!(page.is_empty());
        assert_eq!(page.total_docs, 3);
        assert!(!page.has_next_page);
    }
}

/// The default page size for session listings.
const DEFAULT_LIMIT: i64 = 10;
/// The maximum page size for session listings.
const MAX_LIMIT: i64 = 50;

/// A clamped page/limit pair.
///
/// Pagination input is coerced, never rejected: an unparsable or
/// non-positive page becomes 1, and the limit is clamped into [1, 50].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    /// Builds a `Pagination` from raw query-string values.
    pub fn from_params(page: Option<&str>, limit: Option<&str>) -> Self {
        let page = page
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1);

        let limit = limit
            .and_then(|l| l.trim().parse::<i64>().ok())
            .unwrap_or(DEFAULT_LIMIT)
            .clamp(1, MAX_LIMIT);

        Self { page, limit }
    }

    /// The row offset for this page.
    ///
    /// Saturates instead of overflowing: an absurdly large page yields an
    /// offset past every row, which simply returns an empty page.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_absent() {
        let p = Pagination::from_params(None, None);
        assert_eq!(p, Pagination { page: 1, limit: 10 });
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn negative_or_garbage_page_becomes_one() {
        assert_eq!(Pagination::from_params(Some("-3"), None).page, 1);
        assert_eq!(Pagination::from_params(Some("0"), None).page, 1);
        assert_eq!(Pagination::from_params(Some("NaN"), None).page, 1);
        assert_eq!(Pagination::from_params(Some(""), None).page, 1);
    }

    #[test]
    fn limit_is_clamped_into_range() {
        assert_eq!(Pagination::from_params(None, Some("0")).limit, 1);
        assert_eq!(Pagination::from_params(None, Some("-5")).limit, 1);
        assert_eq!(Pagination::from_params(None, Some("500")).limit, 50);
        assert_eq!(Pagination::from_params(None, Some("25")).limit, 25);
        assert_eq!(Pagination::from_params(None, Some("abc")).limit, 10);
    }

    #[test]
    fn offset_follows_page_and_limit() {
        let p = Pagination::from_params(Some("3"), Some("20"));
        assert_eq!(p.offset(), 40);
    }

    #[test]
    fn huge_page_saturates_instead_of_overflowing() {
        let p = Pagination::from_params(Some("9223372036854775807"), Some("50"));
        assert_eq!(p.page, i64::MAX);
        assert_eq!(p.limit, 50);
        assert_eq!(p.offset(), i64::MAX);
    }
}

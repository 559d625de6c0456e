use serde::{Deserialize, Serialize};

const DEFAULT_PER_PAGE: u64 = 20;
const MAX_PER_PAGE: u64 = 100;

/// Query parameters for paginated list endpoints. `per_page` is clamped to
/// [`MAX_PER_PAGE`] so a client cannot request unbounded result sets.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaginationParams {
    pub page: u64,
    pub per_page: u64,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PaginationParams {
    pub fn limit(&self) -> u64 {
        self.per_page.clamp(1, MAX_PER_PAGE)
    }

    pub fn offset(&self) -> u64 {
        // Diesel offsets are i64; saturate within that range so an absurd
        // page number from the query string cannot overflow.
        self.page
            .saturating_sub(1)
            .saturating_mul(self.limit())
            .min(i64::MAX as u64)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Paginated<T: Serialize> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

impl<T: Serialize> Paginated<T> {
    pub fn new(items: Vec<T>, total: u64, params: &PaginationParams) -> Self {
        let per_page = params.limit();
        Self {
            items,
            total,
            page: params.page,
            per_page,
            total_pages: total.div_ceil(per_page),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_and_limit() {
        let params = PaginationParams { page: 3, per_page: 25 };
        assert_eq!(params.offset(), 50);
        assert_eq!(params.limit(), 25);
    }

    #[test]
    fn per_page_is_capped() {
        let params = PaginationParams { page: 1, per_page: 500 };
        assert_eq!(params.limit(), 100);
        // Offset is computed from the clamped value.
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn huge_page_number_saturates() {
        let params = PaginationParams { page: u64::MAX, per_page: 100 };
        assert_eq!(params.offset(), i64::MAX as u64);

        let max_minus_one = PaginationParams { page: u64::MAX - 1, per_page: u64::MAX };
        assert_eq!(max_minus_one.offset(), i64::MAX as u64);
    }

    #[test]
    fn total_pages_rounds_up() {
        let params = PaginationParams { page: 1, per_page: 20 };
        let paginated = Paginated::new(vec![1, 2, 3], 41, &params);
        assert_eq!(paginated.total_pages, 3);

        let empty: Paginated<i32> = Paginated::new(vec![], 0, &params);
        assert_eq!(empty.total_pages, 0);
    }
}

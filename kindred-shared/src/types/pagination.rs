use serde::{Deserialize, Serialize};

const MAX_PER_PAGE: u64 = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

fn default_page() -> u64 { 1 }
fn default_per_page() -> u64 { 20 }

impl PaginationParams {
    pub fn offset(&self) -> u64 {
        (self.page.max(1) - 1).saturating_mul(self.limit())
    }

    /// Page size, clamped to `1..=100`.
    pub fn limit(&self) -> u64 {
        self.per_page.clamp(1, MAX_PER_PAGE)
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self { page: 1, per_page: 20 }
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
            page: params.page.max(1),
            per_page,
            total_pages: total.div_ceil(per_page),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_uses_clamped_page_size() {
        let p = PaginationParams { page: 3, per_page: 500 };
        assert_eq!(p.limit(), 100);
        assert_eq!(p.offset(), 200);

        let p = PaginationParams { page: 0, per_page: 0 };
        assert_eq!(p.limit(), 1);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn huge_page_saturates_instead_of_overflowing() {
        let p = PaginationParams { page: u64::MAX, per_page: 100 };
        assert_eq!(p.offset(), u64::MAX);

        let page: Paginated<u8> = Paginated::new(vec![], 5, &p);
        assert_eq!(page.page, u64::MAX);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn total_pages_rounds_up() {
        let params = PaginationParams { page: 1, per_page: 20 };
        let page: Paginated<u8> = Paginated::new(vec![], 41, &params);
        assert_eq!(page.total_pages, 3);

        let empty: Paginated<u8> = Paginated::new(vec![], 0, &params);
        assert_eq!(empty.total_pages, 0);
    }
}

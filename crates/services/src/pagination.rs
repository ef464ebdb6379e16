use serde::Serialize;

/// One page of an offset-paginated result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: usize,
    pub current_page: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

/// Slices an already-ordered result set into one page.
///
/// Pages are 1-based; a page past the end yields empty data with the
/// correct totals. A zero `page_size` yields zero pages and no data.
pub(crate) fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> Page<T> {
    let total = items.len();
    let total_pages = if page_size == 0 {
        0
    } else {
        total.div_ceil(page_size)
    };
    let start = page.saturating_sub(1).saturating_mul(page_size);
    let data = if page_size == 0 || start >= total {
        Vec::new()
    } else {
        items
            .into_iter()
            .skip(start)
            .take(page_size)
            .collect()
    };

    Page {
        data,
        total,
        current_page: page,
        page_size,
        total_pages,
    }
}

use serde::Serialize;

/// One page of a listing plus the metadata needed to page through the rest.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResult<T> {
    pub items: Vec<T>,
    pub total_items: u64,
    pub total_pages: u64,
    pub current_page: u64,
    pub page_size: u64,
}

/// ceil(total_items / page_size); a page size of zero is treated as one
pub fn total_pages(total_items: u64, page_size: u64) -> u64 {
    total_items.div_ceil(page_size.max(1))
}

impl<T> ListResult<T> {
    pub fn new(items: Vec<T>, total_items: u64, current_page: u64, page_size: u64) -> Self {
        ListResult {
            items,
            total_items,
            total_pages: total_pages(total_items, page_size),
            current_page,
            page_size,
        }
    }

    pub fn has_next_page(&self) -> bool {
        self.current_page < self.total_pages
    }

    pub fn has_previous_page(&self) -> bool {
        self.current_page > 1
    }

    /// Transforms the items while keeping the pagination metadata
    pub fn map<U, F>(self, f: F) -> ListResult<U>
    where
        F: FnMut(T) -> U,
    {
        ListResult {
            items: self.items.into_iter().map(f).collect(),
            total_items: self.total_items,
            total_pages: self.total_pages,
            current_page: self.current_page,
            page_size: self.page_size,
        }
    }
}

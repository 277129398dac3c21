use crate::{error::QueryError, record::Record, store::RecordStore};

use super::{filter::Predicate, list_query::ListQuery, order::Order, page::ListResult};

/// Runs listing requests against a store handle supplied by the caller.
///
/// Each call to [`list`](Self::list) is independent: the query is validated
/// in full before the store is touched, then the matching rows are counted
/// and the requested page is fetched with a second round trip.
pub struct ResourceQueryBuilder<'a, S: RecordStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: RecordStore + ?Sized> ResourceQueryBuilder<'a, S> {
    pub fn new(store: &'a S) -> Self {
        ResourceQueryBuilder { store }
    }

    pub fn list(&self, query: &ListQuery) -> Result<ListResult<Record>, QueryError> {
        let query = query.normalized();
        let (predicate, order) = self.prepare(&query)?;
        let offset = query.offset()?;

        // Both are at least 1 after normalization
        let page = query.page as u64;
        let page_size = query.page_size as u64;

        let total_items = self.store.count(&predicate)?;

        let items = if offset >= total_items {
            Vec::new()
        } else {
            self.store.fetch(&predicate, &order, offset, page_size)?
        };

        Ok(ListResult::new(items, total_items, page, page_size))
    }

    /// Every record matching the query's filters and search, in its sort
    /// order. Pagination fields are ignored.
    pub fn list_all(&self, query: &ListQuery) -> Result<Vec<Record>, QueryError> {
        let (predicate, order) = self.prepare(query)?;

        let total_items = self.store.count(&predicate)?;
        if total_items == 0 {
            return Ok(Vec::new());
        }

        self.store.fetch(&predicate, &order, 0, total_items)
    }

    /// A single record by key
    pub fn get(&self, id: i64) -> Result<Option<Record>, QueryError> {
        self.store.get(id)
    }

    fn prepare(&self, query: &ListQuery) -> Result<(Predicate, Order), QueryError> {
        let col_set = self.store.col_set();

        let mut predicate = Predicate::from_filters(&col_set, &query.filters)?;
        if let Some(term) = &query.search {
            predicate = predicate.with_search(&col_set, term)?;
        }
        let order = Order::new(&col_set, &query.sort_field, query.sort_order)?;

        Ok((predicate, order))
    }
}

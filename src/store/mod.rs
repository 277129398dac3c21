mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::{
    error::QueryError,
    query::{ColSet, Order, Predicate},
    record::Record,
};

/// The backing store a listing runs against. Implementations only read.
pub trait RecordStore {
    /// Columns the store exposes; sort and filter fields are validated against these
    fn col_set(&self) -> ColSet;

    /// Number of records matching the predicate, ignoring pagination
    fn count(&self, predicate: &Predicate) -> Result<u64, QueryError>;

    /// Up to `limit` matching records in `order`, skipping the first `offset`
    fn fetch(
        &self,
        predicate: &Predicate,
        order: &Order,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Record>, QueryError>;

    /// The record whose key column equals `id`, if any
    fn get(&self, id: i64) -> Result<Option<Record>, QueryError>;
}

use crate::{
    error::QueryError,
    query::{ColSet, Order, Predicate},
    record::{Record, Value},
};

use super::RecordStore;

/// Holds a resource's records in process and evaluates listings over them.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    col_set: ColSet,
    records: Vec<Record>,
}

impl MemoryStore {
    pub fn new(col_set: ColSet, records: Vec<Record>) -> Self {
        MemoryStore { col_set, records }
    }
}

impl RecordStore for MemoryStore {
    fn col_set(&self) -> ColSet {
        self.col_set
    }

    fn count(&self, predicate: &Predicate) -> Result<u64, QueryError> {
        Ok(self.records.iter().filter(|r| predicate.matches(r)).count() as u64)
    }

    fn fetch(
        &self,
        predicate: &Predicate,
        order: &Order,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Record>, QueryError> {
        let mut matching: Vec<&Record> =
            self.records.iter().filter(|r| predicate.matches(r)).collect();
        matching.sort_by(|a, b| order.compare(a, b));

        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);

        Ok(matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    fn get(&self, id: i64) -> Result<Option<Record>, QueryError> {
        let key = Value::Integer(id);
        Ok(self
            .records
            .iter()
            .find(|r| r.get(self.col_set.key()) == Some(&key))
            .cloned())
    }
}

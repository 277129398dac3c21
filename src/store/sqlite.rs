use log::{debug, Level};
use logging_timer::timer;
use rusqlite::{OptionalExtension, Row, ToSql};

use crate::{
    database::DbPool,
    error::QueryError,
    query::{ColSet, Order, Predicate, Resource},
    record::{Record, Value},
};

use super::RecordStore;

/// Lists one resource's table through a caller-owned connection pool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
    col_set: ColSet,
}

impl SqliteStore {
    const COUNT_SQL_QUERY: &'static str = "SELECT COUNT(*)
        FROM {table}{where_clause}";

    const FETCH_SQL_QUERY: &'static str = "SELECT {select_list}
        FROM {table}{where_clause}{order_clause}
        LIMIT ? OFFSET ?";

    const GET_SQL_QUERY: &'static str = "SELECT {select_list}
        FROM {table}
        WHERE {key_column} = ?";

    pub fn new(pool: DbPool, resource: Resource) -> Self {
        SqliteStore {
            pool,
            col_set: resource.col_set(),
        }
    }

    fn build_sql(&self, template: &str, where_clause: &str, order_clause: &str) -> String {
        template
            .replace("{select_list}", &self.col_set.cols_as_select_list())
            .replace("{table}", self.col_set.table())
            .replace("{where_clause}", where_clause)
            .replace("{order_clause}", order_clause)
    }

    fn record_from_row(&self, row: &Row) -> rusqlite::Result<Record> {
        let mut record = Record::new();
        for (idx, field) in self.col_set.col_map().keys().enumerate() {
            record.set(field, Value::from(row.get_ref(idx)?));
        }
        Ok(record)
    }
}

fn to_sql_i64(value: u64, what: &str) -> Result<i64, QueryError> {
    i64::try_from(value)
        .map_err(|_| QueryError::InvalidPagination(format!("{what} {value} is out of range")))
}

impl RecordStore for SqliteStore {
    fn col_set(&self) -> ColSet {
        self.col_set
    }

    fn count(&self, predicate: &Predicate) -> Result<u64, QueryError> {
        let _tmr = timer!(Level::Trace; "SqliteStore.count", "{}", self.col_set.table());

        let (where_clause, params_vec) = predicate.to_where_clause();
        let sql = self.build_sql(Self::COUNT_SQL_QUERY, &where_clause, "");
        debug!("Count query: {sql}");

        let sql_params: Vec<&dyn ToSql> = params_vec.iter().map(|b| &**b).collect();
        let conn = self.pool.get()?;
        let mut sql_statement = conn.prepare(&sql)?;

        let count: i64 = sql_statement.query_row(&sql_params[..], |row| row.get(0))?;

        Ok(count.max(0) as u64)
    }

    fn fetch(
        &self,
        predicate: &Predicate,
        order: &Order,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Record>, QueryError> {
        let _tmr = timer!(Level::Trace; "SqliteStore.fetch", "{} offset={} limit={}", self.col_set.table(), offset, limit);

        let limit = to_sql_i64(limit, "limit")?;
        let offset = to_sql_i64(offset, "offset")?;

        let (where_clause, mut params_vec) = predicate.to_where_clause();
        params_vec.push(Box::new(limit));
        params_vec.push(Box::new(offset));

        let sql = self.build_sql(Self::FETCH_SQL_QUERY, &where_clause, &order.to_order_clause());
        debug!("Fetch query: {sql}");

        let sql_params: Vec<&dyn ToSql> = params_vec.iter().map(|b| &**b).collect();
        let conn = self.pool.get()?;
        let mut sql_statement = conn.prepare(&sql)?;

        let rows = sql_statement.query_map(&sql_params[..], |row| self.record_from_row(row))?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }

        Ok(records)
    }

    fn get(&self, id: i64) -> Result<Option<Record>, QueryError> {
        let _tmr = timer!(Level::Trace; "SqliteStore.get", "{} id={}", self.col_set.table(), id);

        let key_field = self.col_set.key();
        let key_column = self
            .col_set
            .col_name_to_db(key_field)
            .ok_or_else(|| QueryError::InvalidField(key_field.to_owned()))?;

        let sql = self
            .build_sql(Self::GET_SQL_QUERY, "", "")
            .replace("{key_column}", key_column);
        debug!("Get query: {sql}");

        let conn = self.pool.get()?;
        let mut sql_statement = conn.prepare(&sql)?;

        let record = sql_statement
            .query_row([id], |row| self.record_from_row(row))
            .optional()?;

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::DatabaseConfig, database::Database, query::SortOrder};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn seeded_store() -> (TempDir, SqliteStore) {
        let dir = TempDir::new().unwrap();
        let db = Database::open(dir.path(), &DatabaseConfig::default()).unwrap();
        let records = vec![
            Record::new()
                .with("name", "Test lamp")
                .with("price", 30.0)
                .with("created_at", "2024-01-03 00:00:00"),
            Record::new()
                .with("name", "test chair")
                .with("price", 12.5)
                .with("created_at", "2024-01-01 00:00:00"),
            Record::new()
                .with("name", "desk")
                .with("price", 12.5)
                .with("description", Value::Null)
                .with("created_at", "2024-01-02 00:00:00"),
        ];
        db.insert_many(Resource::Products, &records).unwrap();
        (dir, SqliteStore::new(db.pool().clone(), Resource::Products))
    }

    fn names(records: &[Record]) -> Vec<String> {
        records
            .iter()
            .map(|r| r.get("name").unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_count_all_and_filtered() {
        let (_dir, store) = seeded_store();
        assert_eq!(store.count(&Predicate::all()).unwrap(), 3);

        let mut filters = BTreeMap::new();
        filters.insert("name".to_string(), "test".to_string());
        let predicate = Predicate::from_filters(&store.col_set(), &filters).unwrap();
        // instr() is case-sensitive, "Test lamp" does not match
        assert_eq!(store.count(&predicate).unwrap(), 1);
    }

    #[test]
    fn test_fetch_orders_with_key_tiebreaker() {
        let (_dir, store) = seeded_store();
        let order = Order::new(&store.col_set(), "price", SortOrder::Asc).unwrap();

        let records = store.fetch(&Predicate::all(), &order, 0, 10).unwrap();
        assert_eq!(names(&records), vec!["test chair", "desk", "Test lamp"]);
    }

    #[test]
    fn test_fetch_limit_offset() {
        let (_dir, store) = seeded_store();
        let order = Order::new(&store.col_set(), "created_at", SortOrder::Desc).unwrap();

        let records = store.fetch(&Predicate::all(), &order, 1, 1).unwrap();
        assert_eq!(names(&records), vec!["desk"]);
    }

    #[test]
    fn test_fetch_returns_all_columns_in_order() {
        let (_dir, store) = seeded_store();
        let order = Order::new(&store.col_set(), "id", SortOrder::Asc).unwrap();

        let records = store.fetch(&Predicate::all(), &order, 0, 1).unwrap();
        let fields: Vec<&str> = records[0].fields().map(|(name, _)| name).collect();
        assert_eq!(
            fields,
            vec!["id", "name", "description", "category", "price", "stock", "created_at"]
        );
        assert_eq!(records[0].get("id"), Some(&Value::Integer(1)));
        assert_eq!(records[0].get("description"), Some(&Value::Null));
        assert_eq!(records[0].get("stock"), Some(&Value::Integer(0)));
    }

    #[test]
    fn test_pattern_is_not_interpreted_as_sql() {
        let (_dir, store) = seeded_store();
        let mut filters = BTreeMap::new();
        filters.insert("name".to_string(), "%' OR 1=1 --".to_string());
        let predicate = Predicate::from_filters(&store.col_set(), &filters).unwrap();
        assert_eq!(store.count(&predicate).unwrap(), 0);
    }

    #[test]
    fn test_get_by_key() {
        let (_dir, store) = seeded_store();

        let record = store.get(2).unwrap().unwrap();
        assert_eq!(record.get("id"), Some(&Value::Integer(2)));
        assert_eq!(record.get("name"), Some(&Value::from("test chair")));
        assert_eq!(record.len(), store.col_set().col_map().len());

        assert_eq!(store.get(42).unwrap(), None);
    }

    #[test]
    fn test_real_display_is_sqlite_text() {
        let (_dir, store) = seeded_store();
        let order = Order::new(&store.col_set(), "id", SortOrder::Asc).unwrap();
        let records = store.fetch(&Predicate::all(), &order, 0, 10).unwrap();

        // SQLite converts price to text itself inside instr()
        for record in &records {
            let price = record.get("price").unwrap();
            let mut filters = BTreeMap::new();
            filters.insert("price".to_string(), price.to_string());
            let predicate = Predicate::from_filters(&store.col_set(), &filters).unwrap();
            assert!(
                store.count(&predicate).unwrap() >= 1,
                "SQLite text of {price:?} should contain '{price}'"
            );
        }
    }

    #[test]
    fn test_limit_out_of_range() {
        let (_dir, store) = seeded_store();
        let order = Order::new(&store.col_set(), "id", SortOrder::Asc).unwrap();
        let result = store.fetch(&Predicate::all(), &order, 0, u64::MAX);
        assert!(matches!(result, Err(QueryError::InvalidPagination(_))));
    }
}

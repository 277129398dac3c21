use log::info;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params_from_iter, OptionalExtension};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::error::{QueryError, ResqError};
use crate::query::Resource;
use crate::record::{Record, Value};
use crate::schema::{CREATE_SCHEMA_SQL, SCHEMA_VERSION};

const DB_FILENAME: &str = "resq.db";

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Owns the connection pool for one database file. Cloning shares the pool.
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    path: PathBuf,
}

impl Database {
    pub fn open(db_dir: &Path, settings: &DatabaseConfig) -> Result<Self, ResqError> {
        // Ensure the folder exists and is a directory
        if !db_dir.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!(
                    "Database folder '{}' does not exist or is not a directory",
                    db_dir.display()
                ),
            )
            .into());
        }

        let db_path = db_dir.join(DB_FILENAME);
        let busy_timeout = Duration::from_secs(settings.connection_timeout_secs());

        let manager = SqliteConnectionManager::file(&db_path)
            .with_init(move |conn| conn.busy_timeout(busy_timeout));

        let pool = Pool::builder()
            .max_size(settings.pool_size())
            .connection_timeout(Duration::from_secs(settings.connection_timeout_secs()))
            .build(manager)?;

        info!("Database opened at: {}", db_path.display());

        let db = Database {
            pool,
            path: db_path,
        };

        // Ensure schema is current
        db.ensure_schema()?;

        Ok(db)
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_connection(&self) -> Result<DbConnection, ResqError> {
        Ok(self.pool.get()?)
    }

    fn ensure_schema(&self) -> Result<(), ResqError> {
        let conn = self.get_connection()?;

        let table_exists: bool = conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table' AND name='meta'",
                [],
                |row| row.get::<_, i32>(0),
            )
            .map(|count| count > 0)?;

        if !table_exists {
            info!("Creating schema version {SCHEMA_VERSION}");
            conn.execute_batch(CREATE_SCHEMA_SQL)?;
            return Ok(());
        }

        // Get the stored schema version
        let stored_version: Option<String> = conn
            .query_row(
                "SELECT value FROM meta WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .optional()?;

        match stored_version.as_deref() {
            Some(SCHEMA_VERSION) => Ok(()), // Schema is up to date
            Some(other) => Err(ResqError::Error(format!(
                "Schema version mismatch: expected {SCHEMA_VERSION}, found {other}"
            ))),
            None => Err(ResqError::Error("Schema version missing".to_string())),
        }
    }

    /// Inserts one record, returning its row id. Field names are resolved
    /// through the resource's columns; unknown fields are rejected.
    pub fn insert(&self, resource: Resource, record: &Record) -> Result<i64, ResqError> {
        let conn = self.get_connection()?;
        let (sql, values) = Self::insert_parts(resource, record)?;

        conn.execute(&sql, params_from_iter(values))?;
        Ok(conn.last_insert_rowid())
    }

    /// Inserts all records in a single transaction
    pub fn insert_many(&self, resource: Resource, records: &[Record]) -> Result<usize, ResqError> {
        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;

        for record in records {
            let (sql, values) = Self::insert_parts(resource, record)?;
            tx.execute(&sql, params_from_iter(values))?;
        }

        tx.commit()?;
        info!("Inserted {} {} records", records.len(), resource);

        Ok(records.len())
    }

    fn insert_parts(
        resource: Resource,
        record: &Record,
    ) -> Result<(String, Vec<&Value>), QueryError> {
        let col_set = resource.col_set();
        let mut columns = Vec::with_capacity(record.len());
        let mut values = Vec::with_capacity(record.len());

        for (field, value) in record.fields() {
            let col_db = col_set
                .col_name_to_db(field)
                .ok_or_else(|| QueryError::InvalidField(field.to_owned()))?;
            columns.push(col_db);
            values.push(value);
        }

        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            col_set.table(),
            columns.join(", "),
            placeholders
        );

        Ok((sql, values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_temp() -> (TempDir, Database) {
        let dir = TempDir::new().unwrap();
        let db = Database::open(dir.path(), &DatabaseConfig::default()).unwrap();
        (dir, db)
    }

    #[test]
    fn test_open_requires_directory() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let result = Database::open(&missing, &DatabaseConfig::default());
        assert!(matches!(result, Err(ResqError::IoError(_))));
    }

    #[test]
    fn test_open_creates_schema_and_reopens() {
        let (dir, db) = open_temp();
        assert!(db.path().exists());
        drop(db);

        // Second open sees the stored version and succeeds
        Database::open(dir.path(), &DatabaseConfig::default()).unwrap();
    }

    #[test]
    fn test_schema_version_mismatch() {
        let (dir, db) = open_temp();
        db.get_connection()
            .unwrap()
            .execute("UPDATE meta SET value = '99' WHERE key = 'schema_version'", [])
            .unwrap();
        drop(db);

        let result = Database::open(dir.path(), &DatabaseConfig::default());
        assert!(matches!(result, Err(ResqError::Error(msg)) if msg.contains("mismatch")));
    }

    #[test]
    fn test_insert_and_insert_many() {
        let (_dir, db) = open_temp();
        let record = Record::new()
            .with("name", "solo")
            .with("price", 3.5)
            .with("created_at", "2024-01-01 00:00:00");
        let id = db.insert(Resource::Products, &record).unwrap();
        assert_eq!(id, 1);

        let batch: Vec<Record> = (0..3)
            .map(|i| {
                Record::new()
                    .with("name", format!("user {i}"))
                    .with("created_at", "2024-01-01 00:00:00")
            })
            .collect();
        assert_eq!(db.insert_many(Resource::Users, &batch).unwrap(), 3);

        let count: i64 = db
            .get_connection()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn test_insert_unknown_field() {
        let (_dir, db) = open_temp();
        let record = Record::new().with("colour", "red");
        let result = db.insert(Resource::Products, &record);
        assert!(matches!(
            result,
            Err(ResqError::QueryError(QueryError::InvalidField(field))) if field == "colour"
        ));
    }
}

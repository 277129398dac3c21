//! Filtered, sorted, paginated listings over a record store.
//!
//! A [`query::ListQuery`] describes the request, a [`store::RecordStore`]
//! executes it, and [`query::ResourceQueryBuilder`] ties the two together:
//!
//! ```no_run
//! use resq::config::DatabaseConfig;
//! use resq::database::Database;
//! use resq::query::{ListQuery, Resource, ResourceQueryBuilder, SortOrder};
//! use resq::store::SqliteStore;
//!
//! let db = Database::open(std::path::Path::new("."), &DatabaseConfig::default())?;
//! let store = SqliteStore::new(db.pool().clone(), Resource::Products);
//!
//! let query = ListQuery::new()
//!     .page(2)
//!     .sort("price", SortOrder::Asc)
//!     .filter("name", "test");
//! let page = ResourceQueryBuilder::new(&store).list(&query)?;
//! println!("{} of {} pages", page.current_page, page.total_pages);
//! # Ok::<(), resq::error::ResqError>(())
//! ```

pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod logging;
pub mod query;
pub mod record;
pub mod schema;
pub mod seed;
pub mod store;

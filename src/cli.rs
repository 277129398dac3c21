use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use log::info;

use crate::config::{Config, CONFIG};
use crate::database::Database;
use crate::error::ResqError;
use crate::export::{self, ExportFormat};
use crate::query::{ListQuery, Resource, ResourceQueryBuilder, SortOrder, DEFAULT_PAGE, DEFAULT_SORT_FIELD};
use crate::seed;
use crate::store::SqliteStore;

#[derive(Parser)]
#[command(
    name = "resq",
    version,
    about = "resq: filtered, sorted, paginated resource listings"
)]
pub struct Cli {
    /// Database directory (default: configured directory, else the local data directory)
    #[arg(long = "db-dir", short = 'd', global = true)]
    pub db_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List one page of a resource as JSON
    List {
        /// Resource to list (products, users)
        resource: Resource,

        /// 1-based page number; values below 1 are treated as 1
        #[arg(long = "page", short = 'p', default_value_t = DEFAULT_PAGE, allow_negative_numbers = true)]
        page: i64,

        /// Items per page (default: listing.default_page_size from config)
        #[arg(long = "page-size", short = 's', allow_negative_numbers = true)]
        page_size: Option<i64>,

        #[command(flatten)]
        query: QueryArgs,

        /// Pretty-print the JSON output
        #[arg(long = "pretty", default_value_t = false)]
        pretty: bool,
    },

    /// Show one record of a resource as JSON
    Get {
        resource: Resource,

        /// Value of the resource's key column
        id: i64,

        /// Pretty-print the JSON output
        #[arg(long = "pretty", default_value_t = false)]
        pretty: bool,
    },

    /// Write every matching record of a resource, without pagination
    Export {
        resource: Resource,

        /// Output format: csv or json
        #[arg(long = "format", default_value = "csv")]
        format: ExportFormat,

        #[command(flatten)]
        query: QueryArgs,
    },

    /// Show the columns of a resource as JSON
    Columns {
        resource: Resource,
    },

    /// Insert demo records into a resource
    Seed {
        resource: Resource,

        /// Number of records to insert
        #[arg(long = "count", short = 'n', default_value_t = 25)]
        count: usize,
    },
}

/// Sort, filter and search options shared by `list` and `export`
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct QueryArgs {
    /// Field to sort by
    #[arg(long = "sort", default_value = DEFAULT_SORT_FIELD)]
    pub sort: String,

    /// Sort direction: asc or desc
    #[arg(long = "order", short = 'o', default_value = "desc")]
    pub order: SortOrder,

    /// Case-sensitive "contains" filter, FIELD=PATTERN (repeatable, combined with AND)
    #[arg(long = "filter", short = 'f', value_parser = parse_filter)]
    pub filters: Vec<(String, String)>,

    /// Case-sensitive free-text search across the searchable columns
    #[arg(long = "search", short = 'q')]
    pub search: Option<String>,
}

impl QueryArgs {
    fn to_list_query(&self) -> ListQuery {
        let query = self.filters.iter().fold(
            ListQuery::new().sort(&self.sort, self.order),
            |query, (field, pattern)| query.filter(field, pattern),
        );

        match &self.search {
            Some(term) => query.search(term),
            None => query,
        }
    }
}

fn parse_filter(s: &str) -> Result<(String, String), String> {
    let (field, pattern) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid filter '{s}': expected FIELD=PATTERN"))?;

    let field = field.trim();
    if field.is_empty() {
        return Err(format!("invalid filter '{s}': field name is empty"));
    }

    Ok((field.to_owned(), pattern.to_owned()))
}

fn write_json<T: serde::Serialize>(out: &mut dyn Write, value: &T, pretty: bool) -> Result<(), ResqError> {
    if pretty {
        serde_json::to_writer_pretty(&mut *out, value)?;
    } else {
        serde_json::to_writer(&mut *out, value)?;
    }
    writeln!(out)?;
    Ok(())
}

impl Cli {
    pub fn handle_command_line(data_dir: &Path) -> Result<(), ResqError> {
        let args = Cli::parse();
        let config = CONFIG
            .get()
            .ok_or_else(|| ResqError::Error("Configuration not loaded".to_string()))?;

        let stdout = io::stdout();
        let mut out = stdout.lock();
        args.run(config, data_dir, &mut out)
    }

    pub fn run(&self, config: &Config, data_dir: &Path, out: &mut dyn Write) -> Result<(), ResqError> {
        match &self.command {
            Command::List {
                resource,
                page,
                page_size,
                query,
                pretty,
            } => {
                let query = query
                    .to_list_query()
                    .page(*page)
                    .page_size(page_size.unwrap_or(config.listing.default_page_size()));

                info!("Listing {resource}: {query:?}");

                let db = self.open_database(config, data_dir)?;
                let store = SqliteStore::new(db.pool().clone(), *resource);
                let result = ResourceQueryBuilder::new(&store).list(&query)?;

                write_json(out, &result, *pretty)?;
            }
            Command::Get {
                resource,
                id,
                pretty,
            } => {
                let db = self.open_database(config, data_dir)?;
                let store = SqliteStore::new(db.pool().clone(), *resource);
                let record = ResourceQueryBuilder::new(&store)
                    .get(*id)?
                    .ok_or_else(|| ResqError::Error(format!("No {resource} record with id {id}")))?;

                write_json(out, &record, *pretty)?;
            }
            Command::Export {
                resource,
                format,
                query,
            } => {
                let query = query.to_list_query();
                info!("Exporting {resource} as {format}: {query:?}");

                let db = self.open_database(config, data_dir)?;
                let store = SqliteStore::new(db.pool().clone(), *resource);
                export::export(&store, &query, *format, out)?;
            }
            Command::Columns { resource } => {
                let metadata = resource.col_set().metadata();
                serde_json::to_writer_pretty(&mut *out, &metadata)?;
                writeln!(out)?;
            }
            Command::Seed { resource, count } => {
                let db = self.open_database(config, data_dir)?;
                let inserted = seed::seed(&db, *resource, *count)?;
                writeln!(out, "Inserted {inserted} {resource} records into {}", db.path().display())?;
            }
        }

        Ok(())
    }

    /// An explicit --db-dir must already exist; the default directory is created on demand
    fn open_database(&self, config: &Config, data_dir: &Path) -> Result<Database, ResqError> {
        let db_dir = match self.db_dir.clone().or_else(|| config.database.dir()) {
            Some(dir) => dir,
            None => {
                fs::create_dir_all(data_dir)?;
                data_dir.to_path_buf()
            }
        };

        Database::open(&db_dir, &config.database)
    }
}

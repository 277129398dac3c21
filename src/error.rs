use rusqlite::Error as RusqliteError;
use std::io;
use thiserror::Error;

/// Errors returned by the resource query builder and its stores.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Sort or filter field is not a column of the resource
    #[error("Invalid field '{0}'")]
    InvalidField(String),

    #[error("Invalid pagination: {0}")]
    InvalidPagination(String),

    /// The backing store could not be reached or failed the request
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),
}

impl From<RusqliteError> for QueryError {
    fn from(err: RusqliteError) -> Self {
        QueryError::BackendUnavailable(err.to_string())
    }
}

impl From<r2d2::Error> for QueryError {
    fn from(err: r2d2::Error) -> Self {
        QueryError::BackendUnavailable(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum ResqError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error), // Converts io::Error into ResqError automatically

    #[error("Database error: {0}")]
    DatabaseError(#[from] RusqliteError),

    #[error("Connection pool error: {0}")]
    PoolError(#[from] r2d2::Error),

    #[error("Query error: {0}")]
    QueryError(#[from] QueryError),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Logger error: {0}")]
    LoggerError(#[from] flexi_logger::FlexiLoggerError),

    #[error("Error: {0}")]
    Error(String), // Allows custom application errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_error_display() {
        assert_eq!(
            QueryError::InvalidField("colour".into()).to_string(),
            "Invalid field 'colour'"
        );
        assert_eq!(
            QueryError::BackendUnavailable("closed".into()).to_string(),
            "Backend unavailable: closed"
        );
    }

    #[test]
    fn test_rusqlite_error_maps_to_backend_unavailable() {
        let err: QueryError = RusqliteError::InvalidQuery.into();
        assert!(matches!(err, QueryError::BackendUnavailable(_)));
    }

    #[test]
    fn test_query_error_wraps_into_resq_error() {
        let err: ResqError = QueryError::InvalidPagination("offset overflow".into()).into();
        assert_eq!(
            err.to_string(),
            "Query error: Invalid pagination: offset overflow"
        );
    }
}

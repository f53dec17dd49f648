//! Error taxonomy for a loader run.
//!
//! Every failure class a run can hit maps to one variant here; the
//! orchestrator aggregates them without unwinding across task boundaries.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    /// A file's base name matched no registered table. Raised during
    /// pre-flight resolution, before any database statement is issued.
    #[error("no table registered for input file `{0}`")]
    UnresolvedTable(String),

    /// The store rejected a drop or create statement.
    #[error("schema statement for table `{table}` rejected: {message}")]
    Schema {
        table: &'static str,
        message: String,
    },

    /// The store rejected a batched insert.
    #[error("bulk insert into `{table}` rejected: {message}")]
    Insert {
        table: &'static str,
        message: String,
    },

    /// A source file or the input directory could not be read.
    #[error("failed to read `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A data line could not be parsed as CSV (ragged rows included).
    #[error("malformed CSV in `{path}`: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A raw field could not be coerced to its declared type. Aborts the
    /// rest of the file; batches already flushed stay in the store.
    #[error("table `{table}` line {line}, field {field}: cannot parse `{value}` as {expected}")]
    Coercion {
        table: &'static str,
        line: u64,
        field: usize,
        value: String,
        expected: &'static str,
    },

    /// The database session could not be established or the transport failed.
    #[error("database session failure: {0}")]
    Session(String),

    /// A worker task aborted without reporting a result.
    #[error("ingestion task panicked: {0}")]
    TaskPanic(String),
}

pub type Result<T> = std::result::Result<T, LoadError>;

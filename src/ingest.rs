//! Drop/create/batched-insert execution for a single feed file.

use std::path::PathBuf;

use csv::ReaderBuilder;
use tracing::{debug, info};

use crate::coerce::TypedRow;
use crate::error::{LoadError, Result};
use crate::session::{SqlError, SqlExecutor};
use crate::tables::TableDef;

/// Rows buffered between bulk inserts. Fixed for all tables.
pub const BATCH_SIZE: usize = 1000;

/// One feed file bound to its table definition and a dedicated session.
///
/// Consumed exactly once; tasks are never reused across files.
pub struct IngestionTask<S> {
    pub definition: &'static TableDef,
    pub source: PathBuf,
    pub session: S,
}

impl<S: SqlExecutor> IngestionTask<S> {
    pub fn new(definition: &'static TableDef, source: impl Into<PathBuf>, session: S) -> Self {
        Self {
            definition,
            source: source.into(),
            session,
        }
    }

    /// Drops and recreates the table, then streams the file into it in
    /// batches of [`BATCH_SIZE`] rows.
    ///
    /// Fails fast on the first unparseable line; batches flushed before the
    /// failure stay in the store, consistent with the drop-and-recreate
    /// pattern on the next run.
    pub async fn run(self) -> Result<()> {
        let table = self.definition.name;

        self.session
            .execute(&self.definition.drop_stmt())
            .await
            .map_err(|e| schema_error(table, e))?;
        self.session
            .execute(self.definition.create_stmt)
            .await
            .map_err(|e| schema_error(table, e))?;

        let file = std::fs::File::open(&self.source).map_err(|source| LoadError::Io {
            path: self.source.clone(),
            source,
        })?;
        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);

        let mut batch: Vec<TypedRow> = Vec::with_capacity(BATCH_SIZE);
        let mut total = 0usize;

        for record in reader.records() {
            let record = record.map_err(|source| LoadError::Csv {
                path: self.source.clone(),
                source,
            })?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();

            let row = (self.definition.transform)(&record).map_err(|e| LoadError::Coercion {
                table,
                line,
                field: e.index,
                value: e.value,
                expected: e.expected,
            })?;

            batch.push(row);
            total += 1;

            if batch.len() == BATCH_SIZE {
                self.flush(&mut batch).await?;
            }
        }

        if !batch.is_empty() {
            self.flush(&mut batch).await?;
        }

        info!(table, rows = total, source = %self.source.display(), "table loaded");
        Ok(())
    }

    async fn flush(&self, batch: &mut Vec<TypedRow>) -> Result<()> {
        debug!(table = self.definition.name, rows = batch.len(), "flushing batch");

        self.session
            .execute_bulk(self.definition.insert_stmt, batch)
            .await
            .map_err(|e| match e {
                SqlError::Rejected(message) => LoadError::Insert {
                    table: self.definition.name,
                    message,
                },
                SqlError::Transport(message) => LoadError::Session(message),
            })?;

        batch.clear();
        Ok(())
    }
}

fn schema_error(table: &'static str, error: SqlError) -> LoadError {
    match error {
        SqlError::Rejected(message) => LoadError::Schema { table, message },
        SqlError::Transport(message) => LoadError::Session(message),
    }
}

//! Directory discovery and concurrent execution of ingestion tasks.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{Instrument, error, info};

use crate::error::{LoadError, Result};
use crate::ingest::IngestionTask;
use crate::session::SqlExecutor;
use crate::tables::{self, TableDef};

/// Number of files loaded in parallel unless overridden on the command line.
pub const DEFAULT_WORKERS: usize = 4;

/// Derives the table identifier from a file name: the portion before the
/// first `.`, so `stop_times.csv` resolves to `stop_times`.
fn table_id(file_name: &str) -> &str {
    file_name.split('.').next().unwrap_or_default()
}

/// Resolves every entry in `input_dir` against the table registry.
///
/// Any base name that matches no registered table fails the whole run here,
/// before a single session is opened or statement issued.
fn resolve_inputs(input_dir: &Path) -> Result<Vec<(&'static TableDef, PathBuf)>> {
    let entries = std::fs::read_dir(input_dir).map_err(|source| LoadError::Io {
        path: input_dir.to_path_buf(),
        source,
    })?;

    let mut resolved = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| LoadError::Io {
            path: input_dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let file_name = entry.file_name();
        let file_name = file_name.to_string_lossy();

        let definition = tables::lookup(table_id(&file_name))
            .ok_or_else(|| LoadError::UnresolvedTable(file_name.to_string()))?;
        resolved.push((definition, path));
    }

    Ok(resolved)
}

/// Loads every feed file in `input_dir`, at most `workers` files in flight.
///
/// `connect` is invoked once per file, so each task owns an independent
/// session for its whole lifetime. All submitted tasks run to completion
/// whether or not siblings fail; the first failure encountered becomes the
/// run's result.
pub async fn run<S, F>(input_dir: &Path, workers: usize, connect: F) -> Result<()>
where
    S: SqlExecutor + Send + Sync + 'static,
    F: Fn() -> Result<S> + Send + Sync + 'static,
{
    let resolved = resolve_inputs(input_dir)?;
    if resolved.is_empty() {
        info!(input_dir = %input_dir.display(), "no feed files found");
        return Ok(());
    }

    info!(files = resolved.len(), workers, "starting ingestion run");

    let semaphore = Arc::new(Semaphore::new(workers));
    let connect = Arc::new(connect);
    let mut tasks = Vec::new();

    for (definition, path) in resolved {
        let semaphore = Arc::clone(&semaphore);
        let connect = Arc::clone(&connect);

        let span = tracing::info_span!(
            "load_file",
            table = definition.name,
            path = %path.display(),
        );

        let handle = tokio::spawn(
            async move {
                let _permit = semaphore.acquire().await.unwrap();

                let session = connect()?;
                IngestionTask::new(definition, path, session).run().await
            }
            .instrument(span),
        );

        tasks.push((definition.name, handle));
    }

    let mut loaded = 0usize;
    let mut failed = 0usize;
    let mut first_failure = None;

    for (table, handle) in tasks {
        match handle.await {
            Ok(Ok(())) => loaded += 1,
            Ok(Err(e)) => {
                failed += 1;
                error!(table, error = %e, "file ingestion failed");
                first_failure.get_or_insert(e);
            }
            Err(join_error) => {
                failed += 1;
                error!(table, error = %join_error, "ingestion task panicked");
                first_failure.get_or_insert(LoadError::TaskPanic(join_error.to_string()));
            }
        }
    }

    info!(loaded, failed, "ingestion run complete");

    match first_failure {
        None => Ok(()),
        Some(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), "header\n").unwrap();
    }

    #[test]
    fn test_resolve_inputs_maps_files_to_definitions() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "agency.csv");
        touch(dir.path(), "routes.csv");

        let mut resolved = resolve_inputs(dir.path()).unwrap();
        resolved.sort_by_key(|(def, _)| def.name);

        let names: Vec<_> = resolved.iter().map(|(def, _)| def.name).collect();
        assert_eq!(names, vec!["agency", "routes"]);
    }

    #[test]
    fn test_resolve_inputs_skips_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "agency.csv");
        std::fs::create_dir(dir.path().join("archive")).unwrap();

        let resolved = resolve_inputs(dir.path()).unwrap();
        assert_eq!(resolved.len(), 1);
    }

    #[test]
    fn test_resolve_inputs_fails_on_unknown_base_name() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "agency.csv");
        touch(dir.path(), "fares.csv");

        let err = resolve_inputs(dir.path()).unwrap_err();
        assert!(matches!(err, LoadError::UnresolvedTable(name) if name == "fares.csv"));
    }

    #[test]
    fn test_resolve_inputs_fails_on_missing_directory() {
        let err = resolve_inputs(Path::new("/nonexistent/feeds")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn test_table_id_strips_extension() {
        assert_eq!(table_id("agency.csv"), "agency");
        assert_eq!(table_id("stop_times.csv"), "stop_times");
        assert_eq!(table_id("shapes"), "shapes");
    }

    #[test]
    fn test_table_id_takes_portion_before_first_dot() {
        assert_eq!(table_id("trips.2026.csv"), "trips");
    }
}

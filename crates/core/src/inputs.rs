//! Enumeration of the CSV files to upload.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Extension of the files picked up from a directory.
pub const CSV_EXTENSION: &str = "csv";

#[derive(Debug, Error)]
pub enum InputError {
    #[error("Input file name or working directory is not provided")]
    NothingSelected,

    #[error("Error getting files list from {path}: {source}")]
    ReadDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Resolve the files to upload.
///
/// A directory takes precedence over a single file when both are given. A
/// directory is walked recursively and every `*.csv` file is returned, sorted.
/// A single file is returned as-is without checking its extension.
pub async fn collect_inputs(
    file: Option<&Path>,
    dir: Option<&Path>,
) -> Result<Vec<PathBuf>, InputError> {
    match (dir, file) {
        (Some(dir), _) => collect_csv_files(dir).await,
        (None, Some(file)) => Ok(vec![file.to_path_buf()]),
        (None, None) => Err(InputError::NothingSelected),
    }
}

fn is_csv_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(CSV_EXTENSION)
}

async fn collect_csv_files(root: &Path) -> Result<Vec<PathBuf>, InputError> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let read_err = |source: std::io::Error| InputError::ReadDir {
            path: dir.display().to_string(),
            source,
        };
        let mut entries = tokio::fs::read_dir(&dir).await.map_err(read_err)?;

        while let Some(entry) = entries.next_entry().await.map_err(read_err)? {
            let path = entry.path();
            let file_type = entry.file_type().await.map_err(read_err)?;
            if file_type.is_dir() {
                pending.push(path);
            } else if is_csv_file(&path) {
                files.push(path);
            }
        }
    }

    files.sort();
    debug!(dir = %root.display(), count = files.len(), "Collected CSV files");
    Ok(files)
}

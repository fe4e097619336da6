use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupStats {
    pub files_deleted: usize,
    pub errors: Vec<String>,
}

/// Delete the outputs of a previous run. Missing files are skipped and
/// failures are collected rather than returned.
pub fn cleanup_outputs(paths: &[PathBuf]) -> CleanupStats {
    let mut stats = CleanupStats::default();
    for path in paths.iter().filter(|p| p.is_file()) {
        match fs::remove_file(path) {
            Ok(()) => stats.files_deleted += 1,
            Err(e) => {
                warn!("could not delete {}: {e}", path.display());
                stats.errors.push(format!("{}: {e}", path.display()));
            }
        }
    }
    if stats.files_deleted == 0 && stats.errors.is_empty() {
        info!("no previous outputs to clean");
    } else {
        info!(
            deleted = stats.files_deleted,
            errors = stats.errors.len(),
            "cleaned previous outputs"
        );
    }
    stats
}

/// Create the parent directory of every output path.
pub fn ensure_output_directories(paths: &[PathBuf]) -> Result<()> {
    for parent in paths
        .iter()
        .filter_map(|p| p.parent())
        .filter(|p| !p.as_os_str().is_empty())
    {
        create_dir(parent)?;
    }
    Ok(())
}

fn create_dir(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

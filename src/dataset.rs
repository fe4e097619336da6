//! Source tables in, cleaned tables out.
//!
//! Sources are CSV files with display-name headers ("Employee ID", "Hire
//! Date"); they are read with every column as String and renamed to the
//! canonical lower_snake_case names from [`crate::schema`].

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::schema::{employee, sale};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    Employees,
    Sales,
}

impl DatasetKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Employees => "employees",
            Self::Sales => "sales",
        }
    }

    pub fn display_names(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Employees => &employee::DISPLAY_NAMES,
            Self::Sales => &sale::DISPLAY_NAMES,
        }
    }
}

/// A source table bound to its path.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub kind: DatasetKind,
    pub source: PathBuf,
}

impl Dataset {
    pub fn new(kind: DatasetKind, source: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            source: source.into(),
        }
    }

    /// Load the source with canonical column names.
    ///
    /// A missing file is fatal and reported as [`PipelineError::SourceNotFound`].
    pub fn load(&self) -> Result<DataFrame> {
        if !self.source.is_file() {
            return Err(PipelineError::SourceNotFound(self.source.clone()));
        }
        let df = read_csv_as_strings(&self.source)?;
        let df = rename_to_canonical(df, self.kind.display_names())?;
        info!(
            dataset = self.kind.name(),
            rows = df.height(),
            columns = df.width(),
            "loaded {}",
            self.source.display()
        );
        Ok(df)
    }
}

/// Read a CSV file with all columns as String dtype.
/// Trims whitespace from column names.
pub fn read_csv_as_strings(path: &Path) -> Result<DataFrame> {
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0)) // all columns as String
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    let trimmed: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|c| c.trim().to_string())
        .collect();
    df.set_column_names(trimmed.as_slice())?;
    Ok(df)
}

/// Rename the display-name columns that are present; everything else is kept.
pub fn rename_to_canonical(df: DataFrame, mapping: &[(&str, &str)]) -> Result<DataFrame> {
    let present: Vec<(&str, &str)> = mapping
        .iter()
        .copied()
        .filter(|(display, canonical)| display != canonical && df.column(display).is_ok())
        .collect();
    if present.is_empty() {
        return Ok(df);
    }
    let old: Vec<&str> = present.iter().map(|(d, _)| *d).collect();
    let new: Vec<&str> = present.iter().map(|(_, c)| *c).collect();
    debug!(renamed = old.len(), "mapping display names to canonical columns");
    Ok(df.lazy().rename(old, new, true).collect()?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkFormat {
    Csv,
    Parquet,
}

impl SinkFormat {
    /// Inferred from the extension; anything that is not `.parquet` is CSV.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_ascii_lowercase())
            .as_deref()
        {
            Some("parquet") => Self::Parquet,
            _ => Self::Csv,
        }
    }
}

/// Write a cleaned table, creating the parent directory when needed.
pub fn write_table(df: &DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut out = df.clone();
    let file = File::create(path)?;
    match SinkFormat::from_path(path) {
        SinkFormat::Csv => {
            CsvWriter::new(file).include_header(true).finish(&mut out)?;
        }
        SinkFormat::Parquet => {
            ParquetWriter::new(file).finish(&mut out)?;
        }
    }
    info!(rows = out.height(), "wrote {}", path.display());
    Ok(())
}

/// Names from `required` that `df` does not have.
pub fn missing_columns<'a>(df: &DataFrame, required: &[&'a str]) -> Vec<&'a str> {
    required
        .iter()
        .copied()
        .filter(|c| df.column(c).is_err())
        .collect()
}

/// A String column as owned optional values; absent columns read as all-null.
pub fn string_values(df: &DataFrame, column: &str) -> Result<Vec<Option<String>>> {
    let Ok(c) = df.column(column) else {
        return Ok(vec![None; df.height()]);
    };
    let c = c.cast(&DataType::String)?;
    Ok(c.str()?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect())
}

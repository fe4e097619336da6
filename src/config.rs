use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{PipelineError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "configs/configs.json";

/// Paths and settings for one pipeline run.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub employee_data_path: PathBuf,
    pub sales_data_path: PathBuf,
    pub cleaned_employee_data_path: PathBuf,
    pub cleaned_sales_data_path: PathBuf,
    #[serde(default = "default_report_dir")]
    pub report_output_dir: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_report_dir() -> PathBuf {
    PathBuf::from("reports/output")
}

fn default_log_level() -> String {
    "INFO".to_string()
}

impl PipelineConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Log level as a tracing filter directive (lowercase, `critical` → `error`).
    pub fn filter_directive(&self) -> String {
        match self.log_level.to_ascii_lowercase().as_str() {
            "critical" | "fatal" => "error".to_string(),
            "warning" => "warn".to_string(),
            other => other.to_string(),
        }
    }

    pub fn employees_report_path(&self) -> PathBuf {
        self.report_output_dir.join("employees_report.json")
    }

    pub fn sales_report_path(&self) -> PathBuf {
        self.report_output_dir.join("sales_report.json")
    }

    pub fn relations_report_path(&self) -> PathBuf {
        self.report_output_dir.join("relation_stats.json")
    }

    /// Every file the pipeline writes.
    pub fn output_paths(&self) -> Vec<PathBuf> {
        vec![
            self.cleaned_employee_data_path.clone(),
            self.cleaned_sales_data_path.clone(),
            self.employees_report_path(),
            self.sales_report_path(),
            self.relations_report_path(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_optional_fields() {
        let cfg = PipelineConfig::from_json(
            r#"{
                "employee_data_path": "data/employees.csv",
                "sales_data_path": "data/sales.csv",
                "cleaned_employee_data_path": "out/employees_clean.csv",
                "cleaned_sales_data_path": "out/sales_clean.csv"
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.report_output_dir, PathBuf::from("reports/output"));
        assert_eq!(cfg.filter_directive(), "info");
        assert_eq!(cfg.output_paths().len(), 5);
    }

    #[test]
    fn python_style_levels_map_to_tracing() {
        let mut cfg = PipelineConfig::from_json(
            r#"{
                "employee_data_path": "a", "sales_data_path": "b",
                "cleaned_employee_data_path": "c", "cleaned_sales_data_path": "d",
                "log_level": "WARNING"
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.filter_directive(), "warn");
        cfg.log_level = "CRITICAL".into();
        assert_eq!(cfg.filter_directive(), "error");
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = PipelineConfig::from_file(Path::new("/nonexistent/configs.json")).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn missing_required_path_is_rejected() {
        assert!(PipelineConfig::from_json(r#"{"employee_data_path": "a"}"#).is_err());
    }
}

//! Summary statistics for the reporting side, written as JSON.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::dataset::string_values;
use crate::dates::years_between;
use crate::employee_cleaner::EmployeeCleaningStats;
use crate::error::Result;
use crate::records::{sales_from_frame, Employee, Sale, SaleStatus};
use crate::relations::RelationStats;
use crate::sales_cleaner::SalesCleaningStats;
use crate::schema::sale;
use crate::validation::{is_future_date, is_older_than_years, Verdict};

const OLD_PENDING_YEARS: u32 = 5;

/// `part / whole` as a percentage rounded to two decimals; 0 for an empty whole.
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64 * 10_000.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeesReport {
    pub total_original: usize,
    pub total_clean: usize,
    pub total_valid: usize,
    pub success_rate: f64,
    pub retention_rate: f64,
    pub validation_rate: f64,
    pub underage_hires: usize,
    pub adult_hires: usize,
    pub terminated_before_hire: usize,
    pub schema_violations: usize,
    pub cleaning: EmployeeCleaningStats,
    pub relations: RelationStats,
}

impl EmployeesReport {
    pub fn build(
        total_original: usize,
        cleaned: &[Employee],
        total_valid: usize,
        cleaning: EmployeeCleaningStats,
        relations: RelationStats,
    ) -> Self {
        let total_clean = cleaned.len();
        let mut underage_hires = 0;
        let mut adult_hires = 0;
        let mut terminated_before_hire = 0;
        for e in cleaned {
            if let (Some(birth), Some(hire)) = (e.birthdate, e.hire_date) {
                if years_between(birth, hire) < 18 {
                    underage_hires += 1;
                } else {
                    adult_hires += 1;
                }
            }
            if matches!((e.hire_date, e.termination_date), (Some(h), Some(t)) if t < h) {
                terminated_before_hire += 1;
            }
        }
        let schema_violations = cleaned
            .iter()
            .filter(|e| !e.schema_violations().is_empty())
            .count();

        Self {
            total_original,
            total_clean,
            total_valid,
            success_rate: percentage(total_valid, total_original),
            retention_rate: percentage(total_clean, total_original),
            validation_rate: percentage(total_valid, total_clean),
            underage_hires,
            adult_hires,
            terminated_before_hire,
            schema_violations,
            cleaning,
            relations,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesReport {
    pub total_original: usize,
    pub total_clean: usize,
    pub total_valid: usize,
    pub success_rate: f64,
    pub retention_rate: f64,
    pub validation_rate: f64,
    pub total_revenue: f64,
    pub avg_sale: f64,
    pub max_sale: f64,
    pub min_sale: f64,
    pub total_quantity: i64,
    pub avg_quantity: f64,
    pub status_distribution: BTreeMap<String, usize>,
    pub future_dates: usize,
    pub future_dates_pct: f64,
    pub old_pending_sales: usize,
    pub schema_violations: usize,
    pub cleaning: SalesCleaningStats,
    pub relations: RelationStats,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Revenue {
    total: f64,
    avg: f64,
    max: f64,
    min: f64,
    quantity: i64,
    avg_quantity: f64,
}

impl SalesReport {
    /// Status and date statistics come from the raw table, money and
    /// schema statistics from the cleaned one.
    pub fn build(
        original: &DataFrame,
        cleaned: &DataFrame,
        total_valid: usize,
        cleaning: SalesCleaningStats,
        relations: RelationStats,
        now: NaiveDate,
    ) -> Result<Self> {
        let total_original = original.height();
        let total_clean = cleaned.height();
        let revenue = revenue_stats(cleaned)?;

        let raw = sales_from_frame(original)?;
        let future_dates = count_verdicts(&raw, |s| is_future_date(s, now));
        let old_pending_sales = count_verdicts(&raw, |s| {
            if s.status() == Some(SaleStatus::Pending) {
                is_older_than_years(s, OLD_PENDING_YEARS, now)
            } else {
                Verdict::Fail
            }
        });

        let mut status_distribution = BTreeMap::new();
        for status in string_values(original, sale::SALE_STATUS)?.into_iter().flatten() {
            *status_distribution.entry(status).or_insert(0) += 1;
        }

        let schema_violations = sales_from_frame(cleaned)?
            .iter()
            .filter(|s| !s.schema_violations().is_empty())
            .count();

        Ok(Self {
            total_original,
            total_clean,
            total_valid,
            success_rate: percentage(total_valid, total_original),
            retention_rate: percentage(total_clean, total_original),
            validation_rate: percentage(total_valid, total_clean),
            total_revenue: revenue.total,
            avg_sale: revenue.avg,
            max_sale: revenue.max,
            min_sale: revenue.min,
            total_quantity: revenue.quantity,
            avg_quantity: revenue.avg_quantity,
            status_distribution,
            future_dates,
            future_dates_pct: percentage(future_dates, total_original),
            old_pending_sales,
            schema_violations,
            cleaning,
            relations,
        })
    }
}

fn count_verdicts(sales: &[Sale], rule: impl Fn(&Sale) -> Verdict) -> usize {
    sales.iter().filter(|s| rule(s) == Verdict::Pass).count()
}

fn revenue_stats(df: &DataFrame) -> Result<Revenue> {
    let mut out = Revenue::default();
    if let Ok(c) = df.column(sale::TOTAL_PRICE) {
        let s = c.cast(&DataType::Float64)?.as_materialized_series().clone();
        out.total = s.sum_reduce()?.value().try_extract::<f64>().unwrap_or(0.0);
        out.avg = s.mean_reduce().value().try_extract::<f64>().unwrap_or(0.0);
        out.max = s.max_reduce()?.value().try_extract::<f64>().unwrap_or(0.0);
        out.min = s.min_reduce()?.value().try_extract::<f64>().unwrap_or(0.0);
    }
    if let Ok(c) = df.column(sale::QUANTITY) {
        let s = c.cast(&DataType::Int64)?.as_materialized_series().clone();
        out.quantity = s.sum_reduce()?.value().try_extract::<i64>().unwrap_or(0);
        out.avg_quantity = s.mean_reduce().value().try_extract::<f64>().unwrap_or(0.0);
    }
    Ok(out)
}

/// Pretty-print `value` as JSON at `path`, creating the parent directory.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, value)?;
    info!("wrote {}", path.display());
    Ok(())
}

//! End-to-end run: load, clean, reconcile, validate, relate, write.

use chrono::NaiveDate;
use polars::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{info, info_span};
use uuid::Uuid;

use crate::cleanup::ensure_output_directories;
use crate::config::PipelineConfig;
use crate::dataset::{write_table, Dataset, DatasetKind};
use crate::employee_cleaner::clean_employees;
use crate::error::Result;
use crate::gender::GenderDetector;
use crate::reconcile::Reassignment;
use crate::records::{employees_from_frame, sales_from_frame, Employee, Sale};
use crate::relations::{RelationStats, RelationsValidator};
use crate::report::{write_json, EmployeesReport, SalesReport};
use crate::sales_cleaner::clean_sales;
use crate::validation::{validate_employees, validate_sales, ValidationMatrix};

const WORKERS: usize = 2;

/// Everything one run produced.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub run_id: Uuid,
    pub employees: DataFrame,
    pub sales: DataFrame,
    pub employee_validation: ValidationMatrix,
    pub sale_validation: ValidationMatrix,
    pub valid_employees: Vec<Employee>,
    pub valid_sales: Vec<Sale>,
    pub reassignments: Vec<Reassignment>,
    pub relations: RelationStats,
    pub employees_report: EmployeesReport,
    pub sales_report: SalesReport,
}

pub struct Pipeline {
    config: PipelineConfig,
    detector: GenderDetector,
    pool: ThreadPool,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, detector: GenderDetector) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(WORKERS)
            .thread_name(|i| format!("roster-worker-{i}"))
            .build()?;
        Ok(Self {
            config,
            detector,
            pool,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run once. `now` is the evaluation date for future-date and age rules.
    pub fn run(&self, now: NaiveDate) -> Result<PipelineOutput> {
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline", run_id = %run_id);
        let _guard = span.enter();
        let cfg = &self.config;

        let employees_source = Dataset::new(DatasetKind::Employees, &cfg.employee_data_path);
        let sales_source = Dataset::new(DatasetKind::Sales, &cfg.sales_data_path);
        let (raw_employees, raw_sales) = self
            .pool
            .join(|| employees_source.load(), || sales_source.load());
        let (raw_employees, raw_sales) = (raw_employees?, raw_sales?);
        info!(
            employees = raw_employees.height(),
            sales = raw_sales.height(),
            "sources loaded"
        );

        let (employees, employee_stats) = clean_employees(&raw_employees, &self.detector)?;
        let cleaned_sales = clean_sales(&raw_sales, &employees)?;
        let sales = cleaned_sales.sales;

        let employee_records = employees_from_frame(&employees)?;
        let sale_records = sales_from_frame(&sales)?;
        let (employee_validation, sale_validation) = self.pool.join(
            || validate_employees(&employee_records),
            || validate_sales(&sale_records, now),
        );
        let (employee_validation, sale_validation) = (employee_validation?, sale_validation?);

        let valid_employees = keep_valid(employee_records.clone(), &employee_validation)?;
        let valid_sales = keep_valid(sale_records, &sale_validation)?;
        info!(
            employees = valid_employees.len(),
            sales = valid_sales.len(),
            "valid records"
        );

        let relations = RelationStats::compute(
            &RelationsValidator::new(&employees, &sales),
            cleaned_sales.stats.sales_reassigned,
        )?;

        ensure_output_directories(&cfg.output_paths())?;
        let (employees_written, sales_written) = self.pool.join(
            || write_table(&employees, &cfg.cleaned_employee_data_path),
            || write_table(&sales, &cfg.cleaned_sales_data_path),
        );
        employees_written?;
        sales_written?;

        let employees_report = EmployeesReport::build(
            raw_employees.height(),
            &employee_records,
            valid_employees.len(),
            employee_stats,
            relations.clone(),
        );
        let sales_report = SalesReport::build(
            &raw_sales,
            &sales,
            valid_sales.len(),
            cleaned_sales.stats,
            relations.clone(),
            now,
        )?;
        write_json(&cfg.employees_report_path(), &employees_report)?;
        write_json(&cfg.sales_report_path(), &sales_report)?;
        write_json(&cfg.relations_report_path(), &relations)?;

        info!(
            reassigned = relations.sales_reassigned,
            without_sales = relations.employees_without_sales,
            "pipeline finished"
        );
        Ok(PipelineOutput {
            run_id,
            employees,
            sales,
            employee_validation,
            sale_validation,
            valid_employees,
            valid_sales,
            reassignments: cleaned_sales.reassignments,
            relations,
            employees_report,
            sales_report,
        })
    }
}

/// Records whose matrix row no rule rejects.
fn keep_valid<T>(records: Vec<T>, matrix: &ValidationMatrix) -> Result<Vec<T>> {
    let mask = matrix.valid_mask()?;
    Ok(records
        .into_iter()
        .zip(mask.into_iter())
        .filter_map(|(r, keep)| keep.unwrap_or(false).then_some(r))
        .collect())
}

//! Batch cleaning, reconciliation and reporting for employee and sales tables.

pub mod cleanup;
pub mod config;
pub mod dataset;
pub mod dates;
pub mod employee_cleaner;
pub mod error;
pub mod field_cleaners;
pub mod gender;
pub mod pipeline;
pub mod reconcile;
pub mod records;
pub mod relations;
pub mod report;
pub mod sales_cleaner;
pub mod schema;
pub mod validation;

pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use gender::GenderDetector;
pub use pipeline::{Pipeline, PipelineOutput};
pub use reconcile::{reconcile_sales, EligibilityIndex, Reassignment, Reconciliation};
pub use relations::{RelationStats, RelationsValidator};
pub use validation::{ValidationMatrix, Verdict};

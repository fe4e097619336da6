use polars::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::dates::coerce_date_column;
use crate::error::Result;
use crate::reconcile::{reconcile_sales, Reassignment};
use crate::schema::{employee, sale};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SalesCleaningStats {
    pub rows_in: usize,
    pub sales_before_hire: usize,
    pub sales_reassigned: usize,
    pub unresolved: usize,
    pub dates_unparseable: usize,
    pub reconciliation_skipped: bool,
}

#[derive(Debug, Clone)]
pub struct SalesCleaning {
    pub sales: DataFrame,
    pub stats: SalesCleaningStats,
    pub reassignments: Vec<Reassignment>,
}

/// Clean the sales table against the cleaned employee table.
///
/// `sale_date` becomes Date (unparseable → null), quantity and prices become
/// numeric (unparseable → null), then sellers are reconciled against hire
/// dates.
pub fn clean_sales(sales: &DataFrame, employees: &DataFrame) -> Result<SalesCleaning> {
    debug!("Cleaning {} sale records", sales.height());
    let rows_in = sales.height();

    let (sales, dates_unparseable) = coerce_date_column(sales.clone(), sale::SALE_DATE)?;
    let sales = coerce_numeric_columns(sales)?;
    let (employees, _) = coerce_date_column(employees.clone(), employee::HIRE_DATE)?;

    let reconciliation = reconcile_sales(sales, &employees)?;
    let stats = SalesCleaningStats {
        rows_in,
        sales_before_hire: reconciliation.invalid_rows.len(),
        sales_reassigned: reconciliation.reassignments.len(),
        unresolved: reconciliation.unresolved(),
        dates_unparseable,
        reconciliation_skipped: reconciliation.skipped,
    };

    Ok(SalesCleaning {
        sales: reconciliation.sales,
        stats,
        reassignments: reconciliation.reassignments,
    })
}

fn coerce_numeric_columns(df: DataFrame) -> Result<DataFrame> {
    let trimmed = |name: &str| {
        col(name)
            .cast(DataType::String)
            .str()
            .strip_chars(lit(" \t\r\n"))
    };

    let mut exprs = Vec::new();
    if df.column(sale::QUANTITY).is_ok() {
        exprs.push(
            trimmed(sale::QUANTITY)
                .cast(DataType::Float64)
                .cast(DataType::Int64),
        );
    }
    for price in sale::PRICES {
        if df.column(price).is_ok() {
            exprs.push(trimmed(price).cast(DataType::Float64));
        }
    }
    if exprs.is_empty() {
        return Ok(df);
    }
    Ok(df.lazy().with_columns(exprs).collect()?)
}

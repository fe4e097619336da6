//! Sale → seller reconciliation.
//!
//! A sale is invalid when it joins to an employee whose hire date is later
//! than the sale date. Invalid sales are reattributed to the first employee,
//! in employee-table order, who was already hired on the sale date. Sales
//! whose seller id matches nobody are not touched here; they surface later
//! as invalid ids in the relation statistics.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::dataset::{missing_columns, string_values};
use crate::dates::{coerce_date_column, date_values, to_epoch_days};
use crate::error::Result;
use crate::schema::{employee, internal, sale};

const REQUIRED_SALES: [&str; 2] = [sale::SALE_DATE, sale::SELLER_EMPLOYEE_ID];
const REQUIRED_EMPLOYEES: [&str; 2] = [employee::EMPLOYEE_ID, employee::HIRE_DATE];

/// One seller change made by the reconciler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reassignment {
    /// Row position in the sales table.
    pub row: usize,
    pub sale_id: Option<String>,
    pub sale_date: NaiveDate,
    pub from: Option<String>,
    pub to: String,
}

#[derive(Debug, Clone)]
pub struct Reconciliation {
    /// The sales table; only `seller_employee_id` values differ from the input.
    pub sales: DataFrame,
    /// Rows whose sale date precedes their seller's hire date, ascending.
    pub invalid_rows: Vec<usize>,
    pub reassignments: Vec<Reassignment>,
    /// Required columns were absent and nothing was checked.
    pub skipped: bool,
}

impl Reconciliation {
    fn skipped(sales: DataFrame) -> Self {
        Self {
            sales,
            invalid_rows: Vec::new(),
            reassignments: Vec::new(),
            skipped: true,
        }
    }

    /// Invalid sales for which no employee qualified.
    pub fn unresolved(&self) -> usize {
        self.invalid_rows.len() - self.reassignments.len()
    }
}

/// Employees ordered for the "first hired on or before" lookup.
///
/// Keeps only the employees that lower the running minimum hire date while
/// walking the table in order. That sequence is strictly decreasing in hire
/// date, and the first employee in table order with `hire_date <= d` is the
/// first entry of the sequence with `hire_date <= d`, so a lookup is a
/// binary search instead of a table scan.
#[derive(Debug, Clone, Default)]
pub struct EligibilityIndex {
    /// (hire date as epoch days, employee id), strictly decreasing by date.
    frontier: Vec<(i32, String)>,
}

impl EligibilityIndex {
    pub fn build(employees: &DataFrame) -> Result<Self> {
        let ids = string_values(employees, employee::EMPLOYEE_ID)?;
        let hires = date_values(employees, employee::HIRE_DATE)?;
        Ok(Self::from_pairs(
            ids.into_iter()
                .zip(hires)
                .filter_map(|(id, hire)| Some((id?, hire?))),
        ))
    }

    /// Build from `(employee_id, hire_date)` pairs in table order.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, NaiveDate)>,
    {
        let mut frontier: Vec<(i32, String)> = Vec::new();
        for (id, hire) in pairs {
            let days = to_epoch_days(hire);
            if frontier.last().map_or(true, |(min, _)| days < *min) {
                frontier.push((days, id));
            }
        }
        Self { frontier }
    }

    /// First employee in table order hired on or before `date`.
    pub fn first_hired_by(&self, date: NaiveDate) -> Option<&str> {
        let days = to_epoch_days(date);
        let pos = self.frontier.partition_point(|(hire, _)| *hire > days);
        self.frontier.get(pos).map(|(_, id)| id.as_str())
    }
}

/// Check every sale against its seller's hire date and repair violations.
///
/// When either table lacks its required columns the sales table comes back
/// unchanged with `skipped` set. Decisions read only the employee table, so
/// one reassignment never influences another and several sales may move to
/// the same employee.
pub fn reconcile_sales(sales: DataFrame, employees: &DataFrame) -> Result<Reconciliation> {
    let missing_sales = missing_columns(&sales, &REQUIRED_SALES);
    if !missing_sales.is_empty() {
        warn!("Missing columns in sales table: {:?}", missing_sales);
        return Ok(Reconciliation::skipped(sales));
    }
    let missing_emps = missing_columns(employees, &REQUIRED_EMPLOYEES);
    if !missing_emps.is_empty() {
        warn!("Missing columns in employee table: {:?}", missing_emps);
        return Ok(Reconciliation::skipped(sales));
    }

    let (mut sales, _) = coerce_date_column(sales, sale::SALE_DATE)?;
    let (employees, _) = coerce_date_column(employees.clone(), employee::HIRE_DATE)?;

    let invalid_rows = find_sales_before_hire(&sales, &employees)?;
    if invalid_rows.is_empty() {
        debug!("every sale is dated on or after its seller's hire date");
        return Ok(Reconciliation {
            sales,
            invalid_rows: Vec::new(),
            reassignments: Vec::new(),
            skipped: false,
        });
    }

    let index = EligibilityIndex::build(&employees)?;
    let sale_dates = date_values(&sales, sale::SALE_DATE)?;
    let sale_ids = string_values(&sales, sale::SALE_ID)?;
    let mut sellers = string_values(&sales, sale::SELLER_EMPLOYEE_ID)?;
    let mut reassignments = Vec::new();

    for &row in &invalid_rows {
        let Some(sale_date) = sale_dates[row] else {
            continue;
        };
        match index.first_hired_by(sale_date) {
            Some(new_seller) => {
                let from = sellers[row].replace(new_seller.to_string());
                debug!(row, ?from, to = new_seller, "reassigned sale");
                reassignments.push(Reassignment {
                    row,
                    sale_id: sale_ids[row].clone(),
                    sale_date,
                    from,
                    to: new_seller.to_string(),
                });
            }
            None => {
                debug!(row, %sale_date, "no employee hired by sale date, seller kept");
            }
        }
    }

    if !reassignments.is_empty() {
        sales.with_column(Column::new(sale::SELLER_EMPLOYEE_ID.into(), sellers))?;
    }

    info!(
        invalid = invalid_rows.len(),
        reassigned = reassignments.len(),
        unresolved = invalid_rows.len() - reassignments.len(),
        "sales reconciliation done"
    );
    Ok(Reconciliation {
        sales,
        invalid_rows,
        reassignments,
        skipped: false,
    })
}

/// Rows of `sales` dated before the hire date of the employee they join to.
/// Unmatched sellers and missing dates never compare true.
fn find_sales_before_hire(sales: &DataFrame, employees: &DataFrame) -> Result<Vec<usize>> {
    let hires = employees.clone().lazy().select([
        col(employee::EMPLOYEE_ID).cast(DataType::String),
        col(employee::HIRE_DATE).alias(internal::SELLER_HIRE_DATE),
    ]);

    let flagged = sales
        .clone()
        .lazy()
        .with_row_index(internal::ROW_INDEX, None)
        .select([
            col(internal::ROW_INDEX),
            col(sale::SELLER_EMPLOYEE_ID).cast(DataType::String),
            col(sale::SALE_DATE),
        ])
        .join(
            hires,
            [col(sale::SELLER_EMPLOYEE_ID)],
            [col(employee::EMPLOYEE_ID)],
            JoinArgs::new(JoinType::Left),
        )
        .filter(col(sale::SALE_DATE).lt(col(internal::SELLER_HIRE_DATE)))
        .select([col(internal::ROW_INDEX).cast(DataType::UInt64)])
        .collect()?;

    // a seller id shared by several employee rows can flag a sale twice
    let rows: BTreeSet<usize> = flagged
        .column(internal::ROW_INDEX)?
        .u64()?
        .into_iter()
        .flatten()
        .map(|i| i as usize)
        .collect();
    Ok(rows.into_iter().collect())
}

//! Cross-table consistency queries between the cleaned employee and sales
//! tables. Every query re-scans both tables. A table missing a column a
//! query needs gives an empty result and a warning, never an error.

use std::collections::HashSet;

use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::dataset::{missing_columns, string_values};
use crate::error::Result;
use crate::records::split_name;
use crate::schema::{employee, relation, sale};

pub struct RelationsValidator<'a> {
    employees: &'a DataFrame,
    sales: &'a DataFrame,
}

impl<'a> RelationsValidator<'a> {
    pub fn new(employees: &'a DataFrame, sales: &'a DataFrame) -> Self {
        Self { employees, sales }
    }

    /// Employees no sale is attributed to, as `employee_id`, `first_name`,
    /// `last_name`. Only the id columns are required; without a `name`
    /// column both name parts are null.
    pub fn employees_without_sales(&self) -> Result<DataFrame> {
        const QUERY: &str = "employees_without_sales";
        if lacks(QUERY, "employees", self.employees, &[employee::EMPLOYEE_ID])
            || lacks(QUERY, "sales", self.sales, &[sale::SELLER_EMPLOYEE_ID])
        {
            return empty_orphans();
        }

        let sellers = self
            .sales
            .clone()
            .lazy()
            .select([
                col(sale::SELLER_EMPLOYEE_ID).cast(DataType::String),
                lit(true).alias(relation::MATCHED),
            ]);

        let mut kept = vec![employee::EMPLOYEE_ID];
        if self.employees.column(employee::NAME).is_ok() {
            kept.push(employee::NAME);
        }
        let orphans = self
            .employees
            .clone()
            .lazy()
            .select(
                kept.iter()
                    .map(|c| col(*c).cast(DataType::String))
                    .collect::<Vec<_>>(),
            )
            .join(
                sellers,
                [col(employee::EMPLOYEE_ID)],
                [col(sale::SELLER_EMPLOYEE_ID)],
                JoinArgs::new(JoinType::Left),
            )
            .filter(col(relation::MATCHED).is_null())
            .select(kept.iter().map(|c| col(*c)).collect::<Vec<_>>())
            .collect()?;

        let names = string_values(&orphans, employee::NAME)?;
        let (first, last): (Vec<Option<String>>, Vec<Option<String>>) = names
            .iter()
            .map(|n| match n.as_deref() {
                Some(full) => {
                    let (first, last) = split_name(full);
                    (Some(first.to_string()), Some(last))
                }
                None => (None, None),
            })
            .unzip();

        let out = DataFrame::new(vec![
            orphans.column(employee::EMPLOYEE_ID)?.clone(),
            Column::new(relation::FIRST_NAME.into(), first),
            Column::new(relation::LAST_NAME.into(), last),
        ])?;
        debug!(count = out.height(), "employees without sales");
        Ok(out)
    }

    pub fn count_employees_without_sales(&self) -> Result<usize> {
        Ok(self.employees_without_sales()?.height())
    }

    /// Sales whose seller id is not a known employee id (null ids included).
    pub fn invalid_employee_ids_in_sales(&self) -> Result<DataFrame> {
        const QUERY: &str = "invalid_employee_ids_in_sales";
        if lacks(QUERY, "employees", self.employees, &[employee::EMPLOYEE_ID])
            || lacks(QUERY, "sales", self.sales, &[sale::SELLER_EMPLOYEE_ID])
        {
            return Ok(self.sales.clear());
        }

        let known = self
            .employees
            .column(employee::EMPLOYEE_ID)?
            .cast(&DataType::String)?
            .as_materialized_series()
            .drop_nulls();

        let df = self
            .sales
            .clone()
            .lazy()
            .filter(
                col(sale::SELLER_EMPLOYEE_ID)
                    .cast(DataType::String)
                    .is_in(lit(known), false)
                    .fill_null(lit(false))
                    .not(),
            )
            .collect()?;
        debug!(count = df.height(), "sales with unknown seller id");
        Ok(df)
    }

    /// Sales whose seller (first, last) name matches no employee, compared
    /// trimmed and case-insensitively.
    pub fn invalid_names_in_sales(&self) -> Result<DataFrame> {
        const QUERY: &str = "invalid_names_in_sales";
        if lacks(QUERY, "employees", self.employees, &[employee::NAME])
            || lacks(
                QUERY,
                "sales",
                self.sales,
                &[sale::SELLER_FIRST_NAME, sale::SELLER_LAST_NAME],
            )
        {
            return Ok(self.sales.clear());
        }

        let known: HashSet<(String, String)> = string_values(self.employees, employee::NAME)?
            .into_iter()
            .flatten()
            .map(|full| {
                let (first, last) = split_name(&full);
                (normalize(first), normalize(&last))
            })
            .collect();

        let firsts = string_values(self.sales, sale::SELLER_FIRST_NAME)?;
        let lasts = string_values(self.sales, sale::SELLER_LAST_NAME)?;
        let mask: Vec<bool> = firsts
            .iter()
            .zip(lasts.iter())
            .map(|(f, l)| {
                let pair = (
                    normalize(f.as_deref().unwrap_or("")),
                    normalize(l.as_deref().unwrap_or("")),
                );
                !known.contains(&pair)
            })
            .collect();

        let df = self
            .sales
            .filter(&BooleanChunked::from_slice("invalid".into(), &mask))?;
        debug!(count = df.height(), "sales with unmatched seller name");
        Ok(df)
    }
}

/// Warn and return true when `df` lacks any of `required`.
fn lacks(query: &str, table: &str, df: &DataFrame, required: &[&str]) -> bool {
    let missing = missing_columns(df, required);
    if missing.is_empty() {
        return false;
    }
    warn!(query, table, ?missing, "required columns absent, result left empty");
    true
}

fn empty_orphans() -> Result<DataFrame> {
    Ok(DataFrame::new(vec![
        Column::new_empty(employee::EMPLOYEE_ID.into(), &DataType::String),
        Column::new_empty(relation::FIRST_NAME.into(), &DataType::String),
        Column::new_empty(relation::LAST_NAME.into(), &DataType::String),
    ])?)
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Relation statistics handed to the reporting side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RelationStats {
    pub employees_without_sales: usize,
    pub employees_with_sales: usize,
    pub invalid_employee_ids_in_sales: usize,
    pub invalid_names_in_sales: usize,
    pub sales_with_valid_employee: usize,
    pub sales_with_invalid_employee: usize,
    pub sales_reassigned: usize,
}

impl RelationStats {
    /// `sales_reassigned` comes from reconciliation; the relation queries
    /// cannot see it.
    pub fn compute(validator: &RelationsValidator<'_>, sales_reassigned: usize) -> Result<Self> {
        let without = validator.count_employees_without_sales()?;
        let invalid_ids = validator.invalid_employee_ids_in_sales()?.height();
        let invalid_names = validator.invalid_names_in_sales()?.height();

        let stats = Self {
            employees_without_sales: without,
            employees_with_sales: validator.employees.height().saturating_sub(without),
            invalid_employee_ids_in_sales: invalid_ids,
            invalid_names_in_sales: invalid_names,
            sales_with_valid_employee: validator.sales.height().saturating_sub(invalid_ids),
            sales_with_invalid_employee: invalid_ids,
            sales_reassigned,
        };
        info!(
            without_sales = stats.employees_without_sales,
            invalid_ids = stats.invalid_employee_ids_in_sales,
            invalid_names = stats.invalid_names_in_sales,
            reassigned = stats.sales_reassigned,
            "relation statistics computed"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employees() -> DataFrame {
        df!(
            employee::EMPLOYEE_ID => &["1", "2", "3"],
            employee::NAME => &["Alice Smith", "Bob Johnson", "Charlie Williams"]
        )
        .unwrap()
    }

    fn sales() -> DataFrame {
        df!(
            sale::SALE_ID => &["SALE1", "SALE2", "SALE3", "SALE4"],
            sale::SELLER_EMPLOYEE_ID => &["1", "2", "4", "3"],
            sale::SELLER_FIRST_NAME => &["Alice", "bob ", "David", "Charlie"],
            sale::SELLER_LAST_NAME => &["Smith", "JOHNSON", "Brown", "Williams"]
        )
        .unwrap()
    }

    #[test]
    fn reference_fixture_counts() {
        let (e, s) = (employees(), sales());
        let v = RelationsValidator::new(&e, &s);

        let invalid = v.invalid_employee_ids_in_sales().unwrap();
        assert_eq!(invalid.height(), 1);
        let ids = string_values(&invalid, sale::SELLER_EMPLOYEE_ID).unwrap();
        assert_eq!(ids[0].as_deref(), Some("4"));

        assert_eq!(v.count_employees_without_sales().unwrap(), 0);

        let names = v.invalid_names_in_sales().unwrap();
        assert_eq!(names.height(), 1);
        let first = string_values(&names, sale::SELLER_FIRST_NAME).unwrap();
        assert_eq!(first[0].as_deref(), Some("David"));
    }

    #[test]
    fn orphan_listing_splits_names() {
        let e = df!(
            employee::EMPLOYEE_ID => &["1", "2", "5"],
            employee::NAME => &["Alice Smith", "Bob Johnson", "Mary Anne Lee"]
        )
        .unwrap();
        let s = sales();
        let v = RelationsValidator::new(&e, &s);
        let orphans = v.employees_without_sales().unwrap();
        assert_eq!(orphans.height(), 1);
        assert_eq!(
            string_values(&orphans, employee::EMPLOYEE_ID).unwrap()[0].as_deref(),
            Some("5")
        );
        assert_eq!(
            string_values(&orphans, relation::FIRST_NAME).unwrap()[0].as_deref(),
            Some("Mary")
        );
        assert_eq!(
            string_values(&orphans, relation::LAST_NAME).unwrap()[0].as_deref(),
            Some("Anne Lee")
        );
    }

    #[test]
    fn null_seller_ids_are_invalid() {
        let e = employees();
        let s = df!(sale::SELLER_EMPLOYEE_ID => &[Some("1"), None]).unwrap();
        let v = RelationsValidator::new(&e, &s);
        assert_eq!(v.invalid_employee_ids_in_sales().unwrap().height(), 1);
        // no seller name columns to compare
        assert_eq!(v.invalid_names_in_sales().unwrap().height(), 0);
    }

    #[test]
    fn stats_carry_reassignments() {
        let (e, s) = (employees(), sales());
        let v = RelationsValidator::new(&e, &s);
        let stats = RelationStats::compute(&v, 2).unwrap();
        assert_eq!(
            stats,
            RelationStats {
                employees_without_sales: 0,
                employees_with_sales: 3,
                invalid_employee_ids_in_sales: 1,
                invalid_names_in_sales: 1,
                sales_with_valid_employee: 3,
                sales_with_invalid_employee: 1,
                sales_reassigned: 2,
            }
        );
    }

    #[test]
    fn missing_seller_column_gives_empty_results() {
        let e = employees();
        let s = df!(sale::SALE_ID => &["SALE1"]).unwrap();
        let v = RelationsValidator::new(&e, &s);

        let orphans = v.employees_without_sales().unwrap();
        assert_eq!(orphans.height(), 0);
        assert_eq!(
            orphans.get_column_names_str(),
            vec![employee::EMPLOYEE_ID, relation::FIRST_NAME, relation::LAST_NAME]
        );
        let invalid = v.invalid_employee_ids_in_sales().unwrap();
        assert_eq!(invalid.height(), 0);
        assert_eq!(invalid.get_column_names_str(), vec![sale::SALE_ID]);
        assert_eq!(v.invalid_names_in_sales().unwrap().height(), 0);
    }

    #[test]
    fn id_only_employees_still_relate() {
        let e = df!(employee::EMPLOYEE_ID => &["EMP1", "EMP2"]).unwrap();
        let s = df!(sale::SELLER_EMPLOYEE_ID => &["EMP1"]).unwrap();
        let v = RelationsValidator::new(&e, &s);

        let orphans = v.employees_without_sales().unwrap();
        assert_eq!(orphans.height(), 1);
        assert_eq!(
            string_values(&orphans, employee::EMPLOYEE_ID).unwrap(),
            vec![Some("EMP2".to_string())]
        );
        assert_eq!(string_values(&orphans, relation::FIRST_NAME).unwrap(), vec![None]);
        assert_eq!(string_values(&orphans, relation::LAST_NAME).unwrap(), vec![None]);

        let single = df!(employee::EMPLOYEE_ID => &["EMP1"]).unwrap();
        let stats = RelationStats::compute(&RelationsValidator::new(&single, &s), 0).unwrap();
        assert_eq!(
            stats,
            RelationStats {
                employees_with_sales: 1,
                sales_with_valid_employee: 1,
                ..Default::default()
            }
        );
    }
}

use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::dataset::{missing_columns, string_values};
use crate::dates::coerce_date_column;
use crate::error::Result;
use crate::field_cleaners::{clean_email, clean_phone, EMAIL_SENTINEL, PHONE_SENTINEL};
use crate::gender::GenderDetector;
use crate::schema::employee;

/// What the employee pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmployeeCleaningStats {
    pub rows_in: usize,
    pub rows_dropped: usize,
    pub emails_invalid: usize,
    pub phones_invalid: usize,
    pub genders_changed: usize,
    pub dates_unparseable: usize,
}

/// Clean the employee table.
///
/// - rows without `employee_id` or `name` are dropped
/// - phone and email go through the field cleaners
/// - gender is re-derived from the first name and overwritten on mismatch
/// - `age` is removed
/// - date columns become Date, `salary` becomes Float64
pub fn clean_employees(
    df: &DataFrame,
    detector: &GenderDetector,
) -> Result<(DataFrame, EmployeeCleaningStats)> {
    let mut stats = EmployeeCleaningStats {
        rows_in: df.height(),
        ..Default::default()
    };
    debug!("Cleaning {} employee records", df.height());

    let mut df = drop_incomplete_rows(df.clone(), &mut stats)?;

    if df.column(employee::PHONE).is_ok() {
        let cleaned: Vec<String> = df
            .column(employee::PHONE)?
            .cast(&DataType::String)?
            .str()?
            .into_iter()
            .map(clean_phone)
            .collect();
        stats.phones_invalid = cleaned.iter().filter(|p| *p == PHONE_SENTINEL).count();
        df.with_column(Column::new(employee::PHONE.into(), cleaned))?;
    }

    if df.column(employee::EMAIL).is_ok() {
        let cleaned: Vec<String> = df
            .column(employee::EMAIL)?
            .cast(&DataType::String)?
            .str()?
            .into_iter()
            .map(clean_email)
            .collect();
        stats.emails_invalid = cleaned.iter().filter(|e| *e == EMAIL_SENTINEL).count();
        df.with_column(Column::new(employee::EMAIL.into(), cleaned))?;
    }

    if df.column(employee::GENDER).is_ok() && df.column(employee::NAME).is_ok() {
        let names = string_values(&df, employee::NAME)?;
        let current = string_values(&df, employee::GENDER)?;
        let mut genders = Vec::with_capacity(names.len());
        for (name, gender) in names.iter().zip(current.iter()) {
            let (inferred, changed) = detector.correct(name.as_deref().unwrap_or(""), gender.as_deref());
            if changed {
                stats.genders_changed += 1;
            }
            genders.push(inferred.as_str());
        }
        df.with_column(Column::new(employee::GENDER.into(), genders))?;
    }

    if df.column(employee::AGE).is_ok() {
        df = df.drop(employee::AGE)?;
    }

    for column in employee::DATES {
        let (coerced, bad) = coerce_date_column(df, column)?;
        df = coerced;
        stats.dates_unparseable += bad;
    }

    if df.column(employee::SALARY).is_ok() {
        df = df
            .lazy()
            .with_columns([col(employee::SALARY)
                .cast(DataType::String)
                .str()
                .strip_chars(lit(" \t\r\n"))
                .cast(DataType::Float64)])
            .collect()?;
    }

    info!(
        kept = df.height(),
        dropped = stats.rows_dropped,
        emails_invalid = stats.emails_invalid,
        phones_invalid = stats.phones_invalid,
        genders_changed = stats.genders_changed,
        "employee cleaning done"
    );
    Ok((df, stats))
}

fn drop_incomplete_rows(df: DataFrame, stats: &mut EmployeeCleaningStats) -> Result<DataFrame> {
    let required = [employee::EMPLOYEE_ID, employee::NAME];
    let missing = missing_columns(&df, &required);
    if !missing.is_empty() {
        warn!("Missing columns in employee table: {:?}", missing);
        return Ok(df);
    }

    let before = df.height();
    let kept = df
        .lazy()
        .filter(
            col(employee::EMPLOYEE_ID)
                .is_not_null()
                .and(col(employee::NAME).is_not_null()),
        )
        .collect()?;
    stats.rows_dropped = before - kept.height();
    if stats.rows_dropped > 0 {
        warn!(
            "dropped {} employee rows without employee_id or name",
            stats.rows_dropped
        );
    }
    Ok(kept)
}

//! Per-record rule evaluation.
//!
//! Every rule yields a [`Verdict`]; `Unknown` means the inputs were missing and
//! the rule could not be computed. A matrix holds one row per record and one
//! nullable Boolean column per rule.

use chrono::{Months, NaiveDate};
use polars::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::dates::{days_between, years_between};
use crate::error::Result;
use crate::records::{Employee, Sale, SaleStatus};
use crate::schema::{employee, rules, sale};

const TOTAL_PRICE_TOLERANCE: f64 = 0.01;
const ADULT_AGE: i64 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    Pass,
    Fail,
    Unknown,
}

impl Verdict {
    pub fn as_option(self) -> Option<bool> {
        match self {
            Self::Pass => Some(true),
            Self::Fail => Some(false),
            Self::Unknown => None,
        }
    }

    pub fn from_bool(ok: bool) -> Self {
        if ok {
            Self::Pass
        } else {
            Self::Fail
        }
    }

    pub fn is_fail(self) -> bool {
        self == Self::Fail
    }
}

impl From<Option<bool>> for Verdict {
    fn from(v: Option<bool>) -> Self {
        v.map_or(Self::Unknown, Self::from_bool)
    }
}

// ── Employee rules ──────────────────────────────────────────────────────────

/// Termination at least one day after hire.
pub fn termination_after_hire(e: &Employee) -> Verdict {
    match (e.hire_date, e.termination_date) {
        (Some(hire), Some(term)) => Verdict::from_bool(days_between(hire, term) >= 1),
        _ => Verdict::Unknown,
    }
}

/// At least 18 whole years (365-day years) between birth and termination.
pub fn termination_after_birthdate(e: &Employee) -> Verdict {
    match (e.birthdate, e.termination_date) {
        (Some(birth), Some(term)) => Verdict::from_bool(years_between(birth, term) >= ADULT_AGE),
        _ => Verdict::Unknown,
    }
}

// ── Sale rules ──────────────────────────────────────────────────────────────

fn status_is(s: &Sale, wanted: SaleStatus) -> Verdict {
    Verdict::from_bool(s.status() == Some(wanted))
}

pub fn is_pending(s: &Sale) -> Verdict {
    status_is(s, SaleStatus::Pending)
}

pub fn is_completed(s: &Sale) -> Verdict {
    status_is(s, SaleStatus::Completed)
}

pub fn is_cancelled(s: &Sale) -> Verdict {
    status_is(s, SaleStatus::Cancelled)
}

/// Sale dated after `now`.
pub fn is_future_date(s: &Sale, now: NaiveDate) -> Verdict {
    s.sale_date.map_or(Verdict::Unknown, |d| Verdict::from_bool(d > now))
}

/// Both prices present and non-negative.
pub fn validate_prices(s: &Sale) -> Verdict {
    match (s.unit_price, s.total_price) {
        (Some(unit), Some(total)) => Verdict::from_bool(unit >= 0.0 && total >= 0.0),
        _ => Verdict::Fail,
    }
}

/// `|total - quantity * unit_price| < 0.01`; any missing operand fails.
pub fn validate_total_price(s: &Sale) -> Verdict {
    match (s.quantity, s.unit_price, s.total_price) {
        (Some(qty), Some(unit), Some(total)) => {
            Verdict::from_bool((total - qty as f64 * unit).abs() < TOTAL_PRICE_TOLERANCE)
        }
        _ => Verdict::Fail,
    }
}

/// At least one whole year between hire and sale.
pub fn years_between_hire_and_sale(hire: Option<NaiveDate>, sale_date: Option<NaiveDate>) -> Verdict {
    match (hire, sale_date) {
        (Some(hire), Some(date)) => Verdict::from_bool(years_between(hire, date) >= 1),
        _ => Verdict::Unknown,
    }
}

/// Sale dated before `reference` minus `years` calendar years. This is the
/// old-pending cutoff of the sales report; it counts calendar years, not
/// whole 365-day spans, so a sale exactly `years` years back is not older.
pub fn is_older_than_years(s: &Sale, years: u32, reference: NaiveDate) -> Verdict {
    let (Some(date), Some(cutoff)) = (
        s.sale_date,
        reference.checked_sub_months(Months::new(years.saturating_mul(12))),
    ) else {
        return Verdict::Unknown;
    };
    Verdict::from_bool(date < cutoff)
}

// ── Matrices ────────────────────────────────────────────────────────────────

/// Rule results for one table, plus the names of its rule columns.
#[derive(Debug, Clone)]
pub struct ValidationMatrix {
    pub frame: DataFrame,
    pub rules: &'static [&'static str],
}

/// Pass / fail / unknown counts of one rule column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RuleTally {
    pub passed: usize,
    pub failed: usize,
    pub unknown: usize,
}

impl ValidationMatrix {
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// True for rows where no rule column is explicitly false. Unknown
    /// verdicts never disqualify a row.
    pub fn valid_mask(&self) -> Result<BooleanChunked> {
        self.mask_over(self.rules)
    }

    pub fn valid_count(&self) -> Result<usize> {
        Ok(count_true(&self.valid_mask()?))
    }

    /// Rows where none of `columns` is explicitly false. Descriptive only;
    /// validity always looks at every rule.
    pub fn passing_count(&self, columns: &[&str]) -> Result<usize> {
        Ok(count_true(&self.mask_over(columns)?))
    }

    fn mask_over(&self, columns: &[&str]) -> Result<BooleanChunked> {
        let mut keep = vec![true; self.frame.height()];
        for name in columns {
            let values = self.frame.column(name)?.bool()?;
            for (slot, v) in keep.iter_mut().zip(values.into_iter()) {
                if v == Some(false) {
                    *slot = false;
                }
            }
        }
        Ok(BooleanChunked::from_slice("valid".into(), &keep))
    }

    pub fn tally(&self, rule: &str) -> Result<RuleTally> {
        let mut tally = RuleTally::default();
        for v in self.frame.column(rule)?.bool()?.into_iter() {
            match v {
                Some(true) => tally.passed += 1,
                Some(false) => tally.failed += 1,
                None => tally.unknown += 1,
            }
        }
        Ok(tally)
    }

    /// Keep the rows of `df` (aligned with this matrix) that no rule rejects.
    pub fn filter_valid(&self, df: &DataFrame) -> Result<DataFrame> {
        Ok(df.filter(&self.valid_mask()?)?)
    }
}

fn count_true(mask: &BooleanChunked) -> usize {
    mask.into_iter().filter(|v| *v == Some(true)).count()
}

fn rule_column<T>(name: &str, records: &[T], rule: impl Fn(&T) -> Verdict) -> Column {
    let values: Vec<Option<bool>> = records.iter().map(|r| rule(r).as_option()).collect();
    Column::new(name.into(), values)
}

pub fn validate_employees(employees: &[Employee]) -> Result<ValidationMatrix> {
    debug!("Validating {} employee records", employees.len());
    let ids: Vec<&str> = employees.iter().map(|e| e.employee_id.as_str()).collect();
    let names: Vec<&str> = employees.iter().map(|e| e.name.as_str()).collect();
    let frame = DataFrame::new(vec![
        Column::new(employee::EMPLOYEE_ID.into(), ids),
        Column::new(employee::NAME.into(), names),
        rule_column(rules::TERMINATION_AFTER_HIRE, employees, termination_after_hire),
        rule_column(rules::TERMINATION_AFTER_BIRTHDATE, employees, termination_after_birthdate),
    ])?;
    Ok(ValidationMatrix {
        frame,
        rules: &rules::EMPLOYEE_RULES,
    })
}

/// `now` is the evaluation time used by `is_future_date`.
pub fn validate_sales(sales: &[Sale], now: NaiveDate) -> Result<ValidationMatrix> {
    debug!("Validating {} sale records", sales.len());
    let ids: Vec<Option<&str>> = sales.iter().map(|s| s.sale_id.as_deref()).collect();
    let products: Vec<Option<&str>> = sales.iter().map(|s| s.product_id.as_deref()).collect();
    let frame = DataFrame::new(vec![
        Column::new(sale::SALE_ID.into(), ids),
        Column::new(sale::PRODUCT_ID.into(), products),
        rule_column(rules::IS_PENDING, sales, is_pending),
        rule_column(rules::IS_COMPLETED, sales, is_completed),
        rule_column(rules::IS_CANCELLED, sales, is_cancelled),
        rule_column(rules::IS_FUTURE_DATE, sales, |s| is_future_date(s, now)),
        rule_column(rules::VALIDATE_PRICES, sales, validate_prices),
        rule_column(rules::VALIDATE_TOTAL_PRICE, sales, validate_total_price),
    ])?;
    Ok(ValidationMatrix {
        frame,
        rules: &rules::SALE_RULES,
    })
}

//! Canonical record types and the one adapter that builds them from frames.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;
use serde::Serialize;

use crate::dataset::string_values;
use crate::dates::{coerce_date_column, date_values};
use crate::error::{PipelineError, Result};
use crate::schema::{employee, sale};

static EMPLOYEE_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^EMP\d+$").expect("static pattern"));
static SALE_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^SALE\d+$").expect("static pattern"));
static PRODUCT_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^PROD\d+$").expect("static pattern"));

pub const CONTRACT_TYPES: [&str; 4] = ["Full-time", "Part-time", "Temporary", "Freelance"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SaleStatus {
    Completed,
    Pending,
    Cancelled,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "Completed",
            Self::Pending => "Pending",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl FromStr for SaleStatus {
    type Err = PipelineError;

    /// Case-insensitive; both "cancelled" and "canceled" are accepted.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "completed" => Ok(Self::Completed),
            "pending" => Ok(Self::Pending),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            other => Err(PipelineError::InvalidData(format!("unknown sale status '{other}'"))),
        }
    }
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First whitespace token, and the remaining tokens joined by single spaces.
pub fn split_name(full: &str) -> (&str, String) {
    let mut tokens = full.split_whitespace();
    let first = tokens.next().unwrap_or("");
    (first, tokens.collect::<Vec<_>>().join(" "))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Employee {
    pub employee_id: String,
    pub name: String,
    pub gender: Option<String>,
    pub nationality: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub contract_type: Option<String>,
    pub salary: Option<f64>,
    pub termination_date: Option<NaiveDate>,
}

impl Employee {
    /// A bare record with only the identity fields set.
    pub fn new(employee_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            employee_id: employee_id.into(),
            name: name.into(),
            gender: None,
            nationality: None,
            department: None,
            position: None,
            birthdate: None,
            email: None,
            phone: None,
            address: None,
            hire_date: None,
            contract_type: None,
            salary: None,
            termination_date: None,
        }
    }

    pub fn first_name(&self) -> &str {
        split_name(&self.name).0
    }

    pub fn last_name(&self) -> String {
        split_name(&self.name).1
    }

    /// Fields that do not have the expected shape.
    pub fn schema_violations(&self) -> Vec<&'static str> {
        let mut bad = Vec::new();
        if !EMPLOYEE_ID_RE.is_match(&self.employee_id) {
            bad.push(employee::EMPLOYEE_ID);
        }
        if self.name.trim().is_empty() {
            bad.push(employee::NAME);
        }
        if !matches!(self.contract_type.as_deref(), Some(c) if CONTRACT_TYPES.contains(&c)) {
            bad.push(employee::CONTRACT_TYPE);
        }
        if !matches!(self.salary, Some(s) if s > 0.0) {
            bad.push(employee::SALARY);
        }
        if self.hire_date.is_none() {
            bad.push(employee::HIRE_DATE);
        }
        bad
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Sale {
    pub sale_id: Option<String>,
    pub product_id: Option<String>,
    pub seller_first_name: Option<String>,
    pub seller_last_name: Option<String>,
    pub seller_employee_id: Option<String>,
    pub buyer_name: Option<String>,
    pub sale_date: Option<NaiveDate>,
    pub quantity: Option<i64>,
    pub unit_price: Option<f64>,
    pub total_price: Option<f64>,
    /// Raw status text; see [`Sale::status`] for the parsed value.
    pub sale_status: Option<String>,
}

impl Sale {
    pub fn status(&self) -> Option<SaleStatus> {
        self.sale_status.as_deref()?.parse().ok()
    }

    pub fn schema_violations(&self) -> Vec<&'static str> {
        let mut bad = Vec::new();
        let fits = |re: &Regex, v: &Option<String>| v.as_deref().is_some_and(|s| re.is_match(s));
        if !fits(&*SALE_ID_RE, &self.sale_id) {
            bad.push(sale::SALE_ID);
        }
        if !fits(&*PRODUCT_ID_RE, &self.product_id) {
            bad.push(sale::PRODUCT_ID);
        }
        if !fits(&*EMPLOYEE_ID_RE, &self.seller_employee_id) {
            bad.push(sale::SELLER_EMPLOYEE_ID);
        }
        if self
            .seller_first_name
            .as_deref()
            .map_or(true, |s| s.trim().is_empty())
        {
            bad.push(sale::SELLER_FIRST_NAME);
        }
        if self.sale_date.is_none() {
            bad.push(sale::SALE_DATE);
        }
        if !matches!(self.quantity, Some(q) if q > 0) {
            bad.push(sale::QUANTITY);
        }
        if !matches!(self.unit_price, Some(p) if p > 0.0) {
            bad.push(sale::UNIT_PRICE);
        }
        if !matches!(self.total_price, Some(p) if p > 0.0) {
            bad.push(sale::TOTAL_PRICE);
        }
        // the validated shape only knows the British spelling
        if !matches!(self.sale_status.as_deref().map(str::trim), Some("Completed" | "Pending" | "Cancelled")) {
            bad.push(sale::SALE_STATUS);
        }
        bad
    }
}

// ── Frame adapter ───────────────────────────────────────────────────────────

/// Typed column access that tolerates absent columns (read as all-null).
struct FrameReader<'a> {
    df: &'a DataFrame,
}

impl<'a> FrameReader<'a> {
    fn strings(&self, column: &str) -> Result<std::vec::IntoIter<Option<String>>> {
        Ok(string_values(self.df, column)?.into_iter())
    }

    fn dates(&self, column: &str) -> Result<std::vec::IntoIter<Option<NaiveDate>>> {
        let values = match self.df.column(column) {
            Err(_) => vec![None; self.df.height()],
            Ok(c) if c.dtype() == &DataType::Date => date_values(self.df, column)?,
            Ok(_) => {
                let (coerced, _) = coerce_date_column(self.df.select([column])?, column)?;
                date_values(&coerced, column)?
            }
        };
        Ok(values.into_iter())
    }

    fn floats(&self, column: &str) -> Result<std::vec::IntoIter<Option<f64>>> {
        let Ok(c) = self.df.column(column) else {
            return Ok(vec![None; self.df.height()].into_iter());
        };
        let c = c.cast(&DataType::Float64)?;
        Ok(c.f64()?.into_iter().collect::<Vec<_>>().into_iter())
    }

    fn ints(&self, column: &str) -> Result<std::vec::IntoIter<Option<i64>>> {
        let Ok(c) = self.df.column(column) else {
            return Ok(vec![None; self.df.height()].into_iter());
        };
        let c = c.cast(&DataType::Float64)?.cast(&DataType::Int64)?;
        Ok(c.i64()?.into_iter().collect::<Vec<_>>().into_iter())
    }
}

/// Build employee records from a cleaned employee frame, one per row in
/// row order. A missing id or name reads as an empty string.
pub fn employees_from_frame(df: &DataFrame) -> Result<Vec<Employee>> {
    let r = FrameReader { df };
    let mut ids = r.strings(employee::EMPLOYEE_ID)?;
    let mut names = r.strings(employee::NAME)?;
    let mut genders = r.strings(employee::GENDER)?;
    let mut nationalities = r.strings(employee::NATIONALITY)?;
    let mut departments = r.strings(employee::DEPARTMENT)?;
    let mut positions = r.strings(employee::POSITION)?;
    let mut birthdates = r.dates(employee::BIRTHDATE)?;
    let mut emails = r.strings(employee::EMAIL)?;
    let mut phones = r.strings(employee::PHONE)?;
    let mut addresses = r.strings(employee::ADDRESS)?;
    let mut hires = r.dates(employee::HIRE_DATE)?;
    let mut contracts = r.strings(employee::CONTRACT_TYPE)?;
    let mut salaries = r.floats(employee::SALARY)?;
    let mut terminations = r.dates(employee::TERMINATION_DATE)?;

    Ok((0..df.height())
        .map(|_| Employee {
            employee_id: ids.next().flatten().unwrap_or_default(),
            name: names.next().flatten().unwrap_or_default(),
            gender: genders.next().flatten(),
            nationality: nationalities.next().flatten(),
            department: departments.next().flatten(),
            position: positions.next().flatten(),
            birthdate: birthdates.next().flatten(),
            email: emails.next().flatten(),
            phone: phones.next().flatten(),
            address: addresses.next().flatten(),
            hire_date: hires.next().flatten(),
            contract_type: contracts.next().flatten(),
            salary: salaries.next().flatten(),
            termination_date: terminations.next().flatten(),
        })
        .collect())
}

/// Build sale records from a cleaned sales frame, one per row in row order.
pub fn sales_from_frame(df: &DataFrame) -> Result<Vec<Sale>> {
    let r = FrameReader { df };
    let mut ids = r.strings(sale::SALE_ID)?;
    let mut products = r.strings(sale::PRODUCT_ID)?;
    let mut first_names = r.strings(sale::SELLER_FIRST_NAME)?;
    let mut last_names = r.strings(sale::SELLER_LAST_NAME)?;
    let mut sellers = r.strings(sale::SELLER_EMPLOYEE_ID)?;
    let mut buyers = r.strings(sale::BUYER_NAME)?;
    let mut dates = r.dates(sale::SALE_DATE)?;
    let mut quantities = r.ints(sale::QUANTITY)?;
    let mut unit_prices = r.floats(sale::UNIT_PRICE)?;
    let mut totals = r.floats(sale::TOTAL_PRICE)?;
    let mut statuses = r.strings(sale::SALE_STATUS)?;

    Ok((0..df.height())
        .map(|_| Sale {
            sale_id: ids.next().flatten(),
            product_id: products.next().flatten(),
            seller_first_name: first_names.next().flatten(),
            seller_last_name: last_names.next().flatten(),
            seller_employee_id: sellers.next().flatten(),
            buyer_name: buyers.next().flatten(),
            sale_date: dates.next().flatten(),
            quantity: quantities.next().flatten(),
            unit_price: unit_prices.next().flatten(),
            total_price: totals.next().flatten(),
            sale_status: statuses.next().flatten(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parsing_accepts_both_spellings() {
        assert_eq!("Pending".parse::<SaleStatus>().unwrap(), SaleStatus::Pending);
        assert_eq!(" COMPLETED ".parse::<SaleStatus>().unwrap(), SaleStatus::Completed);
        assert_eq!("canceled".parse::<SaleStatus>().unwrap(), SaleStatus::Cancelled);
        assert!("refunded".parse::<SaleStatus>().is_err());
    }

    #[test]
    fn name_split() {
        let e = Employee::new("EMP1", "Mary  Anne Smith");
        assert_eq!(e.first_name(), "Mary");
        assert_eq!(e.last_name(), "Anne Smith");
        assert_eq!(Employee::new("EMP2", "Cher").last_name(), "");
    }

    #[test]
    fn adapter_reads_string_frames() {
        let df = df!(
            employee::EMPLOYEE_ID => &[Some("EMP1"), None],
            employee::NAME => &[Some("Alice Smith"), Some("Nobody")],
            employee::HIRE_DATE => &[Some("2020-01-01"), Some("2021-01-01")],
            employee::SALARY => &[Some("1200.5"), None],
            employee::CONTRACT_TYPE => &[Some("Full-time"), None]
        )
        .unwrap();
        let employees = employees_from_frame(&df).unwrap();
        assert_eq!(employees.len(), 2);
        assert_eq!(employees[1].employee_id, "");
        assert!(employees[1].schema_violations().contains(&employee::EMPLOYEE_ID));
        let e = &employees[0];
        assert_eq!(e.employee_id, "EMP1");
        assert_eq!(e.hire_date, NaiveDate::from_ymd_opt(2020, 1, 1));
        assert_eq!(e.salary, Some(1200.5));
        assert_eq!(e.termination_date, None);
        assert!(e.schema_violations().is_empty());
    }

    #[test]
    fn sale_adapter_and_schema_checks() {
        let df = df!(
            sale::SALE_ID => &["SALE1", "S-2"],
            sale::PRODUCT_ID => &["PROD9", "PROD1"],
            sale::SELLER_FIRST_NAME => &["Alice", ""],
            sale::SELLER_EMPLOYEE_ID => &["EMP1", "EMP2"],
            sale::SALE_DATE => &["2022-03-01", "2022-03-02"],
            sale::QUANTITY => &["2", "0"],
            sale::UNIT_PRICE => &["10", "10"],
            sale::TOTAL_PRICE => &["20", "0"],
            sale::SALE_STATUS => &["Completed", "canceled"]
        )
        .unwrap();
        let sales = sales_from_frame(&df).unwrap();
        assert_eq!(sales.len(), 2);
        assert_eq!(sales[0].quantity, Some(2));
        assert_eq!(sales[0].status(), Some(SaleStatus::Completed));
        assert!(sales[0].schema_violations().is_empty());
        assert_eq!(sales[1].status(), Some(SaleStatus::Cancelled));
        assert_eq!(
            sales[1].schema_violations(),
            vec![
                sale::SALE_ID,
                sale::SELLER_FIRST_NAME,
                sale::QUANTITY,
                sale::TOTAL_PRICE,
                sale::SALE_STATUS
            ]
        );
    }
}

//! Tolerant date handling shared by the cleaners, the reconciler and the
//! record adapter.
//!
//! Source files carry dates in whatever shape the upstream export produced.
//! Values are parsed against a fixed list of formats; anything that does not
//! match becomes null instead of failing the run.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::*;

use crate::error::{PipelineError, Result};

/// `NaiveDate::num_days_from_ce` of 1970-01-01.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];

const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
];

/// Parse a date, dropping any time-of-day component. Returns `None` for
/// empty, `nan`/`NaT` and unparseable input.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("nan") || s.eq_ignore_ascii_case("nat") {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

pub fn to_epoch_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - EPOCH_DAYS_FROM_CE
}

pub fn from_epoch_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(EPOCH_DAYS_FROM_CE)?)
}

/// Whole days from `from` to `to` (negative when `to` is earlier).
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// Whole years as `floor(days / 365)`.
pub fn years_between(from: NaiveDate, to: NaiveDate) -> i64 {
    days_between(from, to).div_euclid(365)
}

/// Build a Date column from optional dates.
pub fn date_column(name: &str, values: &[Option<NaiveDate>]) -> Result<Column> {
    let days: Vec<Option<i32>> = values.iter().map(|d| d.map(to_epoch_days)).collect();
    Ok(Column::new(name.into(), days).cast(&DataType::Date)?)
}

/// Convert a column to Date dtype if it is not one already.
///
/// String values are parsed with [`parse_date`]; values that fail to parse
/// become null. Returns the frame and the number of non-empty values that
/// could not be parsed. A missing column is left alone.
pub fn coerce_date_column(mut df: DataFrame, column: &str) -> Result<(DataFrame, usize)> {
    let Ok(existing) = df.column(column) else {
        return Ok((df, 0));
    };

    match existing.dtype() {
        DataType::Date => Ok((df, 0)),
        DataType::Datetime(_, _) => {
            let cast = existing.cast(&DataType::Date)?;
            df.with_column(cast)?;
            Ok((df, 0))
        }
        DataType::String => {
            let mut unparseable = 0usize;
            let parsed: Vec<Option<NaiveDate>> = existing
                .str()?
                .into_iter()
                .map(|v| {
                    let v = v?;
                    let d = parse_date(v);
                    if d.is_none() && !is_missing_marker(v) {
                        unparseable += 1;
                    }
                    d
                })
                .collect();
            df.with_column(date_column(column, &parsed)?)?;
            Ok((df, unparseable))
        }
        _ => {
            let as_str = existing.cast(&DataType::String)?;
            df.with_column(as_str)?;
            coerce_date_column(df, column)
        }
    }
}

/// Read a Date column back into chrono dates.
pub fn date_values(df: &DataFrame, column: &str) -> Result<Vec<Option<NaiveDate>>> {
    let c = df
        .column(column)
        .map_err(|_| PipelineError::ColumnNotFound(column.to_string()))?;
    if c.dtype() != &DataType::Date {
        return Err(PipelineError::InvalidData(format!(
            "column '{column}' is {} but Date was expected",
            c.dtype()
        )));
    }
    let days = c.cast(&DataType::Int32)?;
    Ok(days
        .i32()?
        .into_iter()
        .map(|d| d.and_then(from_epoch_days))
        .collect())
}

fn is_missing_marker(v: &str) -> bool {
    let t = v.trim();
    t.is_empty() || t.eq_ignore_ascii_case("nan") || t.eq_ignore_ascii_case("nat")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn parses_common_shapes() {
        assert_eq!(parse_date("2020-01-01"), Some(d(2020, 1, 1)));
        assert_eq!(parse_date(" 2020/03/04 "), Some(d(2020, 3, 4)));
        assert_eq!(parse_date("03/04/2020"), Some(d(2020, 3, 4)));
        assert_eq!(parse_date("2020-01-01 13:45:00"), Some(d(2020, 1, 1)));
        assert_eq!(parse_date("2020-01-01T13:45:00"), Some(d(2020, 1, 1)));
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date("NaT"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn epoch_days_round_trip_known_values() {
        assert_eq!(to_epoch_days(d(1970, 1, 1)), 0);
        assert_eq!(to_epoch_days(d(1970, 1, 2)), 1);
        assert_eq!(from_epoch_days(-1), Some(d(1969, 12, 31)));
    }

    #[test]
    fn years_use_floor_of_365_day_blocks() {
        assert_eq!(years_between(d(2000, 1, 1), d(2018, 1, 1)), 18);
        // five leap days: 18 * 365 days pass before the 18th birthday
        assert_eq!(years_between(d(2000, 1, 1), d(2017, 12, 27)), 18);
        assert_eq!(years_between(d(2000, 1, 1), d(2017, 12, 26)), 17);
        assert_eq!(years_between(d(2020, 1, 2), d(2020, 1, 1)), -1);
    }

    #[test]
    fn coerce_turns_garbage_into_nulls() {
        let df = df!("sale_date" => &[Some("2022-01-01"), Some("garbage"), None, Some("nan")]).unwrap();
        let (df, bad) = coerce_date_column(df, "sale_date").unwrap();
        assert_eq!(bad, 1);
        assert_eq!(df.column("sale_date").unwrap().dtype(), &DataType::Date);
        let values = date_values(&df, "sale_date").unwrap();
        assert_eq!(values, vec![Some(d(2022, 1, 1)), None, None, None]);
    }

    #[test]
    fn coerce_is_noop_on_date_and_missing_columns() {
        let col = date_column("hire_date", &[Some(d(2021, 1, 1))]).unwrap();
        let df = DataFrame::new(vec![col]).unwrap();
        let (df, bad) = coerce_date_column(df, "hire_date").unwrap();
        assert_eq!(bad, 0);
        let (df, _) = coerce_date_column(df, "absent").unwrap();
        assert_eq!(df.width(), 1);
    }
}

//! Inclusive calendar date range
//!
//! Every aggregate query takes a `DateRange`; construction validates
//! the ordering so a reversed range is rejected before any query runs.

use chrono::NaiveDate;
use salespulse_common::errors::{AppError, Result};

/// Date format accepted by the query surface
const DATE_FORMAT: &str = "%Y-%m-%d";

/// An inclusive range of calendar dates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Create a range, rejecting `start > end`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(AppError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Parse a range from `YYYY-MM-DD` strings
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let start = parse_date(start, "startDate")?;
        let end = parse_date(end, "endDate")?;
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whether a date falls inside the range (both endpoints included)
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

fn parse_date(value: &str, field: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| AppError::Validation {
        message: format!("{field} must be a YYYY-MM-DD date, got {value:?}"),
        field: Some(field.to_string()),
    })
}

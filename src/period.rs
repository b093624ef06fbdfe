use crate::error::{KbmAccrualError, Result};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Month vocabulary accepted for the target period, in calendar order.
pub const MONTH_NAMES: [&str; 12] = [
    "januari",
    "februari",
    "maret",
    "april",
    "mei",
    "juni",
    "juli",
    "agustus",
    "september",
    "oktober",
    "november",
    "desember",
];

pub fn parse_month_name(name: &str) -> Result<u32> {
    let lowered = name.trim().to_lowercase();
    MONTH_NAMES
        .iter()
        .position(|m| *m == lowered)
        .map(|idx| idx as u32 + 1)
        .ok_or_else(|| KbmAccrualError::InvalidMonth(name.to_string()))
}

pub fn parse_year(year: &str) -> Result<i32> {
    if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
        return Err(KbmAccrualError::InvalidYear(year.to_string()));
    }
    year.parse::<i32>()
        .map_err(|_| KbmAccrualError::InvalidYear(year.to_string()))
}

pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = next_month(year, month);

    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.checked_sub_days(Days::new(1))
}

pub fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

/// The accounting period being closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportingPeriod {
    pub month: u32,
    pub year: i32,
    /// Upper-case month name, as printed in journal descriptions.
    pub month_label: String,
    pub closing_date: NaiveDate,
}

impl ReportingPeriod {
    pub fn new(month_name: &str, year: &str) -> Result<Self> {
        let month = parse_month_name(month_name)?;
        let year_num = parse_year(year)?;
        let closing_date = last_day_of_month(year_num, month)
            .ok_or_else(|| KbmAccrualError::InvalidYear(year.to_string()))?;

        Ok(Self {
            month,
            year: year_num,
            month_label: MONTH_NAMES[(month - 1) as usize].to_uppercase(),
            closing_date,
        })
    }

    /// Closing date as `DD/MM/YYYY`.
    pub fn closing_date_label(&self) -> String {
        self.closing_date.format("%d/%m/%Y").to_string()
    }

    /// Two-digit year and two-digit month of the period after this one, e.g. `2601`.
    pub fn next_period_code(&self) -> String {
        let (year, month) = next_month(self.year, self.month);
        format!("{:02}{:02}", year.rem_euclid(100), month)
    }

    /// Substring that marks a document number as dated into the next period.
    pub fn next_period_pattern(&self) -> String {
        format!("/{}/", self.next_period_code())
    }

    /// `<MONTH> <YEAR>` suffix shared by the journal names.
    pub fn label(&self) -> String {
        format!("{} {}", self.month_label, self.year)
    }
}

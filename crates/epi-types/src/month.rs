use crate::TypeError;
use std::fmt;
use std::str::FromStr;

/// A calendar month in `YYYY-MM` form.
///
/// Ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthId {
    year: u16,
    month: u8,
}

impl MonthId {
    /// Creates a month, rejecting months outside 1..=12 and years outside 1000..=9999.
    pub fn new(year: u16, month: u8) -> Result<Self, TypeError> {
        if !(1..=12).contains(&month) || !(1000..=9999).contains(&year) {
            return Err(TypeError::InvalidMonthId(format!("{year:04}-{month:02}")));
        }
        Ok(Self { year, month })
    }

    pub fn year(self) -> u16 {
        self.year
    }

    pub fn month(self) -> u8 {
        self.month
    }
}

impl fmt::Display for MonthId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TypeError::InvalidMonthId(s.to_string());

        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        if !year.bytes().chain(month.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let year: u16 = year.parse().map_err(|_| invalid())?;
        let month: u8 = month.parse().map_err(|_| invalid())?;
        MonthId::new(year, month).map_err(|_| invalid())
    }
}

crate::string_serde!(MonthId, "a month in YYYY-MM form");

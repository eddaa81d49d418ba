//! Human-readable ticket numbers of the form `PREFIX-YYYYMMDD-NNNN`

use crate::error::{DeskError, Result};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix used when none is configured
pub const DEFAULT_PREFIX: &str = "ET";

/// Largest sequence value that fits the four-digit field
pub const MAX_DAILY_SEQUENCE: u32 = 9999;

static DISPLAY_NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Z][A-Z0-9]*)-(\d{8})-(\d{4})$").expect("display number pattern is valid")
});

/// A ticket's display number
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayNumber {
    prefix: String,
    date: NaiveDate,
    sequence: u32,
}

impl DisplayNumber {
    /// Build a display number, validating the prefix and sequence range
    pub fn new(prefix: impl Into<String>, date: NaiveDate, sequence: u32) -> Result<Self> {
        let prefix = prefix.into();
        if !is_valid_prefix(&prefix) {
            return Err(DeskError::validation(format!(
                "ticket prefix '{prefix}' must be uppercase letters and digits"
            )));
        }
        if sequence == 0 || sequence > MAX_DAILY_SEQUENCE {
            return Err(DeskError::validation(format!(
                "sequence {sequence} outside 1..={MAX_DAILY_SEQUENCE}"
            )));
        }
        Ok(Self {
            prefix,
            date,
            sequence,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    pub const fn sequence(&self) -> u32 {
        self.sequence
    }
}

/// Key used for the per-day counter, `YYYYMMDD`
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

pub fn is_valid_prefix(prefix: &str) -> bool {
    let mut chars = prefix.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

impl fmt::Display for DisplayNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{:04}",
            self.prefix,
            day_key(self.date),
            self.sequence
        )
    }
}

impl FromStr for DisplayNumber {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self> {
        let caps = DISPLAY_NUMBER_RE
            .captures(s.trim())
            .ok_or_else(|| DeskError::validation(format!("'{s}' is not a ticket number")))?;
        let date = NaiveDate::parse_from_str(&caps[2], "%Y%m%d")
            .map_err(|e| DeskError::validation(format!("bad date in '{s}': {e}")))?;
        let sequence = caps[3]
            .parse()
            .map_err(|e| DeskError::validation(format!("bad sequence in '{s}': {e}")))?;
        Self::new(&caps[1], date, sequence)
    }
}

impl TryFrom<String> for DisplayNumber {
    type Error = DeskError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<DisplayNumber> for String {
    fn from(value: DisplayNumber) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 7).unwrap()
    }

    #[test]
    fn test_format_is_zero_padded() {
        let number = DisplayNumber::new("ET", date(), 42).unwrap();
        assert_eq!(number.to_string(), "ET-20240307-0042");
    }

    #[test]
    fn test_parse_display_number() {
        let number: DisplayNumber = "ET-20240307-0001".parse().unwrap();
        assert_eq!(number.prefix(), "ET");
        assert_eq!(number.date(), date());
        assert_eq!(number.sequence(), 1);
    }

    #[test]
    fn test_rejects_malformed_numbers() {
        assert!("ET-2024037-0001".parse::<DisplayNumber>().is_err());
        assert!("et-20240307-0001".parse::<DisplayNumber>().is_err());
        assert!("ET-20241340-0001".parse::<DisplayNumber>().is_err());
        assert!("ET-20240307-0000".parse::<DisplayNumber>().is_err());
    }

    #[test]
    fn test_sequence_bounds() {
        assert!(DisplayNumber::new("ET", date(), MAX_DAILY_SEQUENCE).is_ok());
        assert!(DisplayNumber::new("ET", date(), MAX_DAILY_SEQUENCE + 1).is_err());
    }

    #[test]
    fn test_serializes_as_string() {
        let number = DisplayNumber::new("ET", date(), 7).unwrap();
        let json = serde_json::to_string(&number).unwrap();
        assert_eq!(json, "\"ET-20240307-0007\"");
        let back: DisplayNumber = serde_json::from_str(&json).unwrap();
        assert_eq!(back, number);
    }
}

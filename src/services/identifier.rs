//! Daily ticket number allocation
//!
//! Sequence values come from an atomic increment-and-read on a per-day
//! counter, so concurrent creators can never be handed the same number.
//! Counting existing tickets and adding one would race.

use crate::core::{DisplayNumber, MAX_DAILY_SEQUENCE, day_key};
use crate::error::{DeskError, Result};
use crate::storage::SequenceRepository;
use chrono::{NaiveDate, Utc};

/// Hands out `PREFIX-YYYYMMDD-NNNN` numbers
#[derive(Debug, Clone)]
pub struct IdentifierGenerator<S> {
    sequences: S,
    prefix: String,
}

impl<S: SequenceRepository> IdentifierGenerator<S> {
    pub fn new(sequences: S, prefix: impl Into<String>) -> Self {
        Self {
            sequences,
            prefix: prefix.into(),
        }
    }

    /// Allocate the next number for `date`
    ///
    /// Fails with [`DeskError::IdentifierExhausted`] once all four-digit
    /// values for that day are used; the counter is left unchanged.
    pub fn next_display_number(&self, date: NaiveDate) -> Result<DisplayNumber> {
        let day = day_key(date);
        let sequence = self
            .sequences
            .increment(&day, MAX_DAILY_SEQUENCE)?
            .ok_or(DeskError::IdentifierExhausted { date: day })?;
        DisplayNumber::new(self.prefix.clone(), date, sequence)
    }

    /// Allocate the next number for the current UTC day
    pub fn next_for_today(&self) -> Result<DisplayNumber> {
        self.next_display_number(Utc::now().date_naive())
    }
}

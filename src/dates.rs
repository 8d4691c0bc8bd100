// Inclusive calendar date ranges
//
// The reporting window is a closed interval of calendar days. Every stage
// downstream of validation can assume start <= end.

use chrono::NaiveDate;

use crate::error::PipelineError;

/// An inclusive range of calendar days.
///
/// Construction validates the ordering, so a `DateRange` that exists is
/// never empty and never inverted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Builds the range, rejecting `start > end`. `start == end` is a
    /// one-day window.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, PipelineError> {
        if start > end {
            return Err(PipelineError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days in the range, both endpoints counted.
    pub fn days(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Iterates the days in ascending order. The range itself is `Copy`,
    /// so iteration can be restarted any number of times.
    pub fn iter(&self) -> DateRangeIter {
        DateRangeIter {
            next: Some(self.start),
            end: self.end,
        }
    }
}

impl<'a> IntoIterator for &'a DateRange {
    type Item = NaiveDate;
    type IntoIter = DateRangeIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Ascending iterator over the days of a [`DateRange`].
#[derive(Debug, Clone)]
pub struct DateRangeIter {
    next: Option<NaiveDate>,
    end: NaiveDate,
}

impl Iterator for DateRangeIter {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let current = self.next?;
        // succ_opt is None only at the calendar maximum, far past any
        // reporting window; treat it as the end of iteration.
        self.next = match current.succ_opt() {
            Some(next) if next <= self.end => Some(next),
            _ => None,
        };
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match self.next {
            Some(next) => (self.end - next).num_days() as usize + 1,
            None => 0,
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for DateRangeIter {}

// ============================================================================
// TESTS
// ============================================================================

use allot_core::{AllocationQuery, AllocationRecord};
use chrono::NaiveDate;

/// Date format used by both the dataset and the query, e.g. `01 Jan 2024`.
pub const DATE_FORMAT: &str = "%d %b %Y";

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

/// Inclusive filter window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Both bounds must be present and parse; otherwise no date filtering
    /// applies at all.
    pub fn from_query(query: &AllocationQuery) -> Option<Self> {
        let start = parse_date(query.alloc_start_date.as_deref()?)?;
        let end = parse_date(query.alloc_end_date.as_deref()?)?;
        Some(Self { start, end })
    }

    /// Interval intersection with inclusive bounds.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        !(end < self.start || start > self.end)
    }

    /// Records whose own dates are missing or unparsable always pass.
    pub fn admits(&self, record: &AllocationRecord) -> bool {
        let start = record.start_date().and_then(parse_date);
        let end = record.end_date().and_then(parse_date);
        match (start, end) {
            (Some(start), Some(end)) => self.overlaps(start, end),
            _ => true,
        }
    }
}

/// Keep the records of `query.project_code`, narrowed to the query's date
/// window when it has a valid one. Order is preserved.
pub fn filter_allocations(
    records: Vec<AllocationRecord>,
    query: &AllocationQuery,
) -> Vec<AllocationRecord> {
    let range = DateRange::from_query(query);
    records
        .into_iter()
        .filter(|record| record.project_code() == Some(&query.project_code))
        .filter(|record| range.is_none_or(|r| r.admits(record)))
        .collect()
}

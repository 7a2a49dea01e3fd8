//! Day-sized partition value type
//!
//! A partition holds every record of one calendar day. It is identified by
//! its *upper* (exclusive) boundary date: the partition for day D spans
//! [D 00:00, D+1 00:00) and is named after D+1, formatted as an 8-digit
//! calendar date. Ordering and equality are boundary-date ordering and
//! equality, which makes retention arithmetic a pure comparison.

use chrono::{Days, NaiveDate};

/// Prefix of every partition name.
pub const PARTITION_PREFIX: &str = "p";

const BOUNDARY_FORMAT: &str = "%Y%m%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Partition {
    /// Exclusive upper bound: the first day NOT covered by this partition.
    boundary: NaiveDate,
}

impl Partition {
    /// The partition covering the whole of `day`.
    pub fn for_day(day: NaiveDate) -> Self {
        Self { boundary: day + Days::new(1) }
    }

    /// Deterministic name, e.g. `p20260805` for the partition covering
    /// 2026-08-04.
    pub fn name(&self) -> String {
        format!("{}{}", PARTITION_PREFIX, self.boundary.format(BOUNDARY_FORMAT))
    }

    /// Parse a partition back from its name. Returns `None` for anything
    /// that does not follow the naming convention.
    pub fn parse_name(name: &str) -> Option<Self> {
        let digits = name.strip_prefix(PARTITION_PREFIX)?;
        let boundary = NaiveDate::parse_from_str(digits, BOUNDARY_FORMAT).ok()?;
        Some(Self { boundary })
    }

    /// Exclusive upper boundary date.
    pub fn boundary(&self) -> NaiveDate {
        self.boundary
    }

    /// The single day this partition covers.
    pub fn day(&self) -> NaiveDate {
        self.boundary - Days::new(1)
    }
}

// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The SRS level table and the review scheduler.

use chrono::TimeDelta;

use crate::error::Fallible;
use crate::error::fail;
use crate::types::timestamp::Timestamp;

/// The default review intervals, in hours: four hours, eight hours, one day,
/// three days, one week, two weeks, four weeks, sixteen weeks.
pub const DEFAULT_INTERVAL_HOURS: [u32; 8] = [4, 8, 24, 72, 168, 336, 672, 2688];

/// The longest allowed interval, one hundred years. Keeps `now + interval`
/// well inside the range of a timestamp.
const MAX_INTERVAL_DAYS: i64 = 36525;

/// The review interval for each SRS level. Level `n` is reviewed
/// `intervals[n]` after the review that promoted the card to it.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelTable {
    intervals: Vec<TimeDelta>,
}

impl LevelTable {
    /// Build a table. Intervals must be non-empty, non-negative, at most a
    /// hundred years, and non-decreasing.
    pub fn new(intervals: Vec<TimeDelta>) -> Fallible<Self> {
        if intervals.is_empty() {
            return fail("the SRS level table must have at least one level.");
        }
        if intervals.iter().any(|i| *i < TimeDelta::zero()) {
            return fail("SRS intervals must not be negative.");
        }
        if intervals.iter().any(|i| *i > TimeDelta::days(MAX_INTERVAL_DAYS)) {
            return fail("SRS intervals must not exceed a hundred years.");
        }
        if intervals.windows(2).any(|w| w[1] < w[0]) {
            return fail("SRS intervals must be non-decreasing.");
        }
        Ok(Self { intervals })
    }

    pub fn from_hours(hours: &[u32]) -> Fallible<Self> {
        Self::new(hours.iter().map(|h| TimeDelta::hours(*h as i64)).collect())
    }

    /// The number of levels.
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn max_level(&self) -> usize {
        self.intervals.len() - 1
    }

    /// Clamp a possibly out-of-range level into the table.
    pub fn clamp(&self, level: i64) -> usize {
        level.clamp(0, self.max_level() as i64) as usize
    }

    /// The interval for a level.
    ///
    /// # Panics
    ///
    /// If `level` is out of range. Callers clamp first.
    pub fn interval_for(&self, level: usize) -> TimeDelta {
        assert!(
            level < self.intervals.len(),
            "SRS level {level} out of range: the table has {} levels",
            self.intervals.len()
        );
        self.intervals[level]
    }

    /// When a card at `level` is next due, if it was reviewed at `now`.
    pub fn next_review_at(&self, level: usize, now: Timestamp) -> Timestamp {
        now + self.interval_for(level)
    }
}

impl Default for LevelTable {
    fn default() -> Self {
        Self {
            intervals: DEFAULT_INTERVAL_HOURS
                .iter()
                .map(|h| TimeDelta::hours(*h as i64))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono::Utc;

    use super::*;

    fn now() -> Timestamp {
        Timestamp::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn test_default_table() {
        let table = LevelTable::default();
        assert_eq!(table.len(), 8);
        assert_eq!(table.interval_for(0), TimeDelta::hours(4));
        assert_eq!(table.interval_for(7), TimeDelta::weeks(16));
    }

    #[test]
    fn test_next_review_is_not_in_the_past() {
        let table = LevelTable::default();
        for level in 0..table.len() {
            assert!(table.next_review_at(level, now()) >= now());
        }
    }

    #[test]
    fn test_next_review_increases_with_level() {
        let table = LevelTable::default();
        for level in 1..table.len() {
            assert!(table.next_review_at(level, now()) > table.next_review_at(level - 1, now()));
        }
    }

    #[test]
    fn test_zero_interval_is_allowed() -> Fallible<()> {
        let table = LevelTable::from_hours(&[0, 1])?;
        assert_eq!(table.next_review_at(0, now()), now());
        Ok(())
    }

    #[test]
    fn test_clamp() {
        let table = LevelTable::default();
        assert_eq!(table.clamp(-1), 0);
        assert_eq!(table.clamp(3), 3);
        assert_eq!(table.clamp(8), 7);
        assert_eq!(table.clamp(100), 7);
    }

    #[test]
    fn test_empty_table_is_rejected() {
        assert!(LevelTable::new(Vec::new()).is_err());
    }

    #[test]
    fn test_decreasing_table_is_rejected() {
        assert!(LevelTable::from_hours(&[24, 4]).is_err());
    }

    #[test]
    fn test_negative_interval_is_rejected() {
        assert!(LevelTable::new(vec![TimeDelta::hours(-1)]).is_err());
    }

    #[test]
    fn test_huge_interval_is_rejected() {
        assert!(LevelTable::from_hours(&[4, u32::MAX]).is_err());
        assert!(LevelTable::new(vec![TimeDelta::days(MAX_INTERVAL_DAYS)]).is_ok());
        assert!(LevelTable::new(vec![TimeDelta::days(MAX_INTERVAL_DAYS + 1)]).is_err());
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_out_of_range_level_panics() {
        LevelTable::default().interval_for(8);
    }
}

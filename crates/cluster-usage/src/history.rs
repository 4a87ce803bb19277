//! Daily counter series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Number of calls recorded on one UTC calendar day.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountPerDay {
    /// UTC calendar day.
    #[serde(alias = "Date", with = "day")]
    pub date: NaiveDate,
    /// Calls on that day.
    #[serde(alias = "Count")]
    pub count: u64,
}

/// Append-only series of daily counts, strictly increasing by day.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct History {
    /// Entries in day order, at most one per day.
    #[serde(alias = "Data")]
    pub data: Vec<CountPerDay>,
}

/// Serde helper for days. Writes `YYYY-MM-DD`; also reads a midnight
/// timestamp such as `2024-03-01T00:00:00Z`.
mod day {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(d: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        d.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(d)?;
        let date = raw.split_once('T').map_or(raw.as_str(), |(date, _)| date);
        date.parse().map_err(serde::de::Error::custom)
    }
}

impl History {
    /// Record one call on `day`.
    ///
    /// Appends `(day, 1)` when the series is empty or its last day is earlier
    /// than `day`; otherwise bumps the last entry. A `day` earlier than the
    /// last entry (clock moved backwards) counts towards the last entry so
    /// the series stays ordered.
    pub fn increment_on(&mut self, day: NaiveDate) {
        match self.data.last_mut() {
            Some(last) if last.date >= day => last.count = last.count.saturating_add(1),
            _ => self.data.push(CountPerDay {
                date: day,
                count: 1,
            }),
        }
    }

    /// Sum of all daily counts.
    pub fn total(&self) -> u64 {
        self.data.iter().map(|c| c.count).sum()
    }

    /// Count recorded for `day`, 0 if none.
    pub fn count_on(&self, day: NaiveDate) -> u64 {
        self.data
            .iter()
            .find(|c| c.date == day)
            .map_or(0, |c| c.count)
    }

    /// Whether nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

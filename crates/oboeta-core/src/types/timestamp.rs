// Copyright 2026 The oboeta Authors
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

use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Write;

use chrono::Duration;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use chrono::format::Item;
use chrono::format::StrftimeItems;
use serde::Deserialize;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::Fallible;

/// The pattern used when a timestamp is shown without a user-supplied
/// format (debug output, JSON dumps).
const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A timestamp without a timezone and second precision.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    /// The current timestamp in the user's local time.
    #[cfg(feature = "clock")]
    pub fn now() -> Self {
        use chrono::SubsecRound;
        Self(chrono::Local::now().naive_local().trunc_subsecs(0))
    }

    /// Midnight of 0001-01-01, used as the due date of SM-2 lines that
    /// have never been reviewed. No parsed log timestamp precedes it in
    /// practice, and it is always due.
    pub fn never_reviewed() -> Self {
        let date = NaiveDate::from_ymd_opt(1, 1, 1).unwrap_or(NaiveDate::MIN);
        Self(date.and_time(NaiveTime::MIN))
    }

    /// This timestamp shifted forward by a whole number of days. Saturates
    /// at the largest representable date.
    pub fn plus_days(self, days: i64) -> Self {
        let shifted = Duration::try_days(days).and_then(|d| self.0.checked_add_signed(d));
        Self(shifted.unwrap_or(NaiveDateTime::MAX))
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(ISO_FORMAT))
    }
}

impl TryFrom<String> for Timestamp {
    type Error = ErrorReport;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let ndt = NaiveDateTime::parse_from_str(&value, ISO_FORMAT)
            .map_err(|_| ErrorReport::new(format!("Failed to parse timestamp: '{value}'.")))?;
        Ok(Timestamp(ndt))
    }
}

impl From<Timestamp> for String {
    fn from(ts: Timestamp) -> String {
        ts.to_string()
    }
}

/// A validated strftime-style pattern for reading and writing log
/// timestamps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DateFormat(String);

impl DateFormat {
    pub fn new(pattern: impl Into<String>) -> Fallible<Self> {
        let pattern = pattern.into();
        if pattern.is_empty() {
            return Err(ErrorReport::config("the date format is empty"));
        }
        if StrftimeItems::new(&pattern).any(|item| matches!(item, Item::Error)) {
            return Err(ErrorReport::config(format!("invalid date format: {pattern}")));
        }
        Ok(Self(pattern))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse a timestamp. A pattern without time-of-day fields yields
    /// midnight of the parsed date.
    pub fn parse(&self, s: &str) -> Fallible<Timestamp> {
        match NaiveDateTime::parse_from_str(s, &self.0) {
            Ok(ndt) => Ok(Timestamp(ndt)),
            Err(dt_err) => match NaiveDate::parse_from_str(s, &self.0) {
                Ok(date) => Ok(Timestamp(date.and_time(NaiveTime::MIN))),
                Err(_) => Err(ErrorReport::data(format!(
                    "invalid date format: {dt_err}"
                ))),
            },
        }
    }

    pub fn format(&self, ts: Timestamp) -> Fallible<String> {
        let mut out = String::new();
        write!(out, "{}", ts.0.format_with_items(StrftimeItems::new(&self.0)))
            .map_err(|_| ErrorReport::new(format!("cannot format {ts} with {}", self.0)))?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        Timestamp::try_from(s.to_string()).unwrap()
    }

    #[test]
    fn test_timestamp_to_string() {
        assert_eq!(ts("2023-10-05T14:30:15").to_string(), "2023-10-05T14:30:15");
    }

    #[test]
    fn test_serialize() {
        let serialized = serde_json::to_string(&ts("2023-10-05T14:30:15")).unwrap();
        assert_eq!(serialized, "\"2023-10-05T14:30:15\"");
    }

    #[test]
    fn test_plus_days() {
        assert_eq!(ts("2024-01-30T08:00:00").plus_days(3), ts("2024-02-02T08:00:00"));
        assert_eq!(ts("2024-01-30T08:00:00").plus_days(0), ts("2024-01-30T08:00:00"));
    }

    #[test]
    fn test_never_reviewed_precedes_real_dates() {
        assert!(Timestamp::never_reviewed() < ts("1970-01-01T00:00:00"));
    }

    #[test]
    fn test_parse_full_pattern() -> Fallible<()> {
        let fmt = DateFormat::new("%Y年%m月%d日%H時%M分%S秒")?;
        assert_eq!(fmt.parse("2012年03月04日05時06分07秒")?, ts("2012-03-04T05:06:07"));
        Ok(())
    }

    #[test]
    fn test_parse_date_only_pattern() -> Fallible<()> {
        let fmt = DateFormat::new("%Y年%m月%d日")?;
        assert_eq!(fmt.parse("2012年03月04日")?, ts("2012-03-04T00:00:00"));
        Ok(())
    }

    #[test]
    fn test_parse_garbage_is_data_error() -> Fallible<()> {
        let fmt = DateFormat::new("%Y-%m-%d")?;
        let err = fmt.parse("yesterday").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Data);
        Ok(())
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let err = DateFormat::new("%Y-%m-%").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
        assert!(DateFormat::new("").is_err());
    }

    #[test]
    fn test_format() -> Fallible<()> {
        let fmt = DateFormat::new("%Y年%m月%d日")?;
        assert_eq!(fmt.format(ts("2012-03-04T05:06:07"))?, "2012年03月04日");
        Ok(())
    }
}

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;
use thiserror::Error;

/// A raw value as read from (or written to) a sheet cell.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum CellValue {
    Empty,
    Bool(bool),
    Number(f64),
    DateTime {
        #[serde(rename = "dateTime")]
        at: DateTime<Utc>,
    },
    Text(String),
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Empty
    }
}

impl CellValue {
    pub fn text<S: Into<String>>(text: S) -> Self {
        CellValue::Text(text.into())
    }

    /// A cell holding nothing at all, or only an empty string.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(text) => text.is_empty(),
            _ => false,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, CellValue::Number(_))
    }

    /// Renders the value the way it reads in the sheet.
    ///
    /// # Examples
    /// ```
    /// use meetinglist_libs::cell::CellValue;
    ///
    /// assert_eq!(CellValue::Number(12.0).to_text(), "12");
    /// assert_eq!(CellValue::Number(2.5).to_text(), "2.5");
    /// assert_eq!(CellValue::Empty.to_text(), "");
    /// assert_eq!(CellValue::text("Room 4").to_text(), "Room 4");
    /// ```
    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Number(n) => write!(f, "{}", format_number(*n)),
            CellValue::DateTime { at } => write!(f, "{}", iso_timestamp(at)),
            CellValue::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for CellValue {
    fn from(text: &str) -> Self {
        CellValue::Text(text.to_string())
    }
}

impl From<String> for CellValue {
    fn from(text: String) -> Self {
        CellValue::Text(text)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<DateTime<Utc>> for CellValue {
    fn from(at: DateTime<Utc>) -> Self {
        CellValue::DateTime { at }
    }
}

#[cfg(feature = "arbitrary")]
impl<'a> arbitrary::Arbitrary<'a> for CellValue {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        use chrono::TimeZone;

        Ok(match u.int_in_range(0..=4u8)? {
            0 => CellValue::Empty,
            1 => CellValue::Bool(u.arbitrary()?),
            2 => CellValue::Number(u.arbitrary()?),
            3 => match Utc.timestamp_opt(u.int_in_range(0..=4_102_444_800i64)?, 0) {
                chrono::LocalResult::Single(at) => CellValue::DateTime { at },
                _ => CellValue::Empty,
            },
            _ => CellValue::Text(u.arbitrary()?),
        })
    }
}

/// Integral numbers print without a fractional part, like the sheet shows them.
fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// UTC timestamp with millisecond precision, e.g. `2024-03-01T09:30:00.000Z`.
pub fn iso_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn now_timestamp() -> String {
    iso_timestamp(&Utc::now())
}

#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    #[error("Cell is empty")]
    Empty,
    #[error("Expected a number, found {0:?}")]
    NotNumeric(String),
    #[error("Expected a positive number, found {0}")]
    NotPositive(f64),
    #[error("Expected a whole number, found {0}")]
    Fractional(f64),
}

/// Positive integral meeting identifier.
#[derive(Serialize, Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct MeetingId(pub u64);

impl fmt::Display for MeetingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&CellValue> for MeetingId {
    type Error = ParseError;

    /// Only numeric cells count. Text such as `"12"` or `"Total Meetings:"`
    /// marks a summary row, not a meeting.
    ///
    /// # Examples
    /// ```
    /// use meetinglist_libs::cell::{CellValue, MeetingId, ParseError};
    /// use std::convert::TryFrom;
    ///
    /// assert_eq!(MeetingId::try_from(&CellValue::Number(7.0)), Ok(MeetingId(7)));
    /// assert_eq!(
    ///     MeetingId::try_from(&CellValue::Number(0.0)),
    ///     Err(ParseError::NotPositive(0.0))
    /// );
    /// assert!(MeetingId::try_from(&CellValue::text("7")).is_err());
    /// ```
    fn try_from(cell: &CellValue) -> Result<Self, Self::Error> {
        match cell {
            CellValue::Number(n) if !n.is_finite() => Err(ParseError::NotNumeric(n.to_string())),
            CellValue::Number(n) if *n <= 0.0 => Err(ParseError::NotPositive(*n)),
            CellValue::Number(n) if n.fract() != 0.0 || *n > u64::MAX as f64 => {
                Err(ParseError::Fractional(*n))
            }
            CellValue::Number(n) => Ok(MeetingId(*n as u64)),
            CellValue::Empty => Err(ParseError::Empty),
            other => Err(ParseError::NotNumeric(other.to_text())),
        }
    }
}

/// Reads a started-at cell. Unparseable or blank values count as "not started".
pub fn started_at(cell: &CellValue) -> Option<DateTime<Utc>> {
    match cell {
        CellValue::DateTime { at } => Some(*at),
        CellValue::Text(text) if !text.trim().is_empty() => DateTime::parse_from_rfc3339(text.trim())
            .map(|at| at.with_timezone(&Utc))
            .ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn cells_render_as_text() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();

        assert_eq!(CellValue::Bool(true).to_text(), "true");
        assert_eq!(CellValue::Number(-3.0).to_text(), "-3");
        assert_eq!(CellValue::from(at).to_text(), "2024-03-01T09:30:00.000Z");
        assert!(CellValue::text("").is_blank());
        assert!(!CellValue::Number(0.0).is_blank());
    }

    #[test]
    fn meeting_ids_must_be_positive_whole_numbers() {
        assert_eq!(MeetingId::try_from(&CellValue::Empty), Err(ParseError::Empty));
        assert_eq!(
            MeetingId::try_from(&CellValue::Number(-1.0)),
            Err(ParseError::NotPositive(-1.0))
        );
        assert_eq!(
            MeetingId::try_from(&CellValue::Number(1.5)),
            Err(ParseError::Fractional(1.5))
        );
        assert_eq!(
            MeetingId::try_from(&CellValue::text("Total Meetings:")),
            Err(ParseError::NotNumeric("Total Meetings:".to_string()))
        );
        assert!(MeetingId::try_from(&CellValue::Number(f64::NAN)).is_err());
    }

    #[test]
    fn started_at_accepts_datetimes_and_rfc3339_text() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();

        assert_eq!(started_at(&CellValue::from(at)), Some(at));
        assert_eq!(
            started_at(&CellValue::text("2024-03-01T10:30:00+01:00")),
            Some(at)
        );
        assert_eq!(started_at(&CellValue::text("yesterday")), None);
        assert_eq!(started_at(&CellValue::text("")), None);
        assert_eq!(started_at(&CellValue::Number(5.0)), None);
    }

    #[test]
    fn cells_round_trip_through_json() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        let row = vec![
            CellValue::Empty,
            CellValue::Number(4.0),
            CellValue::text("Acme"),
            CellValue::from(at),
            CellValue::Bool(false),
        ];

        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(
            json,
            r#"[null,4.0,"Acme",{"dateTime":"2024-03-01T09:30:00Z"},false]"#
        );
        let back: Vec<CellValue> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, row);
    }
}

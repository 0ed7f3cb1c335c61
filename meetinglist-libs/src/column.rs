use crate::cell::CellValue;
use serde::{Serialize, Serializer};

/// Investor (fund) names always live in column D; the header text there is
/// not trusted.
pub const FUND_COLUMN: usize = 3;

const REP_HEADERS: [&str; 3] = ["rep", "investor rep", "representative"];

/// Trims and lowercases each header cell.
pub fn normalize_headers(header_row: &[CellValue]) -> Vec<String> {
    header_row
        .iter()
        .map(|cell| cell.to_text().trim().to_lowercase())
        .collect()
}

/// Finds the first header containing any of `keywords`.
///
/// Keywords are tried in priority order; for each keyword the headers are
/// scanned left to right. Headers are expected to be normalized already (see
/// [`normalize_headers`]), keywords are lowercase.
///
/// # Examples
/// ```
/// use meetinglist_libs::column::find_col;
///
/// let headers = vec!["#", "time slot", "company id"];
///
/// // "id" outranks "#" even though "#" comes first in the row
/// assert_eq!(find_col(&headers, &["id", "#"]), Some(2));
/// assert_eq!(find_col(&headers, &["slot"]), Some(1));
/// assert_eq!(find_col(&headers, &["room"]), None);
/// ```
pub fn find_col<H: AsRef<str>>(headers: &[H], keywords: &[&str]) -> Option<usize> {
    keywords.iter().find_map(|keyword| {
        headers
            .iter()
            .map(AsRef::<str>::as_ref)
            .position(|header| header.contains(keyword))
    })
}

/// The representative column is matched on the exact header text, skipping
/// [`FUND_COLUMN`] so an "Investor Rep" header in column D is never picked.
pub fn find_rep<H: AsRef<str>>(headers: &[H]) -> Option<usize> {
    headers
        .iter()
        .map(AsRef::<str>::as_ref)
        .enumerate()
        .filter(|(index, _)| *index != FUND_COLUMN)
        .find(|(_, header)| REP_HEADERS.contains(header))
        .map(|(index, _)| index)
}

/// Column positions for every field of a meeting row.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMap {
    #[serde(serialize_with = "serialize_index")]
    pub id: Option<usize>,
    #[serde(serialize_with = "serialize_index")]
    pub time_slot: Option<usize>,
    #[serde(serialize_with = "serialize_index")]
    pub fund: Option<usize>,
    #[serde(serialize_with = "serialize_index")]
    pub rep: Option<usize>,
    #[serde(serialize_with = "serialize_index")]
    pub company: Option<usize>,
    #[serde(serialize_with = "serialize_index")]
    pub founder: Option<usize>,
    #[serde(serialize_with = "serialize_index")]
    pub room: Option<usize>,
    #[serde(serialize_with = "serialize_index")]
    pub runner: Option<usize>,
    #[serde(serialize_with = "serialize_index")]
    pub status: Option<usize>,
    #[serde(skip)]
    pub started_at: Option<usize>,
    #[serde(skip)]
    pub started_by: Option<usize>,
}

impl ColumnMap {
    pub fn resolve<H: AsRef<str>>(headers: &[H]) -> ColumnMap {
        ColumnMap {
            id: find_col(headers, &["id", "#"]),
            time_slot: find_col(headers, &["time", "slot"]),
            fund: Some(FUND_COLUMN),
            rep: find_rep(headers),
            company: find_col(headers, &["company", "startup"]),
            founder: find_col(headers, &["founder"]),
            room: find_col(headers, &["room"]),
            runner: find_col(headers, &["runner"]),
            status: find_col(headers, &["status"]),
            started_at: find_col(headers, &["started at", "startedat"]),
            started_by: find_col(headers, &["started by", "startedby"]),
        }
    }
}

/// Columns touched when a meeting is started or reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusColumns {
    pub status: Option<usize>,
    pub started_at: Option<usize>,
    pub started_by: Option<usize>,
}

impl StatusColumns {
    /// Every header is checked against every slot, so the last matching
    /// header claims it.
    ///
    /// # Examples
    /// ```
    /// use meetinglist_libs::column::StatusColumns;
    ///
    /// let headers = vec!["status", "started at", "meeting status"];
    /// let columns = StatusColumns::locate(&headers);
    ///
    /// assert_eq!(columns.status, Some(2));
    /// assert_eq!(columns.started_at, Some(1));
    /// assert_eq!(columns.started_by, None);
    /// ```
    pub fn locate<H: AsRef<str>>(headers: &[H]) -> StatusColumns {
        headers
            .iter()
            .enumerate()
            .fold(StatusColumns::default(), |mut columns, (index, header)| {
                let header: &str = header.as_ref();
                if header.contains("status") {
                    columns.status = Some(index);
                }
                if header.contains("started at") || header == "startedat" {
                    columns.started_at = Some(index);
                }
                if header.contains("started by") || header == "startedby" {
                    columns.started_by = Some(index);
                }
                columns
            })
    }

    /// Positions the three status headers occupy once appended after `last_column`.
    pub fn appended_at(last_column: usize) -> StatusColumns {
        StatusColumns {
            status: Some(last_column),
            started_at: Some(last_column + 1),
            started_by: Some(last_column + 2),
        }
    }
}

/// Identifier column as the updater sees it: a header containing `id`, or
/// exactly `#`, whichever comes first in the row.
pub fn find_id_for_update<H: AsRef<str>>(headers: &[H]) -> Option<usize> {
    headers
        .iter()
        .map(AsRef::<str>::as_ref)
        .position(|header| header.contains("id") || header == "#")
}

fn serialize_index<S: Serializer>(index: &Option<usize>, serializer: S) -> Result<S::Ok, S::Error> {
    match index {
        Some(index) => serializer.serialize_i64(*index as i64),
        None => serializer.serialize_i64(-1),
    }
}

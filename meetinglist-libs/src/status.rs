use crate::cell::{self, CellValue, MeetingId};
use crate::column::{find_id_for_update, normalize_headers, StatusColumns};
use crate::meeting::project;
use crate::sheet::SheetStore;
use chrono::Utc;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const STARTED: &str = "Started";
pub const PENDING: &str = "Pending";

/// Fill applied to a started meeting's row.
pub const STARTED_HIGHLIGHT: &str = "#d4edda";

const STATUS_HEADERS: [&str; 3] = ["Status", "Started At", "Started By"];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum UpdateError {
    #[error("Meeting {0} not found")]
    MeetingNotFound(MeetingRef),
}

/// A meeting identifier as a caller sent it: a JSON number or string.
///
/// Matching against the sheet compares text, so `7` and `"7"` find the same row.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum MeetingRef {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for MeetingRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeetingRef::Number(n) => match n.as_f64() {
                Some(value) if n.is_f64() => write!(f, "{}", CellValue::Number(value)),
                _ => write!(f, "{}", n),
            },
            MeetingRef::Text(text) => f.write_str(text),
        }
    }
}

impl From<MeetingId> for MeetingRef {
    fn from(id: MeetingId) -> Self {
        MeetingRef::Number(id.0.into())
    }
}

impl From<&str> for MeetingRef {
    fn from(text: &str) -> Self {
        MeetingRef::Text(text.to_string())
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub success: bool,
    pub meeting_id: MeetingRef,
    pub status: String,
    pub timestamp: String,
}

/// Writes `new_status` onto the meeting identified by `meeting_id`.
///
/// Once the row is found, a missing status column is created (status,
/// started-at and started-by headers appended after the last column); an
/// unknown meeting leaves the sheet untouched. Starting a meeting
/// stamps the time and `started_by` and highlights the row; any other status
/// clears both and removes the highlight.
///
/// Writes go straight to `sheet` one cell at a time and are not rolled back.
pub fn update_status<S: SheetStore + ?Sized>(
    sheet: &mut S,
    meeting_id: &MeetingRef,
    new_status: &str,
    started_by: &str,
) -> Result<StatusUpdate, UpdateError> {
    let rows = sheet.load_rows();
    let headers = rows
        .first()
        .map(|header| normalize_headers(header))
        .unwrap_or_default();

    let id_col = find_id_for_update(&headers);
    let wanted = meeting_id.to_string();

    let found = rows.iter().enumerate().skip(1).find(|(index, row)| {
        let row_id = match id_col {
            Some(col) => row.get(col).map(CellValue::to_text).unwrap_or_default(),
            None => index.to_string(),
        };
        row_id == wanted
    });

    let row = match found {
        Some((row, _)) => row,
        None => {
            warn!("meeting {} not found", wanted);
            return Err(UpdateError::MeetingNotFound(meeting_id.clone()));
        }
    };

    let located = StatusColumns::locate(&headers);
    let (status_col, columns) = match located.status {
        Some(col) => (col, located),
        None => {
            let first = append_status_headers(sheet);
            (first, StatusColumns::appended_at(first))
        }
    };

    sheet.write_cell(row, status_col, CellValue::text(new_status));

    if new_status == STARTED {
        if let Some(col) = columns.started_at {
            sheet.write_cell(row, col, Utc::now().into());
        }
        if let Some(col) = columns.started_by {
            sheet.write_cell(row, col, CellValue::text(started_by));
        }
        sheet.set_row_background(row, Some(STARTED_HIGHLIGHT));
    } else {
        if let Some(col) = columns.started_at {
            sheet.write_cell(row, col, CellValue::text(""));
        }
        if let Some(col) = columns.started_by {
            sheet.write_cell(row, col, CellValue::text(""));
        }
        sheet.set_row_background(row, None);
    }

    info!("meeting {} is now {}", wanted, new_status);

    Ok(StatusUpdate {
        success: true,
        meeting_id: meeting_id.clone(),
        status: new_status.to_string(),
        timestamp: cell::now_timestamp(),
    })
}

/// Adds the status headers if the sheet has no `Status` column yet, marking
/// every meeting (a row whose first cell is a number) as pending.
///
/// Returns whether anything was written. Calling it again is a no-op.
pub fn ensure_columns<S: SheetStore + ?Sized>(sheet: &mut S) -> bool {
    let rows = sheet.load_rows();
    let has_status = rows
        .first()
        .map_or(false, |header| {
            header
                .iter()
                .any(|cell| matches!(cell, CellValue::Text(text) if text == STATUS_HEADERS[0]))
        });
    if has_status {
        debug!("status columns already present");
        return false;
    }

    let status_col = append_status_headers(sheet);

    let mut marked = 0;
    for (row, cells) in rows.iter().enumerate().skip(1) {
        if cells.first().map_or(false, CellValue::is_number) {
            sheet.write_cell(row, status_col, CellValue::text(PENDING));
            marked += 1;
        }
    }

    info!("added status columns at {}, {} meetings pending", status_col, marked);
    true
}

/// Moves every started meeting back to pending. Returns the ids that were reset.
pub fn reset_started<S: SheetStore + ?Sized>(sheet: &mut S) -> Vec<MeetingId> {
    let rows = sheet.load_rows();
    let started: Vec<MeetingId> = project(&rows)
        .filter(|meeting| meeting.status == STARTED.to_lowercase())
        .map(|meeting| meeting.id)
        .collect();

    let mut reset = Vec::with_capacity(started.len());
    for id in started {
        match update_status(sheet, &MeetingRef::from(id), PENDING, "") {
            Ok(_) => reset.push(id),
            Err(err) => warn!("could not reset meeting {}: {}", id, err),
        }
    }

    reset
}

/// Returns the column the `Status` header landed in.
fn append_status_headers<S: SheetStore + ?Sized>(sheet: &mut S) -> usize {
    let first = sheet.last_column();
    for (offset, header) in STATUS_HEADERS.iter().enumerate() {
        sheet.write_cell(0, first + offset, CellValue::text(*header));
        sheet.set_bold(0, first + offset);
    }

    first
}

use crate::cell::{self, CellValue, MeetingId};
use crate::column::{normalize_headers, ColumnMap};
use crate::sheet::SheetStore;
use crate::time::normalize_time_slot;
use log::{debug, trace};
use serde::Serialize;
use std::convert::TryFrom;

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MeetingRow {
    pub id: MeetingId,
    pub runner: String,
    pub time_slot: String,
    pub founder: String,
    pub company: String,
    pub investor: String,
    pub room: String,
    pub rep: String,
    pub is_priority: bool,
    pub status: String,
    pub started_at: Option<String>,
    pub started_by: String,
    /// 1-based row number in the sheet, header included.
    pub sheet_row: usize,
}

/// Lazily turns the data rows of a sheet into meetings.
///
/// Construct another with [`project`] to scan again; no state is kept between
/// scans.
pub struct Projection<'a> {
    columns: ColumnMap,
    rows: std::iter::Enumerate<std::slice::Iter<'a, Vec<CellValue>>>,
}

/// Projects `rows` (header row first) into meetings.
///
/// # Examples
/// ```
/// use meetinglist_libs::cell::CellValue;
/// use meetinglist_libs::meeting::project;
///
/// let rows = vec![
///     vec!["ID".into(), "Time Slot".into(), "Company".into(), "Investor (Fund)".into()],
///     vec![CellValue::Number(1.0), "10:00-10:35".into(), "Acme".into(), "North Fund".into()],
///     vec!["Total Meetings:".into(), CellValue::Empty, CellValue::Empty, CellValue::Empty],
/// ];
///
/// let meetings = project(&rows).collect::<Vec<_>>();
///
/// assert_eq!(meetings.len(), 1);
/// assert_eq!(meetings[0].time_slot, "10:00 AM – 10:35 AM");
/// assert_eq!(meetings[0].investor, "North Fund");
/// assert_eq!(meetings[0].sheet_row, 2);
/// ```
pub fn project(rows: &[Vec<CellValue>]) -> Projection<'_> {
    let columns = rows
        .first()
        .map(|header| ColumnMap::resolve(&normalize_headers(header)))
        .unwrap_or_default();

    Projection {
        columns,
        rows: rows.get(1..).unwrap_or_default().iter().enumerate(),
    }
}

impl<'a> Projection<'a> {
    pub fn columns(&self) -> ColumnMap {
        self.columns
    }

    fn project_row(&self, ordinal: usize, row: &[CellValue]) -> Option<MeetingRow> {
        let columns = &self.columns;

        let id = match columns.id {
            Some(col) => match MeetingId::try_from(cell_at(row, col)) {
                Ok(id) => id,
                Err(err) => {
                    trace!("skipping row {}: {}", ordinal + 1, err);
                    return None;
                }
            },
            None => MeetingId(ordinal as u64),
        };

        let company = text_at(row, columns.company);
        let investor = text_at(row, columns.fund);
        if company.is_empty() && investor.is_empty() {
            trace!("skipping row {}: no company or fund", ordinal + 1);
            return None;
        }

        let status = match columns.status {
            Some(col) => cell_at(row, col).to_text().trim().to_lowercase(),
            None => String::new(),
        };

        Some(MeetingRow {
            id,
            runner: text_at(row, columns.runner),
            time_slot: normalize_time_slot(&text_at(row, columns.time_slot)),
            founder: text_at(row, columns.founder),
            company,
            investor,
            room: text_at(row, columns.room),
            rep: text_at(row, columns.rep),
            is_priority: false,
            status: if status.is_empty() {
                "pending".to_string()
            } else {
                status
            },
            started_at: columns
                .started_at
                .and_then(|col| cell::started_at(cell_at(row, col)))
                .map(|at| cell::iso_timestamp(&at)),
            started_by: text_at(row, columns.started_by),
            sheet_row: ordinal + 1,
        })
    }
}

impl<'a> Iterator for Projection<'a> {
    type Item = MeetingRow;

    fn next(&mut self) -> Option<MeetingRow> {
        loop {
            let (index, row) = self.rows.next()?;
            // Data rows start at sheet row 2, ordinal 1.
            if let Some(meeting) = self.project_row(index + 1, row) {
                return Some(meeting);
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.rows.size_hint().1)
    }
}

fn cell_at(row: &[CellValue], col: usize) -> &CellValue {
    static EMPTY: CellValue = CellValue::Empty;

    row.get(col).unwrap_or(&EMPTY)
}

fn text_at(row: &[CellValue], col: Option<usize>) -> String {
    col.map(|col| cell_at(row, col).to_text().trim().to_string())
        .unwrap_or_default()
}

/// Response body of a meeting-list read.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct MeetingList {
    pub meetings: Vec<MeetingRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<ColumnMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Reads the whole sheet and projects every meeting in it.
///
/// A sheet holding nothing beyond its header row yields an empty list with
/// neither `columns` nor `timestamp`.
pub fn get_meetings<S: SheetStore + ?Sized>(sheet: &S) -> MeetingList {
    let rows = sheet.load_rows();
    if rows.len() <= 1 {
        debug!("meeting list has no data rows");
        return MeetingList {
            meetings: vec![],
            columns: None,
            timestamp: None,
        };
    }

    let projection = project(&rows);
    let columns = projection.columns();
    let meetings: Vec<MeetingRow> = projection.collect();
    debug!("projected {} meetings from {} rows", meetings.len(), rows.len() - 1);

    MeetingList {
        meetings,
        columns: Some(columns),
        timestamp: Some(cell::now_timestamp()),
    }
}

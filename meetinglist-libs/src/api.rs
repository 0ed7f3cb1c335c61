use crate::cell::{self, MeetingId};
use crate::meeting::{get_meetings, MeetingList, MeetingRow};
use crate::sheet::{MemorySheet, SheetChanges, SheetError, SheetStore, Workbook};
use crate::status::{
    ensure_columns, reset_started, update_status, MeetingRef, StatusUpdate, PENDING, STARTED,
};
use log::{debug, error, info};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

pub const GET_MEETINGS: &str = "getMeetings";
pub const ENSURE_STATUS_COLUMNS: &str = "ensureStatusColumns";
pub const START_MEETING: &str = "startMeeting";
pub const RESET_MEETING: &str = "resetMeeting";
pub const RESET_ALL_MEETINGS: &str = "resetAllMeetings";

/// Held while a request's edits are merged into the workbook file.
static COMMIT: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Malformed request body: {0}")]
    MalformedBody(#[from] serde_json::Error),
    #[error("Missing meetingId")]
    MissingMeetingId,
    #[error(transparent)]
    Sheet(#[from] SheetError),
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PostRequest {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    meeting_id: Option<MeetingRef>,
    #[serde(default)]
    started_by: Option<String>,
}

/// Every payload the endpoint answers with. Failures travel in the body, never
/// in the HTTP status.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Response {
    Meetings(MeetingList),
    MissingSheet {
        meetings: Vec<MeetingRow>,
        error: String,
    },
    Ensured {
        success: bool,
        message: String,
    },
    Updated(StatusUpdate),
    ResetAll {
        success: bool,
        reset: Vec<MeetingId>,
        timestamp: String,
    },
    Error {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        stack: Option<String>,
    },
}

impl Response {
    pub fn error<S: Into<String>>(message: S) -> Response {
        Response::Error {
            error: message.into(),
            stack: None,
        }
    }

    /// `stack` carries the error's debug rendering, which includes its sources.
    pub fn failure(err: &dyn StdError, with_stack: bool) -> Response {
        error!("request failed: {}", err);
        Response::Error {
            error: err.to_string(),
            stack: if with_stack {
                Some(format!("{:?}", err))
            } else {
                None
            },
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error { .. } | Response::MissingSheet { .. })
    }
}

/// Answers a read. `action` defaults to `getMeetings`.
pub fn handle_get<S: SheetStore + ?Sized>(
    sheet: Result<&mut S, SheetError>,
    action: Option<&str>,
) -> Response {
    let action = action.filter(|a| !a.is_empty()).unwrap_or(GET_MEETINGS);
    debug!("GET {}", action);

    get(sheet, action).unwrap_or_else(|err| Response::failure(&err, true))
}

fn get<S: SheetStore + ?Sized>(
    sheet: Result<&mut S, SheetError>,
    action: &str,
) -> Result<Response, ApiError> {
    match action {
        GET_MEETINGS => match sheet {
            Ok(sheet) => Ok(Response::Meetings(get_meetings(&*sheet))),
            Err(err @ SheetError::SheetNotFound { .. }) => Ok(Response::MissingSheet {
                meetings: vec![],
                error: err.to_string(),
            }),
            Err(err) => Err(err.into()),
        },
        ENSURE_STATUS_COLUMNS => {
            ensure_columns(sheet?);
            Ok(Response::Ensured {
                success: true,
                message: "Status columns ensured".to_string(),
            })
        }
        other => Ok(Response::error(format!("Unknown action: {}", other))),
    }
}

/// Answers a write. The body is JSON; `action` defaults to `startMeeting`.
pub fn handle_post<S: SheetStore + ?Sized>(
    sheet: Result<&mut S, SheetError>,
    body: &[u8],
) -> Response {
    post(sheet, body).unwrap_or_else(|err| Response::failure(&err, false))
}

fn post<S: SheetStore + ?Sized>(
    sheet: Result<&mut S, SheetError>,
    body: &[u8],
) -> Result<Response, ApiError> {
    let request: PostRequest = serde_json::from_slice(body)?;
    let action = request
        .action
        .as_deref()
        .filter(|a| !a.is_empty())
        .unwrap_or(START_MEETING);
    debug!("POST {}", action);

    match action {
        START_MEETING | RESET_MEETING => {
            let meeting_id = request.meeting_id.ok_or(ApiError::MissingMeetingId)?;
            let (status, started_by) = if action == START_MEETING {
                (STARTED, request.started_by.as_deref().unwrap_or(""))
            } else {
                (PENDING, "")
            };

            Ok(match update_status(sheet?, &meeting_id, status, started_by) {
                Ok(update) => Response::Updated(update),
                Err(err) => Response::error(err.to_string()),
            })
        }
        RESET_ALL_MEETINGS => {
            let reset = reset_started(sheet?);
            info!("reset {} started meetings", reset.len());
            Ok(Response::ResetAll {
                success: true,
                reset,
                timestamp: cell::now_timestamp(),
            })
        }
        other => Ok(Response::error(format!("Unknown action: {}", other))),
    }
}

/// A meeting list kept in a workbook file.
///
/// Every request reads the file afresh. When it changed the sheet, only the
/// cells and fills it touched are replayed onto the newest copy of the file,
/// so requests on different rows never undo each other. Merges are serialized
/// within one process; separate processes sharing the file can still race
/// between re-reading and renaming.
#[derive(Debug, Clone)]
pub struct Endpoint {
    workbook: PathBuf,
    tab: String,
}

impl Endpoint {
    pub fn new<P: Into<PathBuf>, S: Into<String>>(workbook: P, tab: S) -> Endpoint {
        Endpoint {
            workbook: workbook.into(),
            tab: tab.into(),
        }
    }

    pub fn get(&self, action: Option<&str>) -> Response {
        self.with_sheet(true, |sheet| handle_get(sheet, action))
    }

    pub fn post(&self, body: &[u8]) -> Response {
        self.with_sheet(false, |sheet| handle_post(sheet, body))
    }

    fn with_sheet<F>(&self, with_stack: bool, handle: F) -> Response
    where
        F: FnOnce(Result<&mut MemorySheet, SheetError>) -> Response,
    {
        let mut workbook = match Workbook::open(&self.workbook) {
            Ok(workbook) => workbook,
            Err(err) => return handle(Err(err)),
        };
        let before = workbook.sheet(&self.tab).cloned();

        let response = handle(workbook.require_sheet_mut(&self.tab));

        let changes = match (&before, workbook.sheet(&self.tab)) {
            (Some(before), Some(after)) => SheetChanges::between(before, after),
            _ => SheetChanges::default(),
        };
        if !changes.is_empty() {
            if let Err(err) = self.commit(&changes) {
                return Response::failure(&ApiError::from(err), with_stack);
            }
        }

        response
    }

    fn commit(&self, changes: &SheetChanges) -> Result<(), SheetError> {
        let _guard = COMMIT.lock().unwrap_or_else(PoisonError::into_inner);

        let mut latest = Workbook::open(&self.workbook)?;
        changes.apply_to(latest.require_sheet_mut(&self.tab)?);
        latest.save(&self.workbook)
    }
}

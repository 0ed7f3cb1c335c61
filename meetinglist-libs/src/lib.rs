pub mod api;
pub mod cell;
pub mod column;
pub mod meeting;
pub mod sheet;
pub mod status;
pub mod time;

pub use api::{handle_get, handle_post, Endpoint, Response};
pub use cell::{CellValue, MeetingId};
pub use meeting::{get_meetings, project, MeetingList, MeetingRow};
pub use sheet::{MemorySheet, SheetChanges, SheetError, SheetStore, Workbook};
pub use status::{ensure_columns, reset_started, update_status, MeetingRef};

#[cfg(test)]
mod tests {
    use crate::cell::CellValue;
    use crate::sheet::MemorySheet;

    fn meeting_sheet() -> MemorySheet {
        MemorySheet::new(vec![
            vec![
                "#".into(),
                "Time Slot".into(),
                "Founder (Company)".into(),
                "Investor (Fund)".into(),
                "Investor Rep".into(),
                "Room".into(),
                "Investor Runner".into(),
            ],
            vec![
                CellValue::Number(1.0),
                "10:00-10:35".into(),
                "Acme".into(),
                "North Fund".into(),
                "Dana".into(),
                "Room 1".into(),
                "Sam".into(),
            ],
            vec![
                CellValue::Number(2.0),
                "13:00–13:35".into(),
                "Globex".into(),
                "South Capital".into(),
                "Lee".into(),
                "Room 2".into(),
                "Kim".into(),
            ],
            vec!["Total Meetings:".into(), CellValue::Number(2.0)],
        ])
    }

    #[test]
    fn reads_meetings() {
        use crate::api::handle_get;
        use serde_json::json;

        let mut sheet = meeting_sheet();

        let response = serde_json::to_value(handle_get(Ok(&mut sheet), None)).unwrap();

        assert_eq!(response["meetings"].as_array().map(Vec::len), Some(2));
        assert_eq!(
            response["meetings"][1],
            json!({
                "id": 2,
                "runner": "Kim",
                "timeSlot": "1:00 PM – 1:35 PM",
                "founder": "Globex",
                "company": "Globex",
                "investor": "South Capital",
                "room": "Room 2",
                "rep": "Lee",
                "isPriority": false,
                "status": "pending",
                "startedAt": null,
                "startedBy": "",
                "sheetRow": 3,
            })
        );
        assert_eq!(
            response["columns"],
            json!({
                "id": 0, "timeSlot": 1, "fund": 3, "rep": 4, "company": 2,
                "founder": 2, "room": 5, "runner": 6, "status": -1,
            })
        );
    }

    #[test]
    fn missing_sheet_is_reported_in_the_body() {
        use crate::api::{handle_get, handle_post};
        use crate::sheet::SheetError;
        use serde_json::json;

        fn missing() -> Result<&'static mut MemorySheet, SheetError> {
            Err(SheetError::SheetNotFound {
                name: "Meeting List".to_string(),
            })
        }

        assert_eq!(
            serde_json::to_value(handle_get(missing(), Some("getMeetings"))).unwrap(),
            json!({ "meetings": [], "error": "Meeting List sheet not found" })
        );

        let ensured = serde_json::to_value(handle_get(missing(), Some("ensureStatusColumns"))).unwrap();
        assert_eq!(ensured["error"], "Meeting List sheet not found");
        assert!(ensured["stack"].is_string());

        let body = br#"{"action": "startMeeting", "meetingId": 1}"#;
        assert_eq!(
            serde_json::to_value(handle_post(missing(), body)).unwrap(),
            json!({ "error": "Meeting List sheet not found" })
        );
    }

    #[test]
    fn unknown_actions_are_errors_in_the_body() {
        use crate::api::{handle_get, handle_post, Response};

        let mut sheet = meeting_sheet();
        let before = sheet.clone();

        assert_eq!(
            handle_get(Ok(&mut sheet), Some("dropTables")),
            Response::error("Unknown action: dropTables")
        );
        assert_eq!(
            handle_post(Ok(&mut sheet), br#"{"action": "finishMeeting", "meetingId": 1}"#),
            Response::error("Unknown action: finishMeeting")
        );
        assert_eq!(sheet, before);
    }

    #[test]
    fn malformed_bodies_are_caught() {
        use crate::api::{handle_post, Response};

        let mut sheet = meeting_sheet();

        match handle_post(Ok(&mut sheet), b"{not json") {
            Response::Error { error, stack } => {
                assert!(error.starts_with("Malformed request body"));
                assert_eq!(stack, None);
            }
            other => panic!("expected an error, got {:?}", other),
        }

        assert_eq!(
            handle_post(Ok(&mut sheet), br#"{"action": "startMeeting"}"#),
            Response::error("Missing meetingId")
        );
    }

    #[test]
    fn start_and_reset_round_trip() {
        use crate::api::{handle_get, handle_post, Response};

        let mut sheet = meeting_sheet();

        match handle_get(Ok(&mut sheet), Some("ensureStatusColumns")) {
            Response::Ensured { success, message } => {
                assert!(success);
                assert_eq!(message, "Status columns ensured");
            }
            other => panic!("expected columns to be ensured, got {:?}", other),
        }

        // action defaults to startMeeting
        let started = handle_post(Ok(&mut sheet), br#"{"meetingId": 1, "startedBy": "Alice"}"#);
        let started = serde_json::to_value(started).unwrap();
        assert_eq!(started["success"], true);
        assert_eq!(started["meetingId"], 1);
        assert_eq!(started["status"], "Started");

        let listed = serde_json::to_value(handle_get(Ok(&mut sheet), None)).unwrap();
        assert_eq!(listed["meetings"][0]["status"], "started");
        assert_eq!(listed["meetings"][0]["startedBy"], "Alice");
        assert!(listed["meetings"][0]["startedAt"].is_string());
        assert_eq!(listed["meetings"][1]["status"], "pending");
        assert_eq!(listed["columns"]["status"], 7);

        let reset = handle_post(Ok(&mut sheet), br#"{"action": "resetMeeting", "meetingId": "1"}"#);
        assert_eq!(serde_json::to_value(reset).unwrap()["status"], "Pending");

        let listed = serde_json::to_value(handle_get(Ok(&mut sheet), None)).unwrap();
        assert_eq!(listed["meetings"][0]["status"], "pending");
        assert_eq!(listed["meetings"][0]["startedBy"], "");
        assert!(listed["meetings"][0]["startedAt"].is_null());
    }

    #[test]
    fn unknown_meeting_is_not_found() {
        use crate::api::{handle_post, Response};

        let mut sheet = meeting_sheet();
        let before = sheet.clone();

        assert_eq!(
            handle_post(Ok(&mut sheet), br#"{"action": "startMeeting", "meetingId": 99}"#),
            Response::error("Meeting 99 not found")
        );
        assert_eq!(sheet, before);
    }

    #[test]
    fn resets_every_started_meeting() {
        use crate::api::{handle_post, Response};
        use crate::cell::MeetingId;

        let mut sheet = meeting_sheet();
        handle_post(Ok(&mut sheet), br#"{"meetingId": 1, "startedBy": "A"}"#);
        handle_post(Ok(&mut sheet), br#"{"meetingId": 2, "startedBy": "B"}"#);

        match handle_post(Ok(&mut sheet), br#"{"action": "resetAllMeetings"}"#) {
            Response::ResetAll { success, reset, .. } => {
                assert!(success);
                assert_eq!(reset, vec![MeetingId(1), MeetingId(2)]);
            }
            other => panic!("expected a reset, got {:?}", other),
        }
        assert_eq!(sheet.background(1), None);
        assert_eq!(sheet.background(2), None);
    }

    #[test]
    fn endpoint_saves_only_after_changes() {
        use crate::api::{Endpoint, Response};
        use crate::sheet::Workbook;
        use std::fs;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meeting-list.json");
        Workbook::new("demo-day")
            .with_sheet("Meeting List", meeting_sheet())
            .save(&path)
            .unwrap();
        let endpoint = Endpoint::new(&path, "Meeting List");

        let untouched = fs::read(&path).unwrap();
        assert!(matches!(endpoint.get(None), Response::Meetings(_)));
        assert_eq!(fs::read(&path).unwrap(), untouched);

        assert!(matches!(
            endpoint.post(br#"{"meetingId": 2, "startedBy": "Alice"}"#),
            Response::Updated(_)
        ));

        let saved = Workbook::open(&path).unwrap();
        let sheet = saved.sheet("Meeting List").unwrap();
        assert_eq!(sheet.value(0, 7), &CellValue::text("Status"));
        assert_eq!(sheet.value(2, 7), &CellValue::text("Started"));
        assert_eq!(sheet.value(2, 9), &CellValue::text("Alice"));
    }

    #[test]
    fn concurrent_starts_on_different_rows_are_all_kept() {
        use crate::api::{Endpoint, Response};
        use crate::sheet::{SheetStore, Workbook};
        use std::thread;

        let header: Vec<CellValue> = vec![
            "#".into(),
            "Company".into(),
            "Room".into(),
            "Investor (Fund)".into(),
        ];
        let rows = std::iter::once(header)
            .chain((1..=16).map(|id| {
                vec![
                    CellValue::Number(id as f64),
                    format!("Company {}", id).into(),
                    "Room 1".into(),
                    "Fund".into(),
                ]
            }))
            .collect();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meeting-list.json");
        Workbook::new("demo-day")
            .with_sheet("Meeting List", MemorySheet::new(rows))
            .save(&path)
            .unwrap();
        let endpoint = Endpoint::new(&path, "Meeting List");
        assert!(matches!(
            endpoint.get(Some("ensureStatusColumns")),
            Response::Ensured { .. }
        ));

        let workers = (1..=16)
            .map(|id| {
                let endpoint = endpoint.clone();
                thread::spawn(move || {
                    let body = format!(r#"{{"meetingId": {}, "startedBy": "Runner {}"}}"#, id, id);
                    let response = endpoint.post(body.as_bytes());
                    let reader = endpoint.get(None);
                    (response, reader)
                })
            })
            .collect::<Vec<_>>();

        for worker in workers {
            let (response, reader) = worker.join().unwrap();
            assert!(matches!(response, Response::Updated(_)), "{:?}", response);
            assert!(matches!(reader, Response::Meetings(_)), "{:?}", reader);
        }

        let saved = Workbook::open(&path).unwrap();
        let sheet = saved.sheet("Meeting List").unwrap();
        assert_eq!(sheet.last_column(), 7);
        for row in 1..=16 {
            assert_eq!(sheet.value(row, 4), &CellValue::text("Started"));
            assert_eq!(sheet.value(row, 6), &CellValue::text(format!("Runner {}", row)));
            assert_eq!(sheet.background(row), Some("#d4edda"));
        }
    }

    #[test]
    fn endpoint_reports_missing_tab_and_workbook() {
        use crate::api::{Endpoint, Response};
        use crate::sheet::Workbook;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meeting-list.json");
        Workbook::new("demo-day").save(&path).unwrap();

        match Endpoint::new(&path, "Meeting List").get(None) {
            Response::MissingSheet { meetings, error } => {
                assert!(meetings.is_empty());
                assert_eq!(error, "Meeting List sheet not found");
            }
            other => panic!("expected a missing sheet, got {:?}", other),
        }

        let gone = Endpoint::new(dir.path().join("gone.json"), "Meeting List");
        match gone.get(None) {
            Response::Error { error, stack } => {
                assert!(error.starts_with("Could not read workbook"));
                assert!(stack.is_some());
            }
            other => panic!("expected an error, got {:?}", other),
        }
    }
}

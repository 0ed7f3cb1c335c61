#![no_main]
use libfuzzer_sys::fuzz_target;
use meetinglist_libs::{project, CellValue, MemorySheet, SheetStore};

fuzz_target!(|rows: Vec<Vec<CellValue>>| {
    let meetings = project(&rows).collect::<Vec<_>>();

    assert!(
        meetings.iter().all(|m| m.id.0 > 0),
        "Every projected meeting has a positive id"
    );
    assert!(
        meetings.iter().all(|m| !m.company.is_empty() || !m.investor.is_empty()),
        "Every projected meeting has a company or a fund"
    );
    assert!(
        meetings.windows(2).all(|w| w[0].sheet_row < w[1].sheet_row),
        "Meetings come out in sheet order"
    );

    let sheet = MemorySheet::new(rows.clone());
    let data_range = sheet.load_rows();
    assert_eq!(
        project(&data_range).collect::<Vec<_>>(),
        meetings,
        "Trimming blank cells does not change the projection"
    );
});

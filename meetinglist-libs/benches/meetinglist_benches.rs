use criterion::{black_box, criterion_group, criterion_main, Criterion};
use meetinglist_libs::column::{normalize_headers, ColumnMap};
use meetinglist_libs::time::normalize_time_slot;
use meetinglist_libs::{get_meetings, project, update_status, CellValue, MeetingRef, MemorySheet};

fn meeting_rows(count: usize) -> Vec<Vec<CellValue>> {
    let mut rows = vec![vec![
        "#".into(),
        "Time Slot".into(),
        "Founder (Company)".into(),
        "Investor (Fund)".into(),
        "Investor Rep".into(),
        "Room".into(),
        "Investor Runner".into(),
        "Status".into(),
        "Started At".into(),
        "Started By".into(),
    ]];

    for i in 0..count {
        let hour = 9 + (i % 9);
        rows.push(vec![
            CellValue::Number((i + 1) as f64),
            format!("{}:00-{}:35", hour, hour).into(),
            format!("Startup {}", i).into(),
            format!("Fund {}", i % 40).into(),
            "Dana, Lee".into(),
            format!("Room {}", i % 12).into(),
            "Sam".into(),
            "Pending".into(),
            CellValue::Empty,
            CellValue::Empty,
        ]);
    }
    rows.push(vec!["Total Meetings:".into(), CellValue::Number(count as f64)]);

    rows
}

fn resolve_and_project(c: &mut Criterion) {
    let rows = meeting_rows(500);

    c.bench_function("resolve_columns", |b| {
        b.iter(|| black_box(ColumnMap::resolve(&normalize_headers(&rows[0]))))
    });

    c.bench_function("project_500", |b| {
        b.iter(|| black_box(project(&rows).count()))
    });

    c.bench_function("normalize_time_slot", |b| {
        b.iter(|| black_box(normalize_time_slot(black_box("13:00-13:35"))))
    });
}

fn read_and_update(c: &mut Criterion) {
    c.bench_function("get_meetings_500", |b| {
        let sheet = MemorySheet::new(meeting_rows(500));
        b.iter(|| black_box(get_meetings(&sheet)))
    });

    c.bench_function("start_last_meeting", |b| {
        let mut sheet = MemorySheet::new(meeting_rows(500));
        let last = MeetingRef::from("500");
        b.iter(|| black_box(update_status(&mut sheet, &last, "Started", "bench").is_ok()))
    });
}

criterion_group!(benches, resolve_and_project, read_and_update);
criterion_main!(benches);

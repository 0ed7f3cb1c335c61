#![no_main]
use libfuzzer_sys::fuzz_target;
use meetinglist_libs::column::find_col;

/// Keyword order first, header order second.
fn first_match(headers: &[String], keywords: &[&str]) -> Option<usize> {
    for keyword in keywords {
        for (index, header) in headers.iter().enumerate() {
            if header.contains(keyword) {
                return Some(index);
            }
        }
    }
    None
}

fuzz_target!(|input: (Vec<String>, Vec<String>)| {
    let (headers, keywords) = input;
    let keywords = keywords.iter().map(String::as_str).collect::<Vec<_>>();

    let found = find_col(&headers, &keywords);

    assert_eq!(found, first_match(&headers, &keywords));
    if let Some(index) = found {
        assert!(
            keywords.iter().any(|keyword| headers[index].contains(keyword)),
            "The chosen header contains one of the keywords"
        );
    }
});

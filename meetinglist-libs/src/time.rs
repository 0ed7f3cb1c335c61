use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;

static CLOCK_TIME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([0-9]{1,2}):([0-9]{2})$").unwrap());

const SEPARATOR: &str = " – ";

/// Rewrites a bare clock-time range as a 12-hour range.
///
/// Slots already carrying `AM`/`PM` are left alone, as is anything that does
/// not split on a hyphen or en dash into exactly two parts.
///
/// # Examples
/// ```
/// use meetinglist_libs::time::normalize_time_slot;
///
/// assert_eq!(normalize_time_slot("10:00-10:35"), "10:00 AM – 10:35 AM");
/// assert_eq!(normalize_time_slot("13:00-13:35"), "1:00 PM – 1:35 PM");
/// assert_eq!(normalize_time_slot("00:15-00:45"), "12:15 AM – 12:45 AM");
/// assert_eq!(normalize_time_slot("2:30 PM - 3:00 PM"), "2:30 PM - 3:00 PM");
/// ```
pub fn normalize_time_slot(slot: &str) -> String {
    if slot.is_empty() || slot.contains("AM") || slot.contains("PM") {
        return slot.to_string();
    }

    match slot.split(|c: char| c == '-' || c == '–').collect_tuple() {
        Some((start, end)) => format!("{}{}{}", to_twelve_hour(start), SEPARATOR, to_twelve_hour(end)),
        None => slot.to_string(),
    }
}

/// `H:MM` or `HH:MM` to `H:MM AM|PM`. Anything else is returned trimmed.
fn to_twelve_hour(time: &str) -> String {
    let time = time.trim();

    let captures = match CLOCK_TIME.captures(time) {
        Some(captures) => captures,
        None => return time.to_string(),
    };

    let hour: u32 = match captures[1].parse() {
        Ok(hour) => hour,
        Err(_) => return time.to_string(),
    };
    let suffix = if hour >= 12 { "PM" } else { "AM" };
    let hour = match hour {
        0 => 12,
        h if h > 12 => h - 12,
        h => h,
    };

    format!("{}:{} {}", hour, &captures[2], suffix)
}

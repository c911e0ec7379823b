//! Date and time parsing for journal lines.

use chrono::{NaiveDate, NaiveDateTime};

/// Parse a journal date.
///
/// Accepted shapes are `YYYY-MM-DD`, `YYYY-MM-DD-HH`, `YYYY-MM-DD-HH-MM`
/// and `YYYY-MM-DD-HH-MM-SS`, with any of `/ _ : .` in place of `-`.
/// A date without a time of day lands on 12:00, so date-only transactions
/// sort stably within a day regardless of timed postings around them.
#[must_use]
pub fn parse_date(s: &str) -> Option<NaiveDateTime> {
    let normalized: String = s
        .chars()
        .map(|c| match c {
            '/' | '_' | ':' | '.' => '-',
            other => other,
        })
        .collect();

    let parts: Vec<&str> = normalized.split('-').collect();
    if parts.len() < 3 || parts.len() > 6 {
        return None;
    }
    if parts[0].len() != 4 || parts[1..].iter().any(|p| p.len() != 2) {
        return None;
    }
    if parts.iter().any(|p| !p.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }

    let year: i32 = parts[0].parse().ok()?;
    let month: u32 = parts[1].parse().ok()?;
    let day: u32 = parts[2].parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;

    let mut clock = [12u32, 0, 0];
    if parts.len() > 3 {
        clock = [0, 0, 0];
        for (slot, part) in clock.iter_mut().zip(&parts[3..]) {
            *slot = part.parse().ok()?;
        }
    }
    date.and_hms_opt(clock[0], clock[1], clock[2])
}

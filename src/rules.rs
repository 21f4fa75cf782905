use chrono::{DateTime, Datelike, Local, Weekday};

use crate::rotation::HistoryEntry;

/// Dish duty runs on Friday evenings.
pub fn is_friday() -> bool {
    Local::now().weekday() == Weekday::Fri
}

/// True if any entry in the history falls on today's local date. Entries
/// with unparsable dates are ignored.
pub fn has_run_today(entries: &[HistoryEntry]) -> bool {
    let today = Local::now().date_naive();
    entries.iter().any(|entry| {
        DateTime::parse_from_rfc3339(&entry.date)
            .map(|date| date.with_timezone(&Local).date_naive() == today)
            .unwrap_or(false)
    })
}

/// Production selections run only on Friday and only once per day. Test mode
/// is never gated.
pub fn selection_allowed(test_mode: bool, entries: &[HistoryEntry]) -> Result<(), String> {
    if test_mode {
        return Ok(());
    }
    if !is_friday() {
        return Err("Dish duty is only decided on Fridays".to_string());
    }
    if has_run_today(entries) {
        return Err("Dish duty was already decided today".to_string());
    }
    Ok(())
}

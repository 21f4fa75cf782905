use chrono::DateTime;

use crate::rotation::{HistoryEntry, DecisionRecord};

/// Formats an ISO-8601 timestamp as a short date for display. Falls back to
/// the raw string if it does not parse.
pub fn format_date(date: &str) -> String {
    match DateTime::parse_from_rfc3339(date) {
        Ok(parsed) => parsed.format("%Y-%m-%d").to_string(),
        Err(_) => date.to_string(),
    }
}

/// Formats an ISO-8601 timestamp with the time of day included.
pub fn format_date_time(date: &str) -> String {
    match DateTime::parse_from_rfc3339(date) {
        Ok(parsed) => parsed.format("%Y-%m-%d %H:%M").to_string(),
        Err(_) => date.to_string(),
    }
}

/// Prints a selection result with the per-brother stats in a readable format
pub fn print_decision(result: &DecisionRecord) {
    println!("\n=== Dish Duty Result ===");
    println!("Chosen: {}", result.chosen);
    println!("Reason: {}", result.reason);
    println!("Group:  {}", result.group.replace(',', ", "));

    println!("\nStats for this group:");
    for brother in &result.present_brothers {
        let count = result.counts.get(brother).copied().unwrap_or(0);
        let last = match result.last_dates.get(brother) {
            Some(Some(date)) => format!("Last: {}", format_date(date)),
            _ => "Last: Never".to_string(),
        };
        let unit = if count == 1 { "time" } else { "times" };
        println!("  {} -> {} {} ({})", brother, count, unit, last);
    }
}

/// Prints history entries, most recent insertion first
pub fn print_log(entries: &[HistoryEntry]) {
    if entries.is_empty() {
        println!("No history yet!");
        return;
    }
    for entry in entries.iter().rev() {
        println!(
            "  {}  {}  (group: {})",
            format_date_time(&entry.date),
            entry.brother,
            entry.group.replace(',', ", ")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_parsable_dates() {
        assert_eq!(format_date("2024-01-05T18:30:00+00:00"), "2024-01-05");
        assert_eq!(format_date_time("2024-01-05T18:30:00+00:00"), "2024-01-05 18:30");
    }

    #[test]
    fn falls_back_to_raw_string() {
        assert_eq!(format_date("sometime"), "sometime");
    }
}

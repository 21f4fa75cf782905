use std::collections::BTreeMap;
use chrono::{DateTime, FixedOffset};

use super::types::{HistoryEntry, DecisionRecord};
use super::group_key::normalize;
use crate::display::format_date;

/// Picks who does the dishes next among the present brothers, using only
/// history recorded under this exact group composition.
///
/// The brother with the fewest recorded turns wins; ties go to whoever did it
/// least recently, with "never done it" counting as infinitely long ago.
/// Pure function: no clock, no randomness, identical inputs give identical
/// records.
pub fn select(
    present_brothers: &[String],
    history: &[HistoryEntry],
) -> Result<DecisionRecord, String> {
    if present_brothers.is_empty() {
        return Err("Cannot select from an empty list of present brothers".to_string());
    }

    let group = normalize(present_brothers);

    let mut counts: BTreeMap<String, u32> = BTreeMap::new();
    let mut last_seen: BTreeMap<String, Option<(DateTime<FixedOffset>, String)>> = BTreeMap::new();
    for brother in present_brothers {
        counts.insert(brother.clone(), 0);
        last_seen.insert(brother.clone(), None);
    }

    // Only entries recorded under this exact group key count. A history
    // entry naming a brother who is not present (stale or renamed roster)
    // is skipped rather than treated as an error.
    for entry in history.iter().filter(|e| e.group == group) {
        let Some(count) = counts.get_mut(&entry.brother) else {
            continue;
        };
        *count += 1;

        // Entries are not assumed date-sorted; compare timestamps. An entry
        // with an unparsable date still counts a turn but cannot update
        // recency.
        if let Ok(parsed) = DateTime::parse_from_rfc3339(&entry.date) {
            if let Some(seen) = last_seen.get_mut(&entry.brother) {
                let newer = match seen {
                    Some((best, _)) => parsed > *best,
                    None => true,
                };
                if newer {
                    *seen = Some((parsed, entry.date.clone()));
                }
            }
        }
    }

    let min_count = counts.values().copied().min().unwrap_or(0);

    // Candidates in sorted-name order so tie-breaks are deterministic.
    let mut candidates: Vec<&String> = counts
        .iter()
        .filter(|(_, &count)| count == min_count)
        .map(|(name, _)| name)
        .collect();

    let (chosen, reason) = if candidates.len() == 1 {
        let chosen = candidates[0].clone();
        let reason = if min_count == 0 {
            format!("{} has never done the dishes with this group (0 times).", chosen)
        } else {
            let unit = if min_count == 1 { "time" } else { "times" };
            format!(
                "{} has done the dishes the least times in this group ({} {}).",
                chosen, min_count, unit
            )
        };
        (chosen, reason)
    } else {
        // Stable sort: None (never done it) orders before any date, and
        // equal dates keep the sorted-name order.
        candidates.sort_by_key(|name| last_seen[*name].as_ref().map(|(parsed, _)| *parsed));
        let chosen = candidates[0].clone();
        let reason = match &last_seen[&chosen] {
            Some((_, date)) => format!(
                "All brothers have {} turns, but {} did it earliest (last on {}).",
                min_count,
                chosen,
                format_date(date)
            ),
            None => format!(
                "All brothers have {} turns, but {} has never done it in this group configuration.",
                min_count, chosen
            ),
        };
        (chosen, reason)
    };

    let last_dates = last_seen
        .into_iter()
        .map(|(name, seen)| (name, seen.map(|(_, date)| date)))
        .collect();

    Ok(DecisionRecord {
        chosen,
        reason,
        group,
        present_brothers: present_brothers.to_vec(),
        counts,
        last_dates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn entry(brother: &str, group: &str, date: &str) -> HistoryEntry {
        HistoryEntry {
            brother: brother.to_string(),
            group: group.to_string(),
            date: date.to_string(),
            present_brothers: group.split(',').map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn empty_present_list_is_an_error() {
        assert!(select(&[], &[]).is_err());
    }

    #[test]
    fn no_history_picks_among_all_at_zero() {
        let result = select(&names(&["Ohad", "Raz"]), &[]).unwrap();
        assert_eq!(result.counts["Ohad"], 0);
        assert_eq!(result.counts["Raz"], 0);
        assert!(result.reason.contains("never done it"));
    }

    #[test]
    fn minimum_count_wins() {
        let history = vec![
            entry("A", "A,B", "2024-01-05T18:00:00+00:00"),
            entry("A", "A,B", "2024-01-12T18:00:00+00:00"),
        ];
        let result = select(&names(&["A", "B"]), &history).unwrap();
        assert_eq!(result.chosen, "B");
        assert_eq!(result.counts["A"], 2);
        assert_eq!(result.counts["B"], 0);
        assert!(result.reason.contains("has never done"), "reason: {}", result.reason);
    }

    #[test]
    fn tie_breaks_by_least_recent() {
        let history = vec![
            entry("A", "A,B", "2024-01-05T18:00:00+00:00"),
            entry("B", "A,B", "2024-01-12T18:00:00+00:00"),
        ];
        let result = select(&names(&["A", "B"]), &history).unwrap();
        assert_eq!(result.chosen, "A");
        assert!(result.reason.contains("earliest"));
        assert!(result.reason.contains("2024-01-05"));
    }

    #[test]
    fn never_done_orders_before_any_date() {
        let history = vec![entry("A", "A,B,C", "2024-01-05T18:00:00+00:00")];
        let result = select(&names(&["A", "B", "C"]), &history).unwrap();
        assert_ne!(result.chosen, "A");
        assert!(result.chosen == "B" || result.chosen == "C");
    }

    #[test]
    fn exact_group_isolation() {
        // History under "A,B" must never leak into a selection for {A,B,C}.
        let history = vec![
            entry("A", "A,B", "2024-01-05T18:00:00+00:00"),
            entry("A", "A,B", "2024-01-12T18:00:00+00:00"),
            entry("B", "A,B,C,D", "2024-01-19T18:00:00+00:00"),
        ];
        let result = select(&names(&["A", "B", "C"]), &history).unwrap();
        assert_eq!(result.counts["A"], 0);
        assert_eq!(result.counts["B"], 0);
        assert_eq!(result.counts["C"], 0);
    }

    #[test]
    fn present_order_does_not_matter() {
        let history = vec![
            entry("A", "A,B,C", "2024-01-05T18:00:00+00:00"),
            entry("B", "A,B,C", "2024-01-12T18:00:00+00:00"),
        ];
        let one = select(&names(&["C", "A", "B"]), &history).unwrap();
        let two = select(&names(&["B", "C", "A"]), &history).unwrap();
        assert_eq!(one.chosen, two.chosen);
        assert_eq!(one.group, "A,B,C");
        assert_eq!(one.counts, two.counts);
    }

    #[test]
    fn singular_reason_for_one_turn() {
        let history = vec![
            entry("A", "A,B", "2024-01-05T18:00:00+00:00"),
            entry("A", "A,B", "2024-01-12T18:00:00+00:00"),
            entry("B", "A,B", "2024-01-19T18:00:00+00:00"),
        ];
        let result = select(&names(&["A", "B"]), &history).unwrap();
        assert_eq!(result.chosen, "B");
        assert!(result.reason.contains("(1 time)"), "reason: {}", result.reason);
    }

    #[test]
    fn plural_reason_for_many_turns() {
        let history = vec![
            entry("A", "A,B", "2024-01-05T18:00:00+00:00"),
            entry("A", "A,B", "2024-01-12T18:00:00+00:00"),
            entry("A", "A,B", "2024-01-19T18:00:00+00:00"),
            entry("B", "A,B", "2024-01-26T18:00:00+00:00"),
            entry("B", "A,B", "2024-02-02T18:00:00+00:00"),
        ];
        let result = select(&names(&["A", "B"]), &history).unwrap();
        assert_eq!(result.chosen, "B");
        assert!(result.reason.contains("(2 times)"), "reason: {}", result.reason);
    }

    #[test]
    fn unknown_brother_in_history_is_ignored() {
        let history = vec![
            entry("Moved-Out", "A,B", "2024-01-05T18:00:00+00:00"),
            entry("A", "A,B", "2024-01-12T18:00:00+00:00"),
        ];
        let result = select(&names(&["A", "B"]), &history).unwrap();
        assert_eq!(result.chosen, "B");
        assert_eq!(result.counts["A"], 1);
        assert!(!result.counts.contains_key("Moved-Out"));
    }

    #[test]
    fn malformed_date_counts_a_turn_but_not_recency() {
        let history = vec![
            entry("A", "A,B", "not-a-date"),
            entry("B", "A,B", "2024-01-12T18:00:00+00:00"),
        ];
        let result = select(&names(&["A", "B"]), &history).unwrap();
        // Both at one turn; A has no usable last date so A orders first.
        assert_eq!(result.chosen, "A");
        assert_eq!(result.counts["A"], 1);
        assert_eq!(result.last_dates["A"], None);
    }

    #[test]
    fn repeated_calls_are_identical() {
        let history = vec![
            entry("A", "A,B,C", "2024-01-05T18:00:00+00:00"),
            entry("C", "A,B,C", "2024-01-12T18:00:00+00:00"),
        ];
        let present = names(&["A", "B", "C"]);
        let one = select(&present, &history).unwrap();
        let two = select(&present, &history).unwrap();
        assert_eq!(one, two);
        assert_eq!(
            serde_json::to_string(&one).unwrap(),
            serde_json::to_string(&two).unwrap()
        );
    }

    #[test]
    fn single_present_brother_is_chosen() {
        let result = select(&names(&["Raz"]), &[]).unwrap();
        assert_eq!(result.chosen, "Raz");
        assert_eq!(result.group, "Raz");
    }
}

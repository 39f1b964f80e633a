mod config;
pub mod aggregate;
pub mod filter;
pub mod manual;
pub mod narrative;
pub mod normalize;
pub mod view;

use log::debug;

pub use crate::config::*;
pub use crate::filter::{apply_filters, distinct_values, filter_records, sort_records};
pub use crate::narrative::{build_narratives, Narratives, Theme};
pub use crate::view::{chart_series, ChartSeries, Dashboard, Kpis, LoadToken, TableKpis};

/// The `n` entries of the table with the highest counts.
///
/// Entries are ordered by decreasing count. Entries with the same count keep
/// the order of the table (the order in which the labels were first seen).
/// An empty table gives an empty list.
pub fn top_n(table: &FrequencyTable, n: usize) -> Vec<(String, u64)> {
    let mut entries: Vec<(String, u64)> = table
        .iter()
        .map(|(label, count)| (label.to_string(), count))
        .collect();
    // The sort is stable, which provides the tie-break.
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries.truncate(n);
    entries
}

/// Ranks a table and quotes every entry with the given denominator rule.
///
/// `total_responses` is only used by [Denominator::Responses].
pub fn ranked_entries(
    table: &FrequencyTable,
    n: usize,
    denominator: Denominator,
    total_responses: u64,
) -> Vec<RankedEntry> {
    let mentions = sum_of_counts(table);
    let res: Vec<RankedEntry> = top_n(table, n)
        .into_iter()
        .map(|(label, count)| {
            let percent = match denominator {
                Denominator::Responses => Some(percent_of(count, total_responses)),
                Denominator::Mentions => Some(percent_of(count, mentions)),
                Denominator::Count => None,
            };
            RankedEntry {
                label,
                count,
                percent,
            }
        })
        .collect();
    debug!(
        "ranked_entries: n: {:?} denominator: {:?} res: {:?}",
        n, denominator, res
    );
    res
}

/// `part` as a rounded percentage of `total`, halves rounded up.
/// A zero total gives 0.
pub fn percent_of(part: u64, total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    // round(part * 100 / total) in integer arithmetic, widened so that
    // large counts cannot overflow.
    let (part, total) = (u128::from(part), u128::from(total));
    ((part * 200 + total) / (2 * total)) as u64
}

/// The sum of all the counts of a table.
pub fn sum_of_counts(table: &FrequencyTable) -> u64 {
    table.iter().map(|(_, c)| c).sum()
}

/// Joins labels as a French enumeration: "A", "A et B", "A, B, et C".
pub fn enumerate_naturally<S: AsRef<str>>(labels: &[S]) -> String {
    match labels {
        [] => String::new(),
        [a] => a.as_ref().to_string(),
        [a, b] => format!("{} et {}", a.as_ref(), b.as_ref()),
        [init @ .., last] => {
            let head: Vec<&str> = init.iter().map(|s| s.as_ref()).collect();
            format!("{}, et {}", head.join(", "), last.as_ref())
        }
    }
}

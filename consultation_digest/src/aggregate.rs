//! Counting the records of a consultation into frequency tables.

use log::{debug, info};
use std::collections::BTreeMap;

use crate::config::*;

/// Splits a multi-select answer into its parts.
///
/// Parts are separated by commas when there is one, else by semicolons,
/// else by whitespace (the survey tool stores codes space-separated).
pub fn split_multi(value: &str) -> Vec<String> {
    let s = value.trim();
    let parts: Vec<&str> = if s.contains(',') {
        s.split(',').collect()
    } else if s.contains(';') {
        s.split(';').collect()
    } else {
        s.split_whitespace().collect()
    };
    parts
        .into_iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(|p| p.to_string())
        .collect()
}

// Most frequent first, then by label ignoring case.
fn sorted_table(counts: BTreeMap<String, u64>) -> FrequencyTable {
    let mut entries: Vec<(String, u64)> = counts.into_iter().collect();
    entries.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then_with(|| a.0.to_lowercase().cmp(&b.0.to_lowercase()))
    });
    FrequencyTable::from_entries(entries)
}

/// Counts one column of the records.
pub fn count_column(records: &[Record], column: &str, selection: Selection) -> FrequencyTable {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for r in records.iter() {
        let value = r.text(column);
        let answers: Vec<String> = match selection {
            Selection::Single => {
                let v = value.trim();
                if v.is_empty() {
                    vec![]
                } else {
                    vec![v.to_string()]
                }
            }
            Selection::Multiple => split_multi(&value),
        };
        for a in answers {
            *counts.entry(a).or_insert(0) += 1;
        }
    }
    sorted_table(counts)
}

/// The aggregates of a set of records, one table per registered field.
pub fn build_scope(records: &[Record]) -> AggregateScope {
    let mut scope = AggregateScope::new(records.len() as u64);
    for field in SurveyField::ALL.iter() {
        let table = count_column(records, field.source_column(), field.selection());
        debug!(
            "build_scope: {}: {} categories from {:?}",
            field,
            table.len(),
            field.source_column()
        );
        scope.insert_table(field.key(), table);
    }
    scope
}

/// The summary scope and one scope per organization type.
///
/// Records without an organization type only count in the summary.
pub fn build_store(records: &[Record], generated_at: Option<String>) -> AggregateStore {
    info!("build_store: Processing {} records", records.len());
    let mut groups: BTreeMap<String, Vec<Record>> = BTreeMap::new();
    for r in records.iter() {
        let org_type = r.text(columns::ORG_TYPE);
        if !org_type.is_empty() {
            groups.entry(org_type).or_default().push(r.clone());
        }
    }
    let by_org_type: BTreeMap<String, AggregateScope> = groups
        .iter()
        .map(|(label, rs)| (label.clone(), build_scope(rs)))
        .collect();
    info!(
        "build_store: {} organization types: {:?}",
        by_org_type.len(),
        by_org_type.keys().collect::<Vec<&String>>()
    );
    AggregateStore {
        total_responses: Some(records.len() as u64),
        generated_at,
        summary: build_scope(records),
        by_org_type,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{normalize_records, Labels};

    fn records() -> Vec<Record> {
        vec![
            Record::from_pairs(vec![
                (columns::ORG_TYPE, "WLO"),
                ("service_top1_label", "Santé"),
                ("underserved_label", "Adolescentes, Femmes déplacées"),
            ]),
            Record::from_pairs(vec![
                (columns::ORG_TYPE, "ONG nationale"),
                ("service_top1_label", "Protection"),
                ("underserved_label", "Femmes déplacées; Survivantes"),
            ]),
            Record::from_pairs(vec![
                (columns::ORG_TYPE, "WLO"),
                ("service_top1_label", "Santé"),
                ("underserved_label", "Femmes en situation de handicap, Femmes déplacées"),
            ]),
            Record::from_pairs(vec![
                (columns::ORG_TYPE, ""),
                ("service_top1_label", " "),
            ]),
        ]
    }

    #[test]
    fn split_multi_separators() {
        assert_eq!(split_multi("a, b ,c"), vec!["a", "b", "c"]);
        assert_eq!(split_multi("a; b"), vec!["a", "b"]);
        assert_eq!(split_multi(" a  b "), vec!["a", "b"]);
        assert!(split_multi("  ").is_empty());
    }

    #[test]
    fn single_select_counts() {
        let scope = build_scope(&records());
        assert_eq!(scope.total_responses, 4);
        let t = scope.field(SurveyField::TopService1);
        assert_eq!(t.labels(), vec!["Santé", "Protection"]);
        assert_eq!(t.get("Santé"), Some(2));
    }

    #[test]
    fn multi_select_counts() {
        let scope = build_scope(&records());
        let t = scope.field(SurveyField::UnderservedGroups);
        assert_eq!(t.get("Femmes déplacées"), Some(3));
        assert_eq!(
            t.labels(),
            vec![
                "Femmes déplacées",
                "Adolescentes",
                "Femmes en situation de handicap",
                "Survivantes"
            ]
        );
    }

    #[test]
    fn coded_exports_count_by_label() {
        let raw = vec![
            Record::from_pairs(vec![
                ("intro/org_type", "wlo"),
                ("bloc_d/d2_underserved", "deplacees handicap"),
                ("bloc_a/a1_service_top1", "ssr"),
            ]),
            Record::from_pairs(vec![
                ("intro/org_type", "ong_nat"),
                ("bloc_d/d2_underserved", "deplacees"),
                ("bloc_a/a1_service_top1", "ssr"),
            ]),
        ];
        let records = normalize_records(&raw, &Labels::default());
        let scope = build_scope(&records);
        assert_eq!(
            scope.field(SurveyField::UnderservedGroups).labels(),
            vec!["Femmes déplacées", "Femmes en situation de handicap"]
        );
        assert_eq!(
            scope.field(SurveyField::TopService1).get("Services SSR"),
            Some(2)
        );
    }

    #[test]
    fn store_groups_by_org_type() {
        let store = build_store(&records(), None);
        assert_eq!(store.global_total(), 4);
        assert_eq!(store.org_type_labels(), vec!["ONG nationale", "WLO"]);
        let wlo = store.resolve(&ScopeSelector::parse("WLO"));
        assert_eq!(wlo.total_responses, 2);
        assert_eq!(wlo.field(SurveyField::TopService1).get("Santé"), Some(2));
    }
}

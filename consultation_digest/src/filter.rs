use deunicode::deunicode;
use log::debug;
use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::config::*;

/// The records passing every active selection of the filter.
///
/// The organization type and the area are compared exactly with the label
/// columns of the record. The query is a case-insensitive substring search
/// over the whole record, taken as typed: surrounding spaces are part of the
/// searched text, and only the empty query matches everything. The input
/// order is kept; the sort mode of the filter is not applied here (see
/// [sort_records]).
pub fn filter_records(records: &[Record], filter: &FilterState) -> Vec<Record> {
    let query = filter.query.to_lowercase();
    let res: Vec<Record> = records
        .iter()
        .filter(|r| {
            let ok_org =
                !is_active(&filter.org_type) || r.text(columns::ORG_TYPE) == filter.org_type;
            let ok_area = !is_active(&filter.area) || r.text(columns::PROVINCE) == filter.area;
            let ok_query =
                query.is_empty() || r.search_text().to_lowercase().contains(&query);
            ok_org && ok_area && ok_query
        })
        .cloned()
        .collect();
    debug!(
        "filter_records: {} of {} records kept with {:?}",
        res.len(),
        records.len(),
        filter
    );
    res
}

/// A sorted copy of the records. The sort is stable.
///
/// Dates are compared as written (ISO dates sort chronologically).
/// Organization and area names are compared alphabetically: accents and case
/// are ignored first ("Équateur" sorts with the E), and the names as written
/// break the remaining ties. A missing value sorts as the empty string.
pub fn sort_records(records: &[Record], mode: SortMode) -> Vec<Record> {
    let mut res = records.to_vec();
    let key = |r: &Record| -> (String, String) {
        match mode {
            SortMode::DateAsc | SortMode::DateDesc => (r.text(columns::DATE), String::new()),
            SortMode::OrgAsc => collation_key(r.text(columns::ORGANISATION)),
            SortMode::ProvAsc => collation_key(r.text(columns::PROVINCE)),
        }
    };
    res.sort_by(|a, b| {
        let o: Ordering = key(a).cmp(&key(b));
        if mode == SortMode::DateDesc {
            o.reverse()
        } else {
            o
        }
    });
    res
}

/// The accent-folded, lower-cased name, then the name as written.
fn collation_key(name: String) -> (String, String) {
    (deunicode(&name).to_lowercase(), name)
}

/// Filters, then sorts with the sort mode of the filter.
pub fn apply_filters(records: &[Record], filter: &FilterState) -> Vec<Record> {
    sort_records(&filter_records(records, filter), filter.sort)
}

/// The distinct non-empty values of a column, sorted.
/// These are the options of the selectors of the table.
pub fn distinct_values(records: &[Record], column: &str) -> Vec<String> {
    let values: BTreeSet<String> = records
        .iter()
        .map(|r| r.text(column))
        .filter(|v| !v.is_empty())
        .collect();
    values.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, org: &str, org_type: &str, prov: &str, note: &str) -> Record {
        Record::from_pairs(vec![
            (columns::DATE, date),
            (columns::ORGANISATION, org),
            (columns::ORG_TYPE, org_type),
            (columns::PROVINCE, prov),
            ("toc", note),
        ])
    }

    fn records() -> Vec<Record> {
        vec![
            record("2025-03-02", "Mwasi Action", "WLO", "Nord-Kivu", "Cliniques mobiles"),
            record("2025-03-01", "Aide Kasaï", "ONG nationale", "Kasaï", "Référencement"),
            record("2025-03-04", "bureau Ituri", "WLO", "Ituri", "Abris sûrs"),
            record("2025-03-03", "Croix Sud", "ONG internationale", "Nord-Kivu", ""),
        ]
    }

    fn orgs(rs: &[Record]) -> Vec<String> {
        rs.iter().map(|r| r.text(columns::ORGANISATION)).collect()
    }

    #[test]
    fn match_all_returns_input() {
        let rs = records();
        assert_eq!(filter_records(&rs, &FilterState::default()), rs);
        let blank = FilterState {
            org_type: "".to_string(),
            area: "".to_string(),
            query: "".to_string(),
            sort: SortMode::OrgAsc,
        };
        assert_eq!(filter_records(&rs, &blank), rs);
    }

    #[test]
    fn query_spaces_are_searched() {
        let rs = records();
        let f = FilterState {
            query: " kivu".to_string(),
            ..FilterState::default()
        };
        assert!(filter_records(&rs, &f).is_empty());
        let f = FilterState {
            query: " mobiles".to_string(),
            ..FilterState::default()
        };
        assert_eq!(orgs(&filter_records(&rs, &f)), vec!["Mwasi Action"]);
    }

    #[test]
    fn predicates_combine() {
        let rs = records();
        let f = FilterState {
            org_type: "WLO".to_string(),
            area: "Nord-Kivu".to_string(),
            ..FilterState::default()
        };
        assert_eq!(orgs(&filter_records(&rs, &f)), vec!["Mwasi Action"]);
    }

    #[test]
    fn query_is_case_insensitive() {
        let rs = records();
        let f = FilterState {
            query: "ABRIS".to_string(),
            ..FilterState::default()
        };
        assert_eq!(orgs(&filter_records(&rs, &f)), vec!["bureau Ituri"]);
    }

    #[test]
    fn filtering_is_idempotent() {
        let rs = records();
        let f = FilterState {
            query: "kivu".to_string(),
            ..FilterState::default()
        };
        let once = filter_records(&rs, &f);
        let twice = filter_records(&once, &f);
        assert_eq!(once, twice);
        assert!(once.iter().all(|r| rs.contains(r)));
    }

    #[test]
    fn sort_modes() {
        let rs = records();
        assert_eq!(
            orgs(&sort_records(&rs, SortMode::DateDesc)),
            vec!["bureau Ituri", "Croix Sud", "Mwasi Action", "Aide Kasaï"]
        );
        assert_eq!(
            orgs(&sort_records(&rs, SortMode::DateAsc)),
            vec!["Aide Kasaï", "Mwasi Action", "Croix Sud", "bureau Ituri"]
        );
        assert_eq!(
            orgs(&sort_records(&rs, SortMode::OrgAsc)),
            vec!["Aide Kasaï", "bureau Ituri", "Croix Sud", "Mwasi Action"]
        );
        // Ties keep the input order.
        assert_eq!(
            orgs(&sort_records(&rs, SortMode::ProvAsc)),
            vec!["bureau Ituri", "Aide Kasaï", "Mwasi Action", "Croix Sud"]
        );
    }

    #[test]
    fn accented_names_sort_alphabetically() {
        let rs = vec![
            record("2025-03-01", "Zéro Faim", "WLO", "Ituri", ""),
            record("2025-03-02", "Élan Santé", "WLO", "Équateur", ""),
            record("2025-03-03", "espoir", "WLO", "Bas-Uele", ""),
        ];
        let provinces: Vec<String> = sort_records(&rs, SortMode::ProvAsc)
            .iter()
            .map(|r| r.text(columns::PROVINCE))
            .collect();
        assert_eq!(provinces, vec!["Bas-Uele", "Équateur", "Ituri"]);
        assert_eq!(
            orgs(&sort_records(&rs, SortMode::OrgAsc)),
            vec!["Élan Santé", "espoir", "Zéro Faim"]
        );
    }

    #[test]
    fn missing_sort_keys_come_first() {
        let mut rs = records();
        rs.push(Record::from_pairs(vec![(columns::ORGANISATION, "Sans date")]));
        let sorted = sort_records(&rs, SortMode::DateAsc);
        assert_eq!(sorted[0].text(columns::ORGANISATION), "Sans date");
    }

    #[test]
    fn selector_options() {
        let rs = records();
        assert_eq!(
            distinct_values(&rs, columns::ORG_TYPE),
            vec!["ONG internationale", "ONG nationale", "WLO"]
        );
        let mut f = FilterState {
            org_type: "Gouvernement".to_string(),
            area: "Ituri".to_string(),
            ..FilterState::default()
        };
        f.retain_known(
            &distinct_values(&rs, columns::ORG_TYPE),
            &distinct_values(&rs, columns::PROVINCE),
        );
        assert_eq!(f.org_type, ALL_SENTINEL);
        assert_eq!(f.area, "Ituri");
    }
}

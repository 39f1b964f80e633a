use log::{debug, info, warn};

use crate::config::*;
use crate::narrative::{build_narratives, Narratives};
use crate::percent_of;

/// The labels and values of a chart, most frequent first.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<u64>,
}

impl ChartSeries {
    pub fn total(&self) -> u64 {
        self.values.iter().sum()
    }

    /// Each value as a percentage of the series total.
    pub fn percentages(&self) -> Vec<u64> {
        let total = self.total();
        self.values.iter().map(|v| percent_of(*v, total)).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Chart data for a table. Categories without any answer are dropped.
pub fn chart_series(table: &FrequencyTable) -> ChartSeries {
    let mut entries: Vec<(&str, u64)> = table.iter().filter(|(_, c)| *c > 0).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    ChartSeries {
        labels: entries.iter().map(|(l, _)| l.to_string()).collect(),
        values: entries.iter().map(|(_, c)| *c).collect(),
    }
}

/// The key figures shown above the charts.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Kpis {
    pub scope_name: String,
    /// Responses of the whole consultation.
    pub global_total: u64,
    /// Responses of the selected scope.
    pub scope_total: u64,
    /// Number of distinct priority areas cited in the selected scope.
    pub priority_area_count: usize,
}

/// The key figures shown above the record table.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TableKpis {
    pub scope_name: String,
    pub total: usize,
    pub visible: usize,
}

impl TableKpis {
    pub fn new(all: &[Record], filtered: &[Record], filter: &FilterState) -> TableKpis {
        TableKpis {
            scope_name: filter.scope_name().to_string(),
            total: all.len(),
            visible: filtered.len(),
        }
    }
}

/// Identifies one load of the aggregates.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct LoadToken(u64);

/// The state of one dashboard session: the loaded aggregates and the
/// selected scope.
///
/// Loads are numbered. Only the most recently started load may install its
/// aggregates, so a slow load finishing after a newer one is discarded.
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    store: Option<AggregateStore>,
    selector: ScopeSelector,
    last_issued: u64,
}

impl Dashboard {
    pub fn new() -> Dashboard {
        Dashboard::default()
    }

    pub fn with_store(store: AggregateStore) -> Dashboard {
        let mut d = Dashboard::new();
        let token = d.begin_load();
        d.finish_load(token, store);
        d
    }

    pub fn begin_load(&mut self) -> LoadToken {
        self.last_issued += 1;
        debug!("begin_load: issued {:?}", self.last_issued);
        LoadToken(self.last_issued)
    }

    /// Installs the aggregates of a load. Returns false, and drops the
    /// aggregates, when a newer load was started in the meantime.
    pub fn finish_load(&mut self, token: LoadToken, store: AggregateStore) -> bool {
        if token.0 != self.last_issued {
            warn!(
                "finish_load: discarding stale load {:?} (latest: {:?})",
                token.0, self.last_issued
            );
            return false;
        }
        info!(
            "finish_load: load {:?} with {} organization types",
            token.0,
            store.by_org_type.len()
        );
        self.store = Some(store);
        true
    }

    pub fn store(&self) -> Option<&AggregateStore> {
        self.store.as_ref()
    }

    pub fn select(&mut self, selector: ScopeSelector) {
        debug!("select: {:?}", selector);
        self.selector = selector;
    }

    pub fn selector(&self) -> &ScopeSelector {
        &self.selector
    }

    /// The scope of the current selection, once aggregates are loaded.
    pub fn current_scope(&self) -> Option<&AggregateScope> {
        self.store.as_ref().map(|s| s.resolve(&self.selector))
    }

    pub fn kpis(&self) -> Kpis {
        let scope = self.current_scope();
        Kpis {
            scope_name: self.selector.display_name().to_string(),
            global_total: self.store.as_ref().map(|s| s.global_total()).unwrap_or(0),
            scope_total: scope.map(|s| s.total_responses).unwrap_or(0),
            priority_area_count: scope
                .map(|s| s.field(SurveyField::PriorityAreas).len())
                .unwrap_or(0),
        }
    }

    /// Chart data for every registered field of the current scope.
    pub fn charts(&self) -> Vec<(SurveyField, ChartSeries)> {
        SurveyField::ALL
            .iter()
            .map(|f| {
                let series = self
                    .current_scope()
                    .map(|s| chart_series(s.field(*f)))
                    .unwrap_or_default();
                (*f, series)
            })
            .collect()
    }

    pub fn narratives(&self) -> Narratives {
        match self.current_scope() {
            Some(scope) => build_narratives(scope),
            None => build_narratives(&AggregateScope::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> AggregateStore {
        let mut store = AggregateStore {
            total_responses: Some(12),
            summary: AggregateScope::new(12).with_table(
                "priority_areas",
                FrequencyTable::from_entries(vec![("Ituri", 5), ("Nord-Kivu", 4), ("Kasaï", 1)]),
            ),
            ..AggregateStore::default()
        };
        store.by_org_type.insert(
            "ONG".to_string(),
            AggregateScope::new(4).with_table(
                "priority_areas",
                FrequencyTable::from_entries(vec![("Ituri", 2)]),
            ),
        );
        store
    }

    #[test]
    fn kpis_follow_the_scope() {
        let mut d = Dashboard::with_store(store());
        let k = d.kpis();
        assert_eq!(k.scope_name, "Toutes");
        assert_eq!(k.scope_total, 12);
        assert_eq!(k.priority_area_count, 3);

        d.select(ScopeSelector::parse("ONG"));
        let k = d.kpis();
        assert_eq!(k.scope_name, "ONG");
        assert_eq!(k.global_total, 12);
        assert_eq!(k.scope_total, 4);
        assert_eq!(k.priority_area_count, 1);
    }

    #[test]
    fn unknown_scope_falls_back_to_summary() {
        let mut d = Dashboard::with_store(store());
        d.select(ScopeSelector::parse("UnknownLabel"));
        assert_eq!(d.current_scope(), Some(&d.store().unwrap().summary));
        d.select(ScopeSelector::parse("__all__"));
        assert_eq!(d.current_scope(), Some(&d.store().unwrap().summary));
    }

    #[test]
    fn stale_loads_are_discarded() {
        let mut d = Dashboard::new();
        let first = d.begin_load();
        let second = d.begin_load();
        assert!(d.finish_load(second, store()));
        assert!(!d.finish_load(first, AggregateStore::default()));
        assert_eq!(d.kpis().global_total, 12);
    }

    #[test]
    fn nothing_loaded() {
        let d = Dashboard::new();
        assert_eq!(d.kpis().scope_total, 0);
        assert!(d.charts().iter().all(|(_, s)| s.is_empty()));
        assert_eq!(d.narratives().forces.len(), 1);
    }

    #[test]
    fn chart_series_drops_zeros() {
        let t = FrequencyTable::from_entries(vec![("A", 1), ("B", 0), ("C", 3)]);
        let s = chart_series(&t);
        assert_eq!(s.labels, vec!["C", "A"]);
        assert_eq!(s.values, vec![3, 1]);
        assert_eq!(s.percentages(), vec![75, 25]);
    }
}

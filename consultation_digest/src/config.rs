// ********* Input data structures ***********

use log::{debug, warn};
use std::collections::BTreeMap;
use std::fmt::Display;

/// The selector value that stands for "every organization type".
pub const ALL_SENTINEL: &str = "__all__";

/// Display name of the overall scope.
pub const ALL_SCOPE_NAME: &str = "Toutes";

/// A mapping from category label to occurrence count, for one survey field
/// in one scope.
///
/// Labels are unique. Entries keep the order in which they were first added:
/// this order is the tie-break used by the ranking functions.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct FrequencyTable {
    entries: Vec<(String, u64)>,
}

impl FrequencyTable {
    pub const EMPTY: FrequencyTable = FrequencyTable {
        entries: Vec::new(),
    };

    pub fn new() -> FrequencyTable {
        FrequencyTable::EMPTY
    }

    /// Builds a table from (label, count) pairs. Repeated labels are merged
    /// by adding their counts, at the position of the first occurrence.
    pub fn from_entries<I, S>(entries: I) -> FrequencyTable
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let mut table = FrequencyTable::new();
        for (label, count) in entries {
            table.add(label, count);
        }
        table
    }

    pub fn add<S: Into<String>>(&mut self, label: S, count: u64) {
        let label = label.into();
        if let Some(e) = self.entries.iter_mut().find(|(l, _)| *l == label) {
            e.1 += count;
        } else {
            self.entries.push((label, count));
        }
    }

    pub fn get(&self, label: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, c)| *c)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.entries.iter().map(|(l, c)| (l.as_str(), *c))
    }

    pub fn labels(&self) -> Vec<String> {
        self.entries.iter().map(|(l, _)| l.clone()).collect()
    }
}

/// How a survey question was answered.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Selection {
    /// One answer per response. The counts of a table sum to at most the
    /// number of responses.
    Single,
    /// Any number of answers per response. The counts may sum to more than
    /// the number of responses.
    Multiple,
}

/// How a ranked entry of a field is quoted in the narratives.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Denominator {
    /// Percentage of the responses of the scope.
    Responses,
    /// Percentage of all the mentions recorded in the table itself.
    Mentions,
    /// No percentage: the raw number of mentions.
    Count,
}

/// The survey fields known to the dashboard.
///
/// Each field has a key in the aggregate document, a label column in the
/// records, a selection kind and the denominator rule used to quote it.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum SurveyField {
    OrgTypes,
    Clusters,
    ProvinceBase,
    OtherProvinces,
    TopService1,
    TopService2,
    TopService3,
    ReferralGravity,
    RestoreTime,
    Approaches,
    Additionality,
    InnovationLevel,
    ObstaclesWlo,
    GovernanceMechanisms,
    CapacityNeeds,
    PriorityAreas,
    UnderservedGroups,
    AccountabilityMechanisms,
    FeedbackChannel,
    OperationalRisks,
    FundsLeverage,
    CriticalNeed,
    DigitalAdvantages,
    DigitalLimits,
    UnSupport,
}

impl SurveyField {
    pub const ALL: [SurveyField; 25] = [
        SurveyField::OrgTypes,
        SurveyField::Clusters,
        SurveyField::ProvinceBase,
        SurveyField::OtherProvinces,
        SurveyField::TopService1,
        SurveyField::TopService2,
        SurveyField::TopService3,
        SurveyField::ReferralGravity,
        SurveyField::RestoreTime,
        SurveyField::Approaches,
        SurveyField::Additionality,
        SurveyField::InnovationLevel,
        SurveyField::ObstaclesWlo,
        SurveyField::GovernanceMechanisms,
        SurveyField::CapacityNeeds,
        SurveyField::PriorityAreas,
        SurveyField::UnderservedGroups,
        SurveyField::AccountabilityMechanisms,
        SurveyField::FeedbackChannel,
        SurveyField::OperationalRisks,
        SurveyField::FundsLeverage,
        SurveyField::CriticalNeed,
        SurveyField::DigitalAdvantages,
        SurveyField::DigitalLimits,
        SurveyField::UnSupport,
    ];

    /// The key of the frequency table in the aggregate document.
    pub fn key(&self) -> &'static str {
        match self {
            SurveyField::OrgTypes => "org_types",
            SurveyField::Clusters => "clusters",
            SurveyField::ProvinceBase => "province_base",
            SurveyField::OtherProvinces => "other_provinces",
            SurveyField::TopService1 => "top_service_1",
            SurveyField::TopService2 => "top_service_2",
            SurveyField::TopService3 => "top_service_3",
            SurveyField::ReferralGravity => "referral_gravity",
            SurveyField::RestoreTime => "restore_time",
            SurveyField::Approaches => "approaches",
            SurveyField::Additionality => "additionality",
            SurveyField::InnovationLevel => "innovation_level",
            SurveyField::ObstaclesWlo => "obstacles_wlo",
            SurveyField::GovernanceMechanisms => "governance_mechanisms",
            SurveyField::CapacityNeeds => "capacity_needs",
            SurveyField::PriorityAreas => "priority_areas",
            SurveyField::UnderservedGroups => "underserved_groups",
            SurveyField::AccountabilityMechanisms => "accountability_mechanisms",
            SurveyField::FeedbackChannel => "feedback_channel",
            SurveyField::OperationalRisks => "operational_risks",
            SurveyField::FundsLeverage => "funds_leverage",
            SurveyField::CriticalNeed => "critical_need",
            SurveyField::DigitalAdvantages => "digital_advantages",
            SurveyField::DigitalLimits => "digital_limits",
            SurveyField::UnSupport => "un_support",
        }
    }

    /// The record column holding the human-readable answer.
    pub fn source_column(&self) -> &'static str {
        match self {
            SurveyField::OrgTypes => columns::ORG_TYPE,
            SurveyField::Clusters => "cluster_label",
            SurveyField::ProvinceBase => columns::PROVINCE,
            SurveyField::OtherProvinces => "other_provinces_label",
            SurveyField::TopService1 => "service_top1_label",
            SurveyField::TopService2 => "service_top2_label",
            SurveyField::TopService3 => "service_top3_label",
            SurveyField::ReferralGravity => "referral_gravity_label",
            SurveyField::RestoreTime => "restore_time_label",
            SurveyField::Approaches => "approaches_label",
            SurveyField::Additionality => "additionality_label",
            SurveyField::InnovationLevel => "innovation_level_label",
            SurveyField::ObstaclesWlo => "obstacles_label",
            SurveyField::GovernanceMechanisms => "governance_label",
            SurveyField::CapacityNeeds => "capacity_label",
            SurveyField::PriorityAreas => "priority_areas_label",
            SurveyField::UnderservedGroups => "underserved_label",
            SurveyField::AccountabilityMechanisms => "meca_label",
            SurveyField::FeedbackChannel => "feedback_channel_label",
            SurveyField::OperationalRisks => "risks_label",
            SurveyField::FundsLeverage => "funds_label",
            SurveyField::CriticalNeed => "critical_need_label",
            SurveyField::DigitalAdvantages => "digital_adv_label",
            SurveyField::DigitalLimits => "digital_lim_label",
            SurveyField::UnSupport => "un_support_label",
        }
    }

    pub fn selection(&self) -> Selection {
        match self {
            SurveyField::OrgTypes
            | SurveyField::Clusters
            | SurveyField::ProvinceBase
            | SurveyField::TopService1
            | SurveyField::TopService2
            | SurveyField::TopService3
            | SurveyField::ReferralGravity
            | SurveyField::RestoreTime
            | SurveyField::InnovationLevel
            | SurveyField::FeedbackChannel
            | SurveyField::CriticalNeed => Selection::Single,
            _ => Selection::Multiple,
        }
    }

    /// The denominator rule used when the field is quoted in a narrative.
    ///
    /// Clusters are answered once per response but the answer often lists
    /// several domains, so they are quoted as mentions.
    pub fn denominator(&self) -> Denominator {
        match self {
            SurveyField::ReferralGravity => Denominator::Mentions,
            SurveyField::Clusters => Denominator::Count,
            f if f.selection() == Selection::Single => Denominator::Responses,
            _ => Denominator::Count,
        }
    }

    pub fn from_key(key: &str) -> Option<SurveyField> {
        SurveyField::ALL.iter().find(|f| f.key() == key).cloned()
    }
}

impl Display for SurveyField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// The aggregates of one set of responses: the whole consultation, or the
/// responses of one organization type.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct AggregateScope {
    pub total_responses: u64,
    tables: BTreeMap<String, FrequencyTable>,
}

impl AggregateScope {
    pub fn new(total_responses: u64) -> AggregateScope {
        AggregateScope {
            total_responses,
            tables: BTreeMap::new(),
        }
    }

    pub fn with_table(mut self, key: &str, table: FrequencyTable) -> AggregateScope {
        self.insert_table(key, table);
        self
    }

    pub fn insert_table(&mut self, key: &str, table: FrequencyTable) {
        self.tables.insert(key.to_string(), table);
    }

    /// The table stored under this key. A missing table reads as empty.
    pub fn table(&self, key: &str) -> &FrequencyTable {
        self.tables.get(key).unwrap_or(&EMPTY_TABLE)
    }

    pub fn field(&self, field: SurveyField) -> &FrequencyTable {
        self.table(field.key())
    }

    pub fn tables(&self) -> impl Iterator<Item = (&str, &FrequencyTable)> + '_ {
        self.tables.iter().map(|(k, t)| (k.as_str(), t))
    }
}

static EMPTY_TABLE: FrequencyTable = FrequencyTable::EMPTY;

/// Which scope a view summarizes.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Default)]
pub enum ScopeSelector {
    #[default]
    All,
    OrgType(String),
}

impl ScopeSelector {
    /// The sentinel and the empty string both select every response.
    pub fn parse(s: &str) -> ScopeSelector {
        if s.is_empty() || s == ALL_SENTINEL {
            ScopeSelector::All
        } else {
            ScopeSelector::OrgType(s.to_string())
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            ScopeSelector::All => ALL_SCOPE_NAME,
            ScopeSelector::OrgType(s) => s.as_str(),
        }
    }
}

/// All the aggregates of a consultation: the summary scope and one scope per
/// organization type.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct AggregateStore {
    /// Top-level response count, when the document provides one.
    pub total_responses: Option<u64>,
    pub generated_at: Option<String>,
    pub summary: AggregateScope,
    pub by_org_type: BTreeMap<String, AggregateScope>,
}

impl AggregateStore {
    /// The scope matching the selector.
    ///
    /// An organization type that is not registered falls back to the summary
    /// scope. This never fails.
    pub fn resolve(&self, selector: &ScopeSelector) -> &AggregateScope {
        match selector {
            ScopeSelector::All => &self.summary,
            ScopeSelector::OrgType(label) => match self.by_org_type.get(label) {
                Some(scope) => {
                    debug!("resolve: scope {:?} found", label);
                    scope
                }
                None => {
                    warn!(
                        "resolve: no scope registered for {:?}, using the summary",
                        label
                    );
                    &self.summary
                }
            },
        }
    }

    /// The number of responses of the whole consultation.
    pub fn global_total(&self) -> u64 {
        self.total_responses
            .unwrap_or(self.summary.total_responses)
    }

    /// The registered organization types, in sorted order.
    pub fn org_type_labels(&self) -> Vec<String> {
        self.by_org_type
            .keys()
            .filter(|k| !k.is_empty())
            .cloned()
            .collect()
    }
}

/// A scalar value in a survey record.
#[derive(PartialEq, Debug, Clone)]
pub enum FieldValue {
    Null,
    Text(String),
    Number(f64),
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> FieldValue {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> FieldValue {
        FieldValue::Text(s)
    }
}

/// One survey response: an ordered list of named scalar values.
///
/// The order of the fields is the order of the source document. Records
/// have no identity besides their position in a list.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Record {
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    pub fn new() -> Record {
        Record { fields: Vec::new() }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Record
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldValue>,
    {
        let mut r = Record::new();
        for (k, v) in pairs {
            r.set(k, v);
        }
        r
    }

    /// Sets a field, keeping the position of an existing field of the same name.
    pub fn set<K: Into<String>, V: Into<FieldValue>>(&mut self, name: K, value: V) {
        let name = name.into();
        let value = value.into();
        if let Some(e) = self.fields.iter_mut().find(|(n, _)| *n == name) {
            e.1 = value;
        } else {
            self.fields.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// The value of a field as text. Missing and null fields read as "".
    pub fn text(&self, name: &str) -> String {
        self.get(name).map(|v| v.to_string()).unwrap_or_default()
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> + '_ {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The whole record as one string: every field name and value.
    /// The free-text search runs against this string.
    pub fn search_text(&self) -> String {
        self.fields
            .iter()
            .map(|(n, v)| format!("{}: {}", n, v))
            .collect::<Vec<String>>()
            .join("\n")
    }
}

/// The record columns used by the table filters and sort modes.
pub mod columns {
    pub const DATE: &str = "date_interview";
    pub const ORGANISATION: &str = "organisation";
    pub const ORG_TYPE: &str = "org_type_label";
    pub const PROVINCE: &str = "province_label";
}

// ******** Output data structures *********

/// A (label, count) pair taken from a ranking, with its percentage when a
/// denominator applies.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RankedEntry {
    pub label: String,
    pub count: u64,
    pub percent: Option<u64>,
}

impl Display for RankedEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.percent {
            Some(p) => write!(f, "{} ({}%)", self.label, p),
            None => write!(f, "{} ({} mentions)", self.label, self.count),
        }
    }
}

// ********* Table view configuration **********

/// The order of the record table.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Default)]
pub enum SortMode {
    DateAsc,
    #[default]
    DateDesc,
    OrgAsc,
    ProvAsc,
}

impl SortMode {
    pub fn parse(s: &str) -> Option<SortMode> {
        match s {
            "date_asc" => Some(SortMode::DateAsc),
            "date_desc" => Some(SortMode::DateDesc),
            "org_asc" => Some(SortMode::OrgAsc),
            "prov_asc" => Some(SortMode::ProvAsc),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            SortMode::DateAsc => "date_asc",
            SortMode::DateDesc => "date_desc",
            SortMode::OrgAsc => "org_asc",
            SortMode::ProvAsc => "prov_asc",
        }
    }
}

/// The current selections of the record table.
///
/// A selection equal to the sentinel or empty matches every record.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct FilterState {
    pub org_type: String,
    pub area: String,
    pub query: String,
    pub sort: SortMode,
}

impl Default for FilterState {
    fn default() -> FilterState {
        FilterState {
            org_type: ALL_SENTINEL.to_string(),
            area: ALL_SENTINEL.to_string(),
            query: String::new(),
            sort: SortMode::default(),
        }
    }
}

impl FilterState {
    /// Resets the selections that are not among the available options.
    pub fn retain_known(&mut self, org_types: &[String], areas: &[String]) {
        if is_active(&self.org_type) && !org_types.contains(&self.org_type) {
            debug!("retain_known: resetting org type {:?}", self.org_type);
            self.org_type = ALL_SENTINEL.to_string();
        }
        if is_active(&self.area) && !areas.contains(&self.area) {
            debug!("retain_known: resetting area {:?}", self.area);
            self.area = ALL_SENTINEL.to_string();
        }
    }

    pub fn scope_name(&self) -> &str {
        if is_active(&self.org_type) {
            self.org_type.as_str()
        } else {
            ALL_SCOPE_NAME
        }
    }
}

/// False for the values that match everything.
pub fn is_active(selection: &str) -> bool {
    !selection.is_empty() && selection != ALL_SENTINEL
}

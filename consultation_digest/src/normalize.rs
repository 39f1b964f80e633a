//! Cleaning of raw survey exports into the canonical record columns.
//!
//! The same column may come from a clean records document
//! (`org_type_label`) or from a raw export of the survey tool, where
//! questions are prefixed by their group (`intro/org_type`). Each canonical
//! column lists its accepted sources, in order of preference.

use log::debug;
use std::collections::BTreeMap;

use crate::aggregate::split_multi;
use crate::config::*;

const SOURCES: &[(&str, &[&str])] = &[
    (columns::DATE, &["date_interview", "intro/date_interview", "start"]),
    (columns::ORGANISATION, &["organisation", "intro/organisation", "org_name"]),
    (columns::ORG_TYPE, &["org_type_label", "intro/org_type", "org_type"]),
    ("cluster_label", &["cluster_label", "intro/cluster"]),
    (columns::PROVINCE, &["province_label", "intro/province", "province_base"]),
    ("admin2", &["admin2", "intro/admin2", "territoire_base"]),
    ("other_provinces_label", &["other_provinces_label", "intro/other_provinces"]),
    ("consent_label", &["consent_label", "intro/consent"]),
    (
        "service_top1_label",
        &["service_top1_label", "bloc_a/a1_service_top1", "bloc_a/service_top1"],
    ),
    (
        "service_top2_label",
        &["service_top2_label", "bloc_a/a1_service_top2", "bloc_a/service_top2"],
    ),
    (
        "service_top3_label",
        &["service_top3_label", "bloc_a/a1_service_top3", "bloc_a/service_top3"],
    ),
    ("a1_where", &["a1_where", "bloc_a/a1_where"]),
    ("a2_where", &["a2_where", "bloc_a/a2_where"]),
    (
        "referral_gravity_label",
        &["referral_gravity_label", "bloc_a/a2_gravity", "bloc_a/rupture_gravite"],
    ),
    ("restore_time_label", &["restore_time_label", "bloc_a/a3_restore_time"]),
    ("approaches_label", &["approaches_label", "bloc_a/a4_approaches"]),
    ("additionality_label", &["additionality_label", "bloc_b/b1_additionality"]),
    ("b1_explain", &["b1_explain", "bloc_b/b1_explain"]),
    ("innovation_level_label", &["innovation_level_label", "bloc_b/b2_innovation"]),
    ("b2_explain", &["b2_explain", "bloc_b/b2_explain"]),
    ("toc", &["toc", "bloc_b/b3_toc"]),
    ("obstacles_label", &["obstacles_label", "bloc_c/c1_obstacles", "bloc_c/obstacles_wlo"]),
    ("c1_solutions", &["c1_solutions", "bloc_c/c1_solutions", "bloc_c/solutions_wlo"]),
    ("governance_label", &["governance_label", "bloc_c/c2_governance"]),
    ("capacity_label", &["capacity_label", "bloc_c/c3_capacity"]),
    ("c4_coordination", &["c4_coordination", "bloc_c/c4_coordination"]),
    (
        "priority_areas_label",
        &["priority_areas_label", "bloc_d/d1_priority_areas", "bloc_d/provinces_prioritaires"],
    ),
    (
        "underserved_label",
        &["underserved_label", "bloc_d/d2_underserved", "bloc_d/groupes_sous_servis"],
    ),
    ("saddd", &["saddd", "bloc_d/d3_saddd"]),
    ("meca_label", &["meca_label", "bloc_d/d4_meca"]),
    (
        "feedback_channel_label",
        &["feedback_channel_label", "bloc_d/d5_feedback_channel", "bloc_d/mecanisme_feedback"],
    ),
    ("trust_plus", &["trust_plus", "bloc_d/d6_trust_plus"]),
    ("trust_minus", &["trust_minus", "bloc_d/d7_trust_minus"]),
    ("risks_label", &["risks_label", "bloc_e/e1_risks", "bloc_e/risques_operationnels"]),
    ("e1_mitigation", &["e1_mitigation", "bloc_e/e1_mitigation", "bloc_e/mesures_mitigation"]),
    ("funds_label", &["funds_label", "bloc_e/e2_funds"]),
    ("e3_results", &["e3_results", "bloc_e/e3_results"]),
    ("critical_need_label", &["critical_need_label", "bloc_e/e4_critical_need"]),
    (
        "digital_adv_label",
        &["digital_adv_label", "bloc_f/f1_digital_adv", "bloc_f/avantages_digital"],
    ),
    (
        "digital_lim_label",
        &["digital_lim_label", "bloc_f/f2_digital_lim", "bloc_f/limites_digital"],
    ),
    ("f1_strengthen", &["f1_strengthen", "bloc_f/f3_strengthen"]),
    ("un_support_label", &["un_support_label", "bloc_f/f4_un_support"]),
    ("f2_details", &["f2_details", "bloc_f/f5_details"]),
];

/// The code to label dictionary of one answer domain.
pub type Dictionary = BTreeMap<String, String>;

/// The labelled columns, with the domain of their codes.
const LABELLED: &[(&str, &str, Selection)] = &[
    ("consent_label", "consent", Selection::Single),
    ("service_top1_label", "service", Selection::Single),
    ("service_top2_label", "service", Selection::Single),
    ("service_top3_label", "service", Selection::Single),
    ("referral_gravity_label", "gravite", Selection::Single),
    ("obstacles_label", "obstacles_wlo", Selection::Multiple),
    ("priority_areas_label", "province", Selection::Multiple),
    ("underserved_label", "groupes", Selection::Multiple),
    ("risks_label", "risque", Selection::Multiple),
    ("digital_adv_label", "digital_adv", Selection::Multiple),
    ("digital_lim_label", "digital_lim", Selection::Multiple),
];

/// Code to label dictionaries of the survey form, one per answer domain
/// (`org_type`, `province`, `service`, `groupes`...).
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Labels {
    domains: BTreeMap<String, Dictionary>,
}

fn dictionary(pairs: &[(&str, &str)]) -> Dictionary {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl Default for Labels {
    fn default() -> Labels {
        let domains: Vec<(&str, Dictionary)> = vec![
            (
                "org_type",
                dictionary(&[
                    ("wlo", "Organisation conduite par des femmes"),
                    ("ong_nat", "ONG nationale"),
                    ("ong_int", "ONG internationale"),
                    ("agence_onu", "Agence des Nations Unies"),
                    ("gouvernement", "Gouvernement / Autorité"),
                    ("autre", "Autre"),
                ]),
            ),
            (
                "province",
                dictionary(&[
                    ("bas_uele", "Bas-Uele"),
                    ("equateur", "Équateur"),
                    ("haut_katanga", "Haut-Katanga"),
                    ("haut_lomami", "Haut-Lomami"),
                    ("haut_uele", "Haut-Uele"),
                    ("ituri", "Ituri"),
                    ("kasai", "Kasaï"),
                    ("kasai_central", "Kasaï-Central"),
                    ("kasai_oriental", "Kasaï-Oriental"),
                    ("kinshasa", "Kinshasa"),
                    ("kongo_central", "Kongo Central"),
                    ("kwango", "Kwango"),
                    ("kwilu", "Kwilu"),
                    ("lomami", "Lomami"),
                    ("lualaba", "Lualaba"),
                    ("mai_ndombe", "Mai-Ndombe"),
                    ("maniema", "Maniema"),
                    ("mongala", "Mongala"),
                    ("nord_kivu", "Nord-Kivu"),
                    ("nord_ubangi", "Nord-Ubangi"),
                    ("sankuru", "Sankuru"),
                    ("sud_kivu", "Sud-Kivu"),
                    ("sud_ubangi", "Sud-Ubangi"),
                    ("tanganyika", "Tanganyika"),
                    ("tshopo", "Tshopo"),
                    ("tshuapa", "Tshuapa"),
                ]),
            ),
            (
                "service",
                dictionary(&[
                    ("ssr", "Services SSR"),
                    ("clinique_72h", "Prise en charge clinique <72h"),
                    ("mhpss", "Soutien psychosocial"),
                    ("juridique", "Assistance juridique"),
                    ("abri", "Hébergement sécurisé"),
                ]),
            ),
            (
                "gravite",
                dictionary(&[
                    ("faible", "Faible"),
                    ("moderee", "Modérée"),
                    ("elevee", "Élevée"),
                    ("critique", "Critique"),
                ]),
            ),
            ("consent", dictionary(&[("yes", "Oui"), ("no", "Non")])),
            (
                "groupes",
                dictionary(&[
                    ("adolescentes_10_14", "Adolescentes 10–14 ans"),
                    ("adolescentes_15_19", "Adolescentes 15–19 ans"),
                    ("deplacees", "Femmes déplacées"),
                    ("cheffes_menage", "Femmes cheffes de ménage"),
                    ("handicap", "Femmes en situation de handicap"),
                    ("survivantes_vbg", "Survivantes de VBG"),
                    ("autre", "Autre"),
                ]),
            ),
            (
                "risque",
                dictionary(&[
                    ("insecurite", "Insécurité"),
                    ("acces_limite", "Accès humanitaire limité"),
                    ("ressources_humaines", "Manque de ressources humaines"),
                    ("approvisionnement", "Rupture chaîne d’approvisionnement"),
                    ("donnees", "Risques liés aux données / confidentialité"),
                    ("autre", "Autre"),
                ]),
            ),
            (
                "digital_adv",
                dictionary(&[
                    ("rapidite", "Suivi plus rapide"),
                    ("transparence", "Transparence accrue"),
                    ("donnees_desag", "Données désagrégées plus rapidement"),
                    ("meilleur_ciblage", "Meilleur ciblage"),
                    ("autre", "Autre"),
                ]),
            ),
            (
                "digital_lim",
                dictionary(&[
                    ("connectivite", "Coupures réseau / électricité"),
                    ("confidentialite", "Confidentialité"),
                    ("exclusion", "Exclusion numérique"),
                    ("cout", "Coûts de maintenance"),
                    ("autre", "Autre"),
                ]),
            ),
            (
                "obstacles_wlo",
                dictionary(&[
                    ("administratif", "Contraintes administratives"),
                    ("fiduciaire", "Contraintes fiduciaires"),
                    ("securite", "Problèmes de sécurité"),
                    ("acces_info", "Accès limité à l’information"),
                    ("capacite", "Capacités organisationnelles limitées"),
                    ("autre", "Autre"),
                ]),
            ),
        ];
        Labels {
            domains: domains
                .into_iter()
                .map(|(name, dict)| (name.to_string(), dict))
                .collect(),
        }
    }
}

impl Labels {
    /// Adds the entries of `overrides` to the dictionaries, replacing the
    /// labels of codes already known. Unknown domains are added as they are.
    pub fn with_overrides(mut self, overrides: BTreeMap<String, Dictionary>) -> Labels {
        for (domain, dict) in overrides.into_iter() {
            debug!("with_overrides: {}: {} labels", domain, dict.len());
            self.domains.entry(domain).or_default().extend(dict);
        }
        self
    }

    pub fn dictionary(&self, domain: &str) -> Option<&Dictionary> {
        self.domains.get(domain)
    }

    pub fn domain_names(&self) -> Vec<&str> {
        self.domains.keys().map(|k| k.as_str()).collect()
    }

    /// The label of a code. Unknown codes and domains give `None`.
    pub fn label(&self, domain: &str, code: &str) -> Option<&String> {
        self.domains.get(domain).and_then(|d| d.get(code))
    }

    /// The label of a code, or the value itself when it is not a known
    /// code (it is then most likely already a label).
    pub fn label_or_keep(&self, domain: &str, value: &str) -> String {
        self.label(domain, value)
            .cloned()
            .unwrap_or_else(|| value.to_string())
    }

    /// Labels every part of a multi-select answer, joined with ", ".
    ///
    /// Codes from the survey tool are space-separated (`deplacees handicap`).
    /// Answers with commas or semicolons are split on those. Any other text
    /// with spaces is a single label and is labelled as a whole.
    pub fn label_multi(&self, domain: &str, value: &str) -> String {
        let s = value.trim();
        let separated = s.contains(',') || s.contains(';');
        if !separated && !s.split_whitespace().all(is_code) {
            return self.label_or_keep(domain, s);
        }
        split_multi(s)
            .iter()
            .map(|part| self.label_or_keep(domain, part))
            .collect::<Vec<String>>()
            .join(", ")
    }
}

// The codes of the survey form are lower-case identifiers.
fn is_code(token: &str) -> bool {
    token
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Maps the many spellings of an organization type to its label.
/// Unknown values are kept as they are.
pub fn normalize_org_type(raw: &str, labels: &Labels) -> String {
    let s = raw.trim();
    if s.is_empty() {
        return String::new();
    }
    let low = s.to_lowercase();
    let known: Option<&String> = match low.as_str() {
        "nngo" | "ong_nationale" | "ong nationale" | "ong nat" | "national ngo" => {
            labels.label("org_type", "ong_nat")
        }
        "ingo" | "ong_internationale" | "ong internationale" | "international ngo" => {
            labels.label("org_type", "ong_int")
        }
        l if l.contains("wlo") || l.contains("organisation conduite par des femmes") => {
            labels.label("org_type", "wlo")
        }
        l if l.contains("agence") && (l.contains("onu") || l.contains("nations unies")) => {
            labels.label("org_type", "agence_onu")
        }
        l if l.contains("gouvern") || l.contains("autorité") => {
            labels.label("org_type", "gouvernement")
        }
        l => labels.label("org_type", l),
    };
    known.cloned().unwrap_or_else(|| s.to_string())
}

/// Maps a province code or a loosely written province name to its label.
/// Unknown values are kept as they are.
pub fn normalize_province(raw: &str, labels: &Labels) -> String {
    let s = raw.trim();
    if s.is_empty() {
        return String::new();
    }
    let provinces = match labels.dictionary("province") {
        Some(d) => d,
        None => return s.to_string(),
    };
    if provinces.values().any(|v| v == s) {
        return s.to_string();
    }
    let code = s.to_lowercase().replace(['-', ' '], "_");
    if let Some(l) = provinces.get(&code) {
        return l.clone();
    }
    let stripped: String = code
        .chars()
        .filter(|c| c.is_ascii_lowercase() || *c == '_')
        .collect();
    provinces
        .get(&stripped)
        .cloned()
        .unwrap_or_else(|| s.to_string())
}

fn first_present(raw: &Record, sources: &[&str]) -> String {
    sources
        .iter()
        .map(|name| raw.text(name).trim().to_string())
        .find(|v| !v.is_empty())
        .unwrap_or_default()
}

/// Rewrites a raw record with the canonical columns, in canonical order.
pub fn normalize_record(raw: &Record, labels: &Labels) -> Record {
    let mut res = Record::new();
    for (column, sources) in SOURCES.iter() {
        let value = first_present(raw, sources);
        let value: String = match *column {
            columns::DATE => value.chars().take(10).collect(),
            columns::ORG_TYPE => normalize_org_type(&value, labels),
            columns::PROVINCE => normalize_province(&value, labels),
            c => match LABELLED.iter().find(|(name, _, _)| *name == c) {
                Some((_, domain, Selection::Single)) => labels.label_or_keep(domain, &value),
                Some((_, domain, Selection::Multiple)) => labels.label_multi(domain, &value),
                None => value,
            },
        };
        res.set(*column, value);
    }
    res
}

pub fn normalize_records(raw: &[Record], labels: &Labels) -> Vec<Record> {
    let res: Vec<Record> = raw.iter().map(|r| normalize_record(r, labels)).collect();
    debug!("normalize_records: {} records", res.len());
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn org_type_variants() {
        let l = Labels::default();
        assert_eq!(normalize_org_type("nngo", &l), "ONG nationale");
        assert_eq!(normalize_org_type(" INGO ", &l), "ONG internationale");
        assert_eq!(
            normalize_org_type("Organisation conduite par des femmes (WLO)", &l),
            "Organisation conduite par des femmes"
        );
        assert_eq!(
            normalize_org_type("Agence des Nations Unies", &l),
            "Agence des Nations Unies"
        );
        assert_eq!(
            normalize_org_type("Autorité provinciale", &l),
            "Gouvernement / Autorité"
        );
        assert_eq!(normalize_org_type("autre", &l), "Autre");
        assert_eq!(normalize_org_type("Coopérative", &l), "Coopérative");
        assert_eq!(normalize_org_type("", &l), "");
    }

    #[test]
    fn province_variants() {
        let l = Labels::default();
        assert_eq!(normalize_province("Nord-Kivu", &l), "Nord-Kivu");
        assert_eq!(normalize_province("nord_kivu", &l), "Nord-Kivu");
        assert_eq!(normalize_province("Sud Kivu", &l), "Sud-Kivu");
        assert_eq!(normalize_province("kasai-central", &l), "Kasaï-Central");
        assert_eq!(normalize_province("Atlantide", &l), "Atlantide");
    }

    #[test]
    fn raw_export_to_canonical() {
        let raw = Record::from_pairs(vec![
            ("start", FieldValue::from("2025-02-11T09:30:00.000+01:00")),
            ("intro/organisation", FieldValue::from("  Mwasi Action ")),
            ("intro/org_type", FieldValue::from("wlo")),
            ("intro/province", FieldValue::from("sud_kivu")),
            ("bloc_a/a1_service_top1", FieldValue::from("Santé")),
            ("_id", FieldValue::Number(42.0)),
        ]);
        let r = normalize_record(&raw, &Labels::default());
        assert_eq!(r.text(columns::DATE), "2025-02-11");
        assert_eq!(r.text(columns::ORGANISATION), "Mwasi Action");
        assert_eq!(r.text(columns::ORG_TYPE), "Organisation conduite par des femmes");
        assert_eq!(r.text(columns::PROVINCE), "Sud-Kivu");
        assert_eq!(r.text("service_top1_label"), "Santé");
        assert_eq!(r.get("_id"), None);
        assert_eq!(r.len(), SOURCES.len());
        assert_eq!(r.field_names()[0], columns::DATE);
    }

    #[test]
    fn coded_answers_get_labels() {
        let raw = Record::from_pairs(vec![
            ("intro/consent", "yes"),
            ("bloc_a/a1_service_top1", "ssr"),
            ("bloc_a/a1_service_top2", "clinique_72h"),
            ("bloc_a/a2_gravity", "elevee"),
            ("bloc_d/d2_underserved", "deplacees handicap"),
            ("bloc_e/e1_risks", "insecurite donnees"),
            ("bloc_f/f1_digital_adv", "rapidite"),
            ("bloc_f/f2_digital_lim", "cout connectivite"),
            ("bloc_c/c1_obstacles", "fiduciaire"),
            ("bloc_d/d1_priority_areas", "nord_kivu ituri"),
        ]);
        let r = normalize_record(&raw, &Labels::default());
        assert_eq!(r.text("consent_label"), "Oui");
        assert_eq!(r.text("service_top1_label"), "Services SSR");
        assert_eq!(r.text("service_top2_label"), "Prise en charge clinique <72h");
        assert_eq!(r.text("referral_gravity_label"), "Élevée");
        assert_eq!(
            r.text("underserved_label"),
            "Femmes déplacées, Femmes en situation de handicap"
        );
        assert_eq!(
            r.text("risks_label"),
            "Insécurité, Risques liés aux données / confidentialité"
        );
        assert_eq!(r.text("digital_adv_label"), "Suivi plus rapide");
        assert_eq!(
            r.text("digital_lim_label"),
            "Coûts de maintenance, Coupures réseau / électricité"
        );
        assert_eq!(r.text("obstacles_label"), "Contraintes fiduciaires");
        assert_eq!(r.text("priority_areas_label"), "Nord-Kivu, Ituri");
    }

    #[test]
    fn multi_select_labels() {
        let l = Labels::default();
        assert_eq!(l.label_multi("groupes", "deplacees inconnu"), "Femmes déplacées, inconnu");
        assert_eq!(l.label_multi("groupes", "Femmes déplacées"), "Femmes déplacées");
        assert_eq!(
            l.label_multi("groupes", "Femmes déplacées; survivantes_vbg"),
            "Femmes déplacées, Survivantes de VBG"
        );
        assert_eq!(l.label_multi("groupes", "  "), "");
        assert_eq!(l.label_multi("absent", "deplacees"), "deplacees");
        assert_eq!(l.label_or_keep("service", "Santé"), "Santé");
    }

    #[test]
    fn overrides_extend_dictionaries() {
        let mut overrides: BTreeMap<String, Dictionary> = BTreeMap::new();
        overrides.insert(
            "service".to_string(),
            dictionary(&[("ssr", "Santé sexuelle et reproductive"), ("cash", "Transferts")]),
        );
        overrides.insert("cluster".to_string(), dictionary(&[("wash", "EHA")]));
        let l = Labels::default().with_overrides(overrides);
        assert_eq!(l.label_or_keep("service", "ssr"), "Santé sexuelle et reproductive");
        assert_eq!(l.label_or_keep("service", "cash"), "Transferts");
        assert_eq!(l.label_or_keep("service", "mhpss"), "Soutien psychosocial");
        assert_eq!(l.label_or_keep("cluster", "wash"), "EHA");
        assert!(l.domain_names().contains(&"obstacles_wlo"));
    }

    #[test]
    fn clean_records_are_stable() {
        let l = Labels::default();
        let raw = Record::from_pairs(vec![
            (columns::ORG_TYPE, "ONG nationale"),
            (columns::PROVINCE, "Ituri"),
            ("underserved_label", "Femmes déplacées, Survivantes de VBG"),
            ("service_top1_label", "Services SSR"),
        ]);
        let once = normalize_record(&raw, &l);
        assert_eq!(normalize_record(&once, &l), once);
    }
}

// Text and JSON renderings of the views.

use consultation_digest::narrative::PLACEHOLDER;
use serde_json::json;
use serde_json::Map as JSMap;

use crate::digest::*;

/// The columns of the record table, with their headers.
const TABLE_COLUMNS: &[(&str, &str)] = &[
    ("date_interview", "Date"),
    ("organisation", "Organisation"),
    ("org_type_label", "Type org."),
    ("cluster_label", "Clusters"),
    ("province_label", "Province (base)"),
    ("admin2", "Territoire/adm2"),
    ("other_provinces_label", "Autres provinces"),
    ("service_top1_label", "Top1 service"),
    ("service_top2_label", "Top2 service"),
    ("service_top3_label", "Top3 service"),
    ("referral_gravity_label", "Gravité rupture"),
    ("restore_time_label", "Délai rétablissement"),
    ("approaches_label", "Approches efficaces"),
    ("additionality_label", "Additionalité (axes)"),
    ("innovation_level_label", "Niveau innovation"),
    ("obstacles_label", "Obstacles WLO"),
    ("governance_label", "Gouvernance"),
    ("capacity_label", "Besoins capacités"),
    ("priority_areas_label", "Zones prioritaires"),
    ("underserved_label", "Groupes sous-desservis"),
    ("meca_label", "Mécanismes AAP"),
    ("feedback_channel_label", "Canal feedback"),
    ("risks_label", "Risques opérationnels"),
    ("funds_label", "Fonds à articuler"),
    ("critical_need_label", "Besoin critique"),
    ("digital_adv_label", "Avantages digital"),
    ("digital_lim_label", "Limites digital"),
    ("un_support_label", "Appui UN attendu"),
    ("a1_where", "Où (service)"),
    ("a2_where", "Où (référencement)"),
    ("b1_explain", "Explication additionalité"),
    ("b2_explain", "Explication innovation"),
    ("toc", "Théorie du changement"),
    ("c1_solutions", "Solutions obstacles WLO"),
    ("c4_coordination", "Coordination (narratif)"),
    ("saddd", "SADDD (narratif)"),
    ("trust_plus", "Confiance (renforce)"),
    ("trust_minus", "Confiance (fragilise)"),
    ("e1_mitigation", "Mitigation (narratif)"),
    ("e3_results", "Résultats 3/6/12 mois (narratif)"),
    ("f1_strengthen", "Digital (amélioration, narratif)"),
    ("f2_details", "Appui UN (détails, narratif)"),
];

pub fn kpis_to_json(k: &Kpis) -> JSValue {
    json!({
        "scope": k.scope_name,
        "global_total": k.global_total,
        "scope_total": k.scope_total,
        "priority_area_count": k.priority_area_count,
    })
}

pub fn chart_to_json(series: &ChartSeries) -> JSValue {
    json!({
        "labels": series.labels,
        "values": series.values,
        "percentages": series.percentages(),
    })
}

pub fn narratives_to_json(n: &Narratives) -> JSValue {
    let mut m: JSMap<String, JSValue> = JSMap::new();
    for theme in Theme::ALL {
        m.insert(theme.key().to_string(), json!(n.bullets(theme)));
    }
    JSValue::Object(m)
}

/// The key figures, the charts of every field and the narratives of the
/// selected scope.
pub fn view_to_json(d: &Dashboard) -> JSValue {
    let mut charts: JSMap<String, JSValue> = JSMap::new();
    for (field, series) in d.charts() {
        charts.insert(field.key().to_string(), chart_to_json(&series));
    }
    json!({
        "generated_at": d.store().and_then(|s| s.generated_at.clone()),
        "kpis": kpis_to_json(&d.kpis()),
        "charts": charts,
        "narratives": narratives_to_json(&d.narratives()),
    })
}

pub fn narratives_markdown(n: &Narratives) -> String {
    let mut res = String::new();
    for theme in Theme::ALL {
        res.push_str(&format!("## {}\n\n", theme.title()));
        for b in n.display_bullets(theme) {
            res.push_str(&format!("- {}\n", b));
        }
        res.push('\n');
    }
    res
}

pub fn report_markdown(d: &Dashboard) -> String {
    let k = d.kpis();
    let mut res = format!("# Synthèse : {}\n\n", k.scope_name);
    res.push_str(&format!("- Réponses (total) : {}\n", k.global_total));
    res.push_str(&format!("- Réponses (sélection) : {}\n", k.scope_total));
    res.push_str(&format!("- Zones prioritaires citées : {}\n\n", k.priority_area_count));
    res.push_str(&narratives_markdown(&d.narratives()));
    res
}

/// The value of a table cell. Missing and blank values show the placeholder.
fn cell_text(r: &Record, column: &str) -> String {
    let s = r.text(column);
    let s = s.trim();
    if s.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        s.replace(['\t', '\n', '\r'], " ")
    }
}

/// The record table as tab-separated text, preceded by its key figures.
pub fn table_text(k: &TableKpis, records: &[Record]) -> String {
    let mut lines: Vec<String> = vec![
        format!("Sélection : {}", k.scope_name),
        format!("Enregistrements : {} / {}", k.visible, k.total),
        String::new(),
    ];
    lines.push(
        TABLE_COLUMNS
            .iter()
            .map(|(_, title)| *title)
            .collect::<Vec<&str>>()
            .join("\t"),
    );
    for r in records.iter() {
        lines.push(
            TABLE_COLUMNS
                .iter()
                .map(|(column, _)| cell_text(r, column))
                .collect::<Vec<String>>()
                .join("\t"),
        );
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_themes_show_placeholder() {
        let md = narratives_markdown(&Narratives::default());
        assert!(md.starts_with("## Forces\n\n- —\n\n## Lacunes\n"));
        assert_eq!(md.matches("- —").count(), 5);
    }

    #[test]
    fn view_of_a_scope() {
        let store = AggregateStore {
            total_responses: Some(10),
            summary: AggregateScope::new(10).with_table(
                "top_service_1",
                FrequencyTable::from_entries(vec![("Santé", 7), ("Protection", 3)]),
            ),
            ..AggregateStore::default()
        };
        let d = Dashboard::with_store(store);
        let js = view_to_json(&d);
        assert_eq!(js["kpis"]["scope"], json!("Toutes"));
        assert_eq!(js["charts"]["top_service_1"]["percentages"], json!([70, 30]));
        let forces = js["narratives"]["forces"].as_array().unwrap();
        assert!(forces.iter().any(|b| b.as_str().unwrap().contains("Santé (70%)")));
    }

    #[test]
    fn table_cells() {
        let r = Record::from_pairs(vec![("organisation", "Mwasi"), ("toc", "  ")]);
        let k = TableKpis {
            scope_name: "Toutes".to_string(),
            total: 3,
            visible: 1,
        };
        let text = table_text(&k, &[r]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "Enregistrements : 1 / 3");
        let cells: Vec<&str> = lines[4].split('\t').collect();
        assert_eq!(cells.len(), TABLE_COLUMNS.len());
        assert_eq!(cells[0], "—");
        assert_eq!(cells[1], "Mwasi");
    }
}

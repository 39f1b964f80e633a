//! Prose bullets summarizing one scope.
//!
//! Every bullet is either a fixed sentence or a template filled with the
//! ranked entries of one field. A templated bullet is left out when its
//! ranking is empty.

use log::debug;

use crate::config::*;
use crate::{enumerate_naturally, ranked_entries};

/// Shown in place of an empty list of bullets.
pub const PLACEHOLDER: &str = "—";

pub const INSUFFICIENT_SAMPLE: &str =
    "Échantillon insuffisant pour dégager des tendances robustes.";

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Theme {
    Forces,
    Gaps,
    Opportunities,
    Risks,
    Recommendations,
}

impl Theme {
    pub const ALL: [Theme; 5] = [
        Theme::Forces,
        Theme::Gaps,
        Theme::Opportunities,
        Theme::Risks,
        Theme::Recommendations,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Theme::Forces => "forces",
            Theme::Gaps => "gaps",
            Theme::Opportunities => "opportunities",
            Theme::Risks => "risks",
            Theme::Recommendations => "recommendations",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Theme::Forces => "Forces",
            Theme::Gaps => "Lacunes",
            Theme::Opportunities => "Opportunités CERF",
            Theme::Risks => "Risques",
            Theme::Recommendations => "Recommandations",
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Narratives {
    pub forces: Vec<String>,
    pub gaps: Vec<String>,
    pub opportunities: Vec<String>,
    pub risks: Vec<String>,
    pub recommendations: Vec<String>,
}

impl Narratives {
    pub fn bullets(&self, theme: Theme) -> &[String] {
        match theme {
            Theme::Forces => &self.forces,
            Theme::Gaps => &self.gaps,
            Theme::Opportunities => &self.opportunities,
            Theme::Risks => &self.risks,
            Theme::Recommendations => &self.recommendations,
        }
    }

    fn bullets_mut(&mut self, theme: Theme) -> &mut Vec<String> {
        match theme {
            Theme::Forces => &mut self.forces,
            Theme::Gaps => &mut self.gaps,
            Theme::Opportunities => &mut self.opportunities,
            Theme::Risks => &mut self.risks,
            Theme::Recommendations => &mut self.recommendations,
        }
    }

    /// The bullets as displayed: an empty theme shows a single placeholder.
    pub fn display_bullets(&self, theme: Theme) -> Vec<String> {
        let b = self.bullets(theme);
        if b.is_empty() {
            vec![PLACEHOLDER.to_string()]
        } else {
            b.to_vec()
        }
    }
}

enum Bullet {
    Fixed(&'static str),
    Ranked {
        field: SurveyField,
        take: usize,
        prefix: &'static str,
        suffix: &'static str,
    },
}

const fn ranked(
    field: SurveyField,
    take: usize,
    prefix: &'static str,
    suffix: &'static str,
) -> Bullet {
    Bullet::Ranked {
        field,
        take,
        prefix,
        suffix,
    }
}

// The bullets of every theme, in display order.
// The forces are only produced when the scope has responses.
const RULES: &[(Theme, Bullet)] = &[
    (
        Theme::Forces,
        ranked(
            SurveyField::OrgTypes,
            3,
            "Le profil des répondants est diversifié, avec une présence dominante de ",
            ".",
        ),
    ),
    (
        Theme::Forces,
        ranked(
            SurveyField::Clusters,
            4,
            "Les domaines les plus représentés sont : ",
            ".",
        ),
    ),
    (
        Theme::Forces,
        ranked(
            SurveyField::TopService1,
            3,
            "Les services life-saving les plus cités (Top 1) sont : ",
            ".",
        ),
    ),
    (
        Theme::Forces,
        ranked(
            SurveyField::ReferralGravity,
            2,
            "La gravité des ruptures de référencement est principalement ",
            ".",
        ),
    ),
    (
        Theme::Forces,
        ranked(
            SurveyField::PriorityAreas,
            4,
            "Les zones prioritaires convergent vers : ",
            ".",
        ),
    ),
    (
        Theme::Gaps,
        ranked(
            SurveyField::UnderservedGroups,
            4,
            "Les groupes les plus sous-desservis sont : ",
            ", indiquant des lacunes de couverture et/ou d’accès.",
        ),
    ),
    (
        Theme::Gaps,
        ranked(
            SurveyField::ObstaclesWlo,
            4,
            "Les obstacles majeurs au leadership des WLO portent sur : ",
            ".",
        ),
    ),
    (
        Theme::Gaps,
        ranked(
            SurveyField::CapacityNeeds,
            4,
            "Les besoins de renforcement de capacités les plus exprimés sont : ",
            ".",
        ),
    ),
    (
        Theme::Gaps,
        ranked(
            SurveyField::DigitalLimits,
            3,
            "Les limites du digital les plus mentionnées sont : ",
            ".",
        ),
    ),
    (
        Theme::Opportunities,
        Bullet::Fixed(
            "Une proposition CERF peut s’appuyer sur une priorisation claire life-saving \
             (SSR/VBG/Protection), soutenue par les tendances sur les services interrompus et la \
             gravité rapportée.",
        ),
    ),
    (
        Theme::Opportunities,
        ranked(
            SurveyField::Additionality,
            3,
            "Les axes d’additionalité les plus cités sont : ",
            " (à valoriser dans le narratif).",
        ),
    ),
    (
        Theme::Opportunities,
        ranked(
            SurveyField::InnovationLevel,
            2,
            "Le niveau d’innovation déclaré se situe principalement à : ",
            ".",
        ),
    ),
    (
        Theme::Opportunities,
        ranked(
            SurveyField::Approaches,
            4,
            "Les approches jugées efficaces à capitaliser sont : ",
            ".",
        ),
    ),
    (
        Theme::Opportunities,
        ranked(
            SurveyField::RestoreTime,
            2,
            "Le calendrier de rétablissement attendu se concentre sur : ",
            " (à traduire en plan opérationnel réaliste).",
        ),
    ),
    (
        Theme::Opportunities,
        ranked(
            SurveyField::GovernanceMechanisms,
            3,
            "La gouvernance peut être renforcée via : ",
            ", pour consolider la localisation et la participation effective des WLO.",
        ),
    ),
    (
        Theme::Opportunities,
        ranked(
            SurveyField::FeedbackChannel,
            2,
            "Les canaux de feedback privilégiés par les communautés sont : ",
            ".",
        ),
    ),
    (
        Theme::Opportunities,
        ranked(
            SurveyField::DigitalAdvantages,
            3,
            "Le suivi probant peut être renforcé par un dispositif digital pragmatique : ",
            ".",
        ),
    ),
    (
        Theme::Opportunities,
        ranked(
            SurveyField::UnSupport,
            3,
            "L’appui attendu des Nations Unies porte principalement sur : ",
            ".",
        ),
    ),
    (
        Theme::Risks,
        ranked(
            SurveyField::OperationalRisks,
            4,
            "Les risques opérationnels dominants sont : ",
            ".",
        ),
    ),
    (
        Theme::Risks,
        ranked(
            SurveyField::FundsLeverage,
            3,
            "Risque de chevauchement si l’articulation avec ",
            " n’est pas explicitée.",
        ),
    ),
    (
        Theme::Risks,
        ranked(
            SurveyField::DigitalLimits,
            3,
            "Sur le suivi digital : ",
            " — nécessite des mesures de confidentialité, accessibilité et alternatives \
             hors-ligne.",
        ),
    ),
    (
        Theme::Recommendations,
        Bullet::Fixed(
            "1) Consolider un paquet “life-saving” priorisé (Top 1) + référencement \
             intersectoriel, avec des standards de qualité et des délais de rétablissement \
             réalistes.",
        ),
    ),
    (
        Theme::Recommendations,
        Bullet::Fixed(
            "2) Justifier le ciblage géographique à partir des zones les plus citées et des \
             contraintes d’accès, avec critères transparents.",
        ),
    ),
    (
        Theme::Recommendations,
        Bullet::Fixed(
            "3) Centrer le ciblage sur les groupes sous-desservis (sexo-âge-handicap) et \
             formaliser le référencement sûr/confidentiel.",
        ),
    ),
    (
        Theme::Recommendations,
        Bullet::Fixed(
            "4) Renforcer la localisation : mécanismes de gouvernance et financement permettant \
             une participation décisionnelle des WLO.",
        ),
    ),
    (
        Theme::Recommendations,
        Bullet::Fixed(
            "5) Mettre en place un dispositif AAP/feedback crédible (canaux adaptés) et un suivi \
             digital pragmatique (données désagrégées), avec options hors-ligne.",
        ),
    ),
    (
        Theme::Recommendations,
        ranked(
            SurveyField::CriticalNeed,
            2,
            "6) Prioriser le besoin critique identifié : ",
            " et aligner le plan de mitigation sur les risques opérationnels.",
        ),
    ),
];

/// Builds the narrative bullets of a scope.
///
/// The output only depends on the scope: the same scope always gives the same
/// bullets.
pub fn build_narratives(scope: &AggregateScope) -> Narratives {
    let total = scope.total_responses;
    let mut res = Narratives::default();

    for (theme, bullet) in RULES.iter() {
        if *theme == Theme::Forces && total == 0 {
            continue;
        }
        let text = match bullet {
            Bullet::Fixed(s) => Some(s.to_string()),
            Bullet::Ranked {
                field,
                take,
                prefix,
                suffix,
            } => {
                let entries: Vec<String> =
                    ranked_entries(scope.field(*field), *take, field.denominator(), total)
                        .iter()
                        .map(|e| e.to_string())
                        .collect();
                if entries.is_empty() {
                    debug!("build_narratives: {}: no entries, skipping", field);
                    None
                } else {
                    Some(format!("{}{}{}", prefix, enumerate_naturally(&entries), suffix))
                }
            }
        };
        if let Some(t) = text {
            res.bullets_mut(*theme).push(t);
        }
    }

    if total == 0 {
        res.forces.push(INSUFFICIENT_SAMPLE.to_string());
    }

    debug!(
        "build_narratives: total: {} bullets: {:?}",
        total,
        Theme::ALL
            .iter()
            .map(|t| res.bullets(*t).len())
            .collect::<Vec<usize>>()
    );
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn scope() -> AggregateScope {
        AggregateScope::new(10)
            .with_table(
                "org_types",
                FrequencyTable::from_entries(vec![("ONG nationale", 6), ("WLO", 4)]),
            )
            .with_table(
                "top_service_1",
                FrequencyTable::from_entries(vec![("Santé", 7), ("Protection", 3)]),
            )
            .with_table(
                "referral_gravity",
                FrequencyTable::from_entries(vec![("Élevée", 3), ("Critique", 1)]),
            )
            .with_table(
                "underserved_groups",
                FrequencyTable::from_entries(vec![
                    ("Adolescentes", 5),
                    ("Femmes déplacées", 8),
                    ("Survivantes de VBG", 2),
                ]),
            )
            .with_table(
                "funds_leverage",
                FrequencyTable::from_entries(vec![("Pooled Fund", 2)]),
            )
            .with_table(
                "critical_need",
                FrequencyTable::from_entries(vec![("Santé", 4), ("Abri", 4), ("Eau", 1)]),
            )
    }

    #[test]
    fn forces_quote_percentages() {
        init_logger();
        let n = build_narratives(&scope());
        assert_eq!(
            n.forces[0],
            "Le profil des répondants est diversifié, avec une présence dominante de ONG \
             nationale (60%) et WLO (40%)."
        );
        assert!(n.forces[1].contains("Santé (70%)"));
        // Severity is quoted against its own mentions.
        assert_eq!(
            n.forces[2],
            "La gravité des ruptures de référencement est principalement Élevée (75%) et Critique \
             (25%)."
        );
        assert_eq!(n.forces.len(), 3);
    }

    #[test]
    fn multi_select_fields_quote_mentions() {
        let n = build_narratives(&scope());
        assert_eq!(
            n.gaps,
            vec!["Les groupes les plus sous-desservis sont : Femmes déplacées (8 \
                  mentions), Adolescentes (5 mentions), et Survivantes de VBG (2 \
                  mentions), indiquant des lacunes de couverture et/ou d’accès.".to_string()]
        );
        assert_eq!(
            n.risks,
            vec!["Risque de chevauchement si l’articulation avec Pooled Fund (2 \
                  mentions) n’est pas explicitée.".to_string()]
        );
    }

    #[test]
    fn recommendations_end_with_critical_need() {
        let n = build_narratives(&scope());
        assert_eq!(n.recommendations.len(), 6);
        assert_eq!(
            n.recommendations[5],
            "6) Prioriser le besoin critique identifié : Santé (40%) et Abri (40%) et aligner le \
             plan de mitigation sur les risques opérationnels."
        );
    }

    #[test]
    fn empty_scope() {
        init_logger();
        let n = build_narratives(&AggregateScope::new(0));
        assert_eq!(n.forces, vec![INSUFFICIENT_SAMPLE.to_string()]);
        assert!(n.gaps.is_empty());
        assert!(n.risks.is_empty());
        assert_eq!(n.opportunities.len(), 1);
        assert_eq!(n.recommendations.len(), 5);
        assert_eq!(n.display_bullets(Theme::Gaps), vec![PLACEHOLDER.to_string()]);
    }

    #[test]
    fn no_forces_without_responses() {
        let s = scope();
        let mut empty = AggregateScope::new(0);
        for (k, t) in s.tables() {
            empty.insert_table(k, t.clone());
        }
        let n = build_narratives(&empty);
        assert_eq!(n.forces, vec![INSUFFICIENT_SAMPLE.to_string()]);
    }

    #[test]
    fn deterministic() {
        let s = scope();
        assert_eq!(build_narratives(&s), build_narratives(&s));
    }
}

//! Clinical Feature Extractor.
//!
//! Turns the merged clinical columns of one individual into phenotypic
//! features and disease entries. Each registered column yields at most one
//! feature; values are interpreted as presence, negation, not-assessed, or
//! (for staging columns) a renal stage.

use std::collections::BTreeSet;

use tracing::{debug, trace, warn};

use hnf1b_model::{Disease, OntologyClass, PhenotypicFeature, TimeElement};
use hnf1b_ontology::OntologyResolver;
use hnf1b_standards::{FeatureColumn, FeatureHandler, Standards};

use crate::audit::AuditLog;
use crate::consolidate::{ClinicalValue, ConsolidatedIndividual};
use crate::temporal::{TemporalValue, parse_temporal};

/// Domain disease recorded for every individual.
pub const DOMAIN_DISEASE: &str = "MONDO:0011593";

/// Disease recorded when a specific kidney disease stage is reported.
pub const CKD_DISEASE: &str = "MONDO:0005300";

const PRESENCE_TOKENS: &[&str] = &["yes", "y", "present", "positive", "1", "true", "+"];
const NEGATION_TOKENS: &[&str] = &["no", "n", "absent", "negative", "0", "false", "-"];
const NOT_ASSESSED_TOKENS: &[&str] = &["nr", "n/a", "na", "unknown", "?"];
const NOT_ASSESSED_PHRASES: &[&str] = &["not reported", "not assessed", "not available"];

/// How a raw clinical value reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueStatus {
    /// Presence token, with any free text after it.
    Present { qualifier: String },
    /// Negation token.
    Absent,
    /// Explicitly not assessed, or blank.
    NotAssessed,
    /// Text that starts with no known token.
    Unrecognized,
}

/// Classify a clinical cell by its leading token.
///
/// `yes, bilateral` and `yes (severe)` are present with a qualifier;
/// `not reported` is not assessed.
pub fn classify_value(raw: &str) -> ValueStatus {
    let value = raw.trim().to_lowercase();
    if value.is_empty() {
        return ValueStatus::NotAssessed;
    }
    if NOT_ASSESSED_PHRASES
        .iter()
        .any(|phrase| value.starts_with(phrase))
    {
        return ValueStatus::NotAssessed;
    }

    let split = value
        .find([',', '(', ';', ' ', ':'])
        .unwrap_or(value.len());
    let (head, rest) = value.split_at(split);
    let qualifier = rest
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | ':' | '(' | ')'))
        .to_string();

    if PRESENCE_TOKENS.contains(&head) {
        ValueStatus::Present { qualifier }
    } else if NEGATION_TOKENS.contains(&head) {
        ValueStatus::Absent
    } else if NOT_ASSESSED_TOKENS.contains(&head) {
        ValueStatus::NotAssessed
    } else {
        ValueStatus::Unrecognized
    }
}

/// A feature together with the publications whose rows support it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFeature {
    pub feature: PhenotypicFeature,
    pub publications: BTreeSet<String>,
}

/// Output of feature extraction for one individual.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedClinical {
    pub features: Vec<ExtractedFeature>,
    pub diseases: Vec<Disease>,
}

/// Result of reading one row's value for one column.
#[derive(Debug, Clone)]
enum Outcome {
    Observed {
        term: OntologyClass,
        qualifier: String,
    },
    Excluded,
    Skipped,
}

impl Outcome {
    fn rank(&self) -> u8 {
        match self {
            Self::Observed { .. } => 2,
            Self::Excluded => 1,
            Self::Skipped => 0,
        }
    }
}

pub struct FeatureExtractor<'a> {
    standards: &'a Standards,
    resolver: &'a OntologyResolver,
    audit: &'a AuditLog,
}

impl<'a> FeatureExtractor<'a> {
    pub fn new(standards: &'a Standards, resolver: &'a OntologyResolver, audit: &'a AuditLog) -> Self {
        Self {
            standards,
            resolver,
            audit,
        }
    }

    /// Extract features and diseases for one consolidated individual.
    pub fn extract(&self, individual: &ConsolidatedIndividual) -> ExtractedClinical {
        let individual_onset = self.individual_onset(individual);
        let mut features = Vec::new();
        let mut stage: Option<OntologyClass> = None;

        for column in self.standards.features.columns() {
            let Some(values) = individual.clinical.get(&column.key) else {
                continue;
            };
            let Some((outcome, publications)) = self.merge_column(individual, column, values)
            else {
                continue;
            };
            let feature = match outcome {
                Outcome::Observed { term, qualifier } => {
                    if column.handler == FeatureHandler::RenalStaging && term.id != column.term.id {
                        stage.get_or_insert_with(|| term.clone());
                    }
                    PhenotypicFeature {
                        kind: term,
                        excluded: false,
                        modifiers: self.standards.modifiers.find_in(&qualifier),
                        onset: self.feature_onset(column, &qualifier, individual_onset.as_ref()),
                        evidence: Vec::new(),
                    }
                }
                Outcome::Excluded => PhenotypicFeature {
                    kind: self.resolver.resolve_class(&column.term.id),
                    excluded: true,
                    modifiers: Vec::new(),
                    onset: None,
                    evidence: Vec::new(),
                },
                Outcome::Skipped => continue,
            };
            trace!(
                feature = %feature.kind.id,
                excluded = feature.excluded,
                "Feature extracted"
            );
            features.push(ExtractedFeature {
                feature,
                publications,
            });
        }

        let mut diseases = vec![Disease {
            term: self.resolver.resolve_class(DOMAIN_DISEASE),
            excluded: false,
            onset: individual_onset.clone(),
            disease_stage: Vec::new(),
        }];
        if let Some(stage) = stage {
            diseases.push(Disease {
                term: self.resolver.resolve_class(CKD_DISEASE),
                excluded: false,
                onset: None,
                disease_stage: vec![stage],
            });
        }

        debug!(
            features = features.len(),
            diseases = diseases.len(),
            "Clinical features extracted"
        );
        ExtractedClinical { features, diseases }
    }

    /// Merge a column across rows: observed beats excluded beats absent.
    /// Among observed values a specific stage beats the generic column term.
    fn merge_column(
        &self,
        individual: &ConsolidatedIndividual,
        column: &FeatureColumn,
        values: &[ClinicalValue],
    ) -> Option<(Outcome, BTreeSet<String>)> {
        let outcomes: Vec<(Outcome, &ClinicalValue)> = values
            .iter()
            .map(|value| (self.interpret(individual, column, &value.value), value))
            .collect();
        let best_rank = outcomes.iter().map(|(o, _)| o.rank()).max()?;
        if best_rank == 0 {
            return None;
        }

        let publications: BTreeSet<String> = outcomes
            .iter()
            .filter(|(o, _)| o.rank() == best_rank)
            .filter_map(|(_, v)| v.publication.clone())
            .collect();
        let mut winners = outcomes
            .into_iter()
            .filter(|(o, _)| o.rank() == best_rank)
            .map(|(o, _)| o);
        let first = winners.next()?;
        let chosen = match &first {
            Outcome::Observed { term, .. } if term.id == column.term.id => winners
                .find(|o| matches!(o, Outcome::Observed { term, .. } if term.id != column.term.id))
                .unwrap_or(first),
            _ => first,
        };
        Some((chosen, publications))
    }

    fn interpret(&self, individual: &ConsolidatedIndividual, column: &FeatureColumn, raw: &str) -> Outcome {
        match classify_value(raw) {
            ValueStatus::NotAssessed => Outcome::Skipped,
            ValueStatus::Absent => Outcome::Excluded,
            ValueStatus::Present { qualifier } => {
                let staged = match column.handler {
                    // `yes, stage 3` names the stage after the token; `1` is a stage itself.
                    FeatureHandler::RenalStaging => [qualifier.as_str(), raw]
                        .into_iter()
                        .filter(|text| !text.trim().is_empty())
                        .find_map(|text| self.standards.staging.lookup(text))
                        .cloned(),
                    FeatureHandler::General => None,
                };
                let term =
                    staged.unwrap_or_else(|| self.resolver.resolve_class(&column.term.id));
                Outcome::Observed { term, qualifier }
            }
            ValueStatus::Unrecognized => match column.handler {
                FeatureHandler::RenalStaging => match self.standards.staging.lookup(raw) {
                    Some(stage) => Outcome::Observed {
                        term: stage.clone(),
                        qualifier: String::new(),
                    },
                    None => {
                        warn!(feature = %column.key, "Staging value not in staging table");
                        self.audit
                            .record_staging_miss(&individual.key, &column.key, raw.trim());
                        Outcome::Skipped
                    }
                },
                FeatureHandler::General => {
                    warn!(feature = %column.key, "Clinical value not recognized");
                    self.audit
                        .record_unmapped(&individual.key, &column.key, raw.trim());
                    Outcome::Skipped
                }
            },
        }
    }

    /// Column-fixed onset, else a stage word in the qualifier, else the
    /// individual's age at onset.
    fn feature_onset(
        &self,
        column: &FeatureColumn,
        qualifier: &str,
        individual_onset: Option<&TimeElement>,
    ) -> Option<TimeElement> {
        if let Some(code) = column.onset.as_deref() {
            let class = self
                .standards
                .onsets
                .by_code(code)
                .cloned()
                .unwrap_or_else(|| self.resolver.resolve_class(code));
            return Some(TimeElement::OntologyClass(class));
        }
        if let Some(stage) = self.standards.onsets.find_in(qualifier) {
            return Some(TimeElement::OntologyClass(stage.clone()));
        }
        individual_onset.cloned()
    }

    fn individual_onset(&self, individual: &ConsolidatedIndividual) -> Option<TimeElement> {
        let raw = individual.age_onset.as_deref()?;
        match parse_temporal(raw, &self.standards.onsets)? {
            TemporalValue::Unparsed(text) => {
                warn!(field = "age_onset", "Age at onset not understood");
                self.audit
                    .record_unparsed_temporal(&individual.key, "age_onset", &text);
                None
            }
            value => value.to_time_element(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presence_with_qualifier() {
        assert_eq!(
            classify_value("Yes, bilateral"),
            ValueStatus::Present {
                qualifier: "bilateral".into()
            }
        );
        assert_eq!(
            classify_value("yes (severe)"),
            ValueStatus::Present {
                qualifier: "severe".into()
            }
        );
        assert_eq!(
            classify_value("+"),
            ValueStatus::Present {
                qualifier: String::new()
            }
        );
    }

    #[test]
    fn negation_and_not_assessed() {
        assert_eq!(classify_value("no"), ValueStatus::Absent);
        assert_eq!(classify_value("Absent"), ValueStatus::Absent);
        assert_eq!(classify_value("-"), ValueStatus::Absent);
        assert_eq!(classify_value("not reported"), ValueStatus::NotAssessed);
        assert_eq!(classify_value("Not assessed (lost to follow-up)"), ValueStatus::NotAssessed);
        assert_eq!(classify_value("n/a"), ValueStatus::NotAssessed);
        assert_eq!(classify_value("?"), ValueStatus::NotAssessed);
        assert_eq!(classify_value("  "), ValueStatus::NotAssessed);
    }

    #[test]
    fn stage_text_is_unrecognized_by_token() {
        assert_eq!(classify_value("stage 3"), ValueStatus::Unrecognized);
        assert_eq!(classify_value("maybe"), ValueStatus::Unrecognized);
        // Leading word must be a whole token.
        assert_eq!(classify_value("nothing"), ValueStatus::Unrecognized);
    }
}

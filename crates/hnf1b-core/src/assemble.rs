//! Document Assembler.
//!
//! The only place a [`Phenopacket`] is constructed. Inputs are the
//! consolidated individual, its extracted clinical entries and its resolved
//! variant; the output is immutable.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

use hnf1b_ingest::PublicationTable;
use hnf1b_model::{
    AcmgClassification, Diagnosis, Evidence, Expression, Extension, ExternalReference,
    GeneDescriptor, GenomicInterpretation, Individual, Interpretation, InterpretationStatus,
    MetaData, NormalizedCoordinate, NotationSource, OntologyClass, PHENOPACKET_SCHEMA_VERSION,
    Phenopacket, PhenotypicFeature, ProgressStatus, TimeElement, Update, VariantClass,
    VariantIdentifier, VariantInterpretation, VariantRecord, VariantType, VariationDescriptor,
    VcfRecord,
};
use hnf1b_ontology::OntologyResolver;
use hnf1b_standards::Standards;

use crate::audit::AuditLog;
use crate::consolidate::ConsolidatedIndividual;
use crate::error::{PipelineError, Result};
use crate::features::{DOMAIN_DISEASE, ExtractedClinical};
use crate::temporal::{TemporalValue, parse_temporal};
use crate::vrs::canonical_json;

/// Evidence code attached to every published observation.
pub const EVIDENCE_CODE: &str = "ECO:0006017";

pub const GENE_ID: &str = "HGNC:11630";
pub const GENE_SYMBOL: &str = "HNF1B";

const DEFAULT_ASSEMBLY: &str = "GRCh38";

/// Record id for a normalized subject key.
pub fn record_id(key: &str) -> String {
    format!("phenopacket-{key}")
}

/// SHA-256 hex of the record's canonical JSON with `metaData.created` removed.
///
/// Two runs over unchanged input produce equal digests.
pub fn content_digest(record: &Phenopacket) -> Result<String> {
    let mut value = serde_json::to_value(record).map_err(|source| PipelineError::Serialize {
        id: record.id.clone(),
        source,
    })?;
    if let Some(Value::Object(meta)) = value.get_mut("metaData") {
        meta.remove("created");
    }
    Ok(hex::encode(Sha256::digest(canonical_json(&value).as_bytes())))
}

pub struct DocumentAssembler<'a> {
    standards: &'a Standards,
    resolver: &'a OntologyResolver,
    publications: Option<&'a PublicationTable>,
    audit: &'a AuditLog,
    created_by: String,
}

impl<'a> DocumentAssembler<'a> {
    pub fn new(
        standards: &'a Standards,
        resolver: &'a OntologyResolver,
        publications: Option<&'a PublicationTable>,
        audit: &'a AuditLog,
        created_by: impl Into<String>,
    ) -> Self {
        Self {
            standards,
            resolver,
            publications,
            audit,
            created_by: created_by.into(),
        }
    }

    /// Compose the record. Fails only when the subject key is empty.
    pub fn assemble(
        &self,
        individual: &ConsolidatedIndividual,
        clinical: ExtractedClinical,
        variant: Option<&VariantRecord>,
        created: DateTime<Utc>,
    ) -> Result<Phenopacket> {
        if individual.key.is_empty() {
            return Err(PipelineError::MissingSubjectKey {
                rows: individual.row_count,
            });
        }
        let id = record_id(&individual.key);

        let evidence_code = self.resolver.resolve_class(EVIDENCE_CODE);
        let mut phenotypic_features: Vec<PhenotypicFeature> = clinical
            .features
            .into_iter()
            .map(|extracted| PhenotypicFeature {
                evidence: extracted
                    .publications
                    .iter()
                    .map(|alias| Evidence {
                        evidence_code: evidence_code.clone(),
                        reference: Some(self.publication_reference(alias)),
                    })
                    .collect(),
                ..extracted.feature
            })
            .collect();
        phenotypic_features.sort_by(|a, b| {
            (a.kind.id.as_str(), a.excluded).cmp(&(b.kind.id.as_str(), b.excluded))
        });

        let mut diseases = clinical.diseases;
        diseases.sort_by(|a, b| a.term.id.cmp(&b.term.id));

        let interpretations = variant
            .map(|record| self.interpretation(&id, individual, record))
            .into_iter()
            .collect::<Vec<_>>();

        let subject = Individual {
            id: individual.key.clone(),
            sex: individual.sex,
            time_at_last_encounter: self.last_encounter(individual),
        };

        let external_references: Vec<ExternalReference> = individual
            .publications
            .iter()
            .map(|alias| self.publication_reference(alias))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let updates = individual
            .latest_review
            .map(|timestamp| Update {
                timestamp,
                comment: "Curation review".to_string(),
            })
            .into_iter()
            .collect();

        let mut record = Phenopacket {
            id,
            subject,
            phenotypic_features,
            diseases,
            interpretations,
            meta_data: MetaData {
                created,
                created_by: self.created_by.clone(),
                resources: Vec::new(),
                updates,
                phenopacket_schema_version: PHENOPACKET_SCHEMA_VERSION.to_string(),
                external_references,
            },
        };
        let prefixes = used_prefixes(&record);
        record.meta_data.resources = self
            .standards
            .resources
            .for_prefixes(prefixes.iter().map(String::as_str));

        debug!(
            features = record.phenotypic_features.len(),
            diseases = record.diseases.len(),
            variants = record.interpretations.len(),
            "Record assembled"
        );
        Ok(record)
    }

    fn publication_reference(&self, alias: &str) -> ExternalReference {
        self.publications
            .and_then(|table| table.get(alias))
            .and_then(|publication| publication.external_reference())
            .unwrap_or_else(|| ExternalReference {
                id: alias.to_string(),
                reference: None,
                description: None,
            })
    }

    fn last_encounter(&self, individual: &ConsolidatedIndividual) -> Option<TimeElement> {
        let raw = individual.age_reported.as_deref()?;
        match parse_temporal(raw, &self.standards.onsets)? {
            TemporalValue::Unparsed(text) => {
                self.audit
                    .record_unparsed_temporal(&individual.key, "age_reported", &text);
                None
            }
            value => value.to_time_element(),
        }
    }

    fn interpretation(
        &self,
        id: &str,
        individual: &ConsolidatedIndividual,
        record: &VariantRecord,
    ) -> Interpretation {
        let classification = individual
            .classification
            .as_deref()
            .map(AcmgClassification::parse)
            .unwrap_or_default();
        let interpretation_status = classification.interpretation_status();
        let progress_status = match interpretation_status {
            InterpretationStatus::Causative => ProgressStatus::Solved,
            _ => ProgressStatus::InProgress,
        };

        Interpretation {
            id: format!("{id}-interpretation"),
            progress_status,
            diagnosis: Diagnosis {
                disease: self.resolver.resolve_class(DOMAIN_DISEASE),
                genomic_interpretations: vec![GenomicInterpretation {
                    subject_or_biosample_id: individual.key.clone(),
                    interpretation_status,
                    variant_interpretation: VariantInterpretation {
                        acmg_pathogenicity_classification: classification,
                        variation_descriptor: self.descriptor(id, individual, record),
                    },
                }],
            },
        }
    }

    fn descriptor(
        &self,
        id: &str,
        individual: &ConsolidatedIndividual,
        record: &VariantRecord,
    ) -> VariationDescriptor {
        let mut expressions = vec![notation_expression(record.notation.source, &record.notation.value)];
        let mut extensions = Vec::new();

        if let Some(annotation) = &record.annotation {
            let transcript = annotation
                .transcript
                .as_deref()
                .or(individual.transcript.as_deref());
            if let Some(hgvs_c) = annotation.hgvs_c.as_deref() {
                let value = match transcript {
                    Some(transcript) if !hgvs_c.contains(':') => format!("{transcript}:{hgvs_c}"),
                    _ => hgvs_c.to_string(),
                };
                expressions.push(Expression {
                    syntax: "hgvs.c".to_string(),
                    value,
                });
            }
            if let Some(hgvs_p) = annotation.hgvs_p.as_deref() {
                expressions.push(Expression {
                    syntax: "hgvs.p".to_string(),
                    value: hgvs_p.to_string(),
                });
            }
            if let Some(consequence) = annotation.consequence.as_deref() {
                extensions.push(Extension {
                    name: "consequence".to_string(),
                    value: consequence.to_string(),
                });
            }
            if let Some(impact) = annotation.impact.as_deref() {
                extensions.push(Extension {
                    name: "impact".to_string(),
                    value: impact.to_string(),
                });
            }
        }
        expressions.sort();
        expressions.dedup();

        let coordinate = record.coordinate.as_ref();
        if let Some(coordinate) = coordinate {
            extensions.push(Extension {
                name: "variant_class".to_string(),
                value: coordinate.class().as_str().to_string(),
            });
        }
        extensions.push(Extension {
            name: "identifier_method".to_string(),
            value: record
                .identifier
                .method()
                .map_or("unplaced", |method| method.as_str())
                .to_string(),
        });
        if let Some(inheritance) = individual.inheritance.as_deref() {
            extensions.push(Extension {
                name: "inheritance".to_string(),
                value: inheritance.to_string(),
            });
        }
        extensions.sort();

        let descriptor_id = match &record.identifier {
            VariantIdentifier::Standard(vrs_id) | VariantIdentifier::Fallback(vrs_id) => vrs_id.clone(),
            VariantIdentifier::Unplaced => format!("{id}-variant"),
        };

        let structural_type = coordinate
            .filter(|c| c.class() == VariantClass::Structural)
            .and_then(|c| match c.variant_type {
                VariantType::Deletion => Some("SO:1000029"),
                VariantType::Duplication | VariantType::Insertion => Some("SO:1000037"),
                _ => None,
            })
            .map(|code| self.resolver.resolve_class(code));

        VariationDescriptor {
            id: descriptor_id,
            label: record.notation.value.clone(),
            gene_context: Some(GeneDescriptor {
                value_id: GENE_ID.to_string(),
                symbol: GENE_SYMBOL.to_string(),
            }),
            expressions,
            vcf_record: coordinate.and_then(|c| self.vcf_record(c)),
            molecule_context: "genomic".to_string(),
            structural_type,
            allelic_state: individual
                .zygosity
                .as_deref()
                .and_then(allelic_state_code)
                .map(|code| self.resolver.resolve_class(code)),
            extensions,
        }
    }

    /// VCF form of a coordinate. Ranges without a sequence become symbolic
    /// alleles padded one base to the left.
    fn vcf_record(&self, coordinate: &NormalizedCoordinate) -> Option<VcfRecord> {
        let genome_assembly = self
            .standards
            .sequences
            .by_chromosome(&coordinate.chromosome)
            .map_or(DEFAULT_ASSEMBLY, |entry| entry.assembly.as_str())
            .to_string();
        let chrom = format!("chr{}", coordinate.chromosome);
        match (&coordinate.reference, &coordinate.alternate) {
            (Some(reference), Some(alternate)) => Some(VcfRecord {
                genome_assembly,
                chrom,
                pos: coordinate.start,
                reference: reference.clone(),
                alt: alternate.clone(),
                info: None,
            }),
            (None, None) => {
                let tag = match coordinate.variant_type {
                    VariantType::Deletion => "DEL",
                    VariantType::Duplication => "DUP",
                    _ => return None,
                };
                Some(VcfRecord {
                    genome_assembly,
                    chrom,
                    pos: coordinate.start - 1,
                    reference: "N".to_string(),
                    alt: format!("<{tag}>"),
                    info: Some(format!("SVTYPE={tag};END={}", coordinate.end)),
                })
            }
            _ => None,
        }
    }
}

fn notation_expression(source: NotationSource, value: &str) -> Expression {
    let syntax = match source {
        NotationSource::Hgvs if value.contains(":c.") => "hgvs.c",
        NotationSource::Hgvs if value.contains(":g.") => "hgvs.g",
        NotationSource::Hgvs if value.contains(":p.") => "hgvs.p",
        NotationSource::Hgvs => "hgvs",
        NotationSource::Genomic => "genomic_coordinate",
        NotationSource::FreeText => "free_text",
    };
    Expression {
        syntax: syntax.to_string(),
        value: value.to_string(),
    }
}

/// GENO code for a curated zygosity value.
pub fn allelic_state_code(raw: &str) -> Option<&'static str> {
    match raw.trim().to_lowercase().as_str() {
        "het" | "heterozygous" | "heterozygote" | "0/1" => Some("GENO:0000135"),
        "hom" | "homozygous" | "homozygote" | "1/1" => Some("GENO:0000136"),
        "hemi" | "hemizygous" | "hemizygote" => Some("GENO:0000134"),
        _ => None,
    }
}

/// Ontology prefixes of every class a record mentions.
fn used_prefixes(record: &Phenopacket) -> BTreeSet<String> {
    fn onset_class(onset: &Option<TimeElement>) -> Option<&OntologyClass> {
        match onset {
            Some(TimeElement::OntologyClass(class)) => Some(class),
            _ => None,
        }
    }

    let mut classes: Vec<&OntologyClass> = Vec::new();
    let mut has_gene = false;

    for feature in &record.phenotypic_features {
        classes.push(&feature.kind);
        classes.extend(&feature.modifiers);
        classes.extend(onset_class(&feature.onset));
        classes.extend(feature.evidence.iter().map(|e| &e.evidence_code));
    }
    for disease in &record.diseases {
        classes.push(&disease.term);
        classes.extend(&disease.disease_stage);
        classes.extend(onset_class(&disease.onset));
    }
    for interpretation in &record.interpretations {
        classes.push(&interpretation.diagnosis.disease);
        for genomic in &interpretation.diagnosis.genomic_interpretations {
            let descriptor = &genomic.variant_interpretation.variation_descriptor;
            classes.extend(&descriptor.structural_type);
            classes.extend(&descriptor.allelic_state);
            has_gene |= descriptor.gene_context.is_some();
        }
    }

    let mut prefixes: BTreeSet<String> = classes
        .into_iter()
        .map(|class| class.prefix().to_string())
        .collect();
    if has_gene {
        prefixes.insert("HGNC".to_string());
    }
    prefixes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zygosity_codes() {
        assert_eq!(allelic_state_code("Heterozygous"), Some("GENO:0000135"));
        assert_eq!(allelic_state_code("hom"), Some("GENO:0000136"));
        assert_eq!(allelic_state_code("mosaic"), None);
    }

    #[test]
    fn notation_syntax() {
        assert_eq!(
            notation_expression(NotationSource::Hgvs, "NM_000458.4:c.544+1G>T").syntax,
            "hgvs.c"
        );
        assert_eq!(
            notation_expression(NotationSource::Hgvs, "NC_000017.11:g.37739578C>T").syntax,
            "hgvs.g"
        );
        assert_eq!(
            notation_expression(NotationSource::FreeText, "exon 2 deletion").syntax,
            "free_text"
        );
    }
}

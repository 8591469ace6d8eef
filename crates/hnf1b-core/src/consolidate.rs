//! Row Consolidator.
//!
//! Curated sheets list an individual once per publication (and sometimes
//! more). Rows are grouped by a normalized individual key, sorted into a
//! fixed order and merged into one [`ConsolidatedIndividual`].

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use tracing::{trace, warn};

use hnf1b_ingest::alias_key;
use hnf1b_model::{NotationSource, Sex, SourceRow, VariantNotations, non_blank};

use crate::audit::AuditLog;
use crate::temporal::{is_not_reported, parse_review_date};

/// Normalize an individual identifier: lowercase, runs of other characters
/// collapse to `-` (`Ind 12`, `ind_12` → `ind-12`).
pub fn normalize_individual_key(raw: &str) -> String {
    let mut key = String::with_capacity(raw.len());
    let mut pending_dash = false;
    for ch in raw.trim().chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !key.is_empty() {
                key.push('-');
            }
            pending_dash = false;
            key.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    key
}

/// All rows describing one individual.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndividualGroup {
    /// Normalized key; empty when no row carried a usable identifier.
    pub key: String,
    pub rows: Vec<SourceRow>,
}

impl IndividualGroup {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sort by publication, review date, then row content. Row numbers are
    /// ignored so that input order never matters.
    fn sort_rows(&mut self) {
        self.rows.sort_by(|a, b| row_order_key(a).cmp(&row_order_key(b)));
    }
}

type RowOrderKey<'a> = (
    Option<String>,
    Option<NaiveDate>,
    (
        &'a str,
        &'a Option<String>,
        &'a Option<String>,
        &'a Option<String>,
        &'a Option<String>,
    ),
    (
        &'a VariantNotations,
        &'a Option<String>,
        &'a Option<String>,
        &'a Option<String>,
        &'a Option<String>,
        &'a BTreeMap<String, String>,
    ),
);

fn row_order_key(row: &SourceRow) -> RowOrderKey<'_> {
    (
        non_blank(row.publication.as_deref()).map(alias_key),
        row.review_date.as_deref().and_then(parse_review_date),
        (
            row.individual_key.as_str(),
            &row.sex,
            &row.age_onset,
            &row.age_reported,
            &row.review_date,
        ),
        (
            &row.variant,
            &row.transcript,
            &row.classification,
            &row.zygosity,
            &row.inheritance,
            &row.clinical,
        ),
    )
}

/// Group rows by normalized individual key. Groups come back sorted by key.
pub fn group_rows(rows: impl IntoIterator<Item = SourceRow>) -> Vec<IndividualGroup> {
    let mut by_key: BTreeMap<String, Vec<SourceRow>> = BTreeMap::new();
    for row in rows {
        by_key
            .entry(normalize_individual_key(&row.individual_key))
            .or_default()
            .push(row);
    }
    by_key
        .into_iter()
        .map(|(key, rows)| {
            let mut group = IndividualGroup { key, rows };
            group.sort_rows();
            group
        })
        .collect()
}

/// One row's value for a clinical column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClinicalValue {
    pub value: String,
    /// Publication alias of the row the value came from.
    pub publication: Option<String>,
}

/// The merged view of an individual's rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsolidatedIndividual {
    pub key: String,
    pub row_count: usize,
    pub sex: Sex,
    pub age_onset: Option<String>,
    pub age_reported: Option<String>,
    pub latest_review: Option<NaiveDate>,
    /// Distinct publication aliases (normalized).
    pub publications: BTreeSet<String>,
    /// First value of each notation column across the group.
    pub notations: VariantNotations,
    pub transcript: Option<String>,
    pub classification: Option<String>,
    pub zygosity: Option<String>,
    pub inheritance: Option<String>,
    /// Values per feature key, in row order.
    pub clinical: BTreeMap<String, Vec<ClinicalValue>>,
}

fn first_value<'a>(rows: &'a [SourceRow], field: impl Fn(&'a SourceRow) -> Option<&'a str>) -> Option<String> {
    rows.iter()
        .find_map(|row| non_blank(field(row)))
        .map(str::to_string)
}

fn first_reported<'a>(rows: &'a [SourceRow], field: impl Fn(&'a SourceRow) -> Option<&'a str>) -> Option<String> {
    rows.iter()
        .filter_map(|row| non_blank(field(row)))
        .find(|value| !is_not_reported(value))
        .map(str::to_string)
}

/// Merge a group into one individual.
pub fn consolidate(group: &IndividualGroup, audit: &AuditLog) -> ConsolidatedIndividual {
    let rows = group.rows.as_slice();

    let sex = rows
        .iter()
        .filter_map(|row| row.sex.as_deref())
        .map(Sex::parse)
        .find(Sex::is_known)
        .unwrap_or_default();

    let mut latest_review = None;
    for raw in rows.iter().filter_map(|row| non_blank(row.review_date.as_deref())) {
        match parse_review_date(raw) {
            Some(date) => latest_review = latest_review.max(Some(date)),
            None => {
                warn!(field = "review_date", "Review date not understood");
                audit.record_unparsed_temporal(&group.key, "review_date", raw);
            }
        }
    }

    let publications = rows
        .iter()
        .filter_map(|row| non_blank(row.publication.as_deref()))
        .map(alias_key)
        .collect();

    let mut clinical: BTreeMap<String, Vec<ClinicalValue>> = BTreeMap::new();
    for row in rows {
        let publication = non_blank(row.publication.as_deref()).map(alias_key);
        for (feature, value) in &row.clinical {
            if let Some(value) = non_blank(Some(value)) {
                clinical.entry(feature.clone()).or_default().push(ClinicalValue {
                    value: value.to_string(),
                    publication: publication.clone(),
                });
            }
        }
    }

    let individual = ConsolidatedIndividual {
        key: group.key.clone(),
        row_count: rows.len(),
        sex,
        age_onset: first_reported(rows, |row| row.age_onset.as_deref()),
        age_reported: first_reported(rows, |row| row.age_reported.as_deref()),
        latest_review,
        publications,
        notations: merge_notations(&group.key, rows, audit),
        transcript: first_value(rows, |row| row.transcript.as_deref()),
        classification: first_value(rows, |row| row.classification.as_deref()),
        zygosity: first_value(rows, |row| row.zygosity.as_deref()),
        inheritance: first_value(rows, |row| row.inheritance.as_deref()),
        clinical,
    };
    trace!(
        key = %individual.key,
        rows = individual.row_count,
        features = individual.clinical.len(),
        "Group consolidated"
    );
    individual
}

/// First value of each notation column; later differing values are
/// reported as conflicts and dropped.
fn merge_notations(key: &str, rows: &[SourceRow], audit: &AuditLog) -> VariantNotations {
    let mut merged = VariantNotations::default();
    for source in NotationSource::precedence() {
        let mut values = rows
            .iter()
            .filter_map(|row| row.variant.get(*source).map(|value| (row, value)));
        let Some((first_row, chosen)) = values.next() else {
            continue;
        };
        let mut ignored: BTreeSet<&str> = BTreeSet::new();
        for (_, value) in values {
            if !value.eq_ignore_ascii_case(chosen) && ignored.insert(value) {
                warn!(source = %source, "Conflicting variant notation ignored");
                audit.record_notation_conflict(key, chosen, value);
            }
        }
        match source {
            NotationSource::Hgvs => merged.hgvs = Some(chosen.to_string()),
            NotationSource::Genomic => {
                merged.genomic = Some(chosen.to_string());
                merged.vcf_info = non_blank(first_row.variant.vcf_info.as_deref()).map(str::to_string);
            }
            NotationSource::FreeText => merged.free_text = Some(chosen.to_string()),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(key: &str, publication: &str) -> SourceRow {
        SourceRow {
            individual_key: key.to_string(),
            publication: Some(publication.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn key_normalization() {
        assert_eq!(normalize_individual_key("Ind 12"), "ind-12");
        assert_eq!(normalize_individual_key("ind_12"), "ind-12");
        assert_eq!(normalize_individual_key("  IND--12 "), "ind-12");
        assert_eq!(normalize_individual_key("__"), "");
    }

    #[test]
    fn groups_sorted_by_key() {
        let groups = group_rows(vec![row("B 2", "x"), row("a_1", "y"), row("b-2", "z")]);
        let keys: Vec<&str> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["a-1", "b-2"]);
        assert_eq!(groups[1].len(), 2);
    }

    #[test]
    fn first_known_sex_wins() {
        let mut first = row("p1", "a");
        first.sex = Some("n/a".into());
        let mut second = row("p1", "b");
        second.sex = Some("F".into());
        let group = &group_rows(vec![second, first])[0];
        let individual = consolidate(group, &AuditLog::new());
        assert_eq!(individual.sex, Sex::Female);
    }

    #[test]
    fn genomic_info_travels_with_its_row() {
        let mut first = row("p1", "a");
        first.variant.genomic = Some("chr17-36459258-N-<DEL>".into());
        first.variant.vcf_info = Some("SVTYPE=DEL;END=37832869".into());
        let mut second = row("p1", "b");
        second.variant.genomic = Some("17:1-2:DEL".into());
        second.variant.vcf_info = Some("SVTYPE=DEL;END=2".into());

        let audit = AuditLog::new();
        let individual = consolidate(&group_rows(vec![second, first])[0], &audit);
        assert_eq!(
            individual.notations.vcf_info.as_deref(),
            Some("SVTYPE=DEL;END=37832869")
        );
        assert_eq!(audit.count("notation_conflict"), 1);
    }
}

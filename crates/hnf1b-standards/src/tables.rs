//! Typed lookup tables built from the curated CSV files.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

use hnf1b_model::{OntologyClass, Resource};

use crate::error::{Result, StandardsError};

/// Creates a compact key by keeping only lowercase alphanumeric characters.
///
/// `Renal_Insufficancy`, `renal insufficancy` and `RenalInsufficancy`
/// all compact to `renalinsufficancy`.
pub fn compact_key(value: &str) -> String {
    value
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|ch| ch.to_ascii_lowercase())
        .collect()
}

/// Lowercase, trim and collapse internal whitespace.
pub fn phrase_key(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn read_rows<T>(table: &str, data: &str) -> Result<Vec<T>>
where
    T: for<'de> Deserialize<'de>,
{
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(data.as_bytes());
    let mut rows = Vec::new();
    for record in reader.deserialize::<T>() {
        let row = record.map_err(|source| StandardsError::Csv {
            table: table.to_string(),
            source,
        })?;
        rows.push(row);
    }
    Ok(rows)
}

fn require_curie(table: &str, row: usize, code: &str) -> Result<()> {
    match code.split_once(':') {
        Some((prefix, local)) if !prefix.is_empty() && !local.is_empty() => Ok(()),
        _ => Err(StandardsError::invalid(
            table,
            row,
            format!("'{code}' is not a prefixed ontology code"),
        )),
    }
}

// =============================================================================
// Term labels
// =============================================================================

#[derive(Debug, Deserialize)]
struct TermRow {
    code: String,
    label: String,
}

/// Curated code → label table, the offline source of truth for labels.
#[derive(Debug, Clone, Default)]
pub struct TermTable {
    labels: BTreeMap<String, String>,
}

impl TermTable {
    pub fn parse(data: &str) -> Result<Self> {
        let mut labels = BTreeMap::new();
        for (idx, row) in read_rows::<TermRow>("terms", data)?.into_iter().enumerate() {
            require_curie("terms", idx + 1, &row.code)?;
            labels.insert(row.code, row.label);
        }
        Ok(Self { labels })
    }

    pub fn label(&self, code: &str) -> Option<&str> {
        self.labels.get(code).map(String::as_str)
    }

    pub fn class(&self, code: &str) -> Option<OntologyClass> {
        self.label(code).map(|label| OntologyClass::new(code, label))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

// =============================================================================
// Phrase tables (staging, onset, modifiers)
// =============================================================================

#[derive(Debug, Deserialize)]
struct PhraseRow {
    #[serde(alias = "value", alias = "term")]
    phrase: String,
    code: String,
    label: String,
}

/// Maps free-text phrases to ontology classes.
#[derive(Debug, Clone, Default)]
pub struct PhraseTable {
    by_phrase: BTreeMap<String, OntologyClass>,
    by_compact: BTreeMap<String, OntologyClass>,
}

impl PhraseTable {
    fn parse(table: &str, data: &str) -> Result<Self> {
        let mut by_phrase = BTreeMap::new();
        let mut by_compact = BTreeMap::new();
        for (idx, row) in read_rows::<PhraseRow>(table, data)?.into_iter().enumerate() {
            require_curie(table, idx + 1, &row.code)?;
            let class = OntologyClass::new(row.code, row.label);
            by_compact.insert(compact_key(&row.phrase), class.clone());
            by_phrase.insert(phrase_key(&row.phrase), class);
        }
        Ok(Self {
            by_phrase,
            by_compact,
        })
    }

    /// Exact (case- and whitespace-insensitive) phrase match.
    pub fn exact(&self, raw: &str) -> Option<&OntologyClass> {
        self.by_phrase.get(&phrase_key(raw))
    }

    /// Match ignoring punctuation and spacing (`Stage-3`, `stage3`).
    pub fn compact(&self, raw: &str) -> Option<&OntologyClass> {
        let key = compact_key(raw);
        if key.is_empty() {
            return None;
        }
        self.by_compact.get(&key)
    }

    /// All classes whose phrase occurs as a whole word in `text`, in text order.
    pub fn find_words(&self, text: &str) -> Vec<&OntologyClass> {
        let words: Vec<String> = text
            .split(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .collect();
        let mut found = Vec::new();
        let mut seen = BTreeSet::new();
        for width in (1..=3).rev() {
            for (position, window) in words.windows(width).enumerate() {
                let phrase = window.join(" ");
                if let Some(class) = self.by_phrase.get(&phrase)
                    && seen.insert(class.id.clone())
                {
                    found.push((position, class));
                }
            }
        }
        found.sort_by_key(|(pos, _)| *pos);
        found.into_iter().map(|(_, class)| class).collect()
    }

    pub fn len(&self) -> usize {
        self.by_phrase.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_phrase.is_empty()
    }

    pub fn classes(&self) -> impl Iterator<Item = &OntologyClass> {
        self.by_phrase.values()
    }
}

/// Renal insufficiency staging table.
#[derive(Debug, Clone, Default)]
pub struct StagingTable {
    phrases: PhraseTable,
}

impl StagingTable {
    pub fn parse(data: &str) -> Result<Self> {
        Ok(Self {
            phrases: PhraseTable::parse("renal_stages", data)?,
        })
    }

    /// Look up a staging value (`stage 3`, `CKD3`, `G3b`, `ESRD`).
    ///
    /// Falls back to the longest table entry (of at least three characters)
    /// that prefixes the compacted input, so `stage 3 (eGFR 45)` still maps.
    pub fn lookup(&self, raw: &str) -> Option<&OntologyClass> {
        if let Some(class) = self
            .phrases
            .exact(raw)
            .or_else(|| self.phrases.compact(raw))
        {
            return Some(class);
        }
        let key = compact_key(raw);
        self.phrases
            .by_compact
            .iter()
            .filter(|(entry, _)| entry.len() >= 3 && key.starts_with(entry.as_str()))
            .max_by_key(|(entry, _)| entry.len())
            .map(|(_, class)| class)
    }

    /// Every distinct stage class (used to seed label resolution).
    pub fn classes(&self) -> impl Iterator<Item = &OntologyClass> {
        self.phrases.classes()
    }
}

/// Developmental-stage onset terms.
#[derive(Debug, Clone, Default)]
pub struct OnsetTable {
    phrases: PhraseTable,
}

impl OnsetTable {
    pub fn parse(data: &str) -> Result<Self> {
        Ok(Self {
            phrases: PhraseTable::parse("onset_terms", data)?,
        })
    }

    /// Exact special-term match (`prenatal`, `At birth`).
    pub fn lookup(&self, raw: &str) -> Option<&OntologyClass> {
        self.phrases.exact(raw)
    }

    /// First stage word mentioned in free text (`yes (prenatal)`).
    pub fn find_in(&self, text: &str) -> Option<&OntologyClass> {
        self.phrases.find_words(text).into_iter().next()
    }

    /// Onset class by code.
    pub fn by_code(&self, code: &str) -> Option<&OntologyClass> {
        self.phrases.classes().find(|class| class.id == code)
    }
}

/// Laterality / severity / progression modifiers.
#[derive(Debug, Clone, Default)]
pub struct ModifierTable {
    phrases: PhraseTable,
}

impl ModifierTable {
    pub fn parse(data: &str) -> Result<Self> {
        Ok(Self {
            phrases: PhraseTable::parse("modifiers", data)?,
        })
    }

    /// Modifiers mentioned in free text, in order of appearance.
    pub fn find_in(&self, text: &str) -> Vec<OntologyClass> {
        self.phrases.find_words(text).into_iter().cloned().collect()
    }
}

// =============================================================================
// Phenotype column registry
// =============================================================================

/// How a clinical column is turned into a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureHandler {
    /// Presence/negation tokens against the column's fixed term.
    General,
    /// Values are looked up in the renal staging table.
    RenalStaging,
}

#[derive(Debug, Deserialize)]
struct FeatureColumnRow {
    key: String,
    aliases: String,
    code: String,
    label: String,
    handler: FeatureHandler,
    #[serde(default)]
    onset: Option<String>,
}

/// One recognized clinical column.
#[derive(Debug, Clone)]
pub struct FeatureColumn {
    /// Canonical feature key (`renal_cysts`).
    pub key: String,
    /// Header spellings seen in curated sheets.
    pub aliases: Vec<String>,
    /// Term emitted when the column reports presence.
    pub term: OntologyClass,
    pub handler: FeatureHandler,
    /// Fixed onset code for findings that are stage-bound (antenatal findings).
    pub onset: Option<String>,
}

/// Registry of clinical columns, in table order.
#[derive(Debug, Clone, Default)]
pub struct FeatureRegistry {
    columns: Vec<FeatureColumn>,
    by_header: BTreeMap<String, usize>,
}

impl FeatureRegistry {
    pub fn parse(data: &str) -> Result<Self> {
        let mut columns = Vec::new();
        let mut by_header = BTreeMap::new();
        for (idx, row) in read_rows::<FeatureColumnRow>("phenotype_columns", data)?
            .into_iter()
            .enumerate()
        {
            require_curie("phenotype_columns", idx + 1, &row.code)?;
            let aliases: Vec<String> = row
                .aliases
                .split(';')
                .map(str::trim)
                .filter(|alias| !alias.is_empty())
                .map(String::from)
                .collect();
            let position = columns.len();
            for header in aliases.iter().chain(std::iter::once(&row.key)) {
                let key = compact_key(header);
                if let Some(previous) = by_header.insert(key, position)
                    && previous != position
                {
                    return Err(StandardsError::invalid(
                        "phenotype_columns",
                        idx + 1,
                        format!("header alias '{header}' is claimed by two columns"),
                    ));
                }
            }
            columns.push(FeatureColumn {
                key: row.key,
                aliases,
                term: OntologyClass::new(row.code, row.label),
                handler: row.handler,
                onset: row.onset.filter(|code| !code.trim().is_empty()),
            });
        }
        Ok(Self { columns, by_header })
    }

    /// Match a spreadsheet header to a registered column.
    pub fn match_header(&self, header: &str) -> Option<&FeatureColumn> {
        self.by_header
            .get(&compact_key(header))
            .map(|idx| &self.columns[*idx])
    }

    pub fn get(&self, key: &str) -> Option<&FeatureColumn> {
        self.columns.iter().find(|column| column.key == key)
    }

    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }
}

// =============================================================================
// Sequence registry
// =============================================================================

/// A reference sequence a chromosome name can be placed on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SequenceEntry {
    pub chromosome: String,
    /// RefSeq accession with version (`NC_000017.11`).
    pub refseq: String,
    /// GA4GH refget accession (`SQ.` + sha512t24u of the sequence).
    pub refget: String,
    pub assembly: String,
}

#[derive(Debug, Clone, Default)]
pub struct SequenceRegistry {
    entries: Vec<SequenceEntry>,
}

impl SequenceRegistry {
    pub fn parse(data: &str) -> Result<Self> {
        let entries = read_rows::<SequenceEntry>("sequences", data)?;
        for (idx, entry) in entries.iter().enumerate() {
            if !entry.refget.starts_with("SQ.") {
                return Err(StandardsError::invalid(
                    "sequences",
                    idx + 1,
                    format!("refget accession '{}' must start with 'SQ.'", entry.refget),
                ));
            }
        }
        Ok(Self { entries })
    }

    /// Entry for a chromosome name (`17`, `chr17`).
    pub fn by_chromosome(&self, chromosome: &str) -> Option<&SequenceEntry> {
        let name = chromosome.trim();
        let name = name
            .strip_prefix("chr")
            .or_else(|| name.strip_prefix("CHR"))
            .unwrap_or(name);
        self.entries
            .iter()
            .find(|entry| entry.chromosome.eq_ignore_ascii_case(name))
    }

    /// Entry for a versioned RefSeq accession. Other versions do not match.
    pub fn by_refseq(&self, accession: &str) -> Option<&SequenceEntry> {
        self.entries
            .iter()
            .find(|entry| entry.refseq.eq_ignore_ascii_case(accession.trim()))
    }

    pub fn entries(&self) -> &[SequenceEntry] {
        &self.entries
    }
}

// =============================================================================
// Resources
// =============================================================================

#[derive(Debug, Deserialize)]
struct ResourceRow {
    id: String,
    name: String,
    url: String,
    version: String,
    namespace_prefix: String,
    iri_prefix: String,
}

#[derive(Debug, Clone, Default)]
pub struct ResourceTable {
    resources: Vec<Resource>,
}

impl ResourceTable {
    pub fn parse(data: &str) -> Result<Self> {
        let resources = read_rows::<ResourceRow>("resources", data)?
            .into_iter()
            .map(|row| Resource {
                id: row.id,
                name: row.name,
                url: row.url,
                version: row.version,
                namespace_prefix: row.namespace_prefix,
                iri_prefix: row.iri_prefix,
            })
            .collect();
        Ok(Self { resources })
    }

    /// Resources whose namespace prefix is in `prefixes`, sorted by prefix.
    pub fn for_prefixes<'a>(&self, prefixes: impl IntoIterator<Item = &'a str>) -> Vec<Resource> {
        let wanted: BTreeSet<String> = prefixes
            .into_iter()
            .map(str::to_ascii_uppercase)
            .collect();
        let mut selected: Vec<Resource> = self
            .resources
            .iter()
            .filter(|r| wanted.contains(&r.namespace_prefix.to_ascii_uppercase()))
            .cloned()
            .collect();
        selected.sort_by(|a, b| a.namespace_prefix.cmp(&b.namespace_prefix));
        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_key_strips_punctuation() {
        assert_eq!(compact_key("Renal_Insufficancy"), "renalinsufficancy");
        assert_eq!(compact_key(" CKD-3 "), "ckd3");
    }

    #[test]
    fn phrase_words_keep_text_order() {
        let table = PhraseTable::parse(
            "modifiers",
            "term,code,label\nbilateral,HP:0012832,Bilateral\nsevere,HP:0012828,Severe\n",
        )
        .unwrap();
        let found = table.find_words("severe, bilateral");
        let ids: Vec<&str> = found.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["HP:0012828", "HP:0012832"]);
    }

    #[test]
    fn rejects_uncoded_terms() {
        let err = TermTable::parse("code,label\nrenal cyst,Renal cyst\n").unwrap_err();
        assert!(matches!(err, StandardsError::InvalidRow { .. }));
    }
}

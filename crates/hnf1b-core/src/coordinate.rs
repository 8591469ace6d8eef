//! Genomic coordinate and CNV notation parsing.
//!
//! Accepted forms:
//! - calls: `chr17-37710502-ATCG-A`, `17:37710502:ATCG:A`, `chr17:37710502 ATCG>A`
//! - ranges: `17:36459258-37832869:DEL`, `chr17:36459258-37832869:DUP`
//! - HGVS on a RefSeq chromosome: `NC_000017.11:g.37739578C>T`,
//!   `NC_000017.11:g.36459258_37832869del`, `..dup`, `..insATG`, `..delinsTT`
//! - symbolic VCF alleles with an INFO string: `chr17-36459258-N-<DEL>` +
//!   `SVTYPE=DEL;END=37832869`
//!
//! Anything malformed or ambiguous yields `None`.

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use hnf1b_model::{NormalizedCoordinate, VariantType};
use hnf1b_standards::SequenceRegistry;

const CHROM: &str = r"(?:chr)?([0-9]{1,2}|x|y|mt|m)";

static CALL_DELIMITED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)^{CHROM}[-:_](\d+)[-:_]([acgtn]+)[-:_]([acgtn]+)$"))
        .expect("Invalid call regex")
});

static CALL_ARROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)^{CHROM}:(\d+)\s*([acgtn]+)\s*>\s*([acgtn]+)$"))
        .expect("Invalid arrow call regex")
});

static RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^{CHROM}:(\d+)-(\d+)[:\s_]\s*(del|dup|deletion|duplication|loss|gain|cnv)$"
    ))
    .expect("Invalid range regex")
});

static SYMBOLIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)^{CHROM}[-:_](\d+)[-:_]([acgtn]+)[-:_]<([a-z:]+)>$"))
        .expect("Invalid symbolic allele regex")
});

static HGVS_SUBSTITUTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(NC_\d+\.\d+):g\.(\d+)([acgt])>([acgt])$").expect("Invalid HGVS regex")
});

static HGVS_EDIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(NC_\d+\.\d+):g\.(\d+)(?:_(\d+))?(delins|del|dup|ins)([acgtn]*)$")
        .expect("Invalid HGVS edit regex")
});

/// Canonical chromosome name (`chr17` → `17`, `chrM` → `MT`).
pub fn normalize_chromosome(raw: &str) -> Option<String> {
    let name = raw.trim();
    let name = name
        .get(..3)
        .filter(|prefix| prefix.eq_ignore_ascii_case("chr"))
        .map_or(name, |_| &name[3..]);
    let upper = name.to_ascii_uppercase();
    match upper.as_str() {
        "X" | "Y" | "MT" => Some(upper),
        "M" => Some("MT".to_string()),
        digits => {
            let number: u8 = digits.parse().ok()?;
            (1..=22).contains(&number).then(|| number.to_string())
        }
    }
}

/// Parse a coordinate or CNV notation.
///
/// `sequences` resolves HGVS accessions; accessions it does not list exactly
/// (including other versions of a listed one) are rejected.
pub fn parse_coordinate(raw: &str, sequences: &SequenceRegistry) -> Option<NormalizedCoordinate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    let parsed = parse_call(value)
        .or_else(|| parse_range(value))
        .or_else(|| parse_hgvs(value, sequences));
    if parsed.is_none() {
        trace!(notation = value, "Not a coordinate notation");
    }
    parsed
}

/// Parse a coordinate, using a VCF INFO string for symbolic alleles.
pub fn parse_coordinate_with_info(
    raw: &str,
    info: Option<&str>,
    sequences: &SequenceRegistry,
) -> Option<NormalizedCoordinate> {
    let value = raw.trim();
    if let Some(caps) = SYMBOLIC.captures(value) {
        return parse_symbolic(
            caps.get(1)?.as_str(),
            caps.get(2)?.as_str(),
            caps.get(4)?.as_str(),
            info?,
        );
    }
    parse_coordinate(value, sequences)
}

fn parse_call(value: &str) -> Option<NormalizedCoordinate> {
    let caps = CALL_DELIMITED
        .captures(value)
        .or_else(|| CALL_ARROW.captures(value))?;
    let chromosome = normalize_chromosome(caps.get(1)?.as_str())?;
    let position: u64 = caps.get(2)?.as_str().parse().ok()?;
    let reference = caps.get(3)?.as_str().to_ascii_uppercase();
    let alternate = caps.get(4)?.as_str().to_ascii_uppercase();
    if reference == alternate {
        return None;
    }
    NormalizedCoordinate::from_alleles(chromosome, position, reference, alternate).ok()
}

fn range_type(tag: &str) -> Option<VariantType> {
    match tag.to_ascii_lowercase().as_str() {
        "del" | "deletion" | "loss" => Some(VariantType::Deletion),
        "dup" | "duplication" | "gain" => Some(VariantType::Duplication),
        // Direction unknown.
        _ => None,
    }
}

fn parse_range(value: &str) -> Option<NormalizedCoordinate> {
    let caps = RANGE.captures(value)?;
    let chromosome = normalize_chromosome(caps.get(1)?.as_str())?;
    let start: u64 = caps.get(2)?.as_str().parse().ok()?;
    let end: u64 = caps.get(3)?.as_str().parse().ok()?;
    let variant_type = range_type(caps.get(4)?.as_str())?;
    NormalizedCoordinate::from_range(chromosome, start, end, variant_type).ok()
}

fn parse_hgvs(value: &str, sequences: &SequenceRegistry) -> Option<NormalizedCoordinate> {
    if let Some(caps) = HGVS_SUBSTITUTION.captures(value) {
        let entry = sequences.by_refseq(caps.get(1)?.as_str())?;
        let position: u64 = caps.get(2)?.as_str().parse().ok()?;
        let reference = caps.get(3)?.as_str().to_ascii_uppercase();
        let alternate = caps.get(4)?.as_str().to_ascii_uppercase();
        if reference == alternate {
            return None;
        }
        return NormalizedCoordinate::from_alleles(&entry.chromosome, position, reference, alternate)
            .ok();
    }

    let caps = HGVS_EDIT.captures(value)?;
    let entry = sequences.by_refseq(caps.get(1)?.as_str())?;
    let start: u64 = caps.get(2)?.as_str().parse().ok()?;
    let end: u64 = match caps.get(3) {
        Some(end) => end.as_str().parse().ok()?,
        None => start,
    };
    let sequence = caps.get(5).map_or("", |m| m.as_str()).to_ascii_uppercase();
    let chromosome = entry.chromosome.clone();

    match caps.get(4)?.as_str().to_ascii_lowercase().as_str() {
        "del" => {
            // Trailing deleted bases are informative only; they must agree in length.
            if !sequence.is_empty() && sequence.len() as u64 != end.checked_sub(start)? + 1 {
                return None;
            }
            NormalizedCoordinate::from_range(chromosome, start, end, VariantType::Deletion).ok()
        }
        "dup" => {
            let coordinate =
                NormalizedCoordinate::from_range(chromosome, start, end, VariantType::Duplication)
                    .ok()?;
            if sequence.is_empty() {
                Some(coordinate)
            } else if sequence.len() as u64 == coordinate.span() {
                Some(coordinate.with_alternate(sequence))
            } else {
                None
            }
        }
        "ins" => {
            // Insertions name the two flanking bases.
            if sequence.is_empty() || start.checked_add(1) != Some(end) {
                return None;
            }
            Some(
                NormalizedCoordinate::from_range(chromosome, start, end, VariantType::Insertion)
                    .ok()?
                    .with_alternate(sequence),
            )
        }
        "delins" => {
            if sequence.is_empty() {
                return None;
            }
            Some(
                NormalizedCoordinate::from_range(chromosome, start, end, VariantType::Indel)
                    .ok()?
                    .with_alternate(sequence),
            )
        }
        _ => None,
    }
}

/// `POS` of a symbolic allele is the padding base; the event starts after it.
fn parse_symbolic(
    chromosome: &str,
    position: &str,
    allele: &str,
    info: &str,
) -> Option<NormalizedCoordinate> {
    let chromosome = normalize_chromosome(chromosome)?;
    let position: u64 = position.parse().ok()?;
    let fields: Vec<(&str, &str)> = info
        .split(';')
        .filter_map(|field| field.split_once('='))
        .map(|(k, v)| (k.trim(), v.trim()))
        .collect();
    let field = |name: &str| {
        fields
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| *value)
    };

    let allele_kind = allele.split(':').next()?;
    let sv_type = field("SVTYPE").unwrap_or(allele_kind);
    if !sv_type.eq_ignore_ascii_case(allele_kind) {
        return None;
    }
    let variant_type = range_type(sv_type)?;
    let end: u64 = field("END")?.parse().ok()?;
    NormalizedCoordinate::from_range(chromosome, position.checked_add(1)?, end, variant_type).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chromosome_names() {
        assert_eq!(normalize_chromosome("chr17").as_deref(), Some("17"));
        assert_eq!(normalize_chromosome("CHRX").as_deref(), Some("X"));
        assert_eq!(normalize_chromosome("chrM").as_deref(), Some("MT"));
        assert_eq!(normalize_chromosome("23"), None);
        assert_eq!(normalize_chromosome("chrUn"), None);
    }

    #[test]
    fn range_tags() {
        assert_eq!(range_type("LOSS"), Some(VariantType::Deletion));
        assert_eq!(range_type("gain"), Some(VariantType::Duplication));
        assert_eq!(range_type("cnv"), None);
    }
}

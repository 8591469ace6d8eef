//! VRS digest computation.
//!
//! Objects are serialized to canonical JSON (keys sorted, no whitespace),
//! nested identifiable objects are replaced by their own digest, and the
//! bytes are hashed with sha512t24u.

use serde_json::{Value, json};
use sha2::{Digest, Sha256, Sha512};

use super::models::{Allele, CopyNumberChange, SequenceLocation, VrsVariation};

/// SHA-512 truncated to 24 bytes, base64url-encoded.
pub fn sha512t24u(data: &[u8]) -> String {
    let mut hasher = Sha512::new();
    hasher.update(data);
    let hash = hasher.finalize();
    base64_url::encode(&hash[..24])
}

/// Canonical JSON text: object keys sorted, no insignificant whitespace.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (idx, key) in keys.into_iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn location_value(location: &SequenceLocation) -> Value {
    json!({
        "end": location.end,
        "sequenceReference": {
            "refgetAccession": location.sequence_reference.refget_accession,
            "type": "SequenceReference"
        },
        "start": location.start,
        "type": "SequenceLocation"
    })
}

/// Canonical JSON of a SequenceLocation.
pub fn sequence_location_json(location: &SequenceLocation) -> String {
    canonical_json(&location_value(location))
}

pub fn sequence_location_digest(location: &SequenceLocation) -> String {
    sha512t24u(sequence_location_json(location).as_bytes())
}

/// Canonical JSON of an Allele, with its location collapsed to a digest.
pub fn allele_json(allele: &Allele) -> String {
    canonical_json(&json!({
        "location": sequence_location_digest(&allele.location),
        "state": {
            "sequence": allele.sequence,
            "type": "LiteralSequenceExpression"
        },
        "type": "Allele"
    }))
}

/// Canonical JSON of a CopyNumberChange, with its location collapsed to a digest.
pub fn copy_number_change_json(cnv: &CopyNumberChange) -> String {
    canonical_json(&json!({
        "copyChange": cnv.copy_change.code(),
        "location": sequence_location_digest(&cnv.location),
        "type": "CopyNumberChange"
    }))
}

/// Canonical digest input for any supported variation.
pub fn variation_json(variation: &VrsVariation) -> String {
    match variation {
        VrsVariation::Allele(allele) => allele_json(allele),
        VrsVariation::CopyNumberChange(cnv) => copy_number_change_json(cnv),
    }
}

/// Type prefix of the identifier (`VA` or `CX`).
pub fn type_prefix(variation: &VrsVariation) -> &'static str {
    match variation {
        VrsVariation::Allele(_) => "VA",
        VrsVariation::CopyNumberChange(_) => "CX",
    }
}

/// `ga4gh:VA.<digest>` or `ga4gh:CX.<digest>`.
pub fn ga4gh_identifier(variation: &VrsVariation) -> String {
    format!(
        "ga4gh:{}.{}",
        type_prefix(variation),
        sha512t24u(variation_json(variation).as_bytes())
    )
}

/// `fallback:VA.<hex>` from SHA-256 of the same canonical JSON.
///
/// The caller supplies a variation built against the chromosome name
/// instead of a refget accession.
pub fn fallback_identifier(variation: &VrsVariation) -> String {
    let digest = Sha256::digest(variation_json(variation).as_bytes());
    let hex = hex::encode(digest);
    format!("fallback:{}.{}", type_prefix(variation), &hex[..32])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vrs::models::SequenceReference;

    fn location(start: u64, end: u64) -> SequenceLocation {
        SequenceLocation {
            sequence_reference: SequenceReference {
                refget_accession: "SQ.dLZ15tNO1Ur0IcGjwc3Sdi_0A6Yf4zm7".to_string(),
            },
            start,
            end,
        }
    }

    #[test]
    fn canonical_json_sorts_nested_keys() {
        let value = json!({"b": 1, "a": {"d": [true, null], "c": "x"}});
        assert_eq!(canonical_json(&value), r#"{"a":{"c":"x","d":[true,null]},"b":1}"#);
    }

    #[test]
    fn location_digest_shape() {
        let digest = sequence_location_digest(&location(37739577, 37739578));
        assert_eq!(digest.len(), 32);
        assert!(!digest.contains('='));
    }

    #[test]
    fn identifiers_have_expected_prefixes() {
        let allele = VrsVariation::Allele(Allele {
            location: location(37739577, 37739578),
            sequence: "T".to_string(),
        });
        let id = ga4gh_identifier(&allele);
        assert!(id.starts_with("ga4gh:VA."));
        assert_eq!(id.len(), "ga4gh:VA.".len() + 32);

        let fallback = fallback_identifier(&allele);
        assert!(fallback.starts_with("fallback:VA."));
        assert_eq!(fallback.len(), "fallback:VA.".len() + 32);
    }
}

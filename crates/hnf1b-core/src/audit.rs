//! Audit trail of values the pipeline skipped or could not interpret.
//!
//! The log is shared across worker threads; every group records into the
//! same instance and the run summary reads the counts at the end.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use serde::Serialize;

/// What was skipped and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditKind {
    /// Clinical value that matched no presence, negation or staging token.
    UnmappedValue { feature: String, value: String },
    /// Age or stage text that could not be parsed.
    UnparsedTemporal { field: String, value: String },
    /// Lower-precedence variant notation that disagrees with the chosen one.
    NotationConflict { chosen: String, ignored: String },
    /// Staging column value missing from the staging table.
    StagingMiss { feature: String, value: String },
    /// Source row that could not be decoded; it belongs to no individual.
    RejectedRow { row: usize, reason: String },
}

impl AuditKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::UnmappedValue { .. } => "unmapped_value",
            Self::UnparsedTemporal { .. } => "unparsed_temporal",
            Self::NotationConflict { .. } => "notation_conflict",
            Self::StagingMiss { .. } => "staging_miss",
            Self::RejectedRow { .. } => "rejected_row",
        }
    }

    pub fn description(&self) -> String {
        match self {
            Self::UnmappedValue { feature, value } => {
                format!("value '{value}' of {feature} matched no known token")
            }
            Self::UnparsedTemporal { field, value } => {
                format!("{field} '{value}' is not a recognizable age or stage")
            }
            Self::NotationConflict { chosen, ignored } => {
                format!("notation '{ignored}' ignored in favour of '{chosen}'")
            }
            Self::StagingMiss { feature, value } => {
                format!("staging value '{value}' of {feature} is not in the staging table")
            }
            Self::RejectedRow { row, reason } => format!("row {row} skipped: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEvent {
    /// Normalized individual key of the group the event belongs to.
    pub individual: String,
    #[serde(flatten)]
    pub kind: AuditKind,
}

/// Thread-safe audit collector.
#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    events: Arc<RwLock<Vec<AuditEvent>>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, individual: &str, kind: AuditKind) {
        if let Ok(mut events) = self.events.write() {
            events.push(AuditEvent {
                individual: individual.to_string(),
                kind,
            });
        }
    }

    pub fn record_unmapped(&self, individual: &str, feature: &str, value: &str) {
        self.record(
            individual,
            AuditKind::UnmappedValue {
                feature: feature.to_string(),
                value: value.to_string(),
            },
        );
    }

    pub fn record_unparsed_temporal(&self, individual: &str, field: &str, value: &str) {
        self.record(
            individual,
            AuditKind::UnparsedTemporal {
                field: field.to_string(),
                value: value.to_string(),
            },
        );
    }

    pub fn record_notation_conflict(&self, individual: &str, chosen: &str, ignored: &str) {
        self.record(
            individual,
            AuditKind::NotationConflict {
                chosen: chosen.to_string(),
                ignored: ignored.to_string(),
            },
        );
    }

    pub fn record_staging_miss(&self, individual: &str, feature: &str, value: &str) {
        self.record(
            individual,
            AuditKind::StagingMiss {
                feature: feature.to_string(),
                value: value.to_string(),
            },
        );
    }

    pub fn record_rejected_row(&self, row: usize, reason: &str) {
        self.record(
            "",
            AuditKind::RejectedRow {
                row,
                reason: reason.to_string(),
            },
        );
    }

    /// Events sorted by individual, then kind, so output is independent of
    /// worker scheduling.
    pub fn events(&self) -> Vec<AuditEvent> {
        let mut events = self.events.read().map(|e| e.clone()).unwrap_or_default();
        events.sort_by(|a, b| {
            a.individual
                .cmp(&b.individual)
                .then_with(|| a.kind.as_str().cmp(b.kind.as_str()))
                .then_with(|| a.kind.description().cmp(&b.kind.description()))
        });
        events
    }

    pub fn events_for(&self, individual: &str) -> Vec<AuditEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.individual == individual)
            .collect()
    }

    /// Number of events per kind.
    pub fn counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        if let Ok(events) = self.events.read() {
            for event in events.iter() {
                *counts.entry(event.kind.as_str()).or_insert(0) += 1;
            }
        }
        counts
    }

    pub fn count(&self, kind: &str) -> usize {
        self.counts().get(kind).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.events.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_by_kind() {
        let log = AuditLog::new();
        log.record_unmapped("ind-1", "renal_cysts", "maybe");
        log.record_unmapped("ind-2", "hypertension", "sometimes");
        log.record_unparsed_temporal("ind-1", "age_onset", "teen");

        assert_eq!(log.len(), 3);
        assert_eq!(log.count("unmapped_value"), 2);
        assert_eq!(log.count("unparsed_temporal"), 1);
        assert_eq!(log.count("staging_miss"), 0);
    }

    #[test]
    fn test_events_sorted_by_individual() {
        let log = AuditLog::new();
        log.record_staging_miss("ind-9", "renal_insufficiency", "stage 7");
        log.record_unmapped("ind-1", "renal_cysts", "maybe");

        let events = log.events();
        assert_eq!(events[0].individual, "ind-1");
        assert_eq!(log.events_for("ind-9").len(), 1);
        assert!(events[1].kind.description().contains("stage 7"));
    }
}

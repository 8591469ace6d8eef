//! Pipeline runner.
//!
//! Rows are read and grouped on the calling thread; groups are then
//! processed in parallel on a rayon pool:
//!
//! 1. **Grouped** - rows consolidated into one individual
//! 2. **FeaturesExtracted** - phenotypic features and diseases
//! 3. **VariantResolved** - coordinate, canonical form and identifier
//! 4. **Assembled** - the canonical record, then stored
//!
//! A failing group never stops the others. Records are returned sorted by id.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use rayon::iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};
use serde::Serialize;
use tracing::{info, info_span, trace, warn};

use hnf1b_ingest::{AnnotationIndex, IngestError, PublicationTable, RowSource};
use hnf1b_model::{Phenopacket, SourceRow};
use hnf1b_ontology::{OntologyResolver, ResolverStats};
use hnf1b_standards::Standards;

use crate::assemble::DocumentAssembler;
use crate::audit::{AuditEvent, AuditLog};
use crate::consolidate::{IndividualGroup, consolidate, group_rows};
use crate::error::{PipelineError, Result};
use crate::features::FeatureExtractor;
use crate::store::{RecordStore, store_with_retry};
use crate::variant::VariantDigestBuilder;

/// Default `createdBy` written into record metadata.
pub const DEFAULT_CREATED_BY: &str = "hnf1b-phenopackets";

/// Cooperative cancellation, checked before each group starts.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Runtime options for one run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Worker threads; 0 uses the rayon default.
    pub workers: usize,
    /// Process only the first N groups in key order.
    pub limit: Option<usize>,
    /// Additional store attempts per record.
    pub store_retries: u32,
    pub created_by: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            workers: 0,
            limit: None,
            store_retries: 2,
            created_by: DEFAULT_CREATED_BY.to_string(),
        }
    }
}

/// Last state a group reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupState {
    Grouped,
    FeaturesExtracted,
    VariantResolved,
    Assembled,
}

impl GroupState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Grouped => "grouped",
            Self::FeaturesExtracted => "features_extracted",
            Self::VariantResolved => "variant_resolved",
            Self::Assembled => "assembled",
        }
    }
}

/// A group that produced no record.
#[derive(Debug, Clone, Serialize)]
pub struct GroupFailure {
    pub key: String,
    pub rows: usize,
    pub state: GroupState,
    pub message: String,
}

/// Aggregate counts for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub rows: usize,
    pub groups: usize,
    pub processed: usize,
    pub with_features: usize,
    pub with_variants: usize,
    pub with_diseases: usize,
    pub failed: usize,
    /// Groups not started because the run was cancelled.
    pub skipped: usize,
    /// Source rows left out because they could not be decoded.
    pub rejected_rows: usize,
    pub unparsed_temporal: usize,
    pub unmapped_values: usize,
    pub staging_misses: usize,
    pub notation_conflicts: usize,
}

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub summary: RunSummary,
    pub failures: Vec<GroupFailure>,
    /// Successfully assembled records, sorted by id.
    pub records: Vec<Phenopacket>,
    pub resolver: ResolverStats,
    pub audit: Vec<AuditEvent>,
}

impl RunReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

enum GroupOutcome {
    Done(Box<Phenopacket>),
    Failed(GroupFailure),
    Skipped,
}

/// The normalization pipeline. Shared, read-only inputs are borrowed.
pub struct Pipeline<'a> {
    standards: &'a Standards,
    resolver: &'a OntologyResolver,
    variants: VariantDigestBuilder,
    annotations: Option<&'a AnnotationIndex>,
    publications: Option<&'a PublicationTable>,
    options: PipelineOptions,
    audit: AuditLog,
    cancel: CancellationToken,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        standards: &'a Standards,
        resolver: &'a OntologyResolver,
        standard_digest: bool,
        options: PipelineOptions,
    ) -> Self {
        Self {
            standards,
            resolver,
            variants: VariantDigestBuilder::new(standards.sequences.clone(), standard_digest),
            annotations: None,
            publications: None,
            options,
            audit: AuditLog::new(),
            cancel: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn with_annotations(mut self, annotations: &'a AnnotationIndex) -> Self {
        self.annotations = Some(annotations);
        self
    }

    #[must_use]
    pub fn with_publications(mut self, publications: &'a PublicationTable) -> Self {
        self.publications = Some(publications);
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Read every row from `source`, then process the groups.
    ///
    /// Rows that fail to decode are logged, audited and left out. Any other
    /// source error aborts the run before any group is processed.
    pub fn run<S: RowSource>(&self, source: S, store: Option<&dyn RecordStore>) -> Result<RunReport> {
        let mut rows = Vec::new();
        for row in source {
            match row {
                Ok(row) => rows.push(row),
                Err(IngestError::InvalidRow { path, row, message }) => {
                    warn!(path = %path.display(), row, error = %message, "Skipping unreadable row");
                    self.audit.record_rejected_row(row, &message);
                }
                Err(error) => return Err(error.into()),
            }
        }
        self.run_rows(rows, store)
    }

    /// Process already-read rows.
    pub fn run_rows(&self, rows: Vec<SourceRow>, store: Option<&dyn RecordStore>) -> Result<RunReport> {
        let span = info_span!("run", rows = rows.len());
        let _guard = span.enter();

        let row_count = rows.len();
        let mut groups = group_rows(rows);
        let total_groups = groups.len();
        if let Some(limit) = self.options.limit {
            groups.truncate(limit);
        }
        info!(groups = total_groups, selected = groups.len(), "Rows grouped");

        let created = Utc::now();
        let mut builder = rayon::ThreadPoolBuilder::new();
        if self.options.workers > 0 {
            builder = builder.num_threads(self.options.workers);
        }
        let pool = builder.build()?;
        let outcomes: Vec<GroupOutcome> = pool.install(|| {
            groups
                .par_iter()
                .enumerate()
                .map(|(ordinal, group)| self.process_group(ordinal, group, created, store))
                .collect()
        });

        let mut records = Vec::new();
        let mut failures = Vec::new();
        let mut skipped = 0;
        for outcome in outcomes {
            match outcome {
                GroupOutcome::Done(record) => records.push(*record),
                GroupOutcome::Failed(failure) => failures.push(failure),
                GroupOutcome::Skipped => skipped += 1,
            }
        }
        records.sort_by(|a, b| a.id.cmp(&b.id));
        failures.sort_by(|a, b| a.key.cmp(&b.key));

        if let Some(store) = store
            && let Err(error) = store.finish()
        {
            warn!(%error, "Failed to finish record store");
            failures.push(GroupFailure {
                key: String::new(),
                rows: 0,
                state: GroupState::Assembled,
                message: error.to_string(),
            });
        }

        let summary = RunSummary {
            rows: row_count,
            groups: total_groups,
            processed: records.len() + failures.len(),
            with_features: records.iter().filter(|r| r.has_features()).count(),
            with_variants: records.iter().filter(|r| r.has_variants()).count(),
            with_diseases: records.iter().filter(|r| r.has_diseases()).count(),
            failed: failures.len(),
            skipped,
            rejected_rows: self.audit.count("rejected_row"),
            unparsed_temporal: self.audit.count("unparsed_temporal"),
            unmapped_values: self.audit.count("unmapped_value"),
            staging_misses: self.audit.count("staging_miss"),
            notation_conflicts: self.audit.count("notation_conflict"),
        };
        info!(
            processed = summary.processed,
            failed = summary.failed,
            skipped = summary.skipped,
            rejected_rows = summary.rejected_rows,
            "Run finished"
        );

        Ok(RunReport {
            summary,
            failures,
            records,
            resolver: self.resolver.stats(),
            audit: self.audit.events(),
        })
    }

    fn process_group(
        &self,
        ordinal: usize,
        group: &IndividualGroup,
        created: DateTime<Utc>,
        store: Option<&dyn RecordStore>,
    ) -> GroupOutcome {
        if self.cancel.is_cancelled() {
            return GroupOutcome::Skipped;
        }
        let span = info_span!("group", ordinal, rows = group.len());
        let _guard = span.enter();
        trace!(key = %group.key, "Processing group");

        let fail = |state: GroupState, error: PipelineError| {
            warn!(state = state.as_str(), %error, "Group failed");
            GroupOutcome::Failed(GroupFailure {
                key: group.key.clone(),
                rows: group.len(),
                state,
                message: error.to_string(),
            })
        };

        let individual = consolidate(group, &self.audit);

        let clinical = FeatureExtractor::new(self.standards, self.resolver, &self.audit)
            .extract(&individual);

        let variant = self.variants.build(&individual.notations, self.annotations);

        let assembler = DocumentAssembler::new(
            self.standards,
            self.resolver,
            self.publications,
            &self.audit,
            self.options.created_by.clone(),
        );
        let record = match assembler.assemble(&individual, clinical, variant.as_ref(), created) {
            Ok(record) => record,
            Err(error) => return fail(GroupState::VariantResolved, error),
        };

        if let Some(store) = store
            && let Err(source) = store_with_retry(store, &record, self.options.store_retries)
        {
            return fail(
                GroupState::Assembled,
                PipelineError::Store {
                    id: record.id.clone(),
                    source,
                },
            );
        }
        GroupOutcome::Done(Box::new(record))
    }
}

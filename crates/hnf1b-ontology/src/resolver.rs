//! Tiered term resolver.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, warn};

use hnf1b_model::{
    OntologyClass, ResolutionTier, ResolvedTerm, normalize_term_code, placeholder_label,
};
use hnf1b_standards::TermTable;

use crate::config::ResolverConfig;
use crate::disk::{CacheEntry, DiskCache};
use crate::error::Result;
use crate::provider::{HttpLabelProvider, LabelProvider};

/// Hit counts per tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolverStats {
    pub memory: usize,
    pub disk: usize,
    pub remote: usize,
    pub static_table: usize,
    pub placeholder: usize,
    pub provider_failures: usize,
}

#[derive(Debug, Default)]
struct StatCounters {
    memory: AtomicUsize,
    disk: AtomicUsize,
    remote: AtomicUsize,
    static_table: AtomicUsize,
    placeholder: AtomicUsize,
    provider_failures: AtomicUsize,
}

impl StatCounters {
    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> ResolverStats {
        ResolverStats {
            memory: self.memory.load(Ordering::Relaxed),
            disk: self.disk.load(Ordering::Relaxed),
            remote: self.remote.load(Ordering::Relaxed),
            static_table: self.static_table.load(Ordering::Relaxed),
            placeholder: self.placeholder.load(Ordering::Relaxed),
            provider_failures: self.provider_failures.load(Ordering::Relaxed),
        }
    }
}

/// Resolves ontology codes to labels through memory, disk, remote
/// providers, the static table, and finally a placeholder.
///
/// Safe to share across worker threads. The first label cached for a code
/// is the one every later lookup in the run returns.
pub struct OntologyResolver {
    memory: Mutex<HashMap<String, ResolvedTerm>>,
    disk: Option<DiskCache>,
    providers: Vec<Box<dyn LabelProvider>>,
    static_terms: TermTable,
    timeout: Duration,
    offline: bool,
    stats: StatCounters,
}

impl OntologyResolver {
    /// Resolver with HTTP providers built from `config`.
    pub fn new(config: &ResolverConfig, static_terms: TermTable) -> Result<Self> {
        let providers = if config.offline {
            Vec::new()
        } else {
            config
                .providers
                .iter()
                .cloned()
                .map(|provider| {
                    HttpLabelProvider::new(provider)
                        .map(|p| Box::new(p) as Box<dyn LabelProvider>)
                })
                .collect::<Result<Vec<_>>>()?
        };
        Ok(Self::with_providers(config, static_terms, providers))
    }

    /// Resolver with caller-supplied providers, in priority order.
    pub fn with_providers(
        config: &ResolverConfig,
        static_terms: TermTable,
        providers: Vec<Box<dyn LabelProvider>>,
    ) -> Self {
        Self {
            memory: Mutex::new(HashMap::new()),
            disk: config
                .cache_dir
                .as_ref()
                .map(|dir| DiskCache::new(dir, config.ttl_days)),
            providers,
            static_terms,
            timeout: config.timeout,
            offline: config.offline,
            stats: StatCounters::default(),
        }
    }

    pub fn stats(&self) -> ResolverStats {
        self.stats.snapshot()
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Resolve `raw_code` to a label. Never fails.
    pub fn resolve(&self, raw_code: &str) -> ResolvedTerm {
        let code = normalize_term_code(raw_code);

        if let Some(term) = self.memory_get(&code) {
            StatCounters::bump(&self.stats.memory);
            debug!(code = %code, "Term resolved from memory");
            return ResolvedTerm {
                tier: ResolutionTier::Memory,
                ..term
            };
        }

        let now = Utc::now();

        if let Some(entry) = self.disk.as_ref().and_then(|disk| disk.get(&code, now)) {
            StatCounters::bump(&self.stats.disk);
            debug!(code = %code, "Term resolved from disk cache");
            let term = ResolvedTerm {
                code: entry.code,
                label: entry.label,
                tier: ResolutionTier::Disk,
                resolved_at: entry.resolved_at,
            };
            return self.memory_insert(term);
        }

        if !self.offline {
            for provider in &self.providers {
                match provider.fetch_label(&code, self.timeout) {
                    Ok(label) => {
                        StatCounters::bump(&self.stats.remote);
                        debug!(code = %code, provider = provider.name(), "Term resolved remotely");
                        let term = ResolvedTerm {
                            code: code.clone(),
                            label,
                            tier: ResolutionTier::Remote {
                                provider: provider.name().to_string(),
                            },
                            resolved_at: now,
                        };
                        self.persist(&term);
                        return self.memory_insert(term);
                    }
                    Err(error) => {
                        StatCounters::bump(&self.stats.provider_failures);
                        warn!(code = %code, provider = provider.name(), %error, "Label provider failed");
                    }
                }
            }
        }

        if let Some(label) = self.static_terms.label(&code) {
            StatCounters::bump(&self.stats.static_table);
            debug!(code = %code, "Term resolved from static table");
            let term = ResolvedTerm {
                code: code.clone(),
                label: label.to_string(),
                tier: ResolutionTier::Static,
                resolved_at: now,
            };
            self.persist(&term);
            return self.memory_insert(term);
        }

        StatCounters::bump(&self.stats.placeholder);
        warn!(code = %code, "No tier knows this code; using placeholder");
        let term = ResolvedTerm {
            label: placeholder_label(&code),
            code,
            tier: ResolutionTier::Placeholder,
            resolved_at: now,
        };
        self.memory_insert(term)
    }

    /// Resolve straight to an ontology class.
    pub fn resolve_class(&self, raw_code: &str) -> OntologyClass {
        self.resolve(raw_code).to_class()
    }

    fn memory_get(&self, code: &str) -> Option<ResolvedTerm> {
        let memory = self
            .memory
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        memory.get(code).cloned()
    }

    /// Insert unless another thread got there first; either way return the
    /// cached term.
    fn memory_insert(&self, term: ResolvedTerm) -> ResolvedTerm {
        let mut memory = self
            .memory
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let tier = term.tier.clone();
        let cached = memory.entry(term.code.clone()).or_insert(term).clone();
        ResolvedTerm { tier, ..cached }
    }

    fn persist(&self, term: &ResolvedTerm) {
        let Some(disk) = &self.disk else {
            return;
        };
        let entry = CacheEntry {
            code: term.code.clone(),
            label: term.label.clone(),
            resolved_at: term.resolved_at,
        };
        if let Err(error) = disk.put(&entry) {
            warn!(code = %term.code, %error, "Failed to write disk cache entry");
        }
    }
}

impl std::fmt::Debug for OntologyResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OntologyResolver")
            .field("providers", &self.provider_names())
            .field("disk", &self.disk)
            .field("offline", &self.offline)
            .finish_non_exhaustive()
    }
}

#![allow(missing_docs)]

use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{TimeDelta, Utc};

use hnf1b_model::ResolutionTier;
use hnf1b_ontology::{
    CacheEntry, DiskCache, LabelProvider, OntologyResolver, ProviderError, ResolverConfig,
};
use hnf1b_standards::TermTable;

/// Provider answering from a fixed list and counting every call.
struct CountingProvider {
    name: &'static str,
    calls: Arc<AtomicUsize>,
    answers: Vec<(&'static str, &'static str)>,
}

impl LabelProvider for CountingProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn fetch_label(&self, code: &str, _timeout: Duration) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answers
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, label)| (*label).to_string())
            .ok_or_else(|| ProviderError::NotFound {
                provider: self.name.to_string(),
                code: code.to_string(),
            })
    }
}

/// Provider that always times out.
struct UnreachableProvider;

impl LabelProvider for UnreachableProvider {
    fn name(&self) -> &str {
        "unreachable"
    }

    fn fetch_label(&self, _code: &str, _timeout: Duration) -> Result<String, ProviderError> {
        Err(ProviderError::Timeout {
            provider: "unreachable".to_string(),
        })
    }
}

fn static_terms() -> TermTable {
    TermTable::parse("code,label\nHP:0000107,Renal cyst\nHP:0012622,Chronic kidney disease\n")
        .expect("static table")
}

fn counting(calls: &Arc<AtomicUsize>) -> Box<dyn LabelProvider> {
    Box::new(CountingProvider {
        name: "counting",
        calls: Arc::clone(calls),
        answers: vec![("HP:0000003", "Multicystic kidney dysplasia")],
    })
}

#[test]
fn test_memory_hit_never_reaches_remote() {
    let calls = Arc::new(AtomicUsize::new(0));
    let config = ResolverConfig {
        providers: Vec::new(),
        ..ResolverConfig::default()
    };
    let resolver = OntologyResolver::with_providers(&config, static_terms(), vec![counting(&calls)]);

    let first = resolver.resolve("HP:0000003");
    assert_eq!(first.label, "Multicystic kidney dysplasia");
    assert!(matches!(first.tier, ResolutionTier::Remote { ref provider } if provider == "counting"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let second = resolver.resolve("hp:0000003");
    assert_eq!(second.tier, ResolutionTier::Memory);
    assert_eq!(second.label, first.label);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let stats = resolver.stats();
    assert_eq!(stats.remote, 1);
    assert_eq!(stats.memory, 1);
}

#[test]
fn test_static_fallback_with_no_reachable_provider() {
    let config = ResolverConfig {
        timeout: Duration::from_millis(10),
        ..ResolverConfig::default()
    };
    let resolver =
        OntologyResolver::with_providers(&config, static_terms(), vec![Box::new(UnreachableProvider)]);

    let term = resolver.resolve("HP_0000107");
    assert_eq!(term.code, "HP:0000107");
    assert_eq!(term.label, "Renal cyst");
    assert_eq!(term.tier, ResolutionTier::Static);
    assert_eq!(resolver.stats().provider_failures, 1);
}

#[test]
fn test_zero_providers_falls_back_to_static() {
    let resolver = OntologyResolver::with_providers(&ResolverConfig::offline(), static_terms(), Vec::new());
    let term = resolver.resolve("HP:0012622");
    assert_eq!(term.label, "Chronic kidney disease");
    assert_eq!(term.tier, ResolutionTier::Static);
}

#[test]
fn test_unknown_code_gets_placeholder_not_persisted() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = ResolverConfig {
        cache_dir: Some(dir.path().to_path_buf()),
        ..ResolverConfig::offline()
    };
    let resolver = OntologyResolver::with_providers(&config, static_terms(), Vec::new());

    let term = resolver.resolve("HP:9999999");
    assert!(term.is_placeholder());
    assert_eq!(term.label, "Unknown term (HP:9999999)");
    assert!(!dir.path().join("HP_9999999.json").exists());

    // Placeholders are still cached for the rest of the run.
    assert_eq!(resolver.resolve("HP:9999999").tier, ResolutionTier::Memory);
}

#[test]
fn test_offline_mode_skips_providers() {
    let calls = Arc::new(AtomicUsize::new(0));
    let resolver =
        OntologyResolver::with_providers(&ResolverConfig::offline(), static_terms(), vec![counting(&calls)]);
    let term = resolver.resolve("HP:0000003");
    assert!(term.is_placeholder());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_remote_success_populates_disk_for_next_run() {
    let dir = tempfile::tempdir().expect("tempdir");
    let calls = Arc::new(AtomicUsize::new(0));
    let config = ResolverConfig {
        cache_dir: Some(dir.path().to_path_buf()),
        providers: Vec::new(),
        ..ResolverConfig::default()
    };

    let first_run = OntologyResolver::with_providers(&config, static_terms(), vec![counting(&calls)]);
    first_run.resolve("HP:0000003");
    let written = fs::read_to_string(dir.path().join("HP_0000003.json")).expect("cache file");
    assert!(written.contains("Multicystic kidney dysplasia"));

    let second_run = OntologyResolver::with_providers(&config, static_terms(), vec![counting(&calls)]);
    let term = second_run.resolve("HP:0000003");
    assert_eq!(term.tier, ResolutionTier::Disk);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_expired_disk_entry_is_refetched() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cache = DiskCache::new(dir.path(), 7);
    cache
        .put(&CacheEntry {
            code: "HP:0000003".to_string(),
            label: "Stale label".to_string(),
            resolved_at: Utc::now() - TimeDelta::days(8),
        })
        .expect("seed cache");

    let calls = Arc::new(AtomicUsize::new(0));
    let config = ResolverConfig {
        cache_dir: Some(dir.path().to_path_buf()),
        ttl_days: 7,
        providers: Vec::new(),
        ..ResolverConfig::default()
    };
    let resolver = OntologyResolver::with_providers(&config, static_terms(), vec![counting(&calls)]);
    let term = resolver.resolve("HP:0000003");
    assert_eq!(term.label, "Multicystic kidney dysplasia");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_provider_priority_first_success_wins() {
    let first_calls = Arc::new(AtomicUsize::new(0));
    let second_calls = Arc::new(AtomicUsize::new(0));
    let providers: Vec<Box<dyn LabelProvider>> = vec![
        Box::new(CountingProvider {
            name: "primary",
            calls: Arc::clone(&first_calls),
            answers: Vec::new(),
        }),
        Box::new(CountingProvider {
            name: "secondary",
            calls: Arc::clone(&second_calls),
            answers: vec![("MONDO:0011593", "renal cysts and diabetes syndrome")],
        }),
    ];
    let resolver =
        OntologyResolver::with_providers(&ResolverConfig::default(), static_terms(), providers);

    let term = resolver.resolve("MONDO:0011593");
    assert!(matches!(term.tier, ResolutionTier::Remote { ref provider } if provider == "secondary"));
    assert_eq!(first_calls.load(Ordering::SeqCst), 1);
    assert_eq!(second_calls.load(Ordering::SeqCst), 1);
}

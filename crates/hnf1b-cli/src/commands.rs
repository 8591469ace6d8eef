use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use comfy_table::Table;
use tracing::{info, info_span};

use hnf1b_cli::config::{FileConfig, Overrides};
use hnf1b_core::vrs::variation_json;
use hnf1b_core::{
    DirectoryStore, JsonFileWriter, Pipeline, RecordStore, VariantDigestBuilder, parse_coordinate,
};
use hnf1b_ingest::{AnnotationIndex, CsvRowSource, PublicationTable};
use hnf1b_model::VariantNotations;
use hnf1b_ontology::OntologyResolver;
use hnf1b_standards::Standards;

use crate::cli::{ResolveArgs, RunArgs, VariantArgs};
use crate::summary::apply_table_style;
use crate::types::{Destination, RunOutcome};

pub fn run_pipeline(args: &RunArgs, config: Option<&Path>) -> Result<RunOutcome> {
    let span = info_span!("command", name = "run");
    let _guard = span.enter();
    let started = Instant::now();

    let file_config = FileConfig::load_optional(config)?;
    let mut settings = file_config.settings(&Overrides {
        offline: args.resolver.offline,
        no_standard_digest: args.no_standard_digest,
        workers: args.workers,
        cache_dir: args.resolver.cache_dir.clone(),
    });
    settings.options.limit = args.limit;

    let standards = Standards::load_default().context("load standards tables")?;
    let resolver = OntologyResolver::new(&settings.resolver, standards.terms.clone())
        .context("build ontology resolver")?;

    let annotations = args
        .annotations
        .as_deref()
        .map(|path| {
            AnnotationIndex::load(path, |notation| {
                parse_coordinate(notation, &standards.sequences).map(|c| c.key())
            })
            .with_context(|| format!("load annotations {}", path.display()))
        })
        .transpose()?;
    let publications = args
        .publications
        .as_deref()
        .map(|path| {
            PublicationTable::load(path)
                .with_context(|| format!("load publications {}", path.display()))
        })
        .transpose()?;

    let (store, destination): (Option<Box<dyn RecordStore>>, Destination) = match (
        args.dry_run,
        &args.output,
    ) {
        (true, Some(path)) => (
            Some(Box::new(JsonFileWriter::new(path))),
            Destination::DryRunFile(path.clone()),
        ),
        (true, None) => (None, Destination::Nowhere),
        (false, _) => (
            Some(Box::new(DirectoryStore::new(&args.output_dir))),
            Destination::Directory(args.output_dir.clone()),
        ),
    };

    let mut pipeline = Pipeline::new(
        &standards,
        &resolver,
        settings.standard_digest,
        settings.options.clone(),
    );
    if let Some(annotations) = &annotations {
        pipeline = pipeline.with_annotations(annotations);
    }
    if let Some(publications) = &publications {
        pipeline = pipeline.with_publications(publications);
    }

    let rows = CsvRowSource::open(&args.input, &standards.features)
        .with_context(|| format!("open input {}", args.input.display()))?;
    let report = pipeline
        .run(rows, store.as_deref())
        .with_context(|| format!("process {}", args.input.display()))?;

    info!(
        records = report.records.len(),
        failed = report.summary.failed,
        duration_ms = started.elapsed().as_millis(),
        "run complete"
    );
    Ok(RunOutcome {
        input: args.input.clone(),
        destination,
        report,
        elapsed: started.elapsed(),
    })
}

pub fn run_resolve(args: &ResolveArgs, config: Option<&Path>) -> Result<()> {
    let settings = FileConfig::load_optional(config)?.settings(&Overrides {
        offline: args.resolver.offline,
        cache_dir: args.resolver.cache_dir.clone(),
        ..Overrides::default()
    });
    let standards = Standards::load_default().context("load standards tables")?;
    let resolver = OntologyResolver::new(&settings.resolver, standards.terms.clone())
        .context("build ontology resolver")?;

    let mut table = Table::new();
    table.set_header(vec!["Code", "Label", "Tier"]);
    apply_table_style(&mut table);
    for code in &args.codes {
        let term = resolver.resolve(code);
        table.add_row(vec![term.code, term.label, term.tier.to_string()]);
    }
    println!("{table}");
    Ok(())
}

pub fn run_variant(args: &VariantArgs, config: Option<&Path>) -> Result<()> {
    let settings = FileConfig::load_optional(config)?.settings(&Overrides {
        no_standard_digest: args.no_standard_digest,
        ..Overrides::default()
    });
    let standards = Standards::load_default().context("load standards tables")?;
    let builder = VariantDigestBuilder::new(standards.sequences, settings.standard_digest);

    let notation = args.notation.trim().to_string();
    let notations = if notation.contains(":g.") {
        VariantNotations {
            hgvs: Some(notation),
            ..VariantNotations::default()
        }
    } else {
        VariantNotations {
            genomic: Some(notation),
            vcf_info: args.info.clone(),
            ..VariantNotations::default()
        }
    };
    let record = builder
        .build(&notations, None)
        .context("empty variant notation")?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&record).context("serialize variant")?
        );
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Field", "Value"]);
    apply_table_style(&mut table);
    table.add_row(vec!["Notation".to_string(), record.notation.value.clone()]);
    table.add_row(vec!["Source".to_string(), record.notation.source.to_string()]);
    match &record.coordinate {
        Some(coordinate) => {
            table.add_row(vec!["Coordinate".to_string(), coordinate.to_string()]);
            table.add_row(vec!["Type".to_string(), coordinate.variant_type.to_string()]);
            table.add_row(vec!["Class".to_string(), coordinate.class().as_str().to_string()]);
            if let Some((variation, _)) = builder.canonical_form(coordinate) {
                table.add_row(vec!["Canonical form".to_string(), variation_json(&variation)]);
            }
        }
        None => {
            table.add_row(vec!["Coordinate".to_string(), "-".to_string()]);
        }
    }
    table.add_row(vec![
        "Identifier".to_string(),
        record.identifier.id().unwrap_or("-").to_string(),
    ]);
    table.add_row(vec![
        "Method".to_string(),
        record
            .identifier
            .method()
            .map_or("unplaced", |method| method.as_str())
            .to_string(),
    ]);
    println!("{table}");
    Ok(())
}

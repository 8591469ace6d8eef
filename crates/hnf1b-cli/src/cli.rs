//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "hnf1b-phenopackets",
    version,
    about = "Normalize curated HNF1B spreadsheets into GA4GH Phenopackets",
    long_about = "Normalize curated HNF1B case spreadsheets into GA4GH Phenopacket v2 records.\n\n\
                  Rows are grouped per individual, clinical columns are mapped to HPO/MONDO\n\
                  terms, and variants get stable VRS identifiers."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// TOML configuration file.
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Print individual keys in logs and failure listings.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Normalize a spreadsheet into phenopackets.
    Run(RunArgs),

    /// Resolve ontology codes to labels and show which tier answered.
    Resolve(ResolveArgs),

    /// Parse one variant notation and print its coordinate and identifier.
    Variant(VariantArgs),
}

#[derive(Parser)]
pub struct RunArgs {
    /// Curated CSV export.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Process only the first N individuals (in key order).
    #[arg(long = "limit", value_name = "N")]
    pub limit: Option<usize>,

    /// Do not write per-record files.
    ///
    /// With `--output`, every record is written to one JSON array instead.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Dry-run output file.
    #[arg(long = "output", value_name = "FILE", requires = "dry_run")]
    pub output: Option<PathBuf>,

    /// Directory for `<id>.json` record files.
    #[arg(
        long = "output-dir",
        value_name = "DIR",
        default_value = "phenopackets",
        conflicts_with = "dry_run"
    )]
    pub output_dir: PathBuf,

    /// Variant annotation CSV.
    #[arg(long = "annotations", value_name = "PATH")]
    pub annotations: Option<PathBuf>,

    /// Publication alias CSV.
    #[arg(long = "publications", value_name = "PATH")]
    pub publications: Option<PathBuf>,

    #[command(flatten)]
    pub resolver: ResolverArgs,

    /// Always use fallback variant identifiers.
    #[arg(long = "no-standard-digest")]
    pub no_standard_digest: bool,

    /// Worker threads (0 = one per core).
    #[arg(long = "workers", value_name = "N")]
    pub workers: Option<usize>,
}

#[derive(Parser)]
pub struct ResolveArgs {
    /// Codes such as HP:0000107.
    #[arg(value_name = "CODE", required = true)]
    pub codes: Vec<String>,

    #[command(flatten)]
    pub resolver: ResolverArgs,
}

#[derive(Parser)]
pub struct ResolverArgs {
    /// Never contact remote ontology services.
    #[arg(long = "offline")]
    pub offline: bool,

    /// Disk cache for resolved labels.
    #[arg(long = "cache-dir", value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,
}

#[derive(Parser)]
pub struct VariantArgs {
    /// HGVS genomic notation or genomic coordinate.
    #[arg(value_name = "NOTATION")]
    pub notation: String,

    /// VCF INFO field for symbolic alleles (`SVTYPE=DEL;END=...`).
    #[arg(long = "info", value_name = "INFO")]
    pub info: Option<String>,

    /// Always use fallback variant identifiers.
    #[arg(long = "no-standard-digest")]
    pub no_standard_digest: bool,

    /// Print the canonical form as JSON.
    #[arg(long = "json")]
    pub json: bool,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

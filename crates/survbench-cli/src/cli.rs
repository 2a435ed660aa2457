//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "survbench",
    version,
    about = "Survey benchmarking engine - normalize and blend compensation surveys",
    long_about = "Normalize physician-compensation survey files from independent \
                  providers into one canonical schema, then compare and blend \
                  percentile benchmarks across sources, specialties, and years."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

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

    /// Directory holding learned mapping tables and column templates.
    #[arg(
        long = "mappings",
        value_name = "DIR",
        default_value = "mappings",
        global = true
    )]
    pub mappings_dir: PathBuf,
}

#[derive(Subcommand)]
pub enum Command {
    /// Resolve a survey file's headers against the canonical schema.
    Map(MapArgs),

    /// Normalize a survey file and print the canonical rows as JSON.
    Normalize(UploadArgs),

    /// List the distinct measured variables present in a survey file.
    Discover(UploadArgs),

    /// Aggregate a survey file into percentile benchmark groups.
    Aggregate(AggregateArgs),

    /// Blend aggregated groups into one composite distribution.
    Blend(BlendArgs),

    /// Report mapping coverage for a survey file.
    Coverage(UploadArgs),
}

#[derive(Parser)]
pub struct MapArgs {
    #[command(flatten)]
    pub upload: UploadArgs,

    /// Save the completed resolution as a reusable template for the source.
    #[arg(long = "save-template")]
    pub save_template: bool,
}

#[derive(Parser)]
pub struct UploadArgs {
    /// Path to the survey CSV file.
    #[arg(value_name = "SURVEY_CSV")]
    pub file: PathBuf,

    /// Survey source the upload was declared under.
    #[arg(long = "source", value_name = "NAME")]
    pub source: String,

    /// Survey year applied when the upload has no year column.
    #[arg(long = "year", default_value_t = 2025)]
    pub year: i32,
}

#[derive(Parser)]
pub struct AggregateArgs {
    #[command(flatten)]
    pub upload: UploadArgs,

    /// Keep survey sources as separate groups instead of collapsing them.
    #[arg(long = "per-source")]
    pub per_source: bool,

    /// Skip percentile computation and report only counts.
    #[arg(long = "counts-only")]
    pub counts_only: bool,
}

#[derive(Parser)]
pub struct BlendArgs {
    #[command(flatten)]
    pub upload: UploadArgs,

    /// Variable to blend across specialties (e.g. TCC).
    #[arg(long = "variable", value_name = "NAME")]
    pub variable: String,

    /// Weighting policy for the blend.
    #[arg(long = "policy", value_enum, default_value = "incumbent-weighted")]
    pub policy: BlendPolicyArg,

    /// Custom weights as specialty=weight pairs (weights sum to 100).
    #[arg(long = "weight", value_name = "SPECIALTY=WEIGHT")]
    pub weights: Vec<String>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum BlendPolicyArg {
    Simple,
    IncumbentWeighted,
    Custom,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

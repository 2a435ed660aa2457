//! Subcommand implementations.

use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::info;

use survbench_ingest::{
    DiscoveryOptions, DiscoveryOutcome, MemoryRowStore, MemoryVariableCache,
    NormalizeOptions, RawTable, discover_variables, normalize_rows, read_raw_table,
};
use survbench_map::repository::MappingRepository;
use survbench_map::resolver::{ColumnResolution, ColumnTemplate, resolve_columns};
use survbench_map::store::MemoryMappingStore;
use survbench_map::{MappingStore, analyze_coverage};
use survbench_model::{
    BlendPolicy, BlendWeight, CanonicalField, CoverageReport, EntityKind, NormalizedRow,
    SurveySchema,
};
use survbench_stats::{
    AggregationOutcome, GroupKeySpec, JobOutcome, StatsWorker, aggregate, aggregate_with_cancel,
    blend,
};

use crate::cli::{AggregateArgs, BlendArgs, BlendPolicyArg, MapArgs, UploadArgs};
use crate::summary;

/// A survey file read and resolved against the canonical schema.
struct Upload {
    table: RawTable,
    resolution: ColumnResolution,
    store: MemoryMappingStore,
    repo: MappingRepository,
}

fn load_upload(args: &UploadArgs, mappings_dir: &Path) -> Result<Upload> {
    let repo = MappingRepository::new(mappings_dir)?;
    let table = read_raw_table(&args.file)?;
    let template = repo
        .load_template(&args.source)
        .context("load column template")?;
    if template.is_some() {
        info!(source = %args.source, "applying saved column template");
    }
    let resolution = resolve_columns(&table.headers, &SurveySchema::benchmark(), template.as_ref());
    let store = repo.load_store().context("load mapping tables")?;
    Ok(Upload {
        table,
        resolution,
        store,
        repo,
    })
}

fn normalized_rows(upload: &Upload, args: &UploadArgs) -> Result<Vec<NormalizedRow>> {
    let options = NormalizeOptions {
        survey_source: args.source.clone(),
        default_year: args.year,
    };
    let rows = normalize_rows(&upload.table, &upload.resolution, &upload.store, &options)?;
    Ok(rows)
}

pub fn run_map(args: &MapArgs, mappings_dir: &Path) -> Result<()> {
    let upload = load_upload(&args.upload, mappings_dir)?;
    summary::print_resolution(&upload.resolution);
    if args.save_template {
        upload.resolution.require_complete()?;
        let template = ColumnTemplate::from_resolution(&args.upload.source, &upload.resolution);
        let path = upload.repo.save_template(&template)?;
        println!("Template saved: {}", path.display());
    }
    Ok(())
}

pub fn run_normalize(args: &UploadArgs, mappings_dir: &Path) -> Result<()> {
    let upload = load_upload(args, mappings_dir)?;
    let rows = normalized_rows(&upload, args)?;
    for row in &rows {
        println!("{}", serde_json::to_string(row)?);
    }
    info!(rows = rows.len(), "normalization finished");
    Ok(())
}

pub fn run_discover(args: &UploadArgs, mappings_dir: &Path) -> Result<()> {
    let upload = load_upload(args, mappings_dir)?;
    let rows = normalized_rows(&upload, args)?;
    let store = MemoryRowStore::new();
    store.put_rows(&args.source, rows);
    let cache = MemoryVariableCache::new();

    // Discovery runs as a background job so an interactive caller could
    // cancel it between batches; here we simply wait for the outcome.
    let source = args.source.clone();
    let handle = StatsWorker::new().submit(move |cancel| {
        let outcome = discover_variables(
            &source,
            &store,
            &cache,
            &DiscoveryOptions::default(),
            cancel,
        )?;
        Ok(match outcome {
            DiscoveryOutcome::Complete(variables) => JobOutcome::Finished(variables),
            DiscoveryOutcome::Cancelled => JobOutcome::Cancelled,
        })
    });
    match handle.wait()? {
        JobOutcome::Finished(variables) => {
            for variable in &variables {
                println!("{variable}");
            }
            println!("{} variable(s)", variables.len());
        }
        JobOutcome::Cancelled => println!("discovery cancelled, no result"),
    }
    Ok(())
}

pub fn run_aggregate(args: &AggregateArgs, mappings_dir: &Path) -> Result<()> {
    let upload = load_upload(&args.upload, mappings_dir)?;
    let rows = normalized_rows(&upload, &args.upload)?;
    let key_spec = if args.per_source {
        GroupKeySpec::full()
    } else {
        GroupKeySpec::across_sources()
    };
    let counts_only = args.counts_only;

    // Aggregation runs as a background job observing its cancellation
    // token at chunk boundaries; here we simply wait for the outcome.
    let handle = StatsWorker::new().submit(move |cancel| {
        Ok(
            match aggregate_with_cancel(&rows, &key_spec, !counts_only, cancel) {
                AggregationOutcome::Complete(groups) => JobOutcome::Finished(groups),
                AggregationOutcome::Cancelled => JobOutcome::Cancelled,
            },
        )
    });
    match handle.wait()? {
        JobOutcome::Finished(groups) => summary::print_groups(&groups, counts_only),
        JobOutcome::Cancelled => println!("aggregation cancelled, no result"),
    }
    Ok(())
}

pub fn run_blend(args: &BlendArgs, mappings_dir: &Path) -> Result<()> {
    let upload = load_upload(&args.upload, mappings_dir)?;
    let rows = normalized_rows(&upload, &args.upload)?;
    let variable = args.variable.trim();
    let rows: Vec<NormalizedRow> = rows
        .into_iter()
        .filter(|row| row.variable.eq_ignore_ascii_case(variable))
        .collect();
    if rows.is_empty() {
        bail!("no rows carry variable '{variable}'");
    }

    let key_spec = blend_key_spec(args.policy);
    let groups = aggregate(&rows, &key_spec, true);

    let (policy, weights) = match args.policy {
        BlendPolicyArg::Simple => (BlendPolicy::Simple, None),
        BlendPolicyArg::IncumbentWeighted => (BlendPolicy::IncumbentWeighted, None),
        BlendPolicyArg::Custom => {
            let weights = parse_weights(&args.weights, &groups)?;
            (BlendPolicy::Custom, Some(weights))
        }
    };
    let result = blend(&groups, policy, weights.as_deref())?;
    summary::print_blend(&result);
    Ok(())
}

pub fn run_coverage(args: &UploadArgs, mappings_dir: &Path) -> Result<()> {
    let upload = load_upload(args, mappings_dir)?;
    upload.resolution.require_complete()?;

    let mut reports: Vec<CoverageReport> = Vec::new();
    for kind in EntityKind::all() {
        let field = match kind {
            EntityKind::Specialty => CanonicalField::Specialty,
            EntityKind::ProviderType => CanonicalField::ProviderType,
            EntityKind::Region => CanonicalField::Region,
            EntityKind::Variable => CanonicalField::Variable,
        };
        let Some(header) = upload.resolution.header_for(field) else {
            continue;
        };
        let raw_values: Vec<String> = upload
            .table
            .rows
            .iter()
            .filter_map(|row| row.get(header))
            .map(String::from)
            .collect();
        let table = upload.store.table(*kind)?;
        reports.push(analyze_coverage(&raw_values, *kind, &args.source, &table));
    }
    summary::print_coverage(&reports);
    Ok(())
}

/// Grouping for the blend inputs.
///
/// Custom weights are declared once per specialty, so sources collapse
/// into one group before weighting; the data-driven policies weight each
/// (specialty, source) distribution separately.
fn blend_key_spec(policy: BlendPolicyArg) -> GroupKeySpec {
    GroupKeySpec {
        specialty: true,
        provider_type: false,
        region: false,
        year: false,
        survey_source: !matches!(policy, BlendPolicyArg::Custom),
        variable: true,
    }
}

/// Parse `specialty=weight` pairs and order them to match the groups.
fn parse_weights(
    specs: &[String],
    groups: &[survbench_model::AggregatedGroup],
) -> Result<Vec<BlendWeight>> {
    let mut parsed: Vec<(String, f64)> = Vec::new();
    for spec in specs {
        let Some((specialty, weight)) = spec.split_once('=') else {
            bail!("weight '{spec}' is not in SPECIALTY=WEIGHT form");
        };
        let weight: f64 = weight
            .trim()
            .parse()
            .with_context(|| format!("unparseable weight in '{spec}'"))?;
        parsed.push((specialty.trim().to_string(), weight));
    }

    let mut weights = Vec::with_capacity(groups.len());
    for group in groups {
        let specialty = group.key.specialty.as_deref().unwrap_or_default();
        let Some((_, weight)) = parsed
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(specialty))
        else {
            bail!("no weight supplied for specialty '{specialty}'");
        };
        weights.push(BlendWeight {
            specialty: specialty.to_string(),
            weight: *weight,
            records: group.n_incumbents,
        });
    }
    Ok(weights)
}

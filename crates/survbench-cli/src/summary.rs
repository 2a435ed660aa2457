//! Table rendering for CLI output.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use survbench_map::resolver::ColumnResolution;
use survbench_model::{AggregatedGroup, BlendedResult, CoverageReport, EffectiveRate};

pub fn print_resolution(resolution: &ColumnResolution) {
    let mut table = base_table(vec!["Raw Header", "Canonical Field", "Matched By", "Confidence"]);
    for mapping in &resolution.mappings {
        let field = mapping
            .field
            .map_or_else(|| "-".to_string(), |field| field.name().to_string());
        let matched_by = match (mapping.field.is_some(), mapping.auto_matched) {
            (false, _) => dim_cell("unmatched"),
            (true, true) => Cell::new("auto"),
            (true, false) => Cell::new("template").fg(Color::Cyan),
        };
        table.add_row(vec![
            Cell::new(&mapping.raw_header),
            Cell::new(field),
            matched_by,
            Cell::new(format!("{:.2}", mapping.confidence)),
        ]);
    }
    println!("{table}");

    if resolution.is_complete() {
        println!("All required columns resolved.");
    } else {
        let missing: Vec<&str> = resolution
            .missing_required
            .iter()
            .map(|field| field.name())
            .collect();
        println!("Missing required columns: {}", missing.join(", "));
    }
}

pub fn print_groups(groups: &[AggregatedGroup], counts_only: bool) {
    let mut table = base_table(vec![
        "Specialty", "Provider Type", "Region", "Year", "Source", "Variable", "Orgs",
        "Incumbents", "P25", "P50", "P75", "P90",
    ]);
    for idx in 6..12 {
        align_column(&mut table, idx, CellAlignment::Right);
    }
    for group in groups {
        let key = &group.key;
        let mut row = vec![
            Cell::new(key.specialty.as_deref().unwrap_or("*")),
            Cell::new(key.provider_type.as_deref().unwrap_or("*")),
            Cell::new(key.region.as_deref().unwrap_or("*")),
            Cell::new(key.year.map_or_else(|| "*".to_string(), |y| y.to_string())),
            Cell::new(key.survey_source.as_deref().unwrap_or("*")),
            Cell::new(key.variable.as_deref().unwrap_or("*")),
            Cell::new(group.n_orgs),
            Cell::new(group.n_incumbents),
        ];
        if counts_only {
            row.extend((0..4).map(|_| dim_cell("-")));
        } else {
            row.push(metric_cell(group.percentiles.p25));
            row.push(metric_cell(group.percentiles.p50));
            row.push(metric_cell(group.percentiles.p75));
            row.push(metric_cell(group.percentiles.p90));
        }
        table.add_row(row);
    }
    println!("{table}");
    println!("{} group(s)", groups.len());
}

pub fn print_blend(result: &BlendedResult) {
    let mut table = base_table(vec!["", "P25", "P50", "P75", "P90"]);
    for idx in 1..5 {
        align_column(&mut table, idx, CellAlignment::Right);
    }
    table.add_row(vec![
        Cell::new("Blended").add_attribute(Attribute::Bold),
        metric_cell(result.percentiles.p25),
        metric_cell(result.percentiles.p50),
        metric_cell(result.percentiles.p75),
        metric_cell(result.percentiles.p90),
    ]);
    if let Some(rate) = &result.effective_rate {
        table.add_row(vec![
            Cell::new("Effective rate"),
            rate_cell(rate.p25),
            rate_cell(rate.p50),
            rate_cell(rate.p75),
            rate_cell(rate.p90),
        ]);
    }
    println!("{table}");
    println!(
        "Groups: {}   Incumbents: {}   IQR: {:.0}   Confidence: {:.2}",
        result.group_count, result.total_incumbents, result.iqr, result.confidence
    );
}

pub fn print_coverage(reports: &[CoverageReport]) {
    let mut table = base_table(vec!["Category", "Mapped", "Unmapped", "Coverage"]);
    for idx in 1..4 {
        align_column(&mut table, idx, CellAlignment::Right);
    }
    for report in reports {
        let coverage = format!("{:.0}%", report.result.coverage * 100.0);
        let coverage_cell = if report.result.coverage >= 1.0 {
            Cell::new(coverage).fg(Color::Green)
        } else {
            Cell::new(coverage).fg(Color::Yellow)
        };
        table.add_row(vec![
            Cell::new(report.result.kind.name()),
            Cell::new(report.result.mapped),
            Cell::new(report.result.unmapped),
            coverage_cell,
        ]);
    }
    println!("{table}");
    for report in reports {
        if !report.unmapped_values.is_empty() {
            println!(
                "Unmapped {}: {}",
                report.result.kind,
                report.unmapped_values.join(", ")
            );
        }
    }
}

fn base_table(headers: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        headers
            .into_iter()
            .map(|header| Cell::new(header).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );
    table
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn metric_cell(value: f64) -> Cell {
    if value == 0.0 {
        dim_cell("-")
    } else {
        Cell::new(format!("{value:.0}"))
    }
}

fn rate_cell(rate: EffectiveRate) -> Cell {
    match rate.value() {
        Some(value) => Cell::new(format!("{value:.2}")),
        None => dim_cell("undefined"),
    }
}

fn dim_cell(text: &str) -> Cell {
    Cell::new(text).add_attribute(Attribute::Dim)
}

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};

use hnf1b_cli::logging::redact_value;
use hnf1b_core::GroupFailure;

use crate::types::{Destination, RunOutcome};

pub fn print_summary(outcome: &RunOutcome) {
    println!("Input: {}", outcome.input.display());
    match &outcome.destination {
        Destination::Directory(dir) => println!("Output: {}", dir.display()),
        Destination::DryRunFile(path) => println!("Dry run: {}", path.display()),
        Destination::Nowhere => println!("Dry run: no output written"),
    }
    println!("Elapsed: {:.2}s", outcome.elapsed.as_secs_f64());

    let summary = &outcome.report.summary;
    let mut table = Table::new();
    table.set_header(vec![header_cell("Metric"), header_cell("Count")]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    let rows = [
        ("Rows read", summary.rows, None),
        ("Rows rejected", summary.rejected_rows, Some(Color::Red)),
        ("Individuals", summary.groups, None),
        ("Processed", summary.processed, None),
        ("With features", summary.with_features, None),
        ("With variants", summary.with_variants, None),
        ("With diseases", summary.with_diseases, None),
        ("Failed", summary.failed, Some(Color::Red)),
        ("Skipped", summary.skipped, Some(Color::Yellow)),
        ("Unparsed temporal values", summary.unparsed_temporal, Some(Color::Yellow)),
        ("Unmapped clinical values", summary.unmapped_values, Some(Color::Yellow)),
        ("Unknown stages", summary.staging_misses, Some(Color::Yellow)),
        ("Notation conflicts", summary.notation_conflicts, Some(Color::Yellow)),
    ];
    for (label, count, color) in rows {
        let count = match color {
            Some(color) => count_cell(count, color),
            None => Cell::new(count),
        };
        table.add_row(vec![Cell::new(label), count]);
    }
    println!("{table}");

    print_resolver_table(outcome);
    print_failure_table(&outcome.report.failures);
}

fn print_resolver_table(outcome: &RunOutcome) {
    let stats = &outcome.report.resolver;
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Memory"),
        header_cell("Disk"),
        header_cell("Remote"),
        header_cell("Static"),
        header_cell("Placeholder"),
        header_cell("Provider failures"),
    ]);
    apply_table_style(&mut table);
    table.add_row(vec![
        Cell::new(stats.memory),
        Cell::new(stats.disk),
        Cell::new(stats.remote),
        Cell::new(stats.static_table),
        count_cell(stats.placeholder, Color::Yellow),
        count_cell(stats.provider_failures, Color::Red),
    ]);
    println!();
    println!("Term resolution:");
    println!("{table}");
}

fn print_failure_table(failures: &[GroupFailure]) {
    if failures.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Individual"),
        header_cell("Rows"),
        header_cell("Last state"),
        header_cell("Error"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for failure in failures {
        let key = if failure.key.is_empty() {
            dim_cell("(none)")
        } else {
            Cell::new(redact_value(&failure.key))
        };
        table.add_row(vec![
            key,
            Cell::new(failure.rows),
            Cell::new(failure.state.as_str()),
            Cell::new(&failure.message).fg(Color::Red),
        ]);
    }
    println!();
    println!("Failures:");
    println!("{table}");
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(80);
    table.set_constraints(vec![
        ColumnConstraint::UpperBoundary(Width::Percentage(70)),
        ColumnConstraint::LowerBoundary(Width::Fixed(7)),
    ]);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

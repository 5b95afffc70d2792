//! Terminal tables for command results.

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use prep_core::PipelineOutput;
use prep_model::{ExpressionOutcome, OutcomeStatus, format_number};
use prep_transform::ColumnStats;

use crate::commands::{InspectResult, RunResult};

pub fn print_run_summary(result: &RunResult) {
    let output = &result.output;
    println!("Input: {}", result.input.display());
    println!("Target: {} ({})", output.select.target, output.task_type);
    if let Some(path) = &result.written {
        println!("Output: {}", path.display());
    }
    if let Some(path) = &result.report {
        println!("Report: {}", path.display());
    }
    println!("{}", stage_table(output));
    if let Some(table) = outcome_table(&output.outcomes) {
        println!();
        println!("Features:");
        println!("{table}");
    }
    if let Some(error) = &output.suggest.error {
        eprintln!("warning: no suggestions applied: {error}");
    }
}

pub fn print_inspect(result: &InspectResult) {
    println!("Input: {}", result.input.display());
    println!("Rows: {}", result.rows);
    println!("{}", stats_table(&result.columns));
}

/// One row per stage with the rows and columns it left.
pub fn stage_table(output: &PipelineOutput) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Stage"),
        header_cell("Rows"),
        header_cell("Columns"),
        header_cell("Details"),
        header_cell("ms"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);

    let clean = &output.clean;
    let select = &output.select;
    let input_columns = select.kept.len() + select.dropped_count() + 1;
    let success = output.outcomes.iter().filter(|o| o.is_success()).count();
    let duration = |index: usize| {
        output
            .timings
            .get(index)
            .map_or_else(|| dim_cell("-"), |t| Cell::new(t.duration_ms))
    };

    table.add_row(vec![
        stage_cell("clean"),
        Cell::new(clean.rows_out),
        Cell::new(input_columns),
        Cell::new(format!(
            "{} sparse rows, {} outlier rows dropped; {} columns imputed",
            clean.rows_dropped_sparse,
            clean.rows_dropped_outliers(),
            clean.imputed.len()
        )),
        duration(0),
    ]);
    table.add_row(vec![
        stage_cell("select"),
        Cell::new(clean.rows_out),
        Cell::new(select.kept.len() + 1),
        Cell::new(format!(
            "{} quasi-constant, {} irrelevant, {} redundant",
            select.quasi_constant.len(),
            select.irrelevant.len(),
            select.redundant.len()
        )),
        duration(1),
    ]);
    table.add_row(vec![
        stage_cell("suggest"),
        dim_cell("-"),
        dim_cell("-"),
        Cell::new(format!(
            "{} candidates from {}",
            output.suggest.received, output.suggest.source
        )),
        duration(2),
    ]);
    table.add_row(vec![
        stage_cell("sandbox"),
        Cell::new(output.dataset.height()),
        Cell::new(output.dataset.width()),
        Cell::new(format!(
            "{success} of {} features added",
            output.outcomes.len()
        )),
        duration(3),
    ]);
    table
}

/// Feature outcomes in suggestion order, or `None` without candidates.
pub fn outcome_table(outcomes: &[ExpressionOutcome]) -> Option<Table> {
    if outcomes.is_empty() {
        return None;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Feature"),
        header_cell("Status"),
        header_cell("Detail"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Center);
    for outcome in outcomes {
        table.add_row(vec![
            Cell::new(&outcome.name),
            status_cell(outcome.status),
            outcome
                .detail
                .as_deref()
                .map_or_else(|| dim_cell("-"), Cell::new),
        ]);
    }
    Some(table)
}

pub fn stats_table(columns: &[ColumnStats]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Column"),
        header_cell("Type"),
        header_cell("Nulls"),
        header_cell("Distinct"),
        header_cell("Dominant"),
        header_cell("Q1"),
        header_cell("Median"),
        header_cell("Q3"),
    ]);
    apply_table_style(&mut table);
    for index in 2..8 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for stats in columns {
        let quartile = |pick: fn(&prep_transform::Quartiles) -> f64| {
            stats
                .quartiles
                .as_ref()
                .map_or_else(|| dim_cell("-"), |q| Cell::new(format_number(pick(q))))
        };
        table.add_row(vec![
            Cell::new(&stats.name)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(stats.data_type),
            count_cell(stats.null_count),
            Cell::new(stats.cardinality),
            Cell::new(format!("{:.1}%", stats.dominant_ratio * 100.0)),
            quartile(|q| q.q1),
            quartile(|q| q.median),
            quartile(|q| q.q3),
        ]);
    }
    table
}

fn apply_table_style(table: &mut Table) {
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
        .set_width(120);
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

fn stage_cell(stage: &str) -> Cell {
    Cell::new(stage)
        .fg(Color::Blue)
        .add_attribute(Attribute::Bold)
}

fn status_cell(status: OutcomeStatus) -> Cell {
    match status {
        OutcomeStatus::Success => Cell::new("✓").fg(Color::Green).add_attribute(Attribute::Bold),
        OutcomeStatus::Rejected => Cell::new("REJECTED")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        OutcomeStatus::Failed => Cell::new("FAILED").fg(Color::Yellow),
    }
}

fn count_cell(count: usize) -> Cell {
    if count > 0 {
        Cell::new(count).fg(Color::Yellow)
    } else {
        dim_cell(count)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value.to_string()).fg(Color::DarkGrey)
}

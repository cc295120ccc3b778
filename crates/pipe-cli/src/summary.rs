use std::path::Path;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use pipe_core::{ChunkPlan, RunSummary};

pub fn print_summary(summary: &RunSummary, run_dir: &Path) {
    println!("Process: {}", summary.process_name);
    println!("Run: {}", summary.guid);
    println!("Output: {}", run_dir.display());

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Chunk"),
        header_cell("Input"),
        header_cell("Valid"),
        header_cell("Invalid"),
        header_cell("Transformed"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 1..=4 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for chunk in &summary.chunks {
        table.add_row(vec![
            Cell::new(format!("part-{:05}", chunk.index)).fg(Color::Blue),
            Cell::new(chunk.input_rows),
            count_cell(chunk.valid_rows, Color::Green),
            count_cell(chunk.invalid_rows, Color::Red),
            Cell::new(chunk.transformed_rows),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(summary.input_rows()).add_attribute(Attribute::Bold),
        count_cell(summary.valid_rows(), Color::Green).add_attribute(Attribute::Bold),
        count_cell(summary.invalid_rows(), Color::Red).add_attribute(Attribute::Bold),
        Cell::new(summary.transformed_rows()).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");
}

pub fn print_chunk_plan(plan: &ChunkPlan) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Chunk"),
        header_cell("Offset"),
        header_cell("Rows"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    for bounds in &plan.chunks {
        table.add_row(vec![
            Cell::new(format!("part-{:05}", bounds.index)),
            Cell::new(bounds.offset),
            Cell::new(bounds.len),
        ]);
    }
    println!(
        "Estimated {} rows, {} bytes; budget {} bytes per chunk",
        plan.estimate.rows, plan.estimate.bytes, plan.budget_bytes
    );
    println!("{table}");
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
        .set_width(100);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn count_cell(count: u64, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color)
    } else {
        dim_cell(count)
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

use std::collections::HashMap;
use std::path::Path;

use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::models::ResultRow;

/// Print a summary of the written report: counts, top licenses, and with
/// `verbose` the full table.
pub fn render(rows: &[ResultRow], scanned: usize, report_path: &Path, verbose: bool) {
    let unknown = rows.iter().filter(|r| r.license.is_none()).count();

    println!(
        "\n {} v{}",
        "package-licenses".bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!(" Projects scanned : {}", scanned);
    println!(" Packages reported: {}  {}", rows.len(), summarize_licenses(rows));
    if unknown > 0 {
        println!(
            " {} {} packages without a recognised license",
            "⚠".yellow(),
            unknown
        );
    }

    if verbose && !rows.is_empty() {
        println!();
        render_table(rows);
    }

    println!("\n {} {}\n", "Report written to:".green(), report_path.display());
}

fn render_table(rows: &[ResultRow]) {
    let include_project = rows.iter().any(|r| !r.project.is_empty());

    let mut header = Vec::new();
    if include_project {
        header.push(Cell::new("Project").add_attribute(Attribute::Bold));
    }
    header.extend([
        Cell::new("Package").add_attribute(Attribute::Bold),
        Cell::new("Version").add_attribute(Attribute::Bold),
        Cell::new("Licence").add_attribute(Attribute::Bold),
    ]);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);

    for row in rows {
        let license = match &row.license {
            Some(name) => Cell::new(name),
            None => Cell::new("unknown").fg(Color::DarkGrey),
        };
        let mut cells = Vec::new();
        if include_project {
            cells.push(Cell::new(&row.project));
        }
        cells.extend([Cell::new(&row.package), Cell::new(&row.version), license]);
        table.add_row(cells);
    }

    println!("{}", table);
}

fn summarize_licenses(rows: &[ResultRow]) -> String {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for row in rows {
        *counts
            .entry(row.license.as_deref().unwrap_or("unknown"))
            .or_insert(0) += 1;
    }

    let mut pairs: Vec<(&str, usize)> = counts.into_iter().collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

    let summary: Vec<String> = pairs
        .iter()
        .take(3)
        .map(|(lic, cnt)| format!("{} ({})", lic, cnt))
        .collect();

    if summary.is_empty() {
        String::new()
    } else {
        format!("[{}]", summary.join(", "))
    }
}

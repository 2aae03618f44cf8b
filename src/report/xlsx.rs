use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook};

use crate::models::ResultRow;

pub const SHEET_NAME: &str = "Packages";

/// Column headers; `Project` only when rows are kept per project.
pub fn headers(include_project: bool) -> Vec<&'static str> {
    let mut headers = Vec::new();
    if include_project {
        headers.push("Project");
    }
    headers.extend(["Title", "Licence", "LicenceUrl", "ProjectUrl", "Version"]);
    headers
}

/// Cell values of one data row, in header order.
pub fn cells(row: &ResultRow, include_project: bool) -> Vec<&str> {
    let mut cells = Vec::new();
    if include_project {
        cells.push(row.project.as_str());
    }
    cells.extend([
        row.package.as_str(),
        row.license.as_deref().unwrap_or(""),
        row.license_url.as_deref().unwrap_or(""),
        row.project_url.as_deref().unwrap_or(""),
        row.version.as_str(),
    ]);
    cells
}

/// Write the report to `path`, replacing any existing file.
pub fn write(rows: &[ResultRow], include_project: bool, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    let bold = Format::new().set_bold();
    for (col, header) in headers(include_project).into_iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, header, &bold)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        for (col, value) in cells(row, include_project).into_iter().enumerate() {
            if !value.is_empty() {
                sheet.write_string(r, col as u16, value)?;
            }
        }
    }

    if path.exists() {
        std::fs::remove_file(path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
    }
    workbook
        .save(path)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    Ok(())
}

use std::collections::HashMap;

use crate::models::ResultRow;

/// Rows of test projects and ignored rows are dropped before grouping.
fn is_reported(row: &ResultRow) -> bool {
    row.ignored_reason.is_none() && !row.project.to_lowercase().contains("test")
}

/// Filter and deduplicate reader rows into report rows.
///
/// Rows are grouped by (project, package, version) when `include_project` is
/// set, otherwise by (package, version) with an empty project. Each group
/// takes the license fields of its first row; groups keep first-seen order.
pub fn aggregate(rows: &[ResultRow], include_project: bool) -> Vec<ResultRow> {
    let mut groups: HashMap<(&str, &str, &str), usize> = HashMap::new();
    let mut out: Vec<ResultRow> = Vec::new();

    for row in rows.iter().filter(|r| is_reported(r)) {
        let project = if include_project { row.project.as_str() } else { "" };
        let key = (project, row.package.as_str(), row.version.as_str());
        if groups.contains_key(&key) {
            continue;
        }
        groups.insert(key, out.len());
        out.push(ResultRow {
            project: project.to_string(),
            package: row.package.clone(),
            version: row.version.clone(),
            license: row.license.clone(),
            license_url: row.license_url.clone(),
            project_url: row.project_url.clone(),
            ignored_reason: None,
        });
    }

    out
}

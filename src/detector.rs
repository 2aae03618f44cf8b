use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::models::ProjectKind;

/// Find `*.csproj` and `package.json` files under `root`, in file-name order.
///
/// Without `recursive` only `root` itself is searched. Anything inside a
/// `node_modules` folder belongs to installed packages and is skipped.
pub fn discover_projects(root: &Path, recursive: bool) -> Vec<(PathBuf, ProjectKind)> {
    let max_depth = if recursive { usize::MAX } else { 1 };

    WalkDir::new(root)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.file_name() != "node_modules")
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let kind = ProjectKind::of(e.path())?;
            Some((e.into_path(), kind))
        })
        .collect()
}

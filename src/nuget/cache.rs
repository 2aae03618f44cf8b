use std::path::Path;

use walkdir::WalkDir;

use crate::logger::Logger;
use crate::models::PackageMetadata;
use crate::nuget::nuspec::parse_nuspec_file;

/// The two recognised package cache layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// `<root>/<Id>.<Version>/<Id>.nuspec` (packages.config era)
    V2,
    /// `<root>/<id>/<version>/<id>.nuspec` (global packages folder)
    V3,
}

impl Layout {
    /// Directory depth at which manifests are found.
    fn nuspec_depth(self) -> usize {
        match self {
            Layout::V2 => 2,
            Layout::V3 => 3,
        }
    }
}

fn nuspecs_at(root: &Path, depth: usize) -> impl Iterator<Item = walkdir::DirEntry> {
    WalkDir::new(root)
        .min_depth(depth)
        .max_depth(depth)
        .sort_by_file_name()
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("nuspec"))
}

/// Recognise the layout of the cache at `root`; `None` when neither matches.
pub fn detect_layout(root: &Path) -> Option<Layout> {
    [Layout::V3, Layout::V2]
        .into_iter()
        .find(|layout| nuspecs_at(root, layout.nuspec_depth()).next().is_some())
}

/// List every package in the cache. An unrecognised layout yields an empty list.
pub fn read_packages(root: &Path, logger: &dyn Logger) -> Vec<PackageMetadata> {
    let Some(layout) = detect_layout(root) else {
        logger.warn(&format!(
            "No recognised package cache layout in {}",
            root.display()
        ));
        return Vec::new();
    };
    logger.debug(&format!("Package cache {} uses layout {:?}", root.display(), layout));

    nuspecs_at(root, layout.nuspec_depth())
        .filter_map(|entry| match parse_nuspec_file(entry.path()) {
            Ok(mut meta) => {
                if layout == Layout::V3 {
                    if let Some(version) = version_folder(entry.path()) {
                        meta.version = version;
                    }
                }
                Some(meta)
            }
            Err(e) => {
                logger.warn(&format!("Skipping {}: {}", entry.path().display(), e));
                None
            }
        })
        .collect()
}

/// The v3 version folder holds the normalized version (`1.0` is stored as `1.0.0`).
fn version_folder(nuspec: &Path) -> Option<String> {
    nuspec
        .parent()
        .and_then(|dir| dir.file_name())
        .and_then(|name| name.to_str())
        .map(str::to_string)
}

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;

use crate::config::ExclusionRules;
use crate::license::fetch::Fetch;
use crate::license::resolver::LicenseResolver;
use crate::logger::Logger;
use crate::models::{PackageMetadata, ResultRow};
use crate::process::{tool_command, OutputLines};

/// Rows grouped by lower-cased package id, then version.
type Index = BTreeMap<String, BTreeMap<String, Vec<ResultRow>>>;

/// Parser for the console output of `dotnet list package --include-transitive`.
///
/// ```text
/// Project 'MyProj' has the following package references
///    [net6.0]:
///    Top-level Package      Requested   Resolved
///    > Newtonsoft.Json      13.0.1      13.0.1
///
///    Transitive Package               Resolved
///    > System.Memory                  4.5.4
/// ```
pub struct ListingParser {
    project_re: Regex,
    entry_re: Regex,
}

impl ListingParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            project_re: Regex::new(r"'(?P<name>.*)'")?,
            // The version is the last column, i.e. the resolved one.
            entry_re: Regex::new(
                r"^\s*>\s*(?P<name>\S+)\s+(?:.*\s)?(?P<version>[0-9A-Za-z][0-9A-Za-z.+\-]*)\s*$",
            )?,
        })
    }

    /// Turn listing lines into one row per entry, under the most recent project header.
    pub fn parse<I>(&self, lines: I) -> Vec<ResultRow>
    where
        I: IntoIterator<Item = String>,
    {
        let mut project = String::new();
        let mut rows = Vec::new();

        for line in lines {
            if let Some(caps) = self.project_re.captures(&line) {
                project = caps["name"].to_string();
                continue;
            }
            if line.trim().is_empty() {
                continue;
            }
            if let Some(caps) = self.entry_re.captures(&line) {
                rows.push(ResultRow::new(&project, &caps["name"], &caps["version"]));
            }
        }

        rows
    }
}

/// Reader for SDK-style `.csproj` projects.
///
/// Dependencies come from `dotnet list`; licenses come from the cached
/// `.nuspec` of each package, resolved concurrently per project.
pub struct DotNetReader<F> {
    program: String,
    parser: ListingParser,
    packages: Vec<PackageMetadata>,
    resolver: LicenseResolver<F>,
    exclusions: ExclusionRules,
    logger: Arc<dyn Logger>,
    show_progress: bool,
}

impl<F: Fetch> DotNetReader<F> {
    pub fn new(
        packages: Vec<PackageMetadata>,
        resolver: LicenseResolver<F>,
        exclusions: ExclusionRules,
        logger: Arc<dyn Logger>,
        show_progress: bool,
    ) -> Result<Self> {
        Ok(Self {
            program: "dotnet".to_string(),
            parser: ListingParser::new()?,
            packages,
            resolver,
            exclusions,
            logger,
            show_progress,
        })
    }

    #[cfg(test)]
    pub fn with_program(mut self, program: &Path) -> Self {
        self.program = program.to_string_lossy().into_owned();
        self
    }

    /// Attach exclusion reasons and licenses to `rows`.
    ///
    /// Rows are bucketed by package id and version; every lookup owns exactly
    /// one bucket, so the lookups run side by side without locking. Buckets
    /// without a cached package come back untouched.
    pub async fn resolve_rows(&self, rows: Vec<ResultRow>) -> Vec<ResultRow> {
        let mut index = build_index(rows);

        let cached: HashMap<(String, String), &PackageMetadata> = self
            .packages
            .iter()
            .map(|p| ((p.id.to_lowercase(), p.version.to_lowercase()), p))
            .collect();

        let pb = self.progress_bar(index.values().map(BTreeMap::len).sum());
        let resolver = &self.resolver;
        let mut lookups = Vec::new();

        for (id, versions) in index.iter_mut() {
            for (version, rows) in versions.iter_mut() {
                let Some(meta) = cached.get(&(id.clone(), version.to_lowercase())).copied() else {
                    self.logger
                        .debug(&format!("{} {} is not in the package cache", id, version));
                    pb.inc(1);
                    continue;
                };

                if let Some(reason) = self.exclusions.reason(&meta.id, &meta.authors) {
                    self.logger
                        .debug(&format!("Ignoring {} {}: {}", meta.id, meta.version, reason));
                    for row in rows.iter_mut() {
                        row.ignore(&reason);
                    }
                    pb.inc(1);
                    continue;
                }

                let pb = &pb;
                let logger = &self.logger;
                lookups.push(async move {
                    let license = resolver.resolve(meta).await;
                    if let (Some(name), Some(text)) = (&license.name, &license.text) {
                        logger.debug(&format!(
                            "{} {}: {} ({} bytes of license text)",
                            meta.id,
                            meta.version,
                            name,
                            text.len()
                        ));
                    }
                    for row in rows.iter_mut() {
                        row.attach_license(&license, meta.project_url.as_deref());
                    }
                    pb.inc(1);
                });
            }
        }

        join_all(lookups).await;
        pb.finish_and_clear();

        index
            .into_values()
            .flat_map(BTreeMap::into_values)
            .flatten()
            .collect()
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}

impl<F: Fetch> super::LicenseReader for DotNetReader<F> {
    async fn read_licenses(&mut self, project: &Path) -> Result<Vec<ResultRow>> {
        let path = project.to_string_lossy().into_owned();
        self.logger.info(&format!(
            "Starting dotnet list {} package --include-transitive",
            path
        ));
        let command = tool_command(
            &self.program,
            &["list", path.as_str(), "package", "--include-transitive"],
        );
        let rows = self.parser.parse(OutputLines::spawn(command)?);
        self.logger
            .debug(&format!("{} package references in {}", rows.len(), path));

        Ok(self.resolve_rows(rows).await)
    }
}

fn build_index(rows: Vec<ResultRow>) -> Index {
    let mut index = Index::new();
    for row in rows {
        index
            .entry(row.package.to_lowercase())
            .or_default()
            .entry(row.version.clone())
            .or_default()
            .push(row);
    }
    index
}

//! `package-licenses` — list the third-party packages of .NET and Node.js
//! projects together with their licenses, as a spreadsheet.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]) and merge them over the settings file ([`config`]).
//! 2. Find the project files to scan ([`detector`]).
//! 3. Read each project's dependencies and licenses ([`reader`]), one project at a time.
//! 4. Filter and deduplicate the rows ([`report::aggregate`]).
//! 5. Write `<prefix>Licenses.xlsx` ([`report::xlsx`]) and print a summary.
//!
//! Configuration errors exit with a dedicated code (see [`error::UsageError`])
//! before anything is written.

mod cli;
mod config;
mod detector;
mod error;
mod license;
mod logger;
mod models;
mod nuget;
mod process;
mod reader;
mod report;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use cli::Cli;
use config::{load_config, Input, Settings};
use detector::discover_projects;
use error::UsageError;
use license::fetch::HttpFetcher;
use license::resolver::LicenseResolver;
use logger::{ConsoleLogger, Logger, NullLogger};
use models::ProjectKind;
use reader::dotnet::DotNetReader;
use reader::node::NodeReader;
use reader::read_project;

fn exit_with(err: UsageError) -> ! {
    println!("{}", err);
    std::process::exit(err.exit_code());
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let file = load_config(cli.config.as_deref())?;
    let settings = Settings::resolve(&cli, file).unwrap_or_else(|e| exit_with(e));

    let logger: Arc<dyn Logger> = if cli.quiet {
        Arc::new(NullLogger)
    } else {
        Arc::new(ConsoleLogger::new(cli.verbose))
    };

    let projects = match &settings.input {
        Input::Folder { path, recursive } => discover_projects(path, *recursive),
        Input::Project { path, kind } => vec![(path.clone(), *kind)],
    };
    if projects.is_empty() {
        logger.warn("No *.csproj or package.json files found");
    }

    // The package cache is only needed for .NET projects, but must be valid before any scan starts.
    let mut dotnet = if projects.iter().any(|(_, kind)| *kind == ProjectKind::DotNet) {
        let cache = settings.package_cache().unwrap_or_else(|e| exit_with(e));
        let packages = nuget::cache::read_packages(cache, logger.as_ref());
        logger.debug(&format!("{} packages in {}", packages.len(), cache.display()));
        if settings.credentials.is_none() {
            logger.debug("No client credentials configured, GitHub lookups are anonymous");
        }
        let fetcher = HttpFetcher::new(settings.credentials.clone())?;
        Some(DotNetReader::new(
            packages,
            LicenseResolver::new(fetcher, logger.clone()),
            settings.exclusions.clone(),
            logger.clone(),
            !cli.quiet,
        )?)
    } else {
        None
    };
    let mut node = NodeReader::new(logger.clone())?;

    let mut all_rows = Vec::new();
    for (path, kind) in &projects {
        let rows = match kind {
            ProjectKind::DotNet => {
                let reader = dotnet.as_mut().context("no .NET reader configured")?;
                read_project(reader, path, logger.as_ref()).await?
            }
            ProjectKind::Node => read_project(&mut node, path, logger.as_ref()).await?,
        };

        logger.info(&format!(
            "{} {} {} dependencies",
            path.display(),
            kind,
            rows.len()
        ));
        for row in &rows {
            logger.debug(&row.to_string());
        }
        all_rows.extend(rows);
    }

    let report_rows = report::aggregate::aggregate(&all_rows, settings.include_project);
    let report_path = settings.report_path();
    report::xlsx::write(&report_rows, settings.include_project, &report_path)?;

    if !cli.quiet {
        report::terminal::render(&report_rows, projects.len(), &report_path, cli.verbose);
    }

    Ok(())
}

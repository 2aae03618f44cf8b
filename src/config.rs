use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::cli::Cli;
use crate::error::UsageError;
use crate::models::ProjectKind;

/// Optional settings file, deserialized from `package-licenses.toml`.
///
/// Every key can also be given on the command line or through a
/// `PACKAGE_LICENSES_*` environment variable, which take precedence.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub folder: Option<PathBuf>,
    pub project: Option<PathBuf>,
    pub recursive: Option<bool>,
    pub include_project: Option<bool>,
    pub output_path: Option<String>,
    pub packages_path: Option<PathBuf>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub exclusions: ExclusionRules,
}

/// Rules that mark cached packages as not worth reporting.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExclusionRules {
    /// Package id prefixes of in-house libraries.
    pub internal_prefixes: Vec<String>,
    /// First-party vendors, matched against the start of the author list.
    pub vendors: Vec<String>,
    /// Testing framework vendors, matched against the start of the author list.
    pub test_frameworks: Vec<String>,
}

impl Default for ExclusionRules {
    fn default() -> Self {
        ExclusionRules {
            internal_prefixes: vec!["r4.".to_string()],
            vendors: vec!["Microsoft".to_string(), "JetBrains".to_string()],
            test_frameworks: vec!["xUnit".to_string()],
        }
    }
}

impl ExclusionRules {
    /// Reason a package is excluded, checked in order: internal prefix, vendor, testing framework.
    pub fn reason(&self, id: &str, authors: &str) -> Option<String> {
        let id = id.to_lowercase();
        let authors = authors.trim().to_lowercase();

        if self
            .internal_prefixes
            .iter()
            .any(|prefix| id.starts_with(&prefix.to_lowercase()))
        {
            return Some("internal library".to_string());
        }

        if let Some(vendor) = self
            .vendors
            .iter()
            .find(|v| authors.starts_with(&v.to_lowercase()))
        {
            return Some(format!("{} package", vendor));
        }

        self.test_frameworks
            .iter()
            .find(|v| authors.starts_with(&v.to_lowercase()))
            .map(|vendor| format!("{} testing framework", vendor))
    }
}

/// What to scan.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Folder { path: PathBuf, recursive: bool },
    Project { path: PathBuf, kind: ProjectKind },
}

/// Client id and secret for authenticated GitHub lookups.
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Fully merged run settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub input: Input,
    pub include_project: bool,
    pub output_prefix: String,
    pub packages_path: Option<PathBuf>,
    pub credentials: Option<Credentials>,
    pub exclusions: ExclusionRules,
}

impl Settings {
    /// Merge command line (and environment, via clap) over the settings file.
    pub fn resolve(cli: &Cli, file: FileConfig) -> Result<Settings, UsageError> {
        let folder = cli.folder.clone().or(file.folder);
        let project = cli.project.clone().or(file.project);

        let input = match (folder, project) {
            (None, None) => return Err(UsageError::MissingInput),
            (Some(_), Some(_)) => return Err(UsageError::ConflictingInput),
            (Some(path), None) if path.is_dir() => Input::Folder {
                path,
                recursive: cli.recursive.or(file.recursive).unwrap_or(true),
            },
            (Some(path), None) => return Err(UsageError::InputPath(path)),
            (None, Some(path)) => match ProjectKind::of(&path) {
                Some(_) if !path.is_file() => return Err(UsageError::InputPath(path)),
                Some(kind) => Input::Project { path, kind },
                None => return Err(UsageError::UnsupportedProject(path)),
            },
        };

        let client_id = cli.client_id.clone().or(file.client_id);
        let client_secret = cli.client_secret.clone().or(file.client_secret);
        let credentials = match (client_id, client_secret) {
            (Some(client_id), Some(client_secret))
                if !client_id.is_empty() && !client_secret.is_empty() =>
            {
                Some(Credentials {
                    client_id,
                    client_secret,
                })
            }
            _ => None,
        };

        Ok(Settings {
            input,
            include_project: cli.include_project || file.include_project.unwrap_or(false),
            output_prefix: cli.output.clone().or(file.output_path).unwrap_or_default(),
            packages_path: cli
                .packages
                .clone()
                .or(file.packages_path)
                .or_else(default_packages_path),
            credentials,
            exclusions: file.exclusions,
        })
    }

    /// The package cache folder; only required once a .NET project is scanned.
    pub fn package_cache(&self) -> Result<&Path, UsageError> {
        match &self.packages_path {
            Some(path) if path.is_dir() => Ok(path),
            Some(path) => Err(UsageError::PackagePath(path.clone())),
            None => Err(UsageError::PackagePath(PathBuf::new())),
        }
    }

    pub fn report_path(&self) -> PathBuf {
        PathBuf::from(format!("{}Licenses.xlsx", self.output_prefix))
    }
}

fn default_packages_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".nuget").join("packages"))
}

/// Load the settings file, searching in order:
///
/// 1. `config_override` — path passed via `--config`
/// 2. `./package-licenses.toml`
/// 3. `~/.config/package-licenses/config.toml`
/// 4. Built-in defaults
pub fn load_config(config_override: Option<&Path>) -> Result<FileConfig> {
    if let Some(path) = config_override {
        return read_config(path);
    }

    let local = PathBuf::from("package-licenses.toml");
    if local.exists() {
        return read_config(&local);
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home
            .join(".config")
            .join("package-licenses")
            .join("config.toml");
        if home_config.exists() {
            return read_config(&home_config);
        }
    }

    Ok(FileConfig::default())
}

fn read_config(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Invalid config {}", path.display()))
}

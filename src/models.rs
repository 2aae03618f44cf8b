use std::path::Path;

/// One (project, dependency) edge discovered by a reader.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultRow {
    pub project: String,
    pub package: String,
    pub version: String,
    pub license: Option<String>,
    pub license_url: Option<String>,
    pub project_url: Option<String>,
    /// Set when the row is excluded from the report. Never cleared once set.
    pub ignored_reason: Option<String>,
}

impl ResultRow {
    pub fn new(project: &str, package: &str, version: &str) -> Self {
        Self {
            project: project.to_string(),
            package: package.to_string(),
            version: version.to_string(),
            ..Self::default()
        }
    }

    /// Mark the row as excluded. The first reason wins.
    pub fn ignore(&mut self, reason: &str) {
        if self.ignored_reason.is_none() {
            self.ignored_reason = Some(reason.to_string());
        }
    }

    pub fn attach_license(&mut self, license: &License, project_url: Option<&str>) {
        self.license = license.name.clone();
        self.license_url = license.download_uri.clone();
        if self.project_url.is_none() {
            self.project_url = project_url.map(str::to_string);
        }
    }
}

impl std::fmt::Display for ResultRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}->{} ({}) with '{}' from '{}'",
            self.project,
            self.package,
            self.version,
            self.license.as_deref().unwrap_or(""),
            self.license_url.as_deref().unwrap_or("")
        )?;
        if let Some(reason) = &self.ignored_reason {
            write!(f, " ignored because {}", reason)?;
        }
        Ok(())
    }
}

/// Package metadata read from a `.nuspec` in the local package cache.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageMetadata {
    pub id: String,
    pub version: String,
    pub authors: String,
    /// The `<license>` element (usually an SPDX expression).
    pub license: Option<String>,
    pub license_url: Option<String>,
    pub project_url: Option<String>,
}

/// The resolved license descriptor for one package version.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct License {
    pub name: Option<String>,
    pub download_uri: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectKind {
    DotNet,
    Node,
}

impl ProjectKind {
    /// Pick the reader for a project file by its name.
    pub fn of(path: &Path) -> Option<Self> {
        let file_name = path.file_name().and_then(|n| n.to_str())?;
        if file_name == "package.json" {
            return Some(ProjectKind::Node);
        }
        match path.extension().and_then(|e| e.to_str()) {
            Some("csproj") => Some(ProjectKind::DotNet),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectKind::DotNet => write!(f, ".NET"),
            ProjectKind::Node => write!(f, "Node.js"),
        }
    }
}

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;

use anyhow::{Context, Result};
use regex::Regex;

use crate::logger::Logger;
use crate::models::ResultRow;
use crate::process::{tool_command, OutputLines};

const AUDIT_TOOL: &str = "license-checker";

/// One line of `license-checker` tree output.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeLine {
    /// `├─ name@version` at the top level of the tree.
    Package { name: String, version: Option<String> },
    /// `│  ├─ key: value` under the current package.
    Parameter { key: String, value: String },
    Other,
}

/// Recognises the two kinds of tree lines.
///
/// ```text
/// ├─ @babel/code-frame@7.22.13
/// │  ├─ licenses: MIT
/// │  ├─ repository: https://github.com/babel/babel
/// │  └─ path: /app/node_modules/@babel/code-frame
/// └─ zod@3.22.4
///    ├─ licenses: MIT
/// ```
pub struct TreeParser {
    package_re: Regex,
    param_re: Regex,
}

impl TreeParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            package_re: Regex::new(r"^[├└]─\s*(?P<name>@?[^@\s]+)(?:@(?P<version>\S+))?\s*$")?,
            param_re: Regex::new(r"^(?:│|\s)\s*[├└]─\s*(?P<key>[A-Za-z]+):\s?(?P<value>.*?)\s*$")?,
        })
    }

    pub fn parse_line(&self, line: &str) -> TreeLine {
        if let Some(caps) = self.param_re.captures(line) {
            return TreeLine::Parameter {
                key: caps["key"].to_string(),
                value: caps["value"].to_string(),
            };
        }
        if let Some(caps) = self.package_re.captures(line) {
            return TreeLine::Package {
                name: caps["name"].to_string(),
                version: caps.name("version").map(|m| m.as_str().to_string()),
            };
        }
        TreeLine::Other
    }
}

enum State {
    Idle,
    InPackage(ResultRow),
}

/// Assembles rows from tree lines.
///
/// A package line completes the package in progress; a parameter line fills
/// it in, or is dropped when no package is in progress; [`TreeBuilder::finish`]
/// flushes the last one.
pub struct TreeBuilder {
    project: String,
    state: State,
    logger: Arc<dyn Logger>,
}

impl TreeBuilder {
    pub fn new(project: &str, logger: Arc<dyn Logger>) -> Self {
        Self {
            project: project.to_string(),
            state: State::Idle,
            logger,
        }
    }

    /// Feed one line; returns the previous package when a new one starts.
    pub fn feed(&mut self, line: TreeLine) -> Option<ResultRow> {
        match line {
            TreeLine::Package { name, version } => {
                let version = version.unwrap_or_else(|| "*".to_string());
                let next = State::InPackage(ResultRow::new(&self.project, &name, &version));
                match std::mem::replace(&mut self.state, next) {
                    State::InPackage(done) => Some(done),
                    State::Idle => None,
                }
            }
            TreeLine::Parameter { key, value } => {
                match &mut self.state {
                    State::Idle => self.logger.debug(&format!("Ignoring orphan parameter {}", key)),
                    State::InPackage(row) => match key.as_str() {
                        "licenses" => row.license = Some(value),
                        "path" => row.license_url = Some(value),
                        "repository" => row.project_url = Some(value),
                        _ => {}
                    },
                }
                None
            }
            TreeLine::Other => None,
        }
    }

    pub fn finish(self) -> Option<ResultRow> {
        match self.state {
            State::InPackage(row) => Some(row),
            State::Idle => None,
        }
    }
}

/// Reader for `package.json` projects, driven by the `license-checker` npm tool.
pub struct NodeReader {
    tool: String,
    npm: String,
    parser: TreeParser,
    logger: Arc<dyn Logger>,
    tool_ready: bool,
}

impl NodeReader {
    pub fn new(logger: Arc<dyn Logger>) -> Result<Self> {
        Ok(Self {
            tool: AUDIT_TOOL.to_string(),
            npm: "npm".to_string(),
            parser: TreeParser::new()?,
            logger,
            tool_ready: false,
        })
    }

    #[cfg(test)]
    pub fn with_programs(mut self, tool: &Path, npm: &Path) -> Self {
        self.tool = tool.to_string_lossy().into_owned();
        self.npm = npm.to_string_lossy().into_owned();
        self
    }

    pub fn parse<I>(&self, project: &str, lines: I) -> Vec<ResultRow>
    where
        I: IntoIterator<Item = String>,
    {
        let mut builder = TreeBuilder::new(project, self.logger.clone());
        let mut rows: Vec<ResultRow> = lines
            .into_iter()
            .filter_map(|line| builder.feed(self.parser.parse_line(&line)))
            .collect();
        rows.extend(builder.finish());
        rows
    }

    /// Install the audit tool globally, at most once per process, if it is not on the path.
    fn ensure_tool(&mut self) -> Result<()> {
        if self.tool_ready {
            return Ok(());
        }

        let present = tool_command(&self.tool, &["--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false);

        if !present {
            self.logger.info(&format!("Installing {}...", AUDIT_TOOL));
            let install = tool_command(&self.npm, &["install", "-g", AUDIT_TOOL]);
            let install = OutputLines::spawn(install)
                .context("npm is required to audit Node.js projects")?;
            for line in install {
                self.logger.debug(&line);
            }
        }

        self.tool_ready = true;
        Ok(())
    }
}

impl super::LicenseReader for NodeReader {
    async fn read_licenses(&mut self, project: &Path) -> Result<Vec<ResultRow>> {
        self.ensure_tool()?;

        let dir = match project.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => std::env::current_dir()?,
        };
        self.logger
            .info(&format!("Starting {} in {}", AUDIT_TOOL, dir.display()));

        let lines = OutputLines::spawn_in(tool_command(&self.tool, &[]), &dir)?;
        let rows = self.parse(&dir.display().to_string(), lines);
        self.logger
            .debug(&format!("{} packages in {}", rows.len(), dir.display()));
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::testing::RecordingLogger;
    use crate::logger::{Level, NullLogger};

    const TREE: &str = "\
├─ @babel/code-frame@7.22.13
│  ├─ licenses: MIT
│  ├─ repository: https://github.com/babel/babel
│  ├─ publisher: The Babel Team
│  ├─ path: /app/node_modules/@babel/code-frame
│  └─ licenseFile: /app/node_modules/@babel/code-frame/LICENSE
├─ my-app@1.0.0
│  ├─ licenses: UNLICENSED
│  └─ private: true
└─ zod@3.22.4
   ├─ licenses: MIT
   └─ path: /app/node_modules/zod
";

    fn reader() -> NodeReader {
        NodeReader::new(Arc::new(NullLogger)).unwrap()
    }

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    #[test]
    fn test_parse_line_kinds() {
        let parser = TreeParser::new().unwrap();
        assert_eq!(
            parser.parse_line("├─ @babel/code-frame@7.22.13"),
            TreeLine::Package {
                name: "@babel/code-frame".to_string(),
                version: Some("7.22.13".to_string())
            }
        );
        assert_eq!(
            parser.parse_line("└─ lodash"),
            TreeLine::Package {
                name: "lodash".to_string(),
                version: None
            }
        );
        assert_eq!(
            parser.parse_line("   └─ path: /app/node_modules/zod"),
            TreeLine::Parameter {
                key: "path".to_string(),
                value: "/app/node_modules/zod".to_string()
            }
        );
        assert_eq!(parser.parse_line("npm WARN something"), TreeLine::Other);
        assert_eq!(parser.parse_line(""), TreeLine::Other);
    }

    #[test]
    fn test_parse_tree() {
        let rows = reader().parse("/app", lines(TREE));
        assert_eq!(rows.len(), 3);

        assert_eq!(rows[0].project, "/app");
        assert_eq!(rows[0].package, "@babel/code-frame");
        assert_eq!(rows[0].version, "7.22.13");
        assert_eq!(rows[0].license.as_deref(), Some("MIT"));
        assert_eq!(
            rows[0].license_url.as_deref(),
            Some("/app/node_modules/@babel/code-frame")
        );
        assert_eq!(
            rows[0].project_url.as_deref(),
            Some("https://github.com/babel/babel")
        );

        assert_eq!(rows[1].license.as_deref(), Some("UNLICENSED"));
        assert_eq!(rows[1].license_url, None);

        // last package is flushed at end of stream
        assert_eq!(rows[2].package, "zod");
        assert_eq!(rows[2].license_url.as_deref(), Some("/app/node_modules/zod"));
    }

    #[test]
    fn test_orphan_parameter_is_ignored() {
        let logger = Arc::new(RecordingLogger::default());
        let mut builder = TreeBuilder::new("/app", logger.clone());
        let parser = TreeParser::new().unwrap();

        assert_eq!(builder.feed(parser.parse_line("│  ├─ licenses: MIT")), None);
        assert!(builder.finish().is_none());
        assert!(logger.contains(Level::Debug, "orphan"));
    }

    #[test]
    fn test_missing_version_becomes_wildcard() {
        let rows = reader().parse("/app", lines("└─ left-pad\n   ├─ licenses: WTFPL\n"));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].version, "*");
        assert_eq!(rows[0].license.as_deref(), Some("WTFPL"));
    }

    #[test]
    fn test_empty_output() {
        assert!(reader().parse("/app", Vec::new()).is_empty());
    }

    #[cfg(unix)]
    mod with_tools {
        use std::path::{Path, PathBuf};

        use super::*;
        use crate::process::testing::fake_tool;
        use crate::reader::LicenseReader;

        /// `license-checker` is reported missing until the fake `npm` has run.
        const CHECKER: &str = r#"dir="$(dirname "$0")"
if [ "$1" = "--version" ]; then
  echo version >> "$dir/calls.txt"
  if [ -f "$dir/installed" ]; then exit 0; else exit 1; fi
fi
echo run >> "$dir/calls.txt"
echo "├─ left-pad@1.3.0"
echo "│  ├─ licenses: WTFPL"
echo "│  ├─ repository: https://github.com/stevemao/left-pad"
echo "│  └─ path: $(pwd -P)/node_modules/left-pad"
echo "└─ lodash@4.17.21"
echo "   └─ licenses: MIT"
"#;

        const NPM: &str = r#"dir="$(dirname "$0")"
echo "npm $*" >> "$dir/calls.txt"
touch "$dir/installed"
"#;

        fn tools(bin: &Path) -> (PathBuf, PathBuf) {
            (
                fake_tool(bin, "license-checker", CHECKER),
                fake_tool(bin, "npm", NPM),
            )
        }

        fn calls(bin: &Path) -> Vec<String> {
            std::fs::read_to_string(bin.join("calls.txt"))
                .unwrap()
                .lines()
                .map(str::to_string)
                .collect()
        }

        #[tokio::test]
        async fn test_tool_installed_once_and_run_in_project_folder() {
            let bin = tempfile::tempdir().unwrap();
            let web = tempfile::tempdir().unwrap();
            let (checker, npm) = tools(bin.path());
            let mut reader = reader().with_programs(&checker, &npm);

            let project = web.path().join("package.json");
            let rows = reader.read_licenses(&project).await.unwrap();

            let workdir = std::fs::canonicalize(web.path()).unwrap();
            assert_eq!(rows.len(), 2);
            assert!(rows.iter().all(|r| r.project == web.path().display().to_string()));
            assert_eq!(rows[0].package, "left-pad");
            assert_eq!(rows[0].version, "1.3.0");
            assert_eq!(rows[0].license.as_deref(), Some("WTFPL"));
            assert_eq!(
                rows[0].license_url,
                Some(format!("{}/node_modules/left-pad", workdir.display()))
            );
            assert_eq!(
                rows[0].project_url.as_deref(),
                Some("https://github.com/stevemao/left-pad")
            );
            assert_eq!(rows[1].package, "lodash");
            assert_eq!(rows[1].license.as_deref(), Some("MIT"));

            let again = reader.read_licenses(&project).await.unwrap();
            assert_eq!(again, rows);
            assert_eq!(
                calls(bin.path()),
                vec!["version", "npm install -g license-checker", "run", "run"]
            );
        }

        #[tokio::test]
        async fn test_present_tool_is_not_installed() {
            let bin = tempfile::tempdir().unwrap();
            let web = tempfile::tempdir().unwrap();
            let (checker, npm) = tools(bin.path());
            std::fs::write(bin.path().join("installed"), "").unwrap();
            let mut reader = reader().with_programs(&checker, &npm);

            let rows = reader
                .read_licenses(&web.path().join("package.json"))
                .await
                .unwrap();
            assert_eq!(rows.len(), 2);
            assert_eq!(calls(bin.path()), vec!["version", "run"]);
        }

        #[tokio::test]
        async fn test_missing_npm_is_an_error() {
            let bin = tempfile::tempdir().unwrap();
            let web = tempfile::tempdir().unwrap();
            let checker = fake_tool(bin.path(), "license-checker", CHECKER);
            let mut reader = reader().with_programs(&checker, &bin.path().join("npm"));

            let result = reader.read_licenses(&web.path().join("package.json")).await;
            assert!(result.is_err());
        }
    }
}

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Default)]
#[command(
    name = "package-licenses",
    about = "List the third-party packages of .NET and Node.js projects with their licenses",
    version
)]
pub struct Cli {
    /// Folder to scan for *.csproj and package.json files
    #[arg(short, long, env = "PACKAGE_LICENSES_FOLDER", value_name = "DIR")]
    pub folder: Option<PathBuf>,

    /// Single project file (*.csproj or package.json)
    #[arg(short, long, env = "PACKAGE_LICENSES_PROJECT", value_name = "FILE")]
    pub project: Option<PathBuf>,

    /// Scan sub-folders of --folder [default: true]
    #[arg(short, long, env = "PACKAGE_LICENSES_RECURSIVE", value_name = "BOOL")]
    pub recursive: Option<bool>,

    /// Keep one row per project instead of merging packages across projects
    #[arg(short, long, env = "PACKAGE_LICENSES_INCLUDE_PROJECT")]
    pub include_project: bool,

    /// Prefix of the report path; the report is written to <PREFIX>Licenses.xlsx
    #[arg(short, long, env = "PACKAGE_LICENSES_OUTPUT_PATH", value_name = "PREFIX")]
    pub output: Option<String>,

    /// Local NuGet package cache [default: ~/.nuget/packages]
    #[arg(long, env = "PACKAGE_LICENSES_PACKAGES_PATH", value_name = "DIR")]
    pub packages: Option<PathBuf>,

    /// Client id used for authenticated GitHub license lookups
    #[arg(long, env = "PACKAGE_LICENSES_CLIENT_ID", hide_env_values = true)]
    pub client_id: Option<String>,

    /// Client secret used for authenticated GitHub license lookups
    #[arg(long, env = "PACKAGE_LICENSES_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Config file [default: ./package-licenses.toml, fallback ~/.config/package-licenses/config.toml]
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print debug diagnostics
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long)]
    pub quiet: bool,
}

use std::path::PathBuf;

use thiserror::Error;

/// Fatal configuration problems, each with its own process exit code.
#[derive(Error, Debug)]
pub enum UsageError {
    #[error("No input given: pass --folder <DIR> or --project <FILE>")]
    MissingInput,

    #[error("--folder and --project cannot be used together")]
    ConflictingInput,

    #[error("Path not found: {}", .0.display())]
    PackagePath(PathBuf),

    #[error("Unsupported project file: {} (expected *.csproj or package.json)", .0.display())]
    UnsupportedProject(PathBuf),

    #[error("Input not found: {}", .0.display())]
    InputPath(PathBuf),
}

impl UsageError {
    pub fn exit_code(&self) -> i32 {
        match self {
            UsageError::PackagePath(_) => 0xA0,
            UsageError::MissingInput => 0xA1,
            UsageError::ConflictingInput => 0xA2,
            UsageError::UnsupportedProject(_) => 0xA3,
            UsageError::InputPath(_) => 0xA4,
        }
    }
}

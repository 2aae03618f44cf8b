use std::path::Path;

use anyhow::Result;

use crate::logger::Logger;
use crate::models::ResultRow;

pub mod dotnet;
pub mod node;

/// Lists the dependencies of one project, with license information where it can be found.
#[allow(async_fn_in_trait)]
pub trait LicenseReader {
    async fn read_licenses(&mut self, project: &Path) -> Result<Vec<ResultRow>>;
}

/// Read one project; a failure is logged before it aborts the run.
pub async fn read_project<R: LicenseReader>(
    reader: &mut R,
    project: &Path,
    logger: &dyn Logger,
) -> Result<Vec<ResultRow>> {
    match reader.read_licenses(project).await {
        Ok(rows) => Ok(rows),
        Err(e) => {
            logger.error(&format!("Could not read {}: {:#}", project.display(), e));
            Err(e)
        }
    }
}

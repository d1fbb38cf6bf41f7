//! `gantry install`: reinstall everything package.json lists.

use gantry::orchestrator::InstallOrchestrator;
use tokio_util::sync::CancellationToken;

use super::add::report;
use super::output::Output;
use crate::error::CliError;

pub async fn run(
    orchestrator: &InstallOrchestrator,
    output: &dyn Output,
    cancel: CancellationToken,
) -> Result<(), CliError> {
    let result = orchestrator.install_from_manifest_with_cancel(cancel).await;
    report(result, output)
}

//! `orbit run` and `orbit exec`: run the provider CLI under a profile.

use tracing::info;

use super::App;
use crate::output::Output;

/// Run the provider CLI once as `profile`.
pub async fn run_as(
    app: &App,
    provider: &str,
    profile: &str,
    args: Vec<String>,
    output: &Output,
) -> anyhow::Result<i32> {
    let provider = app.providers.get(provider)?;
    output.info(format!("Running as {}/{profile}...", provider.name()));

    let outcome = app
        .orchestrator
        .run_as(provider.as_ref(), profile, args)
        .await?;
    info!(mode = ?outcome.mode, code = outcome.exit_code, "command finished");
    Ok(outcome.exit_code)
}

/// Run the provider CLI as the active profile.
pub async fn exec_current(
    app: &App,
    provider: &str,
    args: Vec<String>,
    output: &Output,
) -> anyhow::Result<i32> {
    let provider = app.providers.get(provider)?;
    if let Some(current) = app.orchestrator.registry().get_current(provider.name())? {
        output.info(format!("Running as {}/{current}...", provider.name()));
    }

    let outcome = app
        .orchestrator
        .exec_current(provider.as_ref(), args)
        .await?;
    info!(mode = ?outcome.mode, code = outcome.exit_code, "command finished");
    Ok(outcome.exit_code)
}

//! `orbit remove <provider> <profile>`.

use serde_json::json;

use super::App;
use crate::output::Output;

/// Run the remove command.
pub async fn run(app: &App, provider: &str, profile: &str, output: &Output) -> anyhow::Result<i32> {
    let provider = app.providers.get(provider)?;

    let spinner = output.spinner("Removing profile...");
    let outcome = match app
        .orchestrator
        .remove_profile(provider.as_ref(), profile)
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            spinner.fail("Could not remove profile.");
            return Err(e.into());
        }
    };
    spinner.succeed(&format!(
        "Profile \"{profile}\" removed from {}.",
        provider.name()
    ));

    if output.is_json() {
        output.json(&json!({
            "ok": true,
            "provider": provider.name(),
            "profile": profile,
            "wasCurrent": outcome.was_current,
        }))?;
    } else if outcome.was_current {
        output.info(format!(
            "It was the active profile; run \"orbit use {} <profile>\" to pick another.",
            provider.name()
        ));
    }
    Ok(0)
}

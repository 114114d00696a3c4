//! `orbit use <provider> <profile>`.

use orbit_switch::AuthCheck;
use serde_json::json;

use super::App;
use crate::output::Output;

/// Run the use command.
pub async fn run(app: &App, provider: &str, profile: &str, output: &Output) -> anyhow::Result<i32> {
    let provider = app.providers.get(provider)?;

    let spinner = output.spinner("Switching profile...");
    let outcome = match app.orchestrator.switch_to(provider.as_ref(), profile).await {
        Ok(outcome) => outcome,
        Err(e) => {
            spinner.fail("Profile switch failed.");
            return Err(e.into());
        }
    };
    spinner.succeed(&format!(
        "Now using profile \"{profile}\" for {}.",
        provider.name()
    ));
    if outcome.auth == AuthCheck::Recovered {
        output.info("The saved session was stale; signed in again with the stored token.");
    }

    if output.is_json() {
        output.json(&json!({
            "ok": true,
            "provider": provider.name(),
            "profile": profile,
            "previous": outcome.previous,
            "restored": outcome.restored,
        }))?;
    }
    Ok(0)
}

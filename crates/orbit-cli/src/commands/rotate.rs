//! `orbit rotate-key`.

use serde_json::json;

use super::App;
use crate::output::Output;

/// Run the rotate-key command.
pub fn run(app: &App, output: &Output) -> anyhow::Result<i32> {
    let spinner = output.spinner("Rotating encryption key...");
    let report = match app.orchestrator.rotate_key() {
        Ok(report) => report,
        Err(e) => {
            spinner.fail("Failed to rotate encryption key.");
            return Err(e.into());
        }
    };
    spinner.succeed(&format!(
        "Encryption key rotated; {} token(s) re-encrypted.",
        report.entries
    ));

    if output.is_json() {
        output.json(&json!({ "ok": true, "entries": report.entries }))?;
    }
    Ok(0)
}

//! Output context.
//!
//! Built once in `main` and passed to every command. In JSON mode human
//! messages and spinners are suppressed and results are printed as a single
//! JSON document on stdout; errors become `{"ok":false,...}` on stderr.

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use orbit_core::env;
use orbit_core::redact::redact_secrets;
use serde::Serialize;

/// Environment variable enabling full error chains.
pub const DEBUG_ENV: &str = "ORBIT_DEBUG";

#[derive(Debug, Clone, Copy, Default)]
pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    pub fn info(&self, message: impl AsRef<str>) {
        if !self.json {
            println!("{} {}", style("ℹ").blue(), message.as_ref());
        }
    }

    pub fn success(&self, message: impl AsRef<str>) {
        if !self.json {
            println!("{} {}", style("✔").green(), message.as_ref());
        }
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        if !self.json {
            eprintln!("{} {}", style("⚠").yellow(), message.as_ref());
        }
    }

    pub fn plain(&self, message: impl AsRef<str>) {
        if !self.json {
            println!("{}", message.as_ref());
        }
    }

    /// Print a JSON result document.
    pub fn json<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    pub fn spinner(&self, message: &str) -> Spinner {
        if self.json {
            return Spinner(None);
        }
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.blue} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Spinner(Some(pb))
    }

    /// Print a top-level error with secrets redacted.
    pub fn report_error(&self, err: &anyhow::Error) {
        let message = redact_secrets(&format!("{err:#}"));

        if self.json {
            let body = serde_json::json!({ "ok": false, "error": message });
            eprintln!("{body}");
            return;
        }

        eprintln!("{} {}", style("✖").red(), message);
        if env::get_bool(DEBUG_ENV) {
            eprintln!("{}", style(redact_secrets(&format!("{err:?}"))).dim());
        }
    }
}

/// A spinner that is a no-op in JSON mode.
pub struct Spinner(Option<ProgressBar>);

impl Spinner {
    pub fn set_message(&self, message: &str) {
        if let Some(pb) = &self.0 {
            pb.set_message(message.to_string());
        }
    }

    /// Clear the spinner so prompts and child output are not overdrawn.
    pub fn stop(&self) {
        if let Some(pb) = &self.0 {
            pb.finish_and_clear();
        }
    }

    pub fn succeed(&self, message: &str) {
        if let Some(pb) = &self.0 {
            pb.finish_and_clear();
            println!("{} {}", style("✔").green(), message);
        }
    }

    pub fn fail(&self, message: &str) {
        if let Some(pb) = &self.0 {
            pb.finish_and_clear();
            eprintln!("{} {}", style("✖").red(), message);
        }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        if let Some(pb) = &self.0 {
            if !pb.is_finished() {
                pb.finish_and_clear();
            }
        }
    }
}

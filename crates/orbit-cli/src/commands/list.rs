//! `orbit list` and `orbit current`.

use console::style;
use orbit_core::Registry;
use serde::Serialize;

use super::App;
use crate::output::Output;

#[derive(Debug, Serialize)]
struct ProviderListing<'a> {
    provider: &'a str,
    current: Option<&'a str>,
    profiles: Vec<ProfileListing<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileListing<'a> {
    name: &'a str,
    email: Option<&'a str>,
    is_current: bool,
}

#[derive(Debug, Serialize)]
struct CurrentListing<'a> {
    provider: &'a str,
    profile: &'a str,
}

fn listings(registry: &Registry) -> Vec<ProviderListing<'_>> {
    registry
        .providers
        .iter()
        .map(|(provider, entry)| ProviderListing {
            provider,
            current: entry.current.as_deref(),
            profiles: entry
                .profiles
                .iter()
                .map(|name| ProfileListing {
                    name,
                    email: entry.email(name),
                    is_current: entry.is_current(name),
                })
                .collect(),
        })
        .collect()
}

fn current_listings(registry: &Registry) -> Vec<CurrentListing<'_>> {
    registry
        .providers
        .iter()
        .filter_map(|(provider, entry)| {
            entry
                .current
                .as_deref()
                .map(|profile| CurrentListing { provider, profile })
        })
        .collect()
}

/// Run the list command.
pub fn list(app: &App, output: &Output) -> anyhow::Result<i32> {
    let registry = app.orchestrator.registry().load()?;
    let providers = listings(&registry);

    if output.is_json() {
        output.json(&serde_json::json!({ "ok": true, "providers": providers }))?;
        return Ok(0);
    }

    if providers.is_empty() {
        output.info("No profiles configured yet. Use \"orbit add <provider> <profile>\" to get started.");
        return Ok(0);
    }

    output.plain("");
    output.plain(format!(
        "  {} {} {} {}",
        style(format!("{:<15}", "Provider")).bold().underlined(),
        style(format!("{:<20}", "Profile")).bold().underlined(),
        style(format!("{:<30}", "Email")).bold().underlined(),
        style("Status").bold().underlined(),
    ));
    output.plain("");

    for listing in &providers {
        for profile in &listing.profiles {
            let provider = format!("{:<15}", listing.provider);
            let name = format!("{:<20}", profile.name);
            let email = format!("{:<30}", profile.email.unwrap_or("-"));

            let line = if profile.is_current {
                format!(
                    "  {} {} {} {}",
                    style(provider).cyan(),
                    style(name).cyan(),
                    style(email).cyan(),
                    style("★ current").green()
                )
            } else {
                format!(
                    "  {} {} {} {}",
                    provider,
                    name,
                    style(email).dim(),
                    style("-").dim()
                )
            };
            output.plain(line);
        }
    }
    output.plain("");
    Ok(0)
}

/// Run the current command.
pub fn current(app: &App, output: &Output) -> anyhow::Result<i32> {
    let registry = app.orchestrator.registry().load()?;
    let current = current_listings(&registry);

    if output.is_json() {
        output.json(&serde_json::json!({ "ok": true, "current": current }))?;
        return Ok(0);
    }

    if registry.providers.is_empty() {
        output.info("No profiles configured yet.");
    } else if current.is_empty() {
        output.info("No active profiles set. Use \"orbit use <provider> <profile>\" to set one.");
    } else {
        for entry in &current {
            output.success(format!(
                "{}: {}",
                style(entry.provider).bold(),
                style(entry.profile).cyan()
            ));
        }
    }
    Ok(0)
}

//! `orbit add <provider> <profile>`.

use clap::Args;
use console::style;
use orbit_core::SecretString;
use orbit_providers::Provider;
use orbit_switch::TokenOrigin;
use serde_json::json;
use tracing::warn;

use super::App;
use crate::output::Output;
use crate::prompt;

/// Add command arguments.
#[derive(Args)]
pub struct AddArgs {
    /// Provider name (e.g. vercel)
    pub provider: String,

    /// Profile name (e.g. personal, company)
    pub profile: String,

    /// Token to store (skips discovery and prompting)
    #[arg(long, conflicts_with = "stdin")]
    pub token: Option<String>,

    /// Read the token from stdin
    #[arg(long)]
    pub stdin: bool,

    /// Accept a token found in the provider CLI's credentials without asking
    #[arg(short, long)]
    pub yes: bool,

    /// Never offer to run the provider's login flow
    #[arg(long)]
    pub no_login: bool,
}

/// Run the add command.
pub async fn run(app: &App, args: AddArgs, output: &Output) -> anyhow::Result<i32> {
    let provider = app.providers.get(&args.provider)?;
    let provider = provider.as_ref();

    let (token, origin) = match (&args.token, args.stdin) {
        (Some(token), _) => (SecretString::new(token.as_str()), TokenOrigin::Supplied),
        (None, true) => (prompt::read_stdin()?, TokenOrigin::Supplied),
        (None, false) => discover(provider, &args, output).await?,
    };

    if token.trimmed().is_empty() {
        anyhow::bail!("Token cannot be empty.");
    }

    let spinner = output.spinner("Validating and storing token...");
    let outcome = match app
        .orchestrator
        .add_profile(provider, &args.profile, &token, origin)
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            spinner.fail("Could not add profile.");
            return Err(e.into());
        }
    };
    spinner.succeed(&format!(
        "Profile \"{}\" added for {}.",
        args.profile,
        provider.name()
    ));

    if output.is_json() {
        output.json(&json!({
            "ok": true,
            "provider": provider.name(),
            "profile": args.profile,
            "email": outcome.email,
            "replaced": outcome.replaced,
            "snapshot": outcome.captured,
        }))?;
    } else if let Some(email) = &outcome.email {
        output.info(format!("Signed in as {}", style(email).cyan()));
    }
    Ok(0)
}

/// Find a token interactively: the provider CLI's own credentials, then an
/// optional login, then a hidden prompt.
async fn discover(
    provider: &dyn Provider,
    args: &AddArgs,
    output: &Output,
) -> anyhow::Result<(SecretString, TokenOrigin)> {
    let interactive = prompt::is_interactive();
    let mut found_existing = false;

    if let Some(source) = provider.token_source() {
        let spinner = output.spinner(&format!(
            "Checking for existing {} credentials...",
            provider.name()
        ));
        let stored = source.stored_token().await;
        spinner.stop();

        match stored {
            Ok(Some(token)) => {
                found_existing = true;
                let email = match provider.identity() {
                    Some(identity) => identity.user_email(&token).await,
                    None => None,
                };
                let who = email
                    .map(|e| format!(" ({})", style(e).cyan()))
                    .unwrap_or_default();

                let accept = args.yes
                    || (interactive
                        && prompt::confirm(&format!(
                            "Found existing token{who} from {} CLI. Use this? (Y/n) ",
                            provider.name()
                        ))?);
                if accept {
                    return Ok((token, TokenOrigin::LiveAuth));
                }
            }
            Ok(None) => {}
            Err(e) => warn!(provider = provider.name(), "could not read existing credentials: {e}"),
        }
    }

    if !interactive {
        anyhow::bail!(
            "No token provided. Pass --token, pipe it with --stdin, or use --yes to accept the {} CLI's current credentials.",
            provider.name()
        );
    }

    if let (Some(login), false) = (provider.login(), args.no_login) {
        let question = if found_existing {
            format!("Login to a different account with {} CLI? (Y/n) ", provider.name())
        } else {
            format!(
                "No existing credentials found. Login with {} CLI now? (Y/n) ",
                provider.name()
            )
        };

        if prompt::confirm(&question)? {
            if login.login().await? {
                if let Some(source) = provider.token_source() {
                    if let Some(token) = source.stored_token().await? {
                        output.success("New credentials found!");
                        return Ok((token, TokenOrigin::LiveAuth));
                    }
                }
            } else {
                output.warn("Login failed or was cancelled.");
            }
        }
    }

    let token = prompt::hidden(&format!(
        "Enter token for {}/{}: ",
        provider.name(),
        args.profile
    ))?;
    Ok((token, TokenOrigin::Supplied))
}

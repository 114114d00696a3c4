//! Terminal prompts.

use std::io::{self, BufRead, IsTerminal, Read, Write};

use orbit_core::SecretString;

/// Whether a person can answer prompts.
pub fn is_interactive() -> bool {
    io::stdin().is_terminal()
}

/// Ask a yes/no question. An empty answer is yes.
pub fn confirm(prompt: &str) -> anyhow::Result<bool> {
    eprint!("{prompt}");
    io::stderr().flush()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(parse_confirmation(&input))
}

fn parse_confirmation(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "" | "y" | "yes")
}

/// Read a secret without echo.
pub fn hidden(prompt: &str) -> anyhow::Result<SecretString> {
    let value = rpassword::prompt_password(prompt)
        .map_err(|e| anyhow::anyhow!("Failed to read token: {}", e))?;
    Ok(SecretString::new(value))
}

/// Read a secret piped on stdin.
pub fn read_stdin() -> anyhow::Result<SecretString> {
    let mut value = String::new();
    io::stdin().read_to_string(&mut value)?;
    Ok(SecretString::new(value).trimmed())
}

//! Spawning the provider CLI.

use std::fmt;
use std::process::Stdio;

use async_trait::async_trait;
use orbit_core::SecretString;
use tokio::process::Command;
use tracing::debug;

/// One provider CLI invocation.
#[derive(Clone, Default)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Variables injected into the child only.
    pub env: Vec<(String, SecretString)>,
    /// Variables removed from the child's inherited environment.
    pub env_remove: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = String>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn with_env(mut self, name: impl Into<String>, value: SecretString) -> Self {
        self.env.push((name.into(), value));
        self
    }

    pub fn without_env(mut self, name: impl Into<String>) -> Self {
        self.env_remove.push(name.into());
        self
    }

    /// Command line for messages. Never includes injected values.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("env", &self.env.iter().map(|(k, _)| k).collect::<Vec<_>>())
            .field("env_remove", &self.env_remove)
            .finish()
    }
}

/// Runs an invocation to completion and reports its exit code.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> std::io::Result<i32>;
}

/// Runs the real process with the terminal passed through.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation) -> std::io::Result<i32> {
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        for name in &invocation.env_remove {
            command.env_remove(name);
        }
        for (name, value) in &invocation.env {
            command.env(name, value.expose_secret());
        }

        debug!(command = %invocation.display(), "spawning");
        let mut child = command.spawn()?;

        // The terminal delivers Ctrl-C to the child as well. Keep waiting so
        // the caller still gets to restore live auth afterwards.
        let status = loop {
            tokio::select! {
                status = child.wait() => break status?,
                interrupt = tokio::signal::ctrl_c() => {
                    interrupt?;
                    debug!("interrupt received; waiting for child to exit");
                }
            }
        };

        // A signal-terminated child has no code.
        Ok(status.code().unwrap_or(1))
    }
}

//! In-memory provider and command runner for orchestrator tests.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use orbit_core::SecretString;
use orbit_providers::{
    AuthCapture, AuthRestore, AuthSeeding, AuthValidation, IdentityLookup, Provider,
    ProviderError, SnapshotRemoval,
};

use crate::runner::{CommandRunner, Invocation};

#[derive(Debug, Default)]
pub struct FakeState {
    pub live: Option<String>,
    pub snapshots: HashMap<String, String>,
    pub invalid: HashSet<String>,
    pub failing_restores: HashSet<String>,
    pub failing_removals: HashSet<String>,
    /// Capturing this profile turns the path into a directory, so later
    /// writes to it fail.
    pub block_path_on_capture: Option<(String, PathBuf)>,
}

/// Live auth is a single string; a profile's snapshot is a copy of it.
pub struct FakeProvider {
    state: Arc<Mutex<FakeState>>,
    snapshots: bool,
    seeding: bool,
}

impl FakeProvider {
    /// Every capability present.
    pub fn full() -> Self {
        Self {
            state: Arc::default(),
            snapshots: true,
            seeding: true,
        }
    }

    /// Only the mandatory operations.
    pub fn env_only() -> Self {
        Self {
            snapshots: false,
            seeding: false,
            ..Self::full()
        }
    }

    pub fn without_seeding(mut self) -> Self {
        self.seeding = false;
        self
    }

    pub fn state(&self) -> Arc<Mutex<FakeState>> {
        self.state.clone()
    }

    fn with<T>(&self, f: impl FnOnce(&mut FakeState) -> T) -> T {
        f(&mut self.state.lock().unwrap())
    }

    pub fn live(&self) -> Option<String> {
        self.with(|s| s.live.clone())
    }

    pub fn set_live(&self, value: &str) {
        self.with(|s| s.live = Some(value.to_string()));
    }

    pub fn snapshot(&self, profile: &str) -> Option<String> {
        self.with(|s| s.snapshots.get(profile).cloned())
    }

    pub fn put_snapshot(&self, profile: &str, value: &str) {
        self.with(|s| s.snapshots.insert(profile.to_string(), value.to_string()));
    }

    pub fn drop_snapshot(&self, profile: &str) {
        self.with(|s| s.snapshots.remove(profile));
    }

    pub fn mark_invalid(&self, value: &str) {
        self.with(|s| s.invalid.insert(value.to_string()));
    }

    pub fn mark_valid(&self, value: &str) {
        self.with(|s| s.invalid.remove(value));
    }

    pub fn fail_removal_of(&self, profile: &str) {
        self.with(|s| s.failing_removals.insert(profile.to_string()));
    }

    pub fn block_path_on_capture_of(&self, profile: &str, path: &std::path::Path) {
        self.with(|s| s.block_path_on_capture = Some((profile.to_string(), path.to_path_buf())));
    }

    /// Restoring `profile` clobbers live auth and then errors.
    pub fn fail_restore_of(&self, profile: &str) {
        self.with(|s| s.failing_restores.insert(profile.to_string()));
    }
}

impl Provider for FakeProvider {
    fn name(&self) -> &str {
        "fake"
    }

    fn env_var(&self) -> &str {
        "FAKE_TOKEN"
    }

    fn cli_name(&self) -> &str {
        "fake-cli"
    }

    fn validate_token(&self, token: &str) -> bool {
        token.len() > 20
    }

    fn auth_config_path(&self) -> Option<PathBuf> {
        self.snapshots.then(|| PathBuf::from("/fake/auth.json"))
    }

    fn identity(&self) -> Option<&dyn IdentityLookup> {
        Some(self)
    }

    fn auth_capture(&self) -> Option<&dyn AuthCapture> {
        self.snapshots.then_some(self as &dyn AuthCapture)
    }

    fn auth_restore(&self) -> Option<&dyn AuthRestore> {
        self.snapshots.then_some(self as &dyn AuthRestore)
    }

    fn auth_validation(&self) -> Option<&dyn AuthValidation> {
        self.snapshots.then_some(self as &dyn AuthValidation)
    }

    fn auth_seeding(&self) -> Option<&dyn AuthSeeding> {
        self.seeding.then_some(self as &dyn AuthSeeding)
    }

    fn snapshot_removal(&self) -> Option<&dyn SnapshotRemoval> {
        self.snapshots.then_some(self as &dyn SnapshotRemoval)
    }
}

#[async_trait]
impl IdentityLookup for FakeProvider {
    /// `token_<who>_...` belongs to `<who>@example.com`.
    async fn user_email(&self, token: &SecretString) -> Option<String> {
        let who = token.expose_secret().split('_').nth(1)?;
        Some(format!("{who}@example.com"))
    }
}

#[async_trait]
impl AuthCapture for FakeProvider {
    async fn capture(&self, profile: &str) -> orbit_providers::Result<bool> {
        Ok(self.with(|s| {
            if let Some((_, path)) = s.block_path_on_capture.as_ref().filter(|(p, _)| p == profile) {
                let _ = std::fs::remove_file(path);
                std::fs::create_dir_all(path).unwrap();
            }
            match s.live.clone() {
                Some(live) => {
                    s.snapshots.insert(profile.to_string(), live);
                    true
                }
                None => false,
            }
        }))
    }
}

#[async_trait]
impl AuthRestore for FakeProvider {
    async fn restore(&self, profile: &str) -> orbit_providers::Result<bool> {
        self.with(|s| {
            if s.failing_restores.contains(profile) {
                s.live = Some("half-written".to_string());
                return Err(ProviderError::config("restore failed"));
            }
            match s.snapshots.get(profile).cloned() {
                Some(snapshot) => {
                    s.live = Some(snapshot);
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }
}

#[async_trait]
impl AuthValidation for FakeProvider {
    async fn validate_active_auth(&self) -> orbit_providers::Result<bool> {
        Ok(self.with(|s| s.live.as_ref().is_some_and(|live| !s.invalid.contains(live))))
    }
}

#[async_trait]
impl AuthSeeding for FakeProvider {
    async fn seed_from_token(&self, token: &SecretString) -> orbit_providers::Result<bool> {
        self.set_live(token.expose_secret());
        Ok(true)
    }
}

#[async_trait]
impl SnapshotRemoval for FakeProvider {
    async fn remove_snapshot(&self, profile: &str) -> orbit_providers::Result<()> {
        if self.with(|s| s.failing_removals.contains(profile)) {
            return Err(ProviderError::config("snapshot removal failed"));
        }
        self.drop_snapshot(profile);
        Ok(())
    }
}

/// What the runner saw when asked to spawn.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub env_removed: Vec<String>,
    pub live_at_spawn: Option<String>,
}

#[derive(Default)]
struct RunnerState {
    calls: Vec<RecordedCall>,
    exit_code: i32,
    fail: bool,
}

/// Records invocations along with the fake provider's live auth at spawn.
pub struct RecordingRunner {
    live: Arc<Mutex<FakeState>>,
    state: Mutex<RunnerState>,
}

impl RecordingRunner {
    pub fn observing(live: Arc<Mutex<FakeState>>) -> Self {
        Self {
            live,
            state: Mutex::default(),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn exit_with(&self, code: i32) {
        self.state.lock().unwrap().exit_code = code;
    }

    pub fn fail_spawn(&self) {
        self.state.lock().unwrap().fail = true;
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, invocation: &Invocation) -> std::io::Result<i32> {
        let live_at_spawn = self.live.lock().unwrap().live.clone();
        let mut state = self.state.lock().unwrap();
        if state.fail {
            return Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no such program"));
        }
        state.calls.push(RecordedCall {
            program: invocation.program.clone(),
            args: invocation.args.clone(),
            env: invocation
                .env
                .iter()
                .map(|(k, v)| (k.clone(), v.expose_secret().to_string()))
                .collect(),
            env_removed: invocation.env_remove.clone(),
            live_at_spawn,
        });
        Ok(state.exit_code)
    }
}

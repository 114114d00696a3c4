//! End-to-end profile flows against the Vercel provider and a fake CLI.
//!
//! These run real processes and touch only the sandbox directories.

#![cfg(unix)]

use std::fs;

use orbit_core::SecretString;
use orbit_integration_tests::{Sandbox, TOKEN_A, TOKEN_B};
use orbit_switch::{AuthCheck, ExecMode, SwitchError, TokenOrigin};

/// `alpha` and `bravo` added from live logins, `alpha` active.
async fn two_accounts(sandbox: &Sandbox) {
    let provider = sandbox.provider();
    let orbit = sandbox.orchestrator();

    for (profile, token) in [("alpha", TOKEN_A), ("bravo", TOKEN_B)] {
        sandbox.login_as(token);
        let outcome = orbit
            .add_profile(&provider, profile, &SecretString::from(token), TokenOrigin::LiveAuth)
            .await
            .unwrap();
        assert!(outcome.captured);
        assert!(outcome.email.is_none());
    }
    orbit.switch_to(&provider, "alpha").await.unwrap();
}

#[tokio::test]
async fn test_switch_moves_live_auth_and_pointer() {
    let sandbox = Sandbox::new();
    two_accounts(&sandbox).await;
    let orbit = sandbox.orchestrator();

    let outcome = orbit.switch_to(&sandbox.provider(), "bravo").await.unwrap();

    assert_eq!(outcome.auth, AuthCheck::Passed);
    assert_eq!(sandbox.live_token().as_deref(), Some(TOKEN_B));
    assert_eq!(orbit.registry().get_current("vercel").unwrap().as_deref(), Some("bravo"));
}

#[tokio::test]
async fn test_switch_without_snapshot_is_a_noop() {
    let sandbox = Sandbox::new();
    two_accounts(&sandbox).await;
    let orbit = sandbox.orchestrator();
    let provider = sandbox.provider();
    orbit
        .add_profile(&provider, "typed", &SecretString::from(TOKEN_B), TokenOrigin::Supplied)
        .await
        .unwrap();
    let registry_before = fs::read(orbit.registry().path()).unwrap();
    let live_before = fs::read(&sandbox.auth_path).unwrap();

    let err = orbit.switch_to(&provider, "typed").await.unwrap_err();

    assert!(matches!(err, SwitchError::SnapshotMissing { .. }));
    assert_eq!(fs::read(orbit.registry().path()).unwrap(), registry_before);
    assert_eq!(fs::read(&sandbox.auth_path).unwrap(), live_before);
}

#[tokio::test]
async fn test_expired_snapshot_is_reseeded_from_vault() {
    let sandbox = Sandbox::new();
    two_accounts(&sandbox).await;
    let orbit = sandbox.orchestrator();
    fs::write(sandbox.snapshot_path("bravo"), r#"{"token":"expired-session"}"#).unwrap();

    let outcome = orbit.switch_to(&sandbox.provider(), "bravo").await.unwrap();

    assert_eq!(outcome.auth, AuthCheck::Recovered);
    assert_eq!(sandbox.live_token().as_deref(), Some(TOKEN_B));
    assert_eq!(
        orbit_integration_tests::read_auth(&sandbox.snapshot_path("bravo")).as_deref(),
        Some(TOKEN_B)
    );
}

#[tokio::test]
async fn test_unrecoverable_switch_rolls_back() {
    let sandbox = Sandbox::new();
    two_accounts(&sandbox).await;
    let orbit = sandbox.orchestrator();
    let provider = sandbox.provider();

    // Stale snapshot and a stored token that also fails validation.
    let expired = "tok_expired_abcdefghijklmnopqrstuvwxyz";
    orbit.vault().store("vercel", "bravo", expired).unwrap();
    fs::write(sandbox.snapshot_path("bravo"), r#"{"token":"expired-session"}"#).unwrap();

    let err = orbit.switch_to(&provider, "bravo").await.unwrap_err();

    assert!(matches!(err, SwitchError::AuthInvalidAfterRestore { .. }));
    assert_eq!(orbit.registry().get_current("vercel").unwrap().as_deref(), Some("alpha"));
    assert_eq!(sandbox.live_token().as_deref(), Some(TOKEN_A));
}

#[tokio::test]
async fn test_run_as_restores_previous_account() {
    let sandbox = Sandbox::new();
    two_accounts(&sandbox).await;
    let orbit = sandbox.orchestrator();

    let outcome = orbit
        .run_as(&sandbox.provider(), "bravo", vec!["fail".into(), "4".into()])
        .await
        .unwrap();

    assert_eq!(outcome.exit_code, 4);
    assert_eq!(outcome.mode, ExecMode::Native);
    let calls = sandbox.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].contains(TOKEN_B), "{}", calls[0]);
    assert!(calls[0].contains("env=-"), "{}", calls[0]);
    assert_eq!(sandbox.live_token().as_deref(), Some(TOKEN_A));
    assert_eq!(orbit.registry().get_current("vercel").unwrap().as_deref(), Some("alpha"));
}

#[tokio::test]
async fn test_exec_falls_back_to_env_injection() {
    let sandbox = Sandbox::new();
    two_accounts(&sandbox).await;
    let orbit = sandbox.orchestrator();
    fs::remove_file(sandbox.snapshot_path("alpha")).unwrap();

    let outcome = orbit
        .exec_current(&sandbox.provider(), vec!["deploy".into()])
        .await
        .unwrap();

    assert_eq!(outcome.mode, ExecMode::EnvInjection);
    assert!(sandbox.calls()[0].starts_with(&format!("args=deploy|env={TOKEN_A}|")));
}

#[tokio::test]
async fn test_remove_deletes_snapshot_token_and_record() {
    let sandbox = Sandbox::new();
    two_accounts(&sandbox).await;
    let orbit = sandbox.orchestrator();

    let outcome = orbit.remove_profile(&sandbox.provider(), "alpha").await.unwrap();

    assert!(outcome.was_current);
    assert!(!sandbox.snapshot_path("alpha").exists());
    assert!(orbit.vault().get("vercel", "alpha").unwrap().is_none());
    assert_eq!(orbit.vault().keys().unwrap(), vec!["vercel:bravo"]);
    let registry = orbit.registry().load().unwrap();
    assert_eq!(registry.entry("vercel").unwrap().profiles, vec!["bravo"]);
    assert_eq!(registry.current("vercel"), None);
}

#[tokio::test]
async fn test_rotation_keeps_switching_working() {
    let sandbox = Sandbox::new();
    two_accounts(&sandbox).await;
    let orbit = sandbox.orchestrator();
    fs::write(sandbox.snapshot_path("bravo"), r#"{"token":"expired-session"}"#).unwrap();

    assert_eq!(orbit.rotate_key().unwrap().entries, 2);
    let outcome = orbit.switch_to(&sandbox.provider(), "bravo").await.unwrap();

    assert_eq!(outcome.auth, AuthCheck::Recovered);
    assert_eq!(sandbox.live_token().as_deref(), Some(TOKEN_B));
}

//! Temporary occupation of a provider's live auth slot.
//!
//! [`LiveSwap::acquire`] parks the previous profile's live auth in its
//! snapshot and restores the target's. [`LiveSwap::release`] puts the
//! previous profile back. Callers must release on every path; dropping an
//! unreleased swap only logs, since restoring is async.

use orbit_providers::Provider;
use tracing::{debug, warn};

use crate::error::Result;

/// A swap of live auth to `target`, to be undone with [`LiveSwap::release`].
pub struct LiveSwap<'a> {
    provider: &'a dyn Provider,
    previous: Option<String>,
    target: String,
    swapped: bool,
    released: bool,
}

impl<'a> LiveSwap<'a> {
    /// Swap live auth to `target`.
    ///
    /// `swapped()` is false when the provider cannot restore snapshots or
    /// `target` has none; live auth is then untouched. If the restore itself
    /// fails, the previous profile is put back before the error is returned.
    pub async fn acquire(
        provider: &'a dyn Provider,
        previous: Option<String>,
        target: &str,
    ) -> Result<LiveSwap<'a>> {
        let mut swap = LiveSwap {
            provider,
            previous: previous.filter(|p| p != target),
            target: target.to_string(),
            swapped: false,
            released: false,
        };

        let Some(restore) = provider.auth_restore() else {
            swap.released = true;
            return Ok(swap);
        };

        if let (Some(previous), Some(capture)) = (&swap.previous, provider.auth_capture()) {
            if let Err(e) = capture.capture(previous).await {
                warn!(provider = provider.name(), profile = %previous, "could not save live auth before swapping: {e}");
            }
        }

        match restore.restore(target).await {
            Ok(swapped) => {
                swap.swapped = swapped;
                swap.released = !swapped;
                debug!(provider = provider.name(), profile = target, swapped, "live auth swap");
                Ok(swap)
            }
            Err(e) => {
                // A failed restore may have touched live auth.
                swap.swapped = true;
                swap.release().await;
                Err(e.into())
            }
        }
    }

    /// Whether live auth now belongs to the target.
    pub fn swapped(&self) -> bool {
        self.swapped
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Restore the previous profile if a swap happened. Best effort.
    pub async fn release(mut self) {
        self.released = true;
        if !self.swapped {
            return;
        }
        let (Some(previous), Some(restore)) = (&self.previous, self.provider.auth_restore()) else {
            return;
        };

        match restore.restore(previous).await {
            Ok(true) => debug!(provider = self.provider.name(), profile = %previous, "live auth restored"),
            Ok(false) => warn!(
                provider = self.provider.name(),
                profile = %previous,
                "no snapshot to restore; live auth still belongs to {}",
                self.target
            ),
            Err(e) => warn!(
                provider = self.provider.name(),
                profile = %previous,
                "could not restore live auth: {e}"
            ),
        }
    }
}

impl Drop for LiveSwap<'_> {
    fn drop(&mut self) {
        if !self.released {
            warn!(
                provider = self.provider.name(),
                profile = %self.target,
                "live auth swap dropped without release"
            );
        }
    }
}

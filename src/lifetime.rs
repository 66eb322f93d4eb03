// src/lifetime.rs
//! Cancellation scope of a view. Work started for a view is abandoned when
//! the view goes away, so a late response can never update it.

use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct Lifetime {
    token: CancellationToken,
}

impl Lifetime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scope that ends with this one but can also be ended on its own
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Run `fut` unless the lifetime ends first. A future that is already
    /// complete wins over a pending cancellation.
    pub async fn run<F>(&self, fut: F) -> Option<F::Output>
    where
        F: Future,
    {
        tokio::select! {
            biased;
            output = fut => Some(output),
            _ = self.token.cancelled() => {
                debug!("Lifetime ended; dropping in-flight request");
                None
            }
        }
    }

    /// Guard that ends this lifetime when dropped
    pub fn drop_guard(&self) -> LifetimeGuard {
        LifetimeGuard {
            token: self.token.clone(),
        }
    }
}

/// Ends the owning lifetime on drop
#[derive(Debug)]
pub struct LifetimeGuard {
    token: CancellationToken,
}

impl Drop for LifetimeGuard {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

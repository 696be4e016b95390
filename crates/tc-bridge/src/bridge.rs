//! Bridge state shared by every request task.
//!
//! The bridge moves `Uninitialized -> Ready` on the first request it admits
//! and `Ready -> Terminated` on `shutdown`. It owns the provider, the backend
//! handle later operations run against, and the cancellation token handed to
//! every lifecycle call. No resource state is kept here.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tc_provider::{Backend, MemoryBackend, Provider, ProviderConfig, ProviderContext};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::BridgeConfig;
use crate::error::{BridgeError, BridgeResult};

/// Lifecycle of the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// No request handled yet.
    Uninitialized,
    /// Serving requests.
    Ready,
    /// Shut down; every request is refused.
    Terminated,
}

impl fmt::Display for BridgeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Ready => "ready",
            Self::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// State shared between request tasks.
pub struct Bridge {
    provider: Provider,
    state: RwLock<BridgeState>,
    backend: RwLock<Arc<dyn Backend>>,
    cancel: RwLock<CancellationToken>,
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("provider", &self.provider.metadata().name)
            .field("state", &*self.state.read())
            .field("backend", &self.backend.read().name())
            .finish_non_exhaustive()
    }
}

impl Bridge {
    /// Create a bridge serving `provider` against `backend`.
    #[must_use]
    pub fn new(provider: Provider, backend: Arc<dyn Backend>) -> Self {
        Self {
            provider,
            state: RwLock::new(BridgeState::Uninitialized),
            backend: RwLock::new(backend),
            cancel: RwLock::new(CancellationToken::new()),
        }
    }

    /// Create a bridge with an in-memory backend.
    #[must_use]
    pub fn in_memory(provider: Provider) -> Self {
        Self::new(provider, Arc::new(MemoryBackend::new()))
    }

    /// Create a bridge for `provider`, opening the backend `config` selects.
    pub async fn open(provider: Provider, config: &BridgeConfig) -> BridgeResult<Self> {
        let backend = ProviderConfig {
            state_dir: config.state_dir.clone(),
        }
        .open_backend()
        .await?;
        Ok(Self::new(provider, backend))
    }

    /// The provider being served.
    pub const fn provider(&self) -> &Provider {
        &self.provider
    }

    /// Current state.
    pub fn state(&self) -> BridgeState {
        *self.state.read()
    }

    /// Admit a request, moving to `Ready` on the first one.
    ///
    /// Fails with `Unavailable` once the bridge is terminated.
    pub fn admit(&self) -> BridgeResult<()> {
        let mut state = self.state.write();
        match *state {
            BridgeState::Terminated => {
                Err(BridgeError::Unavailable("bridge has shut down".to_string()))
            }
            BridgeState::Uninitialized => {
                *state = BridgeState::Ready;
                info!(backend = self.backend.read().name(), "bridge ready");
                Ok(())
            }
            BridgeState::Ready => Ok(()),
        }
    }

    /// The token the next `cancel` will trigger.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.read().clone()
    }

    /// Context for one lifecycle call against the current backend, bound to
    /// a token captured earlier, typically when the request was read.
    pub fn context_with(&self, cancel: CancellationToken) -> ProviderContext {
        let backend = Arc::clone(&*self.backend.read());
        ProviderContext::new(backend).with_cancel(cancel)
    }

    /// Replace the backend used by later operations.
    pub fn set_backend(&self, backend: Arc<dyn Backend>) {
        info!(backend = backend.name(), "backend replaced");
        *self.backend.write() = backend;
    }

    /// Cancel every in-flight operation. Later operations get a fresh token.
    pub fn cancel_all(&self) {
        let previous = std::mem::replace(&mut *self.cancel.write(), CancellationToken::new());
        previous.cancel();
        info!("in-flight operations cancelled");
    }

    /// Move to `Terminated`. In-flight operations run to completion.
    pub fn shutdown(&self) {
        let mut state = self.state.write();
        if *state != BridgeState::Terminated {
            info!(from = %*state, "bridge shutting down");
            *state = BridgeState::Terminated;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_request_moves_to_ready() {
        let bridge = Bridge::in_memory(Provider::teamcity());
        assert_eq!(bridge.state(), BridgeState::Uninitialized);

        bridge.admit().expect("admitted");
        assert_eq!(bridge.state(), BridgeState::Ready);
    }

    #[test]
    fn terminated_bridge_refuses_requests() {
        let bridge = Bridge::in_memory(Provider::teamcity());
        bridge.admit().expect("admitted");
        bridge.shutdown();

        let err = bridge.admit().expect_err("refused");
        assert!(matches!(err, BridgeError::Unavailable(_)));
        assert_eq!(bridge.state(), BridgeState::Terminated);
    }

    #[test]
    fn cancel_all_only_affects_existing_contexts() {
        let bridge = Bridge::in_memory(Provider::teamcity());
        let before = bridge.context_with(bridge.cancel_token());

        bridge.cancel_all();
        let after = bridge.context_with(bridge.cancel_token());

        assert!(before.is_cancelled());
        assert!(!after.is_cancelled());
    }

    #[test]
    fn captured_token_is_cancelled_with_the_rest() {
        let bridge = Bridge::in_memory(Provider::teamcity());
        let captured = bridge.cancel_token();

        bridge.cancel_all();

        assert!(captured.is_cancelled());
        assert!(bridge.context_with(captured).is_cancelled());
        assert!(!bridge.cancel_token().is_cancelled());
    }

    #[tokio::test]
    async fn open_uses_state_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = BridgeConfig::new().with_state_dir(dir.path());
        let bridge = Bridge::open(Provider::teamcity(), &config).await.expect("open");
        let ctx = bridge.context_with(bridge.cancel_token());
        assert_eq!(ctx.backend().name(), "file");
    }
}

//! Per-call provider context.

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::backend::{Backend, MemoryBackend};
use crate::error::{ProviderError, ProviderResult};

/// Everything a lifecycle call needs beyond its own arguments: the backend
/// client and the cancellation signal of the request it serves.
#[derive(Debug, Clone)]
pub struct ProviderContext {
    backend: Arc<dyn Backend>,
    cancel: CancellationToken,
}

impl ProviderContext {
    /// Creates a context around a backend with a fresh cancellation token.
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            cancel: CancellationToken::new(),
        }
    }

    /// Creates a context over a fresh in-memory backend.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Replaces the cancellation token.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The backend client.
    #[must_use]
    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// The cancellation token.
    #[must_use]
    pub const fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Returns true once cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Runs `fut` unless the context is cancelled first.
    ///
    /// Cancellation is best-effort: dropping `fut` abandons the wait, but a
    /// backend call already in flight may still complete on the remote side.
    pub async fn guard<T, F>(&self, operation: &'static str, fut: F) -> ProviderResult<T>
    where
        F: Future<Output = T>,
    {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(ProviderError::Cancelled { operation }),
            out = fut => Ok(out),
        }
    }
}

//! Closing signal handed out by holds

use tokio_util::sync::CancellationToken;

/// Fires when the gate that granted a hold starts closing.
///
/// Obtained from [`Hold::closing_signal`](crate::Hold::closing_signal).
/// Long-running holders watch it and release early so the close can
/// finish:
///
/// ```text
/// tokio::select! {
///     result = work() => result,
///     () = hold.closing_signal().closed() => Err(Shutdown),
/// }
/// ```
///
/// A signal taken from an already released hold is fired from the start.
#[derive(Debug, Clone)]
pub struct Closing {
    token: Option<CancellationToken>,
}

impl Closing {
    pub(crate) fn watching(token: CancellationToken) -> Self {
        Self { token: Some(token) }
    }

    pub(crate) fn fired() -> Self {
        Self { token: None }
    }

    /// Whether the close has started
    #[must_use]
    pub fn is_closing(&self) -> bool {
        self.token
            .as_ref()
            .is_none_or(CancellationToken::is_cancelled)
    }

    /// Resolves once the close has started
    pub async fn closed(&self) {
        if let Some(token) = &self.token {
            token.cancelled().await;
        }
    }

    /// Block the current thread until the close has started
    pub fn wait(&self) {
        if !self.is_closing() {
            futures::executor::block_on(self.closed());
        }
    }

    /// Underlying token, `None` when taken from a released hold
    #[must_use]
    pub fn token(&self) -> Option<&CancellationToken> {
        self.token.as_ref()
    }
}

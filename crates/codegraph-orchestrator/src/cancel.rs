//! Cancellation (spec §5): a cooperative flag checked between files and
//! between batches, plus a hard SIGINT escalation path to immediate abort.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Spawns a task that sets this token on the first Ctrl-C and force-exits
    /// the process on a second one, matching the spec's "cooperative cancel,
    /// forced abort" split. Only meaningful inside a tokio runtime; the
    /// orchestrator's bin entry point owns the runtime this runs in.
    pub fn watch_sigint(&self) {
        let token = self.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("received interrupt, requesting cooperative cancellation");
                token.cancel();
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::error!("received second interrupt, aborting immediately");
                    std::process::exit(130);
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_uncancelled() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn cancel_is_visible_across_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }
}

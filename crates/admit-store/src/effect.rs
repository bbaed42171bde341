//! Fire-and-forget side effects.
//!
//! A secondary effect (cleanup after acceptance, watermarking) is spawned
//! after its primary operation has committed. Its failure is logged and
//! turned into an [`EffectWarning`]; it never reaches the primary caller as
//! an error. Dropping the [`BackgroundEffect`] detaches the task, it keeps
//! running to completion.

use std::fmt;
use std::future::Future;

use admit_model::{ErrorKind, Notification};
use tokio::task::JoinHandle;

use crate::error::GatewayError;

/// A failed best-effort effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectWarning {
    /// What the effect was trying to do.
    pub effect: &'static str,
    /// The backend's message, verbatim.
    pub message: String,
}

impl EffectWarning {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::BestEffort
    }

    pub fn notification(&self) -> Notification {
        Notification::new(
            ErrorKind::BestEffort,
            "Background task did not finish",
            format!("Could not {}: {}", self.effect, self.message),
        )
    }
}

impl fmt::Display for EffectWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.effect, self.message)
    }
}

/// Handle to a spawned best-effort effect.
#[derive(Debug)]
#[must_use = "drop the handle to detach the effect, or await `settled` to observe it"]
pub struct BackgroundEffect {
    effect: &'static str,
    handle: JoinHandle<Option<EffectWarning>>,
}

impl BackgroundEffect {
    /// Spawn `work` on the runtime. Must be called from within a tokio runtime.
    pub fn spawn<F>(effect: &'static str, work: F) -> Self
    where
        F: Future<Output = Result<(), GatewayError>> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            match work.await {
                Ok(()) => None,
                Err(e) => {
                    tracing::warn!(effect, error = %e, "best-effort effect failed");
                    Some(EffectWarning {
                        effect,
                        message: e.to_string(),
                    })
                }
            }
        });
        Self { effect, handle }
    }

    pub fn effect(&self) -> &'static str {
        self.effect
    }

    /// Wait for the effect to finish and report a warning if it failed.
    pub async fn settled(self) -> Option<EffectWarning> {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(effect = self.effect, error = %e, "best-effort effect aborted");
                Some(EffectWarning {
                    effect: self.effect,
                    message: e.to_string(),
                })
            }
        }
    }

    /// Let the effect run unobserved.
    pub fn detach(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Operation, Table};

    #[tokio::test]
    async fn test_success_settles_without_warning() {
        let effect = BackgroundEffect::spawn("do nothing", async { Ok(()) });
        assert_eq!(effect.settled().await, None);
    }

    #[tokio::test]
    async fn test_failure_becomes_warning() {
        let effect = BackgroundEffect::spawn("delete rows", async {
            Err(GatewayError::backend(
                Operation::Delete,
                Table::Applications,
                "timeout",
            ))
        });
        let warning = effect.settled().await.expect("warning");
        assert_eq!(warning.message, "timeout");
        assert_eq!(warning.kind(), ErrorKind::BestEffort);
        assert_eq!(warning.to_string(), "delete rows failed: timeout");
    }
}

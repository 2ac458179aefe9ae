//! Session mode machine.
//!
//! Wraps [`SessionMode`] transitions behind validation and publishes the
//! current mode over a `watch` channel so the voice dispatcher observes
//! every change. Invalid transitions fail and leave the mode untouched.

use tokio::sync::watch;
use tracing::debug;

use summit_core::{Result, SessionMode, SummitError};

#[derive(Debug)]
pub struct ModeMachine {
    tx: watch::Sender<SessionMode>,
}

impl Default for ModeMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ModeMachine {
    /// Create a new machine in `Unselected`.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionMode::Unselected);
        Self { tx }
    }

    pub fn current(&self) -> SessionMode {
        *self.tx.borrow()
    }

    /// A receiver observing every mode change.
    pub fn watch(&self) -> watch::Receiver<SessionMode> {
        self.tx.subscribe()
    }

    /// Attempt to transition to `target`.
    pub fn transition(&self, target: SessionMode) -> Result<()> {
        let current = self.current();
        if current.can_transition_to(&target) {
            debug!("Session mode: {} -> {}", current, target);
            self.tx.send_replace(target);
            Ok(())
        } else {
            Err(SummitError::Session(format!(
                "invalid transition: {} -> {}",
                current, target
            )))
        }
    }
}

//! The supervised recognition loop.
//!
//! The dispatcher owns a recognizer and watches the session mode. It runs
//! segments only while the mode is `Listening`, restarts after each segment
//! that ends on its own, stops the recognizer the moment the mode leaves
//! `Listening` (pause, not ignore), and halts permanently on `Idle`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use summit_core::SessionMode;

use crate::command::{CommandClassifier, VoiceCommand};
use crate::recognizer::SpeechRecognizer;

/// Backoff before retrying a segment that failed to start.
const SEGMENT_RETRY_DELAY: Duration = Duration::from_millis(250);

/// What the dispatcher reports to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceEvent {
    Command(VoiceCommand),
    /// Transient recognizer failure; surfaced as status text, the loop
    /// keeps running.
    RecognitionError(String),
}

pub struct VoiceDispatcher {
    recognizer: Arc<dyn SpeechRecognizer>,
    classifier: CommandClassifier,
    mode: watch::Receiver<SessionMode>,
    events: mpsc::Sender<VoiceEvent>,
}

impl VoiceDispatcher {
    pub fn new(
        recognizer: Arc<dyn SpeechRecognizer>,
        classifier: CommandClassifier,
        mode: watch::Receiver<SessionMode>,
        events: mpsc::Sender<VoiceEvent>,
    ) -> Self {
        Self {
            recognizer,
            classifier,
            mode,
            events,
        }
    }

    /// Drive the recognition loop until the session idles or the event
    /// receiver is dropped.
    pub async fn run(mut self) {
        info!(locale = %self.recognizer.locale(), "Voice dispatcher started");
        loop {
            let current = *self.mode.borrow_and_update();
            match current {
                SessionMode::Listening => {
                    if let Err(e) = self.recognizer.start_segment().await {
                        warn!(error = %e, "Recognizer segment failed to start");
                        if self
                            .events
                            .send(VoiceEvent::RecognitionError(e.to_string()))
                            .await
                            .is_err()
                        {
                            break;
                        }
                        tokio::time::sleep(SEGMENT_RETRY_DELAY).await;
                        continue;
                    }
                    if self.pump_segment().await.is_err() {
                        break;
                    }
                }
                SessionMode::Idle => {
                    self.recognizer.stop().await;
                    break;
                }
                _ => {
                    // Paused, or no document open yet. Wait for a mode change.
                    if self.mode.changed().await.is_err() {
                        break;
                    }
                }
            }
        }
        info!("Voice dispatcher halted");
    }

    /// Pump one segment until it ends, the mode leaves `Listening`, or the
    /// session goes away. `Err(())` means the event channel is closed.
    async fn pump_segment(&mut self) -> Result<(), ()> {
        loop {
            tokio::select! {
                result = self.recognizer.next_utterance() => match result {
                    Ok(Some(transcript)) => {
                        let transcript = transcript.trim();
                        if transcript.is_empty() {
                            continue;
                        }
                        // Edit-mode flag read at classification time, so an
                        // utterance finalized during the transition into
                        // writing still dictates instead of dropping.
                        let editing = matches!(*self.mode.borrow(), SessionMode::Writing);
                        let command = self.classifier.classify(transcript, editing);
                        debug!(transcript = %transcript, command = ?command, "Utterance classified");
                        if self.events.send(VoiceEvent::Command(command)).await.is_err() {
                            return Err(());
                        }
                    }
                    Ok(None) => {
                        // Segment ended on its own; the supervisor restarts
                        // it while the session is still listening.
                        debug!("Recognition segment ended");
                        return Ok(());
                    }
                    Err(e) => {
                        warn!(error = %e, "Recognition error");
                        if self
                            .events
                            .send(VoiceEvent::RecognitionError(e.to_string()))
                            .await
                            .is_err()
                        {
                            return Err(());
                        }
                    }
                },
                changed = self.mode.changed() => {
                    let still_listening = changed.is_ok()
                        && matches!(*self.mode.borrow(), SessionMode::Listening);
                    if !still_listening {
                        self.recognizer.stop().await;
                        return if changed.is_ok() { Ok(()) } else { Err(()) };
                    }
                }
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

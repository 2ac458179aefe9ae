//! Summit voice crate - the voice command dispatcher.
//!
//! Wraps a continuous speech recognizer in a supervised loop: one
//! classification per finalized utterance, automatic restart when a segment
//! ends while the session is still listening, full pause whenever the mode
//! leaves `Listening`, permanent halt on `Idle`.

pub mod command;
pub mod dispatcher;
pub mod recognizer;

pub use command::{CommandClassifier, VoiceCommand};
pub use dispatcher::{VoiceDispatcher, VoiceEvent};
pub use recognizer::{MockRecognizer, ScriptItem, SpeechRecognizer};

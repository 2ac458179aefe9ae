//! Speech recognition capability.
//!
//! The recognizer is an opaque continuous-recognition provider bound to a
//! fixed locale. It delivers finalized utterances one at a time; a segment
//! can end on its own (`Ok(None)`), which is not a terminal stop. The
//! dispatcher decides whether to restart.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use summit_core::{Result, SummitError};

#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Begin a recognition segment.
    async fn start_segment(&self) -> Result<()>;

    /// Wait for the next finalized utterance of the current segment.
    ///
    /// `Ok(None)` means the segment ended on its own and a new one must be
    /// started to keep listening. Errors are transient and leave the
    /// segment usable.
    async fn next_utterance(&self) -> Result<Option<String>>;

    /// Stop recognition immediately.
    async fn stop(&self);

    /// The fixed locale this recognizer was created with.
    fn locale(&self) -> &str;
}

/// One scripted recognizer reaction, consumed in order.
#[derive(Debug, Clone)]
pub enum ScriptItem {
    Utterance(String),
    SegmentEnd,
    Error(String),
}

impl ScriptItem {
    pub fn utterance(text: &str) -> Self {
        ScriptItem::Utterance(text.to_string())
    }

    pub fn segment_end() -> Self {
        ScriptItem::SegmentEnd
    }

    pub fn error(message: &str) -> Self {
        ScriptItem::Error(message.to_string())
    }
}

/// Script-driven recognizer for tests.
///
/// Counts segment starts and stops so tests can assert the self-healing
/// and pause behavior. Once the script is exhausted, `next_utterance`
/// pends forever, like a recognizer waiting for speech.
#[derive(Debug, Default)]
pub struct MockRecognizer {
    script: Mutex<VecDeque<ScriptItem>>,
    starts: AtomicUsize,
    stops: AtomicUsize,
}

impl MockRecognizer {
    pub fn scripted(items: Vec<ScriptItem>) -> Self {
        Self {
            script: Mutex::new(items.into()),
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
        }
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::Relaxed)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SpeechRecognizer for MockRecognizer {
    async fn start_segment(&self) -> Result<()> {
        self.starts.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn next_utterance(&self) -> Result<Option<String>> {
        let item = self.script.lock().expect("script mutex poisoned").pop_front();
        match item {
            Some(ScriptItem::Utterance(text)) => Ok(Some(text)),
            Some(ScriptItem::SegmentEnd) => Ok(None),
            Some(ScriptItem::Error(message)) => Err(SummitError::Recognition(message)),
            None => {
                std::future::pending::<()>().await;
                unreachable!("pending future resolved")
            }
        }
    }

    async fn stop(&self) {
        self.stops.fetch_add(1, Ordering::Relaxed);
    }

    fn locale(&self) -> &str {
        "ko-KR"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_recognizer_plays_script_in_order() {
        let recognizer = MockRecognizer::scripted(vec![
            ScriptItem::utterance("first"),
            ScriptItem::segment_end(),
            ScriptItem::error("no-speech"),
        ]);

        recognizer.start_segment().await.unwrap();
        assert_eq!(
            recognizer.next_utterance().await.unwrap(),
            Some("first".to_string())
        );
        assert_eq!(recognizer.next_utterance().await.unwrap(), None);
        let err = recognizer.next_utterance().await.unwrap_err();
        assert!(matches!(err, SummitError::Recognition(_)));
        assert_eq!(recognizer.starts(), 1);
    }

    #[tokio::test]
    async fn test_mock_recognizer_pends_when_exhausted() {
        let recognizer = MockRecognizer::scripted(vec![]);
        let result = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            recognizer.next_utterance(),
        )
        .await;
        assert!(result.is_err(), "exhausted script should pend");
    }
}

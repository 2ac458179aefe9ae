//! Utterance classification.
//!
//! Each finalized transcript is classified into exactly one command by
//! substring matching against the designated phrases, first match wins.
//! Matching is case-sensitive except for the alternate stop token.

use summit_core::CommandPhrases;

/// Command derived from one finalized utterance. Derived transiently and
/// discarded after dispatch, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceCommand {
    /// Capture a photo, then return to the previous mode.
    TakePhoto,
    /// Enter edit mode.
    EnterEdit,
    /// Exit edit mode, persisting the edit buffer.
    ExitEdit,
    /// Persist and end the session.
    Stop,
    /// Append the transcript as dictated text (edit mode only).
    Dictate(String),
    /// No command matched outside edit mode; surfaced as status text only.
    Unrecognized(String),
}

/// Classifies transcripts against a fixed phrase set.
#[derive(Debug, Clone)]
pub struct CommandClassifier {
    phrases: CommandPhrases,
}

impl CommandClassifier {
    pub fn new(phrases: CommandPhrases) -> Self {
        Self { phrases }
    }

    /// Classify one finalized transcript.
    ///
    /// `editing` is the session's edit-mode flag at classification time;
    /// it only affects the fallthrough (rules 5 and 6), never the command
    /// phrases themselves.
    pub fn classify(&self, transcript: &str, editing: bool) -> VoiceCommand {
        let p = &self.phrases;
        if transcript.contains(&p.capture) {
            VoiceCommand::TakePhoto
        } else if transcript.contains(&p.enter_edit) {
            VoiceCommand::EnterEdit
        } else if transcript.contains(&p.exit_edit) {
            VoiceCommand::ExitEdit
        } else if transcript.contains(&p.stop)
            || transcript
                .to_lowercase()
                .contains(&p.stop_alt.to_lowercase())
        {
            VoiceCommand::Stop
        } else if editing {
            VoiceCommand::Dictate(transcript.to_string())
        } else {
            VoiceCommand::Unrecognized(transcript.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> CommandClassifier {
        CommandClassifier::new(CommandPhrases::default())
    }

    #[test]
    fn test_capture_phrase() {
        assert_eq!(
            classifier().classify("사진 찍어 줘", false),
            VoiceCommand::TakePhoto
        );
    }

    #[test]
    fn test_enter_and_exit_edit_phrases() {
        assert_eq!(
            classifier().classify("이제 글쓰기 시작", false),
            VoiceCommand::EnterEdit
        );
        assert_eq!(
            classifier().classify("글쓰기 끝", true),
            VoiceCommand::ExitEdit
        );
    }

    #[test]
    fn test_first_match_wins() {
        // Contains both the capture and enter-edit phrases; capture is rule 1.
        assert_eq!(
            classifier().classify("글쓰기 시작 전에 사진", false),
            VoiceCommand::TakePhoto
        );
    }

    #[test]
    fn test_stop_primary_token() {
        assert_eq!(classifier().classify("앱 종료", false), VoiceCommand::Stop);
        assert_eq!(classifier().classify("앱 종료", true), VoiceCommand::Stop);
    }

    #[test]
    fn test_stop_alt_token_case_insensitive() {
        assert_eq!(classifier().classify("STOP", false), VoiceCommand::Stop);
        assert_eq!(
            classifier().classify("please Stop now", true),
            VoiceCommand::Stop
        );
    }

    #[test]
    fn test_dictation_only_while_editing() {
        assert_eq!(
            classifier().classify("오늘은 날씨가 좋았다", true),
            VoiceCommand::Dictate("오늘은 날씨가 좋았다".to_string())
        );
        assert_eq!(
            classifier().classify("오늘은 날씨가 좋았다", false),
            VoiceCommand::Unrecognized("오늘은 날씨가 좋았다".to_string())
        );
    }

    #[test]
    fn test_stop_beats_dictation_while_editing() {
        assert_eq!(
            classifier().classify("이제 종료 할게", true),
            VoiceCommand::Stop
        );
    }
}

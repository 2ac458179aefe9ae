//! Core data model shared across the Summit crates.
//!
//! Holds the open document and its edit buffer, the session mode enum with
//! its transition rules, folder entry records, asset references, and
//! geographic coordinates for capture tagging.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of a folder entry. Only plain files are listed; subfolders never
/// appear in the working set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    File,
}

/// A single enumerable entry of the selected folder.
///
/// Immutable once listed; the working set is re-enumerated only when a new
/// folder is selected or `list_entries` is called again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl FileEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
        }
    }
}

/// Behavioral state of a session.
///
/// The dispatcher is active if and only if the mode is `Listening`; it is
/// fully paused during `Writing` and `CapturingPhoto` and halted permanently
/// once the mode reaches `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// No folder selected yet.
    Unselected,
    /// A folder is selected; no document open.
    FolderSelected,
    /// A document is open and the voice dispatcher is running.
    Listening,
    /// Edit mode: the document snapshot lives in the edit buffer.
    Writing,
    /// A photo capture is in flight; returns to the pre-capture mode.
    CapturingPhoto,
    /// Terminal for the session; only re-opening a document leaves it.
    Idle,
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionMode::Unselected => "unselected",
            SessionMode::FolderSelected => "folder-selected",
            SessionMode::Listening => "listening",
            SessionMode::Writing => "writing",
            SessionMode::CapturingPhoto => "capturing-photo",
            SessionMode::Idle => "idle",
        };
        write!(f, "{}", name)
    }
}

impl SessionMode {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &SessionMode) -> bool {
        matches!(
            (self, target),
            (SessionMode::Unselected, SessionMode::FolderSelected)
                | (SessionMode::FolderSelected, SessionMode::Listening)
                | (SessionMode::Listening, SessionMode::Writing)
                | (SessionMode::Writing, SessionMode::Listening)
                | (SessionMode::Listening, SessionMode::CapturingPhoto)
                | (SessionMode::Writing, SessionMode::CapturingPhoto)
                | (SessionMode::CapturingPhoto, SessionMode::Listening)
                | (SessionMode::CapturingPhoto, SessionMode::Writing)
                | (SessionMode::Listening, SessionMode::Idle)
                | (SessionMode::Writing, SessionMode::Idle)
                // Re-opening a document is the only way back from idle.
                | (SessionMode::Idle, SessionMode::Listening)
        )
    }
}

/// Appends `line` to `text` on its own line.
///
/// A separating newline is added when the existing text is non-empty and not
/// already newline-terminated, and the appended line is always terminated.
pub fn append_line(text: &mut String, line: &str) {
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
    text.push_str(line);
    text.push('\n');
}

/// Largest valid char boundary at or below `index`.
fn floor_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    let mut index = index;
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Mutable snapshot of the document text while the session is in edit mode.
///
/// The cursor is a byte offset into `text`, clamped to a `char` boundary so
/// that multi-byte content (the command phrases are Korean) can never split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditBuffer {
    text: String,
    cursor: usize,
}

impl EditBuffer {
    /// Snapshot `text` with the cursor at the end.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.len();
        Self { text, cursor }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Replace the whole buffer, e.g. after a manual edit, keeping the
    /// caller's cursor position (clamped).
    pub fn set_text(&mut self, text: impl Into<String>, cursor: usize) {
        self.text = text.into();
        self.cursor = floor_char_boundary(&self.text, cursor);
    }

    pub fn set_cursor(&mut self, cursor: usize) {
        self.cursor = floor_char_boundary(&self.text, cursor);
    }

    /// Append a dictated utterance on its own line and move the cursor to
    /// the end of the buffer.
    pub fn append_line(&mut self, line: &str) {
        append_line(&mut self.text, line);
        self.cursor = self.text.len();
    }

    /// Insert `snippet` at the cursor, normalizing newlines on both sides so
    /// the snippet lands on its own line. The cursor ends just after the
    /// inserted text.
    pub fn insert_at_cursor(&mut self, snippet: &str) {
        let mut before = self.text[..self.cursor].to_string();
        let after = &self.text[self.cursor..];

        if !before.is_empty() && !before.ends_with('\n') {
            before.push('\n');
        }
        let mut piece = snippet.to_string();
        if !after.is_empty() && !after.starts_with('\n') {
            piece.push('\n');
        }

        let cursor = before.len() + piece.len();
        let mut text = before;
        text.push_str(&piece);
        text.push_str(after);

        self.text = text;
        self.cursor = cursor;
    }
}

/// The single currently-open note.
///
/// Invariant: `edit_buffer` is `Some` exactly while the session is in edit
/// mode. Entering edit mode snapshots `raw_text` (a copy, never a view);
/// exiting commits the buffer back into `raw_text`.
#[derive(Debug, Clone)]
pub struct Document {
    pub name: String,
    pub raw_text: String,
    pub edit_buffer: Option<EditBuffer>,
}

impl Document {
    pub fn new(name: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            raw_text: raw_text.into(),
            edit_buffer: None,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.edit_buffer.is_some()
    }

    /// Snapshot the document text into a fresh edit buffer.
    pub fn begin_edit(&mut self) {
        self.edit_buffer = Some(EditBuffer::new(self.raw_text.clone()));
    }

    /// Commit the edit buffer back into the document text and clear it.
    ///
    /// Returns `false` when no edit was in progress.
    pub fn commit_edit(&mut self) -> bool {
        match self.edit_buffer.take() {
            Some(buffer) => {
                self.raw_text = buffer.text;
                true
            }
            None => false,
        }
    }

    /// Append `line` to the persisted document text on its own line.
    pub fn append_line(&mut self, line: &str) {
        append_line(&mut self.raw_text, line);
    }

    /// The text a renderer should show right now: the edit buffer while
    /// editing, the persisted text otherwise.
    pub fn current_text(&self) -> &str {
        match &self.edit_buffer {
            Some(buffer) => buffer.text(),
            None => &self.raw_text,
        }
    }
}

/// A Markdown image reference into the assets subfolder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetReference {
    path: String,
}

impl AssetReference {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Relative path under the selected folder, e.g. `img/20240101....jpg`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The Markdown image tag embedded into document text.
    pub fn tag(&self) -> String {
        format!("![]({})", self.path)
    }
}

/// Best-effort device coordinates attached to a captured photo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

// =============================================================================
// Tests
// =============================================================================

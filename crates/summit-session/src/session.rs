//! The session coordinator.
//!
//! Owns the document store, the open document, the asset resolver, and the
//! photo capture service, and routes every mutation through `&mut self` so
//! a single driving task serializes concurrent attempts. Each command
//! failure is converted to a short status string; nothing here crashes the
//! session.

use tokio::sync::mpsc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use summit_assets::{AssetResolver, RenderFn};
use summit_capture::PhotoCaptureService;
use summit_core::{AssetReference, Document, FileEntry, Result, SessionMode, SummitError};
use summit_store::{DocumentStore, FolderPicker};
use summit_voice::{VoiceCommand, VoiceEvent};

use crate::mode::ModeMachine;

pub struct Session {
    store: DocumentStore,
    capture: PhotoCaptureService,
    resolver: AssetResolver,
    modes: ModeMachine,
    document: Option<Document>,
    status: String,
}

impl Session {
    pub fn new(
        store: DocumentStore,
        capture: PhotoCaptureService,
        resolver: AssetResolver,
    ) -> Self {
        Self {
            store,
            capture,
            resolver,
            modes: ModeMachine::new(),
            document: None,
            status: String::new(),
        }
    }

    pub fn mode(&self) -> SessionMode {
        self.modes.current()
    }

    /// Mode receiver for the voice dispatcher.
    pub fn mode_watch(&self) -> watch::Receiver<SessionMode> {
        self.modes.watch()
    }

    /// The last user-facing status message.
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// The text a renderer should show right now.
    pub fn current_text(&self) -> &str {
        self.document
            .as_ref()
            .map(Document::current_text)
            .unwrap_or("")
    }

    /// Markdown entries of the selected folder, as enumerated at selection.
    pub fn entries(&self) -> &[FileEntry] {
        self.store.entries()
    }

    /// Prompt for a folder and enumerate its documents.
    ///
    /// On denial the mode stays `Unselected` so the caller can simply
    /// prompt again; nothing is retried automatically.
    pub async fn select_folder(&mut self, picker: &dyn FolderPicker) -> Result<Vec<FileEntry>> {
        if self.modes.current() != SessionMode::Unselected {
            return Err(SummitError::Session(
                "a folder is already selected".to_string(),
            ));
        }
        match self.store.select_folder(picker).await {
            Ok(entries) => {
                self.modes.transition(SessionMode::FolderSelected)?;
                self.status = "Select a document or create a new one.".to_string();
                Ok(entries)
            }
            Err(e) => {
                self.status = format!("Folder access denied: {}", e);
                Err(e)
            }
        }
    }

    /// Open an existing document and start listening.
    pub async fn open_document(&mut self, name: &str) -> Result<()> {
        self.ensure_mode(&[SessionMode::FolderSelected, SessionMode::Idle])?;
        let document = self.store.open(name).await?;
        let text = document.raw_text.clone();
        self.document = Some(document);
        self.resolver.rebuild(&self.store, &text).await;
        self.modes.transition(SessionMode::Listening)?;
        self.status = "Voice commands and buttons are available.".to_string();
        Ok(())
    }

    /// Create an empty document and start listening.
    ///
    /// Refuses to overwrite: an existing entry with the same name is a
    /// [`SummitError::NameConflict`].
    pub async fn create_document(&mut self, name: &str) -> Result<()> {
        self.ensure_mode(&[SessionMode::FolderSelected, SessionMode::Idle])?;
        let document = self.store.create_new(name).await?;
        self.document = Some(document);
        self.resolver.clear().await;
        self.modes.transition(SessionMode::Listening)?;
        self.status = "Voice commands and buttons are available.".to_string();
        Ok(())
    }

    /// Enter edit mode, snapshotting the document text into the edit buffer.
    /// The dispatcher pauses on the mode change.
    pub fn enter_edit(&mut self) -> Result<()> {
        if self.document.is_none() {
            return Err(SummitError::Store("no document open".to_string()));
        }
        self.modes.transition(SessionMode::Writing)?;
        if let Some(document) = self.document.as_mut() {
            document.begin_edit();
        }
        self.status =
            "Edit mode: the whole document is editable. Photos appear as ![](img/...) tags."
                .to_string();
        Ok(())
    }

    /// Exit edit mode: commit the buffer into the document text, persist,
    /// and resume listening.
    pub async fn exit_edit(&mut self) -> Result<()> {
        self.modes.transition(SessionMode::Listening)?;
        if let Some(document) = self.document.as_mut() {
            document.commit_edit();
        }
        if let Some(document) = &self.document {
            self.store.save(document).await?;
        }
        let text = self.current_text().to_string();
        self.resolver.rebuild(&self.store, &text).await;
        self.status = "Edit mode ended. Voice commands and buttons are available.".to_string();
        Ok(())
    }

    /// Append a dictated utterance to the edit buffer on its own line.
    ///
    /// A dictation arriving after edit mode already ended (the recognizer
    /// finalized it during the transition) is dropped, not misapplied.
    pub fn dictate(&mut self, transcript: &str) -> Result<()> {
        if self.modes.current() != SessionMode::Writing {
            debug!(transcript = %transcript, "Dictation outside edit mode dropped");
            return Ok(());
        }
        if let Some(buffer) = self
            .document
            .as_mut()
            .and_then(|d| d.edit_buffer.as_mut())
        {
            buffer.append_line(transcript);
            self.status = format!("Dictated: {}", transcript);
        }
        Ok(())
    }

    /// Replace the edit buffer after a manual edit.
    pub fn set_edit_text(&mut self, text: &str, cursor: usize) -> Result<()> {
        if self.modes.current() != SessionMode::Writing {
            return Err(SummitError::Session(
                "manual edits require edit mode".to_string(),
            ));
        }
        if let Some(buffer) = self
            .document
            .as_mut()
            .and_then(|d| d.edit_buffer.as_mut())
        {
            buffer.set_text(text, cursor);
        }
        Ok(())
    }

    /// Move the edit cursor.
    pub fn set_cursor(&mut self, cursor: usize) -> Result<()> {
        if self.modes.current() != SessionMode::Writing {
            return Err(SummitError::Session(
                "the cursor only exists in edit mode".to_string(),
            ));
        }
        if let Some(buffer) = self
            .document
            .as_mut()
            .and_then(|d| d.edit_buffer.as_mut())
        {
            buffer.set_cursor(cursor);
        }
        Ok(())
    }

    /// Capture a photo and embed its reference.
    ///
    /// The session sits in `CapturingPhoto` for the duration (pausing the
    /// dispatcher) and returns to the pre-capture mode on success and
    /// failure alike.
    pub async fn take_photo(&mut self) -> Result<()> {
        let previous = self.modes.current();
        if !matches!(previous, SessionMode::Listening | SessionMode::Writing) {
            return Err(SummitError::Session(
                "photo capture requires an open document".to_string(),
            ));
        }
        self.modes.transition(SessionMode::CapturingPhoto)?;
        self.status = "Capturing photo...".to_string();

        let outcome = match self.capture.capture_from_camera(&self.store).await {
            Ok(asset) => self.insert_asset_tag(&asset).await,
            Err(e) => Err(e),
        };

        self.modes.transition(previous)?;
        match outcome {
            Ok(()) => {
                self.status = "Photo saved and tag inserted.".to_string();
                Ok(())
            }
            Err(e) => {
                self.status = format!("Photo capture failed: {}", e);
                Err(e)
            }
        }
    }

    /// Store an uploaded blob and embed its reference.
    pub async fn upload_photo(&mut self, bytes: &[u8], original_name: &str) -> Result<()> {
        if !matches!(
            self.modes.current(),
            SessionMode::Listening | SessionMode::Writing
        ) {
            return Err(SummitError::Session(
                "photo upload requires an open document".to_string(),
            ));
        }
        match self
            .capture
            .capture_from_upload(&self.store, bytes, original_name)
            .await
        {
            Ok(asset) => {
                self.insert_asset_tag(&asset).await?;
                self.status = "Photo uploaded and tag inserted.".to_string();
                Ok(())
            }
            Err(e) => {
                self.status = format!("Photo upload failed: {}", e);
                Err(e)
            }
        }
    }

    /// Insertion policy shared by capture and upload: at the cursor while
    /// editing (durable on edit-mode exit), otherwise appended to the
    /// document text and persisted immediately.
    async fn insert_asset_tag(&mut self, asset: &AssetReference) -> Result<()> {
        let tag = asset.tag();
        let editing = match self.document.as_mut() {
            Some(document) => match document.edit_buffer.as_mut() {
                Some(buffer) => {
                    buffer.insert_at_cursor(&tag);
                    true
                }
                None => {
                    document.append_line(&tag);
                    false
                }
            },
            None => {
                return Err(SummitError::Store("no document open".to_string()));
            }
        };
        if !editing {
            if let Some(document) = &self.document {
                self.store.save(document).await?;
            }
        }
        let text = self.current_text().to_string();
        self.resolver.rebuild(&self.store, &text).await;
        Ok(())
    }

    /// Persist the latest in-memory text exactly once and end the session.
    ///
    /// A live edit buffer is folded in first; on a write failure the mode
    /// (and the buffer) stay as they were so stop can be retried.
    pub async fn stop(&mut self) -> Result<()> {
        if !matches!(
            self.modes.current(),
            SessionMode::Listening | SessionMode::Writing
        ) {
            return Err(SummitError::Session(
                "stop requires an open document".to_string(),
            ));
        }

        if let Some(document) = self.document.as_mut() {
            if let Some(buffer) = &document.edit_buffer {
                document.raw_text = buffer.text().to_string();
            }
        }
        if let Some(document) = &self.document {
            match self.store.save(document).await {
                Ok(()) => {}
                Err(e) => {
                    self.status = format!("Stop failed, document not saved: {}", e);
                    return Err(e);
                }
            }
        }
        if let Some(document) = self.document.as_mut() {
            document.commit_edit();
        }

        self.modes.transition(SessionMode::Idle)?;
        self.resolver.clear().await;
        info!("Session stopped");
        self.status = "Session stopped.".to_string();
        Ok(())
    }

    /// Render the current text with the external renderer and resolve
    /// embedded asset references.
    pub fn render(&self, render: &RenderFn) -> String {
        self.resolver.render(self.current_text(), render)
    }

    /// Map one dispatcher event onto the session, converting any failure
    /// into a status message.
    pub async fn handle_event(&mut self, event: VoiceEvent) {
        match event {
            VoiceEvent::Command(command) => self.handle_command(command).await,
            VoiceEvent::RecognitionError(message) => {
                self.status = message;
            }
        }
    }

    /// Dispatch one classified command.
    pub async fn handle_command(&mut self, command: VoiceCommand) {
        let result = match command {
            VoiceCommand::TakePhoto => self.take_photo().await,
            VoiceCommand::EnterEdit => self.enter_edit(),
            VoiceCommand::ExitEdit => self.exit_edit().await,
            VoiceCommand::Stop => self.stop().await,
            VoiceCommand::Dictate(transcript) => self.dictate(&transcript),
            VoiceCommand::Unrecognized(transcript) => {
                self.status = format!("Heard: {}", transcript);
                Ok(())
            }
        };
        if let Err(e) = result {
            warn!(error = %e, "Command failed");
            self.status = e.to_string();
        }
    }

    /// Drive the session from a dispatcher event stream until it idles or
    /// the stream ends.
    pub async fn run(&mut self, events: &mut mpsc::Receiver<VoiceEvent>) {
        while self.modes.current() != SessionMode::Idle {
            match events.recv().await {
                Some(event) => self.handle_event(event).await,
                None => break,
            }
        }
    }

    fn ensure_mode(&self, allowed: &[SessionMode]) -> Result<()> {
        let current = self.modes.current();
        if allowed.contains(&current) {
            Ok(())
        } else {
            Err(SummitError::Session(format!(
                "operation not allowed in mode '{}'",
                current
            )))
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

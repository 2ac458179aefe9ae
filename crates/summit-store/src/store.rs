//! The document store: sole path to persistence.
//!
//! Owns the selected folder for the session, enumerates Markdown entries,
//! and provides the read/create/save operations every mutation routes
//! through. Saves are atomic with respect to the rest of the process: a
//! full-content write lands in a temp file that is renamed over the target,
//! so no partial state is ever observable by a subsequent `open`.

use std::path::Path;

use tracing::{debug, info};

use summit_core::{Document, FileEntry, Result, SummitError};

use crate::picker::{FolderHandle, FolderPicker};

/// Subfolder holding binary assets, referenced as `img/<file>` in documents.
pub const ASSET_DIR: &str = "img";

/// Suffix documents are listed by.
const MARKDOWN_SUFFIX: &str = ".md";

/// Rejects names that could escape the folder or collide with temp files.
fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(SummitError::Store("empty file name".to_string()));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(SummitError::Store(format!(
            "file name must not contain path separators: '{}'",
            name
        )));
    }
    if name.starts_with('.') {
        return Err(SummitError::Store(format!(
            "file name must not start with '.': '{}'",
            name
        )));
    }
    Ok(())
}

/// Write `bytes` to `path` atomically: temp file in the same directory, then
/// rename over the target.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| SummitError::Write(format!("invalid path: {}", path.display())))?;
    let tmp = path.with_file_name(format!(".{}.tmp", file_name));

    tokio::fs::write(&tmp, bytes)
        .await
        .map_err(|e| SummitError::Write(format!("{}: {}", path.display(), e)))?;

    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(SummitError::Write(format!("{}: {}", path.display(), e)));
    }
    Ok(())
}

/// Owns the open folder and mediates every file-system touch.
#[derive(Debug, Default)]
pub struct DocumentStore {
    folder: Option<FolderHandle>,
    entries: Vec<FileEntry>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_folder(&self) -> bool {
        self.folder.is_some()
    }

    fn folder(&self) -> Result<&FolderHandle> {
        self.folder
            .as_ref()
            .ok_or_else(|| SummitError::Store("no folder selected".to_string()))
    }

    /// Prompt for a folder and enumerate its Markdown entries.
    ///
    /// On denial the handle is revoked (set to absent) and the error is
    /// returned for the caller to surface with a retry affordance.
    pub async fn select_folder(&mut self, picker: &dyn FolderPicker) -> Result<Vec<FileEntry>> {
        match picker.pick().await {
            Ok(handle) => {
                info!(folder = %handle.root().display(), "Folder selected");
                let entries = enumerate_markdown(handle.root()).await?;
                self.folder = Some(handle);
                self.entries = entries.clone();
                Ok(entries)
            }
            Err(e) => {
                self.folder = None;
                self.entries.clear();
                Err(e)
            }
        }
    }

    /// The working set enumerated when the folder was selected.
    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    /// Fresh, non-recursive enumeration of Markdown entries.
    pub async fn list_entries(&self) -> Result<Vec<FileEntry>> {
        enumerate_markdown(self.folder()?.root()).await
    }

    /// Read a document's full text content.
    pub async fn open(&self, name: &str) -> Result<Document> {
        validate_name(name)?;
        let path = self.folder()?.root().join(name);
        let raw_text = tokio::fs::read_to_string(&path).await?;
        info!(name = %name, bytes = raw_text.len(), "Document opened");
        Ok(Document::new(name, raw_text))
    }

    /// Create an empty document.
    ///
    /// Fails with [`SummitError::NameConflict`] when an entry with that name
    /// already exists; creation never overwrites.
    pub async fn create_new(&mut self, name: &str) -> Result<Document> {
        validate_name(name)?;
        if !name.ends_with(MARKDOWN_SUFFIX) {
            return Err(SummitError::Store(format!(
                "document name must end with '{}': '{}'",
                MARKDOWN_SUFFIX, name
            )));
        }

        let path = self.folder()?.root().join(name);
        if tokio::fs::try_exists(&path).await? {
            return Err(SummitError::NameConflict {
                name: name.to_string(),
            });
        }

        write_atomic(&path, b"").await?;
        self.entries.push(FileEntry::file(name));
        info!(name = %name, "Document created");
        Ok(Document::new(name, ""))
    }

    /// Persist the document's full text content atomically.
    pub async fn save(&self, document: &Document) -> Result<()> {
        validate_name(&document.name)?;
        let path = self.folder()?.root().join(&document.name);
        write_atomic(&path, document.raw_text.as_bytes()).await?;
        debug!(name = %document.name, bytes = document.raw_text.len(), "Document saved");
        Ok(())
    }

    /// Write a binary asset into the assets subfolder, creating it if absent.
    ///
    /// Returns the relative reference path (`img/<file_name>`).
    pub async fn write_asset(&self, file_name: &str, bytes: &[u8]) -> Result<String> {
        validate_name(file_name)?;
        let dir = self.folder()?.root().join(ASSET_DIR);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| SummitError::Write(format!("{}: {}", dir.display(), e)))?;
        write_atomic(&dir.join(file_name), bytes).await?;
        debug!(file = %file_name, bytes = bytes.len(), "Asset written");
        Ok(format!("{}/{}", ASSET_DIR, file_name))
    }

    /// Read a binary asset by its relative reference path.
    pub async fn read_asset(&self, rel_path: &str) -> Result<Vec<u8>> {
        let file_name = rel_path
            .strip_prefix(&format!("{}/", ASSET_DIR))
            .ok_or_else(|| {
                SummitError::Store(format!("not an asset reference: '{}'", rel_path))
            })?;
        validate_name(file_name)?;
        let path = self.folder()?.root().join(ASSET_DIR).join(file_name);
        Ok(tokio::fs::read(&path).await?)
    }
}

/// Non-recursive `.md` listing, sorted by name for stable ordering.
async fn enumerate_markdown(root: &Path) -> Result<Vec<FileEntry>> {
    let mut entries = Vec::new();
    let mut dir = tokio::fs::read_dir(root).await?;
    while let Some(entry) = dir.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if name.ends_with(MARKDOWN_SUFFIX) && !name.starts_with('.') {
            entries.push(FileEntry::file(name));
        }
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::picker::MockFolderPicker;

    async fn store_with_folder(dir: &Path) -> DocumentStore {
        let mut store = DocumentStore::new();
        store
            .select_folder(&MockFolderPicker::granting(dir))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_select_folder_lists_markdown_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.md"), "b").unwrap();
        std::fs::write(dir.path().join("a.md"), "a").unwrap();
        std::fs::write(dir.path().join("photo.jpg"), [0u8]).unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("c.md"), "c").unwrap();

        let store = store_with_folder(dir.path()).await;
        let names: Vec<_> = store.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.md", "b.md"]);
    }

    #[tokio::test]
    async fn test_select_folder_denied_revokes_handle() {
        let mut store = DocumentStore::new();
        let err = store
            .select_folder(&MockFolderPicker::denying())
            .await
            .unwrap_err();
        assert!(matches!(err, SummitError::AccessDenied(_)));
        assert!(!store.has_folder());
    }

    #[tokio::test]
    async fn test_list_entries_reenumerates() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_folder(dir.path()).await;
        assert!(store.entries().is_empty());

        std::fs::write(dir.path().join("new.md"), "x").unwrap();
        let fresh = store.list_entries().await.unwrap();
        assert_eq!(fresh, vec![FileEntry::file("new.md")]);
        // The cached working set is untouched until a new folder is selected.
        assert!(store.entries().is_empty());
    }

    #[tokio::test]
    async fn test_open_reads_full_text() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("diary.md"), "hello\nworld\n").unwrap();
        let store = store_with_folder(dir.path()).await;

        let doc = store.open("diary.md").await.unwrap();
        assert_eq!(doc.name, "diary.md");
        assert_eq!(doc.raw_text, "hello\nworld\n");
        assert!(!doc.is_editing());
    }

    #[tokio::test]
    async fn test_open_without_folder() {
        let store = DocumentStore::new();
        let err = store.open("diary.md").await.unwrap_err();
        assert!(matches!(err, SummitError::Store(_)));
    }

    #[tokio::test]
    async fn test_create_new_conflict() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("diary.md"), "existing").unwrap();
        let mut store = store_with_folder(dir.path()).await;

        let err = store.create_new("diary.md").await.unwrap_err();
        assert!(matches!(err, SummitError::NameConflict { .. }));
        // The existing file is untouched.
        let content = std::fs::read_to_string(dir.path().join("diary.md")).unwrap();
        assert_eq!(content, "existing");
    }

    #[tokio::test]
    async fn test_create_new_writes_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_with_folder(dir.path()).await;

        let doc = store.create_new("new.md").await.unwrap();
        assert_eq!(doc.raw_text, "");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("new.md")).unwrap(),
            ""
        );
        assert!(store.entries().iter().any(|e| e.name == "new.md"));
    }

    #[tokio::test]
    async fn test_create_new_requires_md_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_with_folder(dir.path()).await;
        let err = store.create_new("note.txt").await.unwrap_err();
        assert!(matches!(err, SummitError::Store(_)));
    }

    #[tokio::test]
    async fn test_save_then_open_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_with_folder(dir.path()).await;

        let mut doc = store.create_new("diary.md").await.unwrap();
        doc.raw_text = "첫 줄\nsecond line\n".to_string();
        store.save(&doc).await.unwrap();

        let reopened = store.open("diary.md").await.unwrap();
        assert_eq!(reopened.raw_text, "첫 줄\nsecond line\n");
    }

    #[tokio::test]
    async fn test_save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_with_folder(dir.path()).await;
        let doc = store.create_new("diary.md").await.unwrap();
        store.save(&doc).await.unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_name_with_separator_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_folder(dir.path()).await;
        let err = store.open("../escape.md").await.unwrap_err();
        assert!(matches!(err, SummitError::Store(_)));
    }

    #[tokio::test]
    async fn test_write_and_read_asset() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_folder(dir.path()).await;

        let rel = store.write_asset("photo.jpg", &[1, 2, 3]).await.unwrap();
        assert_eq!(rel, "img/photo.jpg");
        assert!(dir.path().join("img").join("photo.jpg").exists());

        let bytes = store.read_asset("img/photo.jpg").await.unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_read_asset_outside_asset_dir_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_folder(dir.path()).await;
        let err = store.read_asset("diary.md").await.unwrap_err();
        assert!(matches!(err, SummitError::Store(_)));
    }

    #[tokio::test]
    async fn test_read_missing_asset_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_folder(dir.path()).await;
        let err = store.read_asset("img/absent.jpg").await.unwrap_err();
        assert!(matches!(err, SummitError::Io(_)));
    }
}

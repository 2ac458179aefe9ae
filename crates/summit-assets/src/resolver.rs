//! Asset reference resolution and rendered-HTML rewriting.
//!
//! Scans document text for embedded asset references, resolves each to a
//! display handle through the store, and rewrites `<img>` tags in rendered
//! HTML. Resolution misses are soft: the original tag stays in place and
//! the host shows a broken image, never an error.

use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;
use tracing::{debug, warn};

use summit_store::DocumentStore;

use crate::provider::{AssetProvider, DisplayHandle};

/// External Markdown-to-HTML renderer, treated as a pure function.
pub type RenderFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Reference cache for the currently-open document.
///
/// Rebuilt whenever the document text or folder changes; all previous
/// display handles are released before the replacement map is installed.
pub struct AssetResolver {
    provider: Arc<dyn AssetProvider>,
    reference_regex: Regex,
    img_tag_regex: Regex,
    map: HashMap<String, DisplayHandle>,
}

impl AssetResolver {
    pub fn new(provider: Arc<dyn AssetProvider>) -> Self {
        Self {
            provider,
            reference_regex: Regex::new(r"!\[[^\]]*\]\((img/[^)]+)\)")
                .expect("invalid asset reference regex"),
            img_tag_regex: Regex::new(r#"<img\s+([^>]*?)src="(img/[^"]+)"([^>]*)>"#)
                .expect("invalid img tag regex"),
            map: HashMap::new(),
        }
    }

    /// Distinct asset reference paths in `text`, in order of appearance.
    pub fn extract_references(&self, text: &str) -> Vec<String> {
        let mut refs: Vec<String> = Vec::new();
        for caps in self.reference_regex.captures_iter(text) {
            let path = caps[1].to_string();
            if !refs.contains(&path) {
                refs.push(path);
            }
        }
        refs
    }

    /// Rebuild the cache for `text`, reading blobs through `store`.
    ///
    /// Previous handles are released first, then one handle is acquired per
    /// distinct reference. A missing blob or failed acquire leaves that
    /// reference unresolved. Returns the number of resolved references.
    pub async fn rebuild(&mut self, store: &DocumentStore, text: &str) -> usize {
        self.clear().await;

        let mut map = HashMap::new();
        for rel_path in self.extract_references(text) {
            let bytes = match store.read_asset(&rel_path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    debug!(path = %rel_path, error = %e, "Asset reference unresolved");
                    continue;
                }
            };
            match self.provider.acquire(&rel_path, &bytes).await {
                Ok(handle) => {
                    map.insert(rel_path, handle);
                }
                Err(e) => {
                    warn!(path = %rel_path, error = %e, "Display handle acquire failed");
                }
            }
        }

        let resolved = map.len();
        self.map = map;
        debug!(resolved, "Asset cache rebuilt");
        resolved
    }

    /// Release every handle and empty the cache.
    pub async fn clear(&mut self) {
        for handle in self.map.values() {
            self.provider.release(handle).await;
        }
        self.map.clear();
    }

    /// The display handle for a reference path, when resolved.
    pub fn resolved(&self, rel_path: &str) -> Option<&DisplayHandle> {
        self.map.get(rel_path)
    }

    pub fn resolved_count(&self) -> usize {
        self.map.len()
    }

    /// Rewrite `<img src="img/...">` occurrences whose path is resolved to
    /// the display URL, leaving unresolved tags untouched.
    pub fn rewrite_html(&self, html: &str) -> String {
        self.img_tag_regex
            .replace_all(html, |caps: &regex::Captures<'_>| {
                match self.map.get(&caps[2]) {
                    Some(handle) => {
                        format!("<img {}src=\"{}\"{}>", &caps[1], handle.url, &caps[3])
                    }
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }

    /// Render `text` with the external renderer, then resolve image tags.
    pub fn render(&self, text: &str, render: &RenderFn) -> String {
        self.rewrite_html(&render(text))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockAssetProvider;
    use summit_store::MockFolderPicker;

    fn resolver_with_mock() -> (AssetResolver, Arc<MockAssetProvider>) {
        let provider = Arc::new(MockAssetProvider::new());
        (AssetResolver::new(Arc::clone(&provider) as _), provider)
    }

    async fn store_in(dir: &std::path::Path) -> DocumentStore {
        let mut store = DocumentStore::new();
        store
            .select_folder(&MockFolderPicker::granting(dir))
            .await
            .unwrap();
        store
    }

    #[test]
    fn test_extract_references() {
        let (resolver, _) = resolver_with_mock();
        let text = "intro\n![](img/a.jpg)\n![alt text](img/b.png)\n![](other/c.jpg)\n";
        assert_eq!(
            resolver.extract_references(text),
            vec!["img/a.jpg".to_string(), "img/b.png".to_string()]
        );
    }

    #[test]
    fn test_extract_references_dedups_in_order() {
        let (resolver, _) = resolver_with_mock();
        let text = "![](img/b.jpg) ![](img/a.jpg) ![](img/b.jpg)";
        assert_eq!(
            resolver.extract_references(text),
            vec!["img/b.jpg".to_string(), "img/a.jpg".to_string()]
        );
    }

    #[tokio::test]
    async fn test_rebuild_resolves_present_assets() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path()).await;
        store.write_asset("a.jpg", &[1, 2]).await.unwrap();

        let (mut resolver, provider) = resolver_with_mock();
        let resolved = resolver
            .rebuild(&store, "![](img/a.jpg)\n![](img/missing.jpg)\n")
            .await;

        assert_eq!(resolved, 1);
        assert!(resolver.resolved("img/a.jpg").is_some());
        // The miss degrades gracefully: unresolved, not an error.
        assert!(resolver.resolved("img/missing.jpg").is_none());
        assert_eq!(provider.live(), 1);
    }

    #[tokio::test]
    async fn test_rebuild_releases_before_replace() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path()).await;
        store.write_asset("a.jpg", &[1]).await.unwrap();
        store.write_asset("b.jpg", &[2]).await.unwrap();

        let (mut resolver, provider) = resolver_with_mock();
        resolver.rebuild(&store, "![](img/a.jpg)").await;
        assert_eq!(provider.live(), 1);

        // Rapid successive rebuilds must never accumulate handles.
        resolver.rebuild(&store, "![](img/b.jpg)").await;
        resolver.rebuild(&store, "![](img/a.jpg)\n![](img/b.jpg)").await;

        assert_eq!(provider.live(), 2);
        assert_eq!(provider.acquired(), 4);
        assert_eq!(provider.released(), 2);
    }

    #[tokio::test]
    async fn test_clear_releases_everything() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path()).await;
        store.write_asset("a.jpg", &[1]).await.unwrap();

        let (mut resolver, provider) = resolver_with_mock();
        resolver.rebuild(&store, "![](img/a.jpg)").await;
        resolver.clear().await;

        assert_eq!(provider.live(), 0);
        assert_eq!(resolver.resolved_count(), 0);
    }

    #[tokio::test]
    async fn test_rewrite_html_resolved_and_unresolved() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path()).await;
        store.write_asset("a.jpg", &[1]).await.unwrap();

        let (mut resolver, _) = resolver_with_mock();
        resolver.rebuild(&store, "![](img/a.jpg)").await;
        let url = resolver.resolved("img/a.jpg").unwrap().url.clone();

        let html = r#"<p><img alt="" src="img/a.jpg"></p><p><img alt="" src="img/b.jpg"></p>"#;
        let rewritten = resolver.rewrite_html(html);

        assert!(rewritten.contains(&format!(r#"src="{}""#, url)));
        // Unresolved tag kept verbatim (broken-image fallback).
        assert!(rewritten.contains(r#"src="img/b.jpg""#));
    }

    #[tokio::test]
    async fn test_render_is_idempotent_with_unchanged_map() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path()).await;
        store.write_asset("a.jpg", &[1]).await.unwrap();

        let (mut resolver, _) = resolver_with_mock();
        resolver.rebuild(&store, "![](img/a.jpg)").await;

        let render: RenderFn = Arc::new(|md: &str| {
            format!("<p><img src=\"img/a.jpg\"> {}</p>", md.len())
        });
        let first = resolver.render("![](img/a.jpg)", &render);
        let second = resolver.render("![](img/a.jpg)", &render);
        assert_eq!(first, second);
    }

    #[test]
    fn test_rewrite_html_no_images_passthrough() {
        let (resolver, _) = resolver_with_mock();
        let html = "<p>plain text</p>";
        assert_eq!(resolver.rewrite_html(html), html);
    }
}

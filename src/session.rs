// Tab session for MarkView
// Ordered open documents plus the active-tab pointer

use std::path::{Path, PathBuf};

use crate::models::{Document, DocumentId, UNTITLED_NAME};

/// Open documents in tab order and the active selection.
///
/// Every operation is total: unknown ids are ignored rather than reported, so
/// a callback that races a close cannot put the session in a bad state.
/// `active` is `Some` exactly when `documents` is non-empty.
#[derive(Debug, Default)]
pub struct SessionManager {
    documents: Vec<Document>,
    active: Option<DocumentId>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    // ============================================
    // OPEN
    // ============================================

    /// Focus the document already backed by `source_path`, or append a new one.
    ///
    /// When the path is already open the incoming name and text are dropped:
    /// the open copy wins.
    pub fn open_or_focus(
        &mut self,
        display_name: impl Into<String>,
        source_path: Option<PathBuf>,
        text: impl Into<String>,
    ) -> DocumentId {
        if let Some(id) = self.open_id_for(source_path.as_deref()) {
            tracing::debug!(%id, "document already open, focusing");
            self.active = Some(id);
            return id;
        }

        let document = Document::new(display_name, source_path, text);
        let id = document.id;
        self.documents.push(document);
        self.active = Some(id);
        tracing::debug!(%id, tabs = self.documents.len(), "opened document");
        id
    }

    /// Like `open_or_focus`, but the new document takes the active tab's slot
    pub fn open_in_place(
        &mut self,
        display_name: impl Into<String>,
        source_path: Option<PathBuf>,
        text: impl Into<String>,
    ) -> DocumentId {
        if let Some(id) = self.open_id_for(source_path.as_deref()) {
            self.active = Some(id);
            return id;
        }

        let Some(index) = self.active_index() else {
            return self.open_or_focus(display_name, source_path, text);
        };

        let document = Document::new(display_name, source_path, text);
        let id = document.id;
        let replaced = std::mem::replace(&mut self.documents[index], document);
        self.active = Some(id);
        tracing::debug!(%id, replaced = %replaced.id, "replaced active document");
        id
    }

    /// Open an empty untitled document
    pub fn new_document(&mut self) -> DocumentId {
        self.open_or_focus(UNTITLED_NAME, None, String::new())
    }

    fn open_id_for(&self, source_path: Option<&Path>) -> Option<DocumentId> {
        let path = source_path?;
        self.find_by_path(path).map(|d| d.id)
    }

    // ============================================
    // CLOSE / SELECT
    // ============================================

    /// Remove a document. The tab sliding into the closed slot becomes active,
    /// clamped to the last tab.
    pub fn close(&mut self, id: DocumentId) -> Option<Document> {
        let index = self.index_of(id)?;
        let removed = self.documents.remove(index);

        if self.documents.is_empty() {
            self.active = None;
        } else if self.active == Some(id) {
            let next = index.min(self.documents.len() - 1);
            self.active = Some(self.documents[next].id);
        }

        tracing::debug!(%id, tabs = self.documents.len(), active = ?self.active, "closed document");
        Some(removed)
    }

    pub fn set_active(&mut self, id: DocumentId) {
        if self.index_of(id).is_some() {
            self.active = Some(id);
        }
    }

    // ============================================
    // MUTATION
    // ============================================

    pub fn edit_active(&mut self, text: impl Into<String>) {
        if let Some(id) = self.active {
            self.edit(id, text);
        }
    }

    /// Replace the text of a document and mark it modified
    pub fn edit(&mut self, id: DocumentId, text: impl Into<String>) {
        if let Some(document) = self.get_mut(id) {
            document.text = text.into();
            document.dirty = true;
        }
    }

    /// Clear the modified flag after a successful save.
    ///
    /// A first save of an untitled document also supplies its new path and name.
    pub fn mark_saved(&mut self, id: DocumentId, new_path: Option<PathBuf>, new_display_name: Option<String>) {
        if let Some(document) = self.get_mut(id) {
            document.dirty = false;
            if let Some(path) = new_path {
                document.source_path = Some(path);
            }
            if let Some(name) = new_display_name {
                document.display_name = name;
            }
        }
    }

    /// Replace text with the on-disk content; the document is clean afterwards
    pub fn reload(&mut self, id: DocumentId, text: impl Into<String>) {
        if let Some(document) = self.get_mut(id) {
            document.text = text.into();
            document.dirty = false;
        }
    }

    // ============================================
    // ACCESSORS
    // ============================================

    pub fn active_document(&self) -> Option<&Document> {
        self.active.and_then(|id| self.get(id))
    }

    pub fn active_id(&self) -> Option<DocumentId> {
        self.active
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn get(&self, id: DocumentId) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    pub fn find_by_path(&self, path: &Path) -> Option<&Document> {
        self.documents.iter().find(|d| d.is_backed_by(path))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn get_mut(&mut self, id: DocumentId) -> Option<&mut Document> {
        self.documents.iter_mut().find(|d| d.id == id)
    }

    fn index_of(&self, id: DocumentId) -> Option<usize> {
        self.documents.iter().position(|d| d.id == id)
    }

    fn active_index(&self) -> Option<usize> {
        self.active.and_then(|id| self.index_of(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_three(session: &mut SessionManager) -> [DocumentId; 3] {
        let a = session.open_or_focus("a.md", Some(PathBuf::from("/docs/a.md")), "A");
        let b = session.open_or_focus("b.md", Some(PathBuf::from("/docs/b.md")), "B");
        let c = session.open_or_focus("c.md", Some(PathBuf::from("/docs/c.md")), "C");
        [a, b, c]
    }

    fn assert_active_valid(session: &SessionManager) {
        match session.active_id() {
            Some(id) => assert!(session.get(id).is_some()),
            None => assert!(session.is_empty()),
        }
        assert_eq!(session.active_id().is_none(), session.is_empty());
    }

    #[test]
    fn test_open_appends_and_activates() {
        let mut session = SessionManager::new();
        let [a, b, c] = open_three(&mut session);

        let order: Vec<_> = session.documents().iter().map(|d| d.id).collect();
        assert_eq!(order, vec![a, b, c]);
        assert_eq!(session.active_id(), Some(c));
        assert!(session.documents().iter().all(|d| !d.dirty));
    }

    #[test]
    fn test_open_same_path_focuses_existing_copy() {
        let mut session = SessionManager::new();
        let [a, _, _] = open_three(&mut session);

        let again = session.open_or_focus("renamed.md", Some(PathBuf::from("/docs/a.md")), "other text");

        assert_eq!(again, a);
        assert_eq!(session.len(), 3);
        assert_eq!(session.active_id(), Some(a));
        let doc = session.active_document().unwrap();
        assert_eq!(doc.text, "A");
        assert_eq!(doc.display_name, "a.md");
    }

    #[test]
    fn test_untitled_documents_are_never_deduplicated() {
        let mut session = SessionManager::new();
        let first = session.new_document();
        let second = session.new_document();

        assert_ne!(first, second);
        assert_eq!(session.len(), 2);
        assert_eq!(session.active_document().unwrap().display_name, UNTITLED_NAME);
    }

    #[test]
    fn test_paths_stay_unique_across_opens() {
        let mut session = SessionManager::new();
        for name in ["a", "b", "a", "c", "b", "a"] {
            let path = PathBuf::from(format!("/docs/{name}.md"));
            session.open_or_focus(name, Some(path), name);
            assert_active_valid(&session);
        }
        assert_eq!(session.len(), 3);
    }

    #[test]
    fn test_close_active_middle_selects_tab_sliding_into_slot() {
        let mut session = SessionManager::new();
        let [a, b, c] = open_three(&mut session);
        session.set_active(b);

        let removed = session.close(b).unwrap();

        assert_eq!(removed.id, b);
        let order: Vec<_> = session.documents().iter().map(|d| d.id).collect();
        assert_eq!(order, vec![a, c]);
        assert_eq!(session.active_id(), Some(c));
    }

    #[test]
    fn test_close_active_last_selects_new_last_tab() {
        let mut session = SessionManager::new();
        let [_, b, c] = open_three(&mut session);

        session.close(c);

        assert_eq!(session.active_id(), Some(b));
    }

    #[test]
    fn test_close_active_first_selects_next_tab() {
        let mut session = SessionManager::new();
        let [a, b, _] = open_three(&mut session);
        session.set_active(a);

        session.close(a);

        assert_eq!(session.active_id(), Some(b));
    }

    #[test]
    fn test_close_inactive_keeps_active() {
        let mut session = SessionManager::new();
        let [a, _, c] = open_three(&mut session);

        session.close(a);

        assert_eq!(session.active_id(), Some(c));
        assert_eq!(session.len(), 2);
    }

    #[test]
    fn test_close_only_tab_clears_active() {
        let mut session = SessionManager::new();
        let id = session.new_document();

        session.close(id);

        assert!(session.is_empty());
        assert_eq!(session.active_id(), None);
        assert!(session.active_document().is_none());
    }

    #[test]
    fn test_close_unknown_id_is_noop() {
        let mut session = SessionManager::new();
        let [a, b, _] = open_three(&mut session);
        session.set_active(b);
        session.close(a);

        assert!(session.close(a).is_none());
        assert!(session.close(DocumentId::new()).is_none());
        assert_eq!(session.len(), 2);
        assert_eq!(session.active_id(), Some(b));
    }

    #[test]
    fn test_set_active_ignores_unknown_id() {
        let mut session = SessionManager::new();
        let [_, _, c] = open_three(&mut session);

        session.set_active(DocumentId::new());

        assert_eq!(session.active_id(), Some(c));
    }

    #[test]
    fn test_edit_then_mark_saved_round_trip() {
        let mut session = SessionManager::new();
        let id = session.open_or_focus("a.md", Some(PathBuf::from("/docs/a.md")), "old");

        session.edit(id, "new text");
        let doc = session.active_document().unwrap();
        assert_eq!(doc.text, "new text");
        assert!(doc.dirty);

        session.mark_saved(id, None, None);
        let doc = session.active_document().unwrap();
        assert_eq!(doc.text, "new text");
        assert!(!doc.dirty);
    }

    #[test]
    fn test_edit_active_targets_active_document() {
        let mut session = SessionManager::new();
        let [a, b, _] = open_three(&mut session);
        session.set_active(a);

        session.edit_active("changed");

        assert_eq!(session.get(a).unwrap().text, "changed");
        assert!(!session.get(b).unwrap().dirty);
    }

    #[test]
    fn test_edit_unknown_id_is_noop() {
        let mut session = SessionManager::new();
        let [a, _, _] = open_three(&mut session);

        session.edit(DocumentId::new(), "ghost");
        session.mark_saved(DocumentId::new(), Some(PathBuf::from("/x.md")), None);

        assert_eq!(session.get(a).unwrap().text, "A");
        assert!(session.documents().iter().all(|d| !d.dirty));
    }

    #[test]
    fn test_first_save_sets_path_and_name() {
        let mut session = SessionManager::new();
        let id = session.new_document();
        session.edit(id, "# Notes");

        session.mark_saved(id, Some(PathBuf::from("/docs/notes.md")), Some("notes.md".to_string()));

        let doc = session.get(id).unwrap();
        assert_eq!(doc.source_path.as_deref(), Some(Path::new("/docs/notes.md")));
        assert_eq!(doc.display_name, "notes.md");
        assert!(!doc.dirty);
        assert_eq!(session.find_by_path(Path::new("/docs/notes.md")).unwrap().id, id);
    }

    #[test]
    fn test_reload_replaces_text_and_clears_dirty() {
        let mut session = SessionManager::new();
        let id = session.open_or_focus("a.md", Some(PathBuf::from("/docs/a.md")), "v1");
        session.edit(id, "local");

        session.reload(id, "v2");

        let doc = session.get(id).unwrap();
        assert_eq!(doc.text, "v2");
        assert!(!doc.dirty);
    }

    #[test]
    fn test_open_in_place_replaces_active_slot() {
        let mut session = SessionManager::new();
        let [a, b, c] = open_three(&mut session);
        session.set_active(b);

        let d = session.open_in_place("d.md", Some(PathBuf::from("/docs/d.md")), "D");

        let order: Vec<_> = session.documents().iter().map(|doc| doc.id).collect();
        assert_eq!(order, vec![a, d, c]);
        assert_eq!(session.active_id(), Some(d));
        assert!(session.get(b).is_none());
    }

    #[test]
    fn test_open_in_place_on_empty_session_appends() {
        let mut session = SessionManager::new();
        let id = session.open_in_place("a.md", Some(PathBuf::from("/docs/a.md")), "A");

        assert_eq!(session.len(), 1);
        assert_eq!(session.active_id(), Some(id));
    }

    #[test]
    fn test_open_in_place_focuses_existing_path() {
        let mut session = SessionManager::new();
        let [a, _, _] = open_three(&mut session);

        let id = session.open_in_place("a.md", Some(PathBuf::from("/docs/a.md")), "changed");

        assert_eq!(id, a);
        assert_eq!(session.len(), 3);
        assert_eq!(session.get(a).unwrap().text, "A");
    }
}

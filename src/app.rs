// Application state and the inbound event queue
// Every native callback becomes one AppEvent handled to completion on one task

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

use crate::autosave::AutoSaveTimer;
use crate::commands::common::{is_markdown_path, markdown_file_from_args};
use crate::commands::file::{read_file_by_path, save_file};
use crate::commands::image::{copy_image_to_assets, save_base64_image};
use crate::error::{AppError, Result};
use crate::models::{display_name_for, DocumentId, Settings, SettingsUpdate};
use crate::search::SearchSession;
use crate::session::SessionManager;
use crate::storage::{absolute_path, StorageState};
use crate::watcher::FileWatcher;

/// Messages consumed by the event loop
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Open from the command line, a recent file or the folder tree
    OpenPath(PathBuf),
    FileDropped(PathBuf),
    /// Argument vector of a second launch
    SecondInstance(Vec<String>),
    NewDocument,
    SetActive(DocumentId),
    Close(DocumentId),
    Edit { id: DocumentId, text: String },
    Save(DocumentId),
    SaveAs { id: DocumentId, path: PathBuf },
    // Resolved against the session when handled, not when queued
    EditActive(String),
    /// Append one line to the active document
    AppendActive(String),
    /// Activate the tab at a 0-based position
    SelectIndex(usize),
    CloseActive,
    CloseIndex(usize),
    SaveActive,
    SaveAsActive(PathBuf),
    /// Copy an image file into the active document's assets and link it
    InsertImage(PathBuf),
    /// Persist a base64 data URL into the active document's assets and link it
    PasteImage(String),
    FileChanged(PathBuf),
    AutoSaveDue { id: DocumentId, generation: u64 },
    Find(String),
    FindNext,
    FindPrev,
    FindClear,
    UpdateSettings(SettingsUpdate),
    Shutdown,
}

/// Owner of the tab session and find-bar state
pub struct App {
    storage: StorageState,
    session: SessionManager,
    search: SearchSession,
    autosave: AutoSaveTimer,
    watcher: Option<FileWatcher>,
    events: UnboundedSender<AppEvent>,
}

impl App {
    /// `events` must feed the queue this app is driven from
    pub fn new(storage: StorageState, events: UnboundedSender<AppEvent>) -> Self {
        Self {
            storage,
            session: SessionManager::new(),
            search: SearchSession::new(),
            autosave: AutoSaveTimer::new(events.clone()),
            watcher: None,
            events,
        }
    }

    pub fn storage(&self) -> &StorageState {
        &self.storage
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn search(&self) -> &SearchSession {
        &self.search
    }

    pub fn watched_path(&self) -> Option<&Path> {
        self.watcher.as_ref().map(FileWatcher::path)
    }

    pub fn pending_autosave(&self) -> Option<DocumentId> {
        self.autosave.pending_for()
    }

    /// Handle one event. Returns false once the app should stop.
    ///
    /// Failures from file I/O are logged and leave the session unchanged.
    pub fn handle(&mut self, event: AppEvent) -> bool {
        tracing::trace!(?event, "handling event");
        let result = match event {
            AppEvent::OpenPath(path) => self.open_path(&path),
            AppEvent::FileDropped(path) => self.open_dropped(&path),
            AppEvent::SecondInstance(args) => match markdown_file_from_args(&args) {
                Some(path) => self.open_path(&path),
                None => Ok(()),
            },
            AppEvent::NewDocument => {
                self.session.new_document();
                self.after_active_change();
                Ok(())
            }
            AppEvent::SetActive(id) => {
                self.set_active(id);
                Ok(())
            }
            AppEvent::Close(id) => {
                self.close(id);
                Ok(())
            }
            AppEvent::Edit { id, text } => {
                self.edit(id, text);
                Ok(())
            }
            AppEvent::Save(id) => self.save(id),
            AppEvent::SaveAs { id, path } => self.save_as(id, &path),
            AppEvent::EditActive(text) => {
                if let Some(id) = self.session.active_id() {
                    self.edit(id, text);
                }
                Ok(())
            }
            AppEvent::AppendActive(line) => {
                self.append_active(&line);
                Ok(())
            }
            AppEvent::SelectIndex(index) => {
                if let Some(id) = self.id_at(index) {
                    self.set_active(id);
                }
                Ok(())
            }
            AppEvent::CloseActive => {
                if let Some(id) = self.session.active_id() {
                    self.close(id);
                }
                Ok(())
            }
            AppEvent::CloseIndex(index) => {
                if let Some(id) = self.id_at(index) {
                    self.close(id);
                }
                Ok(())
            }
            AppEvent::SaveActive => match self.session.active_id() {
                Some(id) => self.save(id),
                None => Ok(()),
            },
            AppEvent::SaveAsActive(path) => match self.session.active_id() {
                Some(id) => self.save_as(id, &path),
                None => Ok(()),
            },
            AppEvent::InsertImage(source) => self.insert_image(|doc| copy_image_to_assets(&source, doc)),
            AppEvent::PasteImage(data_url) => self.insert_image(|doc| save_base64_image(&data_url, doc)),
            AppEvent::FileChanged(path) => self.file_changed(&path),
            AppEvent::AutoSaveDue { id, generation } => self.auto_save_due(id, generation),
            AppEvent::Find(query) => {
                let text = self.active_text();
                self.search.set_query(&text, &query);
                Ok(())
            }
            AppEvent::FindNext => {
                self.search.next();
                Ok(())
            }
            AppEvent::FindPrev => {
                self.search.prev();
                Ok(())
            }
            AppEvent::FindClear => {
                self.search.clear();
                Ok(())
            }
            AppEvent::UpdateSettings(update) => self.storage.update_settings(&update).map(|settings| {
                self.apply_settings(&settings);
            }),
            AppEvent::Shutdown => {
                self.shutdown();
                return false;
            }
        };

        if let Err(e) = result {
            tracing::warn!(error = %e, "event failed");
        }
        true
    }

    /// Re-evaluate timers and the watcher after a settings change
    pub fn apply_settings(&mut self, settings: &Settings) {
        if !settings.auto_save {
            self.autosave.cancel();
        }
        self.sync_watcher(settings);
    }

    // ============================================
    // OPEN / CLOSE
    // ============================================

    fn open_path(&mut self, path: &Path) -> Result<()> {
        let opened = read_file_by_path(&self.storage, path)?;
        let settings = self.storage.settings();

        let replace_active = !settings.open_in_new_tab
            && self.session.active_document().is_some_and(|d| !d.dirty);
        let previous = self.session.active_id();

        let id = if replace_active {
            self.session.open_in_place(opened.name, Some(opened.path), opened.content)
        } else {
            self.session.open_or_focus(opened.name, Some(opened.path), opened.content)
        };
        if let Some(old) = previous.filter(|old| self.session.get(*old).is_none()) {
            self.autosave.cancel_for(old);
        }

        tracing::info!(%id, tabs = self.session.len(), "document opened");
        self.after_active_change();
        Ok(())
    }

    fn open_dropped(&mut self, path: &Path) -> Result<()> {
        if !is_markdown_path(path) {
            tracing::debug!(path = %path.display(), "ignoring dropped non-markdown file");
            return Ok(());
        }
        self.open_path(path)
    }

    fn set_active(&mut self, id: DocumentId) {
        let before = self.session.active_id();
        self.session.set_active(id);
        if self.session.active_id() != before {
            self.after_active_change();
        }
    }

    fn id_at(&self, index: usize) -> Option<DocumentId> {
        let id = self.session.documents().get(index).map(|d| d.id);
        if id.is_none() {
            tracing::debug!(index, tabs = self.session.len(), "no tab at index");
        }
        id
    }

    fn close(&mut self, id: DocumentId) {
        let Some(closed) = self.session.close(id) else {
            return;
        };
        self.autosave.cancel_for(id);
        let was_watched = closed
            .source_path
            .as_deref()
            .is_some_and(|path| self.watched_path() == Some(path));
        if was_watched {
            self.watcher = None;
        }
        if closed.dirty {
            tracing::info!(name = %closed.display_name, "closed document with unsaved changes");
        }
        self.after_active_change();
    }

    // ============================================
    // EDIT / SAVE
    // ============================================

    fn edit(&mut self, id: DocumentId, text: String) {
        if self.session.get(id).is_none() {
            return;
        }
        self.session.edit(id, text);
        if self.session.active_id() == Some(id) {
            self.refresh_search();
        }
        self.schedule_autosave(id);
    }

    fn append_active(&mut self, line: &str) {
        let Some(document) = self.session.active_document() else {
            return;
        };
        let id = document.id;
        let text = appended(&document.text, line);
        self.edit(id, text);
    }

    /// Store an image for the active document and append a link to it
    fn insert_image(&mut self, store: impl FnOnce(Option<&Path>) -> Result<String>) -> Result<()> {
        let Some(document) = self.session.active_document() else {
            return Ok(());
        };
        let link = store(document.source_path.as_deref())?;
        self.append_active(&format!("![]({link})"));
        Ok(())
    }

    fn save(&mut self, id: DocumentId) -> Result<()> {
        let Some(document) = self.session.get(id) else {
            return Ok(());
        };
        let Some(path) = document.source_path.clone() else {
            tracing::info!(%id, "untitled document needs a path, use save as");
            return Ok(());
        };

        save_file(&self.storage, &path, &document.text)?;
        self.session.mark_saved(id, None, None);
        self.autosave.cancel_for(id);
        tracing::info!(path = %path.display(), "saved");
        Ok(())
    }

    fn save_as(&mut self, id: DocumentId, path: &Path) -> Result<()> {
        let Some(document) = self.session.get(id) else {
            return Ok(());
        };
        let path = absolute_path(path);

        // A tab already showing the target is replaced, unless it holds edits
        let other = self.session.find_by_path(&path).filter(|d| d.id != id);
        if other.is_some_and(|d| d.dirty) {
            return Err(AppError::UnsavedChanges(path));
        }
        let other = other.map(|d| d.id);

        save_file(&self.storage, &path, &document.text)?;
        if let Some(other) = other {
            self.session.close(other);
            self.autosave.cancel_for(other);
            tracing::info!(path = %path.display(), "closed tab replaced by save as");
        }

        self.session.mark_saved(id, Some(path.clone()), Some(display_name_for(&path)));
        self.autosave.cancel_for(id);
        tracing::info!(path = %path.display(), "saved as");
        self.after_active_change();
        Ok(())
    }

    fn schedule_autosave(&mut self, id: DocumentId) {
        let settings = self.storage.settings();
        let eligible = settings.auto_save
            && self.session.active_id() == Some(id)
            && self.session.get(id).is_some_and(|d| d.dirty && d.source_path.is_some());

        if eligible {
            self.autosave.schedule(id, Duration::from_millis(settings.auto_save_delay));
        } else {
            self.autosave.cancel_for(id);
        }
    }

    fn auto_save_due(&mut self, id: DocumentId, generation: u64) -> Result<()> {
        if !self.autosave.take_fired(id, generation) {
            tracing::trace!(%id, "ignoring stale auto-save");
            return Ok(());
        }
        let still_valid = self.storage.settings().auto_save
            && self.session.active_id() == Some(id)
            && self.session.get(id).is_some_and(|d| d.dirty);
        if still_valid {
            self.save(id)?;
        }
        Ok(())
    }

    // ============================================
    // RELOAD
    // ============================================

    fn file_changed(&mut self, path: &Path) -> Result<()> {
        if !self.storage.settings().auto_reload {
            return Ok(());
        }
        let Some(document) = self.session.find_by_path(path) else {
            return Ok(());
        };
        if document.dirty {
            tracing::info!(path = %path.display(), "file changed on disk, keeping local edits");
            return Ok(());
        }

        let id = document.id;
        let text = fs::read_to_string(path)?;
        if text == document.text {
            return Ok(());
        }
        self.session.reload(id, text);
        if self.session.active_id() == Some(id) {
            self.refresh_search();
        }
        tracing::info!(path = %path.display(), "reloaded from disk");
        Ok(())
    }

    // ============================================
    // DERIVED STATE
    // ============================================

    fn active_text(&self) -> String {
        self.session.active_document().map(|d| d.text.clone()).unwrap_or_default()
    }

    fn refresh_search(&mut self) {
        if self.search.is_active() {
            let text = self.active_text();
            self.search.refresh(&text);
        }
    }

    /// Keep the timer, the find bar and the watcher in line with the active tab
    fn after_active_change(&mut self) {
        if let Some(pending) = self.autosave.pending_for() {
            if self.session.active_id() != Some(pending) {
                self.autosave.cancel();
            }
        }
        self.refresh_search();
        let settings = self.storage.settings();
        self.sync_watcher(&settings);
    }

    fn sync_watcher(&mut self, settings: &Settings) {
        let wanted = if settings.auto_reload {
            self.session.active_document().and_then(|d| d.source_path.clone())
        } else {
            None
        };
        if self.watched_path() == wanted.as_deref() {
            return;
        }

        self.watcher = None;
        if let Some(path) = wanted {
            match FileWatcher::start(&path, self.events.clone()) {
                Ok(watcher) => self.watcher = Some(watcher),
                Err(e) => tracing::warn!(error = %e, path = %path.display(), "could not watch file"),
            }
        }
    }

    fn shutdown(&mut self) {
        self.autosave.cancel();
        self.watcher = None;
        if let Err(e) = self.storage.save_settings() {
            tracing::warn!(error = %e, "failed to save settings on shutdown");
        }
        tracing::info!("shutting down");
    }
}

/// `text` with `line` added as its last line
fn appended(text: &str, line: &str) -> String {
    if text.is_empty() {
        line.to_string()
    } else if text.ends_with('\n') {
        format!("{text}{line}")
    } else {
        format!("{text}\n{line}")
    }
}

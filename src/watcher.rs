// File watching for auto-reload
// Watches one file and reports debounced change notifications to the app queue

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

use crate::app::AppEvent;
use crate::error::Result;

/// Quiet period after the last write before a change is reported
pub const DEBOUNCE: Duration = Duration::from_millis(100);

/// Active watch on a single file. Dropping it stops the watch.
pub struct FileWatcher {
    path: PathBuf,
    _watcher: RecommendedWatcher,
    cancel: CancellationToken,
}

impl FileWatcher {
    /// Start watching `path`. Must be called inside a tokio runtime.
    pub fn start(path: &Path, events: UnboundedSender<AppEvent>) -> Result<Self> {
        let path = path.to_path_buf();
        let (raw_tx, raw_rx) = mpsc::unbounded_channel::<()>();

        // Editors often save by renaming over the file, so watch the parent
        // directory and filter for our file name.
        let target = path.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
            Ok(event) => {
                let relevant = matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
                    && event.paths.iter().any(|p| p == &target);
                if relevant {
                    let _ = raw_tx.send(());
                }
            }
            Err(e) => tracing::warn!(error = %e, "file watch error"),
        })?;
        let watch_root = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(path.as_path());
        watcher.watch(watch_root, RecursiveMode::NonRecursive)?;

        let cancel = CancellationToken::new();
        tokio::spawn(debounce_changes(path.clone(), raw_rx, events, cancel.clone()));

        tracing::debug!(path = %path.display(), "watching file");
        Ok(Self {
            path,
            _watcher: watcher,
            cancel,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileWatcher {
    fn drop(&mut self) {
        self.cancel.cancel();
        tracing::debug!(path = %self.path.display(), "stopped watching file");
    }
}

/// Collapse bursts of raw notifications into one `FileChanged` per quiet period
pub(crate) async fn debounce_changes(
    path: PathBuf,
    mut raw: UnboundedReceiver<()>,
    events: UnboundedSender<AppEvent>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            msg = raw.recv() => if msg.is_none() { return },
        }

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                msg = raw.recv() => if msg.is_none() { return },
                _ = tokio::time::sleep(DEBOUNCE) => break,
            }
        }

        if events.send(AppEvent::FileChanged(path.clone())).is_err() {
            return;
        }
    }
}

//! Hot-reload watcher (spec §4.2 "hot-reload", SPEC_FULL.md §REDESIGN FLAGS
//! #4). Grounded on `original_source/src/aiori_agent/module_manager.py`'s
//! `_start_watcher`/`on_modified`, translated from `watchdog.Observer` to
//! the `notify` crate and from `.py` files to `.toml` manifests.
//!
//! `notify`'s callback fires on its own thread and editors commonly emit
//! several modify events per save; a small per-path debounce window
//! collapses those into one reload, same effect as the Python original's
//! per-event `asyncio.create_task` relying on the reload itself being
//! idempotent, but without the redundant stop/start churn.

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

const DEBOUNCE: Duration = Duration::from_millis(200);

pub struct ModuleWatcher {
    _watcher: RecommendedWatcher,
    events: mpsc::UnboundedReceiver<PathBuf>,
    last_emitted: HashMap<PathBuf, Instant>,
}

impl ModuleWatcher {
    pub fn watch(dir: &Path) -> notify::Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
            let Ok(event) = result else { return };
            if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                return;
            }
            for path in event.paths {
                if path.extension().and_then(|ext| ext.to_str()) == Some("toml") {
                    let _ = tx.send(path);
                }
            }
        })?;
        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        Ok(Self { _watcher: watcher, events: rx, last_emitted: HashMap::new() })
    }

    /// Awaits the next debounced path change, or `None` once the watcher
    /// side of the channel has been dropped.
    pub async fn next_change(&mut self) -> Option<PathBuf> {
        loop {
            let path = self.events.recv().await?;
            let now = Instant::now();
            if let Some(previous) = self.last_emitted.get(&path) {
                if now.duration_since(*previous) < DEBOUNCE {
                    self.last_emitted.insert(path, now);
                    continue;
                }
            }
            self.last_emitted.insert(path.clone(), now);
            return Some(path);
        }
    }
}

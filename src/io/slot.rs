use std::cell::RefCell;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::model::task::Task;

/// Filename of the persistence slot
pub const SLOT_FILE: &str = "deck.json";

/// Error type for slot I/O
#[derive(Debug, thiserror::Error)]
pub enum SlotError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: io::Error,
    },
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: io::Error,
    },
    #[error("corrupt task data in {path}: {source}")]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// A durable mirror of the full task collection.
///
/// The whole collection is serialized as a single value; there are no
/// partial writes. `save` is order-sensitive and idempotent.
pub trait Slot {
    fn load(&self) -> Result<Vec<Task>, SlotError>;
    fn save(&self, tasks: &[Task]) -> Result<(), SlotError>;
}

// ---------------------------------------------------------------------------
// File-backed slot
// ---------------------------------------------------------------------------

/// Slot backed by one JSON file holding the task array
#[derive(Debug, Clone)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    pub fn new(path: PathBuf) -> Self {
        FileSlot { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Find the slot file by walking up from the given directory.
    ///
    /// Returns the first existing `deck.json` on the way to the filesystem
    /// root, or `start/deck.json` if none exists yet (it will be created on
    /// the first save).
    pub fn discover(start: &Path) -> Self {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(SLOT_FILE);
            if candidate.is_file() {
                return FileSlot::new(candidate);
            }
            if !current.pop() {
                return FileSlot::new(start.join(SLOT_FILE));
            }
        }
    }
}

impl Slot for FileSlot {
    fn load(&self) -> Result<Vec<Task>, SlotError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path).map_err(|e| SlotError::Read {
            path: self.path.clone(),
            source: e,
        })?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|e| SlotError::Decode {
            path: self.path.clone(),
            source: e,
        })
    }

    fn save(&self, tasks: &[Task]) -> Result<(), SlotError> {
        let content = serde_json::to_string_pretty(tasks).map_err(|e| SlotError::Write {
            path: self.path.clone(),
            source: io::Error::other(e),
        })?;
        atomic_write(&self.path, content.as_bytes()).map_err(|e| SlotError::Write {
            path: self.path.clone(),
            source: e,
        })
    }
}

/// Write via a temp file in the same directory, then rename into place
fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// In-memory slot
// ---------------------------------------------------------------------------

/// In-process slot for tests and throwaway stores
#[derive(Debug, Default)]
pub struct MemorySlot {
    tasks: RefCell<Vec<Task>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        MemorySlot::default()
    }

    /// Pre-seed the slot, as if a previous session had saved these tasks
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        MemorySlot {
            tasks: RefCell::new(tasks),
        }
    }
}

impl Slot for MemorySlot {
    fn load(&self) -> Result<Vec<Task>, SlotError> {
        Ok(self.tasks.borrow().clone())
    }

    fn save(&self, tasks: &[Task]) -> Result<(), SlotError> {
        *self.tasks.borrow_mut() = tasks.to_vec();
        Ok(())
    }
}

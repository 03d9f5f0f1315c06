//! Card and result store persistence with file locking.
//!
//! The card store is read-only. The results store is loaded in full and
//! rewritten in full on every persist: the new log goes to a temp file in
//! the same directory, is synced, then renamed over the original.

use crate::{Card, Error, Result, ResultRecord};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Load/persist contract for the study log
pub trait ResultStore {
    /// Load the full log. A store that has never been written is empty.
    fn load(&self) -> Result<Vec<ResultRecord>>;

    /// Replace the stored log with `log`
    fn persist(&mut self, log: &[ResultRecord]) -> Result<()>;

    /// Load, append `records`, and persist the merged log.
    ///
    /// Returns the merged log. Nothing is written when `records` is empty.
    fn append(&mut self, records: &[ResultRecord]) -> Result<Vec<ResultRecord>> {
        let mut log = self.load()?;
        if records.is_empty() {
            return Ok(log);
        }
        log.extend_from_slice(records);
        self.persist(&log)?;
        Ok(log)
    }
}

/// JSON file results store
#[derive(Clone, Debug)]
pub struct JsonResultStore {
    path: PathBuf,
}

impl JsonResultStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultStore for JsonResultStore {
    fn load(&self) -> Result<Vec<ResultRecord>> {
        match read_locked(&self.path)? {
            Some(contents) => {
                let log: Vec<ResultRecord> = parse_json(&self.path, &contents)?;
                tracing::debug!("Loaded {} result(s) from {:?}", log.len(), self.path);
                Ok(log)
            }
            None => {
                tracing::info!("No results file at {:?}, starting empty", self.path);
                Ok(Vec::new())
            }
        }
    }

    fn persist(&mut self, log: &[ResultRecord]) -> Result<()> {
        let contents = serde_json::to_string_pretty(log)?;
        write_atomic(&self.path, contents.as_bytes())?;
        tracing::debug!("Persisted {} result(s) to {:?}", log.len(), self.path);
        Ok(())
    }
}

/// In-memory results store for embedding and tests
#[derive(Clone, Debug, Default)]
pub struct MemoryResultStore {
    log: Vec<ResultRecord>,
    persist_count: usize,
}

impl MemoryResultStore {
    pub fn new(log: Vec<ResultRecord>) -> Self {
        Self {
            log,
            persist_count: 0,
        }
    }

    pub fn records(&self) -> &[ResultRecord] {
        &self.log
    }

    /// Number of times `persist` has been called
    pub fn persist_count(&self) -> usize {
        self.persist_count
    }
}

impl ResultStore for MemoryResultStore {
    fn load(&self) -> Result<Vec<ResultRecord>> {
        Ok(self.log.clone())
    }

    fn persist(&mut self, log: &[ResultRecord]) -> Result<()> {
        self.log = log.to_vec();
        self.persist_count += 1;
        Ok(())
    }
}

/// Load the card store.
///
/// Unlike the results store, a missing card file is an error.
pub fn load_cards(path: &Path) -> Result<Vec<Card>> {
    let contents = read_locked(path)?.ok_or_else(|| Error::DataUnavailable {
        path: path.to_path_buf(),
        reason: "file does not exist".into(),
    })?;
    let cards: Vec<Card> = parse_json(path, &contents)?;
    tracing::debug!("Loaded {} card(s) from {:?}", cards.len(), path);
    Ok(cards)
}

/// Read a whole file under a shared lock. `None` if it does not exist.
fn read_locked(path: &Path) -> Result<Option<String>> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(unavailable(path, e)),
    };

    file.lock_shared().map_err(|e| unavailable(path, e))?;

    let mut contents = String::new();
    let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
    let _ = file.unlock();
    read.map_err(|e| {
        if e.kind() == ErrorKind::InvalidData {
            corrupt(path, e)
        } else {
            unavailable(path, e)
        }
    })?;

    Ok(Some(contents))
}

fn parse_json<T: DeserializeOwned>(path: &Path, contents: &str) -> Result<T> {
    serde_json::from_str(contents).map_err(|e| corrupt(path, e))
}

/// Atomically replace `path` with `contents`
///
/// 1. Write to a temp file in the same directory
/// 2. Sync to disk
/// 3. Rename over the original
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    temp.as_file().lock_exclusive()?;

    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        writer.write_all(contents)?;
        writer.flush()?;
    }

    temp.as_file().sync_all()?;
    temp.as_file().unlock()?;

    temp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

fn unavailable(path: &Path, reason: impl ToString) -> Error {
    Error::DataUnavailable {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn corrupt(path: &Path, reason: impl ToString) -> Error {
    Error::DataCorrupt {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

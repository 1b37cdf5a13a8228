//! This module provides the persistence port used for everything that
//! outlives a session (the last day read, completed days and bookmarks),
//! along with two implementations: an in-memory store and a store keeping
//! one file per key in a directory.
//!
//! Values are opaque strings. Callers are expected to tolerate values that
//! are missing (first run) or garbage (treated as missing).

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use super::errors::*;

/// A simple key-value store for persisted state.
pub trait StateStore {
    /// Returns the value stored under `key`, or `None` if there is none.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// A store that only lives as long as the process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// A store keeping each value in its own file, `{key}.state`, inside a
/// directory.
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens a store in the given directory, creating the directory if it
    /// does not exist yet.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<FileStore> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.is_dir() {
            fs::create_dir_all(&dir).chain_err(|| {
                ErrorKind::Io(format!("could not create state directory '{}'", dir.display()))
            })?;
        }
        Ok(FileStore { dir: dir })
    }

    /// Returns the directory backing this store.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let mut filename = self.dir.clone();
        filename.push(key);
        filename.set_extension("state");
        filename
    }
}

impl StateStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let filename = self.path_for(key);
        if !filename.exists() {
            return Ok(None);
        }

        let mut f = File::open(&filename).chain_err(|| {
            ErrorKind::Io(format!("could not open state file '{}'", filename.display()))
        })?;
        let mut value = String::new();
        f.read_to_string(&mut value).chain_err(|| {
            ErrorKind::Io(format!("could not read state file '{}'", filename.display()))
        })?;
        Ok(Some(value))
    }

    /// Writes to a scratch file first and renames it over the old value,
    /// so a failed write leaves the previous value in place.
    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let filename = self.path_for(key);
        let mut scratch = filename.clone();
        scratch.set_extension("state.tmp");

        let written = File::create(&scratch)
            .and_then(|mut f| f.write_all(value.as_bytes()).and_then(|_| f.sync_all()));
        if let Err(e) = written.and_then(|_| fs::rename(&scratch, &filename)) {
            if scratch.is_file() {
                let _ = fs::remove_file(&scratch);
            }
            return Err(e).chain_err(|| ErrorKind::PersistenceWrite(key.into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn memory_store_overwrites() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("lastDay").unwrap(), None);
        store.set("lastDay", "4").unwrap();
        store.set("lastDay", "5").unwrap();
        assert_eq!(store.get("lastDay").unwrap(), Some("5".to_owned()));
    }

    #[test]
    fn file_store_survives_reopening() {
        let tmp = TempDir::new().expect("tempdir");
        let dir = tmp.path().join("nested").join("state");
        {
            let mut store = FileStore::open(&dir).unwrap();
            store.set("lastDay", "12").unwrap();
        }
        let store = FileStore::open(&dir).unwrap();
        assert_eq!(store.get("lastDay").unwrap(), Some("12".to_owned()));
        assert_eq!(store.get("completedDays").unwrap(), None);
        assert!(dir.join("lastDay.state").is_file());
    }

    #[test]
    fn failed_write_keeps_the_previous_value() {
        let tmp = TempDir::new().expect("tempdir");
        let mut store = FileStore::open(tmp.path()).unwrap();
        store.set("lastDay", "7").unwrap();
        assert!(!tmp.path().join("lastDay.state.tmp").exists());

        // Block the scratch file so the next write cannot start
        fs::create_dir(tmp.path().join("lastDay.state.tmp")).unwrap();
        match store.set("lastDay", "8") {
            Err(Error(ErrorKind::PersistenceWrite(_), _)) => {}
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(store.get("lastDay").unwrap(), Some("7".to_owned()));
    }

    #[test]
    fn file_store_reports_write_failures() {
        let tmp = TempDir::new().expect("tempdir");
        let mut store = FileStore::open(tmp.path()).unwrap();
        // A directory where the file should go makes the write fail
        fs::create_dir(tmp.path().join("lastDay.state")).unwrap();
        match store.set("lastDay", "3") {
            Err(Error(ErrorKind::PersistenceWrite(ref key), _)) if key == "lastDay" => {}
            other => panic!("unexpected result {:?}", other),
        }
        assert!(!tmp.path().join("lastDay.state.tmp").exists());
    }
}

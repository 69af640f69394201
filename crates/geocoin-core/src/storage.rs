//! Durable storage backends for session snapshots.
//!
//! A backend holds exactly one snapshot blob; each save replaces it whole.

use std::cell::RefCell;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Single-slot durable storage.
pub trait Storage {
    /// The stored snapshot, or `None` if nothing was ever saved.
    fn read(&self) -> io::Result<Option<Vec<u8>>>;
    /// Replace the stored snapshot.
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;
}

/// Snapshot kept in one file. Writes go through a sibling temp file and a
/// rename so a crash mid-write never leaves a torn snapshot behind.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Storage for FileStorage {
    fn read(&self) -> io::Result<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let tmp = self.temp_path();
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &self.path)
    }
}

/// In-process storage. Clones share one slot, so a test can keep a handle
/// and "restart" by opening a second session on the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slot: Rc<RefCell<Option<Vec<u8>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the stored bytes.
    pub fn contents(&self) -> Option<Vec<u8>> {
        self.slot.borrow().clone()
    }

    /// Overwrite the slot directly.
    pub fn set(&self, bytes: impl Into<Vec<u8>>) {
        *self.slot.borrow_mut() = Some(bytes.into());
    }
}

impl Storage for MemoryStorage {
    fn read(&self) -> io::Result<Option<Vec<u8>>> {
        Ok(self.contents())
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.set(bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("geocoin-storage-{}-{}", std::process::id(), name))
            .join("save.json")
    }

    #[test]
    fn memory_clones_share_slot() {
        let a = MemoryStorage::new();
        let mut b = a.clone();
        assert_eq!(a.read().unwrap(), None);
        b.write(b"abc").unwrap();
        assert_eq!(a.contents(), Some(b"abc".to_vec()));
    }

    #[test]
    fn file_missing_reads_as_none() {
        let storage = FileStorage::new(scratch("missing"));
        assert_eq!(storage.read().unwrap(), None);
    }

    #[test]
    fn file_write_replaces_snapshot() {
        let path = scratch("cycle");
        let mut storage = FileStorage::new(&path);
        storage.write(b"first").unwrap();
        storage.write(b"second").unwrap();
        assert_eq!(storage.read().unwrap(), Some(b"second".to_vec()));
        assert!(!storage.temp_path().exists());
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}

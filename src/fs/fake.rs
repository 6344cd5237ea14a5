//! In-memory directory enumerator for loader tests.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::fs::entry::DirEntry;
use crate::fs::enumerator::{DirectoryEnumerator, Listing};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Dir,
    File,
}

/// Failure injected for a single directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Failure {
    Denied,
    Broken,
}

/// Fake filesystem with per-directory listing counters.
#[derive(Debug, Default)]
pub(crate) struct FakeFs {
    entries: RefCell<BTreeMap<PathBuf, Kind>>,
    roots: Vec<PathBuf>,
    failures: RefCell<HashMap<PathBuf, Failure>>,
    calls: RefCell<HashMap<PathBuf, usize>>,
}

impl FakeFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add directories together with all their ancestors.
    pub fn with_dirs(self, paths: &[&str]) -> Self {
        for path in paths {
            self.add_dir(Path::new(path));
        }
        self
    }

    pub fn with_file(self, path: &str) -> Self {
        let path = Path::new(path);
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }
        self.entries.borrow_mut().insert(path.to_path_buf(), Kind::File);
        self
    }

    pub fn with_root(mut self, path: &str) -> Self {
        self.add_dir(Path::new(path));
        self.roots.push(PathBuf::from(path));
        self
    }

    pub fn deny(self, path: &str) -> Self {
        self.failures
            .borrow_mut()
            .insert(PathBuf::from(path), Failure::Denied);
        self
    }

    pub fn break_dir(self, path: &str) -> Self {
        self.failures
            .borrow_mut()
            .insert(PathBuf::from(path), Failure::Broken);
        self
    }

    pub fn allow(&self, path: &str) {
        self.failures.borrow_mut().remove(Path::new(path));
    }

    pub fn add_dir(&self, path: &Path) {
        let mut entries = self.entries.borrow_mut();
        for ancestor in path.ancestors().filter(|p| !p.as_os_str().is_empty()) {
            entries.insert(ancestor.to_path_buf(), Kind::Dir);
        }
    }

    /// Delete a path and everything below it.
    pub fn remove(&self, path: &str) {
        let path = Path::new(path);
        self.entries.borrow_mut().retain(|p, _| !p.starts_with(path));
    }

    /// How many times `path` was listed.
    pub fn list_calls(&self, path: &str) -> usize {
        self.calls.borrow().get(Path::new(path)).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.borrow().values().sum()
    }

    fn make_entry(path: &Path, kind: Kind) -> DirEntry {
        match kind {
            Kind::Dir => DirEntry::directory(path),
            Kind::File => DirEntry::file(path, 0),
        }
    }
}

impl DirectoryEnumerator for FakeFs {
    fn list_roots(&self) -> Result<Vec<DirEntry>> {
        self.roots.iter().map(|r| self.entry(r)).collect()
    }

    fn list_directory(&self, path: &Path) -> Result<Listing> {
        *self.calls.borrow_mut().entry(path.to_path_buf()).or_default() += 1;

        match self.failures.borrow().get(path) {
            Some(Failure::Denied) => return Err(AppError::PermissionDenied(path.to_path_buf())),
            Some(Failure::Broken) => {
                return Err(AppError::from_io(
                    path,
                    io::Error::new(io::ErrorKind::Other, "device not ready"),
                ))
            }
            None => {}
        }

        let entries = self.entries.borrow();
        match entries.get(path) {
            Some(Kind::Dir) => {}
            Some(Kind::File) => return Err(AppError::NotADirectory(path.to_path_buf())),
            None => return Err(AppError::PathNotFound(path.to_path_buf())),
        }
        let children = entries
            .iter()
            .filter(|(p, _)| p.parent() == Some(path))
            .map(|(p, kind)| Self::make_entry(p, *kind));
        Ok(Listing::from_entries(children))
    }

    fn entry(&self, path: &Path) -> Result<DirEntry> {
        self.entries
            .borrow()
            .get(path)
            .map(|kind| Self::make_entry(path, *kind))
            .ok_or_else(|| AppError::PathNotFound(path.to_path_buf()))
    }
}

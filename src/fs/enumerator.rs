use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::fs::entry::DirEntry;

/// Contents of one directory, split into subdirectories and files.
///
/// Both halves are sorted case-insensitively by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub directories: Vec<DirEntry>,
    pub files: Vec<DirEntry>,
}

impl Listing {
    /// Partition and sort a flat list of entries.
    pub fn from_entries(entries: impl IntoIterator<Item = DirEntry>) -> Self {
        let (mut directories, mut files): (Vec<_>, Vec<_>) =
            entries.into_iter().partition(|e| e.is_dir);
        directories.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        files.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        Self { directories, files }
    }
}

/// Raw directory-listing and root-discovery I/O used by the loader.
///
/// Calls are blocking. Implementations report failures through
/// [`AppError::from_io`] so that permission problems surface as
/// [`AppError::PermissionDenied`].
pub trait DirectoryEnumerator {
    /// Top-level browsable locations, in display order.
    fn list_roots(&self) -> Result<Vec<DirEntry>>;

    /// Immediate contents of `path`.
    fn list_directory(&self, path: &Path) -> Result<Listing>;

    /// Fresh metadata snapshot for a single path.
    fn entry(&self, path: &Path) -> Result<DirEntry>;

    /// Absolute, normalized form of `path`.
    fn resolve(&self, path: &Path) -> Result<PathBuf> {
        Ok(path.to_path_buf())
    }
}

impl<E: DirectoryEnumerator + ?Sized> DirectoryEnumerator for &E {
    fn list_roots(&self) -> Result<Vec<DirEntry>> {
        (**self).list_roots()
    }

    fn list_directory(&self, path: &Path) -> Result<Listing> {
        (**self).list_directory(path)
    }

    fn entry(&self, path: &Path) -> Result<DirEntry> {
        (**self).entry(path)
    }

    fn resolve(&self, path: &Path) -> Result<PathBuf> {
        (**self).resolve(path)
    }
}

/// Directory enumerator backed by the local disk.
#[derive(Debug, Clone)]
pub struct LocalFs {
    roots: Vec<PathBuf>,
    show_hidden: bool,
    include_home: bool,
}

impl Default for LocalFs {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            show_hidden: false,
            include_home: true,
        }
    }
}

impl LocalFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the `[tree]` section of the configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            roots: config.roots(),
            show_hidden: config.show_hidden(),
            include_home: config.include_home(),
        }
    }

    /// Use an explicit root set instead of the platform default.
    pub fn with_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.roots = roots;
        self
    }

    /// Whether dot entries are listed.
    pub fn with_hidden(mut self, show_hidden: bool) -> Self {
        self.show_hidden = show_hidden;
        self
    }

    /// Drives on Windows; `/` and the home directory elsewhere.
    fn platform_roots(&self) -> Vec<PathBuf> {
        let mut roots = Vec::new();
        if cfg!(windows) {
            for letter in b'A'..=b'Z' {
                let drive = PathBuf::from(format!("{}:\\", letter as char));
                if drive.exists() {
                    roots.push(drive);
                }
            }
        } else {
            roots.push(PathBuf::from("/"));
        }
        if self.include_home && !cfg!(windows) {
            if let Some(home) = dirs::home_dir() {
                roots.push(home);
            }
        }
        roots
    }
}

impl DirectoryEnumerator for LocalFs {
    fn list_roots(&self) -> Result<Vec<DirEntry>> {
        let candidates = if self.roots.is_empty() {
            self.platform_roots()
        } else {
            self.roots.clone()
        };

        let mut entries: Vec<DirEntry> = Vec::new();
        for candidate in candidates {
            let path = match self.resolve(&candidate) {
                Ok(p) => p,
                Err(e) => {
                    debug!("Skipping root {}: {}", candidate.display(), e);
                    continue;
                }
            };
            if entries.iter().any(|e| e.path == path) {
                continue;
            }
            match DirEntry::from_path(&path) {
                Ok(entry) if entry.is_dir => entries.push(entry),
                Ok(_) => debug!("Skipping root {}: not a directory", path.display()),
                Err(e) => debug!("Skipping root {}: {}", path.display(), e),
            }
        }
        Ok(entries)
    }

    /// Unreadable individual entries and broken symlinks are skipped.
    fn list_directory(&self, path: &Path) -> Result<Listing> {
        let read_dir = fs::read_dir(path).map_err(|e| AppError::from_io(path, e))?;

        let mut entries = Vec::new();
        for item in read_dir {
            let item = match item {
                Ok(i) => i,
                Err(_) => continue,
            };
            let entry = match DirEntry::from_path(&item.path()) {
                Ok(e) => e,
                Err(_) => continue,
            };
            if !self.show_hidden && entry.is_hidden() {
                continue;
            }
            entries.push(entry);
        }

        Ok(Listing::from_entries(entries))
    }

    fn entry(&self, path: &Path) -> Result<DirEntry> {
        DirEntry::from_path(path)
    }

    fn resolve(&self, path: &Path) -> Result<PathBuf> {
        fs::canonicalize(path).map_err(|e| AppError::from_io(path, e))
    }
}

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local, TimeZone};

use crate::error::{AppError, Result};

/// Immutable metadata snapshot of a filesystem entry, taken at discovery time.
///
/// A node keeps the snapshot it was created with; re-discovering the same
/// path produces a fresh `DirEntry` rather than updating this one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub path: PathBuf,
    pub name: String,
    pub is_dir: bool,
    /// Byte size. `None` for directories.
    pub size: Option<u64>,
    pub modified: Option<SystemTime>,
    /// Extension without the dot. `None` for directories.
    pub extension: Option<String>,
}

impl DirEntry {
    /// Snapshot the metadata of `path`, following symlinks.
    pub fn from_path(path: &Path) -> Result<Self> {
        let metadata = fs::metadata(path).map_err(|e| AppError::from_io(path, e))?;
        let is_dir = metadata.is_dir();
        let mut entry = if is_dir {
            Self::directory(path)
        } else {
            Self::file(path, metadata.len())
        };
        entry.modified = metadata.modified().ok();
        Ok(entry)
    }

    /// Directory entry with no timestamp.
    pub fn directory(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            name: display_name(path),
            is_dir: true,
            size: None,
            modified: None,
            extension: None,
        }
    }

    /// File entry with no timestamp.
    pub fn file(path: &Path, size: u64) -> Self {
        Self {
            path: path.to_path_buf(),
            name: display_name(path),
            is_dir: false,
            size: Some(size),
            modified: None,
            extension: path
                .extension()
                .map(|ext| ext.to_string_lossy().to_string()),
        }
    }

    /// Whether the name marks a hidden (dot) entry.
    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('.')
    }

    /// Key used to order siblings: case-insensitive name, exact name as tie-break.
    pub fn sort_key(&self) -> (String, &str) {
        (self.name.to_lowercase(), self.name.as_str())
    }

    /// Human readable size ("1.5 KB"). Empty for directories.
    pub fn formatted_size(&self) -> String {
        const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

        let size = match (self.is_dir, self.size) {
            (false, Some(size)) => size,
            _ => return String::new(),
        };

        let mut value = size as f64;
        let mut unit = 0;
        while value >= 1024.0 && unit < UNITS.len() - 1 {
            value /= 1024.0;
            unit += 1;
        }
        format!("{:.1} {}", value, UNITS[unit])
    }

    /// Local modification time as `dd.mm.yyyy HH:MM`, or `N/A` when unknown.
    pub fn formatted_date(&self) -> String {
        self.formatted_date_in(&Local)
    }

    fn formatted_date_in<Tz: TimeZone>(&self, tz: &Tz) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        match self.modified {
            Some(modified) => DateTime::<chrono::Utc>::from(modified)
                .with_timezone(tz)
                .format(DATE_FORMAT)
                .to_string(),
            None => "N/A".to_string(),
        }
    }
}

/// Display format for modification times, e.g. `05.03.2024 14:07`.
const DATE_FORMAT: &str = "%d.%m.%Y %H:%M";

/// Last path component, or the whole path for roots like `/` or `C:\`.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

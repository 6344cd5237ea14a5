use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::fs::tree::NodeId;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

/// Errors raised by the tree, its loader, and the directory enumerator.
#[derive(Debug, Error)]
pub enum AppError {
    /// The path does not exist on disk.
    #[error("Path not found: {}", .0.display())]
    PathNotFound(PathBuf),

    /// Listing or stat was refused by the OS.
    #[error("Permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    /// Any other I/O failure.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A root was created for a path the tree already tracks.
    #[error("Duplicate path: {}", .0.display())]
    DuplicatePath(PathBuf),

    /// A node handle that does not belong to the tree.
    #[error("Unknown node: {0}")]
    NodeNotFound(NodeId),

    /// Only directories are placed in the tree.
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// Invalid path provided by the user.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Configuration file could not be used.
    #[error("Config error: {0}")]
    Config(String),
}

impl AppError {
    /// Classify an I/O error raised while touching `path`.
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => AppError::PathNotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => AppError::PermissionDenied(path.to_path_buf()),
            _ => AppError::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }
}

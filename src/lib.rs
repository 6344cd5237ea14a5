//! Lazily materialized directory tree.
//!
//! [`fs::tree::Tree`] holds the nodes discovered so far and
//! [`fs::loader::TreeLoader`] grows it on demand through a
//! [`fs::enumerator::DirectoryEnumerator`].

pub mod config;
pub mod error;
pub mod fs;
pub mod logging;
pub mod render;

pub use error::{AppError, Result};
pub use fs::entry::DirEntry;
pub use fs::enumerator::{DirectoryEnumerator, Listing, LocalFs};
pub use fs::loader::TreeLoader;
pub use fs::tree::{Node, NodeId, Tree, VisibleRow};

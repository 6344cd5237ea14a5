use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{AppError, Result};
use crate::fs::entry::DirEntry;
use crate::fs::enumerator::DirectoryEnumerator;
use crate::fs::tree::{NodeId, Tree};

/// Populates a [`Tree`] on demand from a [`DirectoryEnumerator`].
///
/// Each directory is listed at most once per load cycle; a cycle starts with
/// [`TreeLoader::load_roots`]. Expansion and load state live on the nodes
/// themselves, so the loader holds nothing but the enumerator.
///
/// Operations come in pairs: `try_*` returns the enumeration error, the plain
/// form logs it and leaves the affected node unloaded.
pub struct TreeLoader<E> {
    enumerator: E,
}

impl<E: DirectoryEnumerator> TreeLoader<E> {
    pub fn new(enumerator: E) -> Self {
        Self { enumerator }
    }

    pub fn enumerator(&self) -> &E {
        &self.enumerator
    }

    /// Rebuild the tree from scratch with one root per enumerator root.
    ///
    /// Returns the number of roots created.
    pub fn load_roots(&self, tree: &mut Tree) -> usize {
        tree.clear();

        let entries = match self.enumerator.list_roots() {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to list roots: {}", e);
                return 0;
            }
        };

        let mut created = 0;
        for entry in entries {
            match tree.create_root(entry) {
                Ok(_) => created += 1,
                Err(e) => debug!("Skipping root: {}", e),
            }
        }
        debug!("Loaded {} roots", created);
        created
    }

    /// Children of `id`, listing its directory the first time only.
    ///
    /// On failure the node stays unloaded so a later call can retry.
    pub fn try_load_children(&self, tree: &mut Tree, id: NodeId) -> Result<Vec<NodeId>> {
        let node = tree.get(id).ok_or(AppError::NodeNotFound(id))?;
        if node.is_loaded {
            return Ok(node.children.clone());
        }
        let path = node.entry.path.clone();

        debug!("Listing {}", path.display());
        let listing = self.enumerator.list_directory(&path)?;
        for dir in listing.directories {
            tree.attach_child(id, dir)?;
        }

        if let Some(node) = tree.get_mut(id) {
            node.is_loaded = true;
        }
        Ok(tree.children(id).to_vec())
    }

    pub fn load_children(&self, tree: &mut Tree, id: NodeId) -> Vec<NodeId> {
        self.try_load_children(tree, id).unwrap_or_else(|e| {
            warn!("Failed to load children: {}", e);
            Vec::new()
        })
    }

    /// Flip expansion; returns the new state. Collapsing keeps loaded children.
    pub fn try_toggle_expansion(&self, tree: &mut Tree, id: NodeId) -> Result<bool> {
        let node = tree.get(id).ok_or(AppError::NodeNotFound(id))?;
        if node.is_expanded {
            self.collapse(tree, id);
            Ok(false)
        } else {
            self.try_expand(tree, id)?;
            Ok(true)
        }
    }

    pub fn toggle_expansion(&self, tree: &mut Tree, id: NodeId) -> bool {
        match self.try_toggle_expansion(tree, id) {
            Ok(expanded) => expanded,
            Err(e) => {
                warn!("Failed to expand: {}", e);
                tree.get(id).map(|n| n.is_expanded).unwrap_or(false)
            }
        }
    }

    /// Expand `id` and load its children if needed. No-op when already expanded.
    ///
    /// The node stays expanded even if loading fails.
    pub fn try_expand(&self, tree: &mut Tree, id: NodeId) -> Result<()> {
        let node = tree.get_mut(id).ok_or(AppError::NodeNotFound(id))?;
        if node.is_expanded {
            return Ok(());
        }
        node.is_expanded = true;
        if !node.is_loaded {
            self.try_load_children(tree, id)?;
        }
        Ok(())
    }

    pub fn expand(&self, tree: &mut Tree, id: NodeId) {
        if let Err(e) = self.try_expand(tree, id) {
            warn!("Failed to expand: {}", e);
        }
    }

    pub fn collapse(&self, tree: &mut Tree, id: NodeId) {
        if let Some(node) = tree.get_mut(id) {
            node.is_expanded = false;
        }
    }

    /// Make `path` present in the tree with every ancestor expanded.
    ///
    /// The walk starts at the deepest root containing `path`, or at the
    /// filesystem root (created if missing). Directories the enumerator has
    /// not reported are added from a fresh stat. The returned node itself is
    /// not expanded.
    pub fn try_reveal_path(&self, tree: &mut Tree, path: &Path) -> Result<NodeId> {
        let target = self.enumerator.resolve(path)?;
        let target_entry = self.enumerator.entry(&target)?;
        if !target_entry.is_dir {
            return Err(AppError::NotADirectory(target));
        }

        let mut chain: Vec<&Path> = target
            .ancestors()
            .filter(|p| !p.as_os_str().is_empty())
            .collect();
        chain.reverse();

        let start = chain.iter().rposition(|p| {
            tree.find_by_path(p)
                .map(|id| tree.is_root(id))
                .unwrap_or(false)
        });
        let (mut current, rest) = match start {
            Some(i) => (self.existing(tree, chain[i])?, &chain[i + 1..]),
            None => {
                let top = chain[0];
                let id = match tree.find_by_path(top) {
                    Some(id) => id,
                    None => {
                        debug!("Creating root {}", top.display());
                        tree.create_root(self.enumerator.entry(top)?)?
                    }
                };
                (id, &chain[1..])
            }
        };

        for step in rest {
            self.try_expand(tree, current)?;
            self.try_load_children(tree, current)?;

            let found = tree
                .children(current)
                .iter()
                .copied()
                .find(|c| tree.get(*c).map(|n| n.path() == *step).unwrap_or(false));
            current = match found {
                Some(child) => child,
                None => {
                    debug!("Adding unlisted directory {}", step.display());
                    let entry = self.enumerator.entry(step)?;
                    tree.attach_child(current, entry)?
                }
            };
        }

        Ok(current)
    }

    pub fn reveal_path(&self, tree: &mut Tree, path: &Path) -> Option<NodeId> {
        match self.try_reveal_path(tree, path) {
            Ok(id) => Some(id),
            Err(e) => {
                warn!("Cannot reveal {}: {}", path.display(), e);
                None
            }
        }
    }

    fn existing(&self, tree: &Tree, path: &Path) -> Result<NodeId> {
        tree.find_by_path(path)
            .ok_or_else(|| AppError::PathNotFound(path.to_path_buf()))
    }

    /// Rebuild from disk and restore the expanded set.
    ///
    /// Paths that no longer exist are dropped. Returns how many expanded
    /// directories were restored.
    pub fn refresh(&self, tree: &mut Tree) -> usize {
        let expanded = tree.expanded_paths();
        self.load_roots(tree);

        let mut restored = 0;
        for path in &expanded {
            match self.try_reveal_path(tree, path) {
                Ok(id) => {
                    self.expand(tree, id);
                    restored += 1;
                }
                Err(e) => debug!("Not restoring {}: {}", path.display(), e),
            }
        }

        // Revealing expands ancestors that may have been collapsed before.
        let keep: HashSet<&PathBuf> = expanded.iter().collect();
        let extra: Vec<NodeId> = tree
            .iter()
            .filter(|n| n.is_expanded && !keep.contains(&n.entry.path))
            .map(|n| n.id)
            .collect();
        for id in extra {
            self.collapse(tree, id);
        }

        restored
    }

    /// Files directly inside the directory of `id`. Never added to the tree.
    pub fn files_in(&self, tree: &Tree, id: NodeId) -> Result<Vec<DirEntry>> {
        let node = tree.get(id).ok_or(AppError::NodeNotFound(id))?;
        Ok(self.enumerator.list_directory(node.path())?.files)
    }
}

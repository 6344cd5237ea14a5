use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{AppError, Result};
use crate::fs::entry::DirEntry;

/// Stable handle of a node within one [`Tree`].
///
/// Ids are handed out in increasing order and never reused until the tree
/// is cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A directory placed in the tree.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub entry: DirEntry,
    /// Child directories, ordered case-insensitively by name.
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    /// Whether children should be shown. Independent of `is_loaded`.
    pub is_expanded: bool,
    /// Whether children have been fetched in the current load cycle.
    pub is_loaded: bool,
}

impl Node {
    pub fn path(&self) -> &Path {
        &self.entry.path
    }

    pub fn name(&self) -> &str {
        &self.entry.name
    }
}

/// A visible node decorated for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleRow {
    pub id: NodeId,
    pub depth: usize,
    pub is_last_sibling: bool,
}

/// Owner of every node: the root list, the path index and the id counter.
///
/// Nodes refer to each other by [`NodeId`] only, so parent back-links do not
/// form ownership cycles.
#[derive(Debug, Default)]
pub struct Tree {
    nodes: HashMap<NodeId, Node>,
    roots: Vec<NodeId>,
    by_path: HashMap<PathBuf, NodeId>,
    next_id: u64,
}

fn sibling_order(a: &DirEntry, b: &DirEntry) -> Ordering {
    a.sort_key().cmp(&b.sort_key())
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, entry: DirEntry, parent: Option<NodeId>) -> NodeId {
        self.next_id += 1;
        let id = NodeId(self.next_id);
        self.by_path.insert(entry.path.clone(), id);
        self.nodes.insert(
            id,
            Node {
                id,
                entry,
                children: Vec::new(),
                parent,
                is_expanded: false,
                is_loaded: false,
            },
        );
        id
    }

    /// Add a top-level node. The path must not be tracked yet.
    pub fn create_root(&mut self, entry: DirEntry) -> Result<NodeId> {
        if !entry.is_dir {
            return Err(AppError::NotADirectory(entry.path));
        }
        if self.by_path.contains_key(&entry.path) {
            return Err(AppError::DuplicatePath(entry.path));
        }
        let id = self.alloc(entry, None);
        self.roots.push(id);
        Ok(id)
    }

    /// Place a directory under `parent`, keeping siblings sorted.
    ///
    /// If the path is already tracked the existing node is returned and, when
    /// it hangs elsewhere, moved under `parent`. Roots are never moved, and a
    /// move that would make a node its own ancestor is refused.
    pub fn attach_child(&mut self, parent: NodeId, entry: DirEntry) -> Result<NodeId> {
        if !entry.is_dir {
            return Err(AppError::NotADirectory(entry.path));
        }
        if !self.nodes.contains_key(&parent) {
            return Err(AppError::NodeNotFound(parent));
        }

        let Some(existing) = self.by_path.get(&entry.path).copied() else {
            let id = self.alloc(entry, Some(parent));
            self.insert_sorted(parent, id);
            return Ok(id);
        };

        if self.parent(existing) == Some(parent) || self.is_root(existing) {
            return Ok(existing);
        }
        if self.is_ancestor_or_self(existing, parent) {
            warn!(
                "Refusing to move {} under its own descendant",
                entry.path.display()
            );
            return Ok(existing);
        }

        debug!("Re-parenting {} under {}", entry.path.display(), parent);
        self.detach(existing);
        if let Some(node) = self.nodes.get_mut(&existing) {
            node.parent = Some(parent);
        }
        self.insert_sorted(parent, existing);
        Ok(existing)
    }

    fn insert_sorted(&mut self, parent: NodeId, child: NodeId) {
        let Some(child_entry) = self.nodes.get(&child).map(|n| n.entry.clone()) else {
            return;
        };
        let Some(siblings) = self.nodes.get(&parent).map(|n| &n.children) else {
            return;
        };
        let pos = siblings.partition_point(|s| {
            self.nodes
                .get(s)
                .map(|n| sibling_order(&n.entry, &child_entry) == Ordering::Less)
                .unwrap_or(true)
        });
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.insert(pos, child);
        }
    }

    /// Unlink a node from its parent's child list.
    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.parent(id) {
            if let Some(node) = self.nodes.get_mut(&parent) {
                node.children.retain(|c| *c != id);
            }
        }
    }

    /// Remove a root and its whole subtree. Returns `false` if `id` is not a root.
    pub fn remove_root(&mut self, id: NodeId) -> bool {
        let Some(pos) = self.roots.iter().position(|r| *r == id) else {
            return false;
        };
        self.roots.remove(pos);

        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                self.by_path.remove(&node.entry.path);
                stack.extend(node.children);
            }
        }
        true
    }

    pub fn find_by_path(&self, path: &Path) -> Option<NodeId> {
        self.by_path.get(path).copied()
    }

    /// Alias of [`Tree::get`]; ids index the arena directly.
    pub fn find_by_id(&self, id: NodeId) -> Option<&Node> {
        self.get(id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Child ids of `id`; empty for unknown or unloaded nodes.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(&id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    pub fn is_root(&self, id: NodeId) -> bool {
        self.roots.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Number of parent hops up to a root.
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.parent(id);
        while let Some(parent) = current {
            depth += 1;
            current = self.parent(parent);
        }
        depth
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// What a renderer should display, in pre-order.
    ///
    /// A node's children are listed only while it is both expanded and
    /// loaded, so a collapsed ancestor hides its whole subtree.
    pub fn visible_nodes(&self) -> Vec<NodeId> {
        self.visible_rows().into_iter().map(|row| row.id).collect()
    }

    /// [`Tree::visible_nodes`] with depth and last-sibling markers.
    pub fn visible_rows(&self) -> Vec<VisibleRow> {
        let mut rows = Vec::new();
        for (i, root) in self.roots.iter().enumerate() {
            self.collect_visible(*root, 0, i == self.roots.len() - 1, &mut rows);
        }
        rows
    }

    fn collect_visible(&self, id: NodeId, depth: usize, is_last: bool, rows: &mut Vec<VisibleRow>) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        rows.push(VisibleRow {
            id,
            depth,
            is_last_sibling: is_last,
        });
        if node.is_expanded && node.is_loaded {
            for (i, child) in node.children.iter().enumerate() {
                let is_last_child = i == node.children.len() - 1;
                self.collect_visible(*child, depth + 1, is_last_child, rows);
            }
        }
    }

    /// Paths of every expanded node, ancestors before descendants.
    ///
    /// Collapsed ancestors do not hide expanded descendants here.
    pub fn expanded_paths(&self) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            if node.is_expanded {
                paths.push(node.entry.path.clone());
            }
            stack.extend(node.children.iter().rev().copied());
        }
        paths
    }

    /// Drop every node and restart ids from 1.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.roots.clear();
        self.by_path.clear();
        self.next_id = 0;
    }
}

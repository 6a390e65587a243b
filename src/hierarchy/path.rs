use std::collections::HashMap;

use tracing::debug;

use super::{
    bounds::Bounds,
    hierarchy_model::{HierarchySnapshot, Node, NodeId},
};

/// Snapshot-scoped bidirectional map between nodes and canonical paths.
///
/// A canonical path is the `/`-joined list of `class[index]` segments from
/// the root, with an empty leading segment, so every path starts with `/`.
/// Rebuilt per selection cycle; never carried across snapshots.
#[derive(Debug, Clone)]
pub struct PathIndex {
    node_to_path: Vec<String>,
    path_to_node: HashMap<String, NodeId>,
}

impl PathIndex {
    /// Pre-order walk from the root with an empty prefix.
    pub fn build(snapshot: &HierarchySnapshot) -> PathIndex {
        let mut node_to_path = vec![String::new(); snapshot.len()];
        let mut path_to_node = HashMap::with_capacity(snapshot.len());

        if snapshot.is_empty() {
            return PathIndex {
                node_to_path,
                path_to_node,
            };
        }

        let mut stack = vec![(snapshot.root(), String::new())];

        while let Some((id, prefix)) = stack.pop() {
            let path = format!("{}/{}", prefix, segment(snapshot.node(id)));

            for child in snapshot.children(id).iter().rev() {
                stack.push((*child, path.clone()));
            }

            // Siblings sharing class and index collide; first in pre-order keeps the inverse entry.
            if path_to_node.contains_key(&path) {
                debug!(path = %path, "duplicate canonical path in snapshot");
            } else {
                path_to_node.insert(path.clone(), id);
            }
            node_to_path[id.0] = path;
        }

        PathIndex {
            node_to_path,
            path_to_node,
        }
    }

    pub fn path_of(&self, id: NodeId) -> Option<&str> {
        self.node_to_path
            .get(id.0)
            .filter(|p| !p.is_empty())
            .map(String::as_str)
    }

    pub fn node_at(&self, path: &str) -> Option<NodeId> {
        self.path_to_node.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.path_to_node.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path_to_node.is_empty()
    }

    /// Canonical path for `id`, or a prefixed best-effort path when the
    /// node is not covered by this index.
    pub fn element_path(&self, snapshot: &HierarchySnapshot, id: NodeId) -> String {
        if let Some(path) = self.path_of(id) {
            return path.to_string();
        }

        match snapshot.get(id) {
            Some(node) => fallback_path(node),
            None => format!("element/unknown[{}]", id.0),
        }
    }
}

/// `class[index]` segment for one node.
pub fn segment(node: &Node) -> String {
    format!("{}[{}]", node.class_name(), node.index())
}

/// Path built from the node alone, without parent context. The prefix
/// keeps it from ever matching a canonical path.
pub fn fallback_path(node: &Node) -> String {
    match node.attr("class") {
        Some(class) => format!("hierarchy/{}[{}]", class, node.index()),
        None => format!("element/{}[{}]", node.tag, node.index()),
    }
}

/// Walk `class[index]` segments from the root to re-locate an element in a
/// different snapshot.
pub fn find_by_path(snapshot: &HierarchySnapshot, path: &str) -> Option<NodeId> {
    if snapshot.is_empty() {
        return None;
    }

    let mut parts = path.split('/').filter(|p| !p.is_empty());

    let root = snapshot.root();
    if parts.next()? != segment(snapshot.node(root)) {
        return None;
    }

    let mut current = root;
    for part in parts {
        current = *snapshot
            .children(current)
            .iter()
            .find(|child| segment(snapshot.node(**child)) == part)?;
    }

    Some(current)
}

/// First node in pre-order whose bounds equal `target`.
pub fn find_by_bounds(snapshot: &HierarchySnapshot, target: Bounds) -> Option<NodeId> {
    snapshot
        .ids()
        .find(|id| snapshot.node(*id).bounds == Some(target))
}

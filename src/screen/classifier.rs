use std::collections::HashSet;

use crate::gesture::gesture_model::{CandidateClass, GestureKind};
use crate::hierarchy::hierarchy_model::{HierarchySnapshot, Node, NodeId};

const RECYCLER_MARKERS: [&str; 2] = ["recyclerview", "recycler"];
const HORIZONTAL_CLASSES: [&str; 4] = ["horizontalscrollview", "viewpager", "gallery", "carousel"];
const HORIZONTAL_IDS: [&str; 4] = ["horizontal", "gallery", "carousel", "viewpager"];
const LARGE_ELEMENT_PX: i32 = 500;

/// Candidate nodes for one gesture kind, in traversal order.
pub fn candidates_for(snapshot: &HierarchySnapshot, kind: GestureKind) -> Vec<NodeId> {
    classify(snapshot, kind.candidate_class())
}

pub fn classify(snapshot: &HierarchySnapshot, class: CandidateClass) -> Vec<NodeId> {
    if snapshot.is_empty() {
        return vec![];
    }

    match class {
        CandidateClass::Tappable => collect_post_order(snapshot, is_tappable),
        CandidateClass::LongPressable => collect_post_order(snapshot, is_long_pressable),
        CandidateClass::Swipeable => collect_swipeable(snapshot),
        CandidateClass::VerticallyScrollable => collect_post_order(snapshot, is_vertically_scrollable),
        CandidateClass::Zoomable => collect_post_order(snapshot, is_zoomable),
    }
}

// ============================================================================
// Predicates (every candidate must carry bounds)
// ============================================================================

pub fn is_tappable(node: &Node) -> bool {
    node.bounds.is_some() && node.clickable()
}

pub fn is_long_pressable(node: &Node) -> bool {
    node.bounds.is_some() && node.long_clickable()
}

pub fn is_swipeable(node: &Node) -> bool {
    node.bounds.is_some() && node.scrollable()
}

pub fn is_recycler_like(node: &Node) -> bool {
    if node.bounds.is_none() {
        return false;
    }

    let class = node.attr_lower("class");
    let resource_id = node.attr_lower("resource-id");

    RECYCLER_MARKERS
        .iter()
        .any(|m| class.contains(m) || resource_id.contains(m))
}

pub fn is_vertically_scrollable(node: &Node) -> bool {
    let bounds = match node.bounds {
        Some(b) => b,
        None => return false,
    };

    if !node.scrollable() {
        return false;
    }

    let class = node.attr_lower("class");
    if HORIZONTAL_CLASSES.iter().any(|h| class.contains(h)) {
        return false;
    }

    let resource_id = node.attr_lower("resource-id");
    if HORIZONTAL_IDS.iter().any(|h| resource_id.contains(h)) {
        return false;
    }

    if node.flag("horizontal") {
        return false;
    }

    f64::from(bounds.width()) <= f64::from(bounds.height()) * 1.5
}

pub fn is_zoomable(node: &Node) -> bool {
    if node.bounds.is_none() {
        return false;
    }

    let class = node.attr_lower("class");
    let resource_id = node.attr_lower("resource-id");
    let content_desc = node.attr_lower("content-desc");

    let image_view = class.contains("imageview")
        || resource_id.contains("image")
        || resource_id.contains("photo")
        || resource_id.contains("picture");

    let map_view = class.contains("mapview")
        || class.contains("map")
        || resource_id.contains("map")
        || content_desc.contains("map");

    let web_view = class.contains("webview") || resource_id.contains("web");

    let zoom_controls = resource_id.contains("zoom") || content_desc.contains("zoom");

    let document_viewer = ["pdf", "document", "viewer"]
        .iter()
        .any(|k| class.contains(k) || resource_id.contains(k));

    let gallery_viewer = class.contains("gallery")
        || resource_id.contains("gallery")
        || class.contains("photo")
        || class.contains("viewer");

    map_view
        || web_view
        || zoom_controls
        || document_viewer
        || gallery_viewer
        || (is_large_element(node) && (image_view || gallery_viewer))
}

/// Strictly larger than 500x500 px.
pub fn is_large_element(node: &Node) -> bool {
    node.bounds
        .map(|b| b.width() > LARGE_ELEMENT_PX && b.height() > LARGE_ELEMENT_PX)
        .unwrap_or(false)
}

// ============================================================================
// Traversals
// ============================================================================

/// Children before parent; each node emitted at most once.
fn collect_post_order(snapshot: &HierarchySnapshot, predicate: fn(&Node) -> bool) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut added = HashSet::new();

    // (node, children already expanded)
    let mut stack = vec![(snapshot.root(), false)];

    while let Some((id, expanded)) = stack.pop() {
        if expanded {
            if predicate(snapshot.node(id)) && added.insert(id) {
                out.push(id);
            }
            continue;
        }

        stack.push((id, true));
        for child in snapshot.children(id).iter().rev() {
            stack.push((*child, false));
        }
    }

    out
}

/// Pre-order walk where a recycler-like container contributes itself, and
/// each bounded direct child is emitted just before its own subtree is walked.
fn collect_swipeable(snapshot: &HierarchySnapshot) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut added = HashSet::new();
    visit_swipeable(snapshot, snapshot.root(), &mut out, &mut added);
    out
}

fn visit_swipeable(
    snapshot: &HierarchySnapshot,
    id: NodeId,
    out: &mut Vec<NodeId>,
    added: &mut HashSet<NodeId>,
) {
    let node = snapshot.node(id);

    if is_swipeable(node) && added.insert(id) {
        out.push(id);
    }

    let recycler = is_recycler_like(node);
    if recycler && added.insert(id) {
        out.push(id);
    }

    for child in snapshot.children(id) {
        if recycler && snapshot.node(*child).bounds.is_some() && added.insert(*child) {
            out.push(*child);
        }
        visit_swipeable(snapshot, *child, out, added);
    }
}

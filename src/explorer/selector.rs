use crate::gesture::gesture_model::{ActionId, GestureKind};
use crate::hierarchy::{
    hierarchy_model::{HierarchySnapshot, NodeId},
    path::PathIndex,
};
use crate::screen::classifier::candidates_for;
use crate::state::progress::VisitedTracker;

/// The single next target chosen for a screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub kind: GestureKind,
    pub node: NodeId,
    pub path: String,
    pub action: ActionId,
}

/// First unvisited (kind, node) pair, trying kinds in priority order and
/// candidates in classifier order. `None` means the screen is drained.
///
/// The path index is rebuilt from `snapshot` on every call.
pub fn next_candidate(snapshot: &HierarchySnapshot, tracker: &VisitedTracker, screen: &str) -> Option<Candidate> {
    let index = PathIndex::build(snapshot);

    for kind in GestureKind::ALL {
        for node in candidates_for(snapshot, kind) {
            let path = index.element_path(snapshot, node);
            let action = ActionId::new(kind, &path);

            if !tracker.has_visited(screen, &action) {
                return Some(Candidate {
                    kind,
                    node,
                    path,
                    action,
                });
            }
        }
    }

    None
}

/// Every candidate of every kind, in selection order.
pub fn all_candidates(snapshot: &HierarchySnapshot) -> Vec<Candidate> {
    let index = PathIndex::build(snapshot);

    GestureKind::ALL
        .iter()
        .flat_map(|kind| {
            let index = &index;
            candidates_for(snapshot, *kind).into_iter().map(move |node| {
                let path = index.element_path(snapshot, node);
                Candidate {
                    kind: *kind,
                    node,
                    action: ActionId::new(*kind, &path),
                    path,
                }
            })
        })
        .collect()
}

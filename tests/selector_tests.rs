use tempfile::TempDir;
use ui_prober::explorer::selector::{all_candidates, next_candidate};
use ui_prober::gesture::gesture_model::{ActionId, GestureKind};
use ui_prober::hierarchy::hierarchy_model::{HierarchySnapshot, NodeId};
use ui_prober::state::progress::VisitedTracker;

use crate::common::fixtures::{FEED_XML, SINGLE_BUTTON_XML};

mod common;

const SCREEN: &str = "Feed";
const RECYCLER_PATH: &str =
    "/hierarchy[0]/android.widget.FrameLayout[0]/androidx.recyclerview.widget.RecyclerView[0]";

fn more_button_path() -> String {
    format!(
        "{}/android.widget.LinearLayout[0]/android.widget.ImageButton[1]",
        RECYCLER_PATH
    )
}

fn tracker(dir: &TempDir) -> VisitedTracker {
    VisitedTracker::new(dir.path(), "com.example.app")
}

// =========================================================================
// Selection order
// =========================================================================

#[test]
fn first_pick_is_deepest_tappable() {
    let dir = TempDir::new().unwrap();
    let snapshot = HierarchySnapshot::parse(FEED_XML).unwrap();

    let pick = next_candidate(&snapshot, &tracker(&dir), SCREEN).unwrap();
    assert_eq!(pick.kind, GestureKind::Tap);
    assert_eq!(pick.node, NodeId(5));
    assert_eq!(pick.path, more_button_path());
    assert_eq!(pick.action, ActionId::new(GestureKind::Tap, &more_button_path()));
}

#[test]
fn visited_actions_are_never_picked_again() {
    let dir = TempDir::new().unwrap();
    let snapshot = HierarchySnapshot::parse(FEED_XML).unwrap();
    let mut tracker = tracker(&dir);

    let mut seen = Vec::new();
    while let Some(pick) = next_candidate(&snapshot, &tracker, SCREEN) {
        assert!(!seen.contains(&pick.action), "{} picked twice", pick.action);
        seen.push(pick.action.clone());
        tracker.mark_visited(SCREEN, pick.action);
    }

    // every candidate of every kind, in the same order as the full listing
    let all: Vec<ActionId> = all_candidates(&snapshot).into_iter().map(|c| c.action).collect();
    assert_eq!(seen, all);
}

#[test]
fn kinds_are_tried_in_priority_order() {
    let dir = TempDir::new().unwrap();
    let snapshot = HierarchySnapshot::parse(FEED_XML).unwrap();
    let mut tracker = tracker(&dir);

    for c in all_candidates(&snapshot) {
        if matches!(c.kind, GestureKind::Tap | GestureKind::DoubleTap | GestureKind::LongPress) {
            tracker.mark_visited(SCREEN, c.action);
        }
    }

    let pick = next_candidate(&snapshot, &tracker, SCREEN).unwrap();
    assert_eq!(pick.kind, GestureKind::SwipeLeft);
    assert_eq!(pick.node, NodeId(2));
    assert_eq!(pick.path, RECYCLER_PATH);
}

#[test]
fn progress_of_another_screen_is_ignored() {
    let dir = TempDir::new().unwrap();
    let snapshot = HierarchySnapshot::parse(FEED_XML).unwrap();
    let mut tracker = tracker(&dir);
    tracker.mark_visited("Other", ActionId::new(GestureKind::Tap, &more_button_path()));

    let pick = next_candidate(&snapshot, &tracker, SCREEN).unwrap();
    assert_eq!(pick.node, NodeId(5));
    assert_eq!(pick.kind, GestureKind::Tap);
}

#[test]
fn drained_screen_yields_none() {
    let dir = TempDir::new().unwrap();
    let snapshot = HierarchySnapshot::parse(SINGLE_BUTTON_XML).unwrap();
    let mut tracker = tracker(&dir);

    tracker.mark_visited(SCREEN, ActionId::new(GestureKind::Tap, "/ButtonClass[0]"));
    assert_eq!(
        next_candidate(&snapshot, &tracker, SCREEN).unwrap().action.as_str(),
        "double_tap//ButtonClass[0]"
    );

    tracker.mark_visited(SCREEN, ActionId::new(GestureKind::DoubleTap, "/ButtonClass[0]"));
    assert!(next_candidate(&snapshot, &tracker, SCREEN).is_none());
}

#[test]
fn screen_without_candidates_is_drained() {
    let dir = TempDir::new().unwrap();
    let snapshot = HierarchySnapshot::parse(r#"<node class="Text" index="0" bounds="[0,0][10,10]"/>"#).unwrap();
    assert!(next_candidate(&snapshot, &tracker(&dir), SCREEN).is_none());
    assert!(all_candidates(&snapshot).is_empty());
}

// =========================================================================
// Full listing
// =========================================================================

#[test]
fn all_candidates_on_feed() {
    let snapshot = HierarchySnapshot::parse(FEED_XML).unwrap();
    let listing: Vec<(GestureKind, usize)> = all_candidates(&snapshot)
        .into_iter()
        .map(|c| (c.kind, c.node.0))
        .collect();

    assert_eq!(
        listing,
        vec![
            (GestureKind::Tap, 5),
            (GestureKind::Tap, 3),
            (GestureKind::Tap, 6),
            (GestureKind::DoubleTap, 5),
            (GestureKind::DoubleTap, 3),
            (GestureKind::DoubleTap, 6),
            (GestureKind::LongPress, 5),
            (GestureKind::SwipeLeft, 2),
            (GestureKind::SwipeLeft, 3),
            (GestureKind::SwipeLeft, 6),
            (GestureKind::SwipeLeft, 7),
            (GestureKind::SwipeRight, 2),
            (GestureKind::SwipeRight, 3),
            (GestureKind::SwipeRight, 6),
            (GestureKind::SwipeRight, 7),
            (GestureKind::ScrollUp, 2),
            (GestureKind::ScrollDown, 2),
            (GestureKind::PinchZoomIn, 8),
            (GestureKind::PinchZoomOut, 8),
        ]
    );
}

use rand::Rng;

use crate::hierarchy::{
    bounds::{Bounds, Point},
    hierarchy_model::{HierarchySnapshot, NodeId},
};

use super::gesture_model::{
    GestureKind, GesturePlan, InteractiveFilter, PinchGeometry, ScreenSize, TargetStrategy,
};

pub const SAFE_POINT_ATTEMPTS: usize = 10;

const PINCH_NEAR_RATIO: f64 = 0.15;
const PINCH_FAR_RATIO: f64 = 0.45;

/// Turn a selected element into concrete device coordinates.
///
/// Returns `None` when the node has no bounds; such nodes are never
/// candidates, so this only happens for a stale id.
pub fn plan_gesture<R: Rng + ?Sized>(
    kind: GestureKind,
    snapshot: &HierarchySnapshot,
    id: NodeId,
    screen: ScreenSize,
    rng: &mut R,
) -> Option<GesturePlan> {
    let bounds = snapshot.get(id)?.bounds?;

    let start = match kind.target_strategy() {
        TargetStrategy::Center => bounds.center(),
        TargetStrategy::SafeRandom(filter) => {
            let exclusions = interactive_descendant_bounds(snapshot, id, filter);
            safe_random_point(bounds, &exclusions, rng)
        }
    };

    let plan = match kind {
        GestureKind::Tap => GesturePlan::Tap { point: start },
        GestureKind::DoubleTap => GesturePlan::DoubleTap { point: start },
        GestureKind::LongPress => GesturePlan::LongPress { point: start },
        GestureKind::SwipeLeft
        | GestureKind::SwipeRight
        | GestureKind::ScrollUp
        | GestureKind::ScrollDown => {
            let (dx, dy) = kind.drag_offset()?;
            GesturePlan::Drag {
                start,
                end: start.offset(dx, dy),
            }
        }
        GestureKind::PinchZoomIn | GestureKind::PinchZoomOut => GesturePlan::Pinch {
            anchor: start,
            geometry: pinch_geometry(start, screen, kind.zoom_in()?),
        },
    };

    Some(plan)
}

/// Bounds of every bounded descendant that would itself react to the gesture.
pub fn interactive_descendant_bounds(
    snapshot: &HierarchySnapshot,
    id: NodeId,
    filter: InteractiveFilter,
) -> Vec<Bounds> {
    snapshot
        .descendants(id)
        .into_iter()
        .map(|d| snapshot.node(d))
        .filter(|n| match filter {
            InteractiveFilter::Clickable => n.clickable(),
            InteractiveFilter::ClickableOrLongClickable => n.clickable() || n.long_clickable(),
        })
        .filter_map(|n| n.bounds)
        .collect()
}

/// Uniform point inside `bounds` that avoids every exclusion rectangle.
///
/// Gives up after `SAFE_POINT_ATTEMPTS` draws and returns the exact
/// center, overlapping or not.
pub fn safe_random_point<R: Rng + ?Sized>(bounds: Bounds, exclusions: &[Bounds], rng: &mut R) -> Point {
    if bounds.x1 > bounds.x2 || bounds.y1 > bounds.y2 {
        return bounds.center();
    }

    for _ in 0..SAFE_POINT_ATTEMPTS {
        let candidate = Point::new(
            rng.gen_range(bounds.x1..=bounds.x2),
            rng.gen_range(bounds.y1..=bounds.y2),
        );

        if !exclusions.iter().any(|e| e.contains(candidate)) {
            return candidate;
        }
    }

    bounds.center()
}

/// Finger paths for a horizontal two-finger pinch around `anchor`.
///
/// Separation runs between 15% and 45% of the shorter screen side:
/// zoom-in spreads from near to far, zoom-out the reverse.
pub fn pinch_geometry(anchor: Point, screen: ScreenSize, zoom_in: bool) -> PinchGeometry {
    let short_side = f64::from(screen.width.min(screen.height));
    let near = short_side * PINCH_NEAR_RATIO;
    let far = short_side * PINCH_FAR_RATIO;

    let (start_distance, end_distance) = if zoom_in { (near, far) } else { (far, near) };

    let x = f64::from(anchor.x);
    let y = f64::from(anchor.y);

    let clamp = |px: f64, py: f64| {
        (
            px.clamp(0.0, f64::from(screen.width)),
            py.clamp(0.0, f64::from(screen.height)),
        )
    };

    PinchGeometry {
        finger1_start: clamp(x - start_distance / 2.0, y),
        finger1_end: clamp(x - end_distance / 2.0, y),
        finger2_start: clamp(x + start_distance / 2.0, y),
        finger2_end: clamp(x + end_distance / 2.0, y),
    }
}

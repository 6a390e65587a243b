use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::hierarchy::bounds::{Bounds, Point};

/// Gesture kinds in the fixed order the selector tries them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureKind {
    Tap,
    DoubleTap,
    LongPress,
    SwipeLeft,
    SwipeRight,
    ScrollUp,
    ScrollDown,
    PinchZoomIn,
    PinchZoomOut,
}

/// Which classifier predicate decides eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateClass {
    Tappable,
    LongPressable,
    Swipeable,
    VerticallyScrollable,
    Zoomable,
}

/// Which descendants must be avoided when sampling a touch point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractiveFilter {
    Clickable,
    ClickableOrLongClickable,
}

/// How the start point is derived from the element bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetStrategy {
    SafeRandom(InteractiveFilter),
    Center,
}

/// Which comparison decides whether the gesture changed the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleKind {
    /// before vs after hierarchy text
    Hierarchy,
    /// before vs during and before vs after hierarchy text
    HierarchyWithDuring,
    /// before/during/after screenshots
    Screenshot,
}

impl GestureKind {
    pub const ALL: [GestureKind; 9] = [
        GestureKind::Tap,
        GestureKind::DoubleTap,
        GestureKind::LongPress,
        GestureKind::SwipeLeft,
        GestureKind::SwipeRight,
        GestureKind::ScrollUp,
        GestureKind::ScrollDown,
        GestureKind::PinchZoomIn,
        GestureKind::PinchZoomOut,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GestureKind::Tap => "tap",
            GestureKind::DoubleTap => "double_tap",
            GestureKind::LongPress => "long_press",
            GestureKind::SwipeLeft => "swipe_left",
            GestureKind::SwipeRight => "swipe_right",
            GestureKind::ScrollUp => "scroll_up",
            GestureKind::ScrollDown => "scroll_down",
            GestureKind::PinchZoomIn => "pinch_zoom_in",
            GestureKind::PinchZoomOut => "pinch_zoom_out",
        }
    }

    pub fn candidate_class(self) -> CandidateClass {
        match self {
            GestureKind::Tap | GestureKind::DoubleTap => CandidateClass::Tappable,
            GestureKind::LongPress => CandidateClass::LongPressable,
            GestureKind::SwipeLeft | GestureKind::SwipeRight => CandidateClass::Swipeable,
            GestureKind::ScrollUp | GestureKind::ScrollDown => CandidateClass::VerticallyScrollable,
            GestureKind::PinchZoomIn | GestureKind::PinchZoomOut => CandidateClass::Zoomable,
        }
    }

    pub fn target_strategy(self) -> TargetStrategy {
        match self {
            GestureKind::Tap | GestureKind::DoubleTap => {
                TargetStrategy::SafeRandom(InteractiveFilter::Clickable)
            }
            GestureKind::LongPress => {
                TargetStrategy::SafeRandom(InteractiveFilter::ClickableOrLongClickable)
            }
            _ => TargetStrategy::Center,
        }
    }

    pub fn oracle(self) -> OracleKind {
        match self {
            GestureKind::LongPress => OracleKind::HierarchyWithDuring,
            GestureKind::PinchZoomIn | GestureKind::PinchZoomOut => OracleKind::Screenshot,
            _ => OracleKind::Hierarchy,
        }
    }

    /// Fixed drag offset for swipe/scroll kinds; down travels farther than up.
    pub fn drag_offset(self) -> Option<(i32, i32)> {
        match self {
            GestureKind::SwipeLeft => Some((-400, 0)),
            GestureKind::SwipeRight => Some((400, 0)),
            GestureKind::ScrollUp => Some((0, -800)),
            GestureKind::ScrollDown => Some((0, 1000)),
            _ => None,
        }
    }

    /// `Some(true)` for zoom-in, `Some(false)` for zoom-out.
    pub fn zoom_in(self) -> Option<bool> {
        match self {
            GestureKind::PinchZoomIn => Some(true),
            GestureKind::PinchZoomOut => Some(false),
            _ => None,
        }
    }

    /// Whether execution captures a mid-gesture "during" stage.
    pub fn captures_during(self) -> bool {
        matches!(
            self,
            GestureKind::LongPress | GestureKind::PinchZoomIn | GestureKind::PinchZoomOut
        )
    }
}

impl fmt::Display for GestureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GestureKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GestureKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown gesture kind '{}'", s))
    }
}

/// `gestureKind/canonicalPath`: the unit of "have we tried this".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionId(String);

impl ActionId {
    pub fn new(kind: GestureKind, path: &str) -> Self {
        ActionId(format!("{}/{}", kind.as_str(), path))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Device screen size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenSize {
    pub width: i32,
    pub height: i32,
}

/// Two-finger pinch geometry, all points clamped to the screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchGeometry {
    pub finger1_start: (f64, f64),
    pub finger1_end: (f64, f64),
    pub finger2_start: (f64, f64),
    pub finger2_end: (f64, f64),
}

/// Device-level coordinates for one selected gesture.
#[derive(Debug, Clone, PartialEq)]
pub enum GesturePlan {
    Tap { point: Point },
    DoubleTap { point: Point },
    LongPress { point: Point },
    Drag { start: Point, end: Point },
    Pinch { anchor: Point, geometry: PinchGeometry },
}

impl GesturePlan {
    /// The point the gesture is anchored at.
    pub fn start_point(&self) -> Point {
        match self {
            GesturePlan::Tap { point }
            | GesturePlan::DoubleTap { point }
            | GesturePlan::LongPress { point } => *point,
            GesturePlan::Drag { start, .. } => *start,
            GesturePlan::Pinch { anchor, .. } => *anchor,
        }
    }
}

/// Contents of `action.json` in an attempt directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub gesture: GestureKind,
    pub bounds: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tap_point: Option<[i32; 2]>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_point: Option<[i32; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_point: Option<[i32; 2]>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finger1_start_point: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finger1_end_point: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finger2_start_point: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finger2_end_point: Option<[f64; 2]>,
}

impl ActionRecord {
    pub fn from_plan(kind: GestureKind, bounds: Bounds, plan: &GesturePlan) -> Self {
        let mut record = ActionRecord {
            gesture: kind,
            bounds: bounds.to_string(),
            tap_point: None,
            start_point: None,
            end_point: None,
            finger1_start_point: None,
            finger1_end_point: None,
            finger2_start_point: None,
            finger2_end_point: None,
        };

        match plan {
            GesturePlan::Tap { point }
            | GesturePlan::DoubleTap { point }
            | GesturePlan::LongPress { point } => {
                record.tap_point = Some([point.x, point.y]);
            }
            GesturePlan::Drag { start, end } => {
                record.start_point = Some([start.x, start.y]);
                record.end_point = Some([end.x, end.y]);
            }
            GesturePlan::Pinch { geometry, .. } => {
                record.finger1_start_point = Some([geometry.finger1_start.0, geometry.finger1_start.1]);
                record.finger1_end_point = Some([geometry.finger1_end.0, geometry.finger1_end.1]);
                record.finger2_start_point = Some([geometry.finger2_start.0, geometry.finger2_start.1]);
                record.finger2_end_point = Some([geometry.finger2_end.0, geometry.finger2_end.1]);
            }
        }

        record
    }
}

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::device::gestures::GestureTimings;
use crate::device::wait::StabilityConfig;
use crate::gesture::gesture_model::{ActionId, GestureKind, GesturePlan};
use crate::oracle::view_oracle::DEFAULT_PIXEL_THRESHOLD;

use super::recovery::TeardownPolicy;

// ============================================================================
// Targets (what to explore)
// ============================================================================

/// One prerecorded tap on the way from the app's home state to a screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationStep {
    /// `[x1,y1][x2,y2]`; the tap lands on the center
    pub bounds: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenTarget {
    pub name: String,

    #[serde(default)]
    pub navigate: Vec<NavigationStep>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppTarget {
    pub package: String,

    /// Explored in list order
    #[serde(default)]
    pub screens: Vec<ScreenTarget>,
}

// ============================================================================
// Explorer configuration
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Failures of one action before it is skipped (default 3)
    pub max_attempt_failures: u32,

    /// Failed cycles in a row before the device is considered lost (default 10)
    pub max_consecutive_failures: u32,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            max_attempt_failures: 3,
            max_consecutive_failures: 10,
        }
    }
}

/// Everything one exploration run of an app needs besides the device.
#[derive(Debug, Clone)]
pub struct ExplorerConfig {
    pub app_package: String,
    pub dataset_dir: PathBuf,
    pub progress_dir: PathBuf,
    pub stability: StabilityConfig,
    pub timings: GestureTimings,
    pub pixel_threshold: f64,
    pub budget: BudgetConfig,

    /// Reset steps run after every attempt and between screens
    pub teardown: TeardownPolicy,
}

impl ExplorerConfig {
    pub fn new(app_package: impl Into<String>) -> Self {
        Self {
            app_package: app_package.into(),
            dataset_dir: PathBuf::from("dataset"),
            progress_dir: PathBuf::from("test_progress"),
            stability: StabilityConfig::default(),
            timings: GestureTimings::default(),
            pixel_threshold: DEFAULT_PIXEL_THRESHOLD,
            budget: BudgetConfig::default(),
            teardown: TeardownPolicy::default(),
        }
    }
}

// ============================================================================
// Loop state and results
// ============================================================================

/// Where the per-screen loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Selecting,
    Executing,
    Capturing,
    Judging,
    Recording,
    Resetting,
    Drained,
}

/// Result of one judged gesture.
#[derive(Debug, Clone)]
pub struct AttemptOutcome {
    pub action: ActionId,
    pub kind: GestureKind,
    pub path: String,
    pub plan: GesturePlan,

    /// `None` once discarded
    pub artifacts: Option<PathBuf>,
    pub changed: bool,

    pub before_fingerprint: Option<String>,
    pub after_fingerprint: Option<String>,
}

/// Summary of one screen's exploration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScreenReport {
    pub screen: String,
    pub attempts: usize,
    pub changed: usize,
    pub failures: usize,
    pub drained: bool,
}

impl ScreenReport {
    pub fn new(screen: &str) -> Self {
        Self {
            screen: screen.to_string(),
            attempts: 0,
            changed: 0,
            failures: 0,
            drained: false,
        }
    }
}

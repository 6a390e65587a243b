use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ProbeError;
use crate::gesture::gesture_model::ScreenSize;

/// One primitive step of a touch pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointerStep {
    Move { x: i32, y: i32, duration_ms: u64 },
    Down,
    Pause { ms: u64 },
    Up,
}

/// Steps for a single finger. Several tracks in one `perform` call run as
/// a multi-touch gesture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerTrack {
    pub id: String,
    pub steps: Vec<PointerStep>,
}

impl PointerTrack {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            steps: vec![],
        }
    }

    pub fn move_to(mut self, x: i32, y: i32) -> Self {
        self.steps.push(PointerStep::Move { x, y, duration_ms: 0 });
        self
    }

    pub fn move_over(mut self, x: i32, y: i32, duration_ms: u64) -> Self {
        self.steps.push(PointerStep::Move { x, y, duration_ms });
        self
    }

    pub fn down(mut self) -> Self {
        self.steps.push(PointerStep::Down);
        self
    }

    pub fn pause(mut self, ms: u64) -> Self {
        self.steps.push(PointerStep::Pause { ms });
        self
    }

    pub fn up(mut self) -> Self {
        self.steps.push(PointerStep::Up);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKey {
    Back,
    Home,
}

impl DeviceKey {
    pub fn keycode(self) -> &'static str {
        match self {
            DeviceKey::Back => "KEYCODE_BACK",
            DeviceKey::Home => "KEYCODE_HOME",
        }
    }
}

/// Primitives the exploration engine needs from a device automation server.
pub trait DeviceTransport {
    fn save_screenshot(&mut self, path: &Path) -> Result<(), ProbeError>;

    /// Serialized UI hierarchy of the current screen.
    fn page_source(&mut self) -> Result<String, ProbeError>;

    /// Package of the foreground app.
    fn current_package(&mut self) -> Result<String, ProbeError>;

    fn activate_app(&mut self, package: &str) -> Result<(), ProbeError>;

    fn terminate_app(&mut self, package: &str) -> Result<(), ProbeError>;

    fn window_size(&mut self) -> Result<ScreenSize, ProbeError>;

    fn perform(&mut self, tracks: &[PointerTrack]) -> Result<(), ProbeError>;

    /// Run a device shell command and return its output.
    fn shell(&mut self, command: &str) -> Result<String, ProbeError>;

    fn press_key(&mut self, key: DeviceKey) -> Result<(), ProbeError> {
        self.shell(&format!("input keyevent {}", key.keycode())).map(|_| ())
    }

    fn force_stop(&mut self, package: &str) -> Result<(), ProbeError> {
        self.shell(&format!("am force-stop {}", package)).map(|_| ())
    }
}

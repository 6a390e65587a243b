use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::transport::DeviceTransport;

/// Page-loaded barrier settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilityConfig {
    pub poll_interval_ms: u64,
    pub stable_polls: u32,
    pub timeout_ms: u64,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            stable_polls: 5,
            timeout_ms: 20_000,
        }
    }
}

/// Poll the hierarchy until it stops changing.
///
/// Returns true once `stable_polls` consecutive polls match the previous
/// one. On timeout returns false and the caller proceeds as if the screen
/// had loaded. A failed poll resets the streak.
pub fn wait_for_stable<T: DeviceTransport + ?Sized>(transport: &mut T, config: &StabilityConfig) -> bool {
    let start = Instant::now();
    let timeout = Duration::from_millis(config.timeout_ms);
    let interval = Duration::from_millis(config.poll_interval_ms);

    let mut previous: Option<String> = None;
    let mut streak = 0u32;

    while start.elapsed() < timeout {
        match transport.page_source() {
            Ok(source) => {
                if previous.as_deref() == Some(source.as_str()) {
                    streak += 1;
                    if streak >= config.stable_polls {
                        debug!(elapsed_ms = start.elapsed().as_millis() as u64, "screen stable");
                        return true;
                    }
                } else {
                    streak = 0;
                }
                previous = Some(source);
            }
            Err(e) => {
                debug!(error = %e, "hierarchy poll failed");
                streak = 0;
                previous = None;
            }
        }

        thread::sleep(interval);
    }

    warn!(timeout_ms = config.timeout_ms, "screen did not stabilize, assuming loaded");
    false
}

use tracing::{info, warn};

use crate::device::gestures::{GestureTimings, sleep_ms, tap_track};
use crate::device::transport::{DeviceKey, DeviceTransport};
use crate::device::wait::{StabilityConfig, wait_for_stable};
use crate::error::ProbeError;
use crate::hierarchy::bounds::Bounds;

use super::explorer_model::NavigationStep;

const CAMERA_MARKER: &str = "camera";
const FALLBACK_BACK_PRESSES: u32 = 3;
const FALLBACK_KEY_SETTLE_MS: u64 = 500;

/// One named step of the return-to-home teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownStep {
    /// Back key up to `times`; stops at the first error
    SoftBack { times: u32 },
    /// Home key up to `times`; stops at the first error
    Home { times: u32 },
    /// Terminate whatever is foreground when it is not the target
    TerminateForeground,
    TerminateTarget,
    /// `am force-stop` when the target or a camera app survived termination
    ForceStop,
}

/// Ordered, bounded teardown used to bring the device back to a clean
/// home state before re-navigating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeardownPolicy {
    pub steps: Vec<TeardownStep>,
}

impl Default for TeardownPolicy {
    fn default() -> Self {
        Self {
            steps: vec![
                TeardownStep::SoftBack { times: 2 },
                TeardownStep::Home { times: 1 },
                TeardownStep::TerminateForeground,
                TeardownStep::TerminateTarget,
                TeardownStep::ForceStop,
            ],
        }
    }
}

impl TeardownPolicy {
    /// Run every step against `package`.
    ///
    /// Key presses and force-stop failures are logged and tolerated. Failing
    /// to read the foreground app or to terminate the target is an error.
    pub fn run<T: DeviceTransport + ?Sized>(
        &self,
        transport: &mut T,
        package: &str,
        timings: &GestureTimings,
    ) -> Result<(), ProbeError> {
        let mut foreground: Option<String> = None;

        for step in &self.steps {
            match *step {
                TeardownStep::SoftBack { times } => {
                    press_repeated(transport, DeviceKey::Back, times, timings.key_settle_ms);
                }
                TeardownStep::Home { times } => {
                    press_repeated(transport, DeviceKey::Home, times, timings.key_settle_ms);
                }
                TeardownStep::TerminateForeground => {
                    info!(app = package, "terminating app");
                    let current = transport.current_package()?;
                    if current != package {
                        transport.terminate_app(&current)?;
                        sleep_ms(timings.terminate_settle_ms);
                    }
                    foreground = Some(current);
                }
                TeardownStep::TerminateTarget => {
                    transport.terminate_app(package)?;
                    sleep_ms(timings.terminate_settle_ms);
                }
                TeardownStep::ForceStop => {
                    let current = match &foreground {
                        Some(current) => current.clone(),
                        None => transport.current_package()?,
                    };
                    force_stop_if_stuck(transport, package, &current, timings);
                }
            }
        }

        Ok(())
    }
}

fn press_repeated<T: DeviceTransport + ?Sized>(transport: &mut T, key: DeviceKey, times: u32, settle_ms: u64) {
    for _ in 0..times {
        if let Err(e) = transport.press_key(key) {
            warn!(?key, error = %e, "key press failed during teardown");
            break;
        }
        sleep_ms(settle_ms);
    }
}

fn force_stop_if_stuck<T: DeviceTransport + ?Sized>(
    transport: &mut T,
    package: &str,
    foreground: &str,
    timings: &GestureTimings,
) {
    let camera = foreground.to_lowercase().contains(CAMERA_MARKER);
    if foreground != package && !camera {
        return;
    }

    warn!(app = package, foreground, "termination did not take, force stopping");

    let result = transport.force_stop(package).and_then(|_| {
        if camera {
            transport.force_stop(foreground)
        } else {
            Ok(())
        }
    });

    if let Err(e) = result {
        warn!(error = %e, "force stop failed, falling back to back and home keys");
        if let Err(e) = fallback_keys(transport, timings) {
            warn!(error = %e, "fallback teardown failed");
        }
    }
}

fn fallback_keys<T: DeviceTransport + ?Sized>(transport: &mut T, timings: &GestureTimings) -> Result<(), ProbeError> {
    for _ in 0..FALLBACK_BACK_PRESSES {
        transport.press_key(DeviceKey::Back)?;
    }
    sleep_ms(FALLBACK_KEY_SETTLE_MS.min(timings.key_settle_ms));
    transport.press_key(DeviceKey::Home)?;
    sleep_ms(timings.key_settle_ms);
    Ok(())
}

/// Bring `package` to the foreground if needed, then wait for the screen.
pub fn ensure_app_running<T: DeviceTransport + ?Sized>(
    transport: &mut T,
    package: &str,
    stability: &StabilityConfig,
) -> Result<(), ProbeError> {
    let current = transport.current_package()?;
    if current != package {
        info!(app = package, foreground = %current, "activating app");
        transport.activate_app(package)?;
    }

    wait_for_stable(transport, stability);
    Ok(())
}

/// Replay prerecorded taps, waiting for the screen after each.
pub fn navigate_to_screen<T: DeviceTransport + ?Sized>(
    transport: &mut T,
    steps: &[NavigationStep],
    stability: &StabilityConfig,
) -> Result<(), ProbeError> {
    info!(taps = steps.len(), "navigating to screen");

    for step in steps {
        let bounds = Bounds::parse(&step.bounds)
            .ok_or_else(|| ProbeError::Config(format!("invalid navigation bounds '{}'", step.bounds)))?;

        transport.perform(&[tap_track(bounds.center())])?;
        wait_for_stable(transport, stability);
    }

    Ok(())
}

/// Full reset: teardown, relaunch, and replay `navigate` when given.
pub fn restore_baseline<T: DeviceTransport + ?Sized>(
    transport: &mut T,
    package: &str,
    navigate: Option<&[NavigationStep]>,
    policy: &TeardownPolicy,
    stability: &StabilityConfig,
    timings: &GestureTimings,
) -> Result<(), ProbeError> {
    policy.run(transport, package, timings)?;
    ensure_app_running(transport, package, stability)?;

    if let Some(steps) = navigate {
        navigate_to_screen(transport, steps, stability)?;
    }

    Ok(())
}

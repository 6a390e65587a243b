use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ProbeError;
use crate::gesture::gesture_model::{GesturePlan, PinchGeometry};
use crate::hierarchy::bounds::Point;

use super::transport::{DeviceTransport, PointerTrack};

const FINGER: &str = "finger";
const FINGER_1: &str = "finger1";
const FINGER_2: &str = "finger2";

/// Hold and pause durations used while executing gestures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureTimings {
    pub long_press_hold_ms: u64,
    pub long_press_capture_ms: u64,
    pub double_tap_gap_ms: u64,
    pub swipe_duration_ms: u64,
    pub swipe_hold_ms: u64,
    pub pinch_settle_ms: u64,
    pub pinch_capture_ms: u64,
    pub pinch_duration_ms: u64,
    pub key_settle_ms: u64,
    pub terminate_settle_ms: u64,
}

impl Default for GestureTimings {
    fn default() -> Self {
        Self {
            long_press_hold_ms: 2000,
            long_press_capture_ms: 1000,
            double_tap_gap_ms: 100,
            swipe_duration_ms: 1000,
            swipe_hold_ms: 100,
            pinch_settle_ms: 200,
            pinch_capture_ms: 500,
            pinch_duration_ms: 1000,
            key_settle_ms: 1000,
            terminate_settle_ms: 2000,
        }
    }
}

impl GestureTimings {
    /// All waits zeroed; for scripted devices.
    pub fn immediate() -> Self {
        Self {
            long_press_hold_ms: 0,
            long_press_capture_ms: 0,
            double_tap_gap_ms: 0,
            swipe_duration_ms: 0,
            swipe_hold_ms: 0,
            pinch_settle_ms: 0,
            pinch_capture_ms: 0,
            pinch_duration_ms: 0,
            key_settle_ms: 0,
            terminate_settle_ms: 0,
        }
    }
}

pub fn tap_track(point: Point) -> PointerTrack {
    PointerTrack::new(FINGER).move_to(point.x, point.y).down().up()
}

/// Run a planned gesture on the device.
///
/// Long-press and pinch call `capture_during` while the pointer is still
/// down. A failed capture is logged and the pointer is released anyway.
pub fn execute_plan<T, F>(
    transport: &mut T,
    plan: &GesturePlan,
    timings: &GestureTimings,
    mut capture_during: F,
) -> Result<(), ProbeError>
where
    T: DeviceTransport + ?Sized,
    F: FnMut(&mut T) -> Result<(), ProbeError>,
{
    debug!(?plan, "executing gesture");

    match plan {
        GesturePlan::Tap { point } => transport.perform(&[tap_track(*point)]),

        GesturePlan::DoubleTap { point } => {
            let track = PointerTrack::new(FINGER)
                .move_to(point.x, point.y)
                .down()
                .up()
                .pause(timings.double_tap_gap_ms)
                .down()
                .up();
            transport.perform(&[track])
        }

        GesturePlan::Drag { start, end } => {
            let track = PointerTrack::new(FINGER)
                .move_to(start.x, start.y)
                .down()
                .pause(timings.swipe_hold_ms)
                .move_over(end.x, end.y, timings.swipe_duration_ms)
                .up();
            transport.perform(&[track])
        }

        GesturePlan::LongPress { point } => {
            transport.perform(&[PointerTrack::new(FINGER).move_to(point.x, point.y).down()])?;

            sleep_ms(timings.long_press_capture_ms);
            if let Err(e) = capture_during(transport) {
                warn!(error = %e, "during capture failed in long press");
            }
            sleep_ms(timings.long_press_hold_ms.saturating_sub(timings.long_press_capture_ms));

            transport.perform(&[PointerTrack::new(FINGER).move_to(point.x, point.y).up()])
        }

        GesturePlan::Pinch { geometry, .. } => {
            execute_pinch(transport, geometry, timings, &mut capture_during)
        }
    }
}

fn execute_pinch<T, F>(
    transport: &mut T,
    geometry: &PinchGeometry,
    timings: &GestureTimings,
    capture_during: &mut F,
) -> Result<(), ProbeError>
where
    T: DeviceTransport + ?Sized,
    F: FnMut(&mut T) -> Result<(), ProbeError>,
{
    let (f1_start, f1_end) = (to_pixel(geometry.finger1_start), to_pixel(geometry.finger1_end));
    let (f2_start, f2_end) = (to_pixel(geometry.finger2_start), to_pixel(geometry.finger2_end));

    transport.perform(&[
        PointerTrack::new(FINGER_1).move_to(f1_start.0, f1_start.1).down(),
        PointerTrack::new(FINGER_2).move_to(f2_start.0, f2_start.1).down(),
    ])?;
    sleep_ms(timings.pinch_settle_ms);

    transport.perform(&[
        PointerTrack::new(FINGER_1)
            .move_to(f1_start.0, f1_start.1)
            .down()
            .move_over(f1_end.0, f1_end.1, timings.pinch_duration_ms),
        PointerTrack::new(FINGER_2)
            .move_to(f2_start.0, f2_start.1)
            .down()
            .move_over(f2_end.0, f2_end.1, timings.pinch_duration_ms),
    ])?;
    sleep_ms(timings.pinch_capture_ms);

    if let Err(e) = capture_during(transport) {
        warn!(error = %e, "during capture failed in pinch");
    }

    transport.perform(&[
        PointerTrack::new(FINGER_1).move_to(f1_end.0, f1_end.1).up(),
        PointerTrack::new(FINGER_2).move_to(f2_end.0, f2_end.1).up(),
    ])
}

fn to_pixel((x, y): (f64, f64)) -> (i32, i32) {
    (x.round() as i32, y.round() as i32)
}

pub(crate) fn sleep_ms(ms: u64) {
    if ms > 0 {
        thread::sleep(Duration::from_millis(ms));
    }
}

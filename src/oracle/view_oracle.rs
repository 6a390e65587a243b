use std::fs;
use std::path::Path;

use image::RgbImage;
use tracing::warn;

use crate::dataset::artifact_store::{AttemptDir, Stage};
use crate::error::ProbeError;
use crate::gesture::gesture_model::{GestureKind, OracleKind};

pub const DEFAULT_PIXEL_THRESHOLD: f64 = 5.0;

/// Whether the gesture recorded in `attempt` changed the screen.
///
/// The oracle is picked by the gesture kind. Kinds that capture a `during`
/// stage always compare it, so a missing `during` file counts as "no change".
pub fn judge(kind: GestureKind, attempt: &AttemptDir, pixel_threshold: f64) -> bool {
    match kind.oracle() {
        OracleKind::Hierarchy => hierarchy_changed(
            &attempt.stage_file(Stage::Before, "xml"),
            &attempt.stage_file(Stage::After, "xml"),
            None,
        ),
        OracleKind::HierarchyWithDuring => hierarchy_changed(
            &attempt.stage_file(Stage::Before, "xml"),
            &attempt.stage_file(Stage::After, "xml"),
            Some(&attempt.stage_file(Stage::During, "xml")),
        ),
        OracleKind::Screenshot => screenshot_changed(
            &attempt.stage_file(Stage::Before, "png"),
            &attempt.stage_file(Stage::After, "png"),
            Some(&attempt.stage_file(Stage::During, "png")),
            pixel_threshold,
        ),
    }
}

/// Exact text comparison of serialized hierarchies.
pub fn texts_differ(before: &str, after: &str, during: Option<&str>) -> bool {
    if before != after {
        return true;
    }
    during.map(|d| d != before).unwrap_or(false)
}

/// Hierarchy oracle over files. Any read failure counts as "no change".
pub fn hierarchy_changed(before: &Path, after: &Path, during: Option<&Path>) -> bool {
    let read = |path: &Path| match fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(e) => {
            warn!(file = %path.display(), error = %e, "could not read hierarchy for comparison");
            None
        }
    };

    let (Some(before), Some(after)) = (read(before), read(after)) else {
        return false;
    };

    let during = match during {
        Some(path) => match read(path) {
            Some(text) => Some(text),
            None => return false,
        },
        None => None,
    };

    texts_differ(&before, &after, during.as_deref())
}

/// Mean absolute difference per pixel per channel, `None` on a shape mismatch.
pub fn image_difference(a: &RgbImage, b: &RgbImage) -> Option<f64> {
    if a.dimensions() != b.dimensions() {
        return None;
    }

    let samples = a.as_raw().len();
    if samples == 0 {
        return Some(0.0);
    }

    let total: u64 = a
        .as_raw()
        .iter()
        .zip(b.as_raw())
        .map(|(x, y)| u64::from(x.abs_diff(*y)))
        .sum();

    Some(total as f64 / samples as f64)
}

/// Screenshot oracle over decoded images.
///
/// A shape mismatch between any compared pair counts as changed.
pub fn images_changed(
    before: &RgbImage,
    after: &RgbImage,
    during: Option<&RgbImage>,
    threshold: f64,
) -> bool {
    let exceeds = |other: &RgbImage| match image_difference(before, other) {
        Some(diff) => diff > threshold,
        None => true,
    };

    exceeds(after) || during.map(exceeds).unwrap_or(false)
}

/// Decode a stored screenshot as RGB.
pub fn load_screenshot(path: &Path) -> Result<RgbImage, ProbeError> {
    image::open(path)
        .map(|img| img.to_rgb8())
        .map_err(|e| ProbeError::Image {
            context: path.display().to_string(),
            source: e,
        })
}

/// Screenshot oracle over files. A missing or undecodable image counts as
/// "no change".
pub fn screenshot_changed(before: &Path, after: &Path, during: Option<&Path>, threshold: f64) -> bool {
    let load = |path: &Path| match load_screenshot(path) {
        Ok(img) => Some(img),
        Err(e) => {
            warn!(error = %e, "could not load screenshot for comparison");
            None
        }
    };

    let (Some(before), Some(after)) = (load(before), load(after)) else {
        return false;
    };

    let during = match during {
        Some(path) => match load(path) {
            Some(img) => Some(img),
            None => return false,
        },
        None => None,
    };

    images_changed(&before, &after, during.as_ref(), threshold)
}

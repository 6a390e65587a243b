use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::ProbeError;
use crate::gesture::gesture_model::{ActionRecord, GestureKind};
use crate::state::progress::safe_file_stem;

use super::simplified::simplify;

/// Capture stage of one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Before,
    During,
    After,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Before => "before",
            Stage::During => "during",
            Stage::After => "after",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dataset root. Hands out one numbered directory per attempt under
/// `<root>/<app>/<screen>/<gesture>/<n>`.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn gesture_dir(&self, app: &str, screen: &str, kind: GestureKind) -> PathBuf {
        self.root
            .join(safe_file_stem(app))
            .join(safe_file_stem(screen))
            .join(kind.as_str())
    }

    /// Create the next free index directory: max existing numeric name + 1,
    /// or 0 for an empty gesture directory.
    pub fn begin_attempt(&self, app: &str, screen: &str, kind: GestureKind) -> Result<AttemptDir, ProbeError> {
        let gesture_dir = self.gesture_dir(app, screen, kind);
        fs::create_dir_all(&gesture_dir)
            .map_err(|e| ProbeError::io(format!("create {}", gesture_dir.display()), e))?;

        let next = next_index(&gesture_dir)?;
        let dir = gesture_dir.join(next.to_string());
        fs::create_dir_all(&dir).map_err(|e| ProbeError::io(format!("create {}", dir.display()), e))?;

        debug!(dir = %dir.display(), "attempt directory created");
        Ok(AttemptDir { dir })
    }
}

fn next_index(gesture_dir: &Path) -> Result<u64, ProbeError> {
    let entries = fs::read_dir(gesture_dir)
        .map_err(|e| ProbeError::io(format!("read {}", gesture_dir.display()), e))?;

    let max = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .filter_map(|e| e.file_name().to_str().and_then(|n| n.parse::<u64>().ok()))
        .max();

    Ok(max.map(|m| m + 1).unwrap_or(0))
}

/// Directory holding the artifacts of a single attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptDir {
    dir: PathBuf,
}

impl AttemptDir {
    /// Wrap an existing directory, e.g. one left behind by an earlier run.
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/<stage>.<extension>`
    pub fn stage_file(&self, stage: Stage, extension: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", stage.as_str(), extension))
    }

    /// Write the raw hierarchy as `<stage>.xml` and its simplified form as
    /// `<stage>.vh`.
    pub fn save_hierarchy(&self, stage: Stage, xml: &str) -> Result<PathBuf, ProbeError> {
        let xml_path = self.stage_file(stage, "xml");
        write_file(&xml_path, xml)?;

        match simplify(xml) {
            Ok(elements) => {
                let vh_path = self.stage_file(stage, "vh");
                let json = serde_json::to_string_pretty(&elements).map_err(|e| ProbeError::JsonSerialize {
                    context: format!("simplified hierarchy ({})", stage),
                    source: e,
                })?;
                write_file(&vh_path, &json)?;
            }
            Err(e) => {
                warn!(stage = %stage, error = %e, "skipping simplified hierarchy");
            }
        }

        Ok(xml_path)
    }

    pub fn save_action(&self, record: &ActionRecord) -> Result<PathBuf, ProbeError> {
        let path = self.dir.join("action.json");
        let json = serde_json::to_string_pretty(record).map_err(|e| ProbeError::JsonSerialize {
            context: "action record".to_string(),
            source: e,
        })?;
        write_file(&path, &json)?;
        Ok(path)
    }

    pub fn save_element_path(&self, element_path: &str) -> Result<PathBuf, ProbeError> {
        let path = self.dir.join("path.txt");
        write_file(&path, element_path)?;
        Ok(path)
    }

    /// Remove the whole attempt directory.
    pub fn discard(self) -> Result<(), ProbeError> {
        if !self.dir.exists() {
            warn!(dir = %self.dir.display(), "no attempt directory to delete");
            return Ok(());
        }

        fs::remove_dir_all(&self.dir).map_err(|e| ProbeError::io(format!("remove {}", self.dir.display()), e))?;
        debug!(dir = %self.dir.display(), "attempt artifacts discarded");
        Ok(())
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), ProbeError> {
    fs::write(path, contents).map_err(|e| ProbeError::io(format!("write {}", path.display()), e))
}

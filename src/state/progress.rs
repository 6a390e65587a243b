use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ProbeError;
use crate::gesture::gesture_model::ActionId;

const PROGRESS_SUFFIX: &str = "_progress.json";

/// On-disk shape of one screen's progress file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    #[serde(default)]
    pub visited_paths: Vec<String>,
    pub screen_name: String,
    #[serde(default)]
    pub timestamp: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ScreenProgress {
    pub visited: BTreeSet<String>,
    pub last_saved_at: Option<f64>,
}

/// Per-screen set of action identifiers already attempted, for one app.
///
/// Every mutation is expected to be followed by [`VisitedTracker::persist`]
/// before the next gesture runs.
#[derive(Debug)]
pub struct VisitedTracker {
    progress_dir: PathBuf,
    screens: HashMap<String, ScreenProgress>,
}

impl VisitedTracker {
    /// Empty tracker writing under `<progress_root>/<app_package>`.
    pub fn new(progress_root: impl AsRef<Path>, app_package: &str) -> Self {
        Self {
            progress_dir: progress_root.as_ref().join(safe_file_stem(app_package)),
            screens: HashMap::new(),
        }
    }

    /// Tracker pre-populated from every progress file already on disk.
    pub fn open(progress_root: impl AsRef<Path>, app_package: &str) -> Result<Self, ProbeError> {
        let mut tracker = Self::new(progress_root, app_package);
        fs::create_dir_all(&tracker.progress_dir)
            .map_err(|e| ProbeError::io(format!("create {}", tracker.progress_dir.display()), e))?;
        tracker.restore_all()?;
        Ok(tracker)
    }

    pub fn progress_dir(&self) -> &Path {
        &self.progress_dir
    }

    pub fn progress_file(&self, screen: &str) -> PathBuf {
        self.progress_dir
            .join(format!("{}{}", safe_file_stem(screen), PROGRESS_SUFFIX))
    }

    pub fn has_visited(&self, screen: &str, action: &ActionId) -> bool {
        self.screens
            .get(screen)
            .map(|p| p.visited.contains(action.as_str()))
            .unwrap_or(false)
    }

    /// Returns false when the action was already recorded.
    pub fn mark_visited(&mut self, screen: &str, action: ActionId) -> bool {
        self.screens
            .entry(screen.to_string())
            .or_default()
            .visited
            .insert(action.into_string())
    }

    pub fn screen(&self, screen: &str) -> Option<&ScreenProgress> {
        self.screens.get(screen)
    }

    pub fn visited_count(&self, screen: &str) -> usize {
        self.screens.get(screen).map(|p| p.visited.len()).unwrap_or(0)
    }

    /// Known screen names, sorted.
    pub fn screen_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.screens.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Write the screen's full visited set plus a timestamp.
    ///
    /// Goes through a temp file and a rename so a crash mid-write leaves the
    /// previous file intact.
    pub fn persist(&mut self, screen: &str) -> Result<PathBuf, ProbeError> {
        let timestamp = unix_seconds();
        let path = self.progress_file(screen);
        let tmp = path.with_extension("json.tmp");

        let visited_paths: Vec<String> = self
            .screens
            .get(screen)
            .map(|p| p.visited.iter().cloned().collect())
            .unwrap_or_default();

        let record = ProgressRecord {
            visited_paths,
            screen_name: screen.to_string(),
            timestamp,
        };

        let json = serde_json::to_string_pretty(&record).map_err(|e| ProbeError::JsonSerialize {
            context: format!("progress for screen '{}'", screen),
            source: e,
        })?;

        fs::create_dir_all(&self.progress_dir)
            .map_err(|e| ProbeError::io(format!("create {}", self.progress_dir.display()), e))?;
        fs::write(&tmp, json).map_err(|e| ProbeError::io(format!("write {}", tmp.display()), e))?;
        fs::rename(&tmp, &path).map_err(|e| ProbeError::io(format!("rename {}", path.display()), e))?;

        self.screens.entry(screen.to_string()).or_default().last_saved_at = Some(timestamp);
        info!(screen, paths = record.visited_paths.len(), "progress saved");

        Ok(path)
    }

    /// Load every `*_progress.json` in the app's progress directory.
    ///
    /// Unreadable or corrupt files are skipped with a warning. Returns the
    /// number of screens restored.
    pub fn restore_all(&mut self) -> Result<usize, ProbeError> {
        let entries = match fs::read_dir(&self.progress_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("no previous test progress found, starting fresh");
                return Ok(0);
            }
            Err(e) => {
                return Err(ProbeError::io(format!("read {}", self.progress_dir.display()), e));
            }
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.ends_with(PROGRESS_SUFFIX))
                    .unwrap_or(false)
            })
            .collect();
        files.sort();

        let mut restored = 0;
        for file in files {
            match read_record(&file) {
                Ok(record) => {
                    info!(
                        screen = %record.screen_name,
                        paths = record.visited_paths.len(),
                        saved_at = %format_timestamp(record.timestamp),
                        "restored progress"
                    );
                    self.screens.insert(
                        record.screen_name,
                        ScreenProgress {
                            visited: record.visited_paths.into_iter().collect(),
                            last_saved_at: Some(record.timestamp),
                        },
                    );
                    restored += 1;
                }
                Err(e) => {
                    warn!(file = %file.display(), error = %e, "skipping unreadable progress file");
                }
            }
        }

        Ok(restored)
    }
}

fn read_record(path: &Path) -> Result<ProgressRecord, ProbeError> {
    let content =
        fs::read_to_string(path).map_err(|e| ProbeError::io(format!("read {}", path.display()), e))?;
    serde_json::from_str(&content).map_err(|e| ProbeError::JsonParse {
        context: path.display().to_string(),
        source: e,
    })
}

fn unix_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

fn format_timestamp(timestamp: f64) -> String {
    Local
        .timestamp_opt(timestamp as i64, 0)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

/// Make a screen or package name safe to use as a single path component.
pub fn safe_file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if stem.is_empty() || stem.chars().all(|c| c == '.') {
        "_".to_string()
    } else {
        stem
    }
}

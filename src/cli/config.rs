use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::device::appium::AppiumConfig;
use crate::device::gestures::GestureTimings;
use crate::device::wait::StabilityConfig;
use crate::error::ProbeError;
use crate::explorer::explorer_model::{AppTarget, BudgetConfig, ExplorerConfig};
use crate::explorer::recovery::TeardownPolicy;
use crate::oracle::view_oracle::DEFAULT_PIXEL_THRESHOLD;

pub const DEFAULT_CONFIG_FILE: &str = "ui-prober.yaml";

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "ui-prober",
    version,
    about = "Resumable gesture exploration of mobile app screens"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: ui-prober.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Explore every configured screen of every configured app
    Explore {
        /// Only explore this app package
        #[arg(long)]
        app: Option<String>,

        /// Only explore this screen
        #[arg(long)]
        screen: Option<String>,
    },

    /// Show persisted progress per screen
    Progress {
        /// Only show this app package
        #[arg(long)]
        app: Option<String>,
    },

    /// List gesture candidates in a dumped hierarchy
    Candidates {
        /// Hierarchy XML file
        #[arg(long)]
        xml: String,

        /// App package whose progress marks visited candidates
        #[arg(long, requires = "screen")]
        app: Option<String>,

        /// Screen name whose progress marks visited candidates
        #[arg(long, requires = "app")]
        screen: Option<String>,
    },
}

// ============================================================================
// Config File Model (YAML)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub pixel_threshold: f64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            pixel_threshold: DEFAULT_PIXEL_THRESHOLD,
        }
    }
}

/// Contents of `ui-prober.yaml`. Every section is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub appium: AppiumConfig,
    pub dataset_dir: String,
    pub progress_dir: String,
    pub trace_file: String,
    pub stability: StabilityConfig,
    pub timings: GestureTimings,
    pub oracle: OracleConfig,
    pub budget: BudgetConfig,
    pub apps: Vec<AppTarget>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            appium: AppiumConfig::default(),
            dataset_dir: "dataset".to_string(),
            progress_dir: "test_progress".to_string(),
            trace_file: "probe_trace.jsonl".to_string(),
            stability: StabilityConfig::default(),
            timings: GestureTimings::default(),
            oracle: OracleConfig::default(),
            budget: BudgetConfig::default(),
            apps: vec![],
        }
    }
}

impl ProbeConfig {
    pub fn find_app(&self, package: &str) -> Option<&AppTarget> {
        self.apps.iter().find(|a| a.package == package)
    }

    /// Apps selected by an optional `--app` filter, in config order.
    pub fn selected_apps(&self, package: Option<&str>) -> Result<Vec<&AppTarget>, ProbeError> {
        match package {
            Some(package) => self
                .find_app(package)
                .map(|a| vec![a])
                .ok_or_else(|| ProbeError::Config(format!("app '{}' is not configured", package))),
            None => Ok(self.apps.iter().collect()),
        }
    }

    pub fn explorer_config(&self, app_package: &str) -> ExplorerConfig {
        ExplorerConfig {
            app_package: app_package.to_string(),
            dataset_dir: PathBuf::from(&self.dataset_dir),
            progress_dir: PathBuf::from(&self.progress_dir),
            stability: self.stability,
            timings: self.timings,
            pixel_threshold: self.oracle.pixel_threshold,
            budget: self.budget,
            teardown: TeardownPolicy::default(),
        }
    }
}

// ============================================================================
// Config File Loading
// ============================================================================

/// Parse YAML (or JSON) config text.
pub fn parse_config(content: &str) -> Result<ProbeConfig, ProbeError> {
    serde_yaml::from_str(content).map_err(|e| ProbeError::Config(e.to_string()))
}

/// Load config from a YAML file.
///
/// Without an explicit path a missing `ui-prober.yaml` yields defaults. An
/// explicit path that cannot be read, or any malformed file, is an error.
pub fn load_config(path: Option<&str>) -> Result<ProbeConfig, ProbeError> {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_FILE);

    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content)
            .map_err(|e| ProbeError::Config(format!("{}: {}", config_path, e))),
        Err(e) if path.is_none() && e.kind() == std::io::ErrorKind::NotFound => {
            Ok(ProbeConfig::default())
        }
        Err(e) => Err(ProbeError::Config(format!("cannot read {}: {}", config_path, e))),
    }
}

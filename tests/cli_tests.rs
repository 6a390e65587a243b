use std::fs;

use clap::Parser;
use tempfile::TempDir;
use ui_prober::cli::commands::{format_candidates, format_progress, format_reports};
use ui_prober::cli::config::{Cli, Commands, ProbeConfig, load_config, parse_config};
use ui_prober::error::ProbeError;
use ui_prober::explorer::explorer_model::ScreenReport;
use ui_prober::gesture::gesture_model::{ActionId, GestureKind};
use ui_prober::hierarchy::hierarchy_model::HierarchySnapshot;
use ui_prober::state::progress::VisitedTracker;

use crate::common::fixtures::SINGLE_BUTTON_XML;

mod common;

// =========================================================================
// Argument parsing
// =========================================================================

#[test]
fn explore_with_filters() {
    let cli = Cli::parse_from([
        "ui-prober",
        "-vv",
        "--config",
        "probe.yaml",
        "explore",
        "--app",
        "com.example.app",
        "--screen",
        "Home",
    ]);

    assert_eq!(cli.verbose, 2);
    assert_eq!(cli.config.as_deref(), Some("probe.yaml"));
    match cli.command {
        Commands::Explore { app, screen } => {
            assert_eq!(app.as_deref(), Some("com.example.app"));
            assert_eq!(screen.as_deref(), Some("Home"));
        }
        other => panic!("unexpected command {:?}", other),
    }
}

#[test]
fn global_flags_after_subcommand() {
    let cli = Cli::parse_from(["ui-prober", "progress", "-v", "--config", "x.yaml"]);
    assert_eq!(cli.verbose, 1);
    assert_eq!(cli.config.as_deref(), Some("x.yaml"));
    assert!(matches!(cli.command, Commands::Progress { app: None }));
}

#[test]
fn candidates_requires_app_and_screen_together() {
    let cli = Cli::parse_from(["ui-prober", "candidates", "--xml", "dump.xml"]);
    match cli.command {
        Commands::Candidates { xml, app, screen } => {
            assert_eq!(xml, "dump.xml");
            assert!(app.is_none() && screen.is_none());
        }
        other => panic!("unexpected command {:?}", other),
    }

    assert!(Cli::try_parse_from(["ui-prober", "candidates", "--xml", "d.xml", "--app", "a"]).is_err());
    assert!(Cli::try_parse_from(["ui-prober", "candidates", "--xml", "d.xml", "--screen", "s"]).is_err());
    assert!(Cli::try_parse_from(["ui-prober", "candidates"]).is_err());
}

// =========================================================================
// Config file
// =========================================================================

#[test]
fn empty_config_uses_defaults() {
    let config = parse_config("{}").unwrap();
    assert_eq!(config, ProbeConfig::default());
    assert_eq!(config.dataset_dir, "dataset");
    assert_eq!(config.progress_dir, "test_progress");
    assert_eq!(config.appium.endpoint, "http://localhost:4723");
    assert_eq!(config.stability.stable_polls, 5);
    assert_eq!(config.timings.long_press_hold_ms, 2000);
    assert_eq!(config.oracle.pixel_threshold, 5.0);
    assert_eq!(config.budget.max_attempt_failures, 3);
    assert!(config.apps.is_empty());
}

#[test]
fn apps_and_partial_sections() {
    let yaml = r#"
appium:
  endpoint: http://10.0.0.2:4723/
  device_name: pixel-7
stability:
  timeout_ms: 5000
oracle:
  pixel_threshold: 2.5
apps:
  - package: com.example.app
    screens:
      - name: Home
      - name: Settings
        navigate:
          - bounds: "[0,0][100,50]"
          - bounds: "[10,60][200,120]"
  - package: com.example.other
"#;
    let config = parse_config(yaml).unwrap();

    assert_eq!(config.appium.device_name, "pixel-7");
    assert_eq!(config.appium.platform_name, "Android");
    assert_eq!(config.stability.timeout_ms, 5000);
    assert_eq!(config.stability.poll_interval_ms, 500);

    let app = config.find_app("com.example.app").unwrap();
    let names: Vec<&str> = app.screens.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Home", "Settings"]);
    assert_eq!(app.screens[1].navigate.len(), 2);
    assert!(app.screens[0].navigate.is_empty());

    assert!(config.find_app("com.example.other").unwrap().screens.is_empty());

    let explorer = config.explorer_config("com.example.app");
    assert_eq!(explorer.app_package, "com.example.app");
    assert_eq!(explorer.pixel_threshold, 2.5);
    assert_eq!(explorer.stability.timeout_ms, 5000);
}

#[test]
fn app_selection() {
    let config = parse_config("apps: [{package: a}, {package: b}]").unwrap();

    let all: Vec<&str> = config.selected_apps(None).unwrap().iter().map(|a| a.package.as_str()).collect();
    assert_eq!(all, vec!["a", "b"]);

    let one = config.selected_apps(Some("b")).unwrap();
    assert_eq!(one.len(), 1);
    assert_eq!(one[0].package, "b");

    assert!(matches!(config.selected_apps(Some("c")), Err(ProbeError::Config(_))));
}

#[test]
fn malformed_config_is_rejected() {
    assert!(matches!(parse_config("apps: 3"), Err(ProbeError::Config(_))));
    assert!(matches!(
        parse_config("apps: [{screens: []}]"),
        Err(ProbeError::Config(_))
    ));
}

#[test]
fn explicit_config_file_must_exist() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.yaml");
    assert!(matches!(
        load_config(Some(missing.to_str().unwrap())),
        Err(ProbeError::Config(_))
    ));

    let path = dir.path().join("probe.yaml");
    fs::write(&path, "dataset_dir: /tmp/data\n").unwrap();
    let config = load_config(Some(path.to_str().unwrap())).unwrap();
    assert_eq!(config.dataset_dir, "/tmp/data");

    fs::write(&path, "stability: [").unwrap();
    assert!(matches!(
        load_config(Some(path.to_str().unwrap())),
        Err(ProbeError::Config(_))
    ));
}

// =========================================================================
// Output formatting
// =========================================================================

#[test]
fn candidates_listing_marks_visited() {
    let snapshot = HierarchySnapshot::parse(SINGLE_BUTTON_XML).unwrap();

    let fresh = format_candidates(&snapshot, None);
    assert_eq!(
        fresh,
        "tap (1)\n    /ButtonClass[0]\ndouble_tap (1)\n    /ButtonClass[0]\nnext: tap//ButtonClass[0]\n"
    );

    let dir = TempDir::new().unwrap();
    let mut tracker = VisitedTracker::new(dir.path(), "com.example.app");
    tracker.mark_visited("Home", ActionId::new(GestureKind::Tap, "/ButtonClass[0]"));

    let listing = format_candidates(&snapshot, Some((&tracker, "Home")));
    assert!(listing.contains("tap (1)\n  * /ButtonClass[0]\n"));
    assert!(listing.ends_with("next: double_tap//ButtonClass[0]\n"));

    tracker.mark_visited("Home", ActionId::new(GestureKind::DoubleTap, "/ButtonClass[0]"));
    let drained = format_candidates(&snapshot, Some((&tracker, "Home")));
    assert!(drained.ends_with("next: (drained)\n"));
}

#[test]
fn progress_listing() {
    let dir = TempDir::new().unwrap();
    let mut tracker = VisitedTracker::new(dir.path(), "com.example.app");
    assert_eq!(
        format_progress("com.example.app", &tracker),
        "com.example.app\n  (no progress)\n"
    );

    tracker.mark_visited("Home", ActionId::new(GestureKind::Tap, "/a[0]"));
    tracker.mark_visited("Home", ActionId::new(GestureKind::Tap, "/b[0]"));
    let out = format_progress("com.example.app", &tracker);
    assert!(out.contains("Home"));
    assert!(out.contains("2 visited"));
}

#[test]
fn report_lines() {
    let mut report = ScreenReport::new("Home");
    report.attempts = 4;
    report.changed = 1;
    report.drained = true;

    let out = format_reports(&[report, ScreenReport::new("Settings")]);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("Home"));
    assert!(lines[0].contains("attempts=4"));
    assert!(lines[0].ends_with("drained"));
    assert!(lines[1].ends_with("incomplete"));
}

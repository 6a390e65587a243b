use std::fmt::Write as _;

use tracing::{error, info};

use crate::cli::config::ProbeConfig;
use crate::device::appium::AppiumSession;
use crate::explorer::explorer::explore_app;
use crate::explorer::explorer_model::ScreenReport;
use crate::explorer::selector::{all_candidates, next_candidate};
use crate::gesture::gesture_model::GestureKind;
use crate::hierarchy::hierarchy_model::HierarchySnapshot;
use crate::state::progress::VisitedTracker;
use crate::trace::logger::TraceLogger;

// ============================================================================
// explore subcommand
// ============================================================================

/// Explore the selected apps one after another.
///
/// A lost device aborts only the current app; the remaining apps still run.
pub fn cmd_explore(
    config: &ProbeConfig,
    app: Option<&str>,
    screen: Option<&str>,
) -> Result<Vec<ScreenReport>, Box<dyn std::error::Error>> {
    let apps = config.selected_apps(app)?;
    if apps.is_empty() {
        eprintln!("No apps configured.");
        return Ok(vec![]);
    }

    let tracer = TraceLogger::new(&config.trace_file);
    let mut all_reports = Vec::new();

    for target in apps {
        let explorer_config = config.explorer_config(&target.package);

        let mut session = match AppiumSession::connect(&config.appium, &target.package) {
            Ok(session) => session,
            Err(e) => {
                error!(app = %target.package, error = %e, "could not start appium session");
                continue;
            }
        };

        match explore_app(
            &mut session,
            target,
            &explorer_config,
            &tracer,
            rand::thread_rng(),
            screen,
        ) {
            Ok(reports) => {
                info!(app = %target.package, screens = reports.len(), "app complete");
                all_reports.extend(reports);
            }
            Err(e) => error!(app = %target.package, error = %e, "app exploration aborted"),
        }

        let _ = session.quit();
    }

    print!("{}", format_reports(&all_reports));
    Ok(all_reports)
}

pub fn format_reports(reports: &[ScreenReport]) -> String {
    let mut out = String::new();
    for r in reports {
        let _ = writeln!(
            out,
            "{:<24} attempts={:<4} changed={:<4} failures={:<4} {}",
            r.screen,
            r.attempts,
            r.changed,
            r.failures,
            if r.drained { "drained" } else { "incomplete" }
        );
    }
    out
}

// ============================================================================
// progress subcommand
// ============================================================================

pub fn cmd_progress(config: &ProbeConfig, app: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    for target in config.selected_apps(app)? {
        let mut tracker = VisitedTracker::new(&config.progress_dir, &target.package);
        tracker.restore_all()?;
        print!("{}", format_progress(&target.package, &tracker));
    }
    Ok(())
}

pub fn format_progress(package: &str, tracker: &VisitedTracker) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", package);

    let names = tracker.screen_names();
    if names.is_empty() {
        let _ = writeln!(out, "  (no progress)");
    }
    for name in names {
        let _ = writeln!(out, "  {:<24} {} visited", name, tracker.visited_count(name));
    }
    out
}

// ============================================================================
// candidates subcommand
// ============================================================================

pub fn cmd_candidates(
    config: &ProbeConfig,
    xml_path: &str,
    app: Option<&str>,
    screen: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let xml = std::fs::read_to_string(xml_path)?;
    let snapshot = HierarchySnapshot::parse(&xml)?;

    let progress = match (app, screen) {
        (Some(app), Some(screen)) => {
            let mut tracker = VisitedTracker::new(&config.progress_dir, app);
            tracker.restore_all()?;
            Some((tracker, screen))
        }
        _ => None,
    };

    let view = progress.as_ref().map(|(tracker, screen)| (tracker, *screen));
    print!("{}", format_candidates(&snapshot, view));
    Ok(())
}

/// Candidates grouped by gesture kind in priority order. Visited ones are
/// marked with `*`, and the selector's next pick is printed last.
pub fn format_candidates(snapshot: &HierarchySnapshot, progress: Option<(&VisitedTracker, &str)>) -> String {
    let mut out = String::new();
    let candidates = all_candidates(snapshot);

    for kind in GestureKind::ALL {
        let of_kind: Vec<_> = candidates.iter().filter(|c| c.kind == kind).collect();
        if of_kind.is_empty() {
            continue;
        }

        let _ = writeln!(out, "{} ({})", kind, of_kind.len());
        for c in of_kind {
            let visited = progress
                .map(|(tracker, screen)| tracker.has_visited(screen, &c.action))
                .unwrap_or(false);
            let _ = writeln!(out, "  {} {}", if visited { "*" } else { " " }, c.path);
        }
    }

    let next = match progress {
        Some((tracker, screen)) => next_candidate(snapshot, tracker, screen),
        None => candidates.into_iter().next(),
    };

    match next {
        Some(c) => {
            let _ = writeln!(out, "next: {}", c.action);
        }
        None => {
            let _ = writeln!(out, "next: (drained)");
        }
    }

    out
}

use rand::Rng;
use tracing::{debug, info, warn};

use crate::dataset::artifact_store::{ArtifactStore, AttemptDir, Stage};
use crate::device::gestures::execute_plan;
use crate::device::transport::DeviceTransport;
use crate::device::wait::wait_for_stable;
use crate::error::ProbeError;
use crate::gesture::coordinates::plan_gesture;
use crate::gesture::gesture_model::{ActionRecord, GesturePlan, ScreenSize};
use crate::hierarchy::{bounds::Bounds, hierarchy_model::HierarchySnapshot};
use crate::oracle::view_oracle::judge;
use crate::state::progress::VisitedTracker;
use crate::trace::logger::TraceLogger;
use crate::trace::trace::{TraceEvent, fingerprint};

use super::budget::{BudgetDecision, FailureBudget};
use super::explorer_model::{AppTarget, AttemptOutcome, ExplorerConfig, LoopState, ScreenReport, ScreenTarget};
use super::recovery::{TeardownPolicy, ensure_app_running, navigate_to_screen, restore_baseline};
use super::selector::{Candidate, next_candidate};

// ============================================================================
// Per-screen loop
// ============================================================================

/// Drives one app's screens on a single device, one gesture at a time.
pub struct ScreenExplorer<'a, T: DeviceTransport + ?Sized, R: Rng> {
    transport: &'a mut T,
    config: &'a ExplorerConfig,
    tracker: &'a mut VisitedTracker,
    store: ArtifactStore,
    tracer: &'a TraceLogger,
    rng: R,
    policy: TeardownPolicy,
    budget: FailureBudget,
    screen_size: Option<ScreenSize>,
    state: LoopState,
}

impl<'a, T: DeviceTransport + ?Sized, R: Rng> ScreenExplorer<'a, T, R> {
    pub fn new(
        transport: &'a mut T,
        config: &'a ExplorerConfig,
        tracker: &'a mut VisitedTracker,
        tracer: &'a TraceLogger,
        rng: R,
    ) -> Self {
        Self {
            transport,
            store: ArtifactStore::new(config.dataset_dir.clone()),
            budget: FailureBudget::new(config.budget),
            config,
            tracker,
            tracer,
            rng,
            policy: config.teardown.clone(),
            screen_size: None,
            state: LoopState::Selecting,
        }
    }

    pub fn with_policy(mut self, policy: TeardownPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Explore `screen` until no unvisited candidate is left.
    ///
    /// The device is expected to already show the screen. A failed attempt
    /// is logged, persisted and followed by a reset; only an exhausted
    /// failure budget ends the loop early, with `TransportLost`.
    pub fn run(&mut self, screen: &ScreenTarget) -> Result<ScreenReport, ProbeError> {
        let mut report = ScreenReport::new(&screen.name);

        match self.tracker.visited_count(&screen.name) {
            0 => info!(screen = %screen.name, "no previous test records for this screen"),
            n => info!(screen = %screen.name, visited = n, "resuming screen"),
        }

        loop {
            self.state = LoopState::Selecting;

            let selection = self.select(&screen.name);
            let (snapshot, candidate) = match selection {
                Ok(Some(found)) => found,
                Ok(None) => {
                    self.state = LoopState::Drained;
                    break;
                }
                Err(e) => {
                    warn!(screen = %screen.name, error = %e, "candidate selection failed");
                    report.failures += 1;
                    self.trace(TraceEvent::now(&self.config.app_package, &screen.name).with_error(&e));
                    self.handle_failure(&screen.name, None)?;
                    self.reset(screen);
                    continue;
                }
            };

            info!(
                screen = %screen.name,
                gesture = %candidate.kind,
                path = %candidate.path,
                "testing element"
            );

            match self.attempt(&screen.name, &snapshot, &candidate) {
                Ok(outcome) => {
                    report.attempts += 1;
                    if outcome.changed {
                        report.changed += 1;
                        info!(gesture = %candidate.kind, "change detected");
                    } else {
                        info!(gesture = %candidate.kind, "no change detected, artifacts deleted");
                    }
                    self.budget.record_success();
                    self.trace(
                        TraceEvent::now(&self.config.app_package, &screen.name)
                            .with_candidate(&candidate)
                            .with_changed(outcome.changed)
                            .with_fingerprints(outcome.before_fingerprint, outcome.after_fingerprint),
                    );
                }
                Err(e) => {
                    warn!(action = %candidate.action, error = %e, "attempt failed");
                    report.failures += 1;
                    self.trace(
                        TraceEvent::now(&self.config.app_package, &screen.name)
                            .with_candidate(&candidate)
                            .with_error(&e),
                    );
                    self.persist(&screen.name);
                    self.handle_failure(&screen.name, Some(&candidate))?;
                }
            }

            self.reset(screen);
        }

        self.tracker.persist(&screen.name)?;
        report.drained = true;

        info!(
            screen = %report.screen,
            attempts = report.attempts,
            changed = report.changed,
            failures = report.failures,
            "screen drained"
        );

        Ok(report)
    }

    /// Fresh snapshot plus the first unvisited candidate in it.
    fn select(&mut self, screen: &str) -> Result<Option<(HierarchySnapshot, Candidate)>, ProbeError> {
        let source = self.transport.page_source()?;
        let snapshot = HierarchySnapshot::parse(&source)?;

        Ok(next_candidate(&snapshot, self.tracker, screen).map(|c| (snapshot, c)))
    }

    fn attempt(
        &mut self,
        screen: &str,
        snapshot: &HierarchySnapshot,
        candidate: &Candidate,
    ) -> Result<AttemptOutcome, ProbeError> {
        let bounds = snapshot
            .get(candidate.node)
            .and_then(|n| n.bounds)
            .ok_or_else(|| ProbeError::MissingArtifact(format!("bounds for {}", candidate.path)))?;

        let screen_size = self.screen_size()?;
        let plan = plan_gesture(candidate.kind, snapshot, candidate.node, screen_size, &mut self.rng)
            .ok_or_else(|| ProbeError::MissingArtifact(format!("gesture plan for {}", candidate.path)))?;

        let dir = self
            .store
            .begin_attempt(&self.config.app_package, screen, candidate.kind)?;

        let captured = self.execute_and_capture(&dir, candidate, &plan, bounds);
        let (before_xml, after_xml) = match captured {
            Ok(pair) => pair,
            Err(e) => {
                if let Err(discard_err) = dir.discard() {
                    warn!(error = %discard_err, "could not discard failed attempt");
                }
                return Err(e);
            }
        };

        self.state = LoopState::Judging;
        let changed = judge(candidate.kind, &dir, self.config.pixel_threshold);

        self.state = LoopState::Recording;
        let artifacts = if changed {
            Some(dir.path().to_path_buf())
        } else {
            if let Err(e) = dir.discard() {
                warn!(error = %e, "could not discard unchanged attempt");
            }
            None
        };

        self.tracker.mark_visited(screen, candidate.action.clone());
        self.persist(screen);

        Ok(AttemptOutcome {
            action: candidate.action.clone(),
            kind: candidate.kind,
            path: candidate.path.clone(),
            plan,
            artifacts,
            changed,
            before_fingerprint: Some(fingerprint(&before_xml)),
            after_fingerprint: Some(fingerprint(&after_xml)),
        })
    }

    /// Before capture, gesture (with during capture), stabilization, after
    /// capture. Returns the before and after hierarchy text.
    fn execute_and_capture(
        &mut self,
        dir: &AttemptDir,
        candidate: &Candidate,
        plan: &GesturePlan,
        bounds: Bounds,
    ) -> Result<(String, String), ProbeError> {
        self.state = LoopState::Capturing;
        let before_xml = capture_stage(self.transport, dir, Stage::Before)?;
        dir.save_action(&ActionRecord::from_plan(candidate.kind, bounds, plan))?;
        dir.save_element_path(&candidate.path)?;

        self.state = LoopState::Executing;
        let during = candidate.kind.captures_during();
        execute_plan(self.transport, plan, &self.config.timings, |t| {
            if during {
                capture_stage(t, dir, Stage::During).map(|_| ())
            } else {
                Ok(())
            }
        })?;

        wait_for_stable(self.transport, &self.config.stability);

        self.state = LoopState::Capturing;
        let after_xml = capture_stage(self.transport, dir, Stage::After)?;

        Ok((before_xml, after_xml))
    }

    fn screen_size(&mut self) -> Result<ScreenSize, ProbeError> {
        if let Some(size) = self.screen_size {
            return Ok(size);
        }
        let size = self.transport.window_size()?;
        self.screen_size = Some(size);
        Ok(size)
    }

    fn handle_failure(&mut self, screen: &str, candidate: Option<&Candidate>) -> Result<(), ProbeError> {
        match self.budget.record_failure(candidate.map(|c| &c.action)) {
            BudgetDecision::Retry => Ok(()),
            BudgetDecision::Skip => {
                if let Some(candidate) = candidate {
                    warn!(action = %candidate.action, "action keeps failing, marking visited");
                    self.tracker.mark_visited(screen, candidate.action.clone());
                    self.persist(screen);
                }
                Ok(())
            }
            BudgetDecision::Abort(reason) => {
                self.persist(screen);
                Err(ProbeError::TransportLost(format!(
                    "{} after {} failed cycles on screen '{}'",
                    reason,
                    self.budget.consecutive_failures(),
                    screen
                )))
            }
        }
    }

    fn persist(&mut self, screen: &str) {
        if let Err(e) = self.tracker.persist(screen) {
            warn!(screen, error = %e, "could not persist progress");
        }
    }

    fn reset(&mut self, screen: &ScreenTarget) {
        self.state = LoopState::Resetting;
        let result = restore_baseline(
            self.transport,
            &self.config.app_package,
            Some(&screen.navigate),
            &self.policy,
            &self.config.stability,
            &self.config.timings,
        );
        if let Err(e) = result {
            warn!(screen = %screen.name, error = %e, "could not return to screen baseline");
        }
    }

    fn trace(&self, event: TraceEvent) {
        self.tracer.log(&event);
    }
}

/// Save screenshot, raw and simplified hierarchy for one stage. Returns
/// the raw hierarchy text.
pub fn capture_stage<T: DeviceTransport + ?Sized>(
    transport: &mut T,
    dir: &AttemptDir,
    stage: Stage,
) -> Result<String, ProbeError> {
    transport.save_screenshot(&dir.stage_file(stage, "png"))?;
    let xml = transport.page_source()?;
    dir.save_hierarchy(stage, &xml)?;
    debug!(stage = %stage, dir = %dir.path().display(), "stage captured");
    Ok(xml)
}

// ============================================================================
// Whole app
// ============================================================================

/// Explore every screen of `app` in order, or only `only_screen` when set.
///
/// Progress is restored from disk first, so already-visited actions are
/// skipped. Between screens the device is reset to the app's home state.
pub fn explore_app<T: DeviceTransport + ?Sized, R: Rng>(
    transport: &mut T,
    app: &AppTarget,
    config: &ExplorerConfig,
    tracer: &TraceLogger,
    rng: R,
    only_screen: Option<&str>,
) -> Result<Vec<ScreenReport>, ProbeError> {
    let mut tracker = VisitedTracker::open(&config.progress_dir, &app.package)?;

    info!(app = %app.package, "start testing app");
    ensure_app_running(transport, &app.package, &config.stability)?;

    let screens: Vec<&ScreenTarget> = app
        .screens
        .iter()
        .filter(|s| only_screen.map(|name| s.name == name).unwrap_or(true))
        .collect();

    if screens.is_empty() {
        warn!(app = %app.package, "no screens to explore");
    }

    let mut explorer = ScreenExplorer::new(transport, config, &mut tracker, tracer, rng);
    let mut reports = Vec::with_capacity(screens.len());

    for (i, screen) in screens.iter().enumerate() {
        info!(screen = %screen.name, "starting screen");

        navigate_to_screen(explorer.transport, &screen.navigate, &config.stability)?;
        reports.push(explorer.run(screen)?);

        if i + 1 < screens.len() {
            if let Err(e) = restore_baseline(
                explorer.transport,
                &app.package,
                None,
                &explorer.policy,
                &config.stability,
                &config.timings,
            ) {
                warn!(error = %e, "could not reset between screens");
            }
        }
    }

    if let Err(e) = explorer.transport.terminate_app(&app.package) {
        warn!(app = %app.package, error = %e, "could not terminate app after run");
    }

    Ok(reports)
}

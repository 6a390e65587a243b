use std::collections::HashMap;

use crate::gesture::gesture_model::ActionId;

use super::explorer_model::BudgetConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BudgetDecision {
    /// Leave the action unvisited; it will be selected again
    Retry,
    /// The action has failed too often; record it as visited
    Skip,
    /// Too many failed cycles in a row
    Abort(&'static str),
}

/// Failure accounting for the exploration loop.
#[derive(Debug, Clone)]
pub struct FailureBudget {
    config: BudgetConfig,
    per_action: HashMap<ActionId, u32>,
    consecutive: u32,
}

impl FailureBudget {
    pub fn new(config: BudgetConfig) -> Self {
        Self {
            config,
            per_action: HashMap::new(),
            consecutive: 0,
        }
    }

    pub fn record_success(&mut self) {
        self.consecutive = 0;
    }

    /// Count a failed cycle. `action` is `None` when the failure happened
    /// before a candidate was chosen.
    pub fn record_failure(&mut self, action: Option<&ActionId>) -> BudgetDecision {
        self.consecutive += 1;

        // ---- Consecutive budget ----
        if self.consecutive >= self.config.max_consecutive_failures {
            return BudgetDecision::Abort("consecutive_failures_exhausted");
        }

        // ---- Per-action budget ----
        let Some(action) = action else {
            return BudgetDecision::Retry;
        };

        let count = self.per_action.entry(action.clone()).or_insert(0);
        *count += 1;

        if *count >= self.config.max_attempt_failures {
            BudgetDecision::Skip
        } else {
            BudgetDecision::Retry
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive
    }

    pub fn failures_of(&self, action: &ActionId) -> u32 {
        self.per_action.get(action).copied().unwrap_or(0)
    }
}

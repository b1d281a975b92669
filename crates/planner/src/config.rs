//! Planner configuration parameters.

use olop_core::{PlanningError, Result};

/// Configuration for open-loop optimistic planning.
#[derive(Clone, Debug)]
pub struct PlannerConfig {
    /// Maximum number of oracle calls per planning invocation.
    pub budget: usize,

    /// Discount factor applied to future rewards.
    /// Must lie strictly inside (0, 1) for the optimistic bound to stay finite.
    pub gamma: f32,

    /// Replay the action sequence from the root instead of branching from a
    /// cloned snapshot during expansion. Models environments whose cloning
    /// is unreliable.
    pub restart: bool,

    /// Whether terminal leaves remain eligible for the expansion attempt.
    /// When false they are skipped, but bounds are still backed up from them.
    pub ignore_terminal: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            budget: 500,
            gamma: 0.8,
            restart: false,
            ignore_terminal: true,
        }
    }
}

impl PlannerConfig {
    /// Create a new config with the specified oracle-call budget.
    pub fn with_budget(budget: usize) -> Self {
        Self {
            budget,
            ..Default::default()
        }
    }

    /// Builder pattern: set the discount factor.
    pub fn with_gamma(mut self, gamma: f32) -> Self {
        self.gamma = gamma;
        self
    }

    /// Builder pattern: set replay-from-root expansion.
    pub fn with_restart(mut self, restart: bool) -> Self {
        self.restart = restart;
        self
    }

    /// Builder pattern: set whether terminal leaves are expanded.
    pub fn with_ignore_terminal(mut self, ignore_terminal: bool) -> Self {
        self.ignore_terminal = ignore_terminal;
        self
    }

    /// Check that the configuration is usable for planning.
    ///
    /// # Errors
    /// Returns an error for a zero budget or a discount factor outside (0, 1).
    pub fn validate(&self) -> Result<()> {
        if self.budget == 0 {
            return Err(PlanningError::InvalidBudget);
        }
        if !(self.gamma > 0.0 && self.gamma < 1.0) {
            return Err(PlanningError::InvalidGamma(self.gamma));
        }
        Ok(())
    }
}

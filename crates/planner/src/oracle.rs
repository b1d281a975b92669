//! Metered access to the environment's transition function.

use olop_core::{Action, Environment};

/// Wraps an environment and counts every transition call.
///
/// The call counter is the planner's sole cancellation mechanism: it is
/// compared against the budget after each invocation and triggers
/// cooperative early exit once the budget is reached. Exactly one unit is
/// consumed per call.
#[derive(Debug)]
pub struct SimulationOracle<E: Environment> {
    env: E,
    calls: usize,
}

impl<E: Environment> SimulationOracle<E> {
    /// Create an oracle around `env` with a zeroed counter.
    pub fn new(env: E) -> Self {
        Self { env, calls: 0 }
    }

    /// Advance `state` in place, consuming one unit of budget.
    pub fn step_state(
        &mut self,
        state: &mut E::State,
        action: Action,
    ) -> (E::Observation, f32, bool) {
        self.calls += 1;
        self.env.step(state, action)
    }

    /// Number of transition calls consumed since the last reset.
    pub fn calls(&self) -> usize {
        self.calls
    }

    /// Reset the call counter (done at the start of each planning call).
    pub fn reset_calls(&mut self) {
        self.calls = 0;
    }

    /// The wrapped environment.
    pub fn env(&self) -> &E {
        &self.env
    }
}

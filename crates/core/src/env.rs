/// A dense integer action identifier.
///
/// Environments expose a discrete action space of size `n`; actions are
/// the integers `0..n`.
pub type Action = usize;

/// A deterministic sequential decision process.
///
/// This trait defines the interface any environment must implement to be
/// planned over. Transitions must be strictly deterministic: stepping the
/// same state with the same action always yields the same successor,
/// reward and termination flag. States must support independent cloning so
/// the planner can branch from a snapshot without aliasing.
pub trait Environment: Clone + Send {
    /// The environment state (an opaque simulator snapshot)
    type State: Clone + Send;

    /// The observation emitted alongside each transition
    type Observation;

    /// Returns the initial state of the environment
    fn initial_state(&self) -> Self::State;

    /// Returns the size of the discrete action space at the given state
    fn action_count(&self, state: &Self::State) -> usize;

    /// Advances `state` in place by applying `action`.
    ///
    /// Returns the resulting observation, the immediate reward (expected
    /// to be normalized into `[0, 1]`, enforced downstream) and whether
    /// the episode terminated on this transition.
    fn step(&self, state: &mut Self::State, action: Action) -> (Self::Observation, f32, bool);
}

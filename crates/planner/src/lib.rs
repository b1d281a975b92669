//! Open-loop optimistic planning for deterministic environments.
//!
//! This crate provides a generic lookahead-tree planner that works with any
//! environment implementing the `olop_core::Environment` trait.
//!
//! # Overview
//!
//! The planner grows an action tree under a strict budget of environment
//! transitions. Each cycle:
//!
//! 1. **Leaf choice**: pick the frontier leaf with the highest optimistic
//!    upper bound on achievable discounted return
//! 2. **Expansion**: simulate every available action once from that leaf,
//!    creating its children
//! 3. **Backup**: propagate the fresh estimates from the expanded leaf up
//!    to the root
//!
//! Once the budget is spent, the greedy action sequence is read off the
//! cached values. Between decision steps, [`Olop::step_by_subtree`] commits
//! an action: the sibling branches are discarded and every retained cached
//! return is rescaled into the new root's frame of reference.
//!
//! # Example
//!
//! ```
//! use olop_core::Environment;
//! use olop_planner::{envs::ChainWalk, Olop, PlannerConfig};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let env = ChainWalk::new(6);
//! let config = PlannerConfig::with_budget(60).with_gamma(0.85);
//! let rng = ChaCha8Rng::seed_from_u64(42);
//! let mut planner = Olop::new(config, env.clone(), rng).unwrap();
//!
//! let plan = planner.plan(env.initial_state()).unwrap();
//! assert!(!plan.is_empty());
//!
//! // Commit the first action before the next planning call.
//! planner.step_by_subtree(plan[0]);
//! ```
//!
//! # Configuration
//!
//! The [`PlannerConfig`] struct controls planning behavior:
//!
//! - `budget`: maximum oracle calls per planning invocation (default: 500)
//! - `gamma`: discount factor in (0, 1) (default: 0.8)
//! - `restart`: replay-from-root expansion for environments whose cloning
//!   is unreliable (default: off)
//! - `ignore_terminal`: whether terminal leaves stay eligible for
//!   expansion (default: on)

pub mod config;
pub mod envs;
pub mod node;
pub mod oracle;
pub mod planner;
pub mod tree;

pub use config::PlannerConfig;
pub use node::{Node, NodeId};
pub use oracle::SimulationOracle;
pub use planner::Olop;
pub use tree::Tree;

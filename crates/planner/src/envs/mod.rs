//! Demo environments for planner validation.
//!
//! These environments are used to verify planner behavior before applying
//! it to real simulators.

pub mod chain;

pub use chain::{ChainWalk, LEFT, RIGHT};

//! Milestone dependency graph.
//!
//! ## Submodules
//!
//! - [`blocking`]: which milestones block which, and edge release on completion.
//! - [`cycles`]: cycle detection when new blocking edges are added.
//! - [`unlock`]: notices produced when a completed milestone releases its edges.

pub mod blocking;
pub mod cycles;
pub mod unlock;

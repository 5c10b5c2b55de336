// src/dag/mod.rs

//! Artifact dependency graph and build planning.
//!
//! - [`graph`] holds the explicit dependency graph, indexed by [`ArtifactId`].
//! - [`plan`] runs Kahn's algorithm over it; artifacts that never reach
//!   in-degree zero (cycles and everything downstream of them) come back as
//!   `unresolved` instead of being silently dropped.

pub mod graph;
pub mod plan;

pub use graph::{ArtifactGraph, ArtifactId};
pub use plan::BuildPlan;

// src/build/mod.rs

//! Building software from source archives.
//!
//! - [`artifact`]: a downloadable source archive and the paths and configure
//!   line derived from it.
//! - [`status`]: per-artifact build status, kept in the orchestrator's own
//!   table rather than on the artifacts.
//! - [`orchestrator`]: drives artifacts through fetch → unpack → configure →
//!   make → make install in dependency order.
//! - [`packages`]: OS package prerequisites checked before building.

pub mod artifact;
pub mod orchestrator;
pub mod packages;
pub mod status;

pub use artifact::ArtifactSource;
pub use orchestrator::{BuildOrchestrator, BuildReport, BuildSettings};
pub use packages::{PackageCheck, PackageReport};
pub use status::{ArtifactStatus, StatusTable};

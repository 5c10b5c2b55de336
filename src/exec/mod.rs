// src/exec/mod.rs

//! Process execution layer.
//!
//! Every external program (downloads, `tar`, `./configure`, `make`, `patch`,
//! `kill`, package manager, ...) goes through a [`CommandRunner`], so the
//! orchestration logic can be exercised with a fake runner in tests.
//!
//! - [`command`] describes a single invocation ([`CommandSpec`]), including
//!   its working directory; nothing here ever changes the process cwd.
//! - [`runner`] holds the [`CommandRunner`] trait and the production
//!   [`SystemRunner`] built on `tokio::process`.

pub mod command;
pub mod runner;

pub use command::{CommandSpec, OutputMode};
pub use runner::{CommandRunner, RunFuture, SystemRunner};

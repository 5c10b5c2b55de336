// src/errors.rs

//! Crate-wide error type and `Result` alias.
//!
//! The provisioning and verification failures are first-class variants so
//! that callers (and tests) can match on them; low-level plumbing errors are
//! funnelled through `Other`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClusterlabError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// An external program exited with a non-zero status in a checked call.
    #[error("command `{command}` failed with exit code {code}")]
    CommandFailure { command: String, code: i32 },

    /// No artifact can be built but some are still not ready.
    #[error("cannot resolve build order; unresolved artifacts: {}", unresolved.join(", "))]
    OrchestrationStall { unresolved: Vec<String> },

    /// The deployed service never answered with a success status.
    #[error("service did not become reachable after {attempts} attempts")]
    ReachabilityTimeout { attempts: u32 },

    /// A bound session was routed to a different backend.
    #[error("session affinity violated: expected route {expected}, observed {observed}")]
    AffinityViolation { expected: String, observed: String },

    /// After terminating a backend, the next request did not land on the survivor.
    #[error("failover violated: expected route {expected}, observed {observed}")]
    FailoverViolation { expected: String, observed: String },

    #[error("no configured backend serves route {0}")]
    UnmatchedRoute(String),

    #[error("pid file {path:?}: {reason}")]
    PidFile { path: PathBuf, reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ClusterlabError>;

// src/verify/mod.rs

//! Black-box verification of sticky sessions and failover.
//!
//! The scenario is a small state machine (see [`verifier::Phase`]):
//!
//! - **Waiting**: poll the endpoint (bounded) until it answers 200; that
//!   response's route is the one the session is bound to.
//! - **Bound**: a few more requests must all come back with that route.
//! - **Failover**: the bound backend is killed with `kill -9` using the pid
//!   recorded in its pid file.
//! - **Reassigned**: the next request must come back with the other
//!   backend's route.

pub mod pidfile;
pub mod probe;
pub mod route;
pub mod verifier;

pub use probe::{HttpProbe, ProbeResponse, ReqwestProbe};
pub use route::{Route, RouteExtractor};
pub use verifier::{Backend, DeploymentVerifier, Phase, VerificationReport, VerifyOptions};

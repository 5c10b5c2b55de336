// src/config/mod.rs

//! Configuration loading and validation for clusterlab.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate references between sections (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{
    ArtifactConfig, BackendConfig, BuildSection, ConfigFile, ConfigSection, HostSection,
    PackagesSection, PatchConfig, RawConfigFile, StepConfig, VerifySection,
};

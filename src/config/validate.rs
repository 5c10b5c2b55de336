// src/config/validate.rs

use std::collections::HashSet;

use crate::config::model::{ConfigFile, RawConfigFile, VerifySection};
use crate::errors::{ClusterlabError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = ClusterlabError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_build_section(cfg)?;
    validate_artifact_dependencies(cfg)?;
    validate_steps(cfg)?;
    if let Some(verify) = &cfg.verify {
        validate_verify(verify)?;
    }
    Ok(())
}

fn validate_build_section(cfg: &RawConfigFile) -> Result<()> {
    if cfg.build.fetch.is_empty() || cfg.build.unpack.is_empty() {
        return Err(ClusterlabError::ConfigError(
            "[build].fetch and [build].unpack must name a program".to_string(),
        ));
    }
    Ok(())
}

// Cycles are not checked here; `dag::BuildPlan` reports them as an
// orchestration stall naming every unresolved artifact.
fn validate_artifact_dependencies(cfg: &RawConfigFile) -> Result<()> {
    for (name, artifact) in cfg.artifact.iter() {
        if artifact.url.trim().is_empty() {
            return Err(ClusterlabError::ConfigError(format!(
                "artifact '{}' has an empty `url`",
                name
            )));
        }
        for dep in artifact.after.iter() {
            if dep == name {
                return Err(ClusterlabError::ConfigError(format!(
                    "artifact '{}' cannot depend on itself in `after`",
                    name
                )));
            }
            if !cfg.artifact.contains_key(dep) {
                return Err(ClusterlabError::ConfigError(format!(
                    "artifact '{}' has unknown dependency '{}' in `after`",
                    name, dep
                )));
            }
        }
    }
    Ok(())
}

fn validate_steps(cfg: &RawConfigFile) -> Result<()> {
    for (idx, step) in cfg.step.iter().enumerate() {
        if step.cmd.is_empty() {
            return Err(ClusterlabError::ConfigError(format!(
                "[[step]] #{} has an empty `cmd`",
                idx + 1
            )));
        }
    }
    Ok(())
}

fn validate_verify(verify: &VerifySection) -> Result<()> {
    if verify.attempts == 0 {
        return Err(ClusterlabError::ConfigError(
            "[verify].attempts must be >= 1 (got 0)".to_string(),
        ));
    }

    if verify.backend.len() != 2 {
        return Err(ClusterlabError::ConfigError(format!(
            "[verify] needs exactly two [[verify.backend]] entries (got {})",
            verify.backend.len()
        )));
    }

    let mut routes = HashSet::new();
    for backend in verify.backend.iter() {
        if !routes.insert(backend.route.as_str()) {
            return Err(ClusterlabError::ConfigError(format!(
                "backends share the route '{}'",
                backend.route
            )));
        }
    }

    Ok(())
}

// src/provision/vars.rs

//! `{name}` interpolation for step commands, patch targets and URLs.
//!
//! Recognised placeholders:
//! - `{ip}`: host address
//! - `{work_dir}`, `{install_root}`
//! - `{install.<artifact>}`: install directory of an artifact
//!
//! Any other `{...}` is left untouched so shell snippets and sed
//! expressions pass through; an `{install.<x>}` naming an unknown artifact is
//! an error.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::build::orchestrator::artifacts_from_config;
use crate::config::ConfigFile;
use crate::errors::{ClusterlabError, Result};

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{([a-z_]+)(?:\.([A-Za-z0-9_-]+))?\}").expect("vars regex is valid")
    })
}

#[derive(Debug, Clone)]
pub struct Vars {
    ip: String,
    work_dir: PathBuf,
    install_root: PathBuf,
    installs: BTreeMap<String, PathBuf>,
}

impl Vars {
    pub fn new(ip: impl Into<String>, work_dir: &Path, install_root: &Path) -> Self {
        Self {
            ip: ip.into(),
            work_dir: work_dir.to_path_buf(),
            install_root: install_root.to_path_buf(),
            installs: BTreeMap::new(),
        }
    }

    /// Variables for every artifact in `cfg`.
    pub fn from_config(cfg: &ConfigFile, ip: impl Into<String>) -> Self {
        let mut vars = Self::new(ip, &cfg.config.work_dir, &cfg.config.install_root);
        for artifact in artifacts_from_config(cfg) {
            let dir = artifact.install_dir(&cfg.config.install_root);
            vars.installs.insert(artifact.name().to_string(), dir);
        }
        vars
    }

    pub fn with_install(mut self, artifact: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        self.installs.insert(artifact.into(), dir.into());
        self
    }

    pub fn ip(&self) -> &str {
        &self.ip
    }

    pub fn interpolate(&self, input: &str) -> Result<String> {
        let mut out = String::with_capacity(input.len());
        let mut last = 0;

        for caps in placeholder().captures_iter(input) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let Some(value) = self.lookup(&caps)? else {
                continue;
            };
            out.push_str(&input[last..whole.start()]);
            out.push_str(&value);
            last = whole.end();
        }

        out.push_str(&input[last..]);
        Ok(out)
    }

    pub fn interpolate_all(&self, inputs: &[String]) -> Result<Vec<String>> {
        inputs.iter().map(|s| self.interpolate(s)).collect()
    }

    fn lookup(&self, caps: &Captures<'_>) -> Result<Option<String>> {
        let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let key = caps.get(2).map(|m| m.as_str());

        let value = match (name, key) {
            ("ip", None) => Some(self.ip.clone()),
            ("work_dir", None) => Some(self.work_dir.display().to_string()),
            ("install_root", None) => Some(self.install_root.display().to_string()),
            ("install", Some(artifact)) => {
                let dir = self.installs.get(artifact).ok_or_else(|| {
                    ClusterlabError::ConfigError(format!(
                        "{{install.{}}} refers to an unknown artifact",
                        artifact
                    ))
                })?;
                Some(dir.display().to_string())
            }
            _ => None,
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> Vars {
        Vars::new("10.0.0.5", Path::new("/build"), Path::new("/tmp/usr/local"))
            .with_install("apache", "/tmp/usr/local/apache")
    }

    #[test]
    fn substitutes_known_names() {
        let out = vars()
            .interpolate("--with-apxs={install.apache}/bin/apxs on {ip} in {work_dir}")
            .unwrap();
        assert_eq!(out, "--with-apxs=/tmp/usr/local/apache/bin/apxs on 10.0.0.5 in /build");
    }

    #[test]
    fn leaves_unrelated_braces_alone() {
        let input = "awk '{print}' {0} ${HOME}";
        assert_eq!(vars().interpolate(input).unwrap(), input);
    }

    #[test]
    fn unknown_artifact_is_an_error() {
        assert!(vars().interpolate("{install.nginx}").is_err());
    }
}

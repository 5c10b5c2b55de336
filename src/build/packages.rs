// src/build/packages.rs

use std::sync::Arc;

use tracing::{info, warn};

use crate::errors::Result;
use crate::exec::{CommandRunner, CommandSpec, OutputMode};

/// Outcome of [`PackageCheck::ensure_installed`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageReport {
    pub already_installed: Vec<String>,
    pub installed: Vec<String>,
    /// Packages whose installation returned non-zero.
    pub failed: Vec<String>,
}

/// Checks and installs OS packages through a dnf-style package manager
/// (`<manager> list installed <pkg>`, `<manager> install -y <pkg>`).
pub struct PackageCheck {
    manager: String,
    runner: Arc<dyn CommandRunner>,
}

impl PackageCheck {
    pub fn new(manager: impl Into<String>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            manager: manager.into(),
            runner,
        }
    }

    pub async fn is_installed(&self, package: &str) -> Result<bool> {
        let spec = CommandSpec::new(&self.manager)
            .args(["list", "installed", package])
            .output(OutputMode::Quiet);
        Ok(self.runner.run(&spec).await? == 0)
    }

    pub async fn install(&self, package: &str) -> Result<bool> {
        let spec = CommandSpec::new(&self.manager)
            .args(["install", "-y", package])
            .output(OutputMode::Forward);
        Ok(self.runner.run(&spec).await? == 0)
    }

    /// Install whatever is missing. A failed install is logged and recorded;
    /// it does not stop the remaining packages from being checked.
    pub async fn ensure_installed(&self, packages: &[String]) -> Result<PackageReport> {
        let mut report = PackageReport::default();

        for package in packages {
            if self.is_installed(package).await? {
                info!(package = %package, "package is installed");
                report.already_installed.push(package.clone());
                continue;
            }

            info!(package = %package, "package is not installed; installing");
            if self.install(package).await? {
                report.installed.push(package.clone());
            } else {
                warn!(package = %package, "package installation failed");
                report.failed.push(package.clone());
            }
        }

        Ok(report)
    }
}

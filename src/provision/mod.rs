// src/provision/mod.rs

//! Full provisioning pipeline.
//!
//! Stages, in order:
//! 1. OS packages (`[packages]`): missing ones are installed; failures are
//!    logged.
//! 2. Artifacts (`[artifact.*]`): built by the [`BuildOrchestrator`]; any
//!    failure aborts provisioning.
//! 3. Steps (`[[step]]`): arbitrary commands such as module builds, config
//!    downloads, firewall rules and server restarts. Checked steps abort on
//!    failure, unchecked ones are logged.
//! 4. Patches (`[[patch]]`): applied with the [`PatchApplier`]; rejections
//!    are logged.
//! 5. Steps marked `after_patches`, with the same rules as stage 3.

pub mod vars;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::build::{BuildOrchestrator, BuildReport, PackageCheck, PackageReport};
use crate::config::{ConfigFile, PatchConfig, StepConfig};
use crate::errors::{ClusterlabError, Result};
use crate::exec::{CommandRunner, CommandSpec, OutputMode};
use crate::fs::FileSystem;
use crate::patch::{PatchApplier, PatchOutcome};

pub use vars::Vars;

/// What a provisioning run did.
#[derive(Debug, Clone)]
pub struct ProvisionReport {
    pub packages: PackageReport,
    pub build: BuildReport,
    /// Names of unchecked steps that exited non-zero.
    pub failed_steps: Vec<String>,
    /// Patch target and outcome, in application order.
    pub patches: Vec<(PathBuf, PatchOutcome)>,
}

pub struct Provisioner {
    cfg: ConfigFile,
    /// Relative patch template paths are resolved against this.
    config_dir: PathBuf,
    runner: Arc<dyn CommandRunner>,
    fs: Arc<dyn FileSystem>,
}

impl Provisioner {
    pub fn new(
        cfg: ConfigFile,
        config_dir: impl Into<PathBuf>,
        runner: Arc<dyn CommandRunner>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            cfg,
            config_dir: config_dir.into(),
            runner,
            fs,
        }
    }

    pub fn config(&self) -> &ConfigFile {
        &self.cfg
    }

    pub fn orchestrator(&self) -> Result<BuildOrchestrator> {
        BuildOrchestrator::from_config(&self.cfg, self.runner.clone(), self.fs.clone())
    }

    pub async fn run(&self, host_ip: &str) -> Result<ProvisionReport> {
        let vars = Vars::from_config(&self.cfg, host_ip);

        info!("stage: packages");
        let packages = PackageCheck::new(&self.cfg.packages.manager, self.runner.clone())
            .ensure_installed(&self.cfg.packages.required)
            .await?;

        info!("stage: artifacts");
        let mut orchestrator = self.orchestrator()?;
        let build = orchestrator.build_all().await?;

        info!("stage: steps");
        let mut failed_steps = self.run_steps(&vars, false).await?;

        info!("stage: patches");
        let applier = PatchApplier::new(self.runner.clone(), self.fs.clone());
        let mut patches = Vec::with_capacity(self.cfg.patch.len());
        for patch in &self.cfg.patch {
            let (target, template, args) = self.patch_inputs(patch, &vars)?;
            let outcome = applier.apply(&target, &template, &args).await?;
            patches.push((target, outcome));
        }

        info!("stage: post-patch steps");
        failed_steps.extend(self.run_steps(&vars, true).await?);

        info!("provisioning finished");
        Ok(ProvisionReport {
            packages,
            build,
            failed_steps,
            patches,
        })
    }

    /// Human-readable plan for `--dry-run`: nothing is executed.
    pub fn describe(&self, host_ip: &str) -> Result<Vec<String>> {
        let vars = Vars::from_config(&self.cfg, host_ip);
        let orchestrator = self.orchestrator()?;
        let plan = orchestrator.plan();
        let mut lines = Vec::new();

        lines.push(format!("host ip: {host_ip}"));
        if !self.cfg.packages.required.is_empty() {
            lines.push(format!(
                "packages ({}): {}",
                self.cfg.packages.manager,
                self.cfg.packages.required.join(", ")
            ));
        }

        lines.push(format!("artifacts ({}):", orchestrator.graph().len()));
        for id in &plan.order {
            let artifact = orchestrator.artifact(*id);
            lines.push(format!(
                "  - {} <- {} (configure: {})",
                artifact.name(),
                artifact.url(),
                artifact.configure_command(
                    &self.cfg.config.install_root,
                    &artifact
                        .dependencies()
                        .iter()
                        .filter_map(|d| orchestrator.graph().id_of(d))
                        .map(|d| orchestrator.artifact(d))
                        .collect::<Vec<_>>()
                )
            ));
        }
        for id in &plan.unresolved {
            lines.push(format!("  ! {} (unresolvable)", orchestrator.graph().name(*id)));
        }

        let (before, after): (Vec<&StepConfig>, Vec<&StepConfig>) =
            self.cfg.step.iter().partition(|s| !s.after_patches);

        lines.push(format!("steps ({}):", before.len()));
        for step in before {
            lines.push(self.describe_step(step, &vars)?);
        }

        lines.push(format!("patches ({}):", self.cfg.patch.len()));
        for patch in &self.cfg.patch {
            let (target, template, args) = self.patch_inputs(patch, &vars)?;
            lines.push(format!(
                "  - {} with {} {:?}",
                target.display(),
                template.display(),
                args
            ));
        }

        if !after.is_empty() {
            lines.push(format!("post-patch steps ({}):", after.len()));
            for step in after {
                lines.push(self.describe_step(step, &vars)?);
            }
        }

        Ok(lines)
    }

    fn describe_step(&self, step: &StepConfig, vars: &Vars) -> Result<String> {
        let spec = self.step_command(step, vars)?;
        let cwd = spec
            .cwd
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let marker = if step.checked { "" } else { " (unchecked)" };
        Ok(format!("  - {}: `{}` in {}{}", step_name(step, &spec), spec, cwd, marker))
    }

    /// Run the steps whose `after_patches` flag equals `after_patches`,
    /// returning the names of unchecked steps that failed.
    async fn run_steps(&self, vars: &Vars, after_patches: bool) -> Result<Vec<String>> {
        let mut failed = Vec::new();
        for step in self.cfg.step.iter().filter(|s| s.after_patches == after_patches) {
            let spec = self.step_command(step, vars)?;
            let name = step_name(step, &spec);
            if step.checked {
                info!(step = %name, "running checked step");
                self.runner.run_checked(&spec).await?;
            } else {
                info!(step = %name, "running step");
                let code = self.runner.run(&spec).await?;
                if code != 0 {
                    warn!(step = %name, exit_code = code, "unchecked step failed; continuing");
                    failed.push(name);
                }
            }
        }
        Ok(failed)
    }

    fn step_command(&self, step: &StepConfig, vars: &Vars) -> Result<CommandSpec> {
        let argv = vars.interpolate_all(&step.cmd)?;
        let spec = CommandSpec::from_argv(&argv).ok_or_else(|| {
            ClusterlabError::ConfigError("[[step]] has an empty `cmd`".to_string())
        })?;

        let cwd = match &step.cwd {
            Some(dir) => {
                let dir = vars.interpolate(&dir.display().to_string())?;
                self.cfg.config.work_dir.join(dir)
            }
            None => self.cfg.config.work_dir.clone(),
        };

        let output = if step.forward_output {
            OutputMode::Forward
        } else {
            OutputMode::Log
        };
        Ok(spec.cwd(cwd).output(output))
    }

    fn patch_inputs(&self, patch: &PatchConfig, vars: &Vars) -> Result<(PathBuf, PathBuf, Vec<String>)> {
        let target = PathBuf::from(vars.interpolate(&patch.target)?);
        let template = resolve_relative(&self.config_dir, &patch.template);
        let args = vars.interpolate_all(&patch.args)?;
        Ok((target, template, args))
    }
}

fn step_name(step: &StepConfig, spec: &CommandSpec) -> String {
    step.name.clone().unwrap_or_else(|| spec.program.clone())
}

fn resolve_relative(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

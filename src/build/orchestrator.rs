// src/build/orchestrator.rs

//! Dependency-ordered build driver.
//!
//! The orchestrator owns the artifact list, its dependency graph and a status
//! table. `build_all` plans the whole build up front with Kahn's algorithm;
//! an incomplete plan is reported as [`ClusterlabError::OrchestrationStall`]
//! before any command runs. Otherwise every artifact goes through
//!
//! 1. fetch (skipped when the archive is already in the work dir)
//! 2. unpack
//! 3. `./configure --prefix=... --with-<dep>=...`
//! 4. `make`
//! 5. `make install`
//!
//! with each command given an explicit working directory. The first failing
//! step marks that artifact `Failed` and aborts the run.
//!
//! Calling `build_all` again skips artifacts that are already `Ready`. A
//! `Failed` artifact is never retried on the same orchestrator; the rerun
//! stalls and names every artifact that is not ready.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::anyhow;
use tracing::{debug, error, info};

use crate::build::artifact::ArtifactSource;
use crate::build::status::{ArtifactStatus, StatusTable};
use crate::config::ConfigFile;
use crate::dag::{ArtifactGraph, ArtifactId, BuildPlan};
use crate::errors::{ClusterlabError, Result};
use crate::exec::{CommandRunner, CommandSpec};
use crate::fs::FileSystem;

/// Where and with which programs artifacts are built.
#[derive(Debug, Clone)]
pub struct BuildSettings {
    /// Archives are fetched and unpacked here.
    pub work_dir: PathBuf,
    /// Artifacts install into `<install_root>/<name>`.
    pub install_root: PathBuf,
    /// Fetch argv prefix; the URL is appended.
    pub fetch: Vec<String>,
    /// Unpack argv prefix; the archive name is appended.
    pub unpack: Vec<String>,
    pub make: String,
}

impl BuildSettings {
    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self {
            work_dir: cfg.config.work_dir.clone(),
            install_root: cfg.config.install_root.clone(),
            fetch: cfg.build.fetch.clone(),
            unpack: cfg.build.unpack.clone(),
            make: cfg.build.make.clone(),
        }
    }
}

/// Summary of a successful `build_all`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// Artifact names in the order they were built.
    pub built: Vec<String>,
}

pub struct BuildOrchestrator {
    artifacts: Vec<ArtifactSource>,
    graph: ArtifactGraph,
    status: StatusTable,
    settings: BuildSettings,
    runner: Arc<dyn CommandRunner>,
    fs: Arc<dyn FileSystem>,
}

impl BuildOrchestrator {
    pub fn new(
        artifacts: Vec<ArtifactSource>,
        settings: BuildSettings,
        runner: Arc<dyn CommandRunner>,
        fs: Arc<dyn FileSystem>,
    ) -> Result<Self> {
        let graph = ArtifactGraph::new(&artifacts)?;
        let status = StatusTable::new(artifacts.len());
        Ok(Self {
            artifacts,
            graph,
            status,
            settings,
            runner,
            fs,
        })
    }

    /// Orchestrator over every `[artifact.<name>]` in the config.
    pub fn from_config(
        cfg: &ConfigFile,
        runner: Arc<dyn CommandRunner>,
        fs: Arc<dyn FileSystem>,
    ) -> Result<Self> {
        let artifacts = artifacts_from_config(cfg);
        Self::new(artifacts, BuildSettings::from_config(cfg), runner, fs)
    }

    pub fn plan(&self) -> BuildPlan {
        BuildPlan::new(&self.graph)
    }

    pub fn graph(&self) -> &ArtifactGraph {
        &self.graph
    }

    pub fn artifact(&self, id: ArtifactId) -> &ArtifactSource {
        &self.artifacts[id.index()]
    }

    pub fn status(&self) -> &StatusTable {
        &self.status
    }

    pub fn status_of(&self, name: &str) -> Option<ArtifactStatus> {
        self.graph.id_of(name).map(|id| self.status.get(id))
    }

    /// Drive every artifact to `Ready`, or fail on the first problem.
    pub async fn build_all(&mut self) -> Result<BuildReport> {
        let plan = self.plan();
        if !plan.is_complete() {
            let unresolved: Vec<String> = plan
                .unresolved
                .iter()
                .map(|id| self.graph.name(*id).to_string())
                .collect();
            error!(?unresolved, "failed to resolve artifact dependencies");
            return Err(ClusterlabError::OrchestrationStall { unresolved });
        }

        let failed: Vec<&str> = self
            .status
            .iter()
            .filter(|(_, s)| *s == ArtifactStatus::Failed)
            .map(|(id, _)| self.graph.name(id))
            .collect();
        if !failed.is_empty() {
            let unresolved: Vec<String> = self
                .status
                .iter()
                .filter(|(_, s)| *s != ArtifactStatus::Ready)
                .map(|(id, _)| self.graph.name(id).to_string())
                .collect();
            error!(?failed, "earlier build failed; refusing to retry on this orchestrator");
            return Err(ClusterlabError::OrchestrationStall { unresolved });
        }

        info!(
            order = ?plan.order.iter().map(|id| self.graph.name(*id)).collect::<Vec<_>>(),
            "building artifacts"
        );

        let mut built = Vec::with_capacity(plan.order.len());
        for id in plan.order {
            let name = self.graph.name(id).to_string();
            if self.status.get(id) == ArtifactStatus::Ready {
                debug!(artifact = %name, "already ready; skipping");
                continue;
            }
            self.status.mark_building(id);

            if let Err(err) = self.build_one(id).await {
                self.status.mark_failed(id);
                error!(artifact = %name, error = %err, "artifact build failed; aborting");
                return Err(err);
            }

            self.status.mark_ready(id);
            info!(artifact = %name, "artifact ready");
            built.push(name);
        }

        Ok(BuildReport { built })
    }

    async fn build_one(&self, id: ArtifactId) -> Result<()> {
        let artifact = self.artifact(id);
        let deps = self.ready_dependencies(id)?;
        let work_dir = &self.settings.work_dir;

        let archive = work_dir.join(artifact.archive_name());
        if self.fs.exists(&archive) {
            debug!(artifact = %artifact.name(), archive = ?archive, "archive present; skipping fetch");
        } else {
            info!(artifact = %artifact.name(), url = %artifact.url(), "fetching");
            let fetch = argv_spec(&self.settings.fetch, "[build].fetch")?
                .arg(artifact.url())
                .cwd(work_dir);
            self.runner.run_checked(&fetch).await?;
        }

        info!(artifact = %artifact.name(), archive = %artifact.archive_name(), "unpacking");
        let unpack = argv_spec(&self.settings.unpack, "[build].unpack")?
            .arg(artifact.archive_name())
            .cwd(work_dir);
        self.runner.run_checked(&unpack).await?;

        let install_dir = artifact.install_dir(&self.settings.install_root);
        self.fs.create_dir_all(&install_dir)?;

        let source_dir = work_dir.join(artifact.unpack_dir());
        let configure = artifact
            .configure_command(&self.settings.install_root, &deps)
            .cwd(&source_dir);
        self.runner.run_checked(&configure).await?;

        let make = CommandSpec::new(&self.settings.make).cwd(&source_dir);
        self.runner.run_checked(&make).await?;

        let install = CommandSpec::new(&self.settings.make)
            .arg("install")
            .cwd(&source_dir);
        self.runner.run_checked(&install).await?;

        Ok(())
    }

    /// Dependencies of `id` in declaration order, all of which must be ready.
    fn ready_dependencies(&self, id: ArtifactId) -> Result<Vec<&ArtifactSource>> {
        let artifact = self.artifact(id);
        let mut deps = Vec::with_capacity(artifact.dependencies().len());

        for dep_name in artifact.dependencies() {
            let dep_id = self.graph.id_of(dep_name).ok_or_else(|| {
                anyhow!("artifact '{}' lost dependency '{}'", artifact.name(), dep_name)
            })?;
            if self.status.get(dep_id) != ArtifactStatus::Ready {
                return Err(anyhow!(
                    "artifact '{}' scheduled before dependency '{}' was ready",
                    artifact.name(),
                    dep_name
                )
                .into());
            }
            deps.push(self.artifact(dep_id));
        }

        Ok(deps)
    }
}

fn argv_spec(argv: &[String], what: &str) -> Result<CommandSpec> {
    CommandSpec::from_argv(argv)
        .ok_or_else(|| ClusterlabError::ConfigError(format!("{what} is empty")))
}

/// Artifacts from `[artifact.<name>]` sections, in name order.
pub fn artifacts_from_config(cfg: &ConfigFile) -> Vec<ArtifactSource> {
    cfg.artifact
        .iter()
        .map(|(name, a)| {
            ArtifactSource::new(name.clone(), a.url.clone()).with_dependencies(a.after.iter().cloned())
        })
        .collect()
}

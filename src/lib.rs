// src/lib.rs

pub mod build;
pub mod cli;
pub mod config;
pub mod dag;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod host;
pub mod load;
pub mod logging;
pub mod patch;
pub mod provision;
pub mod verify;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use tokio::time::Duration;
use tracing::{debug, info};

use crate::build::BuildOrchestrator;
use crate::cli::{CliArgs, Command};
use crate::config::loader::{config_root_dir, load_and_validate};
use crate::config::{ConfigFile, VerifySection};
use crate::exec::{CommandRunner, SystemRunner};
use crate::fs::{FileSystem, RealFileSystem};
use crate::load::{LoadOptions, run_load};
use crate::provision::{Provisioner, Vars};
use crate::verify::{Backend, DeploymentVerifier, ReqwestProbe, VerifyOptions};

/// High-level entry point used by `main.rs`.
///
/// `load` needs no config file; every other subcommand loads and validates
/// `--config` first.
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner::new());
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    match args.command {
        Command::Load {
            url,
            requests,
            clients,
            timeout,
        } => {
            let mut opts = LoadOptions::new(&url);
            opts.requests = requests;
            opts.clients = clients;
            opts.cookie_ttl = Duration::from_micros(timeout);
            run_load_command(opts).await
        }
        Command::Plan => {
            let cfg = load_and_validate(&config_path)?;
            let orchestrator = BuildOrchestrator::from_config(&cfg, runner, fs)?;
            print_plan(&orchestrator);
            Ok(())
        }
        Command::Provision { dry_run } => {
            let cfg = load_and_validate(&config_path)?;
            let ip = host::resolve_host_ip(&cfg.host)?;
            let provisioner = Provisioner::new(cfg, config_root_dir(&config_path), runner, fs);

            if dry_run {
                println!("clusterlab dry-run");
                for line in provisioner.describe(&ip)? {
                    println!("{line}");
                }
                debug!("dry-run complete (no execution)");
                return Ok(());
            }

            let report = provisioner.run(&ip).await?;
            println!(
                "provisioned: {} package(s) installed, {} artifact(s) built, {} patch(es) applied",
                report.packages.installed.len(),
                report.build.built.len(),
                report.patches.len()
            );
            if !report.failed_steps.is_empty() {
                println!("unchecked steps that failed: {}", report.failed_steps.join(", "));
            }
            Ok(())
        }
        Command::Verify {
            start_backends,
            url,
        } => {
            let cfg = load_and_validate(&config_path)?;
            run_verify(&cfg, url, start_backends, runner, fs).await
        }
    }
}

async fn run_verify(
    cfg: &ConfigFile,
    url_override: Option<String>,
    start_backends: bool,
    runner: Arc<dyn CommandRunner>,
    fs: Arc<dyn FileSystem>,
) -> Result<()> {
    let section: VerifySection = cfg
        .verify
        .clone()
        .ok_or_else(|| anyhow!("config has no [verify] section"))?;

    let ip = host::resolve_host_ip(&cfg.host)?;
    let vars = Vars::from_config(cfg, ip);
    let url = vars.interpolate(url_override.as_deref().unwrap_or(&section.url))?;
    info!(%url, "verifying deployment");

    let probe = ReqwestProbe::new(url)?;
    let backends = section.backend.iter().map(Backend::from).collect();
    let options = VerifyOptions::from_section(&section);
    let mut verifier = DeploymentVerifier::new(probe, backends, options, runner, fs)?;

    if start_backends {
        verifier.start_backends().await?;
    }

    let report = verifier.run().await?;
    println!(
        "verified: bound to {} after {} attempt(s); killed {}; failed over to {}",
        report.route, report.bound_after_attempts, report.terminated_backend, report.failover_route
    );
    Ok(())
}

async fn run_load_command(opts: LoadOptions) -> Result<()> {
    let stats = run_load(opts).await?;
    for s in &stats {
        println!(
            "client {}: sent={} failed={} cookie_changes={} expirations={}",
            s.client, s.sent, s.failed, s.cookie_changes, s.expirations
        );
    }
    Ok(())
}

fn print_plan(orchestrator: &BuildOrchestrator) {
    let graph = orchestrator.graph();
    let plan = orchestrator.plan();

    println!("build order ({}):", plan.order.len());
    for (pos, id) in plan.order.iter().enumerate() {
        let deps: Vec<&str> = graph
            .dependencies_of(*id)
            .into_iter()
            .map(|d| graph.name(d))
            .collect();
        if deps.is_empty() {
            println!("  {}. {}", pos + 1, graph.name(*id));
        } else {
            println!("  {}. {} (after {})", pos + 1, graph.name(*id), deps.join(", "));
        }
    }

    if !plan.is_complete() {
        println!("unresolvable (dependency cycle):");
        for id in &plan.unresolved {
            println!("  - {}", graph.name(*id));
        }
    }
}

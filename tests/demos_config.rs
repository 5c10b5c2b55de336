// tests/demos_config.rs

mod common;
use crate::common::FakeRunner;

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clusterlab::config::load_and_validate;
use clusterlab::config::loader::config_root_dir;
use clusterlab::dag::BuildPlan;
use clusterlab::build::BuildOrchestrator;
use clusterlab::exec::CommandRunner;
use clusterlab::fs::{FileSystem, RealFileSystem};
use clusterlab::patch::render;
use clusterlab::provision::Provisioner;

type TestResult = Result<(), Box<dyn Error>>;

fn demo_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/clusterlab.toml")
}

#[test]
fn demo_config_is_valid_and_plans_the_apache_stack() -> TestResult {
    let cfg = load_and_validate(demo_path())?;

    let runner: Arc<dyn CommandRunner> = Arc::new(FakeRunner::new());
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let orchestrator = BuildOrchestrator::from_config(&cfg, runner, fs)?;
    let plan: BuildPlan = orchestrator.plan();

    let order: Vec<&str> = plan
        .order
        .iter()
        .map(|id| orchestrator.graph().name(*id))
        .collect();
    assert_eq!(order, vec!["apr", "apr-util", "apache"]);

    let verify = cfg.verify.as_ref().expect("demo has a [verify] section");
    assert_eq!(verify.backend.len(), 2);
    assert_eq!(verify.attempts, 120);
    assert_eq!(verify.label, "JVM route");
    Ok(())
}

#[test]
fn demo_patch_template_renders_with_the_host_ip() -> TestResult {
    let template = std::fs::read_to_string(
        Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/patches/httpd.conf.diff"),
    )?;
    let rendered = render(&template, &["10.0.0.5".to_string()])?;

    assert!(rendered.contains("> ServerName 10.0.0.5:80\n"));
    assert!(rendered.contains("> LoadModule proxy_module modules/mod_proxy.so\n"));
    Ok(())
}

#[test]
fn demo_dry_run_resolves_every_placeholder() -> TestResult {
    let path = demo_path();
    let cfg = load_and_validate(&path)?;
    let runner = FakeRunner::new();
    let runner_dyn: Arc<dyn CommandRunner> = Arc::new(runner.clone());
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    let provisioner = Provisioner::new(cfg, config_root_dir(&path), runner_dyn, fs);
    let lines = provisioner.describe("10.0.0.5")?;
    let text = lines.join("\n");

    assert!(!text.contains("{install."));
    assert!(!text.contains("{ip}"));
    assert!(text.contains("/tmp/usr/local/apache/bin/apachectl restart"));
    assert!(text.contains("[\"10.0.0.5\"]"));
    assert!(runner.calls().is_empty());
    Ok(())
}

// tests/error_handling.rs

use std::io::Write;
use std::sync::Arc;

use clusterlab::build::BuildOrchestrator;
use clusterlab::config::load_and_validate;
use clusterlab::errors::ClusterlabError;
use clusterlab::exec::SystemRunner;
use clusterlab::fs::RealFileSystem;
use tempfile::NamedTempFile;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", contents).unwrap();
    file
}

#[test]
fn test_unknown_dependency_returns_config_error() {
    let file = config_file(
        r#"
[artifact.apr-util]
url = "http://archive.apache.org/dist/apr/apr-util-1.5.4.tar.bz2"
after = ["apr"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(ClusterlabError::ConfigError(msg)) => {
            assert!(msg.contains("unknown dependency"));
            assert!(msg.contains("apr"));
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_self_dependency_returns_config_error() {
    let file = config_file(
        r#"
[artifact.apr]
url = "http://archive.apache.org/dist/apr/apr-1.5.2.tar.bz2"
after = ["apr"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(ClusterlabError::ConfigError(msg)) => assert!(msg.contains("itself")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn test_cycle_loads_and_stalls_in_the_planner() {
    let file = config_file(
        r#"
[artifact.a]
url = "http://example.com/a-1.tar.bz2"
after = ["b"]

[artifact.b]
url = "http://example.com/b-1.tar.bz2"
after = ["a"]
"#,
    );

    let cfg = load_and_validate(file.path()).expect("cycles are not a config error");
    let orchestrator =
        BuildOrchestrator::from_config(&cfg, Arc::new(SystemRunner::new()), Arc::new(RealFileSystem))
            .unwrap();
    let plan = orchestrator.plan();

    assert!(plan.order.is_empty());
    assert_eq!(plan.unresolved.len(), 2);
}

#[test]
fn test_invalid_toml_returns_toml_error() {
    let file = config_file("[artifact.apr\nurl = ");

    match load_and_validate(file.path()) {
        Err(ClusterlabError::TomlError(_)) => {}
        other => panic!("Expected TomlError, got: {:?}", other),
    }
}

#[test]
fn test_missing_file_returns_io_error() {
    match load_and_validate("/nonexistent/Clusterlab.toml") {
        Err(ClusterlabError::IoError(_)) => {}
        other => panic!("Expected IoError, got: {:?}", other),
    }
}

#[test]
fn test_verify_needs_two_backends_with_distinct_routes() {
    let one_backend = config_file(
        r#"
[verify]
url = "http://{ip}/clusterbench/jvmroute"

[[verify.backend]]
name = "tomcat1"
route = "tomcat1"
pid_file = "/tmp/tomcat1.pid"
"#,
    );
    match load_and_validate(one_backend.path()) {
        Err(ClusterlabError::ConfigError(msg)) => assert!(msg.contains("exactly two")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }

    let same_route = config_file(
        r#"
[verify]
url = "http://{ip}/clusterbench/jvmroute"

[[verify.backend]]
name = "tomcat1"
route = "node"
pid_file = "/tmp/tomcat1.pid"

[[verify.backend]]
name = "tomcat2"
route = "node"
pid_file = "/tmp/tomcat2.pid"
"#,
    );
    match load_and_validate(same_route.path()) {
        Err(ClusterlabError::ConfigError(msg)) => assert!(msg.contains("share the route")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn test_zero_attempts_is_rejected() {
    let file = config_file(
        r#"
[verify]
url = "http://{ip}/"
attempts = 0

[[verify.backend]]
name = "tomcat1"
route = "tomcat1"
pid_file = "/tmp/tomcat1.pid"

[[verify.backend]]
name = "tomcat2"
route = "tomcat2"
pid_file = "/tmp/tomcat2.pid"
"#,
    );
    match load_and_validate(file.path()) {
        Err(ClusterlabError::ConfigError(msg)) => assert!(msg.contains("attempts")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn test_empty_step_command_is_rejected() {
    let file = config_file(
        r#"
[[step]]
cmd = []
"#,
    );
    match load_and_validate(file.path()) {
        Err(ClusterlabError::ConfigError(msg)) => assert!(msg.contains("empty `cmd`")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

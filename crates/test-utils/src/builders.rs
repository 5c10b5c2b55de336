#![allow(dead_code)]

use std::path::PathBuf;

use clusterlab::config::{
    ArtifactConfig, BackendConfig, ConfigFile, PatchConfig, RawConfigFile, StepConfig,
    VerifySection,
};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn work_dir(mut self, dir: &str) -> Self {
        self.config.config.work_dir = PathBuf::from(dir);
        self
    }

    pub fn install_root(mut self, dir: &str) -> Self {
        self.config.config.install_root = PathBuf::from(dir);
        self
    }

    pub fn host_ip(mut self, ip: &str) -> Self {
        self.config.host.ip = Some(ip.to_string());
        self
    }

    pub fn package(mut self, name: &str) -> Self {
        self.config.packages.required.push(name.to_string());
        self
    }

    pub fn with_artifact(mut self, name: &str, artifact: ArtifactConfig) -> Self {
        self.config.artifact.insert(name.to_string(), artifact);
        self
    }

    pub fn with_step(mut self, step: StepConfig) -> Self {
        self.config.step.push(step);
        self
    }

    pub fn with_patch(mut self, target: &str, template: &str, args: &[&str]) -> Self {
        self.config.patch.push(PatchConfig {
            target: target.to_string(),
            template: PathBuf::from(template),
            args: args.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    pub fn with_verify(mut self, verify: VerifySection) -> Self {
        self.config.verify = Some(verify);
        self
    }

    /// The raw config, for tests that exercise validation themselves.
    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `ArtifactConfig`.
pub struct ArtifactConfigBuilder {
    artifact: ArtifactConfig,
}

impl ArtifactConfigBuilder {
    pub fn new(url: &str) -> Self {
        Self {
            artifact: ArtifactConfig {
                url: url.to_string(),
                after: vec![],
            },
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.artifact.after.push(dep.to_string());
        self
    }

    pub fn build(self) -> ArtifactConfig {
        self.artifact
    }
}

/// Builder for `StepConfig`.
pub struct StepConfigBuilder {
    step: StepConfig,
}

impl StepConfigBuilder {
    pub fn new(cmd: &[&str]) -> Self {
        Self {
            step: StepConfig {
                name: None,
                cmd: cmd.iter().map(|s| s.to_string()).collect(),
                cwd: None,
                checked: true,
                forward_output: false,
                after_patches: false,
            },
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.step.name = Some(name.to_string());
        self
    }

    pub fn cwd(mut self, dir: &str) -> Self {
        self.step.cwd = Some(PathBuf::from(dir));
        self
    }

    pub fn after_patches(mut self) -> Self {
        self.step.after_patches = true;
        self
    }

    pub fn unchecked(mut self) -> Self {
        self.step.checked = false;
        self
    }

    pub fn build(self) -> StepConfig {
        self.step
    }
}

/// The Apache httpd stack: apr, then apr-util against apr, then httpd against
/// both.
pub fn apache_stack() -> ConfigFileBuilder {
    ConfigFileBuilder::new()
        .work_dir("/work")
        .install_root("/opt/local")
        .with_artifact(
            "apr",
            ArtifactConfigBuilder::new("http://archive.apache.org/dist/apr/apr-1.5.2.tar.bz2")
                .build(),
        )
        .with_artifact(
            "apr-util",
            ArtifactConfigBuilder::new("http://archive.apache.org/dist/apr/apr-util-1.5.4.tar.bz2")
                .after("apr")
                .build(),
        )
        .with_artifact(
            "httpd",
            ArtifactConfigBuilder::new("http://archive.apache.org/dist/httpd/httpd-2.4.20.tar.bz2")
                .after("apr")
                .after("apr-util")
                .build(),
        )
}

/// Two tomcat backends with pid files under `pid_dir`.
pub fn tomcat_verify(url: &str, pid_dir: &str) -> VerifySection {
    let mut verify = VerifySection::with_url(url);
    verify.interval_ms = 0;
    verify.backend = vec![
        BackendConfig {
            name: "tomcat1".to_string(),
            route: "tomcat1".to_string(),
            pid_file: PathBuf::from(pid_dir).join("tomcat1.pid"),
            start: vec![],
        },
        BackendConfig {
            name: "tomcat2".to_string(),
            route: "tomcat2".to_string(),
            pid_file: PathBuf::from(pid_dir).join("tomcat2.pid"),
            start: vec![],
        },
    ];
    verify
}

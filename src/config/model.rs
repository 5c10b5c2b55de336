// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

/// Raw configuration as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// work_dir = "."
/// install_root = "/tmp/usr/local"
///
/// [packages]
/// required = ["wget", "gcc", "bzip2"]
///
/// [artifact.apr]
/// url = "http://archive.apache.org/dist/apr/apr-1.5.2.tar.bz2"
///
/// [artifact.apr-util]
/// url = "http://archive.apache.org/dist/apr/apr-util-1.5.4.tar.bz2"
/// after = ["apr"]
///
/// [verify]
/// url = "http://{ip}/clusterbench/jvmroute"
///
/// [[verify.backend]]
/// name = "tomcat1"
/// route = "tomcat1"
/// pid_file = "/tmp/tomcat1.pid"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub host: HostSection,

    #[serde(default)]
    pub build: BuildSection,

    #[serde(default)]
    pub packages: PackagesSection,

    /// All artifacts from `[artifact.<name>]`, keyed by artifact name.
    #[serde(default)]
    pub artifact: BTreeMap<String, ArtifactConfig>,

    /// Post-build commands from `[[step]]`, in file order.
    #[serde(default)]
    pub step: Vec<StepConfig>,

    /// Patches from `[[patch]]`, in file order.
    #[serde(default)]
    pub patch: Vec<PatchConfig>,

    #[serde(default)]
    pub verify: Option<VerifySection>,
}

/// Validated configuration, produced by `TryFrom<RawConfigFile>`
/// (see `config::validate`).
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub host: HostSection,
    pub build: BuildSection,
    pub packages: PackagesSection,
    pub artifact: BTreeMap<String, ArtifactConfig>,
    pub step: Vec<StepConfig>,
    pub patch: Vec<PatchConfig>,
    pub verify: Option<VerifySection>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            config: raw.config,
            host: raw.host,
            build: raw.build,
            packages: raw.packages,
            artifact: raw.artifact,
            step: raw.step,
            patch: raw.patch,
            verify: raw.verify,
        }
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Directory where archives are downloaded and unpacked.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Every artifact installs into `<install_root>/<name>`.
    #[serde(default = "default_install_root")]
    pub install_root: PathBuf,
}

fn default_work_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_install_root() -> PathBuf {
    PathBuf::from("/tmp/usr/local")
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            install_root: default_install_root(),
        }
    }
}

/// `[host]` section. When `ip` is absent the address is detected at runtime.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct HostSection {
    #[serde(default)]
    pub ip: Option<String>,
}

/// `[build]` section: the programs used for each build step.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildSection {
    /// Retrieval argv; the artifact URL is appended.
    #[serde(default = "default_fetch")]
    pub fetch: Vec<String>,

    /// Unpack argv; the archive name is appended.
    #[serde(default = "default_unpack")]
    pub unpack: Vec<String>,

    #[serde(default = "default_make")]
    pub make: String,
}

fn default_fetch() -> Vec<String> {
    vec!["wget".to_string(), "--quiet".to_string()]
}

fn default_unpack() -> Vec<String> {
    vec!["tar".to_string(), "xjf".to_string()]
}

fn default_make() -> String {
    "make".to_string()
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            fetch: default_fetch(),
            unpack: default_unpack(),
            make: default_make(),
        }
    }
}

/// `[packages]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PackagesSection {
    #[serde(default = "default_manager")]
    pub manager: String,

    #[serde(default)]
    pub required: Vec<String>,
}

fn default_manager() -> String {
    "dnf".to_string()
}

impl Default for PackagesSection {
    fn default() -> Self {
        Self {
            manager: default_manager(),
            required: Vec::new(),
        }
    }
}

/// `[artifact.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactConfig {
    /// Where the source archive is retrieved from.
    pub url: String,

    /// Artifacts whose install directories this one is configured against.
    #[serde(default)]
    pub after: Vec<String>,
}

/// `[[step]]` entry: one external command run after the artifact builds.
#[derive(Debug, Clone, Deserialize)]
pub struct StepConfig {
    /// Label used in logs; defaults to the (interpolated) program name.
    #[serde(default)]
    pub name: Option<String>,

    /// Program followed by its arguments. Supports `{ip}`, `{work_dir}` and
    /// `{install.<artifact>}` placeholders.
    pub cmd: Vec<String>,

    /// Working directory relative to `[config].work_dir`.
    #[serde(default)]
    pub cwd: Option<PathBuf>,

    /// Whether a non-zero exit aborts provisioning.
    #[serde(default = "default_true")]
    pub checked: bool,

    #[serde(default)]
    pub forward_output: bool,

    /// Run after the `[[patch]]` stage instead of before it (e.g. a server
    /// restart that must see the patched config).
    #[serde(default)]
    pub after_patches: bool,
}

fn default_true() -> bool {
    true
}

/// `[[patch]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct PatchConfig {
    /// File to patch (placeholders allowed).
    pub target: String,

    /// Path of the patch template, relative to the config file.
    pub template: PathBuf,

    /// Positional values for `{0}`, `{1}`, ... in the template.
    #[serde(default)]
    pub args: Vec<String>,
}

/// `[verify]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifySection {
    /// Endpoint polled by the verifier (placeholders allowed).
    pub url: String,

    /// Body label carrying the routing token.
    #[serde(default = "default_label")]
    pub label: String,

    #[serde(default = "default_attempts")]
    pub attempts: u32,

    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Requests issued in the Bound phase.
    #[serde(default = "default_sticky_requests")]
    pub sticky_requests: u32,

    /// Environment variable through which a started backend learns its pid file.
    #[serde(default = "default_pid_env")]
    pub pid_env: String,

    #[serde(default)]
    pub backend: Vec<BackendConfig>,
}

fn default_label() -> String {
    "JVM route".to_string()
}

fn default_attempts() -> u32 {
    120
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_sticky_requests() -> u32 {
    5
}

fn default_pid_env() -> String {
    "CATALINA_PID".to_string()
}

/// `[[verify.backend]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    pub name: String,

    /// Routing token this backend stamps on its responses.
    pub route: String,

    pub pid_file: PathBuf,

    /// Optional start command (argv).
    #[serde(default)]
    pub start: Vec<String>,
}

impl VerifySection {
    /// A section with every default filled in, for the given endpoint.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            label: default_label(),
            attempts: default_attempts(),
            interval_ms: default_interval_ms(),
            sticky_requests: default_sticky_requests(),
            pid_env: default_pid_env(),
            backend: Vec::new(),
        }
    }
}

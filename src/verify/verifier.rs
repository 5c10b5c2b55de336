// src/verify/verifier.rs

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::config::{BackendConfig, VerifySection};
use crate::errors::{ClusterlabError, Result};
use crate::exec::{CommandRunner, CommandSpec, OutputMode};
use crate::fs::FileSystem;
use crate::verify::pidfile;
use crate::verify::probe::{HttpProbe, ProbeResponse};
use crate::verify::route::{Route, RouteExtractor};

/// One application server behind the routing layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backend {
    pub name: String,
    /// Token this backend stamps on its responses.
    pub route: String,
    pub pid_file: PathBuf,
    /// Start argv; empty when the backend is started externally.
    pub start: Vec<String>,
}

impl Backend {
    pub fn new(name: impl Into<String>, route: impl Into<String>, pid_file: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            route: route.into(),
            pid_file: pid_file.into(),
            start: Vec::new(),
        }
    }
}

impl From<&BackendConfig> for Backend {
    fn from(cfg: &BackendConfig) -> Self {
        Self {
            name: cfg.name.clone(),
            route: cfg.route.clone(),
            pid_file: cfg.pid_file.clone(),
            start: cfg.start.clone(),
        }
    }
}

/// Tunables of the scenario.
#[derive(Debug, Clone)]
pub struct VerifyOptions {
    /// Maximum number of polls in the Waiting phase.
    pub attempts: u32,
    /// Delay between two polls.
    pub interval: Duration,
    /// Requests issued in the Bound phase.
    pub sticky_requests: u32,
    pub label: String,
    /// Environment variable handed to start commands with the pid file path.
    pub pid_env: String,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            attempts: 120,
            interval: Duration::from_secs(1),
            sticky_requests: 5,
            label: "JVM route".to_string(),
            pid_env: "CATALINA_PID".to_string(),
        }
    }
}

impl VerifyOptions {
    pub fn from_section(section: &VerifySection) -> Self {
        Self {
            attempts: section.attempts,
            interval: Duration::from_millis(section.interval_ms),
            sticky_requests: section.sticky_requests,
            label: section.label.clone(),
            pid_env: section.pid_env.clone(),
        }
    }
}

/// Where the verifier is in the scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Polling until the endpoint answers 200.
    Waiting,
    /// Checking that the session sticks to one backend.
    Bound,
    /// Killing the backend the session is bound to.
    Failover,
    /// Checking that the session moved to the survivor.
    Reassigned,
    /// All phases passed.
    Passed,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// What a successful run observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationReport {
    /// Poll on which the endpoint first answered 200 (1-based).
    pub bound_after_attempts: u32,
    pub route: String,
    pub terminated_backend: String,
    pub failover_route: String,
}

/// Drives the sticky-session / failover scenario against a deployed cluster.
///
/// Requests are strictly sequential and all go through the one probe, so the
/// routing layer's session cookie is honoured across phases.
pub struct DeploymentVerifier<P: HttpProbe> {
    probe: P,
    backends: Vec<Backend>,
    options: VerifyOptions,
    extractor: RouteExtractor,
    runner: Arc<dyn CommandRunner>,
    fs: Arc<dyn FileSystem>,
    phase: Phase,
}

impl<P: HttpProbe> DeploymentVerifier<P> {
    /// `backends` must hold exactly two entries with distinct routes.
    pub fn new(
        probe: P,
        backends: Vec<Backend>,
        options: VerifyOptions,
        runner: Arc<dyn CommandRunner>,
        fs: Arc<dyn FileSystem>,
    ) -> Result<Self> {
        if backends.len() != 2 || backends[0].route == backends[1].route {
            return Err(ClusterlabError::ConfigError(
                "verification needs exactly two backends with distinct routes".to_string(),
            ));
        }
        if options.attempts == 0 {
            return Err(ClusterlabError::ConfigError(
                "verification needs at least one reachability attempt".to_string(),
            ));
        }

        let extractor = RouteExtractor::new(options.label.clone());
        Ok(Self {
            probe,
            backends,
            options,
            extractor,
            runner,
            fs,
            phase: Phase::Waiting,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    pub fn backends(&self) -> &[Backend] {
        &self.backends
    }

    /// Run every phase in order; the first violation ends the run.
    pub async fn run(&mut self) -> Result<VerificationReport> {
        let outcome = self.run_phases().await;
        match &outcome {
            Ok(report) => {
                self.phase = Phase::Passed;
                info!(
                    route = %report.route,
                    terminated = %report.terminated_backend,
                    failover_route = %report.failover_route,
                    "session affinity and failover verified"
                );
            }
            Err(err) => {
                error!(phase = %self.phase, error = %err, "verification failed");
                self.phase = Phase::Failed;
            }
        }
        outcome
    }

    async fn run_phases(&mut self) -> Result<VerificationReport> {
        let (route, attempts) = self.wait_until_reachable().await?;
        self.confirm_affinity(&route).await?;
        let terminated = self.terminate_bound_backend(&route).await?;
        let survivor = self.survivor_of(&terminated);
        let failover_route = self.confirm_failover(&Route::known(survivor.route)).await?;

        Ok(VerificationReport {
            bound_after_attempts: attempts,
            route: route.to_string(),
            terminated_backend: terminated.name,
            failover_route: failover_route.to_string(),
        })
    }

    /// Create each pid file empty and run the backend's start command with
    /// `<pid_env>=<pid_file>` in its environment.
    pub async fn start_backends(&self) -> Result<()> {
        for backend in &self.backends {
            let Some(spec) = CommandSpec::from_argv(&backend.start) else {
                warn!(backend = %backend.name, "no start command configured; assuming it is running");
                continue;
            };

            pidfile::prepare(self.fs.as_ref(), &backend.pid_file)?;
            let spec = spec
                .env(&self.options.pid_env, backend.pid_file.display().to_string())
                .output(OutputMode::Forward);
            info!(backend = %backend.name, command = %spec, "starting backend");
            self.runner.run_checked(&spec).await?;
        }
        Ok(())
    }

    /// Waiting phase: poll until the first 200, returning its route and the
    /// 1-based attempt it arrived on.
    pub async fn wait_until_reachable(&mut self) -> Result<(Route, u32)> {
        self.phase = Phase::Waiting;

        for attempt in 1..=self.options.attempts {
            match self.probe.get().await {
                Ok(response) if response.is_success() => {
                    let route = self.extractor.extract(&response.body);
                    info!(attempt, route = %route, "endpoint reachable; session bound");
                    self.phase = Phase::Bound;
                    return Ok((route, attempt));
                }
                Ok(response) => {
                    debug!(attempt, status = response.status, "endpoint not ready yet");
                }
                Err(err) => {
                    debug!(attempt, error = %err, "endpoint not reachable yet");
                }
            }

            if attempt < self.options.attempts {
                tokio::time::sleep(self.options.interval).await;
            }
        }

        Err(ClusterlabError::ReachabilityTimeout {
            attempts: self.options.attempts,
        })
    }

    /// Bound phase: every further request must succeed with `expected`.
    pub async fn confirm_affinity(&mut self, expected: &Route) -> Result<()> {
        self.phase = Phase::Bound;

        for request in 1..=self.options.sticky_requests {
            let observed = match self.probe.get().await {
                Ok(response) => self.route_of_success(&response),
                Err(err) => Err(format!("request error: {err}")),
            };

            match observed {
                Ok(route) if route == *expected => {
                    debug!(request, route = %route, "session still bound");
                }
                Ok(route) => {
                    return Err(ClusterlabError::AffinityViolation {
                        expected: expected.to_string(),
                        observed: route.to_string(),
                    });
                }
                Err(observed) => {
                    return Err(ClusterlabError::AffinityViolation {
                        expected: expected.to_string(),
                        observed,
                    });
                }
            }
        }

        info!(route = %expected, requests = self.options.sticky_requests, "session affinity holds");
        Ok(())
    }

    /// Failover phase: hard-kill the backend serving `route`.
    pub async fn terminate_bound_backend(&mut self, route: &Route) -> Result<Backend> {
        self.phase = Phase::Failover;

        let backend = route
            .as_known()
            .and_then(|r| self.backends.iter().find(|b| b.route == r))
            .cloned()
            .ok_or_else(|| ClusterlabError::UnmatchedRoute(route.to_string()))?;

        let pid = pidfile::read_pid(self.fs.as_ref(), &backend.pid_file)?;
        info!(backend = %backend.name, pid, "terminating backend");
        self.runner.run_checked(&pidfile::kill_command(pid)).await?;

        Ok(backend)
    }

    /// Reassigned phase: one request, which must land on `expected`.
    ///
    /// There is no retry; an unreachable survivor is a failover violation.
    pub async fn confirm_failover(&mut self, expected: &Route) -> Result<Route> {
        self.phase = Phase::Reassigned;

        let observed = match self.probe.get().await {
            Ok(response) => self.route_of_success(&response),
            Err(err) => Err(format!("request error: {err}")),
        };

        match observed {
            Ok(route) if route == *expected => {
                info!(route = %route, "session failed over to surviving backend");
                Ok(route)
            }
            Ok(route) => Err(ClusterlabError::FailoverViolation {
                expected: expected.to_string(),
                observed: route.to_string(),
            }),
            Err(observed) => Err(ClusterlabError::FailoverViolation {
                expected: expected.to_string(),
                observed,
            }),
        }
    }

    fn route_of_success(&self, response: &ProbeResponse) -> std::result::Result<Route, String> {
        if response.is_success() {
            Ok(self.extractor.extract(&response.body))
        } else {
            Err(format!("HTTP {}", response.status))
        }
    }

    fn survivor_of(&self, terminated: &Backend) -> Backend {
        self.backends
            .iter()
            .find(|b| b.route != terminated.route)
            .cloned()
            .unwrap_or_else(|| terminated.clone())
    }
}

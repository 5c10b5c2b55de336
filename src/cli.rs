// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `clusterlab`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "clusterlab",
    version,
    about = "Provision a proxy + two-backend test cluster and verify sticky-session failover.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    #[arg(long, global = true, value_name = "PATH", default_value = "Clusterlab.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CLUSTERLAB_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Install packages, build artifacts, run post-build steps and patches.
    Provision {
        /// Print the plan and interpolated steps, but don't run any commands.
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the artifact build order and any unresolvable artifacts.
    Plan,

    /// Run the sticky-session / failover scenario against the deployed cluster.
    Verify {
        /// Start each backend (writing its pid file) before polling.
        #[arg(long)]
        start_backends: bool,

        /// Override `[verify].url`.
        #[arg(long, value_name = "URL")]
        url: Option<String>,
    },

    /// Send N requests from X concurrent clients, tracking session cookies.
    Load {
        /// URL to use for requests.
        url: String,

        /// Number of requests per client.
        #[arg(short = 'n', default_value_t = 10)]
        requests: usize,

        /// Number of clients.
        #[arg(short = 'x', default_value_t = 1)]
        clients: usize,

        /// Microseconds for which a session cookie is considered valid.
        #[arg(long, value_name = "MICROSECONDS", default_value_t = 1)]
        timeout: u64,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_load_subcommand_with_short_flags() {
        let args = CliArgs::try_parse_from([
            "clusterlab", "load", "10.0.0.5", "-n", "3", "-x", "4", "--timeout", "500",
        ])
        .unwrap();

        match args.command {
            Command::Load { url, requests, clients, timeout } => {
                assert_eq!(url, "10.0.0.5");
                assert_eq!(requests, 3);
                assert_eq!(clients, 4);
                assert_eq!(timeout, 500);
            }
            other => panic!("expected load, got {other:?}"),
        }
    }

    #[test]
    fn config_flag_is_global() {
        let args =
            CliArgs::try_parse_from(["clusterlab", "plan", "--config", "x.toml"]).unwrap();
        assert_eq!(args.config, "x.toml");
        assert!(matches!(args.command, Command::Plan));
    }
}

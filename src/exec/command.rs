// src/exec/command.rs

use std::fmt;
use std::path::{Path, PathBuf};

/// What happens to a child's stdout/stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Discard both streams.
    Quiet,
    /// Capture both streams line by line and log them at debug.
    #[default]
    Log,
    /// Inherit the parent's stdout/stderr.
    Forward,
}

/// A single external program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory for the child; `None` means the current one.
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
    pub output: OutputMode,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
            output: OutputMode::default(),
        }
    }

    /// Build from an argv slice (`argv[0]` is the program).
    ///
    /// Returns `None` for an empty slice.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program.clone()).args(args.iter().cloned()))
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn cwd(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn output(mut self, mode: OutputMode) -> Self {
        self.output = mode;
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_like_a_shell_line() {
        let spec = CommandSpec::new("make").arg("install").cwd("/src/apr-1.5.2");
        assert_eq!(spec.to_string(), "make install");
        assert_eq!(spec.cwd.as_deref(), Some(Path::new("/src/apr-1.5.2")));
    }

    #[test]
    fn from_argv_splits_program() {
        let argv = vec!["firewall-cmd".to_string(), "--add-service=http".to_string()];
        let spec = CommandSpec::from_argv(&argv).unwrap();
        assert_eq!(spec.program, "firewall-cmd");
        assert_eq!(spec.args, vec!["--add-service=http"]);
        assert!(CommandSpec::from_argv(&[]).is_none());
    }
}

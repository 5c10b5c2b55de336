use std::sync::{Arc, Mutex};

use clusterlab::exec::{CommandRunner, CommandSpec, RunFuture};

type ExitRule = Box<dyn Fn(&CommandSpec) -> Option<i32> + Send + Sync>;

/// A fake command runner that:
/// - records every command it is asked to run
/// - exits 0 unless a rule registered with [`FakeRunner::fail_when`] returns
///   an exit code for the command.
///
/// Clones share the recorded calls and rules.
#[derive(Clone, Default)]
pub struct FakeRunner {
    calls: Arc<Mutex<Vec<CommandSpec>>>,
    rules: Arc<Mutex<Vec<ExitRule>>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// The first matching rule decides the exit code.
    pub fn fail_when<F>(self, rule: F) -> Self
    where
        F: Fn(&CommandSpec) -> Option<i32> + Send + Sync + 'static,
    {
        self.rules.lock().unwrap().push(Box::new(rule));
        self
    }

    /// Exit with `code` whenever the rendered command line equals `line`.
    pub fn fail_line(self, line: &str, code: i32) -> Self {
        let line = line.to_string();
        self.fail_when(move |spec| (spec.to_string() == line).then_some(code))
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    /// Recorded commands rendered as `prog arg1 arg2`.
    pub fn lines(&self) -> Vec<String> {
        self.calls().iter().map(ToString::to_string).collect()
    }

    /// Recorded commands rendered as `<cwd>$ prog arg1 arg2`.
    pub fn lines_with_cwd(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|c| {
                let cwd = c
                    .cwd
                    .as_deref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                format!("{cwd}$ {c}")
            })
            .collect()
    }

    fn exit_code(&self, spec: &CommandSpec) -> i32 {
        let rules = self.rules.lock().unwrap();
        rules.iter().find_map(|rule| rule(spec)).unwrap_or(0)
    }
}

impl CommandRunner for FakeRunner {
    fn run<'a>(&'a self, spec: &'a CommandSpec) -> RunFuture<'a, i32> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(spec.clone());
            Ok(self.exit_code(spec))
        })
    }
}

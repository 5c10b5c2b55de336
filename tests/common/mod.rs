#![allow(dead_code)]

pub use clusterlab_test_utils::builders;
pub use clusterlab_test_utils::fake_runner::FakeRunner;
pub use clusterlab_test_utils::{init_tracing, with_timeout};
pub use clusterlab_test_utils::scripted_probe::ScriptedProbe;

use std::sync::Arc;

use clusterlab::exec::CommandRunner;
use clusterlab::fs::FileSystem;
use clusterlab::fs::mock::MockFileSystem;

/// Trait-object handles for a fake runner and mock filesystem, keeping the
/// concrete values around for inspection.
pub fn fakes() -> (FakeRunner, Arc<dyn CommandRunner>, MockFileSystem, Arc<dyn FileSystem>) {
    let runner = FakeRunner::new();
    let fs = MockFileSystem::new();
    let runner_dyn: Arc<dyn CommandRunner> = Arc::new(runner.clone());
    let fs_dyn: Arc<dyn FileSystem> = Arc::new(fs.clone());
    (runner, runner_dyn, fs, fs_dyn)
}

// src/patch/mod.rs

//! Applying templated textual patches to installed files.
//!
//! A patch template is rendered with positional values (see [`template`]),
//! written to a temporary file that lives only for the duration of the call,
//! and handed to `patch <target> <tmpfile>`.
//!
//! Unlike build steps, a rejected patch is not fatal: re-running provisioning
//! against an already-patched file makes `patch` fail, and that is expected.

pub mod template;

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use crate::errors::Result;
use crate::exec::{CommandRunner, CommandSpec, OutputMode};
use crate::fs::FileSystem;

pub use template::render;

/// Result of one patch application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    Applied,
    /// `patch` exited with this non-zero code.
    Rejected(i32),
}

const PATCH_PROGRAM: &str = "patch";

pub struct PatchApplier {
    runner: Arc<dyn CommandRunner>,
    fs: Arc<dyn FileSystem>,
}

impl PatchApplier {
    pub fn new(runner: Arc<dyn CommandRunner>, fs: Arc<dyn FileSystem>) -> Self {
        Self { runner, fs }
    }

    /// Render the template at `template_path` with `values` and apply it to
    /// `target`.
    pub async fn apply(
        &self,
        target: &Path,
        template_path: &Path,
        values: &[String],
    ) -> Result<PatchOutcome> {
        let template = self.fs.read_to_string(template_path)?;
        let rendered = render(&template, values)?;
        self.apply_text(target, &rendered).await
    }

    /// Apply already-rendered patch text to `target`.
    pub async fn apply_text(&self, target: &Path, patch_text: &str) -> Result<PatchOutcome> {
        let mut diff = tempfile::Builder::new()
            .prefix("clusterlab-")
            .suffix(".diff")
            .tempfile()
            .context("creating temporary patch file")?;
        diff.write_all(patch_text.as_bytes())
            .and_then(|_| diff.flush())
            .context("writing temporary patch file")?;

        let spec = CommandSpec::new(PATCH_PROGRAM)
            .arg(target.display().to_string())
            .arg(diff.path().display().to_string())
            .output(OutputMode::Forward);

        info!(target = ?target, "applying patch");
        let code = self.runner.run(&spec).await?;

        // `diff` is dropped (and the file removed) on every path out of here.
        if code == 0 {
            Ok(PatchOutcome::Applied)
        } else {
            warn!(target = ?target, exit_code = code, "patch was not applied cleanly; continuing");
            Ok(PatchOutcome::Rejected(code))
        }
    }
}

// src/build/artifact.rs

use std::path::{Path, PathBuf};

use crate::exec::CommandSpec;

/// Suffixes recognised when deriving the unpack directory from an archive
/// name that has no `.tar` component.
const SHORT_ARCHIVE_SUFFIXES: &[&str] = &[".tgz", ".tbz2", ".tbz", ".txz", ".zip"];

/// A source archive that is fetched, unpacked and built with
/// `./configure && make && make install`.
///
/// Dependencies are held by name; the orchestrator resolves them against its
/// own table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSource {
    name: String,
    url: String,
    dependencies: Vec<String>,
}

impl ArtifactSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            dependencies: Vec::new(),
        }
    }

    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies.extend(deps.into_iter().map(Into::into));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Last path segment of the URL, e.g. `apr-1.5.2.tar.bz2`.
    pub fn archive_name(&self) -> &str {
        let path = self
            .url
            .split(['?', '#'])
            .next()
            .unwrap_or(&self.url)
            .trim_end_matches('/');
        path.rsplit('/').next().unwrap_or(path)
    }

    /// Directory the archive unpacks into: the archive name with everything
    /// from `.tar` onward removed (`apr-1.5.2.tar.bz2` → `apr-1.5.2`).
    pub fn unpack_dir(&self) -> &str {
        let archive = self.archive_name();
        if let Some(pos) = archive.find(".tar") {
            return &archive[..pos];
        }
        SHORT_ARCHIVE_SUFFIXES
            .iter()
            .find_map(|suffix| archive.strip_suffix(suffix))
            .unwrap_or(archive)
    }

    pub fn install_dir(&self, install_root: &Path) -> PathBuf {
        install_root.join(&self.name)
    }

    /// `./configure --prefix=<own install dir> --with-<dep>=<dep install dir>...`
    ///
    /// `deps` are emitted in the order given.
    pub fn configure_command(&self, install_root: &Path, deps: &[&ArtifactSource]) -> CommandSpec {
        let mut spec = CommandSpec::new("./configure").arg(format!(
            "--prefix={}",
            self.install_dir(install_root).display()
        ));
        for dep in deps {
            spec = spec.arg(format!(
                "--with-{}={}",
                dep.name(),
                dep.install_dir(install_root).display()
            ));
        }
        spec
    }
}

// src/verify/pidfile.rs

use std::path::Path;

use crate::errors::{ClusterlabError, Result};
use crate::exec::CommandSpec;
use crate::fs::FileSystem;

/// Create (or truncate) the pid file before its backend starts.
pub fn prepare(fs: &dyn FileSystem, path: &Path) -> Result<()> {
    fs.write(path, b"")?;
    Ok(())
}

/// Read the process id written by a backend's start step.
pub fn read_pid(fs: &dyn FileSystem, path: &Path) -> Result<u32> {
    if !fs.is_file(path) {
        return Err(ClusterlabError::PidFile {
            path: path.to_path_buf(),
            reason: "does not exist".to_string(),
        });
    }

    let contents = fs.read_to_string(path)?;
    let trimmed = contents.trim();
    match trimmed.parse::<u32>() {
        Ok(pid) if pid > 0 => Ok(pid),
        _ => Err(ClusterlabError::PidFile {
            path: path.to_path_buf(),
            reason: format!("does not contain a valid pid (found {trimmed:?})"),
        }),
    }
}

/// `kill -9 <pid>`: the scenario simulates a hard crash, not a shutdown.
pub fn kill_command(pid: u32) -> CommandSpec {
    CommandSpec::new("kill").args(["-9".to_string(), pid.to_string()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn reads_pid_written_by_start_step() {
        let fs = MockFileSystem::new();
        let path = Path::new("/var/run/tomcat1.pid");
        prepare(&fs, path).unwrap();
        assert!(read_pid(&fs, path).is_err(), "empty pid file is not a pid");

        fs.add_file(path, "4242\n");
        assert_eq!(read_pid(&fs, path).unwrap(), 4242);
    }

    #[test]
    fn missing_or_garbage_pid_file_is_reported() {
        let fs = MockFileSystem::new();
        let missing = read_pid(&fs, Path::new("/nope.pid")).unwrap_err();
        assert!(matches!(missing, ClusterlabError::PidFile { reason, .. } if reason == "does not exist"));

        fs.add_file("/bad.pid", "abc");
        assert!(matches!(
            read_pid(&fs, Path::new("/bad.pid")),
            Err(ClusterlabError::PidFile { .. })
        ));
        fs.add_file("/zero.pid", "0");
        assert!(read_pid(&fs, Path::new("/zero.pid")).is_err());
    }

    #[test]
    fn kill_is_forced() {
        assert_eq!(kill_command(7).to_string(), "kill -9 7");
    }
}

//! Reading a package manager's version from its executable.

use crate::error::{Error, Result};
use crate::package_manager::PackageManager;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

/// Default upper bound for a `--version` invocation.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Runs `<command> --version` for a resolved package manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionProbe {
    timeout: Duration,
}

impl Default for VersionProbe {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

impl VersionProbe {
    /// Creates a probe that gives up after `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// The configured timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the trimmed standard output of `<command> --version` run in `root`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VersionProbe`] naming the manager if the command cannot
    /// be launched, exits unsuccessfully, or outlives the timeout.
    pub fn version(&self, pm: &PackageManager, root: &Path) -> Result<String> {
        tracing::debug!(
            command = pm.command(),
            root = %root.display(),
            "Probing package manager version"
        );

        let mut command = Command::new(pm.command());
        command.arg("--version").current_dir(root);

        let stdout = run_with_timeout(&mut command, self.timeout).map_err(|message| {
            Error::VersionProbe {
                manager: pm.name().to_string(),
                message,
            }
        })?;

        Ok(String::from_utf8_lossy(&stdout).trim().to_string())
    }

    /// Like [`version`](Self::version), but a failure aborts the caller.
    ///
    /// Use it only where nothing sensible can happen without a version.
    ///
    /// # Panics
    ///
    /// Panics with the manager name and the underlying failure if the version
    /// cannot be obtained.
    #[allow(clippy::panic)]
    #[must_use]
    pub fn require_version(&self, pm: &PackageManager, root: &Path) -> String {
        match self.version(pm, root) {
            Ok(version) => version,
            Err(e) => panic!("{e}"),
        }
    }
}

/// Output collected from one of the child's pipes.
enum Captured {
    Stdout(Vec<u8>),
    Stderr(Vec<u8>),
}

/// Runs `command` to completion and returns its stdout, killing it after `timeout`.
///
/// The deadline covers draining the pipes too, so a grandchild that keeps an
/// inherited pipe open cannot hold the caller past `timeout`.
fn run_with_timeout(
    command: &mut Command,
    timeout: Duration,
) -> std::result::Result<Vec<u8>, String> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| format!("failed to launch: {e}"))?;

    // Drain both pipes concurrently so a chatty child cannot block on a full pipe
    let (sender, receiver) = mpsc::channel();
    let stdout = child.stdout.take();
    let stdout_sender = sender.clone();
    thread::spawn(move || {
        let _ = stdout_sender.send(Captured::Stdout(read_pipe(stdout)));
    });
    let stderr = child.stderr.take();
    thread::spawn(move || {
        let _ = sender.send(Captured::Stderr(read_pipe(stderr)));
    });

    let timed_out = || format!("timed out after {}ms", timeout.as_millis());
    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(timed_out());
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => return Err(format!("failed to wait for process: {e}")),
        }
    };

    let mut stdout = None;
    let mut stderr = None;
    while stdout.is_none() || stderr.is_none() {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match receiver.recv_timeout(remaining) {
            Ok(Captured::Stdout(bytes)) => stdout = Some(bytes),
            Ok(Captured::Stderr(bytes)) => stderr = Some(bytes),
            Err(RecvTimeoutError::Timeout) => {
                tracing::debug!("Output pipe still open after the process exited");
                return Err(timed_out());
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    let stdout = stdout.unwrap_or_default();
    let stderr = stderr.unwrap_or_default();

    if !status.success() {
        let stderr = String::from_utf8_lossy(&stderr);
        let stderr = stderr.trim();
        return Err(if stderr.is_empty() {
            status.to_string()
        } else {
            format!("{status}: {stderr}")
        });
    }

    Ok(stdout)
}

fn read_pipe(pipe: Option<impl Read>) -> Vec<u8> {
    let mut buffer = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buffer);
    }
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{Backend, BackendDescriptor};
    use tempfile::TempDir;

    /// A backend whose command is chosen per test.
    #[derive(Debug)]
    struct CommandBackend(BackendDescriptor);

    impl Backend for CommandBackend {
        fn descriptor(&self) -> &BackendDescriptor {
            &self.0
        }
        fn workspace_globs(&self, _root: &Path) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
        fn workspace_ignores(&self, _pm: &PackageManager, _root: &Path) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
        fn cmd_arg_separator(&self, _pm: &PackageManager, _root: &Path) -> Vec<String> {
            Vec::new()
        }
        fn matches(&self, _manager: &str, _version: &str) -> Result<bool> {
            Ok(false)
        }
        fn detect(&self, _root: &Path, _pm: &mut PackageManager) -> Result<bool> {
            Ok(false)
        }
    }

    const fn descriptor(command: &'static str) -> BackendDescriptor {
        BackendDescriptor {
            name: "test-manager",
            slug: "test",
            command,
            specfile: "package.json",
            lockfile: "test.lock",
            package_dir: "node_modules",
        }
    }

    static MISSING: CommandBackend = CommandBackend(descriptor("pkgscope-missing-executable"));

    /// Writes an executable running `body` and returns a backend invoking it.
    #[cfg(unix)]
    fn fake_manager(dir: &Path, body: &str) -> &'static CommandBackend {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("fake-manager");
        std::fs::write(&script, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let command: &'static str = Box::leak(script.display().to_string().into_boxed_str());
        Box::leak(Box::new(CommandBackend(descriptor(command))))
    }

    #[cfg(unix)]
    #[test]
    fn test_version_trims_stdout() {
        let temp_dir = TempDir::new().unwrap();
        let pm = PackageManager::new(fake_manager(temp_dir.path(), "echo '  7.1.0  '"));

        let version = VersionProbe::default().version(&pm, temp_dir.path()).unwrap();
        assert_eq!(version, "7.1.0");
    }

    #[test]
    fn test_launch_failure_names_manager() {
        let temp_dir = TempDir::new().unwrap();
        let pm = PackageManager::new(&MISSING);

        let error = VersionProbe::default()
            .version(&pm, temp_dir.path())
            .unwrap_err();
        assert!(matches!(&error, Error::VersionProbe { manager, .. } if manager == "test-manager"));
        assert!(error.to_string().contains("Could not detect test-manager version"));
    }

    #[test]
    #[should_panic(expected = "Could not detect test-manager version")]
    fn test_require_version_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let pm = PackageManager::new(&MISSING);

        let _ = VersionProbe::default().require_version(&pm, temp_dir.path());
    }

    #[cfg(unix)]
    #[test]
    fn test_resolved_version_falls_back_to_probe() {
        let temp_dir = TempDir::new().unwrap();
        let pm = PackageManager::new(fake_manager(temp_dir.path(), "echo 3.6.4"));

        let version = pm
            .resolved_version(temp_dir.path(), &VersionProbe::default())
            .unwrap();
        assert_eq!(version, "3.6.4");
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_child() {
        let mut command = Command::new("sleep");
        command.arg("5");

        let started = Instant::now();
        let error = run_with_timeout(&mut command, Duration::from_millis(100)).unwrap_err();

        assert!(error.contains("timed out"));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn test_background_child_holding_stdout_times_out() {
        let temp_dir = TempDir::new().unwrap();
        let pm = PackageManager::new(fake_manager(temp_dir.path(), "echo 1.0.0\nsleep 5 &"));

        let started = Instant::now();
        let error = VersionProbe::new(Duration::from_millis(300))
            .version(&pm, temp_dir.path())
            .unwrap_err();

        assert!(matches!(
            &error,
            Error::VersionProbe { message, .. } if message.contains("timed out")
        ));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_includes_stderr() {
        let mut command = Command::new("sh");
        command.args(["-c", "echo broken >&2; exit 3"]);

        let error = run_with_timeout(&mut command, DEFAULT_PROBE_TIMEOUT).unwrap_err();
        assert!(error.contains("broken"));
    }
}

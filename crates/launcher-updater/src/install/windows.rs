//! Deferred-script installer for Windows.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

use tempfile::TempPath;

use super::{
    InstallOutcome, InstallStrategy, SCRIPT_SUFFIX, STAGED_SUFFIX, install_error, sibling_path,
};
use crate::error::Result;
use crate::steps::extract::ExtractedBinary;

/// Seconds the script waits for the launcher to exit before swapping.
const SCRIPT_DELAY_SECS: u32 = 2;

/// Launches a process that outlives the launcher.
///
/// Tests substitute a recording implementation so nothing is spawned.
pub trait ProcessSpawner: Send + Sync + fmt::Debug {
    /// Starts `script` detached from the current process and returns
    /// without waiting for it.
    fn spawn_detached(&self, script: &Path) -> io::Result<()>;
}

/// Runs a batch script through `cmd /C start /B`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedCommand;

impl ProcessSpawner for DetachedCommand {
    fn spawn_detached(&self, script: &Path) -> io::Result<()> {
        let mut command = Command::new("cmd");
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;

            const DETACHED_PROCESS: u32 = 0x0000_0008;
            const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;

            // `start` takes the first quoted argument as a window title.
            command
                .creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP)
                .raw_arg(format!("/C start \"\" /B \"{}\"", script.display()));
        }
        #[cfg(not(windows))]
        command.args(["/C", "start", "/B"]).arg(script);

        command.spawn().map(drop)
    }
}

/// Stages the new binary as `<exe>.new` and schedules a script that swaps
/// it in after the launcher exits.
///
/// Until the script has been launched, both the staged binary and the
/// script are removed on failure. Afterwards the script owns them.
#[derive(Debug, Clone, Default)]
pub struct DeferredScriptInstaller<S = DetachedCommand> {
    spawner: S,
}

impl DeferredScriptInstaller {
    /// Creates an installer that launches scripts with `cmd`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            spawner: DetachedCommand,
        }
    }
}

impl<S: ProcessSpawner> DeferredScriptInstaller<S> {
    /// Creates an installer launching scripts through `spawner`.
    #[must_use]
    pub fn with_spawner(spawner: S) -> Self {
        Self { spawner }
    }

    /// The spawner in use.
    #[must_use]
    pub fn spawner(&self) -> &S {
        &self.spawner
    }
}

impl<S: ProcessSpawner> InstallStrategy for DeferredScriptInstaller<S> {
    fn install(&self, target: &Path, binary: &ExtractedBinary) -> Result<InstallOutcome> {
        if !target.is_file() {
            return Err(install_error(
                "Executable to replace not found:",
                target,
                "not a file",
            ));
        }

        let staged_path = sibling_path(target, STAGED_SUFFIX);
        let staged = TempPath::from_path(&staged_path);
        fs::write(&staged, binary.data())
            .map_err(|e| install_error("Failed to write", &staged_path, e))?;

        let script_path = sibling_path(target, SCRIPT_SUFFIX);
        let script = TempPath::from_path(&script_path);
        fs::write(&script, render_replace_script(target, &staged_path))
            .map_err(|e| install_error("Failed to write", &script_path, e))?;

        self.spawner
            .spawn_detached(&script)
            .map_err(|e| install_error("Failed to launch", &script_path, e))?;

        // Point of no return: the script now owns both files.
        hand_off(staged);
        hand_off(script);

        tracing::info!(
            "Scheduled replacement of {} via {}",
            target.display(),
            script_path.display()
        );
        Ok(InstallOutcome::Scheduled {
            script: script_path,
            staged: staged_path,
        })
    }
}

/// Disarms a cleanup guard without touching the file.
fn hand_off(guard: TempPath) {
    if let Err(err) = guard.keep() {
        tracing::warn!("Failed to release {}: {}", err.path.display(), err.error);
        // Dropping the returned guard would delete a file the script needs.
        std::mem::forget(err.path);
    }
}

/// Renders the batch script that swaps `staged` into `target`.
///
/// The script waits for the launcher to exit, moves the old executable
/// aside, moves the new one in (restoring the old one if that fails), then
/// deletes the aside copy and itself. Lines end in CRLF.
#[must_use]
pub fn render_replace_script(target: &Path, staged: &Path) -> String {
    let exe = target.display();
    let new = staged.display();
    let old = sibling_path(target, ".old");
    let old = old.display();

    [
        "@echo off".to_string(),
        format!("timeout /t {SCRIPT_DELAY_SECS} /nobreak >nul"),
        format!("move /y \"{exe}\" \"{old}\" >nul"),
        format!("move /y \"{new}\" \"{exe}\" >nul"),
        format!("if errorlevel 1 move /y \"{old}\" \"{exe}\" >nul"),
        format!("del \"{old}\" >nul 2>&1"),
        "del \"%~f0\"".to_string(),
    ]
    .iter()
    .map(|line| format!("{line}\r\n"))
    .collect()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Mutex;

    use super::*;
    use crate::error::UpdateError;

    /// Records scripts instead of running them.
    #[derive(Debug, Default)]
    struct RecordingSpawner {
        launched: Mutex<Vec<PathBuf>>,
        fail: bool,
    }

    impl ProcessSpawner for RecordingSpawner {
        fn spawn_detached(&self, script: &Path) -> io::Result<()> {
            if self.fail {
                return Err(io::Error::other("spawn refused"));
            }
            self.launched.lock().unwrap().push(script.to_path_buf());
            Ok(())
        }
    }

    fn binary() -> ExtractedBinary {
        ExtractedBinary::new("launcher.exe", vec![0x4d; 2048]).unwrap()
    }

    #[test]
    fn test_script_contents() {
        let script = render_replace_script(
            Path::new(r"C:\Apps\launcher.exe"),
            Path::new(r"C:\Apps\launcher.exe.new"),
        );
        let lines: Vec<&str> = script.split("\r\n").collect();

        assert_eq!(lines[0], "@echo off");
        assert!(lines[1].starts_with("timeout /t 2"));
        assert_eq!(
            lines[2],
            r#"move /y "C:\Apps\launcher.exe" "C:\Apps\launcher.exe.old" >nul"#
        );
        assert_eq!(
            lines[3],
            r#"move /y "C:\Apps\launcher.exe.new" "C:\Apps\launcher.exe" >nul"#
        );
        assert_eq!(lines[6], r#"del "%~f0""#);
        assert!(script.ends_with("\r\n"));
    }

    #[test]
    fn test_install_schedules_script() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("launcher.exe");
        fs::write(&target, b"old binary").unwrap();

        let installer = DeferredScriptInstaller::with_spawner(RecordingSpawner::default());
        let outcome = installer.install(&target, &binary()).unwrap();

        let script = dir.path().join("launcher.exe.update.bat");
        let staged = dir.path().join("launcher.exe.new");
        assert_eq!(
            outcome,
            InstallOutcome::Scheduled {
                script: script.clone(),
                staged: staged.clone(),
            }
        );
        assert_eq!(*installer.spawner().launched.lock().unwrap(), vec![script.clone()]);

        // Files survive the handoff; the original is untouched.
        assert_eq!(fs::read(&staged).unwrap(), vec![0x4d; 2048]);
        assert!(fs::read_to_string(&script).unwrap().contains("launcher.exe.new"));
        assert_eq!(fs::read(&target).unwrap(), b"old binary");
    }

    #[test]
    fn test_spawn_failure_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("launcher.exe");
        fs::write(&target, b"old binary").unwrap();

        let installer = DeferredScriptInstaller::with_spawner(RecordingSpawner {
            fail: true,
            ..RecordingSpawner::default()
        });
        let result = installer.install(&target, &binary());

        assert!(matches!(result, Err(UpdateError::Installation(_))));
        assert!(!dir.path().join("launcher.exe.new").exists());
        assert!(!dir.path().join("launcher.exe.update.bat").exists());
        assert_eq!(fs::read(&target).unwrap(), b"old binary");
    }

    #[test]
    fn test_missing_target() {
        let dir = tempfile::tempdir().unwrap();
        let installer = DeferredScriptInstaller::with_spawner(RecordingSpawner::default());
        let result = installer.install(&dir.path().join("launcher.exe"), &binary());

        assert!(matches!(result, Err(UpdateError::Installation(_))));
        assert!(installer.spawner().launched.lock().unwrap().is_empty());
    }
}

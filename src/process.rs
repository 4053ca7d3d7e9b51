use std::io;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use crate::cancel::CancelToken;

/// A launched (or adopted, already-running) external program.
pub struct LaunchedProcess {
    child: Option<Child>,
    name: String,
}

/// Process name an executable path would run under.
pub fn process_name(exe: &Path) -> String {
    exe.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Whether a process with this name is currently running, by scanning
/// /proc. Kernel comm names are truncated to 15 bytes, so compare on
/// the truncated prefix.
pub fn is_running(name: &str) -> bool {
    let prefix: String = name.chars().take(15).collect();
    let Ok(entries) = std::fs::read_dir("/proc") else {
        return false;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if !path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.bytes().all(|b| b.is_ascii_digit()))
        {
            continue;
        }
        if let Ok(comm) = std::fs::read_to_string(path.join("comm")) {
            if comm.trim_end() == prefix {
                log::debug!("Process {name} is running");
                return true;
            }
        }
    }
    log::debug!("Process {name} is not running");
    false
}

/// Starts the executable, or adopts the running instance if one with
/// the same name already exists.
pub fn launch_or_reuse(exe: &Path, args: &[String]) -> io::Result<LaunchedProcess> {
    let name = process_name(exe);
    if is_running(&name) {
        log::info!("{name} is already running, reusing the existing instance");
        return Ok(LaunchedProcess { child: None, name });
    }

    log::info!("Executing: {} {}", exe.display(), args.join(" "));
    let child = Command::new(exe)
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    log::info!("{name} started with PID {}", child.id());

    Ok(LaunchedProcess { child: Some(child), name })
}

impl LaunchedProcess {
    /// Waits until the program exits. Returns false if cancellation
    /// arrived first. Adopted instances are watched by name since there
    /// is no child handle to wait on.
    pub async fn wait(self, cancel: &CancelToken) -> io::Result<bool> {
        match self.child {
            Some(mut child) => {
                let join = tokio::task::spawn_blocking(move || child.wait());
                tokio::select! {
                    result = join => {
                        let status = result.map_err(io::Error::other)??;
                        log::info!("{} exited with {status}", self.name);
                        Ok(true)
                    }
                    _ = cancel.cancelled() => Ok(false),
                }
            }
            None => {
                while is_running(&self.name) {
                    if cancel.sleep(Duration::from_secs(2)).await {
                        return Ok(false);
                    }
                }
                log::info!("{} is no longer running", self.name);
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn process_name_strips_directory_and_extension() {
        assert_eq!(process_name(&PathBuf::from("/opt/apcc/ApPointMapper.exe")), "ApPointMapper");
        assert_eq!(process_name(&PathBuf::from("appm")), "appm");
    }

    #[test]
    fn nonexistent_process_is_not_running() {
        assert!(!is_running("definitely-not-a-real-process-name"));
    }
}

//! Line-by-line access to the standard output of an external tool.

use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};

const POLL_DELAY: Duration = Duration::from_millis(10);

/// Build a command for an external tool, routed through `cmd /c` on Windows so
/// that `.cmd` shims such as `npm` resolve.
pub fn tool_command(program: &str, args: &[&str]) -> Command {
    if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.arg("/c").arg(program).args(args);
        cmd
    } else {
        let mut cmd = Command::new(program);
        cmd.args(args);
        cmd
    }
}

/// Lazily yields the stdout lines of a running process, in emission order.
///
/// When no line is available and the process is still alive, waits briefly and
/// retries. Ends once the process has exited and its output is drained.
pub struct OutputLines {
    child: Child,
    reader: BufReader<ChildStdout>,
    exited: bool,
}

impl OutputLines {
    /// Spawn `command` with stdout captured. A spawn failure is an error, not an empty stream.
    pub fn spawn(mut command: Command) -> Result<Self> {
        let description = format!("{:?}", command);
        let mut child = command
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to start {}", description))?;
        let stdout = child
            .stdout
            .take()
            .with_context(|| format!("No stdout captured for {}", description))?;
        Ok(Self {
            child,
            reader: BufReader::new(stdout),
            exited: false,
        })
    }

    pub fn spawn_in(mut command: Command, working_dir: &Path) -> Result<Self> {
        command.current_dir(working_dir);
        Self::spawn(command)
    }

    fn has_exited(&mut self) -> bool {
        if !self.exited {
            self.exited = !matches!(self.child.try_wait(), Ok(None));
        }
        self.exited
    }
}

impl Iterator for OutputLines {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match self.reader.read_until(b'\n', &mut buf) {
                Ok(n) if n > 0 => {
                    let line = String::from_utf8_lossy(&buf);
                    return Some(line.trim_end_matches(['\r', '\n']).to_string());
                }
                // Nothing buffered: finished if the process is gone, otherwise poll again.
                _ => {
                    if self.has_exited() {
                        return None;
                    }
                    std::thread::sleep(POLL_DELAY);
                }
            }
        }
    }
}

impl Drop for OutputLines {
    fn drop(&mut self) {
        if !self.has_exited() {
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
    }
}

//! Running the installed mise binary
//!
//! Thin subprocess wrapper: every invocation captures stdout, stderr and
//! the exit code. Output lines can be echoed to the log while they arrive.

use crate::error::{ActionError, ActionResult};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, info};

/// Captured result of one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
    pub code: i32,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// Turn a non-zero exit into an error that carries stderr
    pub fn ensure_success(self, command: &str) -> ActionResult<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(ActionError::command_exit(command, self.code, self.stderr.trim_end()))
        }
    }
}

/// Which captured streams are echoed to the log as they arrive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Echo {
    /// Echo stdout and stderr
    All,
    /// Echo only stderr (stdout is machine-readable)
    Stderr,
}

/// Handle to the installed mise binary
#[derive(Debug, Clone)]
pub struct MiseCommand {
    bin: PathBuf,
    cwd: PathBuf,
}

impl MiseCommand {
    pub fn new(bin: impl Into<PathBuf>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            bin: bin.into(),
            cwd: cwd.into(),
        }
    }

    /// Run mise with `args` in the working directory, using exactly `env`
    pub async fn exec(
        &self,
        args: &[&str],
        env: &BTreeMap<String, String>,
        echo: Echo,
    ) -> ActionResult<ToolOutput> {
        let command = format!("mise {}", args.join(" "));
        debug!("Executing: {} in {}", command, self.cwd.display());

        let mut child = Command::new(&self.bin)
            .args(args)
            .current_dir(&self.cwd)
            .env_clear()
            .envs(env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ActionError::command_failed(&command, e))?;

        let (stdout, stderr) = collect_child_output(&mut child, echo).await?;

        let status = child
            .wait()
            .await
            .map_err(|e| ActionError::command_failed(&command, e))?;

        Ok(ToolOutput {
            stdout,
            stderr,
            code: status.code().unwrap_or(-1),
        })
    }

    /// `mise --version`, used as a smoke test after install
    pub async fn version(&self, env: &BTreeMap<String, String>) -> ActionResult<ToolOutput> {
        self.exec(&["--version"], env, Echo::All)
            .await?
            .ensure_success("mise --version")
    }

    /// `mise install`, installing every tool the configuration declares
    pub async fn install(&self, env: &BTreeMap<String, String>) -> ActionResult<ToolOutput> {
        self.exec(&["install"], env, Echo::All)
            .await?
            .ensure_success("mise install")
    }

    /// `mise env --json`; the caller decides how to treat a failure
    pub async fn env_json(&self, env: &BTreeMap<String, String>) -> ActionResult<ToolOutput> {
        self.exec(&["env", "--json"], env, Echo::Stderr).await
    }
}

/// Read stdout and stderr of a child concurrently until both close.
///
/// Returns each stream's full text; lines are logged per `echo`.
async fn collect_child_output(child: &mut Child, echo: Echo) -> ActionResult<(String, String)> {
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| ActionError::Internal("stdout not piped".to_string()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| ActionError::Internal("stderr not piped".to_string()))?;

    tokio::try_join!(
        read_lines(stdout, echo == Echo::All),
        read_lines(stderr, true)
    )
    .map_err(|e| ActionError::io("reading mise output", e))
}

/// Drain a stream to EOF. Bytes that are not UTF-8 are replaced, never fatal.
async fn read_lines(stream: impl AsyncRead + Unpin, echo: bool) -> std::io::Result<String> {
    let mut reader = BufReader::new(stream);
    let mut text = String::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            return Ok(text);
        }
        let raw = String::from_utf8_lossy(&buf);
        let line = raw.trim_end_matches(|c: char| c == '\n' || c == '\r');
        if echo {
            info!("{}", line);
        }
        text.push_str(line);
        text.push('\n');
    }
}

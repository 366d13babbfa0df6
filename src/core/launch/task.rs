// ─── Launch Task ───
// Runs a Java subprocess to completion, forwarding its output into tracing.

use std::path::Path;
use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::core::cancel::CancelToken;
use crate::core::error::{LauncherError, LauncherResult};

/// Spawn `<java_bin> <argv...>` in `working_dir` and wait for it to exit.
/// Cancellation kills the child. Values in `secrets` are masked in logs.
pub async fn run_java(
    java_bin: &Path,
    argv: &[String],
    working_dir: &Path,
    secrets: &[&str],
    cancel: &CancelToken,
) -> LauncherResult<ExitStatus> {
    cancel.check()?;

    let mut cmd = Command::new(java_bin);
    cmd.args(argv)
        .current_dir(working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    configure_platform_spawn(&mut cmd);

    info!("Starting {:?} in {:?}", java_bin, working_dir);
    debug!(
        "Command (copy/paste): {}",
        format_command_for_logs(java_bin, argv, secrets)
    );

    let mut child = cmd
        .spawn()
        .map_err(|e| LauncherError::JavaExecution(format!("{}: {}", java_bin.display(), e)))?;

    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(forward_lines(stdout, "stdout"));
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(forward_lines(stderr, "stderr"));
    }

    tokio::select! {
        status = child.wait() => {
            let status = status.map_err(|e| LauncherError::JavaExecution(e.to_string()))?;
            info!("Process exited with {}", status);
            Ok(status)
        }
        _ = cancel.cancelled() => {
            warn!("Cancelled, killing {:?}", java_bin);
            if let Err(e) = child.kill().await {
                warn!("Failed to kill child process: {}", e);
            }
            Err(LauncherError::Cancelled)
        }
    }
}

async fn forward_lines(stream: impl AsyncRead + Unpin, label: &'static str) {
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        info!(target: "game", "[{}] {}", label, line);
    }
}

fn configure_platform_spawn(cmd: &mut Command) {
    #[cfg(target_os = "windows")]
    {
        // Terminal markers make LWJGL treat the child as a console session.
        cmd.env_remove("WT_SESSION");
        cmd.env_remove("TERM");
        cmd.env_remove("ConEmuANSI");
    }
    #[cfg(not(target_os = "windows"))]
    let _ = cmd;
}

pub fn format_command_for_logs(program: &Path, argv: &[String], secrets: &[&str]) -> String {
    std::iter::once(program.to_string_lossy().to_string())
        .chain(argv.iter().cloned())
        .map(|arg| redact(&arg, secrets))
        .map(|arg| shell_escape(&arg))
        .collect::<Vec<_>>()
        .join(" ")
}

fn redact(arg: &str, secrets: &[&str]) -> String {
    secrets
        .iter()
        .filter(|s| !s.is_empty())
        .fold(arg.to_string(), |acc, secret| acc.replace(secret, "***"))
}

fn shell_escape(raw: &str) -> String {
    if raw.is_empty() {
        return "\"\"".to_string();
    }

    if raw.chars().all(|ch| {
        ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '/' | ':' | '\\' | '=' | '*' | '+')
    }) {
        return raw.to_string();
    }

    format!("\"{}\"", raw.replace('"', "\\\""))
}

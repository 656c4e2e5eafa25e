//! Child-process plumbing shared by the installer and the executors.

use anyhow::{Context, Result};
use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::io::{self, Read};
use std::os::fd::AsFd;
use std::process::{Child, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Maximum captured size of a single output stream (10MB)
pub const MAX_OUTPUT_SIZE: usize = 10 * 1024 * 1024;

/// Timeout for collecting output from child process pipes after exit
const OUTPUT_COLLECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Appended to output cut at `MAX_OUTPUT_SIZE`
pub const TRUNCATION_MARKER: &str = "\n[output truncated at 10MB]";

const READ_FAILED: &str = "[error reading output]";

/// Send SIGKILL to every process in the group led by `pgid`.
///
/// A group that has already exited is not an error.
pub fn kill_process_group(pgid: u32) -> Result<()> {
    signal_process_group(pgid, Signal::SIGKILL)
}

/// Ask every process in the group led by `pgid` to shut down (SIGTERM).
pub fn terminate_process_group(pgid: u32) -> Result<()> {
    signal_process_group(pgid, Signal::SIGTERM)
}

fn signal_process_group(pgid: u32, signal: Signal) -> Result<()> {
    let pgid = i32::try_from(pgid).context("Process group id out of range")?;
    match killpg(Pid::from_raw(pgid), signal) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to send {signal} to process group {pgid}")),
    }
}

/// A `Stdio` that writes into this process's standard error.
///
/// Binding a child's stdout to this keeps whatever the child prints out of
/// the result channel. The duplicated descriptor is owned by the child's
/// `Command` and closed once the command is dropped, on every exit path.
pub fn diagnostic_stdout() -> Result<Stdio> {
    let fd = io::stderr()
        .as_fd()
        .try_clone_to_owned()
        .context("Failed to duplicate stderr for diagnostic output")?;
    Ok(Stdio::from(fd))
}

/// Captured output of a finished child.
#[derive(Debug, Clone, Default)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Wait for `child` to exit while draining both pipes.
///
/// Reading starts before waiting: a child that fills a pipe buffer would
/// otherwise block on write() and never exit.
pub fn wait_with_output(mut child: Child) -> Result<(std::process::ExitStatus, CapturedOutput)> {
    let stdout_rx = drain(child.stdout.take());
    let stderr_rx = drain(child.stderr.take());

    let status = child.wait().context("Failed to wait for child process")?;

    let stdout = stdout_rx
        .recv_timeout(OUTPUT_COLLECTION_TIMEOUT)
        .unwrap_or_else(|_| "[output collection timed out]".to_string());
    let stderr = stderr_rx
        .recv_timeout(OUTPUT_COLLECTION_TIMEOUT)
        .unwrap_or_else(|_| "[output collection timed out]".to_string());

    Ok((status, CapturedOutput { stdout, stderr }))
}

fn drain<R: Read + Send + 'static>(stream: Option<R>) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    match stream {
        Some(stream) => {
            thread::spawn(move || {
                let _ = tx.send(read_capped(stream));
            });
        }
        None => {
            let _ = tx.send(String::new());
        }
    }
    rx
}

/// Read `stream` to its end, keeping at most `MAX_OUTPUT_SIZE` bytes.
///
/// Bytes past the cap are consumed and dropped so the writer is never left
/// blocked on a full pipe; the kept text then ends with `TRUNCATION_MARKER`.
pub fn read_capped<R: Read>(stream: R) -> String {
    let mut kept = Vec::new();
    let mut capped = stream.take(MAX_OUTPUT_SIZE as u64);
    if capped.read_to_end(&mut kept).is_err() && kept.is_empty() {
        return READ_FAILED.to_string();
    }

    let overflow = io::copy(&mut capped.into_inner(), &mut io::sink()).unwrap_or(0);
    let mut text = String::from_utf8_lossy(&kept).into_owned();
    if overflow > 0 {
        text.push_str(TRUNCATION_MARKER);
    }
    text
}

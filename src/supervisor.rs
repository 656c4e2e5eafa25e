//! Wall-clock deadline enforcement for code that cannot be trusted to cooperate.
//!
//! The supervised work runs as a child process in its own process group. The
//! supervisor waits up to the deadline, sends the whole group SIGTERM, and
//! after a short grace period kills it. The kill reaches the work whatever it
//! is doing: blocked on I/O, inside a native library call, or spinning in a
//! loop. The grace period lets an engine take down helpers it started outside
//! the group, such as a notebook kernel in its own session.
//!
//! Only one deadline may be armed per process. Arming returns a guard that
//! disarms on drop, so every exit path (including `?` and panics) releases it.

use anyhow::{Context, Result};
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, ExitStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use wait_timeout::ChildExt;

use crate::config::TimeoutPolicy;
use crate::error::HarnessError;
use crate::process::{kill_process_group, terminate_process_group};

static ARMED: AtomicBool = AtomicBool::new(false);

/// Time a timed-out group gets between SIGTERM and SIGKILL
pub const TERMINATION_GRACE: Duration = Duration::from_secs(2);

/// A wall-clock budget for one supervised operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    budget: Duration,
}

impl Deadline {
    pub fn new(budget: Duration) -> Self {
        Self { budget }
    }

    pub fn script(policy: &TimeoutPolicy) -> Self {
        Self::new(policy.script_budget())
    }

    pub fn notebook(policy: &TimeoutPolicy, cell_count: usize) -> Self {
        Self::new(policy.notebook_budget(cell_count))
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }
}

/// How a supervised operation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Supervised<T> {
    Completed(T),
    TimedOut,
}

/// Proof that the single process-wide deadline slot is held.
#[derive(Debug)]
pub struct ArmedDeadline {
    deadline: Deadline,
}

impl ArmedDeadline {
    /// Arm `deadline`, failing if another deadline is already active.
    pub fn arm(deadline: Deadline) -> Result<Self> {
        if ARMED
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(HarnessError::DeadlineAlreadyArmed.into());
        }
        debug!(budget_secs = deadline.budget.as_secs(), "Deadline armed");
        Ok(Self { deadline })
    }

    pub fn deadline(&self) -> Deadline {
        self.deadline
    }
}

impl Drop for ArmedDeadline {
    fn drop(&mut self) {
        ARMED.store(false, Ordering::Release);
        debug!("Deadline disarmed");
    }
}

/// Whether a deadline is currently armed in this process.
pub fn is_armed() -> bool {
    ARMED.load(Ordering::Acquire)
}

/// A spawned process group that is killed if it is dropped before being reaped.
struct GroupGuard {
    child: Child,
    reaped: bool,
}

impl GroupGuard {
    /// SIGTERM the group, give the leader `grace` to exit, then kill the rest.
    fn terminate(&mut self, grace: Duration) {
        if let Err(e) = terminate_process_group(self.child.id()) {
            warn!("Failed to terminate process group: {e:#}");
        }
        match self.child.wait_timeout(grace) {
            Ok(Some(status)) => debug!(%status, "Supervised process exited after SIGTERM"),
            Ok(None) => debug!("Supervised process ignored SIGTERM"),
            Err(e) => warn!("Failed to wait for terminated process: {e}"),
        }
        self.kill();
    }

    fn kill(&mut self) {
        if let Err(e) = kill_process_group(self.child.id()) {
            warn!("Failed to kill process group: {e:#}");
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
        self.reaped = true;
    }
}

impl Drop for GroupGuard {
    fn drop(&mut self) {
        if !self.reaped {
            self.kill();
        }
    }
}

/// Run `command` to completion or until `deadline` elapses.
///
/// The child becomes the leader of a new process group so that anything it
/// spawns (interpreters, kernels, subprocesses of the artifact) is killed with
/// it on timeout.
pub fn supervise(deadline: Deadline, mut command: Command) -> Result<Supervised<ExitStatus>> {
    let armed = ArmedDeadline::arm(deadline)?;

    command.process_group(0);
    let child = command
        .spawn()
        .with_context(|| format!("Failed to spawn {:?}", command.get_program()))?;
    let mut group = GroupGuard {
        child,
        reaped: false,
    };

    let start = Instant::now();
    let wait_result = group
        .child
        .wait_timeout(armed.deadline().budget())
        .context("Failed to wait for supervised process")?;

    match wait_result {
        Some(status) => {
            group.reaped = true;
            // The leader is gone, but anything it left running in the
            // group must not outlive the deadline scope either.
            let _ = kill_process_group(group.child.id());
            debug!(elapsed_ms = start.elapsed().as_millis() as u64, %status, "Supervised process exited");
            Ok(Supervised::Completed(status))
        }
        None => {
            info!(
                budget_secs = armed.deadline().budget().as_secs(),
                "Timeout encountered, terminating supervised process group"
            );
            group.terminate(TERMINATION_GRACE);
            Ok(Supervised::TimedOut)
        }
    }
}

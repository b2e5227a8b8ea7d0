//! Forced termination with SIGTERM → SIGKILL escalation.
//!
//! The graceful path is the server's own `stop` command. These helpers run
//! only when that command could not be delivered or did not finish in time.

use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::handle::{ProcessExit, ProcessHandle};

/// Grace period between SIGTERM and the hard kill.
pub const TERMINATE_GRACE: Duration = Duration::from_secs(5);

/// Wait up to `wait` for the process to exit on its own, then escalate.
pub async fn wait_or_terminate(handle: &ProcessHandle, wait: Duration) -> Option<ProcessExit> {
    match timeout(wait, handle.liveness().wait_exit()).await {
        Ok(exit) => exit,
        Err(_) => {
            warn!(
                pid = %handle.pid(),
                timeout_secs = wait.as_secs(),
                "server did not stop in time, forcing termination"
            );
            terminate(handle, TERMINATE_GRACE).await
        }
    }
}

/// Terminate the process, escalating to a hard kill after `grace`.
///
/// # Platform behavior
/// - Unix: SIGTERM via nix, then a hard kill if still running after `grace`
/// - Windows: immediate hard kill (no graceful signal available)
pub async fn terminate(handle: &ProcessHandle, grace: Duration) -> Option<ProcessExit> {
    if !handle.is_alive() {
        return handle.liveness().exit();
    }

    #[cfg(unix)]
    {
        if send_sigterm(handle.pid()) {
            if let Ok(exit) = timeout(grace, handle.liveness().wait_exit()).await {
                return exit;
            }
            debug!(pid = %handle.pid(), "server ignored SIGTERM, killing");
        }
    }

    #[cfg(not(unix))]
    let _ = grace;

    handle.force_kill();
    handle.liveness().wait_exit().await
}

/// Returns `false` when the signal could not be sent.
#[cfg(unix)]
fn send_sigterm(pid: u32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    match signal::kill(Pid::from_raw(raw), Signal::SIGTERM) {
        Ok(()) => true,
        // Already exited; the reaper reports it shortly.
        Err(Errno::ESRCH) => true,
        Err(e) => {
            warn!(pid = %pid, error = %e, "failed to send SIGTERM");
            false
        }
    }
}

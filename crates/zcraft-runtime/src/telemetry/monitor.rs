//! Periodic CPU and memory sampling for the server process.

use std::sync::Arc;
use std::time::Duration;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::debug;

use zcraft_core::ServerEvent;

use super::store::TelemetryStore;
use crate::process::{Liveness, RunId, ServerEventBroadcaster};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Failure of a single OS accounting query.
///
/// Never surfaced: the tick is skipped and the next one tries again.
#[derive(Debug, Error)]
pub(crate) enum TelemetryReadError {
    #[error("process {0} not found")]
    ProcessGone(u32),
}

/// One resource sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ResourceSample {
    pub cpu_percent: f64,
    pub memory_mb: f64,
}

/// Reads CPU and resident memory for one pid.
///
/// CPU usage is computed by sysinfo over the time since the previous
/// refresh, so the first sample of a run reads zero.
pub(crate) struct ProcessSampler {
    system: System,
    pid: Pid,
}

impl ProcessSampler {
    pub fn new(pid: u32) -> Self {
        Self {
            system: System::new(),
            pid: Pid::from_u32(pid),
        }
    }

    pub(crate) fn sample(&mut self) -> Result<ResourceSample, TelemetryReadError> {
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[self.pid]),
            true,
            ProcessRefreshKind::nothing().with_cpu().with_memory(),
        );

        let process = self
            .system
            .process(self.pid)
            .ok_or(TelemetryReadError::ProcessGone(self.pid.as_u32()))?;

        #[allow(clippy::cast_precision_loss)]
        let memory_mb = process.memory() as f64 / BYTES_PER_MB;

        Ok(ResourceSample {
            cpu_percent: f64::from(process.cpu_usage()),
            memory_mb,
        })
    }
}

/// Polls the bound process on a fixed interval for the lifetime of one run.
pub struct ResourceMonitor {
    run_id: RunId,
    pid: u32,
    liveness: Liveness,
    started: std::time::Instant,
    interval: Duration,
    telemetry: Arc<TelemetryStore>,
    events: Arc<ServerEventBroadcaster>,
}

impl ResourceMonitor {
    pub fn new(
        run_id: RunId,
        pid: u32,
        liveness: Liveness,
        started: std::time::Instant,
        interval: Duration,
        telemetry: Arc<TelemetryStore>,
        events: Arc<ServerEventBroadcaster>,
    ) -> Self {
        Self {
            run_id,
            pid,
            liveness,
            started,
            interval,
            telemetry,
            events,
        }
    }

    /// Run the monitor on its own task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Poll until the process exits or the run is torn down.
    pub async fn run(self) {
        let mut sampler = ProcessSampler::new(self.pid);
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        debug!(run = %self.run_id, pid = %self.pid, "resource monitor started");

        loop {
            ticker.tick().await;

            if !self.liveness.is_alive() {
                break;
            }

            let sample = match sampler.sample() {
                Ok(sample) => sample,
                Err(e) => {
                    debug!(run = %self.run_id, error = %e, "telemetry read failed, skipping tick");
                    continue;
                }
            };

            let uptime_secs = self.started.elapsed().as_secs();
            if !self.telemetry.record_resources(
                self.run_id,
                sample.cpu_percent,
                sample.memory_mb,
                uptime_secs,
            ) {
                break;
            }

            let snapshot = self.telemetry.snapshot();
            if !self.telemetry.is_current(self.run_id) {
                break;
            }
            self.events.broadcast(ServerEvent::Telemetry(snapshot));
        }

        debug!(run = %self.run_id, "resource monitor exiting");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampler_reads_own_process() {
        let mut sampler = ProcessSampler::new(std::process::id());
        let sample = sampler.sample().expect("own process is visible");
        assert!(sample.memory_mb > 0.0);
        assert!(sample.cpu_percent >= 0.0);
    }

    #[test]
    fn test_sampler_reports_missing_process() {
        // Pids are capped well below this on every supported platform.
        let mut sampler = ProcessSampler::new(u32::MAX - 1);
        assert!(matches!(
            sampler.sample(),
            Err(TelemetryReadError::ProcessGone(_))
        ));
    }
}

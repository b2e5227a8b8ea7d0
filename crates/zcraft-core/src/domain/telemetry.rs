//! Telemetry figures for a running server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tick rate of an unstressed server.
pub const NOMINAL_TICK_RATE: f64 = 20.0;

/// Point-in-time view of resource and domain metrics.
///
/// Fields are written independently by the resource monitor (CPU, memory,
/// uptime) and the output parser (players, tick rate); a snapshot is only
/// guaranteed fresh to within one polling interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySnapshot {
    /// CPU utilization over the last sampling interval, in percent.
    pub cpu_percent: f64,
    /// Resident memory in megabytes.
    pub memory_mb: f64,
    /// Configured maximum heap in megabytes (0 when offline).
    pub memory_ceiling_mb: u64,
    /// Best-effort count of players online.
    pub players_online: u32,
    /// Last tick-rate figure read from the server log.
    pub tick_rate: f64,
    /// Seconds since the process was confirmed started.
    pub uptime_secs: u64,
    /// When the process was confirmed started.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
}

impl Default for TelemetrySnapshot {
    fn default() -> Self {
        Self {
            cpu_percent: 0.0,
            memory_mb: 0.0,
            memory_ceiling_mb: 0,
            players_online: 0,
            tick_rate: NOMINAL_TICK_RATE,
            uptime_secs: 0,
            started_at: None,
        }
    }
}

impl TelemetrySnapshot {
    /// Resident memory as a percentage of the configured ceiling, clamped to 100.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn memory_percent(&self) -> f64 {
        if self.memory_ceiling_mb == 0 {
            return 0.0;
        }
        (self.memory_mb / self.memory_ceiling_mb as f64 * 100.0).min(100.0)
    }

    /// Health bucket for the current tick rate.
    #[must_use]
    pub fn tick_rate_health(&self) -> TickRateHealth {
        TickRateHealth::classify(self.tick_rate)
    }

    /// Uptime rendered as `Hh Mm Ss`.
    #[must_use]
    pub fn uptime_display(&self) -> String {
        format_uptime(self.uptime_secs)
    }
}

/// Coarse classification of the tick rate for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TickRateHealth {
    /// 19 ticks per second or better.
    Healthy,
    /// Between 15 and 19.
    Degraded,
    /// Below 15.
    Critical,
}

impl TickRateHealth {
    /// Classify a tick-rate reading.
    #[must_use]
    pub fn classify(tick_rate: f64) -> Self {
        if tick_rate >= 19.0 {
            Self::Healthy
        } else if tick_rate >= 15.0 {
            Self::Degraded
        } else {
            Self::Critical
        }
    }
}

/// Format a duration in seconds as `Hh Mm Ss`.
#[must_use]
pub fn format_uptime(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours}h {minutes}m {seconds}s")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_snapshot_is_zeroed() {
        let snapshot = TelemetrySnapshot::default();
        assert_eq!(snapshot.players_online, 0);
        assert!((snapshot.tick_rate - NOMINAL_TICK_RATE).abs() < f64::EPSILON);
        assert!(snapshot.started_at.is_none());
        assert!(snapshot.memory_percent().abs() < f64::EPSILON);
    }

    #[test]
    fn test_memory_percent_is_clamped() {
        let snapshot = TelemetrySnapshot {
            memory_mb: 1024.0,
            memory_ceiling_mb: 2048,
            ..Default::default()
        };
        assert!((snapshot.memory_percent() - 50.0).abs() < 1e-9);

        let over = TelemetrySnapshot {
            memory_mb: 4096.0,
            memory_ceiling_mb: 2048,
            ..Default::default()
        };
        assert!((over.memory_percent() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_tick_rate_health_buckets() {
        assert_eq!(TickRateHealth::classify(20.0), TickRateHealth::Healthy);
        assert_eq!(TickRateHealth::classify(19.0), TickRateHealth::Healthy);
        assert_eq!(TickRateHealth::classify(18.9), TickRateHealth::Degraded);
        assert_eq!(TickRateHealth::classify(15.0), TickRateHealth::Degraded);
        assert_eq!(TickRateHealth::classify(9.5), TickRateHealth::Critical);
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(0), "0h 0m 0s");
        assert_eq!(format_uptime(3725), "1h 2m 5s");
        assert_eq!(format_uptime(90_061), "25h 1m 1s");
    }
}

//! Terminal rendering of events and status.

use zcraft_core::{
    LifecycleState, OutputLine, OutputSource, ServerEvent, StateChange, TelemetrySnapshot,
    TickRateHealth,
};

/// Text for one console line.
pub fn format_output(line: &OutputLine) -> String {
    match line.source {
        OutputSource::Server | OutputSource::Operator => line.text.clone(),
        OutputSource::Manager => format!("[zcraft] {}", line.text),
    }
}

/// Banner for a lifecycle transition. Crashes are rendered distinctly.
pub fn format_state_change(change: &StateChange) -> String {
    if change.crashed() {
        return match change.exit_code {
            Some(code) => format!("!!! Server crashed (exit code {code}) !!!"),
            None => "!!! Server crashed !!!".to_string(),
        };
    }
    match change.state {
        LifecycleState::Starting => "*** Server starting ***".to_string(),
        LifecycleState::Online => "*** Server online ***".to_string(),
        LifecycleState::Stopping => "*** Server stopping ***".to_string(),
        LifecycleState::Offline => "*** Server offline ***".to_string(),
    }
}

/// Text for an event, or `None` for events the console does not print.
pub fn format_event(event: &ServerEvent) -> Option<String> {
    match event {
        ServerEvent::Output(line) => Some(format_output(line)),
        ServerEvent::State(change) => Some(format_state_change(change)),
        ServerEvent::Telemetry(_) => None,
    }
}

const fn health_label(health: TickRateHealth) -> &'static str {
    match health {
        TickRateHealth::Healthy => "healthy",
        TickRateHealth::Degraded => "degraded",
        TickRateHealth::Critical => "critical",
    }
}

/// Multi-line status block for `:status`.
pub fn format_status(
    state: LifecycleState,
    pid: Option<u32>,
    snapshot: &TelemetrySnapshot,
) -> String {
    let mut lines = vec![format!("State:    {state}")];
    if let Some(pid) = pid {
        lines.push(format!("PID:      {pid}"));
    }
    lines.push(format!("Uptime:   {}", snapshot.uptime_display()));
    lines.push(format!("CPU:      {:.1}%", snapshot.cpu_percent));
    lines.push(format!(
        "Memory:   {:.0} MB / {} MB ({:.0}%)",
        snapshot.memory_mb,
        snapshot.memory_ceiling_mb,
        snapshot.memory_percent()
    ));
    lines.push(format!("Players:  {}", snapshot.players_online));
    lines.push(format!(
        "TPS:      {:.1} ({})",
        snapshot.tick_rate,
        health_label(snapshot.tick_rate_health())
    ));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use zcraft_core::StopReason;

    #[test]
    fn test_crash_banner_is_distinct() {
        let crash = StateChange::new(LifecycleState::Online, LifecycleState::Offline)
            .with_reason(StopReason::Crashed)
            .with_exit_code(Some(3));
        let stop = StateChange::new(LifecycleState::Stopping, LifecycleState::Offline)
            .with_reason(StopReason::Requested);

        assert_eq!(format_state_change(&crash), "!!! Server crashed (exit code 3) !!!");
        assert_eq!(format_state_change(&stop), "*** Server offline ***");
    }

    #[test]
    fn test_output_lines() {
        let line = OutputLine::server("[Server thread/INFO]: Done");
        assert_eq!(format_output(&line), "[Server thread/INFO]: Done");
        assert_eq!(format_output(&OutputLine::operator("list")), "> list");
        assert_eq!(
            format_output(&OutputLine::manager("Starting")),
            "[zcraft] Starting"
        );
        assert!(format_event(&ServerEvent::Telemetry(TelemetrySnapshot::default())).is_none());
    }

    #[test]
    fn test_status_block() {
        let snapshot = TelemetrySnapshot {
            cpu_percent: 12.34,
            memory_mb: 1024.0,
            memory_ceiling_mb: 2048,
            players_online: 3,
            tick_rate: 17.5,
            uptime_secs: 3725,
            started_at: None,
        };
        let status = format_status(LifecycleState::Online, Some(42), &snapshot);
        assert!(status.contains("State:    online"));
        assert!(status.contains("PID:      42"));
        assert!(status.contains("CPU:      12.3%"));
        assert!(status.contains("1024 MB / 2048 MB (50%)"));
        assert!(status.contains("Players:  3"));
        assert!(status.contains("TPS:      17.5 (degraded)"));
        assert!(status.contains(&snapshot.uptime_display()));
    }
}

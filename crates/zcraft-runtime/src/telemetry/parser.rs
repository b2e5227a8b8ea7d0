//! Heuristic telemetry extraction from server console lines.
//!
//! The player count is derived from join/leave messages and is not
//! reconciled against the server's player list, so it can drift if lines
//! are missed or matched by coincidence. It only ever clamps at zero.

use regex::Regex;
use std::sync::LazyLock;

/// A tick-rate label followed by a decimal figure.
///
/// Handles `TPS: 19.8`, `TPS 19.8` and Paper's
/// `TPS from last 1m, 5m, 15m: 20.0, 20.0, 20.0` (the figure after the
/// first colon wins).
static TICK_RATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\btps\b(?:[^:\r\n]*:)?\D*?(\d+(?:\.\d*)?)")
        .expect("tick rate pattern must compile")
});

/// Change to the online player count signalled by one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerDelta {
    Joined,
    Left,
}

/// Telemetry signals found in one console line.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LineSignals {
    pub players: Option<PlayerDelta>,
    pub tick_rate: Option<f64>,
}

impl LineSignals {
    /// Whether the line carried nothing of interest.
    pub const fn is_empty(&self) -> bool {
        self.players.is_none() && self.tick_rate.is_none()
    }
}

/// Extract telemetry signals from one console line.
pub fn parse_line(line: &str) -> LineSignals {
    LineSignals {
        players: player_delta(line),
        tick_rate: tick_rate(line),
    }
}

fn player_delta(line: &str) -> Option<PlayerDelta> {
    let lower = line.to_ascii_lowercase();
    if lower.contains("joined the game") {
        Some(PlayerDelta::Joined)
    } else if lower.contains("left the game") {
        Some(PlayerDelta::Left)
    } else {
        None
    }
}

fn tick_rate(line: &str) -> Option<f64> {
    let captures = TICK_RATE.captures(line)?;
    captures
        .get(1)?
        .as_str()
        .parse::<f64>()
        .ok()
        .filter(|tps| tps.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_and_leave() {
        assert_eq!(
            parse_line("[12:00:01] [Server thread/INFO]: Player123 joined the game").players,
            Some(PlayerDelta::Joined)
        );
        assert_eq!(
            parse_line("[12:05:00] [Server thread/INFO]: Player123 left the game").players,
            Some(PlayerDelta::Left)
        );
        assert_eq!(
            parse_line("Steve JOINED THE GAME").players,
            Some(PlayerDelta::Joined)
        );
        assert_eq!(parse_line("Done (4.2s)! For help, type \"help\"").players, None);
    }

    #[test]
    fn test_tick_rate_figures() {
        assert_eq!(parse_line("[INFO]: TPS: 19.8").tick_rate, Some(19.8));
        assert_eq!(parse_line("tps 20").tick_rate, Some(20.0));
        assert_eq!(
            parse_line("[Server thread/INFO]: TPS from last 1m, 5m, 15m: 18.5, 19.9, 20.0").tick_rate,
            Some(18.5)
        );
    }

    #[test]
    fn test_malformed_tick_rate_is_ignored() {
        assert_eq!(parse_line("[INFO]: TPS: unknown").tick_rate, None);
        assert_eq!(parse_line("Loading steps 5 of 9").tick_rate, None);
        assert!(parse_line("Preparing spawn area: 83%").is_empty());
    }
}

//! Shared telemetry with disjoint per-writer fields.
//!
//! The resource monitor owns CPU, memory and uptime; the output consumer
//! owns the player count and tick rate. Each field is its own atomic so
//! neither writer waits on the other and a reader never sees a torn value.
//! Every write is tagged with the run it belongs to and dropped if that run
//! is no longer current. A write that races with [`TelemetryStore::clear`]
//! is undone, so figures from a finished run never outlive its teardown.

use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, AtomicU32, AtomicU64, Ordering, fence};

use zcraft_core::{NOMINAL_TICK_RATE, TelemetrySnapshot};

use super::parser::{LineSignals, PlayerDelta};
use crate::process::RunId;

const NO_RUN: u64 = 0;
const NOT_STARTED: i64 = i64::MIN;

/// `f64` stored as its bit pattern.
#[derive(Debug)]
struct AtomicF64(AtomicU64);

impl AtomicF64 {
    fn new(value: f64) -> Self {
        Self(AtomicU64::new(value.to_bits()))
    }

    fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    fn store(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// Live telemetry for the current run.
#[derive(Debug)]
pub struct TelemetryStore {
    run: AtomicU64,
    // Resource monitor fields
    cpu_percent: AtomicF64,
    memory_mb: AtomicF64,
    uptime_secs: AtomicU64,
    // Output consumer fields
    players_online: AtomicU32,
    tick_rate: AtomicF64,
    // Fixed for the run
    memory_ceiling_mb: AtomicU64,
    started_at_ms: AtomicI64,
}

impl TelemetryStore {
    pub fn new() -> Self {
        Self {
            run: AtomicU64::new(NO_RUN),
            cpu_percent: AtomicF64::new(0.0),
            memory_mb: AtomicF64::new(0.0),
            uptime_secs: AtomicU64::new(0),
            players_online: AtomicU32::new(0),
            tick_rate: AtomicF64::new(NOMINAL_TICK_RATE),
            memory_ceiling_mb: AtomicU64::new(0),
            started_at_ms: AtomicI64::new(NOT_STARTED),
        }
    }

    /// Zero every figure and bind the store to a new run.
    pub fn reset(&self, run_id: RunId, memory_ceiling_mb: u64, started_at: DateTime<Utc>) {
        self.zero();
        self.memory_ceiling_mb
            .store(memory_ceiling_mb, Ordering::Relaxed);
        self.started_at_ms
            .store(started_at.timestamp_millis(), Ordering::Relaxed);
        self.run.store(run_id.get(), Ordering::Release);
    }

    /// Unbind the store from any run and zero every figure.
    pub fn clear(&self) {
        self.run.store(NO_RUN, Ordering::SeqCst);
        self.zero();
    }

    /// Whether `run_id` is the run currently bound.
    pub fn is_current(&self, run_id: RunId) -> bool {
        self.run.load(Ordering::Acquire) == run_id.get()
    }

    /// Record one resource sample. Returns `false` if `run_id` is stale.
    pub fn record_resources(
        &self,
        run_id: RunId,
        cpu_percent: f64,
        memory_mb: f64,
        uptime_secs: u64,
    ) -> bool {
        self.guarded_write(
            run_id,
            || {
                self.cpu_percent.store(cpu_percent);
                self.memory_mb.store(memory_mb);
                self.uptime_secs.store(uptime_secs, Ordering::Relaxed);
            },
            || {
                self.cpu_percent.store(0.0);
                self.memory_mb.store(0.0);
                self.uptime_secs.store(0, Ordering::Relaxed);
            },
        )
    }

    /// Apply signals parsed from one console line. Returns `false` if
    /// `run_id` is stale.
    pub fn apply(&self, run_id: RunId, signals: &LineSignals) -> bool {
        if signals.is_empty() {
            return self.is_current(run_id);
        }
        self.guarded_write(
            run_id,
            || {
                match signals.players {
                    Some(PlayerDelta::Joined) => {
                        self.players_online.fetch_add(1, Ordering::Relaxed);
                    }
                    Some(PlayerDelta::Left) => {
                        // Clamp at zero; a `None` from the closure means already zero.
                        let _ = self.players_online.fetch_update(
                            Ordering::Relaxed,
                            Ordering::Relaxed,
                            |count| count.checked_sub(1),
                        );
                    }
                    None => {}
                }
                if let Some(tps) = signals.tick_rate {
                    self.tick_rate.store(tps);
                }
            },
            || {
                self.players_online.store(0, Ordering::Relaxed);
                self.tick_rate.store(NOMINAL_TICK_RATE);
            },
        )
    }

    /// Run `write` for `run_id`, then confirm the run is still bound.
    ///
    /// If the store was cleared or rebound while writing, `undo` restores
    /// the written fields to their zeroed values.
    fn guarded_write(&self, run_id: RunId, write: impl FnOnce(), undo: impl FnOnce()) -> bool {
        if !self.is_current(run_id) {
            return false;
        }
        write();
        fence(Ordering::SeqCst);
        if self.run.load(Ordering::SeqCst) != run_id.get() {
            undo();
            return false;
        }
        true
    }

    /// Assemble a point-in-time snapshot.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        let started_at = match self.started_at_ms.load(Ordering::Relaxed) {
            NOT_STARTED => None,
            ms => Utc.timestamp_millis_opt(ms).single(),
        };

        TelemetrySnapshot {
            cpu_percent: self.cpu_percent.load(),
            memory_mb: self.memory_mb.load(),
            memory_ceiling_mb: self.memory_ceiling_mb.load(Ordering::Relaxed),
            players_online: self.players_online.load(Ordering::Relaxed),
            tick_rate: self.tick_rate.load(),
            uptime_secs: self.uptime_secs.load(Ordering::Relaxed),
            started_at,
        }
    }

    fn zero(&self) {
        self.cpu_percent.store(0.0);
        self.memory_mb.store(0.0);
        self.uptime_secs.store(0, Ordering::Relaxed);
        self.players_online.store(0, Ordering::Relaxed);
        self.tick_rate.store(NOMINAL_TICK_RATE);
        self.memory_ceiling_mb.store(0, Ordering::Relaxed);
        self.started_at_ms.store(NOT_STARTED, Ordering::Relaxed);
    }
}

impl Default for TelemetryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::parse_line;

    fn bound_store(run: u64) -> TelemetryStore {
        let store = TelemetryStore::new();
        store.reset(RunId::new(run), 2048, Utc::now());
        store
    }

    #[test]
    fn test_new_store_matches_default_snapshot() {
        assert_eq!(TelemetryStore::new().snapshot(), TelemetrySnapshot::default());
    }

    #[test]
    fn test_player_count_never_negative() {
        let store = bound_store(1);
        let run = RunId::new(1);
        let lines = [
            "Alex left the game",
            "Steve joined the game",
            "Alex joined the game",
            "Steve left the game",
            "Alex left the game",
            "Alex left the game",
        ];
        let expected = [0, 1, 2, 1, 0, 0];

        for (line, want) in lines.iter().zip(expected) {
            store.apply(run, &parse_line(line));
            assert_eq!(store.snapshot().players_online, want, "after {line:?}");
        }
    }

    #[test]
    fn test_tick_rate_keeps_previous_on_malformed() {
        let store = bound_store(1);
        let run = RunId::new(1);

        store.apply(run, &parse_line("[INFO]: TPS: 19.8"));
        assert!((store.snapshot().tick_rate - 19.8).abs() < f64::EPSILON);

        store.apply(run, &parse_line("[INFO]: TPS: n/a"));
        assert!((store.snapshot().tick_rate - 19.8).abs() < f64::EPSILON);
    }

    #[test]
    fn test_stale_run_writes_are_dropped() {
        let store = bound_store(2);

        assert!(!store.apply(RunId::new(1), &parse_line("Steve joined the game")));
        assert!(!store.record_resources(RunId::new(1), 50.0, 900.0, 10));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.players_online, 0);
        assert!(snapshot.cpu_percent.abs() < f64::EPSILON);
    }

    #[test]
    fn test_reset_and_clear() {
        let store = bound_store(1);
        let run = RunId::new(1);
        assert!(store.record_resources(run, 12.5, 1024.0, 65));
        store.apply(run, &parse_line("Steve joined the game"));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.memory_ceiling_mb, 2048);
        assert_eq!(snapshot.uptime_secs, 65);
        assert!(snapshot.started_at.is_some());
        assert!((snapshot.memory_percent() - 50.0).abs() < 1e-9);

        store.clear();
        assert!(!store.is_current(run));
        assert_eq!(store.snapshot(), TelemetrySnapshot::default());
    }

    #[test]
    fn test_write_racing_with_clear_is_undone() {
        let store = bound_store(1);
        let run = RunId::new(1);

        let kept = store.guarded_write(
            run,
            || {
                store.cpu_percent.store(80.0);
                store.memory_mb.store(1500.0);
                // Teardown lands between the run check and the stores.
                store.clear();
                store.cpu_percent.store(80.0);
                store.memory_mb.store(1500.0);
            },
            || {
                store.cpu_percent.store(0.0);
                store.memory_mb.store(0.0);
            },
        );

        assert!(!kept);
        assert_eq!(store.snapshot(), TelemetrySnapshot::default());
    }
}

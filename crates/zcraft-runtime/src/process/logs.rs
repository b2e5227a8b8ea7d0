//! Console history for the supervised server.
//!
//! A bounded ring buffer of recent console lines, so a control surface that
//! attaches late can show what already happened.

use std::collections::VecDeque;
use std::sync::{PoisonError, RwLock};

use zcraft_core::{OutputLine, OutputSinkPort};

/// Maximum number of console lines kept.
pub const MAX_CONSOLE_LINES: usize = 5000;

/// Ring buffer of console lines.
#[derive(Debug)]
pub struct ConsoleLog {
    lines: RwLock<VecDeque<OutputLine>>,
    capacity: usize,
}

impl ConsoleLog {
    /// Create an empty log holding up to [`MAX_CONSOLE_LINES`] lines.
    pub fn new() -> Self {
        Self::with_capacity(MAX_CONSOLE_LINES)
    }

    /// Create an empty log with a custom capacity (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: RwLock::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
        }
    }

    /// Add a line, removing the oldest if at capacity.
    pub fn push(&self, line: OutputLine) {
        let mut lines = self.lines.write().unwrap_or_else(PoisonError::into_inner);
        if lines.len() >= self.capacity {
            lines.pop_front();
        }
        lines.push_back(line);
    }

    /// All retained lines, oldest first.
    pub fn lines(&self) -> Vec<OutputLine> {
        self.lines
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// The newest `count` lines, oldest first.
    pub fn tail(&self, count: usize) -> Vec<OutputLine> {
        let lines = self.lines.read().unwrap_or_else(PoisonError::into_inner);
        let skip = lines.len().saturating_sub(count);
        lines.iter().skip(skip).cloned().collect()
    }

    /// Number of retained lines.
    pub fn len(&self) -> usize {
        self.lines.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every line. Called when a new run starts.
    pub fn clear(&self) {
        self.lines
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Default for ConsoleLog {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputSinkPort for ConsoleLog {
    fn append(&self, line: &OutputLine) {
        self.push(line.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_buffer_drops_oldest() {
        let log = ConsoleLog::with_capacity(3);
        for i in 0..5 {
            log.push(OutputLine::server(format!("line {i}")));
        }

        let texts: Vec<_> = log.lines().into_iter().map(|l| l.text).collect();
        assert_eq!(texts, ["line 2", "line 3", "line 4"]);
    }

    #[test]
    fn test_tail_and_clear() {
        let log = ConsoleLog::new();
        log.append(&OutputLine::manager("Starting server..."));
        log.append(&OutputLine::server("Done (3.2s)!"));
        log.append(&OutputLine::operator("list"));

        let tail = log.tail(2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[1].text, "> list");
        assert_eq!(log.tail(10).len(), 3);

        log.clear();
        assert!(log.is_empty());
    }
}

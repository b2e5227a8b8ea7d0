//! Acknowledgement port for licence prerequisites.
//!
//! The game server refuses to run until its EULA has been accepted. The
//! supervisor only needs a yes/no answer; where the flag lives is up to the
//! adapter.

/// Port answering whether the required licence has been acknowledged.
pub trait AcknowledgementPort: Send + Sync {
    /// `true` once the licence has been accepted.
    fn is_acknowledged(&self) -> bool;
}

/// Fixed answer, for tests and embedders that track the flag themselves.
#[derive(Debug, Clone, Copy)]
pub struct StaticAcknowledgement(pub bool);

impl AcknowledgementPort for StaticAcknowledgement {
    fn is_acknowledged(&self) -> bool {
        self.0
    }
}

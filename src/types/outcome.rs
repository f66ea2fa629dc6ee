//! Session outcomes, loop policy and playback observations

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::StreamRole;

/// How a single playback session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Every playable frame was sent
    Completed { frames_sent: usize },

    /// A send failed because the peer went away
    Disconnected { role: StreamRole, frames_sent: usize },

    /// The cancellation token fired
    StoppedByUser { frames_sent: usize },
}

impl SessionOutcome {
    /// Ticks fully delivered on both roles before the session ended
    pub fn frames_sent(&self) -> usize {
        match *self {
            SessionOutcome::Completed { frames_sent }
            | SessionOutcome::Disconnected { frames_sent, .. }
            | SessionOutcome::StoppedByUser { frames_sent } => frames_sent,
        }
    }

    /// Whether a looping run may start another session after this one
    pub fn allows_restart(&self) -> bool {
        !matches!(self, SessionOutcome::StoppedByUser { .. })
    }
}

/// What happens after a session completes or loses its peer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoopPolicy {
    /// Stop after the first session
    #[default]
    Once,

    /// Settle, reconnect and replay from frame 0 until cancelled
    Forever,
}

impl LoopPolicy {
    pub fn from_flag(loop_forever: bool) -> Self {
        if loop_forever { LoopPolicy::Forever } else { LoopPolicy::Once }
    }
}

/// Result of [`Scheduler::run`](crate::Scheduler::run).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Sessions that reached the streaming stage
    pub sessions: u32,

    /// Frames sent across all sessions
    pub frames_sent: usize,

    /// Outcome of the final session
    pub last: SessionOutcome,
}

/// Observation published by the scheduler while it runs.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    /// One role's link came up at the start of a session
    Connected { role: StreamRole, addr: String },

    /// Both links are up and ticking is about to start
    SessionStarted { session: u32, playable: usize, duration: Duration },

    /// Emitted every `progress_every` frames (1-indexed)
    Progress { sent: usize, playable: usize, elapsed: Duration, total: Duration },

    /// The last playable frame was sent
    Completed { sent: usize },

    /// A send failed and the session was torn down
    Disconnected { role: StreamRole, sent: usize },

    /// Cancellation was observed and the session was torn down
    Stopped { sent: usize },

    /// A looping run is waiting `settle` before reconnecting
    Restarting { settle: Duration },
}

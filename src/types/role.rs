//! Stream roles and their listener ports

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which of the two replayed streams a frame or connection belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamRole {
    /// Tracked source estimates (SST), served on port 9000 by default
    Tracking,

    /// Potential source energies (SSL), served on port 9001 by default
    Potential,
}

impl StreamRole {
    /// Order in which connections are opened and closed.
    pub const CONNECT_ORDER: [StreamRole; 2] = [StreamRole::Tracking, StreamRole::Potential];

    /// Short label used in log lines
    pub fn label(self) -> &'static str {
        match self {
            StreamRole::Tracking => "tracking",
            StreamRole::Potential => "potential",
        }
    }
}

impl fmt::Display for StreamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Listener ports on the viz server, one per role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RolePorts {
    pub tracking: u16,
    pub potential: u16,
}

impl RolePorts {
    pub const DEFAULT_TRACKING: u16 = 9000;
    pub const DEFAULT_POTENTIAL: u16 = 9001;

    pub fn new(tracking: u16, potential: u16) -> Self {
        Self { tracking, potential }
    }

    /// Port that carries frames for `role`
    pub fn port(&self, role: StreamRole) -> u16 {
        match role {
            StreamRole::Tracking => self.tracking,
            StreamRole::Potential => self.potential,
        }
    }
}

impl Default for RolePorts {
    fn default() -> Self {
        Self { tracking: Self::DEFAULT_TRACKING, potential: Self::DEFAULT_POTENTIAL }
    }
}

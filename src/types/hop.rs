//! Frame cadence derived from the recording's hop size and sample rate

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{ReplayError, Result};

/// Fixed interval between successive frames.
///
/// ODAS emits one analysis frame per hop, so the real-time cadence is
/// `hop_size / sample_rate` seconds. The interval is kept in whole
/// nanoseconds so that `frames × interval` is exact for the reference
/// configuration (128 samples at 16 kHz = 8 ms).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HopTiming {
    hop_size: u32,
    sample_rate: u32,
    interval: Duration,
}

impl HopTiming {
    pub const DEFAULT_HOP_SIZE: u32 = 128;
    pub const DEFAULT_SAMPLE_RATE: u32 = 16_000;

    /// Create a hop timing, rejecting zero hop size or sample rate.
    pub fn new(hop_size: u32, sample_rate: u32) -> Result<Self> {
        if hop_size == 0 {
            return Err(ReplayError::invalid_config("hop size must be positive"));
        }
        if sample_rate == 0 {
            return Err(ReplayError::invalid_config("sample rate must be positive"));
        }

        let nanos = u128::from(hop_size) * 1_000_000_000 / u128::from(sample_rate);
        let interval = Duration::from_nanos(nanos as u64);

        Ok(Self { hop_size, sample_rate, interval })
    }

    pub fn hop_size(&self) -> u32 {
        self.hop_size
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Wall-clock interval between frames
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Frames per second of recorded audio
    pub fn frame_rate(&self) -> f64 {
        f64::from(self.sample_rate) / f64::from(self.hop_size)
    }

    /// Recorded time covered by `frames` hops
    pub fn duration_for(&self, frames: usize) -> Duration {
        let nanos = self.interval.as_nanos().saturating_mul(frames as u128);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }
}

impl Default for HopTiming {
    fn default() -> Self {
        let interval = Duration::from_millis(8);
        Self {
            hop_size: Self::DEFAULT_HOP_SIZE,
            sample_rate: Self::DEFAULT_SAMPLE_RATE,
            interval,
        }
    }
}

/// How the scheduler waits between ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PacingMode {
    /// Tick `i` is due at `session_start + i × hop`; send latency does not accumulate
    #[default]
    Deadline,

    /// Sleep one hop after every tick; send latency accumulates as drift
    Fixed,
}

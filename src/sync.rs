//! Dual-stream synchronization
//!
//! Pairs the potential and tracking sequences by frame index. Index `i` in
//! one stream is the same hop as index `i` in the other, so only the common
//! prefix is playable; surplus frames on the longer stream are never sent.

use std::time::Duration;
use tracing::{info, warn};

use crate::types::{Frame, FrameSequence, HopTiming, StreamRole};
use crate::{ReplayError, Result};

/// Two role sequences aligned for playback at a fixed cadence.
#[derive(Debug, Clone)]
pub struct PlaybackPlan {
    potential: FrameSequence,
    tracking: FrameSequence,
    hop: HopTiming,
    playable: usize,
}

impl PlaybackPlan {
    /// Align two sequences.
    ///
    /// Fails if a sequence is passed in the wrong role or if either sequence
    /// is empty, since nothing could be played.
    pub fn new(potential: FrameSequence, tracking: FrameSequence, hop: HopTiming) -> Result<Self> {
        for (seq, expected) in [(&potential, StreamRole::Potential), (&tracking, StreamRole::Tracking)] {
            if seq.role() != expected {
                return Err(ReplayError::invalid_config(format!(
                    "{} sequence from {} supplied as {}",
                    seq.role(),
                    seq.source().display(),
                    expected
                )));
            }
            if seq.is_empty() {
                return Err(ReplayError::EmptySequence {
                    role: expected,
                    path: seq.source().to_path_buf(),
                });
            }
        }

        let playable = potential.len().min(tracking.len());
        let plan = Self { potential, tracking, hop, playable };

        info!(
            "Loaded {} potential frames, {} tracking frames",
            plan.potential.len(),
            plan.tracking.len()
        );
        for role in [StreamRole::Potential, StreamRole::Tracking] {
            let surplus = plan.surplus(role);
            if surplus > 0 {
                warn!("{} stream has {} frames past the common length; they will not be sent", role, surplus);
            }
        }
        info!("Will replay {} frames ({:.1}s of audio)", plan.playable, plan.duration().as_secs_f64());

        Ok(plan)
    }

    /// Frames replayable on both roles: `min(len(potential), len(tracking))`
    pub fn playable(&self) -> usize {
        self.playable
    }

    /// `playable × hop interval`
    pub fn duration(&self) -> Duration {
        self.hop.duration_for(self.playable)
    }

    /// Recorded time covered by the first `frames` ticks
    pub fn elapsed_at(&self, frames: usize) -> Duration {
        self.hop.duration_for(frames)
    }

    pub fn hop(&self) -> HopTiming {
        self.hop
    }

    pub fn sequence(&self, role: StreamRole) -> &FrameSequence {
        match role {
            StreamRole::Potential => &self.potential,
            StreamRole::Tracking => &self.tracking,
        }
    }

    /// Raw length of one role's sequence
    pub fn raw_len(&self, role: StreamRole) -> usize {
        self.sequence(role).len()
    }

    /// Frames of `role` that will never be sent
    pub fn surplus(&self, role: StreamRole) -> usize {
        self.raw_len(role) - self.playable
    }

    /// Frame for `role` at tick `index`, if that sequence reaches it
    pub fn frame(&self, role: StreamRole, index: usize) -> Option<&Frame> {
        self.sequence(role).get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::sequence_of;
    use proptest::prelude::*;

    #[test]
    fn equal_lengths_play_everything() {
        let plan = PlaybackPlan::new(
            sequence_of(StreamRole::Potential, 250),
            sequence_of(StreamRole::Tracking, 250),
            HopTiming::default(),
        )
        .unwrap();

        assert_eq!(plan.playable(), 250);
        assert_eq!(plan.duration(), Duration::from_secs(2));
        assert_eq!(plan.elapsed_at(100), Duration::from_millis(800));
    }

    #[test]
    fn longer_stream_surplus_is_unplayed() {
        let plan = PlaybackPlan::new(
            sequence_of(StreamRole::Potential, 300),
            sequence_of(StreamRole::Tracking, 280),
            HopTiming::default(),
        )
        .unwrap();

        assert_eq!(plan.playable(), 280);
        assert_eq!(plan.raw_len(StreamRole::Potential), 300);
        assert_eq!(plan.surplus(StreamRole::Potential), 20);
        assert_eq!(plan.surplus(StreamRole::Tracking), 0);
    }

    #[test]
    fn empty_sequence_is_rejected() {
        let err = PlaybackPlan::new(
            sequence_of(StreamRole::Potential, 3),
            sequence_of(StreamRole::Tracking, 0),
            HopTiming::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ReplayError::EmptySequence { role: StreamRole::Tracking, .. }));
    }

    #[test]
    fn swapped_roles_are_rejected() {
        let err = PlaybackPlan::new(
            sequence_of(StreamRole::Tracking, 3),
            sequence_of(StreamRole::Potential, 3),
            HopTiming::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ReplayError::Config { .. }));
    }

    proptest! {
      #[test]
      fn playable_is_the_shorter_length(
        m in 1usize..400,
        n in 1usize..400,
        hop_size in 1u32..1024,
        sample_rate in prop::sample::select(vec![8_000u32, 16_000, 44_100, 48_000])
      ) {
        let hop = HopTiming::new(hop_size, sample_rate).unwrap();
        let plan = PlaybackPlan::new(
          sequence_of(StreamRole::Potential, m),
          sequence_of(StreamRole::Tracking, n),
          hop,
        ).unwrap();

        prop_assert_eq!(plan.playable(), m.min(n));
        let expected = plan.playable() as f64 * hop.interval().as_secs_f64();
        prop_assert!((plan.duration().as_secs_f64() - expected).abs() < 1e-6);
      }
    }
}

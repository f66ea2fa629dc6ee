//! Core types shared by the tokenizer, synchronizer, transports and scheduler.
//!
//! - [`Frame`] is one opaque, newline-terminated analysis record
//! - [`FrameSequence`] holds one role's frames in recording order
//! - [`StreamRole`] and [`RolePorts`] tie each stream to its listener port
//! - [`HopTiming`] and [`PacingMode`] describe the real-time cadence
//! - [`SessionOutcome`], [`LoopPolicy`], [`RunSummary`] and [`PlaybackEvent`]
//!   describe how playback went
//!
//! ```rust
//! use odas_replay::types::{Frame, FrameSequence, HopTiming, StreamRole};
//!
//! let frames = vec![Frame::new("{\"timeStamp\": 0}"), Frame::new("{\"timeStamp\": 1}")];
//! let seq = FrameSequence::new(StreamRole::Tracking, "<memory>", frames);
//!
//! let hop = HopTiming::new(128, 16_000).unwrap();
//! assert_eq!(hop.duration_for(seq.len()).as_millis(), 16);
//! ```

mod frame;
mod hop;
mod outcome;
mod role;

pub use frame::{Frame, FrameSequence};
pub use hop::{HopTiming, PacingMode};
pub use outcome::{LoopPolicy, PlaybackEvent, RunSummary, SessionOutcome};
pub use role::{RolePorts, StreamRole};

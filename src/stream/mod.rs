//! Stream combinators for real-time playback

mod pace;

pub use pace::{Pace, PaceExt};

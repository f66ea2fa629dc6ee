//! Real-time replay of recorded ODAS output to the viz server.
//!
//! `odaslive` can write its sound source localization (SSL, "potential"
//! sources) and tracking (SST) results to JSON files instead of sockets. This
//! crate plays those two recordings back over TCP at the original hop cadence,
//! as if ODAS were running live.
//!
//! # Pipeline
//!
//! - [`tokenizer`] splits each file's back-to-back JSON objects into [`Frame`]s
//! - [`PlaybackPlan`] aligns both streams by index and fixes the cadence
//! - [`TcpTransport`] owns one connection per [`StreamRole`]
//! - [`Scheduler`] sends one frame per role per hop and handles loop/stop
//!
//! # Example
//!
//! ```rust,no_run
//! use odas_replay::{Replay, ReplayConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> odas_replay::Result<()> {
//!     let config = ReplayConfig { host: Some("localhost".into()), ..Default::default() };
//!     let summary = Replay::run(&config, &CancellationToken::new()).await?;
//!     println!("sent {} frames", summary.frames_sent);
//!     Ok(())
//! }
//! ```

mod error;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Replay pipeline
pub mod config;
pub mod scheduler;
pub mod stream;
pub mod sync;
pub mod tokenizer;
pub mod transport;
pub mod transports;

// Core exports
pub use error::*;
pub use types::*;

// Main API exports
pub use config::ReplayConfig;
pub use scheduler::{PlaybackOptions, Scheduler};
pub use sync::PlaybackPlan;
pub use tokenizer::TokenizerMode;
pub use transport::{OpenedLink, Transport};
pub use transports::TcpTransport;

use tokio_util::sync::CancellationToken;
use tracing::info;

/// Unified entry point for replaying a pair of ODAS recordings.
pub struct Replay;

impl Replay {
    /// Load both recordings and align them.
    ///
    /// Runs before any connection is attempted, so unreadable or empty files
    /// fail fast.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The hop size or sample rate is zero
    /// - Either file cannot be read
    /// - Either file contains no frames
    pub async fn load(config: &ReplayConfig) -> Result<PlaybackPlan> {
        let hop = config.hop_timing()?;
        let (potential, tracking) = tokio::try_join!(
            tokenizer::load_sequence(StreamRole::Potential, &config.potential_path, config.tokenizer),
            tokenizer::load_sequence(StreamRole::Tracking, &config.tracking_path, config.tokenizer),
        )?;
        PlaybackPlan::new(potential, tracking, hop)
    }

    /// Load, connect and play until done, disconnected or cancelled.
    ///
    /// # Errors
    ///
    /// Everything [`Replay::load`] can return, plus
    /// [`ReplayError::ConnectionRefused`] when either server port refuses the
    /// connection at the start of a session.
    pub async fn run(config: &ReplayConfig, cancel: &CancellationToken) -> Result<RunSummary> {
        config.validate()?;
        let plan = Self::load(config).await?;

        let host = config::resolve_host(config.host.as_deref()).await;
        info!("Connecting to viz server at {}...", host);

        let transport = TcpTransport::new(host, config.ports);
        let mut scheduler = Scheduler::new(transport, plan, config.playback_options());
        scheduler.run(cancel).await
    }
}

//! Scheduler drives real-time playback sessions

use futures::{Stream, StreamExt, stream};
use std::pin::pin;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::stream::PaceExt;
use crate::sync::PlaybackPlan;
use crate::transport::Transport;
use crate::types::{LoopPolicy, PacingMode, PlaybackEvent, RunSummary, SessionOutcome, StreamRole};
use crate::Result;

/// Within a tick the potential frame is always written before the tracking frame.
const SEND_ORDER: [StreamRole; 2] = [StreamRole::Potential, StreamRole::Tracking];

/// Buffered observations per subscriber before older ones are dropped
const EVENT_CAPACITY: usize = 256;

/// Playback behaviour that is independent of the frames being played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackOptions {
    /// Restart after completion or disconnect
    pub loop_policy: LoopPolicy,

    /// Pause between a finished session and the next connection attempt
    pub settle: Duration,

    /// Emit a progress observation every this many frames
    pub progress_every: usize,

    /// Cadence strategy
    pub pacing: PacingMode,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self {
            loop_policy: LoopPolicy::Once,
            settle: Duration::from_secs(2),
            progress_every: 100,
            pacing: PacingMode::Deadline,
        }
    }
}

/// Scheduler pushes one frame per role per tick through a [`Transport`]
///
/// A single task owns the transport: sends and sleeps are strictly
/// sequential. Cancellation interrupts the pacing wait, a pending connect
/// and a send that cannot complete; every exit path closes both links.
pub struct Scheduler<T: Transport> {
    transport: T,
    plan: PlaybackPlan,
    options: PlaybackOptions,
    events: broadcast::Sender<PlaybackEvent>,
    sessions: u32,
}

impl<T: Transport> Scheduler<T> {
    pub fn new(transport: T, plan: PlaybackPlan, options: PlaybackOptions) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let options = PlaybackOptions { progress_every: options.progress_every.max(1), ..options };
        Self { transport, plan, options, events, sessions: 0 }
    }

    /// Playback observations as a stream.
    ///
    /// Only events published after subscribing are seen. The stream ends when
    /// the scheduler is dropped.
    pub fn events(&self) -> impl Stream<Item = PlaybackEvent> + Send + use<T> {
        BroadcastStream::new(self.events.subscribe()).filter_map(|event| async move { event.ok() })
    }

    /// Sessions that reached the streaming stage so far
    pub fn sessions(&self) -> u32 {
        self.sessions
    }

    /// Run sessions until the loop policy or the user says stop.
    ///
    /// A refused connection aborts the run with an error and is never retried.
    /// A user stop never triggers a restart, even under [`LoopPolicy::Forever`].
    pub async fn run(&mut self, cancel: &CancellationToken) -> Result<RunSummary> {
        let mut frames_sent = 0;

        loop {
            let outcome = self.run_session(cancel).await?;
            frames_sent += outcome.frames_sent();

            let summary = RunSummary { sessions: self.sessions, frames_sent, last: outcome };
            if self.options.loop_policy == LoopPolicy::Once || !outcome.allows_restart() {
                return Ok(summary);
            }

            let settle = self.options.settle;
            info!("Looping... (restarting in {:.1}s)", settle.as_secs_f64());
            self.publish(PlaybackEvent::Restarting { settle });

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Stopped by user");
                    self.publish(PlaybackEvent::Stopped { sent: 0 });
                    let last = SessionOutcome::StoppedByUser { frames_sent: 0 };
                    return Ok(RunSummary { last, ..summary });
                }
                _ = tokio::time::sleep(settle) => {}
            }
        }
    }

    /// Drive one session from frame 0 to the end of the plan.
    pub async fn run_session(&mut self, cancel: &CancellationToken) -> Result<SessionOutcome> {
        if cancel.is_cancelled() {
            debug!("Cancelled before connecting");
            return Ok(SessionOutcome::StoppedByUser { frames_sent: 0 });
        }

        // A connect can hang with no timeout; cancellation must still win.
        let opened = tokio::select! {
            biased;
            opened = self.transport.open() => Some(opened),
            _ = cancel.cancelled() => None,
        };
        let Some(opened) = opened else {
            self.transport.close().await;
            info!("Stopped by user while connecting");
            self.publish(PlaybackEvent::Stopped { sent: 0 });
            return Ok(SessionOutcome::StoppedByUser { frames_sent: 0 });
        };
        for link in opened? {
            self.publish(PlaybackEvent::Connected { role: link.role, addr: link.addr });
        }
        self.sessions += 1;

        let playable = self.plan.playable();
        let duration = self.plan.duration();
        info!("Streaming {} frames at real-time speed...", playable);
        self.publish(PlaybackEvent::SessionStarted { session: self.sessions, playable, duration });

        let result = self.stream_frames(cancel).await;
        self.transport.close().await;

        match &result {
            Ok(SessionOutcome::Completed { frames_sent }) => {
                info!("Done! Sent all {} frames", frames_sent);
                self.publish(PlaybackEvent::Completed { sent: *frames_sent });
            }
            Ok(SessionOutcome::Disconnected { role, frames_sent }) => {
                warn!("Viz server disconnected ({} link) after {} frames", role, frames_sent);
                self.publish(PlaybackEvent::Disconnected { role: *role, sent: *frames_sent });
            }
            Ok(SessionOutcome::StoppedByUser { frames_sent }) => {
                info!("Stopped by user after {} frames", frames_sent);
                self.publish(PlaybackEvent::Stopped { sent: *frames_sent });
            }
            Err(e) => warn!("Session aborted: {}", e),
        }

        result
    }

    /// Tick loop. The caller closes the transport however this returns.
    async fn stream_frames(&mut self, cancel: &CancellationToken) -> Result<SessionOutcome> {
        let playable = self.plan.playable();
        let total = self.plan.duration();
        let progress_every = self.options.progress_every;

        let mut ticks =
            pin!(stream::iter(0..playable).pace(self.plan.hop().interval(), self.options.pacing));
        let mut sent = 0;

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Ok(SessionOutcome::StoppedByUser { frames_sent: sent });
                }
                next = ticks.next() => next,
            };
            let Some(index) = next else {
                break;
            };

            for role in SEND_ORDER {
                // Unreachable while playable is the shorter length; kept as a bound check.
                let Some(frame) = self.plan.frame(role, index) else {
                    continue;
                };
                // A send blocked on a peer that stopped reading yields to cancellation.
                let result = tokio::select! {
                    biased;
                    result = self.transport.send(role, frame) => result,
                    _ = cancel.cancelled() => {
                        debug!("Cancelled during send of frame {} on {} link", index, role);
                        return Ok(SessionOutcome::StoppedByUser { frames_sent: sent });
                    }
                };
                match result {
                    Ok(()) => {}
                    Err(e) if e.is_retryable() => {
                        debug!("Send of frame {} on {} link failed: {}", index, role, e);
                        return Ok(SessionOutcome::Disconnected { role, frames_sent: sent });
                    }
                    Err(e) => return Err(e),
                }
            }
            sent = index + 1;

            if sent % progress_every == 0 {
                let elapsed = self.plan.elapsed_at(sent);
                info!(
                    "  Sent {}/{} frames ({:.1}s / {:.1}s)",
                    sent,
                    playable,
                    elapsed.as_secs_f64(),
                    total.as_secs_f64()
                );
                self.publish(PlaybackEvent::Progress { sent, playable, elapsed, total });
            }
        }

        Ok(SessionOutcome::Completed { frames_sent: sent })
    }

    fn publish(&self, event: PlaybackEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

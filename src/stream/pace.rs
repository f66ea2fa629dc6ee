//! Real-time pacing for tick streams

use futures::{Stream, ready};
use pin_project_lite::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::time::{Instant, Sleep, sleep};

use crate::types::PacingMode;

/// Extension trait to pace any Stream to a fixed cadence
pub trait PaceExt: Stream {
    /// Release one item per `interval`.
    ///
    /// The first item is released immediately. Every item owns one interval
    /// slot, including the last: the stream ends one interval after its final
    /// item, so `n` items span `n × interval` of wall clock.
    ///
    /// Must be called inside a Tokio runtime.
    fn pace(self, interval: Duration, mode: PacingMode) -> Pace<Self>
    where
        Self: Sized,
    {
        Pace::new(self, interval, mode)
    }
}

impl<T: Stream> PaceExt for T {}

pin_project! {
    /// A stream combinator that releases items at a fixed cadence
    pub struct Pace<S> {
        #[pin]
        stream: S,
        #[pin]
        sleep: Sleep,
        interval: Duration,
        mode: PacingMode,
        origin: Option<Instant>,
        released: u64,
        slot_open: bool,
        armed: bool,
        done: bool,
    }
}

impl<S: Stream> Pace<S> {
    /// Create a new paced stream
    pub fn new(stream: S, interval: Duration, mode: PacingMode) -> Self {
        Self {
            stream,
            sleep: sleep(Duration::ZERO),
            interval,
            mode,
            origin: None,
            released: 0,
            slot_open: true,
            armed: false,
            done: false,
        }
    }

    /// Items released so far
    pub fn released(&self) -> u64 {
        self.released
    }
}

/// When the slot after the `released`-th item ends.
///
/// Deadline mode counts from `origin`. An offset that no longer fits in a
/// `Duration` multiplication or an `Instant` falls back to one interval
/// from `now`.
fn slot_deadline(
    mode: PacingMode,
    origin: Option<Instant>,
    interval: Duration,
    released: u64,
    now: Instant,
) -> Instant {
    let scheduled = match (mode, origin) {
        (PacingMode::Deadline, Some(origin)) => u32::try_from(released)
            .ok()
            .and_then(|n| interval.checked_mul(n))
            .and_then(|offset| origin.checked_add(offset)),
        _ => None,
    };
    scheduled.unwrap_or_else(|| now + interval)
}

impl<S: Stream> Stream for Pace<S> {
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        if *this.done {
            return Poll::Ready(None);
        }

        // Wait out the slot of the previously released item
        if !*this.slot_open {
            if !*this.armed {
                let deadline = slot_deadline(
                    *this.mode,
                    *this.origin,
                    *this.interval,
                    *this.released,
                    Instant::now(),
                );
                this.sleep.as_mut().reset(deadline);
                *this.armed = true;
            }
            ready!(this.sleep.as_mut().poll(cx));
            *this.armed = false;
            *this.slot_open = true;
        }

        match ready!(this.stream.as_mut().poll_next(cx)) {
            Some(item) => {
                if this.origin.is_none() {
                    *this.origin = Some(Instant::now());
                }
                *this.released += 1;
                *this.slot_open = false;
                Poll::Ready(Some(item))
            }
            None => {
                *this.done = true;
                Poll::Ready(None)
            }
        }
    }
}

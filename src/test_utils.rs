//! Test utilities: ODAS-like fixtures and an in-memory transport
//!
//! Used by unit tests across the crate and by the tokenizer benchmark.

#![cfg(any(test, feature = "benchmark"))]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

use crate::sync::PlaybackPlan;
use crate::tokenizer::{TokenizerMode, sequence_from_text};
use crate::transport::{OpenedLink, Transport};
use crate::types::{Frame, FrameSequence, HopTiming, StreamRole};
use crate::{ReplayError, Result};

/// One SST-style object as `odaslive` writes it: multi-line, 4-space indent.
///
/// The timestamp is embedded so frames from different hops differ.
pub fn odas_object(time_stamp: usize, sources: usize) -> String {
    let src: Vec<String> = (0..sources)
        .map(|id| {
            format!(
                "        {{ \"id\": {}, \"tag\": \"dynamic\", \"x\": {:.3}, \"y\": {:.3}, \"z\": {:.3}, \"activity\": {:.3} }}",
                id,
                (time_stamp as f64 * 0.01 + id as f64).sin(),
                (time_stamp as f64 * 0.01 + id as f64).cos(),
                0.5,
                0.25 * id as f64
            )
        })
        .collect();
    format!(
        "{{\n    \"timeStamp\": {},\n    \"src\": [\n{}\n    ]\n}}",
        time_stamp,
        src.join(",\n")
    )
}

/// `count` objects back to back, each followed by a newline.
pub fn odas_stream(count: usize, sources: usize) -> String {
    (0..count).map(|ts| format!("{}\n", odas_object(ts, sources))).collect()
}

/// Write `contents` to `dir/name` and return the path.
pub fn write_fixture(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write fixture");
    path
}

/// A sequence of `count` single-source frames for `role`.
pub fn sequence_of(role: StreamRole, count: usize) -> FrameSequence {
    sequence_from_text(role, "<memory>", &odas_stream(count, 1), TokenizerMode::Scanner)
}

/// A plan at the reference 8 ms cadence.
pub fn plan_of(potential: usize, tracking: usize) -> PlaybackPlan {
    PlaybackPlan::new(
        sequence_of(StreamRole::Potential, potential),
        sequence_of(StreamRole::Tracking, tracking),
        HopTiming::default(),
    )
    .expect("non-empty plan")
}

/// A loopback port with nothing listening on it.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    listener.local_addr().expect("local addr").port()
}

/// Read everything the peer sends until it closes.
pub async fn read_to_eof(mut stream: TcpStream) -> String {
    let mut received = String::new();
    stream.read_to_string(&mut received).await.expect("read");
    received
}

/// What a [`RecordingTransport`] observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Open,
    Send { role: StreamRole, time_stamp: usize },
    Close,
}

/// Shared view of a [`RecordingTransport`]'s history.
#[derive(Debug, Clone, Default)]
pub struct TransportLog {
    events: Arc<Mutex<Vec<TransportEvent>>>,
}

impl TransportLog {
    fn push(&self, event: TransportEvent) {
        self.events.lock().expect("log lock").push(event);
    }

    pub fn events(&self) -> Vec<TransportEvent> {
        self.events.lock().expect("log lock").clone()
    }

    /// Successful sends as (role, frame index) in order
    pub fn sent(&self) -> Vec<(StreamRole, usize)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                TransportEvent::Send { role, time_stamp } => Some((role, time_stamp)),
                _ => None,
            })
            .collect()
    }

    pub fn sends(&self) -> usize {
        self.sent().len()
    }

    pub fn opens(&self) -> usize {
        self.events().iter().filter(|e| **e == TransportEvent::Open).count()
    }

    pub fn closes(&self) -> usize {
        self.events().iter().filter(|e| **e == TransportEvent::Close).count()
    }

    /// Whether the last lifecycle event was an open
    pub fn is_open(&self) -> bool {
        self.events()
            .iter()
            .rev()
            .find(|e| !matches!(e, TransportEvent::Send { .. }))
            .is_some_and(|e| *e == TransportEvent::Open)
    }
}

/// In-memory [`Transport`] that records every call.
///
/// Frames built by [`odas_object`] carry their index as `timeStamp`, which is
/// what the log records for each send.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    log: TransportLog,
    refuse: Option<StreamRole>,
    fail_at: Option<usize>,
    stall_at: Option<usize>,
    stall_open: bool,
    cancel_after: Option<(usize, CancellationToken)>,
    attempts: usize,
    open: bool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse every `open` on behalf of `role`
    pub fn refusing(mut self, role: StreamRole) -> Self {
        self.refuse = Some(role);
        self
    }

    /// Fail the send attempt with this 0-based index as a disconnect
    pub fn failing_at(mut self, attempt: usize) -> Self {
        self.fail_at = Some(attempt);
        self
    }

    /// Never complete the send attempt with this 0-based index, like a peer
    /// that stopped reading
    pub fn stalling_at(mut self, attempt: usize) -> Self {
        self.stall_at = Some(attempt);
        self
    }

    /// Never complete `open`, like a connect to a host that drops SYNs
    pub fn stalling_open(mut self) -> Self {
        self.stall_open = true;
        self
    }

    /// Cancel `token` once this many sends have succeeded
    pub fn cancelling_after(mut self, sends: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((sends, token));
        self
    }

    pub fn log(&self) -> TransportLog {
        self.log.clone()
    }
}

fn time_stamp_of(frame: &Frame) -> usize {
    frame
        .body()
        .split("\"timeStamp\": ")
        .nth(1)
        .and_then(|rest| rest.split(',').next())
        .and_then(|n| n.trim().parse().ok())
        .unwrap_or(usize::MAX)
}

#[async_trait::async_trait]
impl Transport for RecordingTransport {
    async fn open(&mut self) -> Result<Vec<OpenedLink>> {
        if self.stall_open {
            std::future::pending::<()>().await;
        }
        if let Some(role) = self.refuse {
            return Err(ReplayError::connection_refused(
                role,
                "memory",
                std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
            ));
        }
        self.open = true;
        self.log.push(TransportEvent::Open);
        Ok(StreamRole::CONNECT_ORDER
            .into_iter()
            .map(|role| OpenedLink { role, addr: format!("memory:{role}") })
            .collect())
    }

    async fn send(&mut self, role: StreamRole, frame: &Frame) -> Result<()> {
        if !self.open {
            return Err(ReplayError::NotConnected { role });
        }

        let attempt = self.attempts;
        self.attempts += 1;
        if self.fail_at == Some(attempt) {
            return Err(ReplayError::disconnected(
                role,
                std::io::Error::from(std::io::ErrorKind::BrokenPipe),
            ));
        }
        if self.stall_at == Some(attempt) {
            std::future::pending::<()>().await;
        }

        self.log.push(TransportEvent::Send { role, time_stamp: time_stamp_of(frame) });
        if let Some((after, token)) = &self.cancel_after {
            if self.log.sends() == *after {
                token.cancel();
            }
        }
        Ok(())
    }

    async fn close(&mut self) {
        if self.open {
            self.open = false;
            self.log.push(TransportEvent::Close);
        }
    }
}

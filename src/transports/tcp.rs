//! TCP transport to the viz server
//!
//! Each role gets its own [`Link`], a single TCP connection with an explicit
//! state machine:
//!
//! ```text
//! Disconnected -> Connecting -> Connected -> Closed
//!                      |
//!                      +-> Disconnected (refused, surfaced to caller)
//! ```
//!
//! Links never reconnect themselves. [`TcpTransport::open`] discards the old
//! links and builds new ones.

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, info, trace, warn};

use crate::transport::{OpenedLink, Transport};
use crate::types::{Frame, RolePorts, StreamRole};
use crate::{ReplayError, Result};

/// Lifecycle of a single role connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,
    Closed,
}

/// One role's outbound connection.
#[derive(Debug)]
pub struct Link {
    role: StreamRole,
    addr: String,
    state: LinkState,
    stream: Option<TcpStream>,
}

impl Link {
    fn new(role: StreamRole, addr: String) -> Self {
        Self { role, addr, state: LinkState::Disconnected, stream: None }
    }

    /// Connect once, with no retry and no timeout.
    pub async fn connect(role: StreamRole, addr: String) -> Result<Self> {
        let mut link = Self::new(role, addr);
        link.state = LinkState::Connecting;
        debug!("Connecting {} link to {}", role, link.addr);

        match TcpStream::connect(link.addr.as_str()).await {
            Ok(stream) => {
                // Frames are small and paced; don't let Nagle batch them.
                if let Err(e) = stream.set_nodelay(true) {
                    warn!("Failed to set TCP_NODELAY on {} link: {}", role, e);
                }
                link.stream = Some(stream);
                link.state = LinkState::Connected;
                Ok(link)
            }
            Err(e) => {
                link.state = LinkState::Disconnected;
                Err(ReplayError::connection_refused(role, link.addr, e))
            }
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Write the whole frame. A failed write closes the link.
    pub async fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        let stream = match (self.state, self.stream.as_mut()) {
            (LinkState::Connected, Some(stream)) => stream,
            _ => return Err(ReplayError::NotConnected { role: self.role }),
        };

        match stream.write_all(frame.as_bytes()).await {
            Ok(()) => {
                trace!("Sent {} bytes on {} link", frame.wire_len(), self.role);
                Ok(())
            }
            Err(e) => {
                self.stream = None;
                self.state = LinkState::Closed;
                Err(ReplayError::disconnected(self.role, e))
            }
        }
    }

    /// Shut the connection down. Idempotent.
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                debug!("Shutdown of {} link reported: {}", self.role, e);
            }
            debug!("Closed {} link to {}", self.role, self.addr);
        }
        if self.state != LinkState::Disconnected {
            self.state = LinkState::Closed;
        }
    }
}

/// Connection manager for the tracking and potential links.
#[derive(Debug)]
pub struct TcpTransport {
    host: String,
    ports: RolePorts,
    tracking: Option<Link>,
    potential: Option<Link>,
}

impl TcpTransport {
    pub fn new(host: impl Into<String>, ports: RolePorts) -> Self {
        Self { host: host.into(), ports, tracking: None, potential: None }
    }

    /// `host:port` for `role`, bracketing bare IPv6 hosts
    pub fn addr(&self, role: StreamRole) -> String {
        let port = self.ports.port(role);
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, port)
        } else {
            format!("{}:{}", self.host, port)
        }
    }

    /// Current state of the link for `role`
    pub fn link_state(&self, role: StreamRole) -> LinkState {
        self.link(role).map_or(LinkState::Disconnected, Link::state)
    }

    fn link(&self, role: StreamRole) -> Option<&Link> {
        match role {
            StreamRole::Tracking => self.tracking.as_ref(),
            StreamRole::Potential => self.potential.as_ref(),
        }
    }

    fn slot_mut(&mut self, role: StreamRole) -> &mut Option<Link> {
        match role {
            StreamRole::Tracking => &mut self.tracking,
            StreamRole::Potential => &mut self.potential,
        }
    }
}

#[async_trait::async_trait]
impl Transport for TcpTransport {
    async fn open(&mut self) -> Result<Vec<OpenedLink>> {
        // Previous links are discarded, never revived.
        self.close().await;
        self.tracking = None;
        self.potential = None;

        let mut opened = Vec::with_capacity(StreamRole::CONNECT_ORDER.len());
        for role in StreamRole::CONNECT_ORDER {
            let addr = self.addr(role);
            match Link::connect(role, addr.clone()).await {
                Ok(link) => {
                    info!("Connected to {} server ({})", role, addr);
                    opened.push(OpenedLink { role, addr: link.addr().to_string() });
                    *self.slot_mut(role) = Some(link);
                }
                Err(e) => {
                    warn!("Could not connect to {} server ({})", role, addr);
                    self.close().await;
                    return Err(e);
                }
            }
        }

        Ok(opened)
    }

    async fn send(&mut self, role: StreamRole, frame: &Frame) -> Result<()> {
        match self.slot_mut(role) {
            Some(link) => link.write_frame(frame).await,
            None => Err(ReplayError::NotConnected { role }),
        }
    }

    async fn close(&mut self) {
        for role in StreamRole::CONNECT_ORDER {
            if let Some(link) = self.slot_mut(role).as_mut() {
                link.close().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{closed_port, read_to_eof};
    use std::time::Duration;
    use tokio::net::TcpListener;

    async fn listener() -> (TcpListener, u16) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, port)
    }

    #[test]
    fn ipv6_hosts_are_bracketed() {
        let transport = TcpTransport::new("::1", RolePorts::default());
        assert_eq!(transport.addr(StreamRole::Tracking), "[::1]:9000");
        let transport = TcpTransport::new("localhost", RolePorts::default());
        assert_eq!(transport.addr(StreamRole::Potential), "localhost:9001");
    }

    #[tokio::test]
    async fn frames_arrive_on_their_role_port() {
        let (track_listener, track_port) = listener().await;
        let (pot_listener, pot_port) = listener().await;

        let mut transport = TcpTransport::new("127.0.0.1", RolePorts::new(track_port, pot_port));
        let opened = transport.open().await.unwrap();
        assert_eq!(
            opened,
            vec![
                OpenedLink { role: StreamRole::Tracking, addr: format!("127.0.0.1:{track_port}") },
                OpenedLink { role: StreamRole::Potential, addr: format!("127.0.0.1:{pot_port}") },
            ]
        );
        assert_eq!(transport.link_state(StreamRole::Tracking), LinkState::Connected);
        assert_eq!(transport.link_state(StreamRole::Potential), LinkState::Connected);

        let (track_peer, _) = track_listener.accept().await.unwrap();
        let (pot_peer, _) = pot_listener.accept().await.unwrap();

        transport.send(StreamRole::Potential, &Frame::new("{\"pot\":1}")).await.unwrap();
        transport.send(StreamRole::Tracking, &Frame::new("{\"track\":1}")).await.unwrap();
        transport.close().await;

        assert_eq!(read_to_eof(track_peer).await, "{\"track\":1}\n");
        assert_eq!(read_to_eof(pot_peer).await, "{\"pot\":1}\n");
        assert_eq!(transport.link_state(StreamRole::Tracking), LinkState::Closed);
    }

    #[tokio::test]
    async fn refusal_closes_the_connected_role_first() {
        let (track_listener, track_port) = listener().await;
        let pot_port = closed_port().await;

        let mut transport = TcpTransport::new("127.0.0.1", RolePorts::new(track_port, pot_port));
        let err = transport.open().await.unwrap_err();

        match err {
            ReplayError::ConnectionRefused { role, .. } => assert_eq!(role, StreamRole::Potential),
            other => panic!("Expected ConnectionRefused, got {other:?}"),
        }

        // The tracking connection was made and then shut down: the peer sees EOF.
        let (track_peer, _) = track_listener.accept().await.unwrap();
        assert_eq!(read_to_eof(track_peer).await, "");
        assert_eq!(transport.link_state(StreamRole::Tracking), LinkState::Closed);
        assert_eq!(transport.link_state(StreamRole::Potential), LinkState::Disconnected);
    }

    #[tokio::test]
    async fn send_requires_an_open_link() {
        let mut transport = TcpTransport::new("127.0.0.1", RolePorts::default());
        let err = transport.send(StreamRole::Tracking, &Frame::new("{}")).await.unwrap_err();
        assert!(matches!(err, ReplayError::NotConnected { role: StreamRole::Tracking }));
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let (_track_listener, track_port) = listener().await;
        let (_pot_listener, pot_port) = listener().await;

        let mut transport = TcpTransport::new("127.0.0.1", RolePorts::new(track_port, pot_port));
        transport.open().await.unwrap();
        transport.close().await;
        transport.close().await;

        let err = transport.send(StreamRole::Potential, &Frame::new("{}")).await.unwrap_err();
        assert!(matches!(err, ReplayError::NotConnected { .. }));
    }

    #[tokio::test]
    async fn vanished_peer_surfaces_as_disconnect() {
        let (track_listener, track_port) = listener().await;
        let (pot_listener, pot_port) = listener().await;

        let mut transport = TcpTransport::new("127.0.0.1", RolePorts::new(track_port, pot_port));
        transport.open().await.unwrap();
        let (track_peer, _) = track_listener.accept().await.unwrap();
        let (_pot_peer, _) = pot_listener.accept().await.unwrap();
        drop(track_peer);

        let frame = Frame::new("{\"src\": []}");
        let mut result = Ok(());
        for _ in 0..200 {
            result = transport.send(StreamRole::Tracking, &frame).await;
            if result.is_err() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert!(matches!(result, Err(ReplayError::Disconnected { role: StreamRole::Tracking, .. })));
        assert_eq!(transport.link_state(StreamRole::Tracking), LinkState::Closed);
    }

    #[tokio::test]
    async fn reopen_builds_fresh_links() {
        let (track_listener, track_port) = listener().await;
        let (pot_listener, pot_port) = listener().await;

        let mut transport = TcpTransport::new("127.0.0.1", RolePorts::new(track_port, pot_port));
        transport.open().await.unwrap();
        transport.close().await;
        transport.open().await.unwrap();

        for _ in 0..2 {
            track_listener.accept().await.unwrap();
            pot_listener.accept().await.unwrap();
        }
        assert_eq!(transport.link_state(StreamRole::Potential), LinkState::Connected);
        transport.close().await;
    }
}

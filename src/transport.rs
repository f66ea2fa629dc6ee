//! Transport trait for frame delivery

use crate::Result;
use crate::types::{Frame, StreamRole};

/// A role link brought up by [`Transport::open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedLink {
    pub role: StreamRole,

    /// Peer address as the transport describes it, e.g. `127.0.0.1:9000`
    pub addr: String,
}

/// Connection manager owning one outbound link per stream role.
///
/// Transports abstract over where frames go (TCP to the viz server, or an
/// in-memory recorder in tests). The scheduler only ever writes through this
/// trait; it never touches sockets directly.
///
/// A transport may be opened again after `close`; each `open` starts from
/// fresh links.
#[async_trait::async_trait]
pub trait Transport: Send {
    /// Connect both roles.
    ///
    /// Single attempt, no retry. If either role fails, any role that did
    /// connect is closed before the error is returned, so a failed `open`
    /// never leaves a half-open pair behind.
    ///
    /// Returns:
    /// - `Ok(links)` - both links connected, in connect order
    /// - `Err(ReplayError::ConnectionRefused { .. })` - a role could not connect
    async fn open(&mut self) -> Result<Vec<OpenedLink>>;

    /// Write one frame's bytes on the link for `role`.
    ///
    /// Returns:
    /// - `Ok(())` - the whole payload was written
    /// - `Err(ReplayError::Disconnected { .. })` - the peer went away mid-write
    /// - `Err(ReplayError::NotConnected { .. })` - the link is not open
    async fn send(&mut self, role: StreamRole, frame: &Frame) -> Result<()>;

    /// Close both links. Safe to call any number of times.
    async fn close(&mut self);
}

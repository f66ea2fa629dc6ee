//! Transport implementations

pub mod tcp;

pub use tcp::{Link, LinkState, TcpTransport};

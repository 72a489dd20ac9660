//! Boundary with the wireless link
//!
//! The link itself (pairing, advertising, characteristics, fragmentation) is
//! supplied from outside. The core only needs to hand a whole text payload to
//! one of two logical channels; inbound payloads are pushed back into the
//! nodes by whoever owns the link.

mod loopback;

use async_trait::async_trait;

use crate::protocol::Channel;

pub use loopback::{LoopbackHub, LoopbackLink};

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors a transport may report when handing off a payload.
///
/// A successful send does not mean anybody received the payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("Link is not connected")]
    NotConnected,

    #[error("Channel {0} is not writable from this side")]
    WrongDirection(&'static str),

    #[error("Link failure: {0}")]
    Link(String),
}

/// Trait that every link implementation must provide
#[async_trait]
pub trait Transport: Send + Sync {
    /// Hand one whole payload to the link for the given channel.
    /// No acknowledgement, ordering, or delivery guarantee.
    async fn send(&self, channel: Channel, payload: String) -> TransportResult<()>;

    /// Name of this transport, for logging
    fn name(&self) -> &str;
}

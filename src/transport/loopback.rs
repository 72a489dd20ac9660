//! In-memory link for tests and the headless simulation.
//!
//! Every attached peer listens on exactly one channel. A send fans the
//! payload out to every connected listener of that channel; peers that are
//! disconnected at that moment simply miss it. An optional loss rate drops
//! each per-peer delivery independently.

use async_trait::async_trait;
use rand::Rng;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

use super::{Transport, TransportError, TransportResult};
use crate::protocol::Channel;

struct Peer {
    listen: Channel,
    tx: mpsc::UnboundedSender<String>,
    connected: Arc<AtomicBool>,
}

/// Shared medium that all loopback links attach to
pub struct LoopbackHub {
    peers: RwLock<Vec<Peer>>,
    loss_rate: f64,
    next_peer: AtomicUsize,
}

impl LoopbackHub {
    /// A lossless hub
    pub fn new() -> Arc<Self> {
        Self::with_loss_rate(0.0)
    }

    /// A hub that drops each delivery with the given probability (0.0..=1.0)
    pub fn with_loss_rate(loss_rate: f64) -> Arc<Self> {
        Arc::new(Self {
            peers: RwLock::new(Vec::new()),
            loss_rate: loss_rate.clamp(0.0, 1.0),
            next_peer: AtomicUsize::new(0),
        })
    }

    /// Attach a new peer that listens on `listen`.
    /// Returns the link to send with and the stream of inbound payloads.
    pub async fn attach(
        self: &Arc<Self>,
        listen: Channel,
    ) -> (LoopbackLink, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let connected = Arc::new(AtomicBool::new(true));
        let index = self.next_peer.fetch_add(1, Ordering::Relaxed);

        self.peers.write().await.push(Peer {
            listen,
            tx,
            connected: connected.clone(),
        });

        let link = LoopbackLink {
            hub: self.clone(),
            listen,
            connected,
            name: format!("loopback-{}", index),
        };
        (link, rx)
    }

    /// Fan a payload out to the listeners of `channel`. Returns how many
    /// peers it reached.
    async fn deliver(&self, channel: Channel, payload: &str) -> usize {
        let mut peers = self.peers.write().await;
        // Peers whose receiver is gone have left for good
        peers.retain(|peer| !peer.tx.is_closed());

        let mut rng = rand::rng();
        let mut delivered = 0;

        for peer in peers.iter() {
            if peer.listen != channel || !peer.connected.load(Ordering::SeqCst) {
                continue;
            }
            if self.loss_rate > 0.0 && rng.random_bool(self.loss_rate) {
                continue;
            }
            if peer.tx.send(payload.to_string()).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }
}

/// One device's attachment to a [`LoopbackHub`]
pub struct LoopbackLink {
    hub: Arc<LoopbackHub>,
    listen: Channel,
    connected: Arc<AtomicBool>,
    name: String,
}

impl LoopbackLink {
    /// Simulate the device walking in or out of range
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for LoopbackLink {
    async fn send(&self, channel: Channel, payload: String) -> TransportResult<()> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        if channel == self.listen {
            return Err(TransportError::WrongDirection(channel.id()));
        }

        let delivered = self.hub.deliver(channel, &payload).await;
        tracing::trace!(
            link = %self.name,
            channel = channel.id(),
            delivered,
            bytes = payload.len(),
            "Loopback send"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

//! MODE_SELECT: a device decides once whether it hosts or joins

use std::sync::Arc;

use crate::client::ClientNode;
use crate::config::HostConfig;
use crate::host::HostNode;
use crate::transport::Transport;
use crate::types::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceRole {
    Host,
    Client,
}

/// A device after leaving MODE_SELECT
#[derive(Clone)]
pub enum Device {
    Host(Arc<HostNode>),
    Client(Arc<ClientNode>),
}

impl Device {
    /// Leave MODE_SELECT for NAME_ENTRY in the chosen role. Either way the
    /// device gets a fresh local player id.
    pub fn select(role: DeviceRole, transport: Arc<dyn Transport>, config: HostConfig) -> Self {
        match role {
            DeviceRole::Host => Device::Host(Arc::new(HostNode::start(transport, config))),
            DeviceRole::Client => Device::Client(Arc::new(ClientNode::start(transport))),
        }
    }

    pub fn role(&self) -> DeviceRole {
        match self {
            Device::Host(_) => DeviceRole::Host,
            Device::Client(_) => DeviceRole::Client,
        }
    }

    pub fn local_player_id(&self) -> &str {
        match self {
            Device::Host(host) => host.local_player_id(),
            Device::Client(client) => client.local_player_id(),
        }
    }

    /// Phase this device should be showing right now
    pub async fn phase(&self) -> GamePhase {
        match self {
            Device::Host(host) => host.session().await.phase,
            Device::Client(client) => client.phase().await,
        }
    }

    /// The session as this device knows it. A client that has not yet
    /// received a snapshot knows nothing.
    pub async fn session(&self) -> Option<Session> {
        match self {
            Device::Host(host) => Some(host.session().await),
            Device::Client(client) => client.replica().await,
        }
    }
}

use crate::client::ClientNode;
use crate::host::HostNode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Spawn the host's single consumer of the action channel.
///
/// Every inbound payload, whatever thread the link delivered it on, passes
/// through this one task and is fully processed before the next is taken.
pub fn spawn_action_listener(
    host: Arc<HostNode>,
    mut inbound: mpsc::UnboundedReceiver<String>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(payload) = inbound.recv().await {
            host.handle_action_payload(&payload).await;
        }
        tracing::info!("Action channel closed");
    })
}

/// Spawn a client's consumer of the state channel
pub fn spawn_state_listener(
    client: Arc<ClientNode>,
    mut inbound: mpsc::UnboundedReceiver<String>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(payload) = inbound.recv().await {
            client.handle_state_payload(&payload).await;
        }
        tracing::info!("State channel closed");
    })
}

/// Spawn a background task that re-sends the current snapshot periodically,
/// so clients that missed the last broadcast catch up without acting
pub fn spawn_snapshot_heartbeat(host: Arc<HostNode>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(every).await;
            host.rebroadcast().await;
        }
    })
}

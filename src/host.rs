//! Host node
//!
//! The host owns the one authoritative Session. Every mutation (inbound
//! action, local action, operator command) takes the write lock, applies,
//! runs the automatic RESULTS check, and broadcasts the new snapshot before
//! releasing the lock, so snapshots leave in the order mutations happened.

use std::sync::Arc;
use tokio::sync::{watch, RwLock};

use crate::codec::{decode_action, encode_snapshot};
use crate::config::HostConfig;
use crate::protocol::{Action, ActionOutcome, Channel, HostCommand};
use crate::state::PhaseError;
use crate::transport::Transport;
use crate::types::*;

pub struct HostNode {
    local_player_id: PlayerId,
    session: RwLock<Session>,
    transport: Arc<dyn Transport>,
    config: HostConfig,
    changes: watch::Sender<Session>,
}

impl HostNode {
    /// The operator chose to host: create the game and enter NAME_ENTRY
    pub fn start(transport: Arc<dyn Transport>, config: HostConfig) -> Self {
        let local_player_id = new_id();
        let session = Session::start_hosting(local_player_id.clone());

        tracing::info!(
            game_id = session.game_id.as_deref().unwrap_or_default(),
            transport = transport.name(),
            "Hosting new game"
        );

        let (changes, _rx) = watch::channel(session.clone());
        Self {
            local_player_id,
            session: RwLock::new(session),
            transport,
            config,
            changes,
        }
    }

    pub fn local_player_id(&self) -> &str {
        &self.local_player_id
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Current authoritative session
    pub async fn session(&self) -> Session {
        self.session.read().await.clone()
    }

    /// Observe every committed session value
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.changes.subscribe()
    }

    /// Apply an action originating on the host device itself
    pub async fn apply_local(&self, action: &Action) -> ActionOutcome {
        self.process(action).await
    }

    /// Handle one payload from the action channel.
    /// Returns `None` if the payload could not be decoded.
    pub async fn handle_action_payload(&self, payload: &str) -> Option<ActionOutcome> {
        match decode_action(payload) {
            Ok(action) => Some(self.process(&action).await),
            Err(e) => {
                tracing::warn!("Discarding action payload: {}", e);
                None
            }
        }
    }

    async fn process(&self, action: &Action) -> ActionOutcome {
        let mut session = self.session.write().await;

        let outcome = session.apply_with_policy(action, self.config.action_policy);
        match &outcome {
            ActionOutcome::Applied => tracing::debug!("Applied {}", action.kind()),
            ActionOutcome::Ignored(reason) => {
                tracing::debug!("Ignored {}: {}", action.kind(), reason)
            }
        }

        if session.auto_advance() {
            tracing::info!("No balloons left, advancing to results");
        }

        // Snapshot goes out even when nothing changed so a stale client
        // that resubmits gets resynchronised
        self.commit(&session).await;
        outcome
    }

    /// Run an operator command. Refused commands leave the session untouched
    /// and broadcast nothing.
    pub async fn command(&self, command: HostCommand) -> Result<(), PhaseError> {
        let mut session = self.session.write().await;
        tracing::info!("Host command: {:?}", command);

        match command {
            HostCommand::FinishNameEntry { name } => session.finish_name_entry(&name)?,
            HostCommand::SetSpotlight { player_id } => session.set_spotlight(&player_id)?,
            HostCommand::StartRound1 => session.transition_phase(GamePhase::Round1)?,
            HostCommand::StartRound2 => session.transition_phase(GamePhase::Round2)?,
            HostCommand::StartRound3 => session.transition_phase(GamePhase::Round3)?,
            HostCommand::Restart => session.transition_phase(GamePhase::Lobby)?,
        }

        if session.auto_advance() {
            tracing::info!("No balloons left, advancing to results");
        }

        self.commit(&session).await;
        Ok(())
    }

    /// Send the current snapshot again without changing anything
    pub async fn rebroadcast(&self) {
        let session = self.session.read().await;
        self.broadcast(&session).await;
    }

    async fn commit(&self, session: &Session) {
        self.changes.send_replace(session.clone());
        self.broadcast(session).await;
    }

    async fn broadcast(&self, session: &Session) {
        let payload = match encode_snapshot(session) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!("Failed to encode snapshot: {}", e);
                return;
            }
        };

        tracing::debug!(
            phase = ?session.phase,
            players = session.players.len(),
            bytes = payload.len(),
            "Broadcasting snapshot"
        );
        if let Err(e) = self.transport.send(Channel::State, payload).await {
            tracing::warn!("Snapshot broadcast failed: {}", e);
        }
    }
}

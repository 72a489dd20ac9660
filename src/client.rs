//! Client node
//!
//! A client never mutates the session. It submits actions once, with no
//! acknowledgement or retry, and replaces its replica wholesale with every
//! snapshot it manages to decode. Whether an action took effect can only be
//! learned by watching later snapshots.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::codec::{decode_snapshot, encode_action, CodecError};
use crate::protocol::{Action, Channel};
use crate::transport::{Transport, TransportError};
use crate::types::*;

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("Refusing to submit empty text")]
    EmptyText,

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

pub struct ClientNode {
    local_player_id: PlayerId,
    transport: Arc<dyn Transport>,
    /// Holds the replica itself; `None` until the first snapshot arrives
    replica: watch::Sender<Option<Session>>,
}

impl ClientNode {
    /// The operator chose to join: enter NAME_ENTRY with a fresh player id
    pub fn start(transport: Arc<dyn Transport>) -> Self {
        let local_player_id = new_id();
        tracing::info!(
            player_id = %local_player_id,
            transport = transport.name(),
            "Joining as client"
        );

        let (replica, _rx) = watch::channel(None);
        Self {
            local_player_id,
            transport,
            replica,
        }
    }

    pub fn local_player_id(&self) -> &str {
        &self.local_player_id
    }

    /// Last snapshot received, if any
    pub async fn replica(&self) -> Option<Session> {
        self.replica.borrow().clone()
    }

    /// Observe every replica replacement
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.replica.subscribe()
    }

    /// Phase this device should present. Stays in NAME_ENTRY until a
    /// snapshot lists the local player.
    pub async fn phase(&self) -> GamePhase {
        match self.replica.borrow().as_ref() {
            Some(session) if session.player(&self.local_player_id).is_some() => session.phase,
            _ => GamePhase::NameEntry,
        }
    }

    /// The local player as the host last reported it
    pub async fn me(&self) -> Option<Player> {
        self.replica
            .borrow()
            .as_ref()
            .and_then(|s| s.player(&self.local_player_id).cloned())
    }

    /// Handle one payload from the state channel. Undecodable payloads are
    /// dropped and the last good replica is kept.
    pub async fn handle_state_payload(&self, payload: &str) -> bool {
        let session = match decode_snapshot(payload) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("Discarding snapshot: {}", e);
                return false;
            }
        };

        tracing::debug!(phase = ?session.phase, "Replica replaced");
        let previous = self.replica.send_replace(Some(session));

        let current = self.replica.borrow();
        if let (Some(previous), Some(current)) = (previous, current.as_ref()) {
            if previous.game_id != current.game_id {
                tracing::info!(
                    "Snapshot belongs to game {:?}, replaced {:?}",
                    current.game_id,
                    previous.game_id
                );
            }
        }
        true
    }

    /// Hand an action to the link once. Delivery is not confirmed.
    pub async fn submit(&self, action: &Action) -> Result<(), SubmitError> {
        let payload = encode_action(action)?;
        tracing::debug!("Submitting {}", action.kind());
        self.transport.send(Channel::Action, payload).await?;
        Ok(())
    }

    /// Ask the host to add this device as a balloon
    pub async fn join(&self, name: &str) -> Result<Action, SubmitError> {
        let trimmed = name.trim();
        let name = if trimmed.is_empty() {
            DEFAULT_PLAYER_NAME
        } else {
            trimmed
        };
        self.send_intent(Action::Join {
            player_id: self.local_player_id.clone(),
            name: name.to_string(),
        })
        .await
    }

    pub async fn keep(&self) -> Result<Action, SubmitError> {
        self.send_intent(Action::Keep {
            player_id: self.local_player_id.clone(),
        })
        .await
    }

    pub async fn pop(&self, reason: &str) -> Result<Action, SubmitError> {
        self.send_intent(Action::Pop {
            player_id: self.local_player_id.clone(),
            reason: Some(reason.to_string()),
        })
        .await
    }

    /// Submit this balloon's question for the spotlight
    pub async fn ask(&self, text: &str) -> Result<Action, SubmitError> {
        let text = non_empty(text)?;
        self.send_intent(Action::Question {
            id: new_id(),
            from_player_id: self.local_player_id.clone(),
            text,
        })
        .await
    }

    /// Answer (or re-answer) a question as the spotlight
    pub async fn answer(&self, question_id: &str, text: &str) -> Result<Action, SubmitError> {
        let text = non_empty(text)?;
        self.send_intent(Action::Answer {
            question_id: question_id.to_string(),
            from_player_id: self.local_player_id.clone(),
            text,
        })
        .await
    }

    /// As the spotlight, pick the balloon to match with
    pub async fn choose(&self, balloon_id: &str) -> Result<Action, SubmitError> {
        self.send_intent(Action::FinalChoice {
            spotlight_id: self.local_player_id.clone(),
            balloon_id: balloon_id.to_string(),
        })
        .await
    }

    /// Submit and hand the action back so the caller can resubmit the exact
    /// same intent later
    async fn send_intent(&self, action: Action) -> Result<Action, SubmitError> {
        self.submit(&action).await?;
        Ok(action)
    }

    /// Wait until a received snapshot satisfies `predicate`, or give up
    /// after `timeout`
    pub async fn wait_until<F>(&self, predicate: F, timeout: Duration) -> Option<Session>
    where
        F: Fn(&Session) -> bool,
    {
        let mut rx = self.replica.subscribe();
        let watch_loop = async {
            loop {
                let current = rx.borrow_and_update().clone();
                if let Some(session) = current.filter(|s| predicate(s)) {
                    return Some(session);
                }
                if rx.changed().await.is_err() {
                    return None;
                }
            }
        };

        tokio::time::timeout(timeout, watch_loop)
            .await
            .ok()
            .flatten()
    }
}

fn non_empty(text: &str) -> Result<String, SubmitError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(SubmitError::EmptyText);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode_action, encode_snapshot};
    use crate::transport::LoopbackHub;

    async fn client() -> (ClientNode, tokio::sync::mpsc::UnboundedReceiver<String>) {
        let hub = LoopbackHub::new();
        let (_host_link, host_rx) = hub.attach(Channel::Action).await;
        let (link, _client_rx) = hub.attach(Channel::State).await;
        (ClientNode::start(Arc::new(link)), host_rx)
    }

    fn lobby_snapshot(with: &[&str]) -> Session {
        let mut session = Session::new_hosted("host".to_string());
        session.phase = GamePhase::Lobby;
        for id in with {
            session
                .players
                .push(Player::balloon(id.to_string(), "Someone".to_string()));
        }
        session
    }

    #[tokio::test]
    async fn test_join_submits_trimmed_name() {
        let (client, mut host_rx) = client().await;

        client.join("  Ann ").await.unwrap();

        let action = decode_action(&host_rx.recv().await.unwrap()).unwrap();
        assert_eq!(
            action,
            Action::Join {
                player_id: client.local_player_id().to_string(),
                name: "Ann".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_blank_join_name_uses_default() {
        let (client, mut host_rx) = client().await;
        client.join("").await.unwrap();

        match decode_action(&host_rx.recv().await.unwrap()).unwrap() {
            Action::Join { name, .. } => assert_eq!(name, DEFAULT_PLAYER_NAME),
            other => panic!("Expected JOIN, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_blank_question_is_not_sent() {
        let (client, mut host_rx) = client().await;

        let result = client.ask("   ").await;

        assert!(matches!(result, Err(SubmitError::EmptyText)));
        assert!(host_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_phase_waits_for_own_player() {
        let (client, _host_rx) = client().await;
        assert_eq!(client.phase().await, GamePhase::NameEntry);

        let others = lobby_snapshot(&["someone-else"]);
        assert!(client.handle_state_payload(&encode_snapshot(&others).unwrap()).await);
        assert_eq!(client.phase().await, GamePhase::NameEntry);

        let me = client.local_player_id().to_string();
        let joined = lobby_snapshot(&[me.as_str()]);
        client.handle_state_payload(&encode_snapshot(&joined).unwrap()).await;
        assert_eq!(client.phase().await, GamePhase::Lobby);
        assert_eq!(client.me().await.unwrap().id, me);
    }

    #[tokio::test]
    async fn test_bad_snapshot_keeps_last_good_replica() {
        let (client, _host_rx) = client().await;
        let good = lobby_snapshot(&["p2"]);
        client.handle_state_payload(&encode_snapshot(&good).unwrap()).await;

        assert!(!client.handle_state_payload("{\"phase\":").await);

        assert_eq!(client.replica().await, Some(good));
    }

    #[tokio::test]
    async fn test_newer_snapshot_replaces_wholesale() {
        let (client, _host_rx) = client().await;
        client
            .handle_state_payload(&encode_snapshot(&lobby_snapshot(&["p2", "p3"])).unwrap())
            .await;

        let fewer = lobby_snapshot(&["p4"]);
        client.handle_state_payload(&encode_snapshot(&fewer).unwrap()).await;

        assert_eq!(client.replica().await, Some(fewer));
    }

    #[tokio::test]
    async fn test_subscribers_see_the_same_replica() {
        let (client, _host_rx) = client().await;
        let mut changes = client.subscribe();
        let snapshot = lobby_snapshot(&["p2"]);

        client
            .handle_state_payload(&encode_snapshot(&snapshot).unwrap())
            .await;

        changes.changed().await.unwrap();
        assert_eq!(changes.borrow().as_ref(), Some(&snapshot));
        assert_eq!(client.replica().await, Some(snapshot));
    }

    #[tokio::test]
    async fn test_wait_until_times_out_without_snapshots() {
        let (client, _host_rx) = client().await;
        let result = client
            .wait_until(|_| true, Duration::from_millis(20))
            .await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_wait_until_sees_matching_snapshot() {
        let (client, _host_rx) = client().await;
        client
            .handle_state_payload(&encode_snapshot(&lobby_snapshot(&["p2"])).unwrap())
            .await;

        let found = client
            .wait_until(|s| s.player("p2").is_some(), Duration::from_millis(20))
            .await;
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_submit_fails_when_link_down() {
        let hub = LoopbackHub::new();
        let (link, _rx) = hub.attach(Channel::State).await;
        link.set_connected(false);
        let client = ClientNode::start(Arc::new(link));

        let result = client.keep().await;
        assert!(matches!(
            result,
            Err(SubmitError::Transport(TransportError::NotConnected))
        ));
    }
}

use crate::protocol::{ActionOutcome, IgnoreReason};
use crate::types::*;

impl Session {
    /// JOIN: append a new balloon unless the id is already taken
    pub(crate) fn join(&mut self, player_id: &str, name: &str) -> ActionOutcome {
        if self.player(player_id).is_some() {
            return ActionOutcome::Ignored(IgnoreReason::DuplicatePlayer(player_id.to_string()));
        }

        self.players
            .push(Player::balloon(player_id.to_string(), name.to_string()));
        ActionOutcome::Applied
    }

    /// POP: mark a player's balloon as popped, recording why
    pub(crate) fn pop(&mut self, player_id: &str, reason: Option<&str>) -> ActionOutcome {
        let Some(player) = self.player_mut(player_id) else {
            return ActionOutcome::Ignored(IgnoreReason::UnknownPlayer(player_id.to_string()));
        };

        player.balloon_status = BalloonStatus::Popped;
        player.pop_reason = reason.map(str::to_string);
        ActionOutcome::Applied
    }

    /// KEEP: re-affirm an intact balloon. A popped balloon stays popped.
    pub(crate) fn keep(&mut self, player_id: &str) -> ActionOutcome {
        let Some(player) = self.player_mut(player_id) else {
            return ActionOutcome::Ignored(IgnoreReason::UnknownPlayer(player_id.to_string()));
        };
        if player.is_popped() {
            return ActionOutcome::Ignored(IgnoreReason::AlreadyPopped(player_id.to_string()));
        }

        player.balloon_status = BalloonStatus::Intact;
        ActionOutcome::Applied
    }

    /// Re-arm every balloon except the spotlight's
    pub(crate) fn rearm_balloons(&mut self) {
        let spotlight_id = self.spotlight_id.clone();
        for player in &mut self.players {
            if spotlight_id.as_deref() != Some(player.id.as_str()) {
                player.balloon_status = BalloonStatus::Intact;
                player.pop_reason = None;
            }
        }
    }
}

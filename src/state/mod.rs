mod action;
mod game;
mod player;
mod question;

pub use action::apply;

use crate::types::*;
use std::collections::HashSet;

/// Reasons an operator-triggered phase change is refused
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PhaseError {
    #[error("Invalid phase transition from {from:?} to {to:?}")]
    InvalidTransition { from: GamePhase, to: GamePhase },

    #[error("{0} is not allowed during {1:?}")]
    WrongPhase(&'static str, GamePhase),

    #[error("Round 1 requires a spotlight player")]
    SpotlightNotSet,

    #[error("Unknown player {0}")]
    UnknownPlayer(PlayerId),

    #[error("{0} balloon(s) have no decided status")]
    UndecidedBalloons(usize),

    #[error("{0} remaining balloon(s) still need a question and an answer")]
    QuestionsIncomplete(usize),

    #[error("Results require every balloon to be popped ({0} remaining)")]
    BalloonsRemaining(usize),
}

impl Session {
    /// A new hosted game with the host as its only player.
    ///
    /// The value starts in MODE_SELECT; the host moves it to NAME_ENTRY once
    /// the role is chosen.
    pub fn new_hosted(host_id: PlayerId) -> Self {
        Self {
            game_id: Some(new_id()),
            host_id: Some(host_id.clone()),
            players: vec![Player {
                id: host_id,
                name: DEFAULT_HOST_NAME.to_string(),
                role: Role::Host,
                balloon_status: BalloonStatus::Intact,
                pop_reason: None,
            }],
            ..Session::default()
        }
    }

    /// The session a device creates when its operator chooses to host:
    /// already past MODE_SELECT and waiting for the host's name.
    pub fn start_hosting(host_id: PlayerId) -> Self {
        Self {
            phase: GamePhase::NameEntry,
            ..Self::new_hosted(host_id)
        }
    }

    /// Look up a player by id
    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub(crate) fn player_mut(&mut self, id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn host(&self) -> Option<&Player> {
        self.host_id.as_deref().and_then(|id| self.player(id))
    }

    pub fn spotlight(&self) -> Option<&Player> {
        self.spotlight_id.as_deref().and_then(|id| self.player(id))
    }

    pub fn is_spotlight(&self, id: &str) -> bool {
        self.spotlight_id.as_deref() == Some(id)
    }

    /// Every player except the spotlight, popped or not
    pub fn balloons(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(move |p| !self.is_spotlight(&p.id))
    }

    /// Non-spotlight players whose balloon is still intact
    pub fn remaining_balloons(&self) -> Vec<&Player> {
        self.balloons().filter(|p| !p.is_popped()).collect()
    }

    /// Check the structural invariants a well-formed session always holds
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut player_ids = HashSet::new();
        for player in &self.players {
            if !player_ids.insert(player.id.as_str()) {
                return Err(format!("duplicate player {}", player.id));
            }
        }

        let mut askers = HashSet::new();
        let mut question_ids = HashSet::new();
        for question in &self.questions {
            if !askers.insert(question.from_player_id.as_str()) {
                return Err(format!(
                    "player {} has more than one question",
                    question.from_player_id
                ));
            }
            if !question_ids.insert(question.id.as_str()) {
                return Err(format!("duplicate question {}", question.id));
            }
        }

        let mut answered = HashSet::new();
        for answer in &self.answers {
            if !question_ids.contains(answer.question_id.as_str()) {
                return Err(format!(
                    "answer {} refers to missing question {}",
                    answer.id, answer.question_id
                ));
            }
            if !answered.insert(answer.question_id.as_str()) {
                return Err(format!(
                    "question {} has more than one answer",
                    answer.question_id
                ));
            }
        }

        Ok(())
    }
}

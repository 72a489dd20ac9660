use crate::types::*;
use serde::{Deserialize, Serialize};

/// Intents submitted to the host. Only the host applies them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum Action {
    Join {
        player_id: PlayerId,
        name: String,
    },
    Pop {
        player_id: PlayerId,
        #[serde(default)]
        reason: Option<String>,
    },
    Keep {
        player_id: PlayerId,
    },
    Question {
        id: QuestionId,
        from_player_id: PlayerId,
        text: String,
    },
    Answer {
        question_id: QuestionId,
        from_player_id: PlayerId,
        text: String,
    },
    FinalChoice {
        spotlight_id: PlayerId,
        balloon_id: PlayerId,
    },
}

impl Action {
    /// Wire name of the action kind, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Join { .. } => "JOIN",
            Action::Pop { .. } => "POP",
            Action::Keep { .. } => "KEEP",
            Action::Question { .. } => "QUESTION",
            Action::Answer { .. } => "ANSWER",
            Action::FinalChoice { .. } => "FINAL_CHOICE",
        }
    }
}

/// What happened to an action. Purely diagnostic: ignored actions leave the
/// session untouched and nothing is reported back to the submitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Applied,
    Ignored(IgnoreReason),
}

impl ActionOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, ActionOutcome::Applied)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IgnoreReason {
    #[error("player {0} already joined")]
    DuplicatePlayer(PlayerId),

    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),

    #[error("balloon of {0} is already popped")]
    AlreadyPopped(PlayerId),

    #[error("player {0} already asked a question this round")]
    QuestionAlreadyAsked(PlayerId),

    #[error("question {0} already exists")]
    DuplicateQuestionId(QuestionId),

    #[error("unknown question {0}")]
    UnknownQuestion(QuestionId),

    #[error("a match has already been made")]
    MatchAlreadySet,

    #[error("{action} is not accepted during {phase:?}")]
    WrongPhase {
        action: &'static str,
        phase: GamePhase,
    },
}

/// How strictly the host screens actions against the current phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionPolicy {
    /// Only the per-action preconditions apply
    #[default]
    Permissive,
    /// Additionally ignore actions that make no sense in the current phase
    PhaseGated,
}

/// Operator commands on the host device. These never travel over the link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    FinishNameEntry { name: String },
    SetSpotlight { player_id: PlayerId },
    StartRound1,
    StartRound2,
    StartRound3,
    Restart,
}

/// Logical channels of the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Host publishes snapshots, clients read
    State,
    /// Clients publish actions, host reads
    Action,
}

impl Channel {
    /// Stable identifier handed to the transport
    pub fn id(&self) -> &'static str {
        match self {
            Channel::State => "balloonpop.state",
            Channel::Action => "balloonpop.action",
        }
    }
}

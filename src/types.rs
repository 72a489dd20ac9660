use serde::{Deserialize, Serialize};

/// Opaque ID types for type safety
pub type GameId = String;
pub type PlayerId = String;
pub type QuestionId = String;
pub type AnswerId = String;

/// Generate a fresh opaque id
pub fn new_id() -> String {
    ulid::Ulid::new().to_string()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GamePhase {
    ModeSelect,
    NameEntry,
    Lobby,
    /// Looks only
    Round1,
    /// Questions and answers
    Round2,
    /// Spotlight chooses
    Round3,
    Results,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Host,
    Balloon,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BalloonStatus {
    #[default]
    Intact,
    Popped,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub role: Role,
    pub balloon_status: BalloonStatus,
    #[serde(default)]
    pub pop_reason: Option<String>,
}

impl Player {
    /// A freshly joined balloon
    pub fn balloon(id: PlayerId, name: String) -> Self {
        Self {
            id,
            name,
            role: Role::Balloon,
            balloon_status: BalloonStatus::Intact,
            pop_reason: None,
        }
    }

    pub fn is_popped(&self) -> bool {
        self.balloon_status == BalloonStatus::Popped
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId,
    pub from_player_id: PlayerId,
    pub text: String,
    /// Number of questions that existed when this one was accepted
    pub order_index: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub id: AnswerId,
    pub question_id: QuestionId,
    pub from_player_id: PlayerId,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub spotlight_id: PlayerId,
    pub balloon_id: PlayerId,
}

/// The whole game as one value.
///
/// The host owns the canonical copy; clients only ever hold a replica that
/// is replaced wholesale by the next snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub game_id: Option<GameId>,
    pub phase: GamePhase,
    pub host_id: Option<PlayerId>,
    #[serde(default)]
    pub spotlight_id: Option<PlayerId>,
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub answers: Vec<Answer>,
    #[serde(default, rename = "match")]
    pub matched: Option<Match>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            game_id: None,
            phase: GamePhase::ModeSelect,
            host_id: None,
            spotlight_id: None,
            players: Vec::new(),
            questions: Vec::new(),
            answers: Vec::new(),
            matched: None,
        }
    }
}

/// Default display name for a host that leaves the name blank
pub const DEFAULT_HOST_NAME: &str = "Host";

/// Default display name for a client that leaves the name blank
pub const DEFAULT_PLAYER_NAME: &str = "Player";

use super::PhaseError;
use crate::protocol::{ActionOutcome, IgnoreReason};
use crate::types::*;

impl Session {
    /// Check if a phase transition is valid
    fn is_valid_phase_transition(from: GamePhase, to: GamePhase) -> bool {
        use GamePhase::*;

        matches!(
            (from, to),
            (ModeSelect, NameEntry)
                | (NameEntry, Lobby)
                | (Lobby, Round1)
                | (Round1, Round2)
                | (Round2, Round3)
                // Only when the last balloon has popped
                | (Round2, Results)
                | (Round3, Results)
                // Restart
                | (Results, Lobby)
        )
    }

    /// Phases an operator may move to from here
    pub fn valid_transitions(&self) -> Vec<GamePhase> {
        use GamePhase::*;

        [ModeSelect, NameEntry, Lobby, Round1, Round2, Round3, Results]
            .into_iter()
            .filter(|to| Self::is_valid_phase_transition(self.phase, *to))
            .filter(|to| self.validate_phase_preconditions(*to).is_ok())
            .collect()
    }

    /// Validate preconditions for a phase transition
    fn validate_phase_preconditions(&self, to: GamePhase) -> Result<(), PhaseError> {
        match to {
            GamePhase::Round1 => {
                let spotlight_id = self.spotlight_id.as_ref().ok_or(PhaseError::SpotlightNotSet)?;
                if self.player(spotlight_id).is_none() {
                    return Err(PhaseError::UnknownPlayer(spotlight_id.clone()));
                }
            }
            GamePhase::Round2 => {
                // Balloon status is never undecided, so this always holds
                let undecided = self
                    .balloons()
                    .filter(|p| {
                        !matches!(
                            p.balloon_status,
                            BalloonStatus::Intact | BalloonStatus::Popped
                        )
                    })
                    .count();
                if undecided > 0 {
                    return Err(PhaseError::UndecidedBalloons(undecided));
                }
            }
            GamePhase::Round3 => {
                let pending = self.pending_round_two().len();
                if pending > 0 {
                    return Err(PhaseError::QuestionsIncomplete(pending));
                }
            }
            GamePhase::Results => {
                let remaining = self.remaining_balloons().len();
                if remaining > 0 {
                    return Err(PhaseError::BalloonsRemaining(remaining));
                }
            }
            _ => {} // No preconditions for other phases
        }
        Ok(())
    }

    /// Transition game phase with validation and entry effects
    pub fn transition_phase(&mut self, to: GamePhase) -> Result<(), PhaseError> {
        if !Self::is_valid_phase_transition(self.phase, to) {
            return Err(PhaseError::InvalidTransition {
                from: self.phase,
                to,
            });
        }
        self.validate_phase_preconditions(to)?;

        match (self.phase, to) {
            (GamePhase::Lobby, GamePhase::Round1) => {
                self.rearm_balloons();
                self.clear_round_records();
            }
            (GamePhase::Results, GamePhase::Lobby) => {
                self.clear_round_records();
            }
            _ => {}
        }

        tracing::info!("Phase {:?} -> {:?}", self.phase, to);
        self.phase = to;
        Ok(())
    }

    /// The host names itself and opens the lobby
    pub fn finish_name_entry(&mut self, name: &str) -> Result<(), PhaseError> {
        if self.phase != GamePhase::NameEntry {
            return Err(PhaseError::WrongPhase("name entry", self.phase));
        }
        let trimmed = name.trim();
        let name = if trimmed.is_empty() {
            DEFAULT_HOST_NAME
        } else {
            trimmed
        };

        let host_id = self.host_id.clone().unwrap_or_default();
        let host = self
            .player_mut(&host_id)
            .ok_or(PhaseError::UnknownPlayer(host_id.clone()))?;
        host.name = name.to_string();

        self.transition_phase(GamePhase::Lobby)
    }

    /// Choose who is in the spotlight for the next game
    pub fn set_spotlight(&mut self, player_id: &str) -> Result<(), PhaseError> {
        if self.phase != GamePhase::Lobby {
            return Err(PhaseError::WrongPhase("setting the spotlight", self.phase));
        }
        if self.player(player_id).is_none() {
            return Err(PhaseError::UnknownPlayer(player_id.to_string()));
        }

        self.spotlight_id = Some(player_id.to_string());
        Ok(())
    }

    /// Move to RESULTS when no balloon is left in rounds 2 and 3.
    /// Returns whether the phase changed.
    pub fn auto_advance(&mut self) -> bool {
        if !matches!(self.phase, GamePhase::Round2 | GamePhase::Round3) {
            return false;
        }
        self.transition_phase(GamePhase::Results).is_ok()
    }

    /// FINAL_CHOICE: record the match and end the game in one step
    pub(crate) fn final_choice(&mut self, spotlight_id: &str, balloon_id: &str) -> ActionOutcome {
        for id in [spotlight_id, balloon_id] {
            if self.player(id).is_none() {
                return ActionOutcome::Ignored(IgnoreReason::UnknownPlayer(id.to_string()));
            }
        }
        if self.matched.is_some() {
            return ActionOutcome::Ignored(IgnoreReason::MatchAlreadySet);
        }

        self.matched = Some(Match {
            spotlight_id: spotlight_id.to_string(),
            balloon_id: balloon_id.to_string(),
        });
        self.phase = GamePhase::Results;
        ActionOutcome::Applied
    }
}

use crate::protocol::{Action, ActionOutcome, ActionPolicy, IgnoreReason};
use crate::types::*;

/// Apply an action to a session value and return the successor.
///
/// Never fails: an action whose preconditions do not hold yields the input
/// unchanged.
pub fn apply(mut session: Session, action: &Action) -> Session {
    session.apply(action);
    session
}

impl Session {
    /// Apply an action with the permissive default policy
    pub fn apply(&mut self, action: &Action) -> ActionOutcome {
        self.apply_with_policy(action, ActionPolicy::Permissive)
    }

    /// Apply an action. Each handler checks all of its preconditions before
    /// touching the session, so an action either fully applies or not at all.
    pub fn apply_with_policy(&mut self, action: &Action, policy: ActionPolicy) -> ActionOutcome {
        if policy == ActionPolicy::PhaseGated && !Self::accepts_during(action, self.phase) {
            return ActionOutcome::Ignored(IgnoreReason::WrongPhase {
                action: action.kind(),
                phase: self.phase,
            });
        }

        match action {
            Action::Join { player_id, name } => self.join(player_id, name),
            Action::Pop { player_id, reason } => self.pop(player_id, reason.as_deref()),
            Action::Keep { player_id } => self.keep(player_id),
            Action::Question {
                id,
                from_player_id,
                text,
            } => self.ask_question(id, from_player_id, text),
            Action::Answer {
                question_id,
                from_player_id,
                text,
            } => self.answer_question(question_id, from_player_id, text),
            Action::FinalChoice {
                spotlight_id,
                balloon_id,
            } => self.final_choice(spotlight_id, balloon_id),
        }
    }

    /// Phases in which a phase-gated host accepts each action kind
    fn accepts_during(action: &Action, phase: GamePhase) -> bool {
        use GamePhase::*;

        match action {
            Action::Join { .. } => matches!(phase, NameEntry | Lobby),
            Action::Pop { .. } | Action::Keep { .. } => matches!(phase, Round1 | Round2),
            Action::Question { .. } | Action::Answer { .. } => phase == Round2,
            Action::FinalChoice { .. } => phase == Round3,
        }
    }
}

use crate::protocol::{ActionOutcome, IgnoreReason};
use crate::types::*;

impl Session {
    /// QUESTION: one question per intact sender per round, ordered by arrival
    pub(crate) fn ask_question(
        &mut self,
        id: &str,
        from_player_id: &str,
        text: &str,
    ) -> ActionOutcome {
        let Some(from) = self.player(from_player_id) else {
            return ActionOutcome::Ignored(IgnoreReason::UnknownPlayer(
                from_player_id.to_string(),
            ));
        };
        if from.is_popped() {
            return ActionOutcome::Ignored(IgnoreReason::AlreadyPopped(
                from_player_id.to_string(),
            ));
        }
        if self.question_from(from_player_id).is_some() {
            return ActionOutcome::Ignored(IgnoreReason::QuestionAlreadyAsked(
                from_player_id.to_string(),
            ));
        }
        if self.questions.iter().any(|q| q.id == id) {
            return ActionOutcome::Ignored(IgnoreReason::DuplicateQuestionId(id.to_string()));
        }

        let order_index = self.questions.len();
        self.questions.push(Question {
            id: id.to_string(),
            from_player_id: from_player_id.to_string(),
            text: text.to_string(),
            order_index,
        });
        ActionOutcome::Applied
    }

    /// ANSWER: insert or overwrite the single answer to a question
    pub(crate) fn answer_question(
        &mut self,
        question_id: &str,
        from_player_id: &str,
        text: &str,
    ) -> ActionOutcome {
        if !self.questions.iter().any(|q| q.id == question_id) {
            return ActionOutcome::Ignored(IgnoreReason::UnknownQuestion(question_id.to_string()));
        }

        if let Some(existing) = self
            .answers
            .iter_mut()
            .find(|a| a.question_id == question_id)
        {
            existing.text = text.to_string();
        } else {
            self.answers.push(Answer {
                id: new_id(),
                question_id: question_id.to_string(),
                from_player_id: from_player_id.to_string(),
                text: text.to_string(),
            });
        }
        ActionOutcome::Applied
    }

    /// The question a player asked this round, if any
    pub fn question_from(&self, player_id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.from_player_id == player_id)
    }

    pub fn answer_for(&self, question_id: &str) -> Option<&Answer> {
        self.answers.iter().find(|a| a.question_id == question_id)
    }

    /// Questions in submission order
    pub fn questions_in_order(&self) -> Vec<&Question> {
        let mut questions: Vec<_> = self.questions.iter().collect();
        questions.sort_by_key(|q| q.order_index);
        questions
    }

    /// Remaining balloons still missing a question or an answer
    pub fn pending_round_two(&self) -> Vec<&Player> {
        self.remaining_balloons()
            .into_iter()
            .filter(|p| {
                self.question_from(&p.id)
                    .and_then(|q| self.answer_for(&q.id))
                    .is_none()
            })
            .collect()
    }

    /// Every remaining balloon has asked and been answered
    pub fn round_two_complete(&self) -> bool {
        self.pending_round_two().is_empty()
    }

    pub(crate) fn clear_round_records(&mut self) {
        self.questions.clear();
        self.answers.clear();
        self.matched = None;
    }
}

//! The active round's fixed quiz sequence.

use uuid::Uuid;

use crate::dao::models::QuizEntity;

/// One quiz question inside the active round sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundQuiz {
    /// Stable identifier for the quiz.
    pub id: Uuid,
    /// Question text shown to teams.
    pub question: String,
    /// Ordered answer options; immutable while referenced by index.
    pub options: Vec<String>,
}

/// The fixed, ordered quiz sequence of the active round.
///
/// Quizzes are addressed purely by position so any client can resume at an
/// arbitrary index after a reload: the caller carries the index, the sequence
/// only resolves it.
#[derive(Debug, Clone, Default)]
pub struct Round {
    quizzes: Vec<RoundQuiz>,
}

impl Round {
    /// Build the round sequence from persisted quizzes, honoring positions.
    pub fn from_entities(mut entities: Vec<QuizEntity>) -> Self {
        entities.sort_by_key(|entity| entity.position);
        let quizzes = entities
            .into_iter()
            .map(|entity| RoundQuiz {
                id: entity.id,
                question: entity.question,
                options: entity.options,
            })
            .collect();
        Self { quizzes }
    }

    /// Resolve the quiz at a sequence position.
    pub fn quiz_at(&self, index: u32) -> Option<&RoundQuiz> {
        self.quizzes.get(index as usize)
    }

    /// Total number of quizzes in the round.
    pub fn len(&self) -> usize {
        self.quizzes.len()
    }

    /// True when the round holds no quizzes at all.
    pub fn is_empty(&self) -> bool {
        self.quizzes.is_empty()
    }

    /// True iff `index` addresses the final quiz of the sequence.
    pub fn is_last(&self, index: u32) -> bool {
        !self.is_empty() && index as usize == self.quizzes.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiz(position: u32) -> QuizEntity {
        QuizEntity {
            id: Uuid::new_v4(),
            position,
            question: format!("question {position}"),
            options: vec!["a".into(), "b".into()],
        }
    }

    #[test]
    fn entities_are_ordered_by_position() {
        let round = Round::from_entities(vec![quiz(2), quiz(0), quiz(1)]);
        assert_eq!(round.len(), 3);
        assert_eq!(round.quiz_at(0).unwrap().question, "question 0");
        assert_eq!(round.quiz_at(2).unwrap().question, "question 2");
    }

    #[test]
    fn quiz_at_succeeds_exactly_within_bounds() {
        let round = Round::from_entities(vec![quiz(0), quiz(1), quiz(2)]);
        for index in 0..3 {
            assert!(round.quiz_at(index).is_some());
        }
        assert!(round.quiz_at(3).is_none());
        assert!(round.quiz_at(u32::MAX).is_none());
    }

    #[test]
    fn is_last_holds_only_for_the_final_index() {
        let round = Round::from_entities(vec![quiz(0), quiz(1), quiz(2)]);
        assert!(round.is_last(2));
        assert!(!round.is_last(0));
        assert!(!round.is_last(1));
        assert!(!round.is_last(3));
    }

    #[test]
    fn empty_round_has_no_last_index() {
        let round = Round::default();
        assert!(round.is_empty());
        assert!(!round.is_last(0));
        assert!(round.quiz_at(0).is_none());
    }
}

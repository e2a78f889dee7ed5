//! Scoring shared by generated sessions and quizzes loaded from the quiz store.

use crate::error::ScoringError;
use crate::schema::{QuestionRecord, QuestionSequence};
use std::collections::BTreeMap;

/// Chosen option per question index.
pub type Answers = BTreeMap<usize, String>;

/// Exact string equality against the record's correct answer.
pub fn is_correct(record: &QuestionRecord, choice: &str) -> bool {
    record.correct_answer == choice
}

/// Number of questions whose recorded answer is correct.
///
/// Unanswered questions and answers for indices beyond the sequence count as
/// zero. Independent of the order in which answers were given.
pub fn score(sequence: &QuestionSequence, answers: &Answers) -> usize {
    sequence
        .iter()
        .enumerate()
        .filter(|(i, record)| answers.get(i).is_some_and(|choice| is_correct(record, choice)))
        .count()
}

/// Bulk submission of a whole quiz: every question must be answered.
pub fn score_submission(sequence: &QuestionSequence, answers: &Answers) -> Result<usize, ScoringError> {
    let missing: Vec<usize> = (0..sequence.len())
        .filter(|i| !answers.contains_key(i))
        .collect();
    if !missing.is_empty() {
        return Err(ScoringError::Unanswered { missing });
    }
    Ok(score(sequence, answers))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequence() -> QuestionSequence {
        QuestionSequence::new(vec![
            QuestionRecord::new("Capital of France?", vec!["Paris".into(), "Lyon".into()], "Paris").unwrap(),
            QuestionRecord::new("Answer to everything?", vec!["7".into(), "42".into()], "42").unwrap(),
            QuestionRecord::new("2 + 2?", vec!["3".into(), "4".into()], "4").unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn counts_exact_matches_only() {
        let seq = sequence();
        let answers: Answers = [(0, "Paris".to_string()), (1, "7".to_string()), (2, "4 ".to_string())]
            .into_iter()
            .collect();
        assert_eq!(score(&seq, &answers), 1);
    }

    #[test]
    fn ignores_out_of_range_indices() {
        let seq = sequence();
        let answers: Answers = [(9, "Paris".to_string())].into_iter().collect();
        assert_eq!(score(&seq, &answers), 0);
    }

    #[test]
    fn submission_requires_every_answer() {
        let seq = sequence();
        let answers: Answers = [(1, "42".to_string())].into_iter().collect();
        assert_eq!(
            score_submission(&seq, &answers),
            Err(ScoringError::Unanswered { missing: vec![0, 2] })
        );

        let full: Answers = [(0, "Paris".to_string()), (1, "42".to_string()), (2, "4".to_string())]
            .into_iter()
            .collect();
        assert_eq!(score_submission(&seq, &full), Ok(3));
    }
}

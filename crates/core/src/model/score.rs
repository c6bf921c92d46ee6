use crate::model::question::Question;
use crate::model::session::Answers;

/// Integer percentage of `correct` over `total`, rounded half up.
///
/// An empty quiz scores zero.
#[must_use]
pub fn score_percent(correct: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let correct = correct.min(total) as u64;
    let total = total as u64;
    // (correct * 100 / total) + 0.5, kept in integers.
    let rounded = (correct * 200 + total) / (total * 2);
    u8::try_from(rounded).unwrap_or(100)
}

/// Number of questions whose recorded answer matches the correct option.
#[must_use]
pub fn correct_count(questions: &[Question], answers: &Answers) -> usize {
    questions
        .iter()
        .filter(|q| answers.get(&q.id()).is_some_and(|a| q.is_correct(a)))
        .count()
}

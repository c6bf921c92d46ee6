mod ids;
mod question;
mod quiz;
pub mod score;
mod session;

pub use ids::{AttemptId, ParseIdError, QuestionId, QuizId};

pub use question::{Question, QuestionError};
pub use quiz::{DEFAULT_TIME_LIMIT_SECS, Quiz, QuizError};
pub use session::{
    Answers, QuizProgress, QuizSession, QuizStatus, SessionError, TickOutcome,
};

pub mod answer;
pub mod question;
pub mod report;
pub mod session_state;

pub use answer::AnswerOption;
pub use question::{LoadedQuestion, MarkResponse, Question, QuestionResponse, SubmitResponse};
pub use report::TestReport;
pub use session_state::SessionState;

pub mod generator;
pub mod question;

pub use generator::QuizGenerator;
pub use question::{correct_item_ids, QuizQuestion, DISTRACTOR_COUNT};

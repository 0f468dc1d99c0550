mod ast;
pub use ast::Regex;

mod brzozowski;

mod compile;
pub use compile::{RegexError, REPETITION_LIMIT};

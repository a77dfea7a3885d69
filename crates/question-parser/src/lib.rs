//! Recovers structured questions from free-form language model output.
//!
//! The model is prompted to emit one block per question, introduced by a marker word
//! (`Soal`), with options on `A)`..`D)` lines and the answer on a `Jawaban:` line, or
//! for essays, `Jawaban:` / `Penjelasan:` paragraphs. Nothing guarantees it complies, so
//! every block is extracted heuristically and validated on its own: a malformed block is
//! dropped without affecting the rest of the batch.
use std::sync::LazyLock;

pub mod error;
pub mod essay;
pub mod json_reply;
pub mod mcq;
pub mod model;
pub mod normalize;
pub mod parser;
pub mod segment;

pub use error::{ParseError, SegmentError};
pub use json_reply::extract_json_reply;
pub use model::{AnswerLetter, EssayQuestion, McqOptions, McqQuestion, ParseResult};
pub use parser::{Markers, QuestionParser};

static DEFAULT_PARSER: LazyLock<QuestionParser> = LazyLock::new(|| {
    QuestionParser::new(Markers::default()).expect("default markers compile")
});

/// The parser for the default `Soal` / `Jawaban` / `Penjelasan` convention.
pub fn default_parser() -> &'static QuestionParser {
    &DEFAULT_PARSER
}

pub fn parse_mcq(content: &str) -> ParseResult<McqQuestion> {
    DEFAULT_PARSER.parse_mcq(content)
}

pub fn parse_essay(content: &str) -> ParseResult<EssayQuestion> {
    DEFAULT_PARSER.parse_essay(content)
}

pub fn parse_mcq_bytes(content: &[u8]) -> Result<ParseResult<McqQuestion>, ParseError> {
    DEFAULT_PARSER.parse_mcq_bytes(content)
}

pub fn parse_essay_bytes(content: &[u8]) -> Result<ParseResult<EssayQuestion>, ParseError> {
    DEFAULT_PARSER.parse_essay_bytes(content)
}

/// Failures of a whole parse call.
///
/// A completion that yields zero questions is not an error. These variants mean the
/// input (or the parser configuration) could not be used at all.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("model output is not valid UTF-8 text: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("invalid marker pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("failed to parse model reply as JSON")]
    NoJson,
}

/// Why a single segment produced no question.
///
/// Never escalated to the caller: the assembler logs it and drops the segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SegmentError {
    #[error("no question stem")]
    MissingStem,

    #[error("no options recovered")]
    MissingOptions,

    #[error("no answer recovered")]
    MissingAnswer,
}

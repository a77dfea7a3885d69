/// Multiple-choice field extraction.
///
/// Works on the normalized lines of one segment:
/// - stem: every line before the first `A)` / `A.` option line
/// - options: any line opening with `A)`..`D)` or `A.`..`D.` (last one per letter wins)
/// - answer: the first `Jawaban:` line that yields a letter through the matcher chain
use regex::Regex;

use crate::error::SegmentError;
use crate::model::{AnswerLetter, McqOptions, McqQuestion};
use crate::normalize;

/// Fields recovered from one segment, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct McqFields {
    pub stem: String,
    pub options: McqOptions,
    pub answer: Option<AnswerLetter>,
}

impl McqFields {
    /// Apply the inclusion predicate: stem, at least one option and an answer letter.
    pub fn into_question(self, number: usize) -> Result<McqQuestion, SegmentError> {
        if self.stem.is_empty() {
            return Err(SegmentError::MissingStem);
        }
        if !self.options.any_recovered() {
            return Err(SegmentError::MissingOptions);
        }
        let answer = self.answer.ok_or(SegmentError::MissingAnswer)?;
        Ok(McqQuestion {
            number,
            question: self.stem,
            options: self.options,
            answer,
        })
    }
}

/// One step of the answer-recovery chain.
#[derive(Debug)]
enum AnswerMatcher {
    /// Regex whose first capture group is a single letter `A`..`D`.
    Pattern(Regex),
    /// Text after the last `:`, accepted only when it is exactly one letter.
    AfterLastColon,
}

impl AnswerMatcher {
    fn apply(&self, line: &str) -> Option<AnswerLetter> {
        match self {
            AnswerMatcher::Pattern(re) => re
                .captures(line)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().chars().next())
                .and_then(AnswerLetter::from_char),
            AnswerMatcher::AfterLastColon => line
                .rsplit(':')
                .next()
                .map(str::trim)
                .and_then(AnswerLetter::from_exact),
        }
    }
}

#[derive(Debug)]
pub struct McqExtractor {
    /// `"<answer marker>:"`, the substring that makes a line an answer line.
    answer_needle: String,
    matchers: Vec<AnswerMatcher>,
}

impl McqExtractor {
    pub fn new(answer_marker: &str) -> Result<Self, regex::Error> {
        let marker = regex::escape(answer_marker);
        // Order matters: `X)` before `X.` before a bare letter.
        let mut matchers = Vec::with_capacity(4);
        for suffix in [r"\)", r"\.", ""] {
            let re = Regex::new(&format!(r"{marker}:\s*([A-D]){suffix}"))?;
            matchers.push(AnswerMatcher::Pattern(re));
        }
        matchers.push(AnswerMatcher::AfterLastColon);

        Ok(Self {
            answer_needle: format!("{answer_marker}:"),
            matchers,
        })
    }

    pub fn extract(&self, segment: &str) -> McqFields {
        let lines = normalize::lines(segment);
        McqFields {
            stem: stem(&lines),
            options: options(&lines),
            answer: self.answer(&lines),
        }
    }

    fn answer(&self, lines: &[&str]) -> Option<AnswerLetter> {
        lines
            .iter()
            .filter(|line| line.contains(&self.answer_needle))
            .find_map(|line| self.matchers.iter().find_map(|m| m.apply(line)))
    }
}

fn starts_first_option(line: &str) -> bool {
    line.starts_with("A)") || line.starts_with("A.")
}

fn stem(lines: &[&str]) -> String {
    let joined = lines
        .iter()
        .take_while(|line| !starts_first_option(line))
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    normalize::strip_ordinal(&joined).trim().to_string()
}

/// Split an option line into its letter and text.
fn option_line(line: &str) -> Option<(AnswerLetter, &str)> {
    let mut chars = line.chars();
    let letter = chars.next().and_then(AnswerLetter::from_char)?;
    match chars.next() {
        // Both prefix characters are ASCII, so byte index 2 is a char boundary.
        Some(')') | Some('.') => Some((letter, line[2..].trim())),
        _ => None,
    }
}

fn options(lines: &[&str]) -> McqOptions {
    let mut options = McqOptions::default();
    for (letter, text) in lines.iter().filter_map(|line| option_line(line)) {
        *options.slot_mut(letter) = text.to_string();
    }
    options
}

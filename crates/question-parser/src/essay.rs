/// Essay field extraction over blank-line-delimited sections.
use crate::error::SegmentError;
use crate::model::EssayQuestion;
use crate::normalize;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EssayFields {
    pub stem: String,
    pub answer: Option<String>,
    pub explanation: Option<String>,
}

impl EssayFields {
    /// Apply the inclusion predicate: non-empty stem and non-empty answer.
    pub fn into_question(self, number: usize) -> Result<EssayQuestion, SegmentError> {
        if self.stem.is_empty() {
            return Err(SegmentError::MissingStem);
        }
        let answer = self
            .answer
            .filter(|a| !a.is_empty())
            .ok_or(SegmentError::MissingAnswer)?;
        Ok(EssayQuestion {
            number,
            question: self.stem,
            answer,
            explanation: self.explanation,
        })
    }
}

#[derive(Debug)]
pub struct EssayExtractor {
    /// Lowercased `"<answer marker>:"`.
    answer_prefix: String,
    /// Lowercased `"<explanation marker>:"`.
    explanation_prefix: String,
}

impl EssayExtractor {
    pub fn new(answer_marker: &str, explanation_marker: &str) -> Self {
        Self {
            answer_prefix: format!("{}:", answer_marker.to_lowercase()),
            explanation_prefix: format!("{}:", explanation_marker.to_lowercase()),
        }
    }

    pub fn extract(&self, segment: &str) -> EssayFields {
        let sections = normalize::sections(segment);
        let stem = sections
            .first()
            .map(|s| normalize::strip_ordinal(s).trim().to_string())
            .unwrap_or_default();

        let mut fields = EssayFields {
            stem,
            ..Default::default()
        };
        // Later sections overwrite earlier ones.
        for section in &sections {
            if let Some(rest) = strip_prefix_ci(section, &self.answer_prefix) {
                fields.answer = Some(rest.trim().to_string());
            } else if let Some(rest) = strip_prefix_ci(section, &self.explanation_prefix) {
                fields.explanation = Some(rest.trim().to_string());
            }
        }
        fields
    }
}

/// Case-insensitive `strip_prefix`. `prefix_lower` must already be lowercase.
///
/// Skips exactly as many characters as the prefix has, so the remainder never
/// starts inside the marker.
fn strip_prefix_ci<'a>(text: &'a str, prefix_lower: &str) -> Option<&'a str> {
    let n = prefix_lower.chars().count();
    let split_at = text
        .char_indices()
        .nth(n)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let (head, rest) = text.split_at(split_at);
    if head.chars().count() == n && head.to_lowercase() == prefix_lower {
        Some(rest)
    } else {
        None
    }
}

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The four option slots of a multiple-choice question.
///
/// Slots that were never recovered from the model output hold an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct McqOptions {
    #[serde(rename = "A")]
    pub a: String,
    #[serde(rename = "B")]
    pub b: String,
    #[serde(rename = "C")]
    pub c: String,
    #[serde(rename = "D")]
    pub d: String,
}

impl McqOptions {
    pub fn slot_mut(&mut self, letter: AnswerLetter) -> &mut String {
        match letter {
            AnswerLetter::A => &mut self.a,
            AnswerLetter::B => &mut self.b,
            AnswerLetter::C => &mut self.c,
            AnswerLetter::D => &mut self.d,
        }
    }

    pub fn get(&self, letter: AnswerLetter) -> &str {
        match letter {
            AnswerLetter::A => &self.a,
            AnswerLetter::B => &self.b,
            AnswerLetter::C => &self.c,
            AnswerLetter::D => &self.d,
        }
    }

    /// True when at least one slot holds text.
    pub fn any_recovered(&self) -> bool {
        AnswerLetter::ALL.iter().any(|&l| !self.get(l).is_empty())
    }
}

/// Letter of an MCQ option or answer. Serialized as the bare letter (`"A"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum AnswerLetter {
    A,
    B,
    C,
    D,
}

impl AnswerLetter {
    pub const ALL: [AnswerLetter; 4] = [Self::A, Self::B, Self::C, Self::D];

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'A' => Some(Self::A),
            'B' => Some(Self::B),
            'C' => Some(Self::C),
            'D' => Some(Self::D),
            _ => None,
        }
    }

    /// Accepts exactly `"A"`..`"D"`; anything else (including `"a"` or `"A "`) is rejected.
    pub fn from_exact(s: &str) -> Option<Self> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_char(c),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
        }
    }
}

impl std::fmt::Display for AnswerLetter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A validated multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct McqQuestion {
    /// Position of the source segment in the model output (1-based).
    pub number: usize,
    pub question: String,
    pub options: McqOptions,
    pub answer: AnswerLetter,
}

/// A validated essay question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EssayQuestion {
    /// Position of the source segment in the model output (1-based).
    pub number: usize,
    pub question: String,
    pub answer: String,
    /// `None` when the segment had no explanation section at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Questions recovered from one model completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ParseResult<T> {
    pub total_questions: usize,
    pub questions: Vec<T>,
}

impl<T> ParseResult<T> {
    pub fn empty() -> Self {
        Self {
            total_questions: 0,
            questions: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

impl<T> From<Vec<T>> for ParseResult<T> {
    fn from(questions: Vec<T>) -> Self {
        Self {
            total_questions: questions.len(),
            questions,
        }
    }
}

impl<T> FromIterator<T> for ParseResult<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        iter.into_iter().collect::<Vec<T>>().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_letter_exact_match_only() {
        assert_eq!(AnswerLetter::from_exact("C"), Some(AnswerLetter::C));
        assert_eq!(AnswerLetter::from_exact("c"), None);
        assert_eq!(AnswerLetter::from_exact("E"), None);
        assert_eq!(AnswerLetter::from_exact("AB"), None);
        assert_eq!(AnswerLetter::from_exact(""), None);
    }

    #[test]
    fn options_serialize_with_letter_keys() {
        let options = McqOptions {
            a: "Cairan".to_string(),
            b: "Gas".to_string(),
            c: String::new(),
            d: String::new(),
        };
        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"A": "Cairan", "B": "Gas", "C": "", "D": ""})
        );
    }

    #[test]
    fn answer_serializes_as_bare_letter() {
        let json = serde_json::to_value(AnswerLetter::D).unwrap();
        assert_eq!(json, serde_json::json!("D"));
    }

    #[test]
    fn explanation_absent_and_empty_serialize_differently() {
        let absent = EssayQuestion {
            number: 1,
            question: "q".to_string(),
            answer: "a".to_string(),
            explanation: None,
        };
        let empty = EssayQuestion {
            explanation: Some(String::new()),
            ..absent.clone()
        };

        let absent_json = serde_json::to_value(&absent).unwrap();
        let empty_json = serde_json::to_value(&empty).unwrap();
        assert!(absent_json.get("explanation").is_none());
        assert_eq!(empty_json["explanation"], serde_json::json!(""));

        let back: EssayQuestion = serde_json::from_value(empty_json).unwrap();
        assert_eq!(back.explanation, Some(String::new()));
        let back: EssayQuestion = serde_json::from_value(absent_json).unwrap();
        assert_eq!(back.explanation, None);
    }

    #[test]
    fn parse_result_count_follows_list() {
        let result: ParseResult<u8> = vec![1, 2, 3].into_iter().collect();
        assert_eq!(result.total_questions, 3);
        assert_eq!(result.questions.len(), 3);
        assert!(ParseResult::<u8>::empty().is_empty());
    }
}

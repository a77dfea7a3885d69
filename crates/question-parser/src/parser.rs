use tracing::{debug, warn};

use crate::error::{ParseError, SegmentError};
use crate::essay::EssayExtractor;
use crate::mcq::McqExtractor;
use crate::model::{EssayQuestion, McqQuestion, ParseResult};
use crate::segment::{self, RawSegment};

/// Literal words of the prompt/response convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markers {
    /// Introduces each question, e.g. `Soal 1:`.
    pub question: String,
    /// Introduces the answer field, e.g. `Jawaban: B`.
    pub answer: String,
    /// Introduces the optional essay explanation, e.g. `Penjelasan:`.
    pub explanation: String,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            question: "Soal".to_string(),
            answer: "Jawaban".to_string(),
            explanation: "Penjelasan".to_string(),
        }
    }
}

/// Recovers question records from free-form model output.
///
/// Holds only immutable compiled matchers, so one instance can serve any number
/// of concurrent callers.
#[derive(Debug)]
pub struct QuestionParser {
    markers: Markers,
    mcq: McqExtractor,
    essay: EssayExtractor,
}

impl QuestionParser {
    pub fn new(markers: Markers) -> Result<Self, ParseError> {
        let mcq = McqExtractor::new(&markers.answer)?;
        let essay = EssayExtractor::new(&markers.answer, &markers.explanation);
        Ok(Self {
            markers,
            mcq,
            essay,
        })
    }

    pub fn markers(&self) -> &Markers {
        &self.markers
    }

    pub fn parse_mcq(&self, content: &str) -> ParseResult<McqQuestion> {
        assemble(
            "mcq",
            segment::segments(content, &self.markers.question),
            |seg| self.mcq.extract(seg.text).into_question(seg.number),
        )
    }

    pub fn parse_essay(&self, content: &str) -> ParseResult<EssayQuestion> {
        assemble(
            "essay",
            segment::segments(content, &self.markers.question),
            |seg| self.essay.extract(seg.text).into_question(seg.number),
        )
    }

    pub fn parse_mcq_bytes(&self, content: &[u8]) -> Result<ParseResult<McqQuestion>, ParseError> {
        Ok(self.parse_mcq(std::str::from_utf8(content)?))
    }

    pub fn parse_essay_bytes(
        &self,
        content: &[u8],
    ) -> Result<ParseResult<EssayQuestion>, ParseError> {
        Ok(self.parse_essay(std::str::from_utf8(content)?))
    }
}

/// Run `extract` on every segment in order, keeping the successes.
///
/// A rejected segment is logged and dropped; it never affects its neighbours.
fn assemble<T>(
    kind: &'static str,
    segments: Vec<RawSegment<'_>>,
    extract: impl Fn(&RawSegment<'_>) -> Result<T, SegmentError>,
) -> ParseResult<T> {
    let segment_count = segments.len();
    let result: ParseResult<T> = segments
        .iter()
        .filter_map(|seg| match extract(seg) {
            Ok(question) => Some(question),
            Err(reason) => {
                warn!(kind, number = seg.number, %reason, "skipping malformed question");
                None
            }
        })
        .collect();
    debug!(
        kind,
        segments = segment_count,
        questions = result.total_questions,
        "model output parsed"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AnswerLetter;

    fn parser() -> QuestionParser {
        QuestionParser::new(Markers::default()).unwrap()
    }

    const SCENARIO_A: &str =
        "Soal 1:\nApa itu air?\nA) Cairan\nB) Gas\nC) Padat\nD) Plasma\nJawaban: A";

    #[test]
    fn scenario_a_single_mcq() {
        let result = parser().parse_mcq(SCENARIO_A);
        assert_eq!(result.total_questions, 1);
        let q = &result.questions[0];
        assert_eq!(q.number, 1);
        assert_eq!(q.question, "Apa itu air?");
        assert_eq!(q.options.a, "Cairan");
        assert_eq!(q.options.b, "Gas");
        assert_eq!(q.options.c, "Padat");
        assert_eq!(q.options.d, "Plasma");
        assert_eq!(q.answer, AnswerLetter::A);
    }

    #[test]
    fn scenario_b_missing_answer_line() {
        let content = "Soal 1:\nApa itu air?\nA) Cairan\nB) Gas\nC) Padat\nD) Plasma";
        let result = parser().parse_mcq(content);
        assert_eq!(result.total_questions, 0);
        assert!(result.questions.is_empty());
    }

    #[test]
    fn scenario_c_malformed_second_segment() {
        let content = format!("{SCENARIO_A}\n\nSoal 2:\nPertanyaan tanpa pilihan\nJawaban: B");
        let result = parser().parse_mcq(&content);
        assert_eq!(result.total_questions, 1);
        assert_eq!(result.questions[0].number, 1);
    }

    #[test]
    fn scenario_d_essay_with_explanation() {
        let content = "Soal 1:\nJelaskan fotosintesis.\n\nJawaban:\nProses tumbuhan menghasilkan energi.\n\nPenjelasan:\nMelibatkan klorofil.";
        let result = parser().parse_essay(content);
        assert_eq!(result.total_questions, 1);
        let q = &result.questions[0];
        assert_eq!(q.question, "Jelaskan fotosintesis.");
        assert_eq!(q.answer, "Proses tumbuhan menghasilkan energi.");
        assert_eq!(q.explanation.as_deref(), Some("Melibatkan klorofil."));
    }

    #[test]
    fn scenario_e_essay_without_explanation() {
        let content = "Soal 1:\nJelaskan fotosintesis.\n\nJawaban:\nProses tumbuhan menghasilkan energi.";
        let result = parser().parse_essay(content);
        assert_eq!(result.total_questions, 1);
        assert_eq!(result.questions[0].explanation, None);
    }

    #[test]
    fn dropped_segments_keep_original_numbers() {
        let content = "\
Soal 1:
Rusak tanpa jawaban
A) x

Soal 2:
Ibu kota Jepang?
A) Tokyo
B) Osaka
Jawaban: A

Soal 3:

Soal 4:
Planet terbesar?
A) Mars
B) Jupiter
C) Venus
D) Bumi
Jawaban: B)
";
        let result = parser().parse_mcq(content);
        let numbers: Vec<usize> = result.questions.iter().map(|q| q.number).collect();
        assert_eq!(numbers, vec![2, 4]);
        assert_eq!(result.total_questions, result.questions.len());
        assert_eq!(result.questions[1].answer, AnswerLetter::B);
    }

    #[test]
    fn count_always_matches_list() {
        let p = parser();
        for content in [
            "",
            "tidak ada penanda",
            SCENARIO_A,
            "Soal\nSoal\nSoal",
            "Soal 1:\nA) x\nJawaban: A",
        ] {
            let mcq = p.parse_mcq(content);
            assert_eq!(mcq.total_questions, mcq.questions.len(), "input: {content:?}");
            let essay = p.parse_essay(content);
            assert_eq!(essay.total_questions, essay.questions.len(), "input: {content:?}");
        }
    }

    #[test]
    fn parsing_is_idempotent() {
        let p = parser();
        let content = format!("{SCENARIO_A}\nSoal 2:\nLagi?\nA) Ya\nB) Tidak\nJawaban: B");
        assert_eq!(p.parse_mcq(&content), p.parse_mcq(&content));
        assert_eq!(p.parse_essay(&content), p.parse_essay(&content));
    }

    #[test]
    fn mcq_text_through_essay_parser_yields_nothing() {
        // No blank-line sections, so no answer section is found.
        let result = parser().parse_essay(SCENARIO_A);
        assert!(result.is_empty());
    }

    #[test]
    fn bytes_entry_points_reject_non_text() {
        let p = parser();
        let err = p.parse_mcq_bytes(&[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, ParseError::InvalidUtf8(_)));
        assert!(matches!(
            p.parse_essay_bytes(&[0xc3]),
            Err(ParseError::InvalidUtf8(_))
        ));
        let ok = p.parse_mcq_bytes(SCENARIO_A.as_bytes()).unwrap();
        assert_eq!(ok.total_questions, 1);
    }

    #[test]
    fn custom_markers() {
        let p = QuestionParser::new(Markers {
            question: "Question".to_string(),
            answer: "Answer".to_string(),
            explanation: "Explanation".to_string(),
        })
        .unwrap();
        let mcq = p.parse_mcq("Question 1:\nWhat is water?\nA) Liquid\nB) Gas\nAnswer: A");
        assert_eq!(mcq.total_questions, 1);
        assert_eq!(mcq.questions[0].question, "What is water?");

        let essay = p.parse_essay("Question 1:\nExplain.\n\nAnswer: Because.\n\nExplanation: Indeed.");
        assert_eq!(essay.questions[0].explanation.as_deref(), Some("Indeed."));
    }

    #[test]
    fn parser_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<QuestionParser>();
    }
}

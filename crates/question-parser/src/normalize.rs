/// Per-segment text normalization.
///
/// MCQ fields are line-anchored (one field per line) while essay fields span
/// several lines inside a blank-line-delimited section, hence two shapes.
use std::sync::LazyLock;

use regex::Regex;

static ORDINAL_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+:\s*").expect("valid regex"));

/// Trimmed, non-empty lines in original order.
pub fn lines(segment: &str) -> Vec<&str> {
    segment
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect()
}

/// Trimmed, non-empty blank-line-delimited sections in original order.
///
/// Returns owned strings because `\r\n` endings are folded to `\n` first.
pub fn sections(segment: &str) -> Vec<String> {
    let unified = segment.replace("\r\n", "\n");
    unified
        .split("\n\n")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Remove an echoed question number such as `"1: "` from the start of `text`.
pub fn strip_ordinal(text: &str) -> &str {
    match ORDINAL_PREFIX.find(text) {
        Some(m) => &text[m.end()..],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_are_trimmed_and_blank_ones_dropped() {
        let got = lines(" 1:\n  Apa itu air?  \n\n\t\nA) Cairan\r\n");
        assert_eq!(got, vec!["1:", "Apa itu air?", "A) Cairan"]);
    }

    #[test]
    fn sections_split_on_blank_line() {
        let got = sections(" 1:\nJelaskan.\n\nJawaban:\nIni.\n\n\n\nPenjelasan:\nItu.\n");
        assert_eq!(got, vec!["1:\nJelaskan.", "Jawaban:\nIni.", "Penjelasan:\nItu."]);
    }

    #[test]
    fn sections_accept_crlf() {
        let got = sections("a\r\n\r\nb");
        assert_eq!(got, vec!["a", "b"]);
    }

    #[test]
    fn ordinal_prefix_stripping() {
        assert_eq!(strip_ordinal("1: Apa itu air?"), "Apa itu air?");
        assert_eq!(strip_ordinal("12:\nJelaskan."), "Jelaskan.");
        assert_eq!(strip_ordinal("Apa itu 1: air?"), "Apa itu 1: air?");
        assert_eq!(strip_ordinal("1. Apa"), "1. Apa");
        assert_eq!(strip_ordinal("3:"), "");
    }
}

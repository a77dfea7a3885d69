//! Splitting model output into per-question segments.

/// The text following one occurrence of the question marker, up to the next
/// occurrence or the end of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSegment<'a> {
    /// Occurrence order of the marker, starting at 1. Independent of any number
    /// the model wrote after the marker.
    pub number: usize,
    pub text: &'a str,
}

/// Split `content` on every literal occurrence of `marker`.
///
/// Text before the first marker is discarded, so empty input or input without
/// the marker yields no segments.
pub fn segments<'a>(content: &'a str, marker: &str) -> Vec<RawSegment<'a>> {
    if marker.is_empty() {
        return Vec::new();
    }
    content
        .split(marker)
        .skip(1)
        .enumerate()
        .map(|(i, text)| RawSegment { number: i + 1, text })
        .collect()
}

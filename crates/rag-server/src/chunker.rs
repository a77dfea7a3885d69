/// Recursive character text splitter.
///
/// Text is cut on the coarsest separator it contains (paragraphs, then lines, then
/// words, then single characters). Pieces that still exceed `chunk_size` are split again
/// with the next finer separator. Small pieces are merged greedily back into chunks of
/// at most `chunk_size` characters, and each new chunk starts with up to `chunk_overlap`
/// characters carried over from the end of the previous one.
use std::collections::VecDeque;

const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

pub struct Chunker {
    /// Maximum characters per chunk.
    chunk_size: usize,
    /// Characters shared between adjacent chunks.
    chunk_overlap: usize,
}

impl Chunker {
    /// # Panics
    /// Panics if `chunk_overlap >= chunk_size`. `Config` rejects such values at startup.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        assert!(
            chunk_overlap < chunk_size,
            "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
        );
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    /// Split `text` into trimmed, non-empty chunks in document order.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        self.split(text, &SEPARATORS)
    }

    fn split(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let Some(pos) = separators
            .iter()
            .position(|sep| sep.is_empty() || text.contains(sep))
        else {
            return vec![text.to_string()];
        };
        let separator = separators[pos];
        let finer = &separators[pos + 1..];

        let pieces: Vec<&str> = if separator.is_empty() {
            text.char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect()
        } else {
            text.split(separator).filter(|p| !p.is_empty()).collect()
        };

        let mut chunks = Vec::new();
        let mut pending: Vec<&str> = Vec::new();
        for piece in pieces {
            if char_len(piece) < self.chunk_size {
                pending.push(piece);
                continue;
            }
            if !pending.is_empty() {
                chunks.extend(self.merge(&pending, separator));
                pending.clear();
            }
            if finer.is_empty() {
                chunks.push(piece.to_string());
            } else {
                chunks.extend(self.split(piece, finer));
            }
        }
        if !pending.is_empty() {
            chunks.extend(self.merge(&pending, separator));
        }
        chunks
    }

    fn merge(&self, pieces: &[&str], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);
            let joiner = |window: &VecDeque<&str>| if window.is_empty() { 0 } else { sep_len };

            if !window.is_empty() && total + len + joiner(&window) > self.chunk_size {
                push_joined(&window, separator, &mut chunks);
                while total > self.chunk_overlap
                    || (total > 0 && total + len + joiner(&window) > self.chunk_size)
                {
                    let Some(front) = window.pop_front() else {
                        break;
                    };
                    total -= char_len(front) + joiner(&window);
                }
            }

            window.push_back(piece);
            total += len + if window.len() > 1 { sep_len } else { 0 };
        }
        push_joined(&window, separator, &mut chunks);
        chunks
    }
}

fn push_joined(window: &VecDeque<&str>, separator: &str, chunks: &mut Vec<String>) {
    let joined = window.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        let chunks = Chunker::new(2000, 200).chunk("  Fotosintesis terjadi di daun.  ");
        assert_eq!(chunks, vec!["Fotosintesis terjadi di daun."]);
    }

    #[test]
    fn empty_text_gives_no_chunks() {
        assert!(Chunker::new(10, 2).chunk("").is_empty());
        assert!(Chunker::new(10, 2).chunk(" \n\n \n").is_empty());
    }

    #[test]
    fn paragraphs_split_before_words() {
        let chunks = Chunker::new(20, 0).chunk("first paragraph\n\nsecond paragraph");
        assert_eq!(chunks, vec!["first paragraph", "second paragraph"]);
    }

    #[test]
    fn overlap_is_carried_between_neighbours() {
        let chunks = Chunker::new(10, 4).chunk("aaa bbb ccc ddd eee");
        assert_eq!(chunks, vec!["aaa bbb", "bbb ccc", "ccc ddd", "ddd eee"]);
    }

    #[test]
    fn oversized_paragraph_falls_back_to_words() {
        let chunks = Chunker::new(10, 0).chunk("short\n\nthis is a longer paragraph");
        assert_eq!(chunks, vec!["short", "this is a", "longer", "paragraph"]);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
    }

    #[test]
    fn unbroken_text_splits_on_characters() {
        let chunks = Chunker::new(4, 0).chunk("abcdefghij");
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn multibyte_text_is_counted_in_characters() {
        let chunks = Chunker::new(3, 0).chunk("ééééé");
        assert_eq!(chunks, vec!["ééé", "éé"]);
    }

    #[test]
    #[should_panic]
    fn overlap_must_be_less_than_chunk_size() {
        let _ = Chunker::new(5, 5);
    }
}

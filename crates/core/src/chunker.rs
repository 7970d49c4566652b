use crate::error::IngestError;
use crate::models::DocumentChunk;

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Split boundaries in preference order. The raw-character split at the
/// window edge is the implicit last resort.
const BOUNDARIES: [&str; 3] = ["\n\n", "\n", " "];

/// Splits text into overlapping windows of at most `chunk_size` characters,
/// cutting each window at the highest-priority boundary it contains.
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl Chunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, IngestError> {
        if chunk_size == 0 {
            return Err(IngestError::InvalidChunkConfig(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(IngestError::InvalidChunkConfig(format!(
                "chunk_overlap {chunk_overlap} must be smaller than chunk_size {chunk_size}"
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Splits `text` and tags every piece with the source filename and its
    /// position. Indices are contiguous from 0 and `total_chunks` is the
    /// same on every chunk of one call.
    pub fn chunk(&self, text: &str, source_filename: &str) -> Vec<DocumentChunk> {
        let pieces = self.split_text(text);
        let total_chunks = pieces.len();

        pieces
            .into_iter()
            .enumerate()
            .map(|(chunk_index, piece)| DocumentChunk {
                text: piece,
                source_filename: source_filename.to_string(),
                chunk_index,
                total_chunks,
            })
            .collect()
    }

    /// Deterministic split: a window of `chunk_size` characters advances
    /// through the text, each cut lands on the best available boundary, and
    /// the next window starts `chunk_overlap` characters before the cut so
    /// consecutive pieces share boundary content.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let mut pieces = Vec::new();
        let mut start = 0usize;

        while start < chars.len() {
            if chars.len() - start <= self.chunk_size {
                push_piece(&mut pieces, &chars[start..]);
                break;
            }

            let window_end = start + self.chunk_size;
            let end = self
                .boundary_cut(&chars, start, window_end)
                .unwrap_or(window_end);
            push_piece(&mut pieces, &chars[start..end]);
            start = end - self.chunk_overlap;
        }

        pieces
    }

    /// Highest-priority boundary whose end falls inside the window, provided
    /// the cut still advances past the overlap region (otherwise the window
    /// would move backwards).
    fn boundary_cut(&self, chars: &[char], start: usize, window_end: usize) -> Option<usize> {
        for boundary in BOUNDARIES {
            let needle: Vec<char> = boundary.chars().collect();
            if let Some(cut) = rfind_boundary(chars, start, window_end, &needle) {
                if cut > start + self.chunk_overlap {
                    return Some(cut);
                }
            }
        }
        None
    }
}

/// Position just past the last occurrence of `needle` that ends at or before
/// `window_end`, searching from `start`.
fn rfind_boundary(chars: &[char], start: usize, window_end: usize, needle: &[char]) -> Option<usize> {
    let mut found = None;
    let mut cursor = start;

    while cursor + needle.len() <= window_end {
        if chars[cursor..cursor + needle.len()] == *needle {
            found = Some(cursor + needle.len());
            cursor += needle.len();
        } else {
            cursor += 1;
        }
    }

    found
}

fn push_piece(pieces: &mut Vec<String>, slice: &[char]) {
    let text: String = slice.iter().collect();
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        pieces.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filler(len: usize) -> String {
        "lorem ipsum dolor sit amet consectetur adipiscing elit sed do "
            .chars()
            .cycle()
            .take(len)
            .collect()
    }

    /// Longest suffix of `left` that `right` starts with.
    fn shared_boundary(left: &str, right: &str) -> usize {
        let max = left.len().min(right.len());
        (0..=max)
            .rev()
            .find(|&len| left.ends_with(&right[..len]))
            .unwrap_or(0)
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunker = Chunker::default();
        let chunks = chunker.chunk("just a short note", "note.pdf");

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "just a short note");
        assert_eq!(chunks[0].chunk_index, 0);
        assert_eq!(chunks[0].total_chunks, 1);
        assert_eq!(chunks[0].source_filename, "note.pdf");
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        let chunker = Chunker::default();
        assert!(chunker.chunk("   \n\n  ", "blank.pdf").is_empty());
    }

    #[test]
    fn splitting_is_deterministic() {
        let chunker = Chunker::default();
        let text = filler(5000);
        assert_eq!(chunker.split_text(&text), chunker.split_text(&text));
    }

    #[test]
    fn invalid_configs_are_rejected() {
        assert!(Chunker::new(0, 0).is_err());
        assert!(Chunker::new(100, 100).is_err());
        assert!(Chunker::new(100, 150).is_err());
        assert!(Chunker::new(100, 99).is_ok());
    }

    #[test]
    fn raw_character_split_shares_exactly_the_overlap() {
        // No separators at all, so every cut is a hard window-edge cut and
        // consecutive pieces share exactly chunk_overlap characters.
        let chunker = Chunker::new(1000, 200).unwrap();
        let text: String = ('a'..='z').cycle().take(2500).collect();
        let pieces = chunker.split_text(&text);

        assert_eq!(pieces.len(), 3);
        assert_eq!(pieces[0].len(), 1000);
        assert_eq!(pieces[1].len(), 1000);
        assert_eq!(pieces[2].len(), 900);
        assert_eq!(pieces[0][800..], pieces[1][..200]);
        assert_eq!(pieces[1][800..], pieces[2][..200]);
    }

    #[test]
    fn paragraph_boundary_is_preferred_over_word_boundary() {
        let chunker = Chunker::new(16, 4).unwrap();
        let pieces = chunker.split_text("alpha beta\n\ngamma delta");

        assert_eq!(pieces[0], "alpha beta");
        assert!(pieces.last().unwrap().ends_with("gamma delta"));
    }

    #[test]
    fn word_boundary_keeps_pieces_within_the_size_limit() {
        let chunker = Chunker::new(20, 5).unwrap();
        let text = "one two three four five six seven eight nine ten".to_string();
        let pieces = chunker.split_text(&text);

        assert!(pieces.len() > 1);
        for piece in &pieces {
            assert!(piece.chars().count() <= 20, "oversized piece: {piece:?}");
        }
        assert!(pieces.last().unwrap().ends_with("ten"));
    }

    #[test]
    fn indices_are_contiguous_and_totals_agree() {
        let chunker = Chunker::new(120, 30).unwrap();
        let text = filler(2000);
        let chunks = chunker.chunk(&text, "long.pdf");

        assert!(chunks.len() > 1);
        for (expected_index, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, expected_index);
            assert_eq!(chunk.total_chunks, chunks.len());
        }
    }

    #[test]
    fn three_page_2500_char_text_yields_four_overlapping_chunks() {
        // Paragraph layout chosen so the 2500-character extraction splits at
        // paragraph boundaries: 600 + 600 + 600 + 694 characters.
        let page_1 = {
            let marker = "--- Page 1 ---\n";
            format!("{marker}{}", filler(600 - marker.len()))
        };
        let page_2 = {
            let marker = "--- Page 2 ---\n";
            format!("{marker}{}", filler(600 - marker.len()))
        };
        let middle = filler(600);
        let page_3 = {
            let marker = "--- Page 3 ---\n";
            format!("{marker}{}", filler(694 - marker.len()))
        };
        let text = [page_1, page_2, middle, page_3].join("\n\n");
        assert_eq!(text.len(), 2500);

        let chunker = Chunker::default();
        let chunks = chunker.chunk(&text, "three-pages.pdf");

        assert_eq!(chunks.len(), 4);
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 1000);
            assert_eq!(chunk.total_chunks, 4);
        }
        for pair in chunks.windows(2) {
            let shared = shared_boundary(&pair[0].text, &pair[1].text);
            assert!(
                shared >= 150,
                "expected ~200 shared boundary characters, got {shared}"
            );
        }
    }
}

//! Splitting transcripts into bounded translation requests.
//!
//! A transcript is cut into sentence units on `". "`. Each unit keeps the
//! period that ended it, so units joined with a single space give back the
//! original text, both inside a chunk and across chunk boundaries.
//! Text without that delimiter is one unit.

/// Separator between sentence units.
pub const SENTENCE_DELIMITER: &str = ". ";

/// Sentence units per translation request.
pub const DEFAULT_CHUNK_SIZE: usize = 200;

/// Split `text` into sentence units.
pub fn split_sentences(text: &str) -> Vec<&str> {
    text.split_inclusive(SENTENCE_DELIMITER)
        .map(|unit| match unit.strip_suffix(SENTENCE_DELIMITER) {
            Some(sentence) => &unit[..sentence.len() + 1],
            None => unit,
        })
        .collect()
}

/// Join translated chunk texts back into one body.
pub fn join_chunks<S: AsRef<str>>(chunks: &[S]) -> String {
    chunks
        .iter()
        .map(|c| c.as_ref())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Groups sentence units into chunks of a fixed count.
#[derive(Debug, Clone, Copy)]
pub struct TranscriptChunker {
    chunk_size: usize,
}

impl Default for TranscriptChunker {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl TranscriptChunker {
    /// A chunk size of zero is treated as one.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Chunk texts in transcript order.
    pub fn chunks(&self, text: &str) -> Vec<String> {
        split_sentences(text)
            .chunks(self.chunk_size)
            .map(|units| units.join(" "))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_keeps_terminating_period() {
        assert_eq!(
            split_sentences("Hello. How are you."),
            vec!["Hello.", "How are you."]
        );
    }

    #[test]
    fn test_split_without_delimiter_is_one_unit() {
        assert_eq!(
            split_sentences("नमस्ते। आप कैसे हैं?"),
            vec!["नमस्ते। आप कैसे हैं?"]
        );
        assert_eq!(split_sentences("Dr.Who? yes"), vec!["Dr.Who? yes"]);
    }

    #[test]
    fn test_split_empty() {
        assert!(split_sentences("").is_empty());
    }

    #[test]
    fn test_chunk_size_one() {
        let chunker = TranscriptChunker::new(1);
        assert_eq!(
            chunker.chunks("Hello. How are you."),
            vec!["Hello.".to_string(), "How are you.".to_string()]
        );
    }

    #[test]
    fn test_chunk_groups_by_sentence_count() {
        let chunker = TranscriptChunker::new(2);
        assert_eq!(
            chunker.chunks("One. Two. Three. Four. Five"),
            vec!["One. Two.", "Three. Four.", "Five"]
        );
    }

    #[test]
    fn test_default_chunk_size() {
        let chunker = TranscriptChunker::default();
        assert_eq!(chunker.chunk_size(), 200);

        let text = vec!["Sentence"; 450].join(". ");
        let chunks = chunker.chunks(&text);
        assert_eq!(chunks.len(), 3);
    }

    #[test]
    fn test_zero_chunk_size_is_clamped() {
        assert_eq!(TranscriptChunker::new(0).chunk_size(), 1);
    }

    #[test]
    fn test_chunks_cover_every_unit_once_in_order() {
        let texts = [
            "Hello. How are you.",
            "a. b. c. d. e. f. g",
            "Trailing period. ",
            "Double  spaces.  After. the. dots",
            "no delimiter at all",
            "Ends with delimiter. Then more. ",
        ];

        for text in texts {
            let units = split_sentences(text);
            for size in 1..=units.len().max(1) + 1 {
                let chunks = TranscriptChunker::new(size).chunks(text);
                let rejoined = join_chunks(&chunks);
                let rejoined_units = split_sentences(&rejoined);
                assert_eq!(rejoined_units, units, "text {text:?} size {size}");
            }
        }
    }

    #[test]
    fn test_join_reproduces_text() {
        let text = "First. Second. Third.";
        for size in 1..=3 {
            let chunks = TranscriptChunker::new(size).chunks(text);
            assert_eq!(join_chunks(&chunks), text);
        }
    }
}

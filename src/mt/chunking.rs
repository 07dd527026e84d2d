//! Chunking engine for long content
//!
//! Free providers reject or time out on large payloads, so long text is cut
//! into provider-safe pieces along the most meaningful boundary available:
//! paragraphs (blank lines), then sentences (`.`, `!`, `?` followed by
//! whitespace), then words. A [`ChunkPlan`] remembers which paragraph each
//! chunk came from so the translated pieces can be put back in order.
//!
//! Lengths are measured in characters, not bytes, so Korean and Chinese
//! text is sized the same way as English.

use regex::Regex;
use std::sync::LazyLock;

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("valid paragraph regex"));

static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("valid sentence regex"));

/// Size limits used when planning chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    /// Maximum characters sent to a provider in one call
    pub chunk_size: usize,
    /// Content longer than this is split by paragraph first
    pub long_content_threshold: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            long_content_threshold: 2000,
        }
    }
}

impl ChunkingConfig {
    pub fn is_long(&self, text: &str) -> bool {
        char_len(text) > self.long_content_threshold
    }

    pub fn exceeds_chunk(&self, text: &str) -> bool {
        char_len(text) > self.chunk_size
    }
}

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Chunks grouped by the paragraph they came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPlan {
    paragraphs: Vec<Vec<String>>,
}

impl ChunkPlan {
    /// Paragraph split for long content, a single paragraph otherwise
    pub fn build(content: &str, config: &ChunkingConfig) -> Self {
        if config.is_long(content) {
            Self::by_paragraphs(content, config.chunk_size)
        } else {
            Self::single(content, config.chunk_size)
        }
    }

    /// Always split by paragraph first
    pub fn by_paragraphs(content: &str, chunk_size: usize) -> Self {
        let paragraphs = split_paragraphs(content)
            .into_iter()
            .map(|paragraph| split_into_chunks(paragraph, chunk_size))
            .filter(|chunks| !chunks.is_empty())
            .collect();
        Self { paragraphs }
    }

    /// Treat the whole content as one paragraph
    pub fn single(content: &str, chunk_size: usize) -> Self {
        let chunks = split_into_chunks(content, chunk_size);
        let paragraphs = if chunks.is_empty() {
            Vec::new()
        } else {
            vec![chunks]
        };
        Self { paragraphs }
    }

    /// Every chunk in reading order
    pub fn chunks(&self) -> Vec<&str> {
        self.paragraphs
            .iter()
            .flat_map(|paragraph| paragraph.iter().map(String::as_str))
            .collect()
    }

    pub fn chunk_count(&self) -> usize {
        self.paragraphs.iter().map(Vec::len).sum()
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    /// Put translated chunks back together.
    ///
    /// `translated` is indexed like [`ChunkPlan::chunks`]; a missing index
    /// keeps the original chunk. Chunks within a paragraph are joined with a
    /// space, paragraphs with a blank line.
    pub fn reassemble(&self, translated: &[String]) -> String {
        let mut index = 0;
        let mut paragraphs = Vec::with_capacity(self.paragraphs.len());

        for paragraph in &self.paragraphs {
            let mut pieces = Vec::with_capacity(paragraph.len());
            for original in paragraph {
                let piece = translated
                    .get(index)
                    .map(String::as_str)
                    .unwrap_or(original.as_str());
                pieces.push(piece);
                index += 1;
            }
            paragraphs.push(pieces.join(" "));
        }

        paragraphs.join("\n\n")
    }
}

/// Blank-line separated paragraphs, trimmed, empties dropped
pub fn split_paragraphs(content: &str) -> Vec<&str> {
    PARAGRAPH_BREAK
        .split(content)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Sentences ending at `.`, `!` or `?` followed by whitespace; the
/// punctuation stays with its sentence.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for boundary in SENTENCE_END.find_iter(text) {
        // The terminator is a single ASCII byte
        sentences.push(&text[start..boundary.start() + 1]);
        start = boundary.end();
    }
    sentences.push(&text[start..]);

    sentences
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Pack whole sentences into chunks of at most `max_chars`.
///
/// A sentence longer than `max_chars` is split by words instead; a single
/// word longer than `max_chars` becomes a chunk of its own.
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for sentence in split_sentences(text) {
        if char_len(sentence) > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            chunks.extend(split_words(sentence, max_chars));
            continue;
        }
        pack(&mut chunks, &mut current, sentence, max_chars);
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Pack whitespace-delimited words into chunks of at most `max_chars`
pub fn split_words(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        pack(&mut chunks, &mut current, word, max_chars);
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn pack(chunks: &mut Vec<String>, current: &mut String, piece: &str, max_chars: usize) {
    if !current.is_empty() && char_len(current) + 1 + char_len(piece) > max_chars {
        chunks.push(std::mem::take(current));
    }
    if !current.is_empty() {
        current.push(' ');
    }
    current.push_str(piece);
}

//! Sentence-aware text chunking for course transcripts.
//!
//! Splits raw text into overlapping, size-bounded passages on sentence
//! boundaries, so retrieved chunks never cut a sentence in half.

use crate::error::{KursError, Result};
use regex::Regex;
use std::sync::OnceLock;

/// Matches dotted-uppercase abbreviations like "U.S." or "E.U.".
///
/// A period inside such a token is not a sentence boundary.
fn abbreviation_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(?:[A-Z]\.){2,}$").expect("valid regex"))
}

/// Sentence-based chunker with character size and overlap bounds.
///
/// Chunks are built by greedily packing whole sentences up to `size`
/// characters. Each chunk after the first re-includes the minimal trailing
/// sentence suffix of the previous chunk totaling at least `overlap`
/// characters, so context is not lost at chunk boundaries.
#[derive(Debug, Clone)]
pub struct TextChunker {
    size: usize,
    overlap: usize,
}

impl TextChunker {
    /// Create a chunker, validating that `overlap < size`.
    pub fn new(size: usize, overlap: usize) -> Result<Self> {
        if size == 0 {
            return Err(KursError::Config(
                "chunk size must be greater than zero".to_string(),
            ));
        }
        if overlap >= size {
            return Err(KursError::Config(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                overlap, size
            )));
        }
        Ok(Self { size, overlap })
    }

    /// Maximum chunk length in characters.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Overlap between consecutive chunks in characters.
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split `text` into overlapping chunks of whole sentences.
    ///
    /// Returns an empty vector for empty or whitespace-only input. A single
    /// sentence longer than the chunk size becomes its own chunk, unsplit.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let sentences = split_sentences(text);
        if sentences.is_empty() {
            return Vec::new();
        }

        let mut chunks = Vec::new();
        let mut start = 0;

        while start < sentences.len() {
            // Greedily pack sentences, always taking at least one. Sizes are
            // in characters, not bytes.
            let mut end = start + 1;
            let mut total = sentences[start].chars().count();
            while end < sentences.len() {
                let added = total + 1 + sentences[end].chars().count();
                if added > self.size {
                    break;
                }
                total = added;
                end += 1;
            }

            chunks.push(sentences[start..end].join(" "));

            if end >= sentences.len() {
                break;
            }

            // Carry the minimal sentence suffix totaling >= overlap into the
            // next chunk, while guaranteeing forward progress.
            let carried = self.overlap_suffix_len(&sentences[start..end]);
            start = (end - carried).max(start + 1);
        }

        chunks
    }

    /// Number of trailing sentences whose joined length first reaches the
    /// overlap target. Returns the whole window if it is shorter than that.
    fn overlap_suffix_len(&self, window: &[String]) -> usize {
        if self.overlap == 0 {
            return 0;
        }

        let mut total = 0;
        for (count, sentence) in window.iter().rev().enumerate() {
            if total > 0 {
                total += 1; // joining space
            }
            total += sentence.chars().count();
            if total >= self.overlap {
                return count + 1;
            }
        }
        window.len()
    }
}

/// Split text into trimmed sentences.
///
/// A sentence ends at `.`, `!` or `?` followed by whitespace, unless the
/// period belongs to a dotted-uppercase abbreviation ("U.S."). The exact
/// abbreviation rule is a heuristic; single-letter initials like "J. Smith"
/// do split.
pub fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut sentences = Vec::new();
    let mut sentence_start = 0;

    for i in 0..chars.len() {
        let c = chars[i];
        let terminator = matches!(c, '.' | '!' | '?');
        let at_boundary = terminator
            && chars
                .get(i + 1)
                .map(|next| next.is_whitespace())
                .unwrap_or(false);

        if at_boundary && !(c == '.' && is_abbreviation(&chars, i)) {
            let sentence: String = chars[sentence_start..=i].iter().collect();
            let trimmed = sentence.trim();
            if !trimmed.is_empty() {
                sentences.push(trimmed.to_string());
            }
            sentence_start = i + 1;
        }
    }

    let tail: String = chars[sentence_start..].iter().collect();
    let trimmed = tail.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }

    sentences
}

/// Check whether the period at `index` terminates an abbreviation token.
fn is_abbreviation(chars: &[char], index: usize) -> bool {
    let mut token_start = index;
    while token_start > 0 && !chars[token_start - 1].is_whitespace() {
        token_start -= 1;
    }

    let token: String = chars[token_start..=index].iter().collect();
    abbreviation_pattern().is_match(&token)
}

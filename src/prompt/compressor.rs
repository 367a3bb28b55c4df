//! Context Compressor - bound the transcript to a fixed-size context window
//!
//! The whole transcript is joined in chronological order and only the
//! trailing `budget` characters are kept. No tokenization, no summarizing:
//! a pure suffix slice, so the same snapshot always yields the same context.

use crate::domain::Transcript;

/// Default context window, in characters.
pub const DEFAULT_CONTEXT_BUDGET: usize = 6000;

/// Separator placed between consecutive units.
pub const UNIT_SEPARATOR: &str = "\n\n";

/// Derives a bounded prompt context from a transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextCompressor {
    budget: usize,
}

impl Default for ContextCompressor {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_BUDGET)
    }
}

impl ContextCompressor {
    /// Create a compressor keeping at most `budget` characters.
    pub fn new(budget: usize) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Compress the transcript into at most `budget` characters, keeping the
    /// most recent content.
    pub fn compress(&self, transcript: &Transcript) -> String {
        let full = transcript.contents().collect::<Vec<_>>().join(UNIT_SEPARATOR);
        tail_chars(&full, self.budget).to_string()
    }
}

/// Return the trailing `max` characters of `text` without splitting a
/// code point.
pub fn tail_chars(text: &str, max: usize) -> &str {
    let total = text.chars().count();
    if total <= max {
        return text;
    }
    let skip = total - max;
    // char_indices yields the byte offset of the first kept character
    match text.char_indices().nth(skip) {
        Some((offset, _)) => &text[offset..],
        None => "",
    }
}

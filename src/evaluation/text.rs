//! Tokenization helpers shared by the scoring functions.

use std::collections::HashSet;

/// Characters treated as sentence terminators
pub const SENTENCE_DELIMITERS: [char; 3] = ['.', '!', '?'];

/// Words longer than this count as lexically complex
pub const LONG_WORD_CHARS: usize = 6;

pub fn words(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Lower-cased set of whitespace-separated tokens
pub fn word_set(text: &str) -> HashSet<String> {
    text.split_whitespace().map(|w| w.to_lowercase()).collect()
}

/// Number of non-blank segments between sentence terminators
pub fn sentence_count(text: &str) -> usize {
    text.split(SENTENCE_DELIMITERS)
        .filter(|segment| !segment.trim().is_empty())
        .count()
}

pub fn long_word_fraction(text: &str) -> f64 {
    let words = words(text);
    if words.is_empty() {
        return 0.0;
    }
    let long = words
        .iter()
        .filter(|w| w.chars().count() > LONG_WORD_CHARS)
        .count();
    long as f64 / words.len() as f64
}

/// Words per sentence, 0 when either count is 0
pub fn words_per_sentence(text: &str) -> f64 {
    let words = word_count(text);
    let sentences = sentence_count(text);
    if words == 0 || sentences == 0 {
        return 0.0;
    }
    words as f64 / sentences as f64
}

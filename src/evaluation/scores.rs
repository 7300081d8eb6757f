//! Per-answer quality scores. Every score lands in `[0, 1]`.

use crate::evaluation::keywords::FACTUAL_INDICATORS;
use crate::evaluation::text::{long_word_fraction, sentence_count, word_count, word_set};

/// Sentence length at which the sentence component starts dropping below 1
const IDEAL_SENTENCE_WORDS: f64 = 15.0;
const SENTENCE_PENALTY_SPAN: f64 = 20.0;

fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Uniqueness of `texts[index]` against every other text in the set.
///
/// Overlap with another answer is the share of this answer's distinct words
/// that also appear there. Comparison is by position, so an identical copy
/// still counts as another answer.
pub fn originality<S: AsRef<str>>(index: usize, texts: &[S]) -> f64 {
    let Some(this) = texts.get(index) else {
        return 1.0;
    };
    let this_words = word_set(this.as_ref());
    if this_words.is_empty() || texts.len() < 2 {
        return 1.0;
    }

    let total_overlap: f64 = texts
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index)
        .map(|(_, other)| {
            let other_words = word_set(other.as_ref());
            this_words.intersection(&other_words).count() as f64 / this_words.len() as f64
        })
        .sum();

    clamp_unit(1.0 - total_overlap / (texts.len() - 1) as f64)
}

/// Mean of a sentence-length component and a lexical-complexity component
pub fn readability(text: &str) -> f64 {
    let words = word_count(text);
    let sentences = sentence_count(text);
    if words == 0 || sentences == 0 {
        return 0.0;
    }

    let avg_sentence_len = words as f64 / sentences as f64;
    let sentence_score =
        clamp_unit(1.0 - (avg_sentence_len - IDEAL_SENTENCE_WORDS) / SENTENCE_PENALTY_SPAN);
    let complexity_score = clamp_unit(1.0 - long_word_fraction(text));

    clamp_unit((sentence_score + complexity_score) / 2.0)
}

/// Evidence-phrase occurrences per 100 words, capped at 1
pub fn factuality(text: &str) -> f64 {
    let words = word_count(text);
    if words == 0 {
        return 0.0;
    }

    let lower = text.to_lowercase();
    let hits: usize = FACTUAL_INDICATORS
        .iter()
        .map(|phrase| lower.matches(phrase).count())
        .sum();

    clamp_unit(hits as f64 * 100.0 / words as f64)
}

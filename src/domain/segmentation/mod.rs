//! Deterministic splitting of arbitrary text into chunks that fit a single
//! provider call.

pub mod normalize;

use once_cell::sync::Lazy;
use regex::Regex;

pub use normalize::normalize_text;

/// Sentence-ending punctuation followed by whitespace
static SENTENCE_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?…]+\s+").expect("sentence boundary pattern"));

/// Split `text` into ordered chunks of at most `limit` characters.
///
/// Sentences are accumulated greedily and joined with a single space. A
/// sentence longer than `limit` is cut into `limit`-sized slices without
/// regard for word boundaries. Text that already fits is returned as one
/// chunk, unchanged.
pub fn segment(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);

    if text.chars().count() <= limit {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for sentence in split_sentences(text) {
        let sentence_len = sentence.chars().count();

        if sentence_len > limit {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = sentence.chars().collect();
            for slice in chars.chunks(limit) {
                chunks.push(slice.iter().collect());
            }
            continue;
        }

        if current.is_empty() {
            current.push_str(sentence);
            current_len = sentence_len;
        } else if current_len + 1 + sentence_len <= limit {
            current.push(' ');
            current.push_str(sentence);
            current_len += 1 + sentence_len;
        } else {
            chunks.push(std::mem::replace(&mut current, sentence.to_string()));
            current_len = sentence_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Sentence-like units in input order, surrounding whitespace removed
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut last_end = 0;

    for mat in SENTENCE_BOUNDARY.find_iter(text) {
        let sentence = text[last_end..mat.end()].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        last_end = mat.end();
    }

    let remaining = text[last_end..].trim();
    if !remaining.is_empty() {
        sentences.push(remaining);
    }

    sentences
}

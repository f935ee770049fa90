//! Text codec for secret-question answers.
//!
//! The relational store and the weekly report both render answers as one
//! line per answer, numbered from 1:
//!
//! ```text
//! question1: "first answer"
//! question2: "second answer"
//! ```
//!
//! Decoding collects every double-quoted segment in order, so answers
//! containing `"` do not survive a round trip.

use once_cell::sync::Lazy;
use regex::Regex;

static QUOTED_SEGMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]*)""#).expect("valid quoted segment regex"));

/// Encodes answers into the numbered `questionN: "<answer>"` line format.
pub fn encode_questions<S: AsRef<str>>(answers: &[S]) -> String {
    answers
        .iter()
        .enumerate()
        .map(|(index, answer)| format!("question{}: \"{}\"\n", index + 1, answer.as_ref()))
        .collect()
}

/// Extracts every quoted segment from encoded text, in order.
pub fn decode_questions(encoded: &str) -> Vec<String> {
    QUOTED_SEGMENT_RE
        .captures_iter(encoded)
        .map(|captures| captures[1].to_string())
        .collect()
}

//! Transcript normalization: casing cleanup plus learned word substitutions.

use std::collections::HashMap;

/// Normalize a raw transcript against a correction dictionary.
///
/// The pipeline is deliberately simple and deterministic:
/// 1. lowercase the input,
/// 2. split on whitespace,
/// 3. substitute each token that has a learned correction,
/// 4. rejoin with single spaces,
/// 5. restore sentence-initial capitalization.
///
/// Tokens are looked up verbatim, so punctuation glued to a word
/// (`"milk."`) does not match a bare key (`"milk"`). The dictionary is read
/// only; normalizing never mutates it.
pub fn normalize(raw: &str, corrections: &HashMap<String, String>) -> String {
    let lowered = raw.to_lowercase();

    let replaced: Vec<&str> = lowered
        .split_whitespace()
        .map(|token| {
            corrections
                .get(token)
                .map(String::as_str)
                .unwrap_or(token)
        })
        .collect();

    capitalize_sentences(&replaced.join(" "))
}

/// Uppercase the first letter of the text and any letter that immediately
/// follows sentence-terminal punctuation plus whitespace.
fn capitalize_sentences(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_boundary = true;
    let mut after_terminal = false;

    for ch in text.chars() {
        if ch.is_whitespace() {
            if after_terminal {
                at_boundary = true;
            }
            out.push(ch);
            continue;
        }

        if at_boundary && ch.is_alphabetic() {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }

        at_boundary = false;
        after_terminal = matches!(ch, '.' | '!' | '?');
    }

    out
}

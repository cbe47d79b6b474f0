//! Learning corrections from user-edited transcripts.

use std::sync::Arc;
use tracing::debug;

use crate::store::{CorrectionEntry, CorrectionStore, KeyValueStore};

/// Derive word-level corrections from an edited transcript.
///
/// Both strings are tokenized case-insensitively on whitespace. The
/// alignment is strictly positional: when the token counts differ the edit
/// is ambiguous (words were inserted or removed) and nothing is inferred.
/// When the counts match, every index where the tokens differ yields one
/// entry.
pub fn derive_corrections(original: &str, corrected: &str) -> Vec<CorrectionEntry> {
    let original_tokens: Vec<String> = original
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();
    let corrected_tokens: Vec<String> = corrected
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();

    if original_tokens.len() != corrected_tokens.len() {
        debug!(
            original_tokens = original_tokens.len(),
            corrected_tokens = corrected_tokens.len(),
            "token counts differ, skipping correction learning"
        );
        return Vec::new();
    }

    original_tokens
        .into_iter()
        .zip(corrected_tokens)
        .filter(|(original, corrected)| original != corrected)
        .map(|(original, corrected)| CorrectionEntry {
            misheard: original,
            corrected,
        })
        .collect()
}

/// Applies derived corrections to the shared dictionary.
pub struct CorrectionLearner<S: KeyValueStore> {
    store: Arc<CorrectionStore<S>>,
}

impl<S: KeyValueStore> CorrectionLearner<S> {
    pub fn new(store: Arc<CorrectionStore<S>>) -> Self {
        Self { store }
    }

    /// Diff the user's edit against the original transcript and merge any
    /// derived corrections into the dictionary. Returns how many entries
    /// were learned; an alignment mismatch learns nothing and is not an
    /// error.
    pub async fn learn(&self, original: &str, corrected: &str) -> usize {
        let entries = derive_corrections(original, corrected);
        if entries.is_empty() {
            return 0;
        }
        self.store.upsert_all(entries).await
    }
}

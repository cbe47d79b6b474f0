//! Merging raw recognition events into one running transcript.

/// Accumulates partial and final recognition results into a live transcript.
///
/// The externally visible transcript is always `finalized + pending`:
/// `finalized` only grows within a session, while `pending` is replaced
/// wholesale by each partial hypothesis and cleared when the span it covers
/// is finalized.
#[derive(Debug, Default, Clone)]
pub struct TranscriptAccumulator {
    finalized: String,
    pending: String,
}

impl TranscriptAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the pending hypothesis with a newer partial result.
    pub fn on_partial(&mut self, text: &str) {
        self.pending.clear();
        self.pending.push_str(text);
    }

    /// Fold a finalized span into the transcript and clear the hypothesis.
    ///
    /// Capability output often carries stray whitespace around final chunks;
    /// chunks are trimmed at append time so joins stay single-spaced.
    pub fn on_final(&mut self, text: &str) {
        let chunk = text.trim();
        if !chunk.is_empty() {
            self.finalized.push_str(chunk);
            self.finalized.push(' ');
        }
        self.pending.clear();
    }

    /// The live transcript: everything finalized plus the current hypothesis.
    pub fn live(&self) -> String {
        let mut text = String::with_capacity(self.finalized.len() + self.pending.len());
        text.push_str(&self.finalized);
        text.push_str(&self.pending);
        text
    }

    pub fn is_empty(&self) -> bool {
        self.finalized.trim().is_empty() && self.pending.trim().is_empty()
    }

    /// The session's definitive transcript.
    ///
    /// Normally the trimmed finalized text; when the capability never
    /// finalized anything before ending, the last pending hypothesis is
    /// promoted instead so the utterance is not lost.
    pub fn into_definitive(self) -> String {
        let finalized = self.finalized.trim();
        if finalized.is_empty() {
            self.pending.trim().to_string()
        } else {
            finalized.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partials_then_final() {
        let mut acc = TranscriptAccumulator::new();

        acc.on_partial("one lite");
        assert_eq!(acc.live(), "one lite");

        acc.on_partial("one liter milk");
        assert_eq!(acc.live(), "one liter milk");

        acc.on_final("one liter milk ");
        assert_eq!(acc.live(), "one liter milk ");

        assert_eq!(acc.into_definitive(), "one liter milk");
    }

    #[test]
    fn test_finalized_text_only_grows() {
        let mut acc = TranscriptAccumulator::new();

        acc.on_final("add two");
        let after_first = acc.live();

        acc.on_partial("kilos");
        acc.on_final("kilos of rice");
        let after_second = acc.live();

        assert!(after_second.starts_with(&after_first));
        assert_eq!(acc.into_definitive(), "add two kilos of rice");
    }

    #[test]
    fn test_pending_promoted_when_nothing_finalized() {
        let mut acc = TranscriptAccumulator::new();
        acc.on_partial("half a dozen eggs");
        assert_eq!(acc.into_definitive(), "half a dozen eggs");
    }

    #[test]
    fn test_final_clears_pending() {
        let mut acc = TranscriptAccumulator::new();
        acc.on_partial("two lit");
        acc.on_final("two liters");
        assert_eq!(acc.live(), "two liters ");

        acc.on_partial("of milk");
        assert_eq!(acc.live(), "two liters of milk");
    }

    #[test]
    fn test_empty_final_chunks_ignored() {
        let mut acc = TranscriptAccumulator::new();
        acc.on_final("   ");
        acc.on_final("bread");
        assert_eq!(acc.into_definitive(), "bread");
    }

    #[test]
    fn test_empty_session() {
        let acc = TranscriptAccumulator::new();
        assert!(acc.is_empty());
        assert_eq!(acc.into_definitive(), "");
    }
}

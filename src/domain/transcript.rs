//! Transcript - the append-only log of generated units.
//!
//! Insertion order is chronological order. Units are never reordered,
//! removed or edited, and the log is never empty: the only constructor
//! seeds it with an initial unit.

use chrono::{DateTime, Utc};

use super::ContentUnit;

/// Append-only, non-empty sequence of content units.
#[derive(Debug, Clone)]
pub struct Transcript {
    units: Vec<ContentUnit>,
}

impl Transcript {
    /// Create a transcript holding a single seed unit.
    pub fn seeded(seed: impl Into<String>) -> Self {
        Self {
            units: vec![ContentUnit::seed(seed)],
        }
    }

    /// Append newly generated content stamped with the current time.
    ///
    /// Returns a copy of the appended unit.
    pub fn append(&mut self, content: impl Into<String>) -> ContentUnit {
        self.append_at(content, Utc::now())
    }

    /// Append content with an explicit timestamp.
    ///
    /// The timestamp is clamped to the previous unit's so `created_at`
    /// never decreases even if the wall clock steps backwards.
    pub fn append_at(&mut self, content: impl Into<String>, at: DateTime<Utc>) -> ContentUnit {
        let at = self.last().created_at().max(at);
        let unit = ContentUnit::new(content, at);
        self.units.push(unit.clone());
        unit
    }

    pub fn units(&self) -> &[ContentUnit] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// The most recent unit.
    pub fn last(&self) -> &ContentUnit {
        // Non-empty by construction
        &self.units[self.units.len() - 1]
    }

    /// Iterate over unit contents in chronological order.
    pub fn contents(&self) -> impl Iterator<Item = &str> {
        self.units.iter().map(|u| u.content())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_seeded_is_non_empty() {
        let transcript = Transcript::seeded("boot");
        assert_eq!(transcript.len(), 1);
        assert!(!transcript.is_empty());
        assert!(transcript.last().is_seed());
    }

    #[test]
    fn test_append_grows_by_one() {
        let mut transcript = Transcript::seeded("boot");
        let unit = transcript.append("next");
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.last(), &unit);
        assert_eq!(unit.content(), "next");
    }

    #[test]
    fn test_contents_in_order() {
        let mut transcript = Transcript::seeded("a");
        transcript.append("b");
        transcript.append("c");
        let contents: Vec<&str> = transcript.contents().collect();
        assert_eq!(contents, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_timestamps_never_decrease() {
        let mut transcript = Transcript::seeded("a");
        let seed_time = transcript.last().created_at();
        let earlier = seed_time - Duration::seconds(30);

        let unit = transcript.append_at("b", earlier);
        assert_eq!(unit.created_at(), seed_time);

        transcript.append("c");
        let units = transcript.units();
        for pair in units.windows(2) {
            assert!(pair[0].created_at() <= pair[1].created_at());
        }
    }
}

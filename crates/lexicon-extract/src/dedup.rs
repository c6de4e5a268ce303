//! Collapse normalized entries onto their canonical key and compute counts.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use lexicon_types::{NormalizedEntry, Statistics, canonical_key};
use serde::Serialize;
use tracing::{debug, info};

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct DedupReport {
    pub input_entries: usize,
    pub duplicates_dropped: usize,
}

/// One entry per canonical headword, ordered by document position.
#[derive(Clone, Debug, Default)]
pub struct Lexicon {
    entries: Vec<NormalizedEntry>,
    by_key: HashMap<String, usize>,
}

impl Lexicon {
    /// Deduplicate `entries`; the earliest document line wins each key.
    ///
    /// Conflicts are settled by `(line, arrival index)`, so the result does
    /// not depend on the order entries arrive in unless their lines tie.
    /// Later duplicates are dropped whole; their variants are not merged.
    pub fn build(entries: impl IntoIterator<Item = NormalizedEntry>) -> (Self, DedupReport) {
        let mut report = DedupReport::default();
        let mut kept: HashMap<String, ((usize, usize), NormalizedEntry)> = HashMap::new();

        for (arrival, entry) in entries.into_iter().enumerate() {
            report.input_entries += 1;
            let seq = (entry.line, arrival);
            match kept.entry(entry.canonical_key()) {
                Entry::Vacant(slot) => {
                    slot.insert((seq, entry));
                }
                Entry::Occupied(mut slot) => {
                    report.duplicates_dropped += 1;
                    if seq < slot.get().0 {
                        debug!("line {}: replaces later duplicate {:?}", entry.line, entry.headword);
                        slot.insert((seq, entry));
                    } else {
                        debug!("line {}: duplicate {:?} dropped", entry.line, entry.headword);
                    }
                }
            }
        }

        let mut ordered: Vec<_> = kept.into_values().collect();
        ordered.sort_by_key(|(seq, _)| *seq);
        let entries: Vec<NormalizedEntry> = ordered.into_iter().map(|(_, entry)| entry).collect();
        let by_key = entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| (entry.canonical_key(), idx))
            .collect();

        info!(
            "lexicon built: {} entries, {} duplicates dropped",
            entries.len(),
            report.duplicates_dropped
        );
        (Self { entries, by_key }, report)
    }

    /// Look up an entry by headword, ignoring case and surrounding whitespace.
    pub fn get(&self, headword: &str) -> Option<&NormalizedEntry> {
        self.by_key
            .get(&canonical_key(headword))
            .and_then(|idx| self.entries.get(*idx))
    }

    pub fn entries(&self) -> &[NormalizedEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<NormalizedEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Corpus counts; recomputed from the entries on every call.
    pub fn statistics(&self) -> Statistics {
        let total_entries = self.entries.len();
        let total_variant_count: usize = self.entries.iter().map(|e| e.variants.len()).sum();
        let average_variants_per_entry = if total_entries == 0 {
            0.0
        } else {
            total_variant_count as f64 / total_entries as f64
        };
        Statistics {
            total_entries,
            total_variant_count,
            average_variants_per_entry,
            headwords: self.entries.iter().map(|e| e.headword.clone()).collect(),
            variants: self
                .entries
                .iter()
                .flat_map(|e| e.variants.iter().cloned())
                .collect(),
        }
    }
}

use std::path::Path;
use std::sync::Arc;

use lexicon_extract::artifacts::{self, ArtifactError};
use lexicon_extract::{Lexicon, normalize_all};
use lexicon_types::{NormalizedEntry, Statistics, canonical_key};
use tracing::{info, warn};

/// Read-only lookup structure over a finished lexicon.
#[derive(Debug, Clone)]
pub struct LexiconIndex {
    lexicon: Lexicon,
    /// Canonical keys in sorted order, paired with the entry position.
    sorted_keys: Vec<(String, usize)>,
}

#[derive(Debug)]
pub struct SearchParams<'a> {
    pub prefix: &'a str,
    pub page: usize,
    pub page_size: usize,
}

#[derive(Debug, Clone)]
pub struct SearchResult {
    pub total: usize,
    pub items: Vec<String>,
    pub has_more: bool,
}

impl LexiconIndex {
    /// Index entries read back from a lexicon artifact.
    ///
    /// The artifact is re-normalized on the way in, so a hand-edited file
    /// cannot break the one-entry-per-key guarantee.
    pub fn from_entries(entries: Vec<NormalizedEntry>) -> Arc<Self> {
        let count = entries.len();
        let normalized = normalize_all(entries.into_iter().map(Into::into).collect());
        let (lexicon, dedup) = Lexicon::build(normalized.entries);
        let dropped = normalized.report.entries_dropped() + dedup.duplicates_dropped;
        if dropped > 0 {
            warn!("{dropped} of {count} lexicon entries were invalid or duplicated");
        }

        let mut sorted_keys: Vec<(String, usize)> = lexicon
            .entries()
            .iter()
            .enumerate()
            .map(|(idx, entry)| (entry.canonical_key(), idx))
            .collect();
        sorted_keys.sort();

        info!("total entries indexed: {}", lexicon.len());
        Arc::new(Self {
            lexicon,
            sorted_keys,
        })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Arc<Self>, ArtifactError> {
        let entries = artifacts::read_lexicon(path)?;
        Ok(Self::from_entries(entries))
    }

    pub fn lookup(&self, headword: &str) -> Option<&NormalizedEntry> {
        self.lexicon.get(headword)
    }

    /// Entries whose canonical key starts with the canonical form of `prefix`,
    /// in key order.
    pub fn search(&self, params: SearchParams<'_>) -> SearchResult {
        let prefix = canonical_key(params.prefix);
        let start = self
            .sorted_keys
            .partition_point(|(key, _)| key.as_str() < prefix.as_str());
        let matching = &self.sorted_keys[start..];
        let total = matching
            .iter()
            .take_while(|(key, _)| key.starts_with(&prefix))
            .count();

        let offset = params
            .page
            .saturating_sub(1)
            .saturating_mul(params.page_size);
        let items: Vec<String> = matching[..total]
            .iter()
            .skip(offset)
            .take(params.page_size)
            .filter_map(|(_, idx)| self.lexicon.entries().get(*idx))
            .map(|entry| entry.headword.clone())
            .collect();
        let has_more = offset.saturating_add(items.len()) < total;

        SearchResult {
            total,
            items,
            has_more,
        }
    }

    pub fn statistics(&self) -> Statistics {
        self.lexicon.statistics()
    }

    pub fn len(&self) -> usize {
        self.lexicon.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lexicon.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(headword: &str, variants: &[&str], line: usize) -> NormalizedEntry {
        NormalizedEntry {
            headword: headword.to_string(),
            variants: variants.iter().map(|v| v.to_string()).collect(),
            dialect_tags: Default::default(),
            line,
        }
    }

    fn make_index() -> Arc<LexiconIndex> {
        LexiconIndex::from_entries(vec![
            entry("merci", &["lapia", "oyo"], 1),
            entry("Maison", &["kujè"], 2),
            entry("mère", &["ko"], 3),
            entry("bonjour", &["mbô"], 4),
            entry("mer", &["baa"], 5),
        ])
    }

    fn search(index: &LexiconIndex, prefix: &str, page: usize, page_size: usize) -> SearchResult {
        index.search(SearchParams {
            prefix,
            page,
            page_size,
        })
    }

    #[test]
    fn lookup_ignores_case() {
        let index = make_index();
        assert_eq!(index.lookup(" MAISON").unwrap().headword, "Maison");
        assert!(index.lookup("maisons").is_none());
    }

    #[test]
    fn prefix_search_in_key_order() {
        let index = make_index();
        let result = search(&index, "Me", 1, 10);
        assert_eq!(result.total, 2);
        assert_eq!(result.items, vec!["mer", "merci"]);
        assert!(!result.has_more);

        // Accented letters are distinct from their base letter.
        let result = search(&index, "MÈ", 1, 10);
        assert_eq!(result.items, vec!["mère"]);

        let result = search(&index, "m", 1, 10);
        assert_eq!(result.items, vec!["Maison", "mer", "merci", "mère"]);
    }

    #[test]
    fn paginates_stably() {
        let index = make_index();
        let first = search(&index, "m", 1, 2);
        let second = search(&index, "m", 2, 2);
        assert_eq!(first.total, 4);
        assert!(first.has_more);
        assert_eq!(second.items.len(), 2);
        assert!(!second.has_more);
        assert!(first.items.iter().all(|w| !second.items.contains(w)));

        let past_end = search(&index, "m", 9, 2);
        assert!(past_end.items.is_empty());
        assert_eq!(past_end.total, 4);
    }

    #[test]
    fn reloading_drops_duplicates_and_invalid_entries() {
        let index = LexiconIndex::from_entries(vec![
            entry("merci", &["lapia"], 1),
            entry("Merci", &["oyo"], 2),
            entry("  ", &["x"], 3),
        ]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.lookup("merci").unwrap().primary(), "lapia");
    }
}

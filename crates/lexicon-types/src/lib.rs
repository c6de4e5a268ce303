//! Shared record types for turning a bilingual dictionary dump into a lexicon.
//!
//! Each pipeline stage owns exactly one of these shapes: pages come from the
//! text extractor, [`LexiconSection`]s from the segmenter, [`RawEntry`]s from
//! the line parser, and [`NormalizedEntry`]s from the normalizer. The
//! [`Statistics`] record is a read-only projection of a finished lexicon.
//!
//! Variant order is significant everywhere: `variants[0]` is the primary
//! translation and the rest are alternates.
//!
//! ```rust
//! use lexicon_types::{SectionName, canonical_key};
//!
//! assert_eq!(SectionName::from_key("french_sara"), Some(SectionName::FrenchSara));
//! assert_eq!(canonical_key("  Merci "), "merci");
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One page of extracted text, as produced by the PDF text extractor.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RawPage {
    #[serde(alias = "page_num")]
    pub page_number: u32,
    pub text: String,
}

/// Translation direction a section of the dictionary covers.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionName {
    FrenchSara,
    EnglishSara,
}

impl SectionName {
    pub const ALL: [SectionName; 2] = [SectionName::FrenchSara, SectionName::EnglishSara];

    /// Parse the snake_case key used in configuration and artifacts.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "french_sara" => Some(SectionName::FrenchSara),
            "english_sara" => Some(SectionName::EnglishSara),
            _ => None,
        }
    }

    pub fn as_key(self) -> &'static str {
        match self {
            SectionName::FrenchSara => "french_sara",
            SectionName::EnglishSara => "english_sara",
        }
    }
}

impl fmt::Display for SectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SectionName::FrenchSara => "Français-Sara",
            SectionName::EnglishSara => "English-Sara",
        })
    }
}

/// Slice of the concatenated document belonging to one direction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LexiconSection {
    pub name: SectionName,
    pub text: String,
    /// 1-based document line on which the section starts.
    pub start_line: usize,
}

/// Headword plus the translations collected for it, before any cleaning.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct RawEntry {
    pub headword: String,
    pub variants: Vec<String>,
    /// Dialect code a variant was tagged with, keyed by variant text.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dialect_tags: BTreeMap<String, String>,
    /// 1-based document line the entry was emitted from; orders duplicates.
    #[serde(default)]
    pub line: usize,
}

/// An entry that passed cleaning and bounds validation.
///
/// Invariants: headword is 1..=300 chars, `variants` is non-empty, each
/// variant is 1..=150 chars, and no variant string repeats.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEntry {
    pub headword: String,
    pub variants: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dialect_tags: BTreeMap<String, String>,
    #[serde(default)]
    pub line: usize,
}

impl NormalizedEntry {
    /// The translation consumers treat as authoritative.
    pub fn primary(&self) -> &str {
        self.variants.first().map(String::as_str).unwrap_or("")
    }

    pub fn alternates(&self) -> &[String] {
        self.variants.get(1..).unwrap_or(&[])
    }

    pub fn canonical_key(&self) -> String {
        canonical_key(&self.headword)
    }
}

impl From<NormalizedEntry> for RawEntry {
    fn from(entry: NormalizedEntry) -> Self {
        RawEntry {
            headword: entry.headword,
            variants: entry.variants,
            dialect_tags: entry.dialect_tags,
            line: entry.line,
        }
    }
}

/// Corpus-level counts over a finished lexicon.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_entries: usize,
    pub total_variant_count: usize,
    pub average_variants_per_entry: f64,
    pub headwords: Vec<String>,
    pub variants: Vec<String>,
}

/// Key used to detect duplicate headwords: trimmed and lower-cased.
pub fn canonical_key(headword: &str) -> String {
    headword.trim().to_lowercase()
}

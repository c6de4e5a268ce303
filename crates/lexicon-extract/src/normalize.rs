//! Field cleaning and bounds validation for raw entries.
//!
//! Cleaning is applied to a fixpoint, so normalizing an already normalized
//! entry returns it unchanged.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use lexicon_types::{NormalizedEntry, RawEntry};
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use unicode_normalization::UnicodeNormalization;

pub const HEADWORD_MAX_CHARS: usize = 300;
pub const VARIANT_MAX_CHARS: usize = 150;

static PAGE_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\d+\s+)+").expect("page marker pattern compiles"));

/// Why a whole entry was discarded.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum Rejection {
    #[error("headword is empty after cleaning")]
    EmptyHeadword,
    #[error("headword has {0} chars, over the limit")]
    HeadwordTooLong(usize),
    #[error("no variant survived cleaning")]
    NoVariants,
}

/// A kept entry plus how many of its variants were dropped on the way.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Cleaned {
    pub entry: NormalizedEntry,
    pub dropped_variants: usize,
    pub duplicate_variants: usize,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct NormalizeReport {
    pub input_entries: usize,
    pub kept: usize,
    pub rejected_empty_headword: usize,
    pub rejected_long_headword: usize,
    pub rejected_no_variants: usize,
    /// Variants removed for being empty or too long.
    pub dropped_variants: usize,
    /// Variants that collapsed onto an earlier one after cleaning.
    pub duplicate_variants: usize,
}

impl NormalizeReport {
    pub fn entries_dropped(&self) -> usize {
        self.rejected_empty_headword + self.rejected_long_headword + self.rejected_no_variants
    }

    fn record(&mut self, rejection: Rejection) {
        match rejection {
            Rejection::EmptyHeadword => self.rejected_empty_headword += 1,
            Rejection::HeadwordTooLong(_) => self.rejected_long_headword += 1,
            Rejection::NoVariants => self.rejected_no_variants += 1,
        }
    }
}

#[derive(Debug, Default)]
pub struct NormalizeOutput {
    pub entries: Vec<NormalizedEntry>,
    pub report: NormalizeReport,
}

/// Drop control characters, NFC-compose and collapse whitespace runs.
///
/// Control characters go first: one left between a letter and its
/// combining mark would otherwise block composition.
pub fn clean_text(text: &str) -> String {
    let filtered: String = text
        .chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .collect();
    let composed: String = filtered.nfc().collect();
    composed.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Apply `step` after [`clean_text`] until the text stops changing.
fn clean_to_fixpoint(raw: &str, step: impl Fn(&str) -> String) -> String {
    let mut current = clean_text(raw);
    loop {
        let next = clean_text(&step(&current));
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Clean a headword: also strips leading page numbers and `, : ; . ( )` at
/// either end.
pub fn normalize_headword(raw: &str) -> String {
    clean_to_fixpoint(raw, |text| {
        let trimmed = text.trim_matches(|c: char| c.is_whitespace() || ",:;.()".contains(c));
        PAGE_MARKER_RE.replace(trimmed, "").into_owned()
    })
}

/// Clean a variant: strips `, : ;` at either end.
pub fn normalize_variant(raw: &str) -> String {
    clean_to_fixpoint(raw, |text| {
        text.trim_matches(|c: char| c.is_whitespace() || ",:;".contains(c))
            .to_string()
    })
}

/// Clean every field of `raw` and validate the result.
pub fn normalize_entry(raw: &RawEntry) -> Result<Cleaned, Rejection> {
    let headword = normalize_headword(&raw.headword);
    let headword_len = headword.chars().count();
    if headword_len == 0 {
        return Err(Rejection::EmptyHeadword);
    }
    if headword_len > HEADWORD_MAX_CHARS {
        return Err(Rejection::HeadwordTooLong(headword_len));
    }

    let mut variants: Vec<String> = Vec::with_capacity(raw.variants.len());
    let mut dialect_tags = BTreeMap::new();
    let mut dropped_variants = 0;
    let mut duplicate_variants = 0;
    for original in &raw.variants {
        let variant = normalize_variant(original);
        if !(1..=VARIANT_MAX_CHARS).contains(&variant.chars().count()) {
            dropped_variants += 1;
            continue;
        }
        if variants.contains(&variant) {
            duplicate_variants += 1;
            continue;
        }
        if let Some(code) = raw.dialect_tags.get(original) {
            dialect_tags.insert(variant.clone(), code.clone());
        }
        variants.push(variant);
    }
    if variants.is_empty() {
        return Err(Rejection::NoVariants);
    }

    Ok(Cleaned {
        entry: NormalizedEntry {
            headword,
            variants,
            dialect_tags,
            line: raw.line,
        },
        dropped_variants,
        duplicate_variants,
    })
}

/// Convenience wrapper discarding the drop counts.
pub fn normalize(raw: &RawEntry) -> Option<NormalizedEntry> {
    normalize_entry(raw).ok().map(|cleaned| cleaned.entry)
}

/// Normalize a whole stream, preserving order and counting every drop.
pub fn normalize_all(raw: Vec<RawEntry>) -> NormalizeOutput {
    let mut out = NormalizeOutput::default();
    out.report.input_entries = raw.len();
    for entry in raw {
        match normalize_entry(&entry) {
            Ok(cleaned) => {
                out.report.dropped_variants += cleaned.dropped_variants;
                out.report.duplicate_variants += cleaned.duplicate_variants;
                out.entries.push(cleaned.entry);
            }
            Err(rejection) => {
                debug!("line {}: dropped {:?}: {rejection}", entry.line, entry.headword);
                out.report.record(rejection);
            }
        }
    }
    out.report.kept = out.entries.len();
    info!(
        "normalized {} entries: {} kept, {} dropped, {} variants dropped",
        out.report.input_entries,
        out.report.kept,
        out.report.entries_dropped(),
        out.report.dropped_variants
    );
    out
}

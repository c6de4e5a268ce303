//! Locate per-direction sections inside the concatenated page text.

use lexicon_types::{LexiconSection, RawPage, SectionName};
use tracing::{info, warn};

use crate::config::SectionSpec;

/// Separator placed between consecutive pages.
pub const PAGE_SEPARATOR: &str = "\n\n";

/// Sections found in a document plus the configured ones that were not.
#[derive(Clone, Debug, Default)]
pub struct Segmentation {
    pub sections: Vec<LexiconSection>,
    pub missing: Vec<SectionName>,
}

impl Segmentation {
    pub fn section(&self, name: SectionName) -> Option<&LexiconSection> {
        self.sections.iter().find(|s| s.name == name)
    }
}

struct Located<'a> {
    spec: &'a SectionSpec,
    start: usize,
    marker_len: usize,
}

/// Join pages in page-number order, whatever order they arrive in.
pub fn concat_pages(pages: &[RawPage]) -> String {
    let mut ordered: Vec<&RawPage> = pages.iter().collect();
    ordered.sort_by_key(|p| p.page_number);
    ordered
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join(PAGE_SEPARATOR)
}

/// Slice `text` into sections.
///
/// A section starts at the earliest occurrence of any of its markers (marker
/// preference only breaks ties at the same offset) and runs to the start of
/// the next located section, its own end marker, or the end of the text,
/// whichever comes first.
pub fn segment(text: &str, specs: &[SectionSpec]) -> Segmentation {
    let mut located = Vec::new();
    let mut missing = Vec::new();

    for spec in specs {
        let found = spec
            .start_markers
            .iter()
            .enumerate()
            .filter(|(_, marker)| !marker.is_empty())
            .filter_map(|(pref, marker)| text.find(marker.as_str()).map(|at| (at, pref, marker.len())))
            .min();
        match found {
            Some((start, _, marker_len)) => located.push(Located {
                spec,
                start,
                marker_len,
            }),
            None => {
                warn!("section {} not found; nothing to parse for it", spec.name);
                missing.push(spec.name);
            }
        }
    }

    located.sort_by_key(|l| l.start);

    let mut sections = Vec::with_capacity(located.len());
    for (idx, loc) in located.iter().enumerate() {
        let mut end = located[idx + 1..]
            .iter()
            .map(|next| next.start)
            .find(|next_start| *next_start > loc.start)
            .unwrap_or(text.len());
        if let Some(end_marker) = loc.spec.end_marker.as_deref().filter(|m| !m.is_empty()) {
            let body_start = loc.start + loc.marker_len;
            if let Some(rel) = text[body_start.min(end)..end].find(end_marker) {
                end = body_start.min(end) + rel;
            }
        }

        let slice = &text[loc.start..end];
        info!("section {} found ({} chars)", loc.spec.name, slice.chars().count());
        sections.push(LexiconSection {
            name: loc.spec.name,
            text: slice.to_string(),
            start_line: line_number_at(text, loc.start),
        });
    }

    Segmentation { sections, missing }
}

fn line_number_at(text: &str, offset: usize) -> usize {
    text[..offset].bytes().filter(|b| *b == b'\n').count() + 1
}

//! Segment → parse → normalize → deduplicate, with one report for the run.

use lexicon_types::{RawEntry, RawPage, SectionName, Statistics};
use serde::Serialize;
use tracing::{info, warn};

use crate::artifacts::ReadReport;
use crate::config::{ConfigError, ExtractConfig};
use crate::dedup::{DedupReport, Lexicon};
use crate::normalize::{NormalizeReport, normalize_all};
use crate::parse::{EntryParser, ParseReport};
use crate::segment::{Segmentation, concat_pages, segment};

/// Counts for a whole run; every discarded line or entry shows up here.
#[derive(Clone, Debug, Default, Serialize)]
pub struct RunReport {
    pub missing_sections: Vec<SectionName>,
    /// Rows skipped while reading a raw entries file; empty for runs from pages.
    pub read: ReadReport,
    pub parse: ParseReport,
    pub normalize: NormalizeReport,
    pub dedup: DedupReport,
    pub entries_produced: usize,
}

impl RunReport {
    pub fn lines_skipped(&self) -> usize {
        self.parse.lines_skipped()
    }

    /// Entries removed on read, by validation or as duplicates.
    pub fn entries_dropped(&self) -> usize {
        self.read.rows_dropped() + self.normalize.entries_dropped() + self.dedup.duplicates_dropped
    }

    pub fn log_summary(&self) {
        for name in &self.missing_sections {
            warn!("section {name} was missing from the source");
        }
        info!(
            "{} entries produced, {} lines skipped, {} entries dropped \
             ({} on read, {} by validation, {} duplicates)",
            self.entries_produced,
            self.lines_skipped(),
            self.entries_dropped(),
            self.read.rows_dropped(),
            self.normalize.entries_dropped(),
            self.dedup.duplicates_dropped
        );
    }
}

/// Output of the segment and parse stages.
#[derive(Debug)]
pub struct Extraction {
    pub segmentation: Segmentation,
    pub raw_entries: Vec<RawEntry>,
    pub report: ParseReport,
}

/// Output of the normalize and dedup stages.
#[derive(Debug)]
pub struct Refinement {
    pub lexicon: Lexicon,
    pub normalize: NormalizeReport,
    pub dedup: DedupReport,
}

impl Refinement {
    pub fn statistics(&self) -> Statistics {
        self.lexicon.statistics()
    }
}

#[derive(Debug)]
pub struct PipelineOutput {
    pub extraction: Extraction,
    pub refinement: Refinement,
    pub report: RunReport,
}

#[derive(Clone, Debug)]
pub struct Pipeline {
    config: ExtractConfig,
    parser: EntryParser,
}

impl Pipeline {
    pub fn new(config: ExtractConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let parser = EntryParser::from_config(&config)?;
        Ok(Self { config, parser })
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// Slice the pages into sections and parse each one in document order.
    pub fn extract(&self, pages: &[RawPage]) -> Extraction {
        let text = concat_pages(pages);
        let segmentation = segment(&text, &self.config.sections);
        let mut raw_entries = Vec::new();
        let mut report = ParseReport::default();
        for section in &segmentation.sections {
            let out = self.parser.parse_section(section);
            report.absorb(&out.report);
            raw_entries.extend(out.entries);
        }
        info!(
            "extracted {} raw entries from {} pages",
            raw_entries.len(),
            pages.len()
        );
        Extraction {
            segmentation,
            raw_entries,
            report,
        }
    }

    /// Clean, validate and deduplicate raw entries.
    pub fn refine(raw_entries: Vec<RawEntry>) -> Refinement {
        let normalized = normalize_all(raw_entries);
        let (lexicon, dedup) = Lexicon::build(normalized.entries);
        Refinement {
            lexicon,
            normalize: normalized.report,
            dedup,
        }
    }

    pub fn run(&self, pages: &[RawPage]) -> PipelineOutput {
        let extraction = self.extract(pages);
        let refinement = Self::refine(extraction.raw_entries.clone());
        let report = RunReport {
            missing_sections: extraction.segmentation.missing.clone(),
            read: ReadReport::default(),
            parse: extraction.report.clone(),
            normalize: refinement.normalize.clone(),
            dedup: refinement.dedup.clone(),
            entries_produced: refinement.lexicon.len(),
        };
        PipelineOutput {
            extraction,
            refinement,
            report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(page_number: u32, text: &str) -> RawPage {
        RawPage {
            page_number,
            text: text.to_string(),
        }
    }

    #[test]
    fn absent_section_is_empty_input() {
        let pipeline = Pipeline::new(ExtractConfig::default()).unwrap();
        let output = pipeline.run(&[page(1, "no lexicon in this document")]);
        assert!(output.extraction.raw_entries.is_empty());
        assert!(output.refinement.lexicon.is_empty());
        assert_eq!(output.report.missing_sections.len(), 2);
        assert_eq!(output.report.entries_produced, 0);
    }

    #[test]
    fn duplicate_headwords_keep_first() {
        let pipeline = Pipeline::new(ExtractConfig::default()).unwrap();
        let output = pipeline.run(&[
            page(1, "Lexique Français\nmerci | lapia"),
            page(2, "Merci | oyo\nbonjour | mbô"),
        ]);
        let lexicon = &output.refinement.lexicon;
        assert_eq!(lexicon.len(), 2);
        assert_eq!(lexicon.get("merci").unwrap().variants, vec!["lapia"]);
        assert_eq!(output.report.dedup.duplicates_dropped, 1);
        assert_eq!(output.report.entries_dropped(), 1);
    }

    #[test]
    fn rows_skipped_on_read_count_as_dropped() {
        let report = RunReport {
            read: ReadReport {
                rows: 5,
                blank_rows: 1,
                repeated_inputs: 2,
            },
            ..RunReport::default()
        };
        assert_eq!(report.entries_dropped(), 3);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = ExtractConfig {
            dialect_codes: Vec::new(),
            ..ExtractConfig::default()
        };
        assert!(Pipeline::new(config).is_err());
    }
}

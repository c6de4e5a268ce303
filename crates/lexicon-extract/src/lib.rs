//! Recover a structured bilingual lexicon from an unstructured text dump.
//!
//! The pipeline runs strictly forward over in-memory text:
//!
//! 1. [`segment`](mod@segment) slices the concatenated pages into one section per
//!    translation direction;
//! 2. [`parse`](mod@parse) scans each section line by line into raw entries;
//! 3. [`normalize`](mod@normalize) cleans and validates every field;
//! 4. [`dedup`](mod@dedup) keeps the first entry per canonical headword and computes
//!    corpus statistics.
//!
//! Malformed input never fails a run. Lines and entries that cannot be used
//! are counted in the stage reports, gathered in [`RunReport`]; only artifact
//! I/O ([`ArtifactError`]) and configuration ([`ConfigError`]) are errors.
//!
//! # Example
//! ```
//! use lexicon_extract::{ExtractConfig, Pipeline};
//! use lexicon_types::RawPage;
//!
//! let pipeline = Pipeline::new(ExtractConfig::default()).unwrap();
//! let pages = vec![RawPage {
//!     page_number: 1,
//!     text: "Lexique Français\nBeb=mbô : Bd=rû bonjour\npère | ba | baba".into(),
//! }];
//! let output = pipeline.run(&pages);
//! let bonjour = output.refinement.lexicon.get("bonjour").unwrap();
//! assert_eq!(bonjour.variants, vec!["mbô", "rû"]);
//! assert_eq!(output.report.entries_produced, 2);
//! ```
//!
//! For a runnable demo, see `cargo run -p lexicon-extract --example parse_text -- <file>`.

pub mod artifacts;
pub mod config;
pub mod dedup;
pub mod normalize;
pub mod parse;
pub mod pipeline;
pub mod segment;

pub use artifacts::{ArtifactError, ReadReport};
pub use config::{ConfigError, ExtractConfig, SectionSpec};
pub use dedup::{DedupReport, Lexicon};
pub use normalize::{NormalizeReport, normalize, normalize_all};
pub use parse::{EntryParser, LineKind, ParseOutput, ParseReport};
pub use pipeline::{Extraction, Pipeline, PipelineOutput, Refinement, RunReport};
pub use segment::{Segmentation, concat_pages, segment};

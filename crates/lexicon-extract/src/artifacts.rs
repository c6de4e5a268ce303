//! JSON artifacts exchanged between pipeline runs.
//!
//! Reading or writing these files is the only fatal failure in a run; every
//! error names the path involved.

use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use lexicon_types::{NormalizedEntry, RawEntry, RawPage};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::SectionSpec;
use crate::segment::Segmentation;

pub const SECTIONS_FILE: &str = "sections.json";
pub const RAW_ENTRIES_FILE: &str = "raw_entries.json";
pub const LEXICON_FILE: &str = "lexicon.json";
pub const STATISTICS_FILE: &str = "statistics.json";
pub const REPORT_FILE: &str = "report.json";

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to encode {path}: {source}")]
    Encode {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Accepted shapes for re-normalization input.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawRecord {
    Entry(RawEntry),
    Example(TrainingExample),
}

/// `{instruction, input, output}` rows: input is the headword, output a
/// single translation.
#[derive(Deserialize)]
struct TrainingExample {
    input: String,
    output: String,
}

pub fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, ArtifactError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| ArtifactError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| ArtifactError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Pretty-printed UTF-8 JSON; non-ASCII text is written as-is.
pub fn write_json<T: Serialize + ?Sized>(
    path: impl AsRef<Path>,
    value: &T,
) -> Result<(), ArtifactError> {
    let path = path.as_ref();
    let write_err = |source| ArtifactError::Write {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(write_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|source| ArtifactError::Encode {
        path: path.to_path_buf(),
        source,
    })?;
    writer.write_all(b"\n").map_err(write_err)?;
    writer.flush().map_err(write_err)?;
    info!("wrote {}", path.display());
    Ok(())
}

/// Rows of a raw entries file that were skipped on read.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ReadReport {
    pub rows: usize,
    /// Training rows with an empty input or output.
    pub blank_rows: usize,
    /// Training rows repeating an earlier input.
    pub repeated_inputs: usize,
}

impl ReadReport {
    pub fn rows_dropped(&self) -> usize {
        self.blank_rows + self.repeated_inputs
    }
}

pub fn read_pages(path: impl AsRef<Path>) -> Result<Vec<RawPage>, ArtifactError> {
    read_json(path)
}

/// Read raw entries in either accepted shape, in file order.
///
/// Entries without a line number are numbered by position. Training rows
/// with a blank side are skipped and a repeated input keeps its first row;
/// both are counted in the returned [`ReadReport`].
pub fn read_raw_entries(
    path: impl AsRef<Path>,
) -> Result<(Vec<RawEntry>, ReadReport), ArtifactError> {
    let path = path.as_ref();
    let records: Vec<RawRecord> = read_json(path)?;
    let mut report = ReadReport {
        rows: records.len(),
        ..ReadReport::default()
    };
    let mut seen_inputs = HashSet::new();
    let mut entries = Vec::with_capacity(records.len());
    for (idx, record) in records.into_iter().enumerate() {
        let mut entry = match record {
            RawRecord::Entry(entry) => entry,
            RawRecord::Example(example) => {
                let input = example.input.trim();
                let output = example.output.trim();
                if input.is_empty() || output.is_empty() {
                    report.blank_rows += 1;
                    debug!("row {}: blank training row skipped", idx + 1);
                    continue;
                }
                if !seen_inputs.insert(input.to_string()) {
                    report.repeated_inputs += 1;
                    debug!("row {}: repeated input {input:?} skipped", idx + 1);
                    continue;
                }
                RawEntry {
                    headword: input.to_string(),
                    variants: vec![output.to_string()],
                    ..RawEntry::default()
                }
            }
        };
        if entry.line == 0 {
            entry.line = idx + 1;
        }
        entries.push(entry);
    }
    if report.rows_dropped() > 0 {
        info!(
            "{}: {} of {} rows skipped",
            path.display(),
            report.rows_dropped(),
            report.rows
        );
    }
    Ok((entries, report))
}

pub fn read_lexicon(path: impl AsRef<Path>) -> Result<Vec<NormalizedEntry>, ArtifactError> {
    read_json(path)
}

/// Section texts keyed by direction, `None` for directions not found.
pub fn sections_document(
    segmentation: &Segmentation,
    specs: &[SectionSpec],
) -> BTreeMap<&'static str, Option<String>> {
    specs
        .iter()
        .map(|spec| {
            (
                spec.name.as_key(),
                segmentation.section(spec.name).map(|s| s.text.clone()),
            )
        })
        .collect()
}

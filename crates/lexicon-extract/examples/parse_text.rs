use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use lexicon_extract::{EntryParser, ExtractConfig, normalize_all};

fn main() -> Result<()> {
    let path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: cargo run -p lexicon-extract --example parse_text -- <text-file>")?;

    let text = fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    let parser = EntryParser::from_config(&ExtractConfig::default())
        .context("building parser from default config")?;

    // The whole file is treated as a single section.
    let parsed = parser.parse_text(&text, 1);
    let normalized = normalize_all(parsed.entries);

    for entry in &normalized.entries {
        let tagged: Vec<String> = entry
            .variants
            .iter()
            .map(|v| match entry.dialect_tags.get(v) {
                Some(code) => format!("{v} [{code}]"),
                None => v.clone(),
            })
            .collect();
        println!("{:>5}  {}  =>  {}", entry.line, entry.headword, tagged.join(", "));
    }

    let report = &parsed.report;
    println!();
    println!("Lines        : {}", report.lines);
    println!("Entries      : {}", normalized.entries.len());
    println!("Noise lines  : {}", report.noise_lines);
    println!("Unrecognized : {}", report.unrecognized_lines);
    println!("Orphan headwords: {}", report.orphan_headwords);
    println!("Orphan variants : {}", report.orphan_variants);
    println!(
        "Dropped by validation: {}",
        normalized.report.entries_dropped()
    );

    Ok(())
}

use std::path::PathBuf;

use lexicon_extract::artifacts::{self, LEXICON_FILE, RAW_ENTRIES_FILE, SECTIONS_FILE};
use lexicon_extract::{ExtractConfig, Pipeline};
use lexicon_types::{RawEntry, RawPage, SectionName};

fn fixture_pages() -> Vec<RawPage> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("pages.json");
    artifacts::read_pages(path).expect("load fixture pages")
}

fn pipeline() -> Pipeline {
    Pipeline::new(ExtractConfig::default()).expect("default config is valid")
}

#[test]
fn sections_start_at_their_markers() {
    let output = pipeline().run(&fixture_pages());
    let seg = &output.extraction.segmentation;
    assert!(seg.missing.is_empty());

    let french = seg.section(SectionName::FrenchSara).expect("french section");
    assert_eq!(french.start_line, 5);
    assert!(french.text.starts_with("Lexique\nFrançais"));
    assert!(!french.text.contains("English"));

    let english = seg.section(SectionName::EnglishSara).expect("english section");
    assert_eq!(english.start_line, 22);
    assert!(english.text.ends_with("Beb=mbô"));
}

#[test]
fn raw_entries_follow_document_order() {
    let output = pipeline().run(&fixture_pages());
    let raw: Vec<(&str, usize)> = output
        .extraction
        .raw_entries
        .iter()
        .map(|e| (e.headword.as_str(), e.line))
        .collect();
    assert_eq!(
        raw,
        vec![
            ("au revoir", 8),
            ("bonjour", 10),
            ("père", 11),
            ("merci", 12),
            ("maison", 18),
            ("12 eau", 19),
            ("Merci", 20),
            ("thank you", 25),
            ("hello", 26),
        ]
    );
    let bonjour = &output.extraction.raw_entries[1];
    assert_eq!(bonjour.variants, vec!["mbô", "rû"]);
    assert_eq!(bonjour.dialect_tags.get("rû").map(String::as_str), Some("Bd"));
}

#[test]
fn lexicon_is_cleaned_and_deduplicated() {
    let output = pipeline().run(&fixture_pages());
    let lexicon = &output.refinement.lexicon;

    let headwords: Vec<&str> = lexicon.entries().iter().map(|e| e.headword.as_str()).collect();
    assert_eq!(
        headwords,
        vec!["au revoir", "bonjour", "père", "merci", "maison", "eau", "thank you", "hello"]
    );
    assert_eq!(lexicon.get("MERCI").unwrap().variants, vec!["lapia", "oyo"]);
    assert_eq!(lexicon.get("maison").unwrap().variants, vec!["kujè", "kuje"]);
    assert_eq!(lexicon.get("hello").unwrap().primary(), "mbô");

    let stats = output.refinement.statistics();
    assert_eq!(stats.total_entries, 8);
    assert_eq!(stats.total_variant_count, 12);
    assert!((stats.average_variants_per_entry - 1.5).abs() < f64::EPSILON);
}

#[test]
fn report_accounts_for_every_skipped_line() {
    let report = pipeline().run(&fixture_pages()).report;
    assert_eq!(report.parse.lines, 23);
    assert_eq!(report.parse.noise_lines, 7);
    assert_eq!(report.parse.blank_lines, 2);
    assert_eq!(report.parse.unrecognized_lines, 1);
    assert_eq!(report.lines_skipped(), 8);
    assert_eq!(report.normalize.kept, 9);
    assert_eq!(report.dedup.duplicates_dropped, 1);
    assert_eq!(report.entries_dropped(), 1);
    assert_eq!(report.entries_produced, 8);
}

#[test]
fn page_order_does_not_matter() {
    let mut pages = fixture_pages();
    let forward = pipeline().run(&pages);
    pages.reverse();
    let backward = pipeline().run(&pages);
    assert_eq!(
        forward.refinement.lexicon.entries(),
        backward.refinement.lexicon.entries()
    );
}

#[test]
fn refining_written_artifacts_reproduces_the_lexicon() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = ExtractConfig::default();
    let output = pipeline().run(&fixture_pages());

    let sections = artifacts::sections_document(&output.extraction.segmentation, &config.sections);
    artifacts::write_json(dir.path().join(SECTIONS_FILE), &sections).expect("write sections");
    artifacts::write_json(dir.path().join(RAW_ENTRIES_FILE), &output.extraction.raw_entries)
        .expect("write raw entries");
    artifacts::write_json(dir.path().join(LEXICON_FILE), output.refinement.lexicon.entries())
        .expect("write lexicon");

    let (raw, read) =
        artifacts::read_raw_entries(dir.path().join(RAW_ENTRIES_FILE)).expect("read raw");
    assert_eq!(read.rows, output.extraction.raw_entries.len());
    assert_eq!(read.rows_dropped(), 0);
    let again = Pipeline::refine(raw);
    assert_eq!(again.lexicon.entries(), output.refinement.lexicon.entries());

    // A written lexicon is already normal: re-refining changes nothing.
    let lexicon = artifacts::read_lexicon(dir.path().join(LEXICON_FILE)).expect("read lexicon");
    let renormalized = Pipeline::refine(lexicon.into_iter().map(RawEntry::from).collect());
    assert_eq!(
        renormalized.lexicon.entries(),
        output.refinement.lexicon.entries()
    );
    assert_eq!(renormalized.normalize.entries_dropped(), 0);
    assert_eq!(renormalized.dedup.duplicates_dropped, 0);
}

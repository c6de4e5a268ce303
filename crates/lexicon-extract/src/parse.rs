//! Line-oriented entry parser.
//!
//! Each line of a section is classified by the first matching rule:
//!
//! 1. noise (page numbers, section titles) is skipped;
//! 2. tagged lines carry `CODE=token` fragments for known dialect codes and
//!    feed the variant accumulator, possibly naming a headword in leftover text;
//! 3. column rows (`headword | variant | variant` or columns split by runs of
//!    spaces) become an entry on their own;
//! 4. plain text becomes the pending headword for the tagged lines that follow.
//!
//! Anything else is counted as unrecognized and skipped. The parser never
//! fails: malformed input only means fewer entries.

use std::collections::{BTreeMap, HashSet};
use std::mem;
use std::sync::LazyLock;

use lexicon_types::{LexiconSection, RawEntry};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{ConfigError, ExtractConfig};

const SEPARATORS: [char; 3] = [':', ',', ';'];
const PLAIN_MIN_CHARS: usize = 3;
const PLAIN_MAX_CHARS: usize = 149;

static CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\p{L}{1,6})\s*=").expect("dialect code pattern compiles"));
static COLUMN_GAP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("column gap pattern compiles"));

/// A `CODE=token` fragment with a recognized dialect code.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Fragment {
    pub code: String,
    pub token: String,
}

/// Decomposition of a line holding dialect-tagged variants.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TaggedLine {
    pub fragments: Vec<Fragment>,
    /// Meaningful text left once fragments and separators are stripped.
    pub remainder: Option<String>,
    /// Split of the last token into `(variant, headword)` when it ends in a
    /// separate word. Used when no headword is pending, or when the line
    /// carries several fragments and so reads as a complete row.
    pub trailing: Option<(String, String)>,
    /// Leftover text that does not qualify as a headword.
    pub discarded: Option<String>,
    /// Tokens discarded for being empty or still containing `=`.
    pub rejected_tokens: usize,
}

/// Classification of a single line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LineKind {
    Blank,
    Noise,
    Tagged(TaggedLine),
    Columns {
        headword: String,
        variants: Vec<String>,
    },
    Plain(String),
    Unrecognized,
}

/// Counters describing one parse; nothing is dropped without being counted here.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ParseReport {
    pub lines: usize,
    pub blank_lines: usize,
    pub noise_lines: usize,
    pub unrecognized_lines: usize,
    pub rejected_tokens: usize,
    /// Tagged lines whose leftover text was neither a headword nor empty.
    pub discarded_leftovers: usize,
    /// Headwords that never received a variant.
    pub orphan_headwords: usize,
    /// Variants that never received a headword.
    pub orphan_variants: usize,
    pub entries: usize,
}

impl ParseReport {
    /// Lines that produced nothing: noise plus unrecognized.
    pub fn lines_skipped(&self) -> usize {
        self.noise_lines + self.unrecognized_lines
    }

    pub fn absorb(&mut self, other: &ParseReport) {
        self.lines += other.lines;
        self.blank_lines += other.blank_lines;
        self.noise_lines += other.noise_lines;
        self.unrecognized_lines += other.unrecognized_lines;
        self.rejected_tokens += other.rejected_tokens;
        self.discarded_leftovers += other.discarded_leftovers;
        self.orphan_headwords += other.orphan_headwords;
        self.orphan_variants += other.orphan_variants;
        self.entries += other.entries;
    }
}

#[derive(Debug, Default)]
pub struct ParseOutput {
    pub entries: Vec<RawEntry>,
    pub report: ParseReport,
}

#[derive(Debug)]
struct Pending {
    headword: String,
    line: usize,
}

/// Accumulation threaded through the line scan.
#[derive(Debug, Default)]
struct ScanState {
    pending: Option<Pending>,
    variants: Vec<String>,
    tags: BTreeMap<String, String>,
}

impl ScanState {
    fn absorb(&mut self, fragments: Vec<Fragment>) {
        for Fragment { code, token } in fragments {
            if !self.variants.contains(&token) {
                self.variants.push(token.clone());
            }
            self.tags.entry(token).or_insert(code);
        }
    }

    /// Pair `headword` with everything accumulated and reset the accumulator.
    fn emit(&mut self, headword: String, line: usize, out: &mut ParseOutput) {
        let variants = mem::take(&mut self.variants);
        let dialect_tags = mem::take(&mut self.tags);
        if variants.is_empty() {
            out.report.orphan_headwords += 1;
            debug!("line {line}: headword {headword:?} has no variants");
            return;
        }
        out.report.entries += 1;
        out.entries.push(RawEntry {
            headword,
            variants,
            dialect_tags,
            line,
        });
    }

    fn flush_pending(&mut self, out: &mut ParseOutput) {
        if let Some(Pending { headword, line }) = self.pending.take() {
            self.emit(headword, line, out);
        }
    }
}

/// Prioritized-rule parser configured with the known dialect codes and noise patterns.
#[derive(Clone, Debug)]
pub struct EntryParser {
    dialect_codes: HashSet<String>,
    noise: Vec<Regex>,
}

impl EntryParser {
    pub fn new(dialect_codes: HashSet<String>, noise: Vec<Regex>) -> Self {
        Self {
            dialect_codes,
            noise,
        }
    }

    pub fn from_config(config: &ExtractConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.dialect_code_set(),
            config.compile_noise_patterns()?,
        ))
    }

    pub fn parse_section(&self, section: &LexiconSection) -> ParseOutput {
        let out = self.parse_text(&section.text, section.start_line);
        info!(
            "section {}: {} entries from {} lines ({} skipped)",
            section.name,
            out.report.entries,
            out.report.lines,
            out.report.lines_skipped()
        );
        out
    }

    /// Parse free text whose first line is document line `first_line`.
    pub fn parse_text(&self, text: &str, first_line: usize) -> ParseOutput {
        let lines: Vec<&str> = text.lines().collect();
        let mut out = ParseOutput::default();
        let mut state = ScanState::default();

        for (idx, raw) in lines.iter().enumerate() {
            let line_no = first_line + idx;
            out.report.lines += 1;
            match self.classify(raw) {
                LineKind::Blank => out.report.blank_lines += 1,
                LineKind::Noise => out.report.noise_lines += 1,
                LineKind::Tagged(tagged) => {
                    out.report.rejected_tokens += tagged.rejected_tokens;
                    if let Some(discarded) = &tagged.discarded {
                        out.report.discarded_leftovers += 1;
                        debug!("line {line_no}: leftover {discarded:?} is not a headword");
                    }
                    let named_headword = apply_tagged(tagged, line_no, &mut state, &mut out);
                    if !named_headword
                        && state.pending.is_some()
                        && !state.variants.is_empty()
                        && !self
                            .peek_significant(&lines[idx + 1..])
                            .is_some_and(|next| self.has_fragment(next))
                    {
                        // The next word starts here rather than more variants following.
                        state.flush_pending(&mut out);
                    }
                }
                LineKind::Columns { headword, variants } => {
                    out.report.entries += 1;
                    out.entries.push(RawEntry {
                        headword,
                        variants,
                        dialect_tags: BTreeMap::new(),
                        line: line_no,
                    });
                }
                LineKind::Plain(headword) => {
                    if let Some(prior) = state.pending.take() {
                        state.emit(prior.headword, prior.line, &mut out);
                    }
                    state.pending = Some(Pending {
                        headword,
                        line: line_no,
                    });
                }
                LineKind::Unrecognized => {
                    out.report.unrecognized_lines += 1;
                    debug!("line {line_no}: unrecognized {:?}", raw.trim());
                }
            }
        }

        match state.pending.take() {
            Some(Pending { headword, line }) => state.emit(headword, line, &mut out),
            None => out.report.orphan_variants += state.variants.len(),
        }
        // Column rows are emitted before a still-pending headword above them.
        out.entries.sort_by_key(|e| e.line);
        out
    }

    /// Classify one line using the rule priority order.
    pub fn classify(&self, raw: &str) -> LineKind {
        let line = raw.trim();
        if line.is_empty() {
            return LineKind::Blank;
        }
        if self.is_noise(line) {
            return LineKind::Noise;
        }
        if let Some(tagged) = self.scan_tagged(line) {
            return LineKind::Tagged(tagged);
        }
        if let Some((headword, variants)) = split_columns(line) {
            return LineKind::Columns { headword, variants };
        }
        if is_plain_text(line) {
            return LineKind::Plain(collapse_whitespace(line));
        }
        LineKind::Unrecognized
    }

    fn is_noise(&self, line: &str) -> bool {
        self.noise.iter().any(|re| re.is_match(line))
    }

    fn has_fragment(&self, line: &str) -> bool {
        CODE_RE
            .captures_iter(line)
            .any(|caps| self.dialect_codes.contains(&caps[1]))
    }

    fn peek_significant<'a>(&self, rest: &[&'a str]) -> Option<&'a str> {
        rest.iter()
            .copied()
            .map(str::trim)
            .find(|l| !l.is_empty() && !self.is_noise(l))
    }

    fn scan_tagged(&self, line: &str) -> Option<TaggedLine> {
        // (fragment start, token start, recognized code)
        let marks: Vec<(usize, usize, Option<&str>)> = CODE_RE
            .captures_iter(line)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let code = caps.get(1)?.as_str();
                let known = self.dialect_codes.contains(code).then_some(code);
                Some((whole.start(), whole.end(), known))
            })
            .collect();
        if !marks.iter().any(|(_, _, code)| code.is_some()) {
            return None;
        }

        let mut fragments = Vec::new();
        let mut leftover = vec![&line[..marks[0].0]];
        let mut rejected_tokens = 0;
        for (idx, (start, body, code)) in marks.iter().enumerate() {
            let span_end = marks.get(idx + 1).map_or(line.len(), |next| next.0);
            let Some(code) = code else {
                leftover.push(&line[*start..span_end]);
                continue;
            };
            let span = &line[*body..span_end];
            let (token, rest) = match span.find(SEPARATORS) {
                Some(at) => span.split_at(at),
                None => (span, ""),
            };
            leftover.push(rest);
            let token = token.trim();
            if token.is_empty() || token.contains('=') {
                rejected_tokens += 1;
                continue;
            }
            fragments.push(Fragment {
                code: code.to_string(),
                token: collapse_whitespace(token),
            });
        }

        let joined = leftover.join(" ");
        let leftover_text =
            joined.trim_matches(|c: char| c.is_whitespace() || SEPARATORS.contains(&c));
        let remainder = is_meaningful(leftover_text).then(|| collapse_whitespace(leftover_text));
        let discarded = (remainder.is_none() && !leftover_text.is_empty())
            .then(|| collapse_whitespace(leftover_text));
        let trailing = if leftover_text.is_empty() {
            fragments.last().and_then(|last| split_trailing_word(&last.token))
        } else {
            None
        };

        Some(TaggedLine {
            fragments,
            remainder,
            trailing,
            discarded,
            rejected_tokens,
        })
    }
}

/// Apply a tagged line to the state; returns whether it named a headword.
fn apply_tagged(
    tagged: TaggedLine,
    line_no: usize,
    state: &mut ScanState,
    out: &mut ParseOutput,
) -> bool {
    let TaggedLine {
        mut fragments,
        remainder,
        trailing,
        ..
    } = tagged;

    let headword = match (remainder, trailing) {
        (Some(remainder), _) => Some(remainder),
        (None, Some((variant, word))) if state.pending.is_none() || fragments.len() > 1 => {
            if let Some(last) = fragments.last_mut() {
                last.token = variant;
            }
            Some(word)
        }
        _ => None,
    };

    let Some(headword) = headword else {
        state.absorb(fragments);
        return false;
    };

    match state.pending.take() {
        None => {
            state.absorb(fragments);
            state.emit(headword, line_no, out);
        }
        Some(prior) => {
            state.emit(prior.headword, prior.line, out);
            state.absorb(fragments);
            state.pending = Some(Pending {
                headword,
                line: line_no,
            });
        }
    }
    true
}

/// Split an explicit `headword | variant | variant` row (pipes or runs of
/// spaces); cells after the first may hold comma-separated variants.
fn split_columns(line: &str) -> Option<(String, Vec<String>)> {
    let cells: Vec<&str> = if line.contains('|') {
        line.split('|').collect()
    } else if COLUMN_GAP_RE.is_match(line) {
        COLUMN_GAP_RE.split(line).collect()
    } else {
        return None;
    };

    let mut cells = cells.into_iter().map(str::trim).filter(|c| !c.is_empty());
    let headword = cells.next()?;
    if !headword.chars().any(char::is_alphabetic) {
        return None;
    }
    let mut variants: Vec<String> = Vec::new();
    for variant in cells.flat_map(|cell| cell.split(',')) {
        let variant = collapse_whitespace(variant);
        if !variant.is_empty() && !variants.contains(&variant) {
            variants.push(variant);
        }
    }
    if variants.is_empty() {
        return None;
    }
    Some((collapse_whitespace(headword), variants))
}

/// Text outside fragments that can stand as a headword: letters (with inner
/// spaces, apostrophes or hyphens), more than two characters.
fn is_meaningful(text: &str) -> bool {
    text.chars().count() > 2
        && text.chars().any(char::is_alphabetic)
        && text
            .chars()
            .all(|c| c.is_alphabetic() || c.is_whitespace() || matches!(c, '\'' | '’' | '-'))
}

fn split_trailing_word(token: &str) -> Option<(String, String)> {
    let (head, tail) = token.rsplit_once(char::is_whitespace)?;
    let head = head.trim_end();
    (!head.is_empty() && is_meaningful(tail)).then(|| (head.to_string(), tail.to_string()))
}

fn is_plain_text(line: &str) -> bool {
    let len = line.chars().count();
    (PLAIN_MIN_CHARS..=PLAIN_MAX_CHARS).contains(&len)
        && line.chars().any(char::is_alphabetic)
        && line.chars().all(|c| {
            c.is_alphabetic()
                || c.is_whitespace()
                || matches!(c, '’' | '«' | '»' | '–' | '…')
                || (c.is_ascii_punctuation() && c != '=' && c != '|')
        })
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use lexicon_types::SectionName;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_DIALECT_CODES: &[&str] = &["Beb", "Bd", "Dg", "Gl", "Gor", "Kb", "Lk", "Mb", "Ng", "Sr"];

const DEFAULT_NOISE_PATTERNS: &[&str] = &[
    r"^\d{1,4}$",
    r"(?i)^page\s+\d{1,4}$",
    r"(?i)^lexique(\s+(français|english))?$",
    r"(?i)^(français|english)\s+[–-]\s+(langues\s+sara|sara\s+languages)$",
];

/// Where one direction's section starts (and optionally stops) in the dump.
#[derive(Clone, Debug, Deserialize)]
pub struct SectionSpec {
    pub name: SectionName,
    /// Candidate start markers, most preferred first.
    pub start_markers: Vec<String>,
    #[serde(default)]
    pub end_marker: Option<String>,
}

/// Extraction settings; every field falls back to the built-in Sara lexicon layout.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub sections: Vec<SectionSpec>,
    pub dialect_codes: Vec<String>,
    /// Regexes matched against trimmed lines; a hit marks a header or page number.
    pub noise_patterns: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("section {0} has no start markers")]
    NoMarkers(SectionName),
    #[error("section {0} is configured twice")]
    DuplicateSection(SectionName),
    #[error("dialect code set is empty")]
    NoDialectCodes,
    #[error("invalid dialect code {0:?}: expected 1-6 letters")]
    BadDialectCode(String),
    #[error("invalid noise pattern {pattern:?}: {source}")]
    BadPattern {
        pattern: String,
        source: regex::Error,
    },
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            sections: vec![
                SectionSpec {
                    name: SectionName::FrenchSara,
                    start_markers: vec![
                        "Lexique\nFrançais – Langues Sara".to_string(),
                        "Lexique Français".to_string(),
                    ],
                    end_marker: None,
                },
                SectionSpec {
                    name: SectionName::EnglishSara,
                    start_markers: vec![
                        "Lexique\nEnglish – Sara Languages".to_string(),
                        "Lexique English".to_string(),
                    ],
                    end_marker: None,
                },
            ],
            dialect_codes: DEFAULT_DIALECT_CODES.iter().map(|c| c.to_string()).collect(),
            noise_patterns: DEFAULT_NOISE_PATTERNS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl ExtractConfig {
    /// Read a TOML config file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for spec in &self.sections {
            if !seen.insert(spec.name) {
                return Err(ConfigError::DuplicateSection(spec.name));
            }
            if spec.start_markers.iter().all(|m| m.is_empty()) {
                return Err(ConfigError::NoMarkers(spec.name));
            }
        }
        if self.dialect_codes.is_empty() {
            return Err(ConfigError::NoDialectCodes);
        }
        for code in &self.dialect_codes {
            let len = code.chars().count();
            if !(1..=6).contains(&len) || !code.chars().all(char::is_alphabetic) {
                return Err(ConfigError::BadDialectCode(code.clone()));
            }
        }
        self.compile_noise_patterns()?;
        Ok(())
    }

    pub fn dialect_code_set(&self) -> HashSet<String> {
        self.dialect_codes.iter().cloned().collect()
    }

    pub fn compile_noise_patterns(&self) -> Result<Vec<Regex>, ConfigError> {
        self.noise_patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| ConfigError::BadPattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_are_valid() {
        let config = ExtractConfig::default();
        config.validate().unwrap();
        assert_eq!(config.sections.len(), 2);
        assert!(config.dialect_code_set().contains("Beb"));
    }

    #[test]
    fn empty_file_yields_defaults() {
        let config = ExtractConfig::from_toml("").unwrap();
        assert_eq!(config.sections.len(), 2);
        assert_eq!(config.noise_patterns.len(), DEFAULT_NOISE_PATTERNS.len());
    }

    #[test]
    fn loads_partial_override() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"dialect_codes = ["Ng", "Mb"]

[[sections]]
name = "english_sara"
start_markers = ["ENGLISH"]
end_marker = "INDEX"
"#
        )
        .unwrap();
        let config = ExtractConfig::load(file.path()).unwrap();
        assert_eq!(config.sections.len(), 1);
        assert_eq!(config.sections[0].name, SectionName::EnglishSara);
        assert_eq!(config.sections[0].end_marker.as_deref(), Some("INDEX"));
        assert_eq!(config.dialect_codes, vec!["Ng", "Mb"]);
    }

    #[test]
    fn rejects_bad_pattern_and_codes() {
        let config = ExtractConfig {
            noise_patterns: vec!["(unclosed".into()],
            ..ExtractConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::BadPattern { .. })));

        let config = ExtractConfig {
            dialect_codes: vec!["B=b".into()],
            ..ExtractConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::BadDialectCode(_))));

        let config = ExtractConfig {
            dialect_codes: Vec::new(),
            ..ExtractConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NoDialectCodes)));
    }

    #[test]
    fn missing_file_names_path() {
        let err = ExtractConfig::load("/nonexistent/lexicon.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/lexicon.toml"));
    }
}

//! Source table and extraction settings.
//!
//! The default configuration is embedded at compile time from
//! `seed_data/sources.yml`, following the same `include_str!` approach used
//! for other seed data. A user file (YAML, or TOML by extension) can replace
//! it. Everything the engine may vary lives in [`EngineConfig`] and is passed
//! explicitly to the extraction entry points.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::asof::{DatePattern, DEFAULT_DATE_PATTERNS};
use crate::locator::{LabelFallback, LabelMatch, DEFAULT_WINDOW_CHARS};
use crate::structured::DEFAULT_HYDRATION_SCRIPT_ID;

/// Error types for configuration loading and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config YAML: {0}")]
    YamlParse(#[from] serde_yml::Error),
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Duplicate ticker in config: {0}")]
    DuplicateTicker(String),
    #[error("Source URL given for ticker not listed in tickers: {0}")]
    UnknownTicker(String),
    #[error("Invalid source URL for {ticker}: {reason}")]
    InvalidUrl { ticker: String, reason: String },
    #[error("Label list for {0} is empty or contains a blank label")]
    EmptyLabels(&'static str),
    #[error("window_chars must be greater than zero")]
    ZeroWindow,
    #[error("hydration_script_id must not be blank")]
    BlankScriptId,
}

/// Ordered label candidates per field. Earlier phrases take priority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldLabels {
    pub nav: Vec<String>,
    pub aum: Vec<String>,
    pub shares_outstanding: Vec<String>,
}

impl Default for FieldLabels {
    fn default() -> Self {
        Self {
            nav: vec!["NAV".into(), "Net Asset Value".into()],
            aum: vec![
                "Assets Under Management".into(),
                "Net Assets".into(),
                "Total Net Assets".into(),
            ],
            shares_outstanding: vec!["Shares Outstanding".into()],
        }
    }
}

/// Tunable surface of the extraction engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub labels: FieldLabels,
    /// Characters scanned after a label for its value.
    pub window_chars: usize,
    pub label_fallback: LabelFallback,
    pub label_match: LabelMatch,
    /// As-of date phrasings, in priority order.
    pub date_patterns: Vec<DatePattern>,
    /// `id` of the script element carrying the hydration JSON.
    pub hydration_script_id: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            labels: FieldLabels::default(),
            window_chars: DEFAULT_WINDOW_CHARS,
            label_fallback: LabelFallback::default(),
            label_match: LabelMatch::default(),
            date_patterns: DEFAULT_DATE_PATTERNS.to_vec(),
            hydration_script_id: DEFAULT_HYDRATION_SCRIPT_ID.to_string(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, labels) in [
            ("nav", &self.labels.nav),
            ("aum", &self.labels.aum),
            ("shares_outstanding", &self.labels.shares_outstanding),
        ] {
            if labels.is_empty() || labels.iter().any(|l| l.trim().is_empty()) {
                return Err(ConfigError::EmptyLabels(field));
            }
        }
        if self.window_chars == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        if self.hydration_script_id.trim().is_empty() {
            return Err(ConfigError::BlankScriptId);
        }
        Ok(())
    }
}

/// Top-level structure of the sources file.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Tracked tickers, in processing order.
    pub tickers: Vec<String>,
    /// Ticker to provider page URL.
    #[serde(default)]
    pub sources: BTreeMap<String, String>,
    #[serde(default)]
    pub engine: EngineConfig,
}

/// A ticker with the page its figures are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTarget {
    pub ticker: String,
    pub url: String,
}

/// Tickers split into those with a page and those without one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedSources {
    pub targets: Vec<SourceTarget>,
    pub missing: Vec<String>,
}

impl SourceConfig {
    /// Normalizes tickers to upper case and validates the whole file.
    fn normalized(mut self) -> Result<Self, ConfigError> {
        self.tickers = self
            .tickers
            .into_iter()
            .map(|t| normalize_ticker(&t))
            .collect();
        self.sources = self
            .sources
            .into_iter()
            .map(|(t, url)| (normalize_ticker(&t), url.trim().to_string()))
            .collect();
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for ticker in &self.tickers {
            if !seen.insert(ticker.as_str()) {
                return Err(ConfigError::DuplicateTicker(ticker.clone()));
            }
        }
        for (ticker, url) in &self.sources {
            if !seen.contains(ticker.as_str()) {
                return Err(ConfigError::UnknownTicker(ticker.clone()));
            }
            let parsed = Url::parse(url).map_err(|e| ConfigError::InvalidUrl {
                ticker: ticker.clone(),
                reason: e.to_string(),
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::InvalidUrl {
                    ticker: ticker.clone(),
                    reason: format!("unsupported scheme {}", parsed.scheme()),
                });
            }
        }
        self.engine.validate()
    }

    /// Pairs tickers with their URLs in `tickers` order.
    ///
    /// With a `filter`, only the named tickers are considered; named tickers
    /// that are not configured at all count as missing.
    pub fn resolve(&self, filter: Option<&[String]>) -> ResolvedSources {
        let wanted: Vec<String> = match filter {
            Some(names) => {
                let mut out: Vec<String> = Vec::new();
                for name in names.iter().map(|n| normalize_ticker(n)) {
                    if !name.is_empty() && !out.contains(&name) {
                        out.push(name);
                    }
                }
                out
            }
            None => self.tickers.clone(),
        };

        let mut resolved = ResolvedSources::default();
        for ticker in wanted {
            match self.sources.get(&ticker) {
                Some(url) if self.tickers.contains(&ticker) => {
                    resolved.targets.push(SourceTarget {
                        url: url.clone(),
                        ticker,
                    });
                }
                _ => resolved.missing.push(ticker),
            }
        }
        resolved
    }
}

fn normalize_ticker(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// Parse and validate a sources file in YAML.
pub fn parse_source_config(yaml_content: &str) -> Result<SourceConfig, ConfigError> {
    let config: SourceConfig = serde_yml::from_str(yaml_content)?;
    config.normalized()
}

/// Parse and validate a sources file in TOML.
pub fn parse_source_config_toml(toml_content: &str) -> Result<SourceConfig, ConfigError> {
    let config: SourceConfig = toml::from_str(toml_content)?;
    config.normalized()
}

/// Load the sources file embedded at compile time.
pub fn load_default_config() -> Result<SourceConfig, ConfigError> {
    let yaml_content = include_str!("../../seed_data/sources.yml");
    parse_source_config(yaml_content)
}

/// Load a sources file from disk. `.toml` files are read as TOML, anything
/// else as YAML.
pub fn load_config_file(path: impl AsRef<Path>) -> Result<SourceConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let is_toml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("toml"));
    if is_toml {
        parse_source_config_toml(&content)
    } else {
        parse_source_config(&content)
    }
}

/// The user file when given, the embedded default otherwise.
pub fn load_config(path: Option<&Path>) -> Result<SourceConfig, ConfigError> {
    match path {
        Some(p) => load_config_file(p),
        None => load_default_config(),
    }
}

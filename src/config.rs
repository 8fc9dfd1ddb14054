//! Job configuration.
//!
//! A [`JobConfig`] is assembled from built-in defaults, an optional JSON
//! settings file and command-line flags, in that order of precedence.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::HistogramError;

/// Default separator between key and value on an input line.
pub const DEFAULT_KEY_VALUE_SEPARATOR: char = '\t';
/// Default separator between key and value on an output line.
pub const DEFAULT_OUTPUT_SEPARATOR: &str = "\t";
/// Default number of reduce partitions.
pub const DEFAULT_REDUCERS: u32 = 1;

/// What to do with a record whose citation count cannot be parsed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MalformedPolicy {
    /// Stop the whole job at the first malformed record.
    #[default]
    Abort,
    /// Log the record, count it and carry on without it.
    Skip,
}

/// Everything a job run needs to know.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct JobConfig {
    /// Input file, directory or glob pattern.
    pub input: String,
    /// Output directory; must not exist yet.
    pub output: PathBuf,
    pub key_value_separator: char,
    pub output_separator: String,
    /// Number of reduce partitions, and therefore of `part-NNNNN` files.
    pub reducers: u32,
    pub on_malformed: MalformedPolicy,
    /// Worker threads for the map phase. `None` uses the global rayon pool.
    pub threads: Option<usize>,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            input: String::new(),
            output: PathBuf::new(),
            key_value_separator: DEFAULT_KEY_VALUE_SEPARATOR,
            output_separator: DEFAULT_OUTPUT_SEPARATOR.to_string(),
            reducers: DEFAULT_REDUCERS,
            on_malformed: MalformedPolicy::default(),
            threads: None,
        }
    }
}

impl JobConfig {
    pub fn new(input: impl Into<String>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            ..Self::default()
        }
    }

    pub fn with_policy(mut self, policy: MalformedPolicy) -> Self {
        self.on_malformed = policy;
        self
    }

    pub fn with_reducers(mut self, reducers: u32) -> Self {
        self.reducers = reducers;
        self
    }

    /// Overlays every setting present in `settings` onto this config.
    pub fn apply(&mut self, settings: &JobSettings) {
        if let Some(sep) = settings.key_value_separator {
            self.key_value_separator = sep;
        }
        if let Some(sep) = &settings.output_separator {
            self.output_separator = sep.clone();
        }
        if let Some(reducers) = settings.reducers {
            self.reducers = reducers;
        }
        if let Some(policy) = settings.on_malformed {
            self.on_malformed = policy;
        }
        if let Some(threads) = settings.threads {
            self.threads = Some(threads);
        }
    }

    /// Checks the settings that the pipeline relies on.
    pub fn validate(&self) -> Result<(), HistogramError> {
        if self.reducers == 0 {
            return Err(HistogramError::InvalidConfig(
                "number of reducers must be at least 1".to_string(),
            ));
        }
        if self.threads == Some(0) {
            return Err(HistogramError::InvalidConfig(
                "number of threads must be at least 1".to_string(),
            ));
        }
        if !self.key_value_separator.is_ascii() {
            return Err(HistogramError::InvalidConfig(format!(
                "key/value separator {:?} is not a single-byte character",
                self.key_value_separator
            )));
        }
        Ok(())
    }

    /// The key/value separator as the byte searched for on input lines.
    ///
    /// Only meaningful after [`JobConfig::validate`] succeeded.
    pub fn separator_byte(&self) -> u8 {
        self.key_value_separator as u8
    }
}

/// Optional overrides read from a JSON settings file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct JobSettings {
    pub key_value_separator: Option<char>,
    pub output_separator: Option<String>,
    pub reducers: Option<u32>,
    pub on_malformed: Option<MalformedPolicy>,
    pub threads: Option<usize>,
}

impl JobSettings {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        let settings = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_key_value_text_format() {
        let config = JobConfig::new("in", "out");
        assert_eq!(config.key_value_separator, '\t');
        assert_eq!(config.output_separator, "\t");
        assert_eq!(config.reducers, 1);
        assert_eq!(config.on_malformed, MalformedPolicy::Abort);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn settings_override_only_present_fields() {
        let settings: JobSettings =
            serde_json::from_str(r#"{"reducers": 4, "on-malformed": "skip"}"#).unwrap();
        let mut config = JobConfig::new("in", "out");
        config.apply(&settings);

        assert_eq!(config.reducers, 4);
        assert_eq!(config.on_malformed, MalformedPolicy::Skip);
        assert_eq!(config.key_value_separator, '\t');
        assert_eq!(config.threads, None);
    }

    #[test]
    fn unknown_settings_are_rejected() {
        let parsed = serde_json::from_str::<JobSettings>(r#"{"mappers": 3}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn zero_reducers_is_invalid() {
        let config = JobConfig::new("in", "out").with_reducers(0);
        assert!(matches!(
            config.validate(),
            Err(HistogramError::InvalidConfig(_))
        ));
    }

    #[test]
    fn multibyte_separator_is_invalid() {
        let mut config = JobConfig::new("in", "out");
        config.key_value_separator = '§';
        assert!(config.validate().is_err());
    }
}

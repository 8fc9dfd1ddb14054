use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser};

use crate::config::{JobConfig, JobSettings, MalformedPolicy};

/// Counts, for every citation count, how many identifiers have it.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Input file, directory or glob pattern of `identifier<TAB>count` lines
    pub input: String,

    /// Output directory (must not exist)
    pub output: PathBuf,

    /// JSON settings file; flags given on the command line take precedence
    #[arg(short, long)]
    pub conf: Option<PathBuf>,

    /// Separator between identifier and count on input lines
    #[arg(long)]
    pub separator: Option<char>,

    /// Separator between count and frequency on output lines
    #[arg(long)]
    pub output_separator: Option<String>,

    /// Number of reduce partitions, one `part-NNNNN` file each
    #[arg(short, long)]
    pub reducers: Option<u32>,

    /// What to do with records whose count is not a number
    #[arg(long, value_enum)]
    pub on_malformed: Option<MalformedPolicy>,

    /// Worker threads for the map phase
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Command-line flags as settings, so they can be layered over a file.
    fn settings(&self) -> JobSettings {
        JobSettings {
            key_value_separator: self.separator,
            output_separator: self.output_separator.clone(),
            reducers: self.reducers,
            on_malformed: self.on_malformed,
            threads: self.threads,
        }
    }

    /// Builds the job configuration: defaults, then the settings file,
    /// then the command line.
    pub fn into_config(self) -> Result<JobConfig> {
        let mut config = JobConfig::new(self.input.clone(), self.output.clone());
        if let Some(path) = &self.conf {
            config.apply(&JobSettings::load(path)?);
        }
        config.apply(&self.settings());
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn positional_input_and_output() {
        let args = Args::try_parse_from(["citation-histogram", "cite75_99.txt", "out"]).unwrap();
        let config = args.into_config().unwrap();
        assert_eq!(config.input, "cite75_99.txt");
        assert_eq!(config.output, PathBuf::from("out"));
        assert_eq!(config.on_malformed, MalformedPolicy::Abort);
    }

    #[test]
    fn missing_output_is_a_usage_error() {
        assert!(Args::try_parse_from(["citation-histogram", "in"]).is_err());
    }

    #[test]
    fn flags_override_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let conf = dir.path().join("job.json");
        fs::write(&conf, r#"{"reducers": 3, "key-value-separator": ","}"#).unwrap();

        let args = Args::try_parse_from([
            "citation-histogram",
            "-c",
            conf.to_str().unwrap(),
            "-r",
            "5",
            "--on-malformed",
            "skip",
            "in",
            "out",
        ])
        .unwrap();
        let config = args.into_config().unwrap();

        assert_eq!(config.reducers, 5);
        assert_eq!(config.key_value_separator, ',');
        assert_eq!(config.on_malformed, MalformedPolicy::Skip);
    }

    #[test]
    fn verbosity_is_counted() {
        let args = Args::try_parse_from(["citation-histogram", "-vv", "in", "out"]).unwrap();
        assert_eq!(args.verbose, 2);
    }
}

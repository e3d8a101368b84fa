//! Merges command line flags, an optional RON file and engine defaults into a
//! [`ScraperConfig`]. Precedence: flags, then file, then defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use ron::extensions::Extensions;
use serde::Deserialize;
use wiki_engine::ScraperConfig;

use crate::cli::Cli;

/// MediaWiki caps `rnlimit` at 500 for regular clients.
const MAX_BATCH_SIZE: u32 = 500;

/// Upper bound on simultaneous fetch+save workers.
const MAX_CONCURRENCY: usize = 1024;

/// On-disk configuration. Every key is optional; durations are milliseconds.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub count: Option<usize>,
    pub concurrency: Option<usize>,
    pub batch_size: Option<u32>,
    pub namespace: Option<i32>,
    pub output: Option<PathBuf>,
    pub endpoint: Option<String>,
    pub article_base_url: Option<String>,
    pub user_agent: Option<String>,
    pub backoff_ms: Option<u64>,
    pub max_sample_failures: Option<u32>,
    pub connect_timeout_ms: Option<u64>,
    pub request_timeout_ms: Option<u64>,
    pub max_response_bytes: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("failed to parse config file {}", path.display()))
    }

    fn parse(text: &str) -> Result<Self> {
        let options = ron::Options::default().with_default_extension(Extensions::IMPLICIT_SOME);
        Ok(options.from_str(text)?)
    }
}

pub fn resolve(cli: &Cli) -> Result<ScraperConfig> {
    let file = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    merge(cli, file)
}

fn merge(cli: &Cli, file: FileConfig) -> Result<ScraperConfig> {
    let mut config = ScraperConfig::default();

    if let Some(count) = cli.count.or(file.count) {
        config.target_count = count;
    }
    if let Some(concurrency) = cli.concurrency.or(file.concurrency) {
        config.concurrency = concurrency;
    }
    if let Some(batch_size) = cli.batch_size.or(file.batch_size) {
        config.sample.batch_size = batch_size;
    }
    if let Some(namespace) = cli.namespace.or(file.namespace) {
        config.sample.namespace = namespace;
    }
    if let Some(output) = cli.output.clone().or(file.output) {
        config.output_dir = output;
    }
    if let Some(endpoint) = cli.endpoint.clone().or(file.endpoint) {
        config.api.endpoint = endpoint;
    }
    if let Some(base) = cli.article_base_url.clone().or(file.article_base_url) {
        config.article_base_url = base;
    }
    if let Some(user_agent) = cli.user_agent.clone().or(file.user_agent) {
        config.api.user_agent = user_agent;
    }
    if let Some(ms) = file.backoff_ms {
        config.sample.backoff = Duration::from_millis(ms);
    }
    if let Some(failures) = file.max_sample_failures {
        config.sample.max_consecutive_failures = failures;
    }
    if let Some(ms) = file.connect_timeout_ms {
        config.api.connect_timeout = Duration::from_millis(ms);
    }
    if let Some(ms) = file.request_timeout_ms {
        config.api.request_timeout = Duration::from_millis(ms);
    }
    if let Some(bytes) = file.max_response_bytes {
        config.api.max_bytes = bytes;
    }

    validate(&config)?;
    Ok(config)
}

fn validate(config: &ScraperConfig) -> Result<()> {
    if !(1..=MAX_CONCURRENCY).contains(&config.concurrency) {
        bail!(
            "concurrency must be between 1 and {MAX_CONCURRENCY}, got {}",
            config.concurrency
        );
    }
    if !(1..=MAX_BATCH_SIZE).contains(&config.sample.batch_size) {
        bail!(
            "batch size must be between 1 and {MAX_BATCH_SIZE}, got {}",
            config.sample.batch_size
        );
    }
    if config.sample.max_consecutive_failures == 0 {
        bail!("max_sample_failures must be at least 1");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("wiki_harvester").chain(args.iter().copied()))
    }

    #[test]
    fn defaults_apply_without_flags_or_file() {
        let config = merge(&cli(&[]), FileConfig::default()).unwrap();
        let defaults = ScraperConfig::default();
        assert_eq!(config.target_count, defaults.target_count);
        assert_eq!(config.concurrency, defaults.concurrency);
        assert_eq!(config.output_dir, defaults.output_dir);
        assert_eq!(config.api.endpoint, defaults.api.endpoint);
    }

    #[test]
    fn flags_override_file_values() {
        let file = FileConfig::parse(
            r#"(
                count: 200,
                concurrency: 4,
                output: "from-file",
                backoff_ms: 250,
            )"#,
        )
        .unwrap();
        let config = merge(&cli(&["-n", "7", "--output", "from-flag"]), file).unwrap();

        assert_eq!(config.target_count, 7);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.output_dir, PathBuf::from("from-flag"));
        assert_eq!(config.sample.backoff, Duration::from_millis(250));
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        assert!(FileConfig::parse("(concurency: 3)").is_err());
    }

    #[test]
    fn load_reads_file_from_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("harvester.ron");
        fs::write(&path, "(batch_size: 20, namespace: 14)").unwrap();

        let file = FileConfig::load(&path).unwrap();
        assert_eq!(file.batch_size, Some(20));
        assert_eq!(file.namespace, Some(14));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert!(merge(&cli(&["--batch-size", "0"]), FileConfig::default()).is_err());
        assert!(merge(&cli(&["--batch-size", "501"]), FileConfig::default()).is_err());
        assert!(merge(&cli(&["-j", "0"]), FileConfig::default()).is_err());
        assert!(merge(&cli(&["-j", "1025"]), FileConfig::default()).is_err());
        assert!(merge(&cli(&["-j", "18446744073709551615"]), FileConfig::default()).is_err());
        assert!(merge(&cli(&["-j", "1024"]), FileConfig::default()).is_ok());
    }
}

use std::path::PathBuf;

use clap::{ArgAction, Parser};

/// Download random Wikipedia articles as plain-text files.
#[derive(Debug, Parser)]
#[command(name = "wiki_harvester", version, about)]
pub struct Cli {
    /// Number of random titles to process
    #[arg(short = 'n', long)]
    pub count: Option<usize>,

    /// Maximum number of articles fetched and written at once
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Titles requested per random-sample call (1-500)
    #[arg(long)]
    pub batch_size: Option<u32>,

    /// MediaWiki namespace to sample from
    #[arg(long)]
    pub namespace: Option<i32>,

    /// Directory the article files are written to
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// MediaWiki action API endpoint
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Base of public article URLs, used in the SOURCE header
    #[arg(long)]
    pub article_base_url: Option<String>,

    /// User-Agent header sent with every request
    #[arg(long)]
    pub user_agent: Option<String>,

    /// RON config file; command line flags take precedence
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Also write the log to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

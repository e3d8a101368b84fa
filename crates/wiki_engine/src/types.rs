use std::fmt;
use std::path::PathBuf;

/// Opaque identifier of a remote article, as returned by the random sample endpoint.
pub type Title = String;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    ClientBuild,
    HttpStatus(u16),
    Timeout,
    Network,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    MalformedResponse,
    Api { code: String },
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::ClientBuild => write!(f, "cannot build http client"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::MalformedResponse => write!(f, "malformed response"),
            FailureKind::Api { code } => write!(f, "api error {code}"),
        }
    }
}

/// Why a title produced no file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The remote has no extract for the title.
    Absent,
    /// The extract exists but is empty.
    Empty,
}

/// Per-title failure; isolated to the worker that hit it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleFailure {
    Fetch(FailureKind),
    Storage(String),
    /// The worker task panicked or was aborted.
    Worker(String),
}

impl fmt::Display for TitleFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TitleFailure::Fetch(kind) => write!(f, "fetch failed: {kind}"),
            TitleFailure::Storage(message) => write!(f, "storage failed: {message}"),
            TitleFailure::Worker(message) => write!(f, "worker failed: {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleOutcome {
    Saved { path: PathBuf, bytes: u64 },
    Skipped(SkipReason),
    Failed(TitleFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeEvent {
    TitleQueued { title: Title },
    Saved { title: Title, path: PathBuf, bytes: u64 },
    Skipped { title: Title, reason: SkipReason },
    Failed { title: Title, failure: TitleFailure },
}

/// Aggregate tally of one `Scraper::run`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Titles pulled from the sample stream and handed to a worker.
    pub titles: usize,
    pub saved: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Backoff waits taken by the title stream.
    pub title_retries: usize,
    /// Highest number of workers observed in flight at once.
    pub peak_in_flight: usize,
    pub cancelled: bool,
    /// The title stream gave up before reaching the target.
    pub exhausted_early: bool,
}

impl RunReport {
    pub(crate) fn record(&mut self, outcome: &TitleOutcome) {
        match outcome {
            TitleOutcome::Saved { .. } => self.saved += 1,
            TitleOutcome::Skipped(_) => self.skipped += 1,
            TitleOutcome::Failed(_) => self.failed += 1,
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "titles={} saved={} skipped={} failed={} title_retries={} peak_in_flight={}",
            self.titles,
            self.saved,
            self.skipped,
            self.failed,
            self.title_retries,
            self.peak_in_flight
        )?;
        if self.cancelled {
            write!(f, " (cancelled)")?;
        }
        if self.exhausted_early {
            write!(f, " (title stream ended early)")?;
        }
        Ok(())
    }
}

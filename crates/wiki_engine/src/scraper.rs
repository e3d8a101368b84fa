use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use engine_logging::{engine_debug, engine_info, engine_warn};
use futures_util::FutureExt;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

use crate::api::{ApiClient, ApiSettings};
use crate::content::ContentFetcher;
use crate::persist::{DocumentStore, PersistError, SaveOutcome};
use crate::titles::{SampleSettings, TitleSource};
use crate::{FetchError, RunReport, ScrapeEvent, SkipReason, Title, TitleFailure, TitleOutcome};

/// Everything needed to assemble a [`Scraper`].
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub api: ApiSettings,
    pub sample: SampleSettings,
    pub output_dir: PathBuf,
    /// Prefix for the `SOURCE:` line of saved documents.
    pub article_base_url: String,
    /// Maximum number of fetch+save units in flight.
    pub concurrency: usize,
    pub target_count: usize,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            api: ApiSettings::default(),
            sample: SampleSettings::default(),
            output_dir: PathBuf::from("data/raw/wikipedia"),
            article_base_url: "https://ru.wikipedia.org/wiki/".to_string(),
            concurrency: 20,
            target_count: 50,
        }
    }
}

/// Setup failures. Once a run has started nothing is fatal.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("cannot construct api client: {0}")]
    Client(#[from] FetchError),
    #[error("cannot prepare output directory: {0}")]
    Storage(#[from] PersistError),
    #[error("concurrency must be between 1 and {max}, got {0}", max = Semaphore::MAX_PERMITS)]
    InvalidConcurrency(usize),
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ScrapeEvent);
}

/// Drives the sample stream and a bounded pool of fetch+save workers.
pub struct Scraper {
    titles: TitleSource,
    fetcher: Arc<ContentFetcher>,
    store: Arc<DocumentStore>,
    concurrency: usize,
    sink: Option<Arc<dyn ProgressSink>>,
    cancel: CancellationToken,
}

impl Scraper {
    pub fn new(
        titles: TitleSource,
        fetcher: ContentFetcher,
        store: DocumentStore,
        concurrency: usize,
    ) -> Self {
        Self {
            titles,
            fetcher: Arc::new(fetcher),
            store: Arc::new(store),
            concurrency: concurrency.clamp(1, Semaphore::MAX_PERMITS),
            sink: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Build the client and the output directory up front; either failing aborts
    /// before any work is spawned.
    pub fn from_config(config: &ScraperConfig) -> Result<Self, ScraperError> {
        if config.concurrency == 0 || config.concurrency > Semaphore::MAX_PERMITS {
            return Err(ScraperError::InvalidConcurrency(config.concurrency));
        }
        let api = ApiClient::new(&config.api)?;
        let store = DocumentStore::open(&config.output_dir, &config.article_base_url)?;
        Ok(Self::new(
            TitleSource::new(api.clone(), config.sample.clone()),
            ContentFetcher::new(api),
            store,
            config.concurrency,
        ))
    }

    pub fn with_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Cancelling stops the intake of new titles; workers already spawned run to completion.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Process up to `target` sampled titles and wait for every worker to finish.
    pub async fn run(&self, target: usize) -> RunReport {
        engine_info!(
            "Harvesting {} titles into {:?} with concurrency {}",
            target,
            self.store.dir(),
            self.concurrency
        );
        let limiter = Arc::new(Semaphore::new(self.concurrency));
        let in_flight = Arc::new(InFlight::default());
        let mut workers = JoinSet::new();
        let mut report = RunReport::default();
        let mut titles = self.titles.stream(target);

        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    report.cancelled = true;
                    break;
                }
                title = titles.next_title() => title,
            };
            let Some(title) = next else {
                break;
            };

            // Only the producer waits for a slot; running workers are unaffected.
            let permit = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    report.cancelled = true;
                    break;
                }
                permit = limiter.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            report.titles += 1;
            self.emit(ScrapeEvent::TitleQueued {
                title: title.clone(),
            });
            let worker = Worker {
                fetcher: self.fetcher.clone(),
                store: self.store.clone(),
                sink: self.sink.clone(),
                in_flight: in_flight.clone(),
            };
            workers.spawn(async move {
                let _permit = permit;
                worker.run_guarded(title).await
            });

            while let Some(joined) = workers.try_join_next() {
                tally(&mut report, joined);
            }
        }

        if report.cancelled {
            engine_warn!(
                "Harvest cancelled; waiting for {} in-flight workers",
                workers.len()
            );
        }
        while let Some(joined) = workers.join_next().await {
            tally(&mut report, joined);
        }

        report.title_retries = titles.retry_events();
        report.exhausted_early = titles.exhausted_early();
        report.peak_in_flight = in_flight.peak();
        engine_info!("Harvest finished: {}", report);
        report
    }

    fn emit(&self, event: ScrapeEvent) {
        if let Some(sink) = &self.sink {
            sink.emit(event);
        }
    }
}

fn tally(report: &mut RunReport, joined: Result<TitleOutcome, JoinError>) {
    match joined {
        Ok(outcome) => report.record(&outcome),
        Err(err) => {
            engine_warn!("Worker did not complete: {}", err);
            report.record(&TitleOutcome::Failed(TitleFailure::Worker(err.to_string())));
        }
    }
}

struct Worker {
    fetcher: Arc<ContentFetcher>,
    store: Arc<DocumentStore>,
    sink: Option<Arc<dyn ProgressSink>>,
    in_flight: Arc<InFlight>,
}

impl Worker {
    /// Like `process`, but a panic becomes a failed outcome for this title.
    async fn run_guarded(self, title: Title) -> TitleOutcome {
        let sink = self.sink.clone();
        match AssertUnwindSafe(self.process(title.clone()))
            .catch_unwind()
            .await
        {
            Ok(outcome) => outcome,
            Err(panic) => {
                let failure = TitleFailure::Worker(panic_message(panic.as_ref()));
                engine_warn!("Worker for '{}' panicked: {}", title, failure);
                if let Some(sink) = &sink {
                    sink.emit(ScrapeEvent::Failed {
                        title,
                        failure: failure.clone(),
                    });
                }
                TitleOutcome::Failed(failure)
            }
        }
    }

    async fn process(self, title: Title) -> TitleOutcome {
        let _guard = self.in_flight.enter();

        let outcome = match self.fetcher.fetch(&title).await {
            Ok(Some(body)) => self.save(&title, body).await,
            Ok(None) => TitleOutcome::Skipped(SkipReason::Absent),
            Err(err) => {
                engine_warn!("Fetching '{}' failed: {}", title, err);
                TitleOutcome::Failed(TitleFailure::Fetch(err.kind))
            }
        };

        let event = match &outcome {
            TitleOutcome::Saved { path, bytes } => {
                engine_debug!("Saved '{}' to {:?}", title, path);
                ScrapeEvent::Saved {
                    title,
                    path: path.clone(),
                    bytes: *bytes,
                }
            }
            TitleOutcome::Skipped(reason) => {
                engine_debug!("Skipped '{}': {:?}", title, reason);
                ScrapeEvent::Skipped {
                    title,
                    reason: *reason,
                }
            }
            TitleOutcome::Failed(failure) => ScrapeEvent::Failed {
                title,
                failure: failure.clone(),
            },
        };
        if let Some(sink) = &self.sink {
            sink.emit(event);
        }
        outcome
    }

    async fn save(&self, title: &str, body: String) -> TitleOutcome {
        let store = self.store.clone();
        let owned_title = title.to_string();
        match tokio::task::spawn_blocking(move || store.save(&owned_title, &body)).await {
            Ok(Ok(SaveOutcome::Written { path, bytes })) => TitleOutcome::Saved { path, bytes },
            Ok(Ok(SaveOutcome::Skipped)) => TitleOutcome::Skipped(SkipReason::Empty),
            Ok(Err(err)) => {
                engine_warn!("Saving '{}' failed: {}", title, err);
                TitleOutcome::Failed(TitleFailure::Storage(err.to_string()))
            }
            Err(err) => TitleOutcome::Failed(TitleFailure::Worker(err.to_string())),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic".to_string()
    }
}

#[derive(Debug, Default)]
struct InFlight {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl InFlight {
    fn enter(&self) -> InFlightGuard<'_> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        InFlightGuard(self)
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

struct InFlightGuard<'a>(&'a InFlight);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.current.fetch_sub(1, Ordering::SeqCst);
    }
}

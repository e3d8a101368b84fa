use std::collections::VecDeque;
use std::time::Duration;

use engine_logging::{engine_debug, engine_error, engine_warn};
use serde::Deserialize;

use crate::api::ApiClient;
use crate::{FetchError, Title};

#[derive(Debug, Clone)]
pub struct SampleSettings {
    /// MediaWiki namespace filter; 0 is the article namespace.
    pub namespace: i32,
    /// Titles requested per sample call, independent of the target count.
    pub batch_size: u32,
    /// Fixed wait between a failed or empty sample call and the next attempt.
    pub backoff: Duration,
    /// Consecutive failed or empty sample calls after which the stream gives up.
    pub max_consecutive_failures: u32,
}

impl Default for SampleSettings {
    fn default() -> Self {
        Self {
            namespace: 0,
            batch_size: 50,
            backoff: Duration::from_secs(2),
            max_consecutive_failures: 5,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RandomResponse {
    #[serde(default)]
    query: Option<RandomQuery>,
}

#[derive(Debug, Deserialize)]
struct RandomQuery {
    #[serde(default)]
    random: Vec<RandomEntry>,
}

#[derive(Debug, Deserialize)]
struct RandomEntry {
    title: String,
}

/// Produces titles from the random sample endpoint.
#[derive(Debug, Clone)]
pub struct TitleSource {
    api: ApiClient,
    settings: SampleSettings,
}

impl TitleSource {
    pub fn new(api: ApiClient, settings: SampleSettings) -> Self {
        Self { api, settings }
    }

    /// Start a fresh single-pass stream that yields at most `target` titles.
    pub fn stream(&self, target: usize) -> TitleStream {
        TitleStream {
            api: self.api.clone(),
            settings: self.settings.clone(),
            target,
            yielded: 0,
            pending: VecDeque::new(),
            retry_events: 0,
            exhausted_early: false,
        }
    }
}

/// Lazy, finite sequence of titles. Batches are fetched on demand as the
/// buffered titles run out.
#[derive(Debug)]
pub struct TitleStream {
    api: ApiClient,
    settings: SampleSettings,
    target: usize,
    yielded: usize,
    pending: VecDeque<Title>,
    retry_events: usize,
    exhausted_early: bool,
}

impl TitleStream {
    /// Next title in remote order, or `None` once the target is reached or the
    /// remote kept failing past the retry bound.
    pub async fn next_title(&mut self) -> Option<Title> {
        if self.yielded >= self.target {
            return None;
        }
        if self.pending.is_empty() && !self.refill().await {
            return None;
        }
        let title = self.pending.pop_front()?;
        self.yielded += 1;
        if self.yielded >= self.target {
            // Rest of the last batch is over the target.
            self.pending.clear();
        }
        Some(title)
    }

    pub fn yielded(&self) -> usize {
        self.yielded
    }

    pub fn retry_events(&self) -> usize {
        self.retry_events
    }

    pub fn exhausted_early(&self) -> bool {
        self.exhausted_early
    }

    async fn refill(&mut self) -> bool {
        if self.exhausted_early {
            return false;
        }
        let max_failures = self.settings.max_consecutive_failures.max(1);
        let mut failures = 0;
        loop {
            match self.request_batch().await {
                Ok(batch) if !batch.is_empty() => {
                    engine_debug!("Sampled batch of {} titles", batch.len());
                    self.pending.extend(batch);
                    return true;
                }
                Ok(_) => engine_warn!("Random sample returned an empty batch"),
                Err(err) => engine_warn!("Random sample request failed: {}", err),
            }

            failures += 1;
            if failures >= max_failures {
                engine_error!(
                    "Giving up on random sample after {} consecutive failures; yielded {} of {} titles",
                    failures,
                    self.yielded,
                    self.target
                );
                self.exhausted_early = true;
                return false;
            }
            self.retry_events += 1;
            tokio::time::sleep(self.settings.backoff).await;
        }
    }

    async fn request_batch(&self) -> Result<Vec<Title>, FetchError> {
        let namespace = self.settings.namespace.to_string();
        let limit = self.settings.batch_size.to_string();
        let response: RandomResponse = self
            .api
            .get_json(&[
                ("action", "query"),
                ("list", "random"),
                ("rnnamespace", namespace.as_str()),
                ("rnlimit", limit.as_str()),
            ])
            .await?;
        Ok(response
            .query
            .map(|query| query.random)
            .unwrap_or_default()
            .into_iter()
            .map(|entry| entry.title)
            .filter(|title| !title.is_empty())
            .collect())
    }
}

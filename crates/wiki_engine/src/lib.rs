//! Wiki engine: random-sample title stream, extract fetching, document storage
//! and the bounded worker pool that ties them together.
mod api;
mod content;
mod document;
mod filename;
mod persist;
mod scraper;
mod titles;
mod types;

pub use api::{ApiClient, ApiSettings};
pub use content::ContentFetcher;
pub use document::{article_url, build_document, parse_document, DocumentParseError, StoredDocument};
pub use filename::{document_filename, sanitize_title};
pub use persist::{ensure_output_dir, AtomicFileWriter, DocumentStore, PersistError, SaveOutcome};
pub use scraper::{ProgressSink, Scraper, ScraperConfig, ScraperError};
pub use titles::{SampleSettings, TitleSource, TitleStream};
pub use types::{
    FailureKind, FetchError, RunReport, ScrapeEvent, SkipReason, Title, TitleFailure, TitleOutcome,
};

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::api::ApiClient;
use crate::FetchError;

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    query: Option<ExtractQuery>,
}

#[derive(Debug, Deserialize)]
struct ExtractQuery {
    #[serde(default)]
    pages: BTreeMap<String, ExtractPage>,
}

#[derive(Debug, Deserialize)]
struct ExtractPage {
    #[serde(default)]
    extract: Option<String>,
}

/// Looks up the plain-text extract of a single title.
#[derive(Debug, Clone)]
pub struct ContentFetcher {
    api: ApiClient,
}

impl ContentFetcher {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// `Ok(None)` means the remote has no body for `title`; transport and
    /// decoding problems are errors.
    pub async fn fetch(&self, title: &str) -> Result<Option<String>, FetchError> {
        let response: ExtractResponse = self
            .api
            .get_json(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("explaintext", "1"),
                ("titles", title),
            ])
            .await?;

        // One title per request, so at most one page comes back.
        Ok(response
            .query
            .and_then(|query| query.pages.into_values().next())
            .and_then(|page| page.extract))
    }
}

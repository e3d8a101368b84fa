#![allow(dead_code)]

use std::time::Duration;

use serde_json::json;
use wiki_engine::{ApiSettings, SampleSettings};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const API_PATH: &str = "/w/api.php";
pub const ARTICLE_BASE: &str = "https://ru.wikipedia.org/wiki/";

pub fn api_settings(server: &MockServer) -> ApiSettings {
    ApiSettings {
        endpoint: format!("{}{}", server.uri(), API_PATH),
        user_agent: "wiki-harvester-tests/1.0".to_string(),
        ..ApiSettings::default()
    }
}

pub fn sample_settings(batch_size: u32) -> SampleSettings {
    SampleSettings {
        batch_size,
        backoff: Duration::from_millis(10),
        max_consecutive_failures: 3,
        ..SampleSettings::default()
    }
}

pub fn random_batch(titles: &[&str]) -> ResponseTemplate {
    let entries: Vec<_> = titles
        .iter()
        .enumerate()
        .map(|(id, title)| json!({ "id": id, "ns": 0, "title": title }))
        .collect();
    ResponseTemplate::new(200).set_body_json(json!({
        "batchcomplete": "",
        "continue": { "rncontinue": "0.1|0.2|0|0", "continue": "-||" },
        "query": { "random": entries }
    }))
}

pub fn extract_page(title: &str, text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "batchcomplete": "",
        "query": {
            "pages": {
                "4242": { "pageid": 4242, "ns": 0, "title": title, "extract": text }
            }
        }
    }))
}

pub fn missing_page(title: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "batchcomplete": "",
        "query": {
            "pages": {
                "-1": { "ns": 0, "title": title, "missing": "" }
            }
        }
    }))
}

/// Serve one sample batch, once.
pub async fn mount_batch_once(server: &MockServer, titles: &[&str]) {
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .and(query_param("list", "random"))
        .respond_with(random_batch(titles))
        .up_to_n_times(1)
        .mount(server)
        .await;
}

/// Serve the extract for `title` on every lookup.
pub async fn mount_extract(server: &MockServer, title: &str, text: &str) {
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .and(query_param("prop", "extracts"))
        .and(query_param("titles", title))
        .respond_with(extract_page(title, text))
        .mount(server)
        .await;
}

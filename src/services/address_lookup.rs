//! Proxy for the OneMap address search used by the location field autocomplete.

use std::time::Duration;

use serde::Deserialize;

use crate::config::AddressLookupConfig;

const MIN_QUERY_CHARS: usize = 2;
const MAX_RESULTS: usize = 10;

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResult {
    #[serde(rename = "SEARCHVAL", default)]
    search_val: Option<String>,
    #[serde(rename = "ADDRESS", default)]
    address: Option<String>,
}

#[derive(Clone)]
pub struct AddressLookup {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl AddressLookup {
    pub fn new(cfg: &AddressLookupConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: cfg.base_url.clone(),
            timeout: Duration::from_secs(cfg.timeout_secs),
        }
    }

    /// Title-cased address suggestions. Upstream failures yield an empty list.
    pub async fn search(&self, query: &str) -> Vec<String> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_CHARS {
            return Vec::new();
        }

        match self.fetch(query).await {
            Ok(response) => suggestions(response),
            Err(err) => {
                tracing::warn!(error = %err, "address lookup failed");
                Vec::new()
            }
        }
    }

    async fn fetch(&self, query: &str) -> Result<SearchResponse, reqwest::Error> {
        self.client
            .get(&self.base_url)
            .query(&[
                ("searchVal", query),
                ("returnGeom", "N"),
                ("getAddrDetails", "Y"),
                ("pageNum", "1"),
            ])
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .json::<SearchResponse>()
            .await
    }
}

fn suggestions(response: SearchResponse) -> Vec<String> {
    response
        .results
        .into_iter()
        .take(MAX_RESULTS)
        .filter_map(|result| {
            [result.search_val, result.address]
                .into_iter()
                .flatten()
                .find(|value| !value.is_empty())
        })
        .map(|address| title_case(&address))
        .collect()
}

/// Upper-cases the first letter of every run of letters and lower-cases the rest, so
/// `"BLK 12A ANG MO KIO"` becomes `"Blk 12A Ang Mo Kio"`.
fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_word = false;
    for ch in raw.chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }
    out
}

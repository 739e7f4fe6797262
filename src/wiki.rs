use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{
    BASE_BACKOFF_MS, DISALLOWED_CATEGORIES, MAX_RETRIES, SEARCH_LIMIT, USER_AGENT,
};
use crate::record::WikiPage;

/// One page of search hits plus where to continue from.
#[derive(Debug)]
pub struct SearchBatch {
    pub page_ids: Vec<u64>,
    pub total_hits: usize,
    pub next_offset: Option<usize>,
}

/// MediaWiki `api.php` client. Constructed once and passed to the pipeline.
#[derive(Clone)]
pub struct WikiClient {
    http: reqwest::Client,
    api_url: String,
}

impl WikiClient {
    pub fn new(api_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            api_url: api_url.to_string(),
        })
    }

    /// Full-text search starting at `offset`.
    pub async fn search(&self, query: &str, offset: usize) -> Result<SearchBatch> {
        let params = [
            ("action", "query".to_string()),
            ("list", "search".to_string()),
            ("srsearch", query.to_string()),
            ("srlimit", SEARCH_LIMIT.to_string()),
            ("srprop", String::new()),
            ("srsort", "relevance".to_string()),
            ("sroffset", offset.to_string()),
        ];
        let value = self.request_json(&params).await?;
        let parsed: SearchResponse =
            serde_json::from_value(value).context("Failed to parse search response")?;

        Ok(SearchBatch {
            page_ids: parsed.query.search.into_iter().map(|hit| hit.pageid).collect(),
            total_hits: parsed.query.searchinfo.totalhits,
            next_offset: parsed.continuation.and_then(|c| c.sroffset),
        })
    }

    /// Latest content of the given pages, with disallowed-category membership.
    pub async fn read_pages(&self, page_ids: &[u64]) -> Result<Vec<WikiPage>> {
        let ids = page_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join("|");
        let params = [
            ("action", "query".to_string()),
            ("pageids", ids),
            ("prop", "categories|revisions".to_string()),
            ("clcategories", DISALLOWED_CATEGORIES.join("|")),
            ("cllimit", "500".to_string()),
            ("rvprop", "content".to_string()),
            ("rvslots", "main".to_string()),
        ];
        let value = self.request_json(&params).await?;
        let parsed: ReadResponse =
            serde_json::from_value(value).context("Failed to parse page response")?;

        let pages = parsed
            .query
            .pages
            .into_iter()
            .filter_map(|page| {
                let content = page
                    .revisions
                    .into_iter()
                    .next()
                    .and_then(|r| r.slots.main.content);
                let Some(content) = content else {
                    debug!("No content for {}", page.title);
                    return None;
                };
                Some(WikiPage {
                    title: page.title,
                    content,
                    categories: page.categories.into_iter().map(|c| c.title).collect(),
                })
            })
            .collect();
        Ok(pages)
    }

    async fn request_json(&self, params: &[(&str, String)]) -> Result<Value> {
        let mut pairs = vec![("format", "json".to_string()), ("formatversion", "2".to_string())];
        pairs.extend(params.iter().cloned());

        for attempt in 0..=MAX_RETRIES {
            let response = self.http.get(&self.api_url).query(&pairs).send().await;

            let retryable = match response {
                Ok(response) if response.status().is_success() => {
                    let payload: Value = response
                        .json()
                        .await
                        .context("Failed to decode API JSON response")?;
                    if let Some(error) = payload.get("error") {
                        let code = error.get("code").and_then(Value::as_str).unwrap_or("unknown");
                        let info = error.get("info").and_then(Value::as_str).unwrap_or("");
                        bail!("API error [{}]: {}", code, info);
                    }
                    return Ok(payload);
                }
                Ok(response) => {
                    let status = response.status();
                    if !is_retryable_status(status) {
                        bail!("API request failed with HTTP {}", status);
                    }
                    format!("HTTP {}", status)
                }
                Err(e) if e.is_timeout() || e.is_connect() => e.to_string(),
                Err(e) => return Err(e).context("Failed to call wiki API"),
            };

            if attempt == MAX_RETRIES {
                bail!("API request failed after {} retries: {}", MAX_RETRIES, retryable);
            }
            let backoff = Duration::from_millis(BASE_BACKOFF_MS * 2u64.pow(attempt));
            warn!(
                "{} (attempt {}/{}), backing off {:.1}s",
                retryable,
                attempt + 1,
                MAX_RETRIES,
                backoff.as_secs_f64()
            );
            tokio::time::sleep(backoff).await;
        }

        bail!("API request exhausted retry budget")
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// True when the page sits in a category whose items must not be emitted.
pub fn is_disallowed(page: &WikiPage) -> bool {
    page.categories
        .iter()
        .any(|c| DISALLOWED_CATEGORIES.contains(&c.as_str()))
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    query: SearchQuery,
    #[serde(default, rename = "continue")]
    continuation: Option<SearchContinue>,
}

#[derive(Debug, Deserialize, Default)]
struct SearchQuery {
    #[serde(default)]
    searchinfo: SearchInfo,
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize, Default)]
struct SearchInfo {
    #[serde(default)]
    totalhits: usize,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    pageid: u64,
}

#[derive(Debug, Deserialize)]
struct SearchContinue {
    sroffset: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct ReadResponse {
    #[serde(default)]
    query: ReadQuery,
}

#[derive(Debug, Deserialize, Default)]
struct ReadQuery {
    #[serde(default)]
    pages: Vec<PageItem>,
}

#[derive(Debug, Deserialize)]
struct PageItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    categories: Vec<CategoryItem>,
    #[serde(default)]
    revisions: Vec<RevisionItem>,
}

#[derive(Debug, Deserialize)]
struct CategoryItem {
    title: String,
}

#[derive(Debug, Deserialize)]
struct RevisionItem {
    slots: RevisionSlots,
}

#[derive(Debug, Deserialize)]
struct RevisionSlots {
    main: MainSlot,
}

#[derive(Debug, Deserialize)]
struct MainSlot {
    content: Option<String>,
}

// ── Tests ──

use std::sync::Arc;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::config::{NumericPolicy, Settings, CONCURRENCY, READ_CHUNK};
use crate::parser;
use crate::record::{StatRecord, WikiPage};
use crate::wiki::{self, WikiClient};

/// Counters reported after a run.
#[derive(Debug, Default)]
pub struct RunStats {
    pub pages: usize,
    pub excluded: usize,
    pub equipment_pages: usize,
    pub records: usize,
}

/// Search → read → filter → extract, batch after batch, until the search runs out.
pub async fn run(client: &WikiClient, settings: &Settings) -> Result<(Vec<StatRecord>, RunStats)> {
    let mut records = Vec::new();
    let mut stats = RunStats::default();
    let mut offset = 0;

    loop {
        let batch = client.search(&settings.search, offset).await?;
        let mut ids = batch.page_ids;
        if let Some(max) = settings.max_pages {
            ids.truncate(max.saturating_sub(stats.pages));
        }
        if ids.is_empty() {
            break;
        }

        let pages = fetch_pages(client, &ids).await?;
        let extracted = extract_pages(&pages, settings.numeric)?;

        stats.pages += pages.len();
        stats.excluded += extracted.excluded;
        stats.equipment_pages += extracted.equipment_pages;
        stats.records += extracted.records.len();
        records.extend(extracted.records);

        info!("Finished {}/{}", stats.pages, batch.total_hits);

        let limit_reached = settings.max_pages.is_some_and(|max| stats.pages >= max);
        match batch.next_offset {
            Some(next) if !limit_reached => offset = next,
            _ => break,
        }
    }

    Ok((records, stats))
}

/// Read pages in chunks concurrently; output keeps the order of `ids`.
async fn fetch_pages(client: &WikiClient, ids: &[u64]) -> Result<Vec<WikiPage>> {
    let semaphore = Arc::new(Semaphore::new(CONCURRENCY));
    let chunks: Vec<Vec<u64>> = ids.chunks(READ_CHUNK).map(|c| c.to_vec()).collect();
    let total = chunks.len();

    let pb = ProgressBar::new(ids.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    let (tx, mut rx) = tokio::sync::mpsc::channel::<(usize, Result<Vec<WikiPage>>)>(CONCURRENCY * 2);

    for (idx, chunk) in chunks.into_iter().enumerate() {
        let client = client.clone();
        let sem = Arc::clone(&semaphore);
        let tx = tx.clone();

        tokio::spawn(async move {
            let result = match sem.acquire().await {
                Ok(_permit) => client.read_pages(&chunk).await,
                Err(e) => Err(e.into()),
            };
            let _ = tx.send((idx, result)).await;
        });
    }

    // rx closes once every task has sent
    drop(tx);

    let mut results = Vec::with_capacity(total);
    while let Some((idx, result)) = rx.recv().await {
        let pages = result.with_context(|| format!("Failed to read page chunk {}", idx))?;
        pb.inc(pages.len() as u64);
        results.push((idx, pages));
    }
    pb.finish_and_clear();

    results.sort_by_key(|(idx, _)| *idx);
    Ok(results.into_iter().flat_map(|(_, pages)| pages).collect())
}

pub struct Extracted {
    pub records: Vec<StatRecord>,
    pub excluded: usize,
    pub equipment_pages: usize,
}

/// Run the extractor over every allowed page in parallel.
pub fn extract_pages(pages: &[WikiPage], policy: NumericPolicy) -> Result<Extracted> {
    let (allowed, excluded): (Vec<&WikiPage>, Vec<&WikiPage>) =
        pages.iter().partition(|p| !wiki::is_disallowed(p));
    for page in &excluded {
        debug!("Skipping {} (excluded category)", page.title);
    }

    let per_page = allowed
        .par_iter()
        .map(|page| {
            parser::extract_page(&page.content, &page.title, policy)
                .with_context(|| format!("Failed to extract '{}'", page.title))
        })
        .collect::<Result<Vec<Vec<StatRecord>>>>()?;

    let equipment_pages = per_page.iter().filter(|r| !r.is_empty()).count();
    Ok(Extracted {
        records: per_page.into_iter().flatten().collect(),
        excluded: excluded.len(),
        equipment_pages,
    })
}

// ── Tests ──

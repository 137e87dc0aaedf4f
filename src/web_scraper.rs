use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::{header, Client};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, error, info};

use crate::{
    config::{RegionConfig, Settings},
    error::{Error, Result},
    models::{capitalize, ChartEntry, RegionInfo, Track},
    retry::RetryPolicy,
};

/// Candidate chart tables, tried in order. The first one present wins.
pub const TABLE_SELECTORS: [&str; 5] = [
    "table.display",
    "table.addpos",
    "table#spotifyweekly",
    "table.data",
    "table.chart",
];

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[async_trait]
pub trait ChartSource: Send + Sync {
    /// Ranked tracks for `region`, at most `limit` of them, in chart order.
    async fn get_charts(&self, region: &str, limit: usize) -> Result<Vec<Track>>;

    fn available_regions(&self) -> Vec<RegionInfo>;
}

pub struct KworbChartSource {
    client: Client,
    regions: BTreeMap<String, RegionConfig>,
    retry: RetryPolicy,
}

impl KworbChartSource {
    pub fn new(regions: BTreeMap<String, RegionConfig>, retry: RetryPolicy) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(retry.timeout)
            .build()?;
        Ok(Self {
            client,
            regions,
            retry,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(settings.regions.clone(), RetryPolicy::from_settings(settings))
    }

    fn url_for(&self, region: &str) -> Result<&str> {
        self.regions
            .get(&region.trim().to_lowercase())
            .map(|r| r.url.as_str())
            .ok_or_else(|| Error::Scraping(format!("Unsupported region: {region}")))
    }

    async fn fetch_page(&self, url: &str) -> Result<String> {
        let client = &self.client;
        let html = self
            .retry
            .run(&format!("GET {url}"), || async move {
                let response = client
                    .get(url)
                    .header(header::ACCEPT, "text/html")
                    .send()
                    .await?
                    .error_for_status()?;
                Ok::<_, Error>(response.text().await?)
            })
            .await
            .map_err(|e| {
                error!("Failed to fetch {url} after {} attempts", self.retry.max_attempts);
                Error::Scraping(format!("Failed to fetch {url}: {e}"))
            })?;
        info!("Fetched {url} ({} bytes)", html.len());
        Ok(html)
    }
}

#[async_trait]
impl ChartSource for KworbChartSource {
    async fn get_charts(&self, region: &str, limit: usize) -> Result<Vec<Track>> {
        info!("Fetching {region} charts from kworb (limit: {limit})");
        let url = self.url_for(region)?.to_string();
        let html = self.fetch_page(&url).await?;

        let entries = parse_chart(&html, region, limit)?;
        let tracks: Vec<Track> = entries.iter().map(ChartEntry::to_track).collect();
        info!("Retrieved {} tracks from {region}", tracks.len());
        Ok(tracks)
    }

    fn available_regions(&self) -> Vec<RegionInfo> {
        self.regions
            .iter()
            .map(|(name, cfg)| RegionInfo {
                name: name.clone(),
                display_name: cfg
                    .display_name
                    .clone()
                    .unwrap_or_else(|| capitalize(name)),
                url: cfg.url.clone(),
            })
            .collect()
    }
}

/// Extracts up to `limit` chart entries from a kworb chart page.
pub fn parse_chart(html: &str, region: &str, limit: usize) -> Result<Vec<ChartEntry>> {
    let document = Html::parse_document(html);

    let table = find_table(&document).ok_or_else(|| {
        error!("No chart table matched any known selector");
        Error::Scraping("Table not found - site structure may have changed".into())
    })?;

    let tbody = child_elements(table, "tbody")
        .next()
        .ok_or_else(|| Error::Scraping("Table body not found".into()))?;

    let anchor_selector = selector("a[href]")?;

    let entries: Vec<ChartEntry> = child_elements(tbody, "tr")
        .enumerate()
        .filter_map(|(index, row)| {
            track_id_from_row(row, &anchor_selector).map(|track_id| ChartEntry {
                track_id,
                position: index + 1,
                region: region.to_string(),
            })
        })
        .take(limit)
        .collect();

    debug!("Extracted {} chart entries", entries.len());
    Ok(entries)
}

fn find_table(document: &Html) -> Option<ElementRef<'_>> {
    TABLE_SELECTORS.iter().find_map(|css| {
        let sel = Selector::parse(css).ok()?;
        let table = document.select(&sel).next();
        if table.is_some() {
            debug!("Found chart table with selector {css}");
        }
        table
    })
}

fn child_elements<'a>(
    parent: ElementRef<'a>,
    tag: &'static str,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |child| child.value().name() == tag)
}

fn track_id_from_row(row: ElementRef<'_>, anchors: &Selector) -> Option<String> {
    row.select(anchors)
        .filter_map(|a| a.value().attr("href"))
        .find_map(track_id_from_href)
}

/// `../track/<id>.html` → `<id>`
pub fn track_id_from_href(href: &str) -> Option<String> {
    let id = href
        .trim()
        .strip_prefix("../track/")?
        .strip_suffix(".html")?
        .trim();
    if id.is_empty() || id.contains('/') {
        None
    } else {
        Some(id.to_string())
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Scraping(format!("Invalid selector {css}: {e}")))
}

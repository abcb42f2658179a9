//! Engine property tests
//!
//! These tests drive the crawler with an in-memory site whose downloader and
//! documents count how many calls are in flight, so the concurrency caps,
//! deduplication and shutdown behavior can be checked without a network.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use sumi_tide::{extract_host, Crawler, CrawlerConfig, Document, Downloader, TideError};

/// Tracks a current and a peak count
#[derive(Debug, Default)]
struct Gauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl Gauge {
    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
enum Page {
    Links(Vec<String>),
    BrokenHtml,
}

/// Counters shared by the site and every document it hands out
#[derive(Debug, Default)]
struct Probe {
    downloads: Gauge,
    extractions: Gauge,
    extract_calls: AtomicUsize,
    fetches: Mutex<HashMap<String, usize>>,
    per_host: Mutex<HashMap<String, (usize, usize)>>,
}

impl Probe {
    fn fetch_count(&self, url: &str) -> usize {
        self.fetches.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    fn total_fetches(&self) -> usize {
        self.fetches.lock().unwrap().values().sum()
    }

    fn host_peak(&self, host: &str) -> usize {
        self.per_host
            .lock()
            .unwrap()
            .get(host)
            .map(|(_, peak)| *peak)
            .unwrap_or(0)
    }

    fn enter_host(&self, host: &str) {
        let mut hosts = self.per_host.lock().unwrap();
        let entry = hosts.entry(host.to_string()).or_insert((0, 0));
        entry.0 += 1;
        entry.1 = entry.1.max(entry.0);
    }

    fn leave_host(&self, host: &str) {
        let mut hosts = self.per_host.lock().unwrap();
        if let Some(entry) = hosts.get_mut(host) {
            entry.0 -= 1;
        }
    }
}

/// An in-memory link graph with simulated latency
#[derive(Default)]
struct Site {
    pages: HashMap<String, Page>,
    fetch_delay: Duration,
    extract_delay: Duration,
    probe: Arc<Probe>,
}

impl Site {
    fn page(mut self, url: &str, links: &[&str]) -> Self {
        self.pages.insert(
            url.to_string(),
            Page::Links(links.iter().map(|l| l.to_string()).collect()),
        );
        self
    }

    fn broken(mut self, url: &str) -> Self {
        self.pages.insert(url.to_string(), Page::BrokenHtml);
        self
    }

    fn fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = delay;
        self
    }

    fn extract_delay(mut self, delay: Duration) -> Self {
        self.extract_delay = delay;
        self
    }

    fn build(self) -> (Arc<Self>, Arc<Probe>) {
        let probe = Arc::clone(&self.probe);
        (Arc::new(self), probe)
    }
}

struct SiteDocument {
    url: String,
    page: Page,
    delay: Duration,
    probe: Arc<Probe>,
}

#[async_trait]
impl Document for SiteDocument {
    async fn extract_links(&self) -> sumi_tide::Result<Vec<String>> {
        self.probe.extract_calls.fetch_add(1, Ordering::SeqCst);
        self.probe.extractions.enter();
        tokio::time::sleep(self.delay).await;
        self.probe.extractions.leave();

        match &self.page {
            Page::Links(links) => Ok(links.clone()),
            Page::BrokenHtml => Err(TideError::Extract {
                url: self.url.clone(),
                message: "unterminated document".to_string(),
            }),
        }
    }
}

#[async_trait]
impl Downloader for Site {
    async fn download(&self, url: &str) -> sumi_tide::Result<Box<dyn Document>> {
        let host = extract_host(url)?;
        *self
            .probe
            .fetches
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_insert(0) += 1;

        self.probe.downloads.enter();
        self.probe.enter_host(&host);
        tokio::time::sleep(self.fetch_delay).await;
        self.probe.leave_host(&host);
        self.probe.downloads.leave();

        match self.pages.get(url) {
            Some(page) => Ok(Box::new(SiteDocument {
                url: url.to_string(),
                page: page.clone(),
                delay: self.extract_delay,
                probe: Arc::clone(&self.probe),
            })),
            None => Err(TideError::HttpStatus {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

fn assert_disjoint(result: &sumi_tide::CrawlResult) {
    let downloaded: HashSet<&String> = result.downloaded.iter().collect();
    assert_eq!(downloaded.len(), result.downloaded.len(), "duplicate download");
    for address in result.errors.keys() {
        assert!(
            !downloaded.contains(address),
            "{} is both downloaded and failed",
            address
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shared_link_is_downloaded_once() {
    let (site, probe) = Site::default()
        .page("https://a.example/", &["https://a.example/b", "https://a.example/c"])
        .page("https://a.example/b", &["https://a.example/d"])
        .page("https://a.example/c", &["https://a.example/d"])
        .page("https://a.example/d", &[])
        .fetch_delay(Duration::from_millis(5))
        .build();
    let crawler = Crawler::with_limits(site, 4, 4, 4).unwrap();

    let result = crawler.crawl("https://a.example/", 3).await.unwrap();

    assert_eq!(
        result.downloaded,
        vec![
            "https://a.example/",
            "https://a.example/b",
            "https://a.example/c",
            "https://a.example/d",
        ]
    );
    assert_eq!(probe.fetch_count("https://a.example/d"), 1);
    assert_eq!(probe.total_fetches(), 4);
    assert_disjoint(&result);
    crawler.shutdown().await;
}

#[tokio::test]
async fn test_depth_one_never_extracts() {
    let (site, probe) = Site::default()
        .page("https://a.example/", &["https://a.example/next"])
        .page("https://a.example/next", &[])
        .build();
    let crawler = Crawler::with_limits(site, 2, 2, 1).unwrap();

    let result = crawler.crawl("https://a.example/", 1).await.unwrap();

    assert_eq!(result.downloaded, vec!["https://a.example/"]);
    assert!(result.errors.is_empty());
    assert_eq!(probe.extract_calls.load(Ordering::SeqCst), 0);
    assert_eq!(probe.total_fetches(), 1);
    crawler.shutdown().await;
}

#[tokio::test]
async fn test_depth_one_failure_is_the_only_entry() {
    let (site, probe) = Site::default().build();
    let crawler = Crawler::with_limits(site, 1, 1, 1).unwrap();

    let result = crawler.crawl("https://gone.example/", 1).await.unwrap();

    assert!(result.downloaded.is_empty());
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors["https://gone.example/"].is_fetch_failure());
    assert_eq!(
        result.error_message("https://gone.example/").unwrap(),
        "HTTP 404 for https://gone.example/"
    );
    assert_eq!(probe.extract_calls.load(Ordering::SeqCst), 0);
    crawler.shutdown().await;
}

#[tokio::test]
async fn test_cycle_terminates() {
    let (site, probe) = Site::default()
        .page("https://a.example/", &["https://b.example/"])
        .page("https://b.example/", &["https://a.example/"])
        .build();
    let crawler = Crawler::with_limits(site, 2, 2, 1).unwrap();

    let result = tokio::time::timeout(
        Duration::from_secs(10),
        crawler.crawl("https://a.example/", 3),
    )
    .await
    .expect("cyclic crawl did not terminate")
    .unwrap();

    assert_eq!(
        result.downloaded,
        vec!["https://a.example/", "https://b.example/"]
    );
    assert_eq!(probe.fetch_count("https://a.example/"), 1);
    assert_eq!(probe.fetch_count("https://b.example/"), 1);
    crawler.shutdown().await;
}

#[tokio::test]
async fn test_self_link_is_ignored() {
    let (site, probe) = Site::default()
        .page("https://a.example/", &["https://a.example/", "https://a.example/"])
        .build();
    let crawler = Crawler::with_limits(site, 1, 1, 1).unwrap();

    let result = crawler.crawl("https://a.example/", 5).await.unwrap();

    assert_eq!(result.downloaded, vec!["https://a.example/"]);
    assert_eq!(probe.total_fetches(), 1);
    crawler.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_per_host_cap_binds() {
    let same_host: Vec<String> = (0..12)
        .map(|i| format!("https://busy.example/{}", i))
        .collect();
    let links: Vec<&str> = same_host.iter().map(String::as_str).collect();

    let mut site = Site::default()
        .page("https://start.example/", &links)
        .fetch_delay(Duration::from_millis(20));
    for url in &same_host {
        site = site.page(url, &[]);
    }
    let (site, probe) = site.build();
    let crawler = Crawler::with_limits(site, 8, 2, 2).unwrap();

    let result = crawler.crawl("https://start.example/", 2).await.unwrap();

    assert_eq!(result.downloaded.len(), 13);
    assert!(result.errors.is_empty());
    assert_eq!(probe.host_peak("busy.example"), 2);
    assert!(probe.downloads.peak() <= 8);
    crawler.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_download_pool_cap_binds() {
    let hosts: Vec<String> = (0..10)
        .map(|i| format!("https://host{}.example/", i))
        .collect();
    let links: Vec<&str> = hosts.iter().map(String::as_str).collect();

    let mut site = Site::default()
        .page("https://start.example/", &links)
        .fetch_delay(Duration::from_millis(20));
    for url in &hosts {
        site = site.page(url, &[]);
    }
    let (site, probe) = site.build();
    let crawler = Crawler::with_limits(site, 3, 1, 1).unwrap();

    let result = crawler.crawl("https://start.example/", 2).await.unwrap();

    assert_eq!(result.downloaded.len(), 11);
    assert_eq!(probe.downloads.peak(), 3);
    for host in 0..10 {
        assert!(probe.host_peak(&format!("host{}.example", host)) <= 1);
    }
    crawler.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_extraction_pool_cap_binds() {
    let pages: Vec<String> = (0..8)
        .map(|i| format!("https://site{}.example/", i))
        .collect();
    let links: Vec<&str> = pages.iter().map(String::as_str).collect();

    let mut site = Site::default()
        .page("https://start.example/", &links)
        .extract_delay(Duration::from_millis(20));
    for url in &pages {
        site = site.page(url, &["https://leaf.example/"]);
    }
    site = site.page("https://leaf.example/", &[]);
    let (site, probe) = site.build();
    let crawler = Crawler::with_limits(site, 8, 2, 1).unwrap();

    let result = crawler.crawl("https://start.example/", 3).await.unwrap();

    assert_eq!(result.downloaded.len(), 10);
    assert!(probe.extractions.peak() <= 2);
    // Only the start page and its children are extracted; the leaf is at
    // the last level.
    assert_eq!(probe.extract_calls.load(Ordering::SeqCst), 9);
    crawler.shutdown().await;
}

#[tokio::test]
async fn test_failures_are_recorded_per_address() {
    let (site, _probe) = Site::default()
        .page(
            "https://a.example/",
            &[
                "https://a.example/ok",
                "https://a.example/missing",
                "https://a.example/broken",
                "not a url",
            ],
        )
        .page("https://a.example/ok", &[])
        .broken("https://a.example/broken")
        .build();
    let crawler = Crawler::with_limits(site, 2, 2, 1).unwrap();

    let result = crawler.crawl("https://a.example/", 3).await.unwrap();

    assert_eq!(
        result.downloaded,
        vec!["https://a.example/", "https://a.example/ok"]
    );
    assert_eq!(result.errors.len(), 3);
    assert!(result.errors["https://a.example/missing"].is_fetch_failure());
    assert!(result.errors["https://a.example/broken"].is_extract_failure());
    assert!(result.errors["not a url"].is_fetch_failure());
    assert!(!result.is_downloaded("https://a.example/broken"));
    assert_disjoint(&result);
    crawler.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_mid_crawl_returns_promptly() {
    let (site, _probe) = Site::default()
        .page("https://slow.example/", &["https://slow.example/next"])
        .fetch_delay(Duration::from_secs(60))
        .build();
    let config = CrawlerConfig::new(2, 1, 1).with_shutdown_grace(Duration::from_millis(50));
    let crawler = Arc::new(Crawler::new(site, &config).unwrap());

    let running = {
        let crawler = Arc::clone(&crawler);
        tokio::spawn(async move { crawler.crawl("https://slow.example/", 3).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let started = Instant::now();
    crawler.shutdown().await;
    let result = tokio::time::timeout(Duration::from_secs(5), running)
        .await
        .expect("crawl hung after shutdown")
        .unwrap()
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(result.downloaded.is_empty());
    assert!(result.errors["https://slow.example/"].is_interrupted());
    assert!(crawler.is_closed());
}

#[tokio::test]
async fn test_shutdown_drains_in_flight_downloads() {
    let (site, _probe) = Site::default()
        .page("https://a.example/", &[])
        .fetch_delay(Duration::from_millis(100))
        .build();
    let config = CrawlerConfig::new(1, 1, 1).with_shutdown_grace(Duration::from_secs(5));
    let crawler = Arc::new(Crawler::new(site, &config).unwrap());

    let running = {
        let crawler = Arc::clone(&crawler);
        tokio::spawn(async move { crawler.crawl("https://a.example/", 1).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    crawler.shutdown().await;

    let result = running.await.unwrap().unwrap();
    assert_eq!(result.downloaded, vec!["https://a.example/"]);
    assert!(result.errors.is_empty());
}

#[tokio::test]
async fn test_shutdown_is_idempotent() {
    let (site, _probe) = Site::default().build();
    let crawler = Crawler::with_limits(site, 1, 1, 1).unwrap();

    crawler.shutdown().await;
    crawler.shutdown().await;

    assert!(matches!(
        crawler.crawl("https://a.example/", 1).await,
        Err(TideError::Shutdown)
    ));
}

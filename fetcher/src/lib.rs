//! HTTP [`PageSource`] backed by reqwest, with HTML text extraction through scraper.

use anyhow::Result;
use reqwest::{header, Client, StatusCode};
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::runtime::Runtime;
use url::Url;
use urlindex_core::{FetchError, PageSource};

/// Which part of a page becomes the document text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    #[default]
    Body,
    Title,
    Headers,
    Paragraphs,
}

impl ContentKind {
    pub fn selector(self) -> &'static str {
        match self {
            ContentKind::Body => "body",
            ContentKind::Title => "title",
            ContentKind::Headers => "h1, h2, h3, h4, h5, h6",
            ContentKind::Paragraphs => "p",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Whole-request timeout; a slower page is reported as [`FetchError::Timeout`].
    pub timeout: Duration,
    pub user_agent: String,
    pub max_redirects: usize,
    pub max_body_bytes: usize,
    pub content: ContentKind,
    /// Honour HTTP_PROXY and friends from the environment.
    pub system_proxy: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(12),
            user_agent: "urlindex-bot/0.1 (+https://example.com/bot)".to_string(),
            max_redirects: 5,
            max_body_bytes: 2 * 1024 * 1024,
            content: ContentKind::Body,
            system_proxy: true,
        }
    }
}

/// Blocking page source. Owns a small tokio runtime; `fetch` must not be called from
/// inside another async runtime.
pub struct HttpPageSource {
    client: Client,
    runtime: Runtime,
    config: FetchConfig,
}

impl HttpPageSource {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .timeout(config.timeout);
        if !config.system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build()?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("urlindex-fetch")
            .enable_all()
            .build()?;
        Ok(Self { client, runtime, config })
    }

    async fn fetch_async(&self, raw: &str) -> Result<String, FetchError> {
        let url = parse_url(raw)?;
        let mut resp = self.client.get(url).send().await.map_err(classify)?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return Err(FetchError::NotFound);
        }
        if !status.is_success() {
            return Err(FetchError::Http(status.as_u16()));
        }
        if let Some(ct) = resp.headers().get(header::CONTENT_TYPE) {
            if let Ok(v) = ct.to_str() {
                if !(v.starts_with("text/html") || v.starts_with("application/xhtml+xml")) {
                    return Err(FetchError::Parse(format!("unsupported content type {v}")));
                }
            }
        }
        let limit = self.config.max_body_bytes;
        if resp.content_length().is_some_and(|len| len > limit as u64) {
            return Err(body_too_large(limit));
        }
        // stream so an oversized body without a length header is cut off early
        let mut bytes = Vec::new();
        while let Some(chunk) = resp.chunk().await.map_err(classify)? {
            if bytes.len() + chunk.len() > limit {
                return Err(body_too_large(limit));
            }
            bytes.extend_from_slice(&chunk);
        }
        tracing::debug!(url = raw, status = status.as_u16(), bytes = bytes.len(), "fetched page");
        let body = String::from_utf8_lossy(&bytes);
        extract_text(&body, self.config.content)
    }
}

impl PageSource for HttpPageSource {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.runtime.block_on(self.fetch_async(url))
    }
}

fn body_too_large(limit: usize) -> FetchError {
    FetchError::Parse(format!("body exceeds limit of {limit} bytes"))
}

fn classify(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Network(err.to_string())
    }
}

/// Accept absolute http(s) urls, and bare host names by assuming https.
pub fn parse_url(raw: &str) -> Result<Url, FetchError> {
    let s = raw.trim();
    let is_web = |u: &Url| matches!(u.scheme(), "http" | "https");
    match Url::parse(s) {
        Ok(u) if is_web(&u) => Ok(u),
        _ => match Url::parse(&format!("https://{s}")) {
            Ok(u) if u.host_str().is_some() => Ok(u),
            Ok(_) => Err(FetchError::InvalidUrl(s.to_string())),
            Err(e) => Err(FetchError::InvalidUrl(format!("{s}: {e}"))),
        },
    }
}

/// Text of every element matching `content`. Text nodes are joined by a space so
/// words from adjacent elements stay apart. A page without any matching element is
/// a parse failure.
pub fn extract_text(html: &str, content: ContentKind) -> Result<String, FetchError> {
    let selector = Selector::parse(content.selector()).map_err(|e| FetchError::Parse(e.to_string()))?;
    let doc = Html::parse_document(html);
    let parts: Vec<String> = doc.select(&selector).map(|n| n.text().collect::<Vec<_>>().join(" ")).collect();
    if parts.is_empty() {
        return Err(FetchError::Parse(format!("no `{}` element", content.selector())));
    }
    Ok(parts.join(" "))
}

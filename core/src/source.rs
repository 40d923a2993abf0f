use crate::error::FetchError;
use std::collections::HashMap;

/// Anything that can turn a url into extracted plain text.
///
/// Implementations are expected to bound their own latency (for example with a
/// request timeout) and report it as [`FetchError::Timeout`].
pub trait PageSource {
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

impl<F> PageSource for F
where
    F: Fn(&str) -> Result<String, FetchError>,
{
    fn fetch(&self, url: &str) -> Result<String, FetchError> { self(url) }
}

/// Fixed responses keyed by url. Unknown urls are [`FetchError::NotFound`].
#[derive(Debug, Clone, Default)]
pub struct StaticPages {
    pages: HashMap<String, Result<String, FetchError>>,
}

impl StaticPages {
    pub fn new() -> Self { Self::default() }

    pub fn with_page(mut self, url: impl Into<String>, text: impl Into<String>) -> Self {
        self.pages.insert(url.into(), Ok(text.into()));
        self
    }

    pub fn with_failure(mut self, url: impl Into<String>, err: FetchError) -> Self {
        self.pages.insert(url.into(), Err(err));
        self
    }
}

impl PageSource for StaticPages {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.pages.get(url).cloned().unwrap_or(Err(FetchError::NotFound))
    }
}

//! Sequential fragment loading.

use crate::assemble::{self, AssembleError};
use crate::index::{FragmentIndex, IndexError};
use crate::page::Document;
use crate::source::{FetchError, FragmentSource};
use pomar_core::RetryPolicy;
use std::time::Duration;

/// Where the index lives, relative to the base.
pub const INDEX_PATH: &str = "fragments/index.txt";

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(5);
pub const RETRY_DELAY: Duration = Duration::from_secs(1);
pub const FRAGMENT_DELAY: Duration = Duration::from_millis(300);
pub const LAYOUT_REFRESH_DELAY: Duration = Duration::from_millis(100);

/// Path of fragment `index`.
pub fn fragment_path(index: usize) -> String {
    format!("/fragments/fragment_{index}")
}

#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Per-request timeout.
    pub fetch_timeout: Duration,
    /// Retry for a failed fragment.
    pub retry: RetryPolicy,
    /// Pause after each fragment.
    pub fragment_delay: Duration,
    /// Wait between the resize event and the forced reflow.
    pub layout_refresh_delay: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: FETCH_TIMEOUT,
            retry: RetryPolicy::forever(RETRY_DELAY),
            fragment_delay: FRAGMENT_DELAY,
            layout_refresh_delay: LAYOUT_REFRESH_DELAY,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("failed to load index: {0}")]
    IndexFetch(#[source] FetchError),
    #[error("bad index: {0}")]
    Index(#[from] IndexError),
    #[error("gave up on fragment {index} after {attempts} attempts: {last}")]
    GaveUp {
        index: usize,
        attempts: u32,
        #[source]
        last: FetchError,
    },
    #[error("failed to assemble content: {0}")]
    Assemble(#[from] AssembleError),
}

/// Fetches the index, then every fragment in order, then assembles the page.
pub struct ContentLoader<S> {
    source: S,
    config: LoaderConfig,
}

impl<S: FragmentSource> ContentLoader<S> {
    pub fn new(source: S, config: LoaderConfig) -> Self {
        Self { source, config }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch and parse the index. Not retried.
    pub async fn load_index(&self) -> Result<FragmentIndex, LoaderError> {
        let text = self
            .source
            .fetch(INDEX_PATH)
            .await
            .map_err(LoaderError::IndexFetch)?;
        Ok(text.parse()?)
    }

    /// Fetch one fragment, retrying the same fragment until it arrives or the
    /// retry policy gives up.
    pub async fn fetch_fragment(&self, index: usize) -> Result<String, LoaderError> {
        let path = fragment_path(index);
        let mut attempts = 0;
        loop {
            attempts += 1;
            let fetch = self.source.fetch(&path);
            let error = match tokio::time::timeout(self.config.fetch_timeout, fetch).await {
                Ok(Ok(text)) => return Ok(text),
                Ok(Err(e)) => e,
                Err(_) => FetchError::Timeout {
                    path: path.clone(),
                    after: self.config.fetch_timeout,
                },
            };
            tracing::warn!("Failed to load fragment {}: {}", index, error);
            if !self.config.retry.allows_another(attempts) {
                return Err(LoaderError::GaveUp {
                    index,
                    attempts,
                    last: error,
                });
            }
            tokio::time::sleep(self.config.retry.delay).await;
        }
    }

    /// Load everything into `doc`.
    ///
    /// On failure the container shows the error panel and the error is
    /// returned for logging.
    pub async fn load_all(&self, doc: &mut Document) -> Result<(), LoaderError> {
        let result = self.load_into(doc).await;
        if let Err(e) = &result {
            tracing::error!("{}", e);
            doc.show_error();
        }
        result
    }

    async fn load_into(&self, doc: &mut Document) -> Result<(), LoaderError> {
        let index = self.load_index().await?;
        tracing::info!(
            "Loading {} fragments ({} bytes)",
            index.fragments,
            index.filesize.map_or_else(|| "?".to_string(), |s| s.to_string())
        );

        let mut fragments = Vec::new();
        for i in 0..index.fragments {
            fragments.push(self.fetch_fragment(i).await?);
            doc.set_progress(i + 1, index.fragments);
            tracing::debug!("Fragment {} loaded ({:.0}%)", i, doc.progress());
            tokio::time::sleep(self.config.fragment_delay).await;
        }

        self.assemble(&fragments, doc).await
    }

    /// Concatenate `fragments`, parse the result and splice it into `doc`.
    pub async fn assemble(
        &self,
        fragments: &[String],
        doc: &mut Document,
    ) -> Result<(), LoaderError> {
        doc.set_loading_message("Starting the system...");
        let parsed = assemble::parse(&fragments.concat())?;
        doc.splice(parsed);

        doc.dispatch_resize();
        tokio::time::sleep(self.config.layout_refresh_delay).await;
        doc.reflow();
        tracing::info!("Content assembled");
        Ok(())
    }
}

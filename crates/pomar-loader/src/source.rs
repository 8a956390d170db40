//! Where fragments come from.

use std::future::Future;
use std::time::Duration;
use url::Url;

/// Fetches text resources by path.
///
/// Paths are resolved the way a page resolves them: relative paths against
/// the base, absolute paths against the host root.
pub trait FragmentSource: Send + Sync {
    fn fetch(&self, path: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("GET {path} returned {status}")]
    Status { path: String, status: u16 },
    #[error("GET {path} timed out after {after:?}")]
    Timeout { path: String, after: Duration },
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Fetches over HTTP with reqwest.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base: Url,
}

impl HttpSource {
    pub fn new(base: &str) -> Result<Self, FetchError> {
        Ok(Self {
            client: reqwest::Client::new(),
            base: Url::parse(base)?,
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn resolve(&self, path: &str) -> Result<Url, FetchError> {
        Ok(self.base.join(path)?)
    }
}

impl FragmentSource for HttpSource {
    async fn fetch(&self, path: &str) -> Result<String, FetchError> {
        let url = self.resolve(path)?;
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}

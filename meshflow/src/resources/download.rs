//! Resource download capability.

use crate::errors::DownloadError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Fetches a remote resource into a local directory.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResourceProvider: Send + Sync {
    /// Downloads `url` into `dest_dir` and returns the written file's path.
    ///
    /// Fails on a non-2xx status or any transport or write error.
    async fn fetch(&self, url: &str, dest_dir: &Path) -> Result<PathBuf, DownloadError>;
}

/// Derives a local file name from the last path segment of a URL.
pub(crate) fn file_name_from_url(url: &str) -> String {
    let without_suffix = url.split(['?', '#']).next().unwrap_or(url);
    without_suffix
        .rsplit('/')
        .find(|segment| !segment.is_empty() && !segment.contains(':'))
        .map_or_else(|| "resource".to_string(), ToString::to_string)
}

/// [`ResourceProvider`] that performs HTTP GET requests.
#[cfg(feature = "download")]
#[derive(Debug, Clone, Default)]
pub struct HttpResourceProvider {
    client: reqwest::Client,
}

#[cfg(feature = "download")]
impl HttpResourceProvider {
    /// Creates a provider with a default client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider around an existing client.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[cfg(feature = "download")]
#[async_trait]
impl ResourceProvider for HttpResourceProvider {
    async fn fetch(&self, url: &str, dest_dir: &Path) -> Result<PathBuf, DownloadError> {
        tracing::info!(url, "Downloading resource");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::new(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::status(url, status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| DownloadError::new(url, format!("failed to read body: {e}")))?;

        let path = dest_dir.join(file_name_from_url(url));
        tokio::fs::write(&path, &body).await.map_err(|e| {
            DownloadError::new(url, format!("failed to write {}: {e}", path.display()))
        })?;

        tracing::info!(url, path = %path.display(), bytes = body.len(), "Downloaded resource");
        Ok(path)
    }
}

/// [`ResourceProvider`] used when downloads are not available.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableResourceProvider;

#[async_trait]
impl ResourceProvider for UnavailableResourceProvider {
    async fn fetch(&self, url: &str, _dest_dir: &Path) -> Result<PathBuf, DownloadError> {
        Err(DownloadError::new(url, "downloads are not available in this build"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_from_url() {
        assert_eq!(
            file_name_from_url(crate::config::DEFAULT_CAMERA_DATABASE_URL),
            "sensor_width_camera_database.txt"
        );
        assert_eq!(file_name_from_url("https://host/db.txt?rev=2#top"), "db.txt");
        assert_eq!(file_name_from_url("https://host/dir/"), "dir");
        assert_eq!(file_name_from_url("https://"), "resource");
    }

    #[tokio::test]
    async fn test_unavailable_provider_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let err = UnavailableResourceProvider
            .fetch("https://host/db.txt", tmp.path())
            .await
            .unwrap_err();
        assert_eq!(err.url, "https://host/db.txt");
        assert!(err.status.is_none());
    }

    #[tokio::test]
    async fn test_mock_provider_contract() {
        let mut provider = MockResourceProvider::new();
        provider
            .expect_fetch()
            .withf(|url, _| url.ends_with("db.txt"))
            .times(1)
            .returning(|_, dir| Ok(dir.join("db.txt")));

        let path = provider.fetch("https://host/db.txt", Path::new("/tmp/x")).await.unwrap();
        assert_eq!(path, PathBuf::from("/tmp/x/db.txt"));
    }
}

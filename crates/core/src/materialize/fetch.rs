use std::time::Duration;

/// Downloads a dependency manifest by URL.
pub trait DependencyFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, String>;
}

/// Blocking HTTP fetcher.
pub struct HttpFetcher {
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl DependencyFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, String> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| format!("failed to build HTTP client: {e}"))?;
        let response = client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| format!("request failed: {e}"))?;
        let bytes = response.bytes().map_err(|e| format!("failed to read body: {e}"))?;
        Ok(bytes.to_vec())
    }
}

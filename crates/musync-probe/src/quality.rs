//! HTTP bandwidth-quality probe.
//!
//! For every target: latency to the first response, download throughput
//! over the streamed body and, when an upload URL is configured, upload
//! throughput of a fixed payload. Each part fails independently.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use musync_core::{QualityReport, QualitySample};
use reqwest::Client;
use tracing::{debug, warn};

use crate::{ProbeError, QualityProbe};

/// One endpoint to measure against.
#[derive(Debug, Clone)]
pub struct QualityTarget {
    pub name: String,
    pub download_url: String,
    pub upload_url: Option<String>,
}

/// Quality probe measuring plain HTTP(S) transfers.
#[derive(Debug)]
pub struct HttpQualityProbe {
    client: Client,
    targets: Vec<QualityTarget>,
    timeout: Duration,
    upload_bytes: usize,
}

impl HttpQualityProbe {
    pub fn new(targets: Vec<QualityTarget>, timeout: Duration, upload_bytes: usize) -> Self {
        Self {
            client: Client::new(),
            targets,
            timeout,
            upload_bytes,
        }
    }

    /// Use a custom reqwest [`Client`].
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    async fn measure_target(&self, target: &QualityTarget) -> QualitySample {
        let ping_ms = match self.bounded(self.ping(&target.download_url)).await {
            Ok(ms) => Some(ms),
            Err(e) => {
                debug!(target = %target.name, error = %e, "ping failed");
                None
            }
        };

        let download_mbps = match self.bounded(self.download(&target.download_url)).await {
            Ok(mbps) => Some(mbps),
            Err(e) => {
                debug!(target = %target.name, error = %e, "download test failed");
                None
            }
        };

        let upload_mbps = match &target.upload_url {
            Some(url) => match self.bounded(self.upload(url)).await {
                Ok(mbps) => Some(mbps),
                Err(e) => {
                    debug!(target = %target.name, error = %e, "upload test failed");
                    None
                }
            },
            None => None,
        };

        QualitySample {
            name: target.name.clone(),
            ping_ms,
            download_mbps,
            upload_mbps,
        }
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, String>
    where
        F: Future<Output = Result<T, reqwest::Error>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(v)) => Ok(v),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!("timed out after {:?}", self.timeout)),
        }
    }

    async fn ping(&self, url: &str) -> Result<u64, reqwest::Error> {
        let start = Instant::now();
        self.client.head(url).send().await?.error_for_status()?;
        Ok(u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX))
    }

    async fn download(&self, url: &str) -> Result<f64, reqwest::Error> {
        let start = Instant::now();
        let mut resp = self.client.get(url).send().await?.error_for_status()?;
        let mut bytes: u64 = 0;
        while let Some(chunk) = resp.chunk().await? {
            bytes += chunk.len() as u64;
        }
        Ok(mbps(bytes, start.elapsed()))
    }

    async fn upload(&self, url: &str) -> Result<f64, reqwest::Error> {
        let payload = vec![0u8; self.upload_bytes];
        let start = Instant::now();
        self.client
            .post(url)
            .body(payload)
            .send()
            .await?
            .error_for_status()?;
        Ok(mbps(self.upload_bytes as u64, start.elapsed()))
    }
}

/// Megabits per second; sub-microsecond transfers count as one microsecond.
fn mbps(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64().max(1e-6);
    (bytes as f64 * 8.0) / secs / 1_000_000.0
}

#[async_trait]
impl QualityProbe for HttpQualityProbe {
    async fn measure(&self) -> Result<QualityReport, ProbeError> {
        let mut report = QualityReport::default();
        for target in &self.targets {
            report.samples.push(self.measure_target(target).await);
        }
        if !report.samples.is_empty() && report.is_empty() {
            warn!(targets = self.targets.len(), "quality probe: every target failed");
            return Err(ProbeError::AllTargetsFailed);
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mbps_math() {
        let v = mbps(1_000_000, Duration::from_secs(1));
        assert!((v - 8.0).abs() < 1e-9);
        assert!(mbps(10, Duration::ZERO).is_finite());
    }

    #[tokio::test]
    async fn no_targets_yields_empty_report() {
        let probe = HttpQualityProbe::new(Vec::new(), Duration::from_secs(1), 16);
        let report = probe.measure().await.unwrap();
        assert!(report.samples.is_empty());
    }
}

//! Host load and bandwidth-quality probes.

mod load;
mod quality;

use std::sync::Arc;

use async_trait::async_trait;
use musync_core::{HostLoad, QualityReport};

pub use load::SystemLoadProbe;
pub use quality::{HttpQualityProbe, QualityTarget};

/// Probe error.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("load sample unavailable: {0}")]
    Load(String),

    #[error("every quality target failed")]
    AllTargetsFailed,
}

/// Samples host uptime and load averages.
pub trait LoadProbe: Send + Sync {
    fn sample(&self) -> Result<HostLoad, ProbeError>;
}

/// Measures bandwidth quality.
///
/// An empty report means there was nothing to measure.
#[async_trait]
pub trait QualityProbe: Send + Sync {
    async fn measure(&self) -> Result<QualityReport, ProbeError>;
}

impl<P: LoadProbe + ?Sized> LoadProbe for Arc<P> {
    #[inline]
    fn sample(&self) -> Result<HostLoad, ProbeError> {
        (**self).sample()
    }
}

#[async_trait]
impl<P: QualityProbe + ?Sized> QualityProbe for Arc<P> {
    #[inline]
    async fn measure(&self) -> Result<QualityReport, ProbeError> {
        (**self).measure().await
    }
}

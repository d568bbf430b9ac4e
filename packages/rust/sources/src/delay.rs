//! Randomized pacing between network-bound acquisition requests.

use std::time::Duration;

use prospector_shared::{AcquisitionConfig, ProspectorError, Result};
use rand::Rng;
use tracing::debug;

/// Uniformly distributed delay in `[min, max]` milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquisitionDelay {
    min_ms: u64,
    max_ms: u64,
}

impl AcquisitionDelay {
    /// Create a delay window. Fails when `min_ms > max_ms`.
    pub fn new(min_ms: u64, max_ms: u64) -> Result<Self> {
        if min_ms > max_ms {
            return Err(ProspectorError::config(format!(
                "acquisition delay minimum ({min_ms} ms) exceeds maximum ({max_ms} ms)"
            )));
        }
        Ok(Self { min_ms, max_ms })
    }

    /// No delay at all.
    pub fn none() -> Self {
        Self { min_ms: 0, max_ms: 0 }
    }

    pub fn from_config(config: &AcquisitionConfig) -> Result<Self> {
        Self::new(config.delay_min_ms, config.delay_max_ms)
    }

    /// Draw one delay from the window.
    pub fn sample(&self) -> Duration {
        if self.min_ms == self.max_ms {
            return Duration::from_millis(self.min_ms);
        }
        Duration::from_millis(rand::thread_rng().gen_range(self.min_ms..=self.max_ms))
    }

    /// Sleep for one sampled delay.
    pub async fn wait(&self) {
        let delay = self.sample();
        if !delay.is_zero() {
            debug!(delay_ms = delay.as_millis() as u64, "pacing acquisition");
            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for AcquisitionDelay {
    /// 2–4 seconds.
    fn default() -> Self {
        Self {
            min_ms: 2000,
            max_ms: 4000,
        }
    }
}

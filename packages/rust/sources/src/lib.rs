//! Candidate acquisition.
//!
//! This crate provides:
//! - [`SourceAdapter`]: the interface the pipeline pulls candidates through
//! - [`SampleSource`]: a fixed, offline catalog
//! - [`WebDirectorySource`]: a live company-directory reader with optional
//!   website profiling
//! - [`AcquisitionSession`] and [`AcquisitionDelay`]: the scoped network
//!   session and the randomized pacing between requests

pub mod delay;
pub mod directory;
pub mod profile;
pub mod sample;
pub mod session;

use async_trait::async_trait;
use prospector_shared::{CandidateRecord, Result};

pub use delay::AcquisitionDelay;
pub use directory::WebDirectorySource;
pub use profile::{WebsiteProfile, extract_profile};
pub use sample::SampleSource;
pub use session::AcquisitionSession;

/// A place candidates come from.
///
/// Implementations isolate failures per search term: a term that yields an
/// error is logged and skipped, so `search` only fails when the adapter
/// itself is unusable.
#[async_trait]
pub trait SourceAdapter: Send {
    /// Human-readable adapter name for tracing.
    fn name(&self) -> &str;

    /// Acquire candidates for each term, in term order.
    async fn search(&mut self, terms: &[String]) -> Result<Vec<CandidateRecord>>;

    /// Release the acquisition session. Idempotent; safe on an adapter that
    /// never opened one.
    async fn close(&mut self) -> Result<()>;
}

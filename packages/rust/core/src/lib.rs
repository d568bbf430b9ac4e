//! Core domain logic for Prospector.
//!
//! - [`score`] validates oracle scores and computes the weighted composite
//! - [`oracle`] talks to the judgment oracle, always failing soft
//! - [`pipeline`] runs discovery batches and single-candidate analysis

pub mod oracle;
pub mod pipeline;
pub mod score;

#[cfg(test)]
mod testing;

pub use oracle::{
    GENERIC_ISSUES, HttpOracle, JudgmentOracleClient, OUTREACH_ERROR_MESSAGE, OracleRequest,
    OracleTransport, ProspectJudge,
};
pub use pipeline::{
    AnalyzedProspect, BatchReport, CancellationFlag, CandidateFailure, DiscoveryRequest,
    ProgressReporter, SilentProgress, StorageFailurePolicy, analyze_one, regenerate_outreach,
    run_discovery_batch,
};

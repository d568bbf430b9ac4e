//! Prospect pipeline orchestration.
//!
//! A discovery batch runs: acquire candidates → identify issues → score →
//! draft outreach if the composite clears the threshold → persist. Each
//! candidate is isolated; one failing candidate never sinks the batch,
//! except for storage failures under [`StorageFailurePolicy::Abort`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tracing::{error, info, instrument, warn};

use prospector_shared::{
    CandidateRecord, DefaultsConfig, ProspectId, ProspectorError, Result, Score,
};
use prospector_sources::SourceAdapter;
use prospector_storage::ProspectStore;

use crate::oracle::ProspectJudge;

pub const DEFAULT_MAX_RESULTS: usize = 10;
pub const DEFAULT_BATCH_DRAFT_THRESHOLD: u8 = 70;
pub const DEFAULT_SINGLE_DRAFT_THRESHOLD: u8 = 60;
pub const DEFAULT_REPORT_THRESHOLD: u8 = 60;

/// What a batch does when the store rejects a write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StorageFailurePolicy {
    /// Stop the batch and return the storage error.
    #[default]
    Abort,
    /// Record the candidate as failed and keep going.
    Skip,
}

/// Shared flag checked between candidates.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Parameters for one discovery batch.
#[derive(Debug, Clone)]
pub struct DiscoveryRequest {
    pub search_terms: Vec<String>,
    /// Only the first `max_results` candidates, in source order, are processed.
    pub max_results: usize,
    /// Outreach is drafted when `composite >= draft_threshold`.
    pub draft_threshold: u8,
    /// Persisted prospects with `composite >= report_threshold` are reported.
    pub report_threshold: u8,
    pub storage_failure: StorageFailurePolicy,
    pub cancellation: Option<CancellationFlag>,
}

impl DiscoveryRequest {
    pub fn new(search_terms: Vec<String>) -> Self {
        Self {
            search_terms,
            max_results: DEFAULT_MAX_RESULTS,
            draft_threshold: DEFAULT_BATCH_DRAFT_THRESHOLD,
            report_threshold: DEFAULT_REPORT_THRESHOLD,
            storage_failure: StorageFailurePolicy::default(),
            cancellation: None,
        }
    }

    /// Request with limits and thresholds taken from `[defaults]`.
    pub fn from_defaults(search_terms: Vec<String>, defaults: &DefaultsConfig) -> Self {
        Self {
            max_results: defaults.max_results,
            draft_threshold: defaults.batch_draft_threshold,
            report_threshold: defaults.report_threshold,
            ..Self::new(search_terms)
        }
    }

    fn validate(&self) -> Result<()> {
        if self.search_terms.is_empty() {
            return Err(ProspectorError::invalid_argument(
                "search terms must not be empty",
            ));
        }
        if let Some(i) = self.search_terms.iter().position(|t| t.trim().is_empty()) {
            return Err(ProspectorError::invalid_argument(format!(
                "search term #{} is blank",
                i + 1
            )));
        }
        if self.max_results == 0 {
            return Err(ProspectorError::invalid_argument(
                "max results must be at least 1",
            ));
        }
        for (name, value) in [
            ("draft threshold", self.draft_threshold),
            ("report threshold", self.report_threshold),
        ] {
            if value > 100 {
                return Err(ProspectorError::invalid_argument(format!(
                    "{name} must be within 0-100, got {value}"
                )));
            }
        }
        Ok(())
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationFlag::is_cancelled)
    }
}

/// A candidate that made it through scoring and into the store.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzedProspect {
    pub id: ProspectId,
    pub candidate: CandidateRecord,
    pub score: Score,
    /// Absent when the composite was below the draft threshold.
    pub outreach_message: Option<String>,
}

/// A candidate skipped during a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFailure {
    pub company: String,
    pub error: String,
}

/// Outcome of [`run_discovery_batch`].
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Candidates persisted, including any whose outreach message could not
    /// be saved under [`StorageFailurePolicy::Skip`].
    pub processed_count: usize,
    /// Persisted prospects at or above the report threshold, in processing order.
    pub qualified: Vec<AnalyzedProspect>,
    pub failures: Vec<CandidateFailure>,
    /// The batch stopped early on a cancellation request.
    pub cancelled: bool,
    pub elapsed_ms: u64,
}

/// Progress callback for batch status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called before a candidate is processed; `current` is 1-based.
    fn candidate_started(&self, company: &str, current: usize, total: usize);
    /// Called after a candidate; `composite` is `None` when it failed.
    fn candidate_finished(&self, company: &str, composite: Option<u8>);
    /// Called when the batch completes.
    fn done(&self, report: &BatchReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn candidate_started(&self, _company: &str, _current: usize, _total: usize) {}
    fn candidate_finished(&self, _company: &str, _composite: Option<u8>) {}
    fn done(&self, _report: &BatchReport) {}
}

/// Run one discovery batch.
///
/// Invalid requests fail before the source, judge or store is touched.
/// Past validation the source is closed exactly once, whatever happens.
#[instrument(skip_all, fields(terms = request.search_terms.len(), max_results = request.max_results))]
pub async fn run_discovery_batch<S, J, St>(
    request: &DiscoveryRequest,
    source: &mut S,
    judge: &J,
    store: &St,
    progress: &dyn ProgressReporter,
) -> Result<BatchReport>
where
    S: SourceAdapter + ?Sized,
    J: ProspectJudge + ?Sized,
    St: ProspectStore + ?Sized,
{
    request.validate()?;
    let start = Instant::now();

    info!(source = source.name(), "starting discovery batch");
    let outcome = process_batch(request, source, judge, store, progress).await;

    if let Err(e) = source.close().await {
        warn!(source = source.name(), error = %e, "failed to close source");
    }

    let mut report = outcome?;
    report.elapsed_ms = start.elapsed().as_millis() as u64;

    info!(
        processed = report.processed_count,
        qualified = report.qualified.len(),
        failed = report.failures.len(),
        cancelled = report.cancelled,
        elapsed_ms = report.elapsed_ms,
        "discovery batch complete"
    );
    progress.done(&report);
    Ok(report)
}

async fn process_batch<S, J, St>(
    request: &DiscoveryRequest,
    source: &mut S,
    judge: &J,
    store: &St,
    progress: &dyn ProgressReporter,
) -> Result<BatchReport>
where
    S: SourceAdapter + ?Sized,
    J: ProspectJudge + ?Sized,
    St: ProspectStore + ?Sized,
{
    // --- Phase 1: Acquisition ---
    progress.phase("Acquiring candidates");
    let mut candidates = source.search(&request.search_terms).await?;
    let found = candidates.len();
    candidates.truncate(request.max_results);
    info!(found, kept = candidates.len(), "candidates acquired");

    // --- Phase 2: Per-candidate analysis ---
    progress.phase("Analyzing candidates");
    let total = candidates.len();
    let mut report = BatchReport::default();

    for (index, candidate) in candidates.into_iter().enumerate() {
        if request.is_cancelled() {
            info!(remaining = total - index, "batch cancelled");
            report.cancelled = true;
            break;
        }

        let company = candidate.company.clone();
        progress.candidate_started(&company, index + 1, total);

        match enrich_and_persist(candidate, request.draft_threshold, judge, store).await {
            Ok(Persisted {
                prospect,
                message_error,
            }) => {
                if let Some(e) = message_error {
                    if request.storage_failure == StorageFailurePolicy::Abort {
                        error!(company = %company, error = %e, "storage failure, aborting batch");
                        return Err(e);
                    }
                    warn!(
                        company = %company,
                        id = %prospect.id,
                        error = %e,
                        "outreach message not saved, prospect kept without one"
                    );
                }
                let composite = prospect.score.composite;
                report.processed_count += 1;
                progress.candidate_finished(&company, Some(composite));
                if composite >= request.report_threshold {
                    report.qualified.push(prospect);
                }
            }
            Err(e) if e.is_storage() && request.storage_failure == StorageFailurePolicy::Abort => {
                error!(company = %company, error = %e, "storage failure, aborting batch");
                return Err(e);
            }
            Err(e) => {
                warn!(company = %company, error = %e, "candidate failed, skipping");
                progress.candidate_finished(&company, None);
                report.failures.push(CandidateFailure {
                    company,
                    error: e.to_string(),
                });
            }
        }
    }

    Ok(report)
}

async fn enrich_and_persist<J, St>(
    candidate: CandidateRecord,
    draft_threshold: u8,
    judge: &J,
    store: &St,
) -> Result<Persisted>
where
    J: ProspectJudge + ?Sized,
    St: ProspectStore + ?Sized,
{
    let issues = judge
        .identify_issues(&candidate.description, &candidate.industry)
        .await?;
    let candidate = candidate.with_issues(issues);
    let score = judge.score_candidate(&candidate).await?;
    persist_scored(candidate, score, draft_threshold, judge, store).await
}

/// A created record. `message_error` is set when the drafted message could
/// not be saved; the record then stays in the store without one.
struct Persisted {
    prospect: AnalyzedProspect,
    message_error: Option<ProspectorError>,
}

/// Draft if the score clears `draft_threshold`, then create the record and
/// attach the message.
async fn persist_scored<J, St>(
    candidate: CandidateRecord,
    score: Score,
    draft_threshold: u8,
    judge: &J,
    store: &St,
) -> Result<Persisted>
where
    J: ProspectJudge + ?Sized,
    St: ProspectStore + ?Sized,
{
    let drafted = if score.composite >= draft_threshold {
        Some(judge.draft_outreach(&candidate, &score).await?)
    } else {
        None
    };

    let id = store.create(&candidate, Some(&score)).await?;
    let mut outreach_message = None;
    let mut message_error = None;
    if let Some(message) = drafted {
        match store.set_outreach_message(&id, &message).await {
            Ok(()) => outreach_message = Some(message),
            Err(e) => message_error = Some(e),
        }
    }

    Ok(Persisted {
        prospect: AnalyzedProspect {
            id,
            candidate,
            score,
            outreach_message,
        },
        message_error,
    })
}

/// Score and persist a single candidate. No issue enrichment; errors are
/// returned as-is, including a failed message write after the record was
/// created.
#[instrument(skip_all, fields(company = %candidate.company, draft_threshold))]
pub async fn analyze_one<J, St>(
    candidate: CandidateRecord,
    draft_threshold: u8,
    judge: &J,
    store: &St,
) -> Result<AnalyzedProspect>
where
    J: ProspectJudge + ?Sized,
    St: ProspectStore + ?Sized,
{
    if draft_threshold > 100 {
        return Err(ProspectorError::invalid_argument(format!(
            "draft threshold must be within 0-100, got {draft_threshold}"
        )));
    }
    for (field, value) in [
        ("company", &candidate.company),
        ("industry", &candidate.industry),
        ("description", &candidate.description),
    ] {
        if value.trim().is_empty() {
            return Err(ProspectorError::invalid_argument(format!(
                "{field} must not be empty"
            )));
        }
    }

    let score = judge.score_candidate(&candidate).await?;
    let Persisted {
        prospect: analyzed,
        message_error,
    } = persist_scored(candidate, score, draft_threshold, judge, store).await?;
    if let Some(e) = message_error {
        return Err(e);
    }
    info!(
        id = %analyzed.id,
        composite = analyzed.score.composite,
        drafted = analyzed.outreach_message.is_some(),
        "prospect analyzed"
    );
    Ok(analyzed)
}

/// Draft a fresh outreach message for a stored, scored prospect and save it.
#[instrument(skip_all, fields(%id))]
pub async fn regenerate_outreach<J, St>(id: &ProspectId, judge: &J, store: &St) -> Result<String>
where
    J: ProspectJudge + ?Sized,
    St: ProspectStore + ?Sized,
{
    let prospect = store
        .get(id)
        .await?
        .ok_or_else(|| ProspectorError::Storage(format!("prospect not found: {id}")))?;

    let score = prospect.score.as_ref().ok_or_else(|| {
        ProspectorError::validation(format!("prospect {id} has no score; analyze it first"))
    })?;

    let message = judge.draft_outreach(&prospect.candidate, score).await?;
    store.set_outreach_message(id, &message).await?;
    info!(company = %prospect.candidate.company, "outreach regenerated");
    Ok(message)
}

//! Test doubles for the oracle, judge, source and store seams.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use prospector_shared::{
    CandidateRecord, PersistedProspect, ProspectId, ProspectorError, Result, Score, Status,
};
use prospector_sources::SourceAdapter;
use prospector_storage::{MemoryStore, ProspectStore};

use crate::oracle::{OracleRequest, OracleTransport, ProspectJudge};

// ---------------------------------------------------------------------------
// ScriptedTransport
// ---------------------------------------------------------------------------

/// Replays canned replies in order and records every request.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<String>>>,
    requests: Mutex<Vec<OracleRequest>>,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Result<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<OracleRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl OracleTransport for ScriptedTransport {
    async fn complete(&self, request: &OracleRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProspectorError::Oracle("no scripted reply left".into())))
    }
}

// ---------------------------------------------------------------------------
// ScriptedJudge
// ---------------------------------------------------------------------------

/// Judge with per-company composites and injectable failures.
///
/// Every sub-score equals the configured composite (default 50). Drafts are
/// `"Hello <company>"`. Issue calls are numbered from 1 in call order.
#[derive(Debug, Default)]
pub struct ScriptedJudge {
    composites: HashMap<String, u8>,
    issues: Vec<String>,
    failing_issue_calls: HashSet<usize>,
    failing_scores: HashSet<String>,
    failing_drafts: HashSet<String>,
    issue_calls: AtomicUsize,
    calls: Mutex<Vec<String>>,
}

impl ScriptedJudge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_composite(mut self, company: &str, composite: u8) -> Self {
        self.composites.insert(company.to_string(), composite);
        self
    }

    pub fn with_issues(mut self, issues: &[&str]) -> Self {
        self.issues = issues.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Make the `n`th issue call (1-based) fail.
    pub fn failing_issue_call(mut self, n: usize) -> Self {
        self.failing_issue_calls.insert(n);
        self
    }

    pub fn failing_score_for(mut self, company: &str) -> Self {
        self.failing_scores.insert(company.to_string());
        self
    }

    pub fn failing_draft_for(mut self, company: &str) -> Self {
        self.failing_drafts.insert(company.to_string());
        self
    }

    /// Calls in order, as `"issues"`, `"score:<company>"`, `"draft:<company>"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ProspectJudge for ScriptedJudge {
    async fn score_candidate(&self, candidate: &CandidateRecord) -> Result<Score> {
        self.record(format!("score:{}", candidate.company));
        if self.failing_scores.contains(&candidate.company) {
            return Err(ProspectorError::Oracle("scripted score failure".into()));
        }
        let composite = self.composites.get(&candidate.company).copied().unwrap_or(50);
        Ok(Score {
            urgency: composite,
            budget: composite,
            fit: composite,
            contactability: composite,
            composite,
            rationale: format!("scripted for {}", candidate.company),
        })
    }

    async fn draft_outreach(&self, candidate: &CandidateRecord, _score: &Score) -> Result<String> {
        self.record(format!("draft:{}", candidate.company));
        if self.failing_drafts.contains(&candidate.company) {
            return Err(ProspectorError::Oracle("scripted draft failure".into()));
        }
        Ok(format!("Hello {}", candidate.company))
    }

    async fn identify_issues(&self, _description: &str, _industry: &str) -> Result<Vec<String>> {
        self.record("issues".into());
        let n = self.issue_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.failing_issue_calls.contains(&n) {
            return Err(ProspectorError::Oracle(format!("scripted issue failure on call {n}")));
        }
        Ok(self.issues.clone())
    }
}

// ---------------------------------------------------------------------------
// RecordingSource
// ---------------------------------------------------------------------------

/// Source with a fixed catalog, optional failures, and call counters.
#[derive(Debug, Default)]
pub struct RecordingSource {
    catalog: Vec<CandidateRecord>,
    fail_search: bool,
    fail_close: bool,
    pub search_calls: usize,
    pub close_calls: usize,
}

impl RecordingSource {
    pub fn new(catalog: Vec<CandidateRecord>) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    pub fn failing_search(mut self) -> Self {
        self.fail_search = true;
        self
    }

    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }
}

#[async_trait]
impl SourceAdapter for RecordingSource {
    fn name(&self) -> &str {
        "recording"
    }

    async fn search(&mut self, _terms: &[String]) -> Result<Vec<CandidateRecord>> {
        self.search_calls += 1;
        if self.fail_search {
            return Err(ProspectorError::Acquisition("scripted search failure".into()));
        }
        Ok(self.catalog.clone())
    }

    async fn close(&mut self) -> Result<()> {
        self.close_calls += 1;
        if self.fail_close {
            return Err(ProspectorError::Acquisition("scripted close failure".into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FlakyStore
// ---------------------------------------------------------------------------

/// [`MemoryStore`] wrapper that counts calls and can fail `create` or
/// `set_outreach_message` for chosen companies.
#[derive(Debug, Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    failing_creates: HashSet<String>,
    failing_messages: HashSet<String>,
    calls: AtomicUsize,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_create_for(mut self, company: &str) -> Self {
        self.failing_creates.insert(company.to_string());
        self
    }

    pub fn failing_message_for(mut self, company: &str) -> Self {
        self.failing_messages.insert(company.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn tick(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProspectStore for FlakyStore {
    async fn create(&self, candidate: &CandidateRecord, score: Option<&Score>) -> Result<ProspectId> {
        self.tick();
        if self.failing_creates.contains(&candidate.company) {
            return Err(ProspectorError::Storage("scripted write failure".into()));
        }
        self.inner.create(candidate, score).await
    }

    async fn get(&self, id: &ProspectId) -> Result<Option<PersistedProspect>> {
        self.tick();
        self.inner.get(id).await
    }

    async fn set_outreach_message(&self, id: &ProspectId, message: &str) -> Result<()> {
        self.tick();
        if let Some(prospect) = self.inner.get(id).await? {
            if self.failing_messages.contains(&prospect.candidate.company) {
                return Err(ProspectorError::Storage("scripted message write failure".into()));
            }
        }
        self.inner.set_outreach_message(id, message).await
    }

    async fn set_status(&self, id: &ProspectId, status: Status) -> Result<()> {
        self.tick();
        self.inner.set_status(id, status).await
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<PersistedProspect>> {
        self.tick();
        self.inner.list_recent(limit).await
    }

    async fn list_by_min_score(&self, min_score: u8) -> Result<Vec<PersistedProspect>> {
        self.tick();
        self.inner.list_by_min_score(min_score).await
    }
}

/// Candidate with a unique description per company.
pub fn candidate(company: &str) -> CandidateRecord {
    CandidateRecord::new(
        company,
        "SaaS",
        "11-50 employees",
        format!("{company} automates back-office work"),
    )
}

//! In-memory [`ProspectStore`] backed by a `Vec` behind a mutex.
//!
//! Used by tests and by `--dry-run`, where nothing should touch disk.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use prospector_shared::{
    CandidateRecord, PersistedProspect, ProspectId, ProspectorError, Result, Score, Status,
};

use crate::ProspectStore;

/// Process-local prospect store. Insertion order is creation order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    prospects: Mutex<Vec<PersistedProspect>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored prospects.
    pub fn len(&self) -> usize {
        self.lock().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every stored prospect in creation order.
    pub fn all(&self) -> Vec<PersistedProspect> {
        self.lock().map(|p| p.clone()).unwrap_or_default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<PersistedProspect>>> {
        self.prospects
            .lock()
            .map_err(|_| ProspectorError::Storage("memory store lock poisoned".into()))
    }

    fn update(&self, id: &ProspectId, apply: impl FnOnce(&mut PersistedProspect)) -> Result<()> {
        let mut prospects = self.lock()?;
        let prospect = prospects
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| ProspectorError::Storage(format!("prospect not found: {id}")))?;
        apply(prospect);
        prospect.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl ProspectStore for MemoryStore {
    async fn create(
        &self,
        candidate: &CandidateRecord,
        score: Option<&Score>,
    ) -> Result<ProspectId> {
        let now = Utc::now();
        let id = ProspectId::new();
        self.lock()?.push(PersistedProspect {
            id: id.clone(),
            candidate: candidate.clone(),
            score: score.cloned(),
            outreach_message: None,
            status: Status::initial(score),
            created_at: now,
            updated_at: now,
            last_contacted_at: None,
        });
        Ok(id)
    }

    async fn get(&self, id: &ProspectId) -> Result<Option<PersistedProspect>> {
        Ok(self.lock()?.iter().find(|p| &p.id == id).cloned())
    }

    async fn set_outreach_message(&self, id: &ProspectId, message: &str) -> Result<()> {
        self.update(id, |p| p.outreach_message = Some(message.to_string()))
    }

    async fn set_status(&self, id: &ProspectId, status: Status) -> Result<()> {
        self.update(id, |p| {
            p.status = status;
            if status == Status::Contacted {
                p.last_contacted_at = Some(Utc::now());
            }
        })
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<PersistedProspect>> {
        Ok(self.lock()?.iter().rev().take(limit).cloned().collect())
    }

    async fn list_by_min_score(&self, min_score: u8) -> Result<Vec<PersistedProspect>> {
        let mut matching: Vec<PersistedProspect> = self
            .lock()?
            .iter()
            .filter(|p| p.composite().is_some_and(|c| c >= min_score))
            .cloned()
            .collect();
        // Stable sort keeps creation order among equal composites.
        matching.sort_by(|a, b| b.composite().cmp(&a.composite()));
        Ok(matching)
    }
}

//! Offline catalog source.

use async_trait::async_trait;
use prospector_shared::{CandidateRecord, Result};
use tracing::{debug, info};

use crate::SourceAdapter;

/// Returns the same fixed catalog for every search, independent of terms.
///
/// Keeps simple call counters so callers can observe how the adapter was
/// driven.
#[derive(Debug, Clone)]
pub struct SampleSource {
    catalog: Vec<CandidateRecord>,
    search_calls: usize,
    close_calls: usize,
    open: bool,
}

impl SampleSource {
    /// Source backed by the built-in catalog.
    pub fn new() -> Self {
        Self::with_catalog(builtin_catalog())
    }

    /// Source backed by a caller-supplied catalog.
    pub fn with_catalog(catalog: Vec<CandidateRecord>) -> Self {
        Self {
            catalog,
            search_calls: 0,
            close_calls: 0,
            open: false,
        }
    }

    pub fn catalog(&self) -> &[CandidateRecord] {
        &self.catalog
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl Default for SampleSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for SampleSource {
    fn name(&self) -> &str {
        "sample"
    }

    async fn search(&mut self, terms: &[String]) -> Result<Vec<CandidateRecord>> {
        self.search_calls += 1;
        self.open = true;
        debug!(terms = ?terms, "sample source ignores search terms");
        info!(count = self.catalog.len(), "sample catalog returned");
        Ok(self.catalog.clone())
    }

    async fn close(&mut self) -> Result<()> {
        self.close_calls += 1;
        self.open = false;
        Ok(())
    }
}

fn builtin_catalog() -> Vec<CandidateRecord> {
    vec![
        CandidateRecord {
            job_postings: vec![
                "Operations Manager - streamline our growing processes".into(),
                "Customer Success Lead - scale support operations".into(),
            ],
            tech_stack: vec!["React".into(), "Node.js".into(), "AWS".into()],
            website: Some("https://techflow.example.com".into()),
            ..CandidateRecord::new(
                "TechFlow Solutions",
                "SaaS",
                "11-50 employees",
                "B2B workflow automation platform for mid-market companies",
            )
        },
        CandidateRecord {
            job_postings: vec![
                "Data Engineer - build integration pipelines".into(),
                "Sales Operations Analyst - improve reporting".into(),
            ],
            tech_stack: vec!["Python".into(), "PostgreSQL".into(), "Docker".into()],
            website: Some("https://datasync.example.com".into()),
            ..CandidateRecord::new(
                "DataSync Pro",
                "Data Analytics",
                "51-200 employees",
                "Real-time data synchronization for enterprise teams",
            )
        },
        CandidateRecord {
            job_postings: vec!["Billing Specialist - manual invoice reconciliation".into()],
            tech_stack: vec!["Ruby on Rails".into(), "Heroku".into()],
            website: Some("https://ledgerly.example.com".into()),
            ..CandidateRecord::new(
                "Ledgerly",
                "Fintech",
                "1-10 employees",
                "Bookkeeping assistant for independent contractors",
            )
        },
        CandidateRecord {
            job_postings: vec![
                "Dispatcher - coordinate field technicians".into(),
                "IT Administrator - consolidate internal tools".into(),
            ],
            tech_stack: vec!["Salesforce".into(), "Excel".into()],
            website: Some("https://fieldline.example.com".into()),
            ..CandidateRecord::new(
                "Fieldline Services",
                "Field Services",
                "201-500 employees",
                "Regional HVAC and maintenance provider",
            )
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_full_catalog_regardless_of_terms() {
        let mut source = SampleSource::new();
        let a = source.search(&["saas".into()]).await.unwrap();
        let b = source.search(&["anything else".into(), "x".into()]).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 4);
        assert_eq!(a[0].company, "TechFlow Solutions");
        assert_eq!(a[1].company, "DataSync Pro");
        assert_eq!(source.search_calls(), 2);
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let mut source = SampleSource::new();
        source.close().await.unwrap();
        source.search(&["saas".into()]).await.unwrap();
        assert!(source.is_open());
        source.close().await.unwrap();
        source.close().await.unwrap();
        assert!(!source.is_open());
        assert_eq!(source.close_calls(), 3);
    }

    #[test]
    fn catalog_records_have_no_issues_yet() {
        assert!(builtin_catalog().iter().all(|c| c.issues.is_empty()));
    }
}

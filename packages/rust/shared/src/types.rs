//! Core domain types for Prospector.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ProspectorError;

/// Upper bound on the number of issues attached to a candidate.
pub const MAX_ISSUES: usize = 5;

/// Sub-score and composite value used by the low-confidence fallback score.
pub const FALLBACK_SCORE_VALUE: u8 = 20;

/// Rationale attached to the fallback score.
pub const FALLBACK_RATIONALE: &str = "analysis failed — manual review needed";

// ---------------------------------------------------------------------------
// ProspectId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for persisted prospect identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProspectId(pub Uuid);

impl ProspectId {
    /// Generate a new time-sortable prospect identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ProspectId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ProspectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ProspectId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// CandidateRecord
// ---------------------------------------------------------------------------

/// An organization considered for outreach, as produced by a source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// Company name.
    pub company: String,
    /// Industry label, free text.
    pub industry: String,
    /// Size class, e.g. "11-50 employees".
    pub size: String,
    /// Free-text description.
    pub description: String,
    /// Excerpts from recent job postings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub job_postings: Vec<String>,
    /// Technology indicators.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tech_stack: Vec<String>,
    /// Company website.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    /// Likely operational pain points, attached during enrichment.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
}

impl CandidateRecord {
    /// Create a record with the four required descriptive fields.
    pub fn new(
        company: impl Into<String>,
        industry: impl Into<String>,
        size: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            company: company.into(),
            industry: industry.into(),
            size: size.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    /// Return a copy with `issues` attached (truncated to [`MAX_ISSUES`]).
    pub fn with_issues(&self, mut issues: Vec<String>) -> Self {
        issues.truncate(MAX_ISSUES);
        Self {
            issues,
            ..self.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// Score
// ---------------------------------------------------------------------------

/// Four-dimension rubric score plus weighted composite.
///
/// Every numeric field lies in `[0, 100]`. Construct instances through the
/// score model's validation rather than by hand when the values come from
/// an untrusted source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub urgency: u8,
    pub budget: u8,
    pub fit: u8,
    pub contactability: u8,
    pub composite: u8,
    #[serde(default)]
    pub rationale: String,
}

impl Score {
    /// The low-confidence sentinel returned when the oracle cannot score a
    /// candidate.
    pub fn fallback() -> Self {
        Self {
            urgency: FALLBACK_SCORE_VALUE,
            budget: FALLBACK_SCORE_VALUE,
            fit: FALLBACK_SCORE_VALUE,
            contactability: FALLBACK_SCORE_VALUE,
            composite: FALLBACK_SCORE_VALUE,
            rationale: FALLBACK_RATIONALE.to_string(),
        }
    }

    /// Whether this is the fallback sentinel.
    pub fn is_fallback(&self) -> bool {
        *self == Self::fallback()
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle status of a persisted prospect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Discovered,
    Analyzed,
    Contacted,
    Responded,
    Qualified,
    Rejected,
}

impl Status {
    /// All statuses, in lifecycle order.
    pub const ALL: [Status; 6] = [
        Self::Discovered,
        Self::Analyzed,
        Self::Contacted,
        Self::Responded,
        Self::Qualified,
        Self::Rejected,
    ];

    /// Stable storage/display name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::Analyzed => "analyzed",
            Self::Contacted => "contacted",
            Self::Responded => "responded",
            Self::Qualified => "qualified",
            Self::Rejected => "rejected",
        }
    }

    /// Status assigned at creation time.
    pub fn initial(score: Option<&Score>) -> Self {
        if score.is_some() {
            Self::Analyzed
        } else {
            Self::Discovered
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Status {
    type Err = ProspectorError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                ProspectorError::validation(format!(
                    "invalid status '{s}': expected one of discovered, analyzed, contacted, \
                     responded, qualified, rejected"
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// PersistedProspect
// ---------------------------------------------------------------------------

/// A candidate as stored, with its lifecycle metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedProspect {
    pub id: ProspectId,
    pub candidate: CandidateRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<Score>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outreach_message: Option<String>,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_contacted_at: Option<DateTime<Utc>>,
}

impl PersistedProspect {
    /// Composite score, if the prospect has been scored.
    pub fn composite(&self) -> Option<u8> {
        self.score.as_ref().map(|s| s.composite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prospect_id_roundtrip() {
        let id = ProspectId::new();
        let s = id.to_string();
        let parsed: ProspectId = s.parse().expect("parse ProspectId");
        assert_eq!(id, parsed);
    }

    #[test]
    fn status_parse_and_display() {
        for status in Status::ALL {
            let parsed: Status = status.as_str().parse().expect("parse status");
            assert_eq!(parsed, status);
            assert_eq!(status.to_string(), status.as_str());
        }
        let err = "archived".parse::<Status>().unwrap_err();
        assert!(err.to_string().contains("invalid status"));
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&Status::Contacted).unwrap();
        assert_eq!(json, r#""contacted""#);
    }

    #[test]
    fn initial_status_depends_on_score() {
        assert_eq!(Status::initial(None), Status::Discovered);
        assert_eq!(Status::initial(Some(&Score::fallback())), Status::Analyzed);
    }

    #[test]
    fn fallback_score_values() {
        let score = Score::fallback();
        assert_eq!(score.urgency, 20);
        assert_eq!(score.budget, 20);
        assert_eq!(score.fit, 20);
        assert_eq!(score.contactability, 20);
        assert_eq!(score.composite, 20);
        assert!(score.rationale.contains("manual review"));
        assert!(score.is_fallback());
    }

    #[test]
    fn with_issues_caps_length() {
        let candidate = CandidateRecord::new("Acme", "SaaS", "11-50", "Widgets");
        let issues = (0..8).map(|i| format!("issue {i}")).collect();
        let enriched = candidate.with_issues(issues);
        assert_eq!(enriched.issues.len(), MAX_ISSUES);
        assert!(candidate.issues.is_empty());
    }

    #[test]
    fn candidate_omits_empty_optionals() {
        let candidate = CandidateRecord::new("Acme", "SaaS", "11-50", "Widgets");
        let json = serde_json::to_string(&candidate).unwrap();
        assert!(!json.contains("job_postings"));
        assert!(!json.contains("website"));
        let parsed: CandidateRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, candidate);
    }
}

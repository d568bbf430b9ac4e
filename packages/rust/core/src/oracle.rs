//! Judgment oracle client.
//!
//! Three fail-soft operations over an LLM chat-completion transport:
//! scoring a candidate against the rubric, drafting an outreach message, and
//! identifying likely operational issues. None of them ever return an error
//! to the caller; every failure maps to a fixed fallback value and a `warn!`.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use prospector_shared::{
    CandidateRecord, MAX_ISSUES, OracleConfig, ProspectorError, Result, Score, resolve_secret,
};

use crate::score;

/// Returned by [`JudgmentOracleClient::draft_outreach`] when no message
/// could be produced.
pub const OUTREACH_ERROR_MESSAGE: &str = "Error generating personalized message";

/// Returned by [`JudgmentOracleClient::identify_issues`] when the oracle
/// replied with something that is not JSON.
pub const GENERIC_ISSUES: [&str; 3] = [
    "Customer service automation",
    "Process optimization",
    "Data management",
];

const SCORING_SYSTEM: &str = "You are an expert B2B sales analyst specializing in AI \
implementation opportunities. Respond only with valid JSON.";
const OUTREACH_SYSTEM: &str = "You are an expert B2B outreach specialist. Write messages \
that get responses by focusing on value and insight.";
const ISSUES_SYSTEM: &str = "You are a business process analyst. Identify automation \
opportunities. Respond only with valid JSON.";

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// One chat-completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleRequest {
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Ask the model for a JSON object reply.
    pub json: bool,
}

/// Raw text-in, text-out access to the oracle.
#[async_trait]
pub trait OracleTransport: Send + Sync {
    async fn complete(&self, request: &OracleRequest) -> Result<String>;
}

/// OpenAI-compatible `/chat/completions` transport.
#[derive(Clone)]
pub struct HttpOracle {
    client: reqwest::Client,
    completions_url: String,
    api_key: String,
    model: String,
}

impl std::fmt::Debug for HttpOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpOracle")
            .field("completions_url", &self.completions_url)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

impl HttpOracle {
    pub fn new(
        endpoint: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProspectorError::Oracle(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            completions_url: format!("{}/chat/completions", endpoint.trim_end_matches('/')),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// Build from config, reading the API key from the configured env var.
    pub fn from_config(config: &OracleConfig) -> Result<Self> {
        let api_key = resolve_secret(&config.api_key_env)?;
        Self::new(
            &config.endpoint,
            api_key,
            config.model.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl OracleTransport for HttpOracle {
    async fn complete(&self, request: &OracleRequest) -> Result<String> {
        let mut body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.prompt },
            ],
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });
        if request.json {
            body["response_format"] = json!({ "type": "json_object" });
        }

        debug!(url = %self.completions_url, model = %self.model, "oracle request");
        let response = self
            .client
            .post(&self.completions_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProspectorError::Oracle(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ProspectorError::Oracle(format!(
                "HTTP {status}: {}",
                detail.chars().take(200).collect::<String>()
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProspectorError::Oracle(format!("malformed completion response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProspectorError::Oracle("completion had no content".into()))
    }
}

// ---------------------------------------------------------------------------
// Judge seam
// ---------------------------------------------------------------------------

/// What the pipeline asks of the oracle.
#[async_trait]
pub trait ProspectJudge: Send + Sync {
    async fn score_candidate(&self, candidate: &CandidateRecord) -> Result<Score>;

    async fn draft_outreach(&self, candidate: &CandidateRecord, score: &Score) -> Result<String>;

    async fn identify_issues(&self, description: &str, industry: &str) -> Result<Vec<String>>;
}

/// Fail-soft oracle client.
#[derive(Debug, Clone)]
pub struct JudgmentOracleClient<T> {
    transport: T,
}

impl<T: OracleTransport> JudgmentOracleClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Score a candidate. Returns [`Score::fallback`] on any failure.
    pub async fn score_candidate(&self, candidate: &CandidateRecord) -> Score {
        let request = OracleRequest {
            system: SCORING_SYSTEM.to_string(),
            prompt: scoring_prompt(candidate),
            temperature: 0.3,
            max_tokens: 500,
            json: true,
        };

        let reply = match self.transport.complete(&request).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(company = %candidate.company, error = %e, "scoring call failed, using fallback score");
                return Score::fallback();
            }
        };

        match parse_score(&reply) {
            Ok(score) => score,
            Err(e) => {
                warn!(
                    company = %candidate.company,
                    error = %e,
                    "oracle score reply violated contract, using fallback score"
                );
                Score::fallback()
            }
        }
    }

    /// Draft an outreach message. Returns [`OUTREACH_ERROR_MESSAGE`] on any
    /// failure or an empty reply.
    pub async fn draft_outreach(&self, candidate: &CandidateRecord, score: &Score) -> String {
        let request = OracleRequest {
            system: OUTREACH_SYSTEM.to_string(),
            prompt: outreach_prompt(candidate, score),
            temperature: 0.7,
            max_tokens: 200,
            json: false,
        };

        match self.transport.complete(&request).await {
            Ok(reply) if !reply.trim().is_empty() => reply.trim().to_string(),
            Ok(_) => {
                warn!(company = %candidate.company, "oracle returned an empty outreach message");
                OUTREACH_ERROR_MESSAGE.to_string()
            }
            Err(e) => {
                warn!(company = %candidate.company, error = %e, "outreach call failed");
                OUTREACH_ERROR_MESSAGE.to_string()
            }
        }
    }

    /// Identify 3–5 likely pain points.
    ///
    /// A reply that is not JSON yields [`GENERIC_ISSUES`]; every other failure
    /// yields an empty list.
    pub async fn identify_issues(&self, description: &str, industry: &str) -> Vec<String> {
        let request = OracleRequest {
            system: ISSUES_SYSTEM.to_string(),
            prompt: issues_prompt(description, industry),
            temperature: 0.5,
            max_tokens: 150,
            json: true,
        };

        let reply = match self.transport.complete(&request).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(industry, error = %e, "issue identification call failed");
                return Vec::new();
            }
        };

        if reply.trim().is_empty() {
            warn!(industry, "oracle returned an empty issue list reply");
            return Vec::new();
        }

        match parse_issues(&reply) {
            Some(issues) => issues,
            None => {
                warn!(industry, "issue reply was not JSON, using generic issues");
                GENERIC_ISSUES.iter().map(|s| (*s).to_string()).collect()
            }
        }
    }
}

#[async_trait]
impl<T: OracleTransport> ProspectJudge for JudgmentOracleClient<T> {
    async fn score_candidate(&self, candidate: &CandidateRecord) -> Result<Score> {
        Ok(JudgmentOracleClient::score_candidate(self, candidate).await)
    }

    async fn draft_outreach(&self, candidate: &CandidateRecord, score: &Score) -> Result<String> {
        Ok(JudgmentOracleClient::draft_outreach(self, candidate, score).await)
    }

    async fn identify_issues(&self, description: &str, industry: &str) -> Result<Vec<String>> {
        Ok(JudgmentOracleClient::identify_issues(self, description, industry).await)
    }
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

fn scoring_prompt(candidate: &CandidateRecord) -> String {
    let mut context = format!(
        "Company: {}\nIndustry: {}\nSize: {}\nDescription: {}\n",
        candidate.company, candidate.industry, candidate.size, candidate.description
    );
    if !candidate.job_postings.is_empty() {
        context.push_str(&format!(
            "Recent Job Postings: {}\n",
            candidate.job_postings.join(", ")
        ));
    }
    if !candidate.tech_stack.is_empty() {
        context.push_str(&format!("Tech Stack: {}\n", candidate.tech_stack.join(", ")));
    }
    if !candidate.issues.is_empty() {
        context.push_str(&format!("Likely Pain Points: {}\n", candidate.issues.join(", ")));
    }

    format!(
        r#"Analyze this company for AI implementation readiness and score it as a potential client for AI automation services.

{context}
Score each criterion as an integer from 0 to 100:

1. URGENCY - how urgently do they need AI solutions?
   Signals: "urgent", "ASAP", "immediately", scaling challenges, overwhelmed teams.
   High 80-100, medium 40-79, low 0-39.

2. BUDGET - estimated budget capacity.
   Company size, funding and revenue indicators.
   Enterprise 80-100, growth stage 40-79, startup/small 0-39.

3. FIT - how well they match AI automation services.
   Customer service, support and repetitive processes; tech-forward industry; existing automation.
   High 80-100, medium 40-79, poor 0-39.

4. CONTACTABILITY - how easy it is to reach decision makers.
   Public presence, contact availability; smaller companies are easier to reach.
   High 80-100, medium 40-79, low 0-39.

Respond with a JSON object only:
{{
  "urgency": integer,
  "budget": integer,
  "fit": integer,
  "contactability": integer,
  "composite": integer,
  "rationale": "brief explanation of the scoring"
}}"#
    )
}

fn outreach_prompt(candidate: &CandidateRecord, score: &Score) -> String {
    let issues = if candidate.issues.is_empty() {
        "Unknown".to_string()
    } else {
        candidate.issues.join(", ")
    };

    format!(
        r#"Write a personalized LinkedIn outreach message for this prospect:

Company: {company}
Industry: {industry}
Pain Points: {issues}
Urgency Score: {urgency}/100
Fit Score: {fit}/100

Requirements:
- At most 150 words
- Professional but conversational
- Reference their industry and challenges
- Mention AI automation benefits relevant to them
- End with a soft call to action for a brief call
- Not salesy or pushy

Lead with insight, not a pitch."#,
        company = candidate.company,
        industry = candidate.industry,
        urgency = score.urgency,
        fit = score.fit,
    )
}

fn issues_prompt(description: &str, industry: &str) -> String {
    format!(
        r#"Based on this company description and industry, identify likely AI automation pain points.

Industry: {industry}
Description: {description}

Common pain points include customer service overwhelm, manual data entry,
repetitive tasks, scaling challenges, slow response times, lead qualification
bottlenecks, documentation management, report generation and scheduling
coordination.

Return the 3-5 most likely pain points as a JSON object:
{{"issues": ["Manual customer service responses", "Lead qualification bottlenecks"]}}"#
    )
}

// ---------------------------------------------------------------------------
// Reply repair
// ---------------------------------------------------------------------------

static CODE_FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*```[A-Za-z0-9_-]*\s*\n?(.*?)\s*```\s*$").expect("valid regex")
});

/// Strip a surrounding Markdown code fence, if any.
fn strip_code_fence(reply: &str) -> &str {
    match CODE_FENCE_RE.captures(reply).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => reply.trim(),
    }
}

/// The span from the first `open` to the last `close`, inclusive.
fn outermost_span(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

fn parse_score(reply: &str) -> Result<Score> {
    let text = strip_code_fence(reply);
    let span = outermost_span(text, '{', '}')
        .ok_or_else(|| ProspectorError::parse("no JSON object in score reply"))?;
    let raw: Value = serde_json::from_str(span)
        .map_err(|e| ProspectorError::parse(format!("score reply is not valid JSON: {e}")))?;
    score::validate(&raw)
}

/// `None` when the reply holds no JSON at all; otherwise the cleaned issues
/// (empty when the JSON had the wrong shape).
///
/// A span cut out of surrounding prose only counts when it looks like an
/// issue list, so citation marks such as `[1]` leave the reply unparseable.
fn parse_issues(reply: &str) -> Option<Vec<String>> {
    let text = strip_code_fence(reply);

    let parsed: Value = serde_json::from_str(text).ok().or_else(|| {
        [('{', '}'), ('[', ']')]
            .iter()
            .filter_map(|(open, close)| outermost_span(text, *open, *close))
            .filter_map(|span| serde_json::from_str::<Value>(span).ok())
            .find(is_issue_list)
    })?;

    let items = issue_items(&parsed).unwrap_or(&[]);

    Some(
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .take(MAX_ISSUES)
            .map(str::to_string)
            .collect(),
    )
}

fn issue_items(value: &Value) -> Option<&[Value]> {
    match value {
        Value::Array(items) => Some(items.as_slice()),
        Value::Object(obj) => match obj.get("issues") {
            Some(Value::Array(items)) => Some(items.as_slice()),
            _ => None,
        },
        _ => None,
    }
}

fn is_issue_list(value: &Value) -> bool {
    match value {
        Value::Object(_) => issue_items(value).is_some(),
        Value::Array(items) => !items.is_empty() && items.iter().all(Value::is_string),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTransport;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn candidate() -> CandidateRecord {
        CandidateRecord {
            job_postings: vec!["Support Lead - overwhelmed inbox".into()],
            tech_stack: vec!["React".into()],
            issues: vec!["Manual ticket triage".into()],
            ..CandidateRecord::new("Acme", "SaaS", "11-50 employees", "Helpdesk tooling")
        }
    }

    fn client(replies: Vec<Result<String>>) -> JudgmentOracleClient<ScriptedTransport> {
        JudgmentOracleClient::new(ScriptedTransport::new(replies))
    }

    // --- scoring ---

    #[tokio::test]
    async fn score_parses_fenced_reply() {
        let reply = "Here you go:\n```json\n{\"urgency\": 80, \"budget\": 70, \"fit\": 90, \
                     \"contactability\": 60, \"rationale\": \"busy support team\"}\n```";
        let oracle = client(vec![Ok(reply.into())]);
        let score = oracle.score_candidate(&candidate()).await;
        assert_eq!(score.composite, 77);
        assert_eq!(score.rationale, "busy support team");

        let sent = oracle.transport().requests();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].json);
        assert!(sent[0].prompt.contains("Company: Acme"));
        assert!(sent[0].prompt.contains("Recent Job Postings: Support Lead"));
        assert!(sent[0].prompt.contains("Likely Pain Points: Manual ticket triage"));
    }

    #[tokio::test]
    async fn score_falls_back_on_unparseable_reply() {
        let oracle = client(vec![Ok("I cannot score this company.".into())]);
        assert_eq!(oracle.score_candidate(&candidate()).await, Score::fallback());
    }

    #[tokio::test]
    async fn score_falls_back_on_schema_violation() {
        let oracle = client(vec![Ok(
            r#"{"urgency": 150, "budget": 50, "fit": 50, "contactability": 50}"#.into(),
        )]);
        let score = oracle.score_candidate(&candidate()).await;
        assert!(score.is_fallback());
        assert_eq!(score.urgency, 20);
        assert_eq!(score.composite, 20);
    }

    #[tokio::test]
    async fn score_falls_back_on_transport_error() {
        let oracle = client(vec![Err(ProspectorError::Oracle("timeout".into()))]);
        assert!(oracle.score_candidate(&candidate()).await.is_fallback());
    }

    #[tokio::test]
    async fn score_does_not_touch_candidate() {
        let c = candidate();
        let before = c.clone();
        let oracle = client(vec![Ok("not json".into())]);
        oracle.score_candidate(&c).await;
        assert_eq!(c, before);
    }

    // --- outreach ---

    #[tokio::test]
    async fn outreach_returns_trimmed_reply() {
        let oracle = client(vec![Ok("  Hi Acme team,\nquick thought...  ".into())]);
        let score = Score::fallback();
        let message = oracle.draft_outreach(&candidate(), &score).await;
        assert_eq!(message, "Hi Acme team,\nquick thought...");

        let sent = &oracle.transport().requests()[0];
        assert!(!sent.json);
        assert!(sent.prompt.contains("Pain Points: Manual ticket triage"));
        assert!(sent.prompt.contains("Urgency Score: 20/100"));
    }

    #[tokio::test]
    async fn outreach_failure_returns_error_literal() {
        let oracle = client(vec![
            Err(ProspectorError::Oracle("HTTP 500".into())),
            Ok("   ".into()),
        ]);
        let score = Score::fallback();
        assert_eq!(
            oracle.draft_outreach(&candidate(), &score).await,
            OUTREACH_ERROR_MESSAGE
        );
        assert_eq!(
            oracle.draft_outreach(&candidate(), &score).await,
            OUTREACH_ERROR_MESSAGE
        );
    }

    #[tokio::test]
    async fn outreach_prompt_marks_unknown_issues() {
        let oracle = client(vec![Ok("hello".into())]);
        let bare = CandidateRecord::new("Bolt", "Retail", "1-10", "Shop");
        oracle.draft_outreach(&bare, &Score::fallback()).await;
        assert!(oracle.transport().requests()[0]
            .prompt
            .contains("Pain Points: Unknown"));
    }

    // --- issues ---

    #[tokio::test]
    async fn issues_from_object_or_array() {
        let oracle = client(vec![
            Ok(r#"{"issues": [" Manual data entry ", "", "Report generation"]}"#.into()),
            Ok(r#"["Scheduling coordination", 7, "Slow response times"]"#.into()),
        ]);
        assert_eq!(
            oracle.identify_issues("desc", "SaaS").await,
            vec!["Manual data entry", "Report generation"]
        );
        assert_eq!(
            oracle.identify_issues("desc", "SaaS").await,
            vec!["Scheduling coordination", "Slow response times"]
        );
    }

    #[tokio::test]
    async fn issues_capped_at_five() {
        let oracle = client(vec![Ok(
            r#"{"issues": ["a", "b", "c", "d", "e", "f", "g"]}"#.into(),
        )]);
        assert_eq!(oracle.identify_issues("desc", "SaaS").await.len(), MAX_ISSUES);
    }

    #[tokio::test]
    async fn issues_unparseable_reply_gives_generic_list() {
        let oracle = client(vec![Ok("Customer service, probably.".into())]);
        assert_eq!(
            oracle.identify_issues("desc", "SaaS").await,
            GENERIC_ISSUES.to_vec()
        );
    }

    #[tokio::test]
    async fn issues_prose_with_bracketed_fragments_gives_generic_list() {
        let oracle = client(vec![
            Ok("The main pain points [1] are customer service and reporting.".into()),
            Ok("Likely issues: {see notes} manual data entry [2].".into()),
        ]);
        for _ in 0..2 {
            assert_eq!(
                oracle.identify_issues("desc", "SaaS").await,
                GENERIC_ISSUES.to_vec()
            );
        }
    }

    #[tokio::test]
    async fn issues_embedded_list_in_prose_is_used() {
        let oracle = client(vec![
            Ok(r#"Sure! {"issues": ["Invoice reconciliation"]} Hope that helps."#.into()),
            Ok(r#"Here you go: ["Ticket triage", "Onboarding"]"#.into()),
        ]);
        assert_eq!(
            oracle.identify_issues("desc", "SaaS").await,
            vec!["Invoice reconciliation"]
        );
        assert_eq!(
            oracle.identify_issues("desc", "SaaS").await,
            vec!["Ticket triage", "Onboarding"]
        );
    }

    #[tokio::test]
    async fn issues_other_failures_give_empty_list() {
        let oracle = client(vec![
            Err(ProspectorError::Oracle("down".into())),
            Ok("".into()),
            Ok(r#"{"painPoints": ["x"]}"#.into()),
            Ok("42".into()),
        ]);
        for _ in 0..4 {
            assert!(oracle.identify_issues("desc", "SaaS").await.is_empty());
        }
    }

    #[tokio::test]
    async fn judge_impl_never_errors() {
        let oracle = client(vec![
            Err(ProspectorError::Oracle("down".into())),
            Err(ProspectorError::Oracle("down".into())),
            Err(ProspectorError::Oracle("down".into())),
        ]);
        let judge: &dyn ProspectJudge = &oracle;
        let c = candidate();
        assert!(judge.score_candidate(&c).await.unwrap().is_fallback());
        assert_eq!(
            judge.draft_outreach(&c, &Score::fallback()).await.unwrap(),
            OUTREACH_ERROR_MESSAGE
        );
        assert!(judge.identify_issues("d", "i").await.unwrap().is_empty());
    }

    // --- HTTP transport ---

    #[tokio::test]
    async fn http_oracle_request_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "gpt-4",
                "max_tokens": 150,
                "response_format": { "type": "json_object" },
                "messages": [
                    { "role": "system", "content": "sys" },
                    { "role": "user", "content": "hello" },
                ],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "{\"ok\":true}" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let oracle = HttpOracle::new(
            &format!("{}/v1/", server.uri()),
            "test-key",
            "gpt-4",
            Duration::from_secs(5),
        )
        .unwrap();
        let reply = oracle
            .complete(&OracleRequest {
                system: "sys".into(),
                prompt: "hello".into(),
                temperature: 0.5,
                max_tokens: 150,
                json: true,
            })
            .await
            .unwrap();
        assert_eq!(reply, "{\"ok\":true}");
    }

    #[tokio::test]
    async fn http_oracle_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bad/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/empty/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let request = OracleRequest {
            system: "s".into(),
            prompt: "p".into(),
            temperature: 0.7,
            max_tokens: 200,
            json: false,
        };
        for prefix in ["bad", "empty"] {
            let oracle = HttpOracle::new(
                &format!("{}/{prefix}", server.uri()),
                "k",
                "m",
                Duration::from_secs(5),
            )
            .unwrap();
            let err = oracle.complete(&request).await.unwrap_err();
            assert!(matches!(err, ProspectorError::Oracle(_)), "{prefix}: {err}");
        }
    }

    #[tokio::test]
    async fn client_over_http_falls_back_on_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let oracle = JudgmentOracleClient::new(
            HttpOracle::new(&server.uri(), "k", "m", Duration::from_secs(5)).unwrap(),
        );
        assert!(oracle.score_candidate(&candidate()).await.is_fallback());
    }

    #[test]
    fn repair_helpers() {
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
        assert_eq!(
            outermost_span("noise {\"a\": {\"b\": 1}} tail", '{', '}'),
            Some("{\"a\": {\"b\": 1}}")
        );
        assert_eq!(outermost_span("} backwards {", '{', '}'), None);
    }
}

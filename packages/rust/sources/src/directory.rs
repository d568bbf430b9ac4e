//! Live company-directory source.
//!
//! Issues one search request per term against a configured URL template,
//! extracts listing entries with CSS selectors, and optionally visits each
//! candidate's website to fill in description and technology indicators.

use std::net::IpAddr;

use async_trait::async_trait;
use prospector_shared::{
    AcquisitionConfig, CandidateRecord, DirectoryConfig, ProspectorError, Result,
};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::delay::AcquisitionDelay;
use crate::profile::extract_profile;
use crate::session::AcquisitionSession;
use crate::SourceAdapter;

const TERM_PLACEHOLDER: &str = "{term}";
const UNKNOWN: &str = "Unknown";

/// Compiled listing selectors.
#[derive(Debug)]
struct ListingSelectors {
    entry: Selector,
    company: Selector,
    industry: Selector,
    size: Selector,
    description: Selector,
    website: Selector,
    posting: Selector,
}

impl ListingSelectors {
    fn compile(config: &DirectoryConfig) -> Result<Self> {
        Ok(Self {
            entry: compile_selector("entry_selector", &config.entry_selector)?,
            company: compile_selector("company_selector", &config.company_selector)?,
            industry: compile_selector("industry_selector", &config.industry_selector)?,
            size: compile_selector("size_selector", &config.size_selector)?,
            description: compile_selector("description_selector", &config.description_selector)?,
            website: compile_selector("website_selector", &config.website_selector)?,
            posting: compile_selector("posting_selector", &config.posting_selector)?,
        })
    }
}

fn compile_selector(field: &str, css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| ProspectorError::config(format!("invalid {field} '{css}': {e}")))
}

/// Directory-backed [`SourceAdapter`].
#[derive(Debug)]
pub struct WebDirectorySource {
    search_url: String,
    selectors: ListingSelectors,
    session: AcquisitionSession,
    delay: AcquisitionDelay,
    profile_websites: bool,
    profile_limit: Option<usize>,
    requests_made: usize,
    allow_private_hosts: bool,
}

impl WebDirectorySource {
    /// Build from acquisition settings. Fails when the search URL template
    /// is missing or a selector does not parse.
    pub fn new(config: &AcquisitionConfig) -> Result<Self> {
        let search_url = config.directory.search_url.trim().to_string();
        if search_url.is_empty() {
            return Err(ProspectorError::config(
                "acquisition.directory.search_url is not set",
            ));
        }
        if !search_url.contains(TERM_PLACEHOLDER) {
            return Err(ProspectorError::config(format!(
                "acquisition.directory.search_url must contain {TERM_PLACEHOLDER}"
            )));
        }

        Ok(Self {
            search_url,
            selectors: ListingSelectors::compile(&config.directory)?,
            session: AcquisitionSession::from_config(config),
            delay: AcquisitionDelay::from_config(config)?,
            profile_websites: config.profile_websites,
            profile_limit: None,
            requests_made: 0,
            allow_private_hosts: false,
        })
    }

    /// Override the pacing between requests.
    pub fn with_delay(mut self, delay: AcquisitionDelay) -> Self {
        self.delay = delay;
        self
    }

    /// Profile at most `limit` candidates per search.
    pub fn with_profile_limit(mut self, limit: usize) -> Self {
        self.profile_limit = Some(limit);
        self
    }

    /// Allow fetching loopback/private addresses (for integration tests).
    #[cfg(test)]
    pub fn allow_private_hosts(mut self) -> Self {
        self.allow_private_hosts = true;
        self
    }

    pub fn session_open(&self) -> bool {
        self.session.is_open()
    }

    fn term_url(&self, term: &str) -> Result<Url> {
        let encoded: String = url::form_urlencoded::byte_serialize(term.as_bytes()).collect();
        let raw = self.search_url.replace(TERM_PLACEHOLDER, &encoded);
        Url::parse(&raw).map_err(|e| ProspectorError::config(format!("bad search URL {raw}: {e}")))
    }

    /// Fetch one page body, pacing every request after the first.
    async fn fetch(&mut self, url: &Url) -> Result<String> {
        if !self.allow_private_hosts && is_ssrf_target(url) {
            return Err(ProspectorError::Acquisition(format!(
                "refusing to fetch private or non-HTTP address: {url}"
            )));
        }

        if self.requests_made > 0 {
            self.delay.wait().await;
        }
        self.requests_made += 1;

        debug!(%url, "fetching");
        let client = self.session.client()?;
        let response = client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| ProspectorError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProspectorError::Network(format!("{url}: HTTP {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| ProspectorError::Network(format!("{url}: body read failed: {e}")))
    }

    async fn search_term(&mut self, term: &str) -> Result<Vec<CandidateRecord>> {
        let url = self.term_url(term)?;
        let body = self.fetch(&url).await?;
        Ok(parse_listing(&body, &url, &self.selectors))
    }

    async fn profile(&mut self, candidate: &mut CandidateRecord) {
        let Some(website) = candidate.website.clone() else {
            return;
        };
        let url = match Url::parse(&website) {
            Ok(url) => url,
            Err(e) => {
                warn!(company = %candidate.company, %website, error = %e, "unusable website URL");
                return;
            }
        };

        match self.fetch(&url).await {
            Ok(body) => {
                let profile = extract_profile(&body);
                if candidate.description.trim().is_empty() {
                    if let Some(description) = profile.description {
                        candidate.description = description;
                    }
                }
                for indicator in profile.tech_indicators {
                    if !candidate
                        .tech_stack
                        .iter()
                        .any(|t| t.eq_ignore_ascii_case(&indicator))
                    {
                        candidate.tech_stack.push(indicator);
                    }
                }
            }
            Err(e) => {
                warn!(company = %candidate.company, error = %e, "website profiling failed");
            }
        }
    }
}

#[async_trait]
impl SourceAdapter for WebDirectorySource {
    fn name(&self) -> &str {
        "web"
    }

    #[instrument(skip_all, fields(terms = terms.len()))]
    async fn search(&mut self, terms: &[String]) -> Result<Vec<CandidateRecord>> {
        let mut found = Vec::new();

        for term in terms {
            match self.search_term(term).await {
                Ok(entries) => {
                    info!(term = %term, count = entries.len(), "directory search complete");
                    found.extend(entries);
                }
                Err(e) => {
                    warn!(term = %term, error = %e, "directory search failed, skipping term");
                }
            }
        }

        if self.profile_websites {
            let limit = self.profile_limit.unwrap_or(found.len());
            for candidate in found.iter_mut().take(limit) {
                self.profile(candidate).await;
            }
        }

        Ok(found)
    }

    async fn close(&mut self) -> Result<()> {
        self.session.close();
        self.requests_made = 0;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Listing extraction
// ---------------------------------------------------------------------------

/// Extract candidates from a directory results page.
///
/// Entries without a company name are skipped. Missing industry or size
/// become `"Unknown"`; a missing description stays empty so website
/// profiling can fill it.
fn parse_listing(body: &str, page_url: &Url, selectors: &ListingSelectors) -> Vec<CandidateRecord> {
    let doc = Html::parse_document(body);

    doc.select(&selectors.entry)
        .filter_map(|entry| {
            let Some(company) = first_text(&entry, &selectors.company) else {
                debug!("listing entry without company name skipped");
                return None;
            };
            let industry = first_text(&entry, &selectors.industry).unwrap_or_else(|| UNKNOWN.into());
            let size = first_text(&entry, &selectors.size).unwrap_or_else(|| UNKNOWN.into());
            let description = first_text(&entry, &selectors.description).unwrap_or_default();

            let website = entry
                .select(&selectors.website)
                .filter_map(|a| a.value().attr("href"))
                .find_map(|href| page_url.join(href).ok())
                .map(String::from);

            let job_postings = entry
                .select(&selectors.posting)
                .map(|el| element_text(&el))
                .filter(|t| !t.is_empty())
                .collect();

            Some(CandidateRecord {
                job_postings,
                website,
                ..CandidateRecord::new(company, industry, size, description)
            })
        })
        .collect()
}

fn first_text(entry: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    entry
        .select(selector)
        .map(|el| element_text(&el))
        .find(|t| !t.is_empty())
}

/// Element text with whitespace runs collapsed.
fn element_text(el: &ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Address guard
// ---------------------------------------------------------------------------

/// Reject non-HTTP schemes and loopback, private, or otherwise local hosts.
fn is_ssrf_target(url: &Url) -> bool {
    if !matches!(url.scheme(), "http" | "https") {
        return true;
    }

    match url.host() {
        Some(url::Host::Ipv4(v4)) => is_private_ip(&IpAddr::V4(v4)),
        Some(url::Host::Ipv6(v6)) => is_private_ip(&IpAddr::V6(v6)),
        Some(url::Host::Domain(host)) => {
            host == "localhost" || host.ends_with(".local") || host.ends_with(".internal")
        }
        None => true,
    }
}

fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let [a, b, c, _] = v4.octets();
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_unspecified()
                // 100.64.0.0/10
                || (a == 100 && (b & 0xC0) == 64)
                || (a == 192 && b == 0 && c == 0)
        }
        IpAddr::V6(v6) => v6.is_loopback() || v6.is_unspecified(),
    }
}

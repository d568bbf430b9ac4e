//! Company website profiling.
//!
//! Pulls a short description and technology indicators out of a company's
//! landing page HTML.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

/// Technology keywords looked for on a company website, as whole words.
pub const TECH_KEYWORDS: &[&str] = &["react", "node", "python", "aws", "api", "saas", "cloud"];

static KEYWORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = TECH_KEYWORDS.join("|");
    Regex::new(&format!(r"(?i)\b({alternation})\b")).expect("valid regex")
});

/// What a website visit contributes to a candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebsiteProfile {
    /// Meta description, falling back to the page title.
    pub description: Option<String>,
    /// Matched keywords, lowercase, in [`TECH_KEYWORDS`] order.
    pub tech_indicators: Vec<String>,
}

/// Extract a [`WebsiteProfile`] from raw HTML.
pub fn extract_profile(html: &str) -> WebsiteProfile {
    let doc = Html::parse_document(html);

    let description = meta_description(&doc).or_else(|| page_title(&doc));

    let body_text: String = doc.root_element().text().collect::<Vec<_>>().join(" ");
    let mut seen: Vec<String> = KEYWORD_RE
        .find_iter(&body_text)
        .map(|m| m.as_str().to_lowercase())
        .collect();
    seen.sort_unstable();
    seen.dedup();

    let tech_indicators = TECH_KEYWORDS
        .iter()
        .filter(|k| seen.binary_search_by(|s| s.as_str().cmp(k)).is_ok())
        .map(|k| (*k).to_string())
        .collect();

    WebsiteProfile {
        description,
        tech_indicators,
    }
}

fn meta_description(doc: &Html) -> Option<String> {
    let sel = Selector::parse(r#"meta[name="description"]"#).ok()?;
    doc.select(&sel)
        .filter_map(|el| el.value().attr("content"))
        .map(|c| c.trim().to_string())
        .find(|c| !c.is_empty())
}

fn page_title(doc: &Html) -> Option<String> {
    let sel = Selector::parse("title").ok()?;
    doc.select(&sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

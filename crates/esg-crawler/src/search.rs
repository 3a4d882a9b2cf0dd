//! Search queries and candidate link heuristics.

use esg_core::{CandidateLink, CompanyName, SearchConfig};
use std::collections::HashSet;

/// Anchor text keywords marking a link as a likely report download.
pub const REPORT_KEYWORDS: [&str; 8] = [
    "report",
    "esg",
    "sustainability",
    "impact",
    "environment",
    "green",
    "carbon",
    "emissions",
];

/// Selector for every anchor on a report webpage.
pub const ANCHOR_SELECTOR: &str = "a";

/// Query for the direct PDF search, scoped to the target report year.
#[must_use]
pub fn direct_query(company: &CompanyName, config: &SearchConfig) -> String {
    format!(
        "{} sustainability report {} pdf -{}",
        company, config.report_year, config.excluded_site
    )
}

/// Broader query for the webpage fallback, without the PDF restriction.
#[must_use]
pub fn webpage_query(company: &CompanyName, config: &SearchConfig) -> String {
    format!("{} sustainability report -{}", company, config.excluded_site)
}

/// Search engine URL for a query.
#[must_use]
pub fn search_url(config: &SearchConfig, query: &str) -> String {
    format!(
        "{}?q={}&first=1&form=QBRE",
        config.engine_url,
        urlencoding::encode(query)
    )
}

/// Whether anchor text contains one of the report keywords (case-insensitive).
#[must_use]
pub fn has_report_keyword(text: &str) -> bool {
    let text = text.to_lowercase();
    REPORT_KEYWORDS.iter().any(|keyword| text.contains(keyword))
}

/// In-page candidate gate: PDF-looking href and a report keyword in the text.
#[must_use]
pub fn is_report_candidate(link: &CandidateLink) -> bool {
    link.looks_like_pdf() && link.text.as_deref().is_some_and(has_report_keyword)
}

/// Drop repeated URLs, keeping the first occurrence of each.
#[must_use]
pub fn dedupe_links(links: Vec<CandidateLink>) -> Vec<CandidateLink> {
    let mut seen = HashSet::new();
    links
        .into_iter()
        .filter(|link| seen.insert(link.url.clone()))
        .collect()
}

//! Fixed dictionaries and the keyword / tool / domain-term extractors.

use crate::evaluation::types::EvaluationError;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// Phrases that signal a claim backed by evidence
pub const FACTUAL_INDICATORS: &[&str] = &[
    "according to",
    "research shows",
    "studies indicate",
    "data suggests",
    "statistics show",
    "analysis reveals",
    "evidence suggests",
    "findings indicate",
    "report shows",
    "survey indicates",
    "study found",
    "research indicates",
];

/// Vendor and tool names recognized in answers
pub const KNOWN_TOOLS: &[&str] = &[
    "google analytics",
    "search console",
    "semrush",
    "ahrefs",
    "moz",
    "screaming frog",
    "screaming frog seo spider",
    "google tag manager",
    "gtm",
    "google ads",
    "bing ads",
    "facebook ads",
    "linkedin ads",
    "twitter ads",
    "hotjar",
    "crazy egg",
    "optimizely",
    "vwo",
    "unbounce",
    "leadpages",
    "wordpress",
    "shopify",
    "woocommerce",
    "magento",
];

const TECHNICAL_TERMS: &[&str] = &[
    "seo",
    "meta tags",
    "schema markup",
    "structured data",
    "robots.txt",
    "sitemap",
    "canonical",
    "redirects",
    "page speed",
    "core web vitals",
    "mobile friendly",
    "responsive design",
    "https",
    "ssl",
    "domain authority",
];

const CONTENT_TERMS: &[&str] = &[
    "content marketing",
    "keyword research",
    "content strategy",
    "blog posts",
    "landing pages",
    "meta descriptions",
    "title tags",
    "heading tags",
    "alt text",
    "internal linking",
    "content optimization",
    "readability",
    "engagement",
];

const AUTOMATION_TERMS: &[&str] = &[
    "python",
    "script",
    "automation",
    "api",
    "web scraping",
    "data analysis",
    "reporting",
    "dashboard",
    "cron job",
    "scheduled task",
    "workflow",
    "integration",
    "webhook",
    "bot",
    "crawler",
];

const ANALYTICS_TERMS: &[&str] = &[
    "google analytics",
    "search console",
    "semrush",
    "ahrefs",
    "moz",
    "screaming frog",
    "data visualization",
    "kpi",
    "metrics",
    "reporting",
    "tracking",
    "conversion",
    "traffic",
    "rankings",
];

/// Category name to its domain-term list
pub static CATEGORY_TERMS: LazyLock<HashMap<&'static str, &'static [&'static str]>> =
    LazyLock::new(|| {
        HashMap::from([
            ("technical", TECHNICAL_TERMS),
            ("content", CONTENT_TERMS),
            ("automation", AUTOMATION_TERMS),
            ("analytics", ANALYTICS_TERMS),
        ])
    });

static KEYWORD_PATTERN: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"\b[a-z]{3,}\b"));

/// Minimum occurrences for a word to count as a keyword
const KEYWORD_MIN_FREQUENCY: usize = 2;

/// Alphabetic words of 3+ letters occurring at least twice, in first-seen order
pub fn extract_keywords(text: &str) -> Result<Vec<String>, EvaluationError> {
    let pattern = KEYWORD_PATTERN
        .as_ref()
        .map_err(|e| EvaluationError::InvalidPattern(e.to_string()))?;

    let lower = text.to_lowercase();
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for m in pattern.find_iter(&lower) {
        let count = counts.entry(m.as_str()).or_insert(0);
        if *count == 0 {
            order.push(m.as_str());
        }
        *count += 1;
    }

    Ok(order
        .into_iter()
        .filter(|w| counts.get(w).copied().unwrap_or(0) >= KEYWORD_MIN_FREQUENCY)
        .map(str::to_string)
        .collect())
}

fn substring_matches(text: &str, dictionary: &[&str]) -> Vec<String> {
    let lower = text.to_lowercase();
    dictionary
        .iter()
        .filter(|entry| lower.contains(*entry))
        .map(|entry| entry.to_string())
        .collect()
}

pub fn extract_tools(text: &str) -> Vec<String> {
    substring_matches(text, KNOWN_TOOLS)
}

/// Domain terms for `category`; unknown or missing categories match nothing
pub fn extract_domain_terms(text: &str, category: Option<&str>) -> Vec<String> {
    category
        .map(|c| c.trim().to_lowercase())
        .and_then(|c| CATEGORY_TERMS.get(c.as_str()).copied())
        .map(|terms| substring_matches(text, terms))
        .unwrap_or_default()
}

/// Number of distinct entries across several lists
pub fn distinct_count<'a>(lists: impl IntoIterator<Item = &'a Vec<String>>) -> usize {
    lists
        .into_iter()
        .flatten()
        .map(String::as_str)
        .collect::<HashSet<_>>()
        .len()
}

//! Relevance-ranked search over definitions and claims.
//!
//! Matching is case-insensitive token matching against definition terms and
//! bodies (HTML stripped) and claim text. Scores are field-weighted term
//! frequencies normalized into [0,1]; term/title matches outweigh body
//! matches, and ties break by most recent update. Queries shorter than two
//! characters after trimming return an empty result set, mirroring the
//! editor's debounce gate at the API boundary.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GraphResult;
use crate::storage::{DocKind, SearchDoc, SqliteStorage, Storage};

/// Minimum query length (after trimming) for a non-empty result set.
pub const MIN_QUERY_LEN: usize = 2;

/// Weight of a match in a definition term relative to a body match.
const TITLE_WEIGHT: f64 = 3.0;

/// Characters of context kept on each side of the first match.
const EXCERPT_RADIUS: usize = 60;

/// Search filters.
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    /// Restrict to these investigation slugs (None = all).
    pub investigation_slugs: Option<Vec<String>>,
    /// Restrict to these entity kinds (None = all).
    pub kinds: Option<Vec<DocKind>>,
}

/// A single ranked result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Entity kind.
    pub kind: DocKind,
    /// Entity identifier.
    pub id: String,
    /// Containing investigation id.
    pub investigation_id: String,
    /// Containing investigation slug.
    pub investigation_slug: String,
    /// Short context around the first match.
    pub excerpt: String,
    /// Normalized relevance score in [0,1].
    pub score: f64,
}

/// Ranked search response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// The requested page of results.
    pub results: Vec<SearchResult>,
    /// Total matches before pagination.
    pub total_results: usize,
    /// Wall-clock time spent searching.
    pub search_time_ms: u64,
}

/// Search engine over the flattened graph corpus.
#[derive(Clone)]
pub struct SearchEngine {
    storage: SqliteStorage,
}

impl SearchEngine {
    /// Create a new search engine
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }

    /// Run a ranked search. `limit` and `offset` paginate the ranked list.
    pub async fn search(
        &self,
        query: &str,
        filters: &SearchFilters,
        limit: usize,
        offset: usize,
    ) -> GraphResult<SearchResponse> {
        let started = Instant::now();

        let tokens = tokenize(query);
        if query.trim().chars().count() < MIN_QUERY_LEN || tokens.is_empty() {
            return Ok(SearchResponse {
                results: Vec::new(),
                total_results: 0,
                search_time_ms: started.elapsed().as_millis() as u64,
            });
        }

        let docs = self.storage.search_docs().await.map_err(crate::error::GraphError::from)?;

        let mut matches: Vec<(SearchDoc, f64, String)> = docs
            .into_iter()
            .filter(|doc| filters_allow(filters, doc))
            .filter_map(|doc| {
                let title = doc.title.clone().unwrap_or_default();
                let body = strip_html(&doc.body);
                let (score, excerpt) = score_doc(&tokens, &title, &body)?;
                Some((doc, score, excerpt))
            })
            .collect();

        matches.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.0.updated_at.cmp(&a.0.updated_at))
        });

        let total_results = matches.len();
        let results = matches
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|(doc, score, excerpt)| SearchResult {
                kind: doc.kind,
                id: doc.id,
                investigation_id: doc.investigation_id,
                investigation_slug: doc.investigation_slug,
                excerpt,
                score,
            })
            .collect();

        let search_time_ms = started.elapsed().as_millis() as u64;
        debug!(query = %query, total_results, search_time_ms, "Search completed");

        Ok(SearchResponse {
            results,
            total_results,
            search_time_ms,
        })
    }
}

fn filters_allow(filters: &SearchFilters, doc: &SearchDoc) -> bool {
    if let Some(slugs) = &filters.investigation_slugs {
        if !slugs.iter().any(|s| s == &doc.investigation_slug) {
            return false;
        }
    }
    if let Some(kinds) = &filters.kinds {
        if !kinds.contains(&doc.kind) {
            return false;
        }
    }
    true
}

/// Split a query into lowercase alphanumeric tokens.
pub fn tokenize(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

/// Drop HTML tags, keeping text content.
pub fn strip_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => text.push(c),
            _ => {}
        }
    }
    text
}

/// Count non-overlapping case-insensitive occurrences of `token` in
/// lowercased `haystack`.
fn count_hits(haystack: &str, token: &str) -> usize {
    let mut hits = 0;
    let mut from = 0;
    while let Some(at) = haystack[from..].find(token) {
        hits += 1;
        from += at + token.len();
    }
    hits
}

/// Score a document against the query tokens. Returns None when nothing
/// matches. The excerpt surrounds the first match, preferring the title
/// field.
fn score_doc(tokens: &[String], title: &str, body: &str) -> Option<(f64, String)> {
    let title_lower = title.to_lowercase();
    let body_lower = body.to_lowercase();

    let mut title_hits = 0usize;
    let mut body_hits = 0usize;
    for token in tokens {
        title_hits += count_hits(&title_lower, token);
        body_hits += count_hits(&body_lower, token);
    }

    if title_hits == 0 && body_hits == 0 {
        return None;
    }

    let weighted = TITLE_WEIGHT * title_hits as f64 + body_hits as f64;
    let score = weighted / (weighted + 2.0);

    let excerpt = if title_hits > 0 {
        excerpt_around(title, &title_lower, tokens)
    } else {
        excerpt_around(body, &body_lower, tokens)
    };

    Some((score, excerpt))
}

/// Build a short excerpt around the earliest token match in `text`.
fn excerpt_around(text: &str, text_lower: &str, tokens: &[String]) -> String {
    let first = tokens
        .iter()
        .filter_map(|t| text_lower.find(t.as_str()).map(|at| (at, t.len())))
        .min_by_key(|(at, _)| *at);

    let Some((at, token_len)) = first else {
        return String::new();
    };

    let start = floor_char_boundary(text, at.saturating_sub(EXCERPT_RADIUS));
    let end = ceil_char_boundary(text, (at + token_len + EXCERPT_RADIUS).min(text.len()));

    let mut excerpt = String::new();
    if start > 0 {
        excerpt.push('…');
    }
    excerpt.push_str(text[start..end].trim());
    if end < text.len() {
        excerpt.push('…');
    }
    excerpt
}

fn floor_char_boundary(text: &str, mut at: usize) -> usize {
    while at > 0 && !text.is_char_boundary(at) {
        at -= 1;
    }
    at
}

fn ceil_char_boundary(text: &str, mut at: usize) -> usize {
    while at < text.len() && !text.is_char_boundary(at) {
        at += 1;
    }
    at
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("Trade  policy!"), vec!["trade", "policy"]);
        assert_eq!(tokenize("  "), Vec::<String>::new());
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(strip_html("<p>hello <b>world</b></p>"), "hello world");
        assert_eq!(strip_html("no tags"), "no tags");
    }

    #[test]
    fn test_count_hits_non_overlapping() {
        assert_eq!(count_hits("aaaa", "aa"), 2);
        assert_eq!(count_hits("tariff tariffs", "tariff"), 2);
        assert_eq!(count_hits("nothing", "x"), 0);
    }

    #[test]
    fn test_score_doc_title_outweighs_body() {
        let tokens = tokenize("tariff");
        let (title_score, _) = score_doc(&tokens, "Tariff", "unrelated").unwrap();
        let (body_score, _) = score_doc(&tokens, "Other", "a tariff here").unwrap();
        assert!(title_score > body_score);
        assert!(title_score <= 1.0 && title_score > 0.0);
    }

    #[test]
    fn test_score_doc_no_match() {
        let tokens = tokenize("welfare");
        assert!(score_doc(&tokens, "Tariff", "nothing relevant").is_none());
    }

    #[test]
    fn test_excerpt_contains_match() {
        let tokens = tokenize("wisdom");
        let body = "a long preamble that goes on for quite a while before growing in wisdom through deliberate practice and then trails off into further text";
        let (_, excerpt) = score_doc(&tokens, "", body).unwrap();
        assert!(excerpt.contains("wisdom"));
        assert!(excerpt.len() < body.len());
    }

    #[test]
    fn test_excerpt_multibyte_safe() {
        let tokens = tokenize("wisdom");
        let body = "ééééééééééééééééééééééééééééééééééééééééééééééééééééééééééééééé wisdom ééééééééééé";
        let (_, excerpt) = score_doc(&tokens, "", body).unwrap();
        assert!(excerpt.contains("wisdom"));
    }
}

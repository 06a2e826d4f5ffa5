//! Inline reference extraction for rich-text bodies.
//!
//! Investigation overviews and claim texts embed cross-references as anchor
//! tags carrying a role attribute:
//!
//! ```html
//! <a data-ref-kind="definition" data-ref-target="tariff">tariff</a>
//! <a data-ref-kind="claim" data-ref-target="3f0a...">the second claim</a>
//! ```
//!
//! The resolver never rewrites body text. On write, unresolvable targets are
//! reported as warnings (authors may forward-reference entities not yet
//! created); on read, every reference is re-validated and annotated so
//! renderers can distinguish live links from dangling ones.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static ANCHOR_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<a\b[^>]*>").expect("valid anchor pattern"));

static REF_KIND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)data-ref-kind\s*=\s*"([^"]*)""#).expect("valid kind pattern")
});

static REF_TARGET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)data-ref-target\s*=\s*"([^"]*)""#).expect("valid target pattern")
});

/// Kind of inline reference, from the marker's role attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefKind {
    /// Target is a definition slug within the same investigation.
    Definition,
    /// Target is a claim id within the same investigation.
    Claim,
}

impl std::fmt::Display for RefKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefKind::Definition => write!(f, "definition"),
            RefKind::Claim => write!(f, "claim"),
        }
    }
}

impl std::str::FromStr for RefKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "definition" => Ok(RefKind::Definition),
            "claim" => Ok(RefKind::Claim),
            _ => Err(format!("Unknown reference kind: {}", s)),
        }
    }
}

/// An inline reference marker extracted from a body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineRef {
    /// Reference kind.
    pub kind: RefKind,
    /// Target slug (definitions) or id (claims).
    pub target: String,
}

/// Resolution status of a reference against current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    /// Target resolves to a live entity.
    Live,
    /// Target does not resolve (never existed, or deleted since).
    Dangling,
}

/// A reference annotated with its resolution result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedLink {
    /// Reference kind.
    pub kind: RefKind,
    /// Target slug or id as written in the body.
    pub target: String,
    /// Whether the target currently resolves.
    pub status: LinkStatus,
    /// Resolved entity id when live.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
}

/// Extract every reference marker from a rich-text body, in document order.
///
/// Anchors missing either attribute, or carrying an unknown kind, are plain
/// links and are ignored. Duplicate markers are kept; callers dedupe if they
/// need set semantics.
pub fn extract_refs(html: &str) -> Vec<InlineRef> {
    let mut refs = Vec::new();
    for tag in ANCHOR_TAG.find_iter(html) {
        let tag = tag.as_str();
        let kind = REF_KIND
            .captures(tag)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<RefKind>().ok());
        let target = REF_TARGET
            .captures(tag)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string());

        if let (Some(kind), Some(target)) = (kind, target) {
            if !target.is_empty() {
                refs.push(InlineRef { kind, target });
            }
        }
    }
    refs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_definition_ref() {
        let html = r#"<p>See <a data-ref-kind="definition" data-ref-target="tariff">tariff</a>.</p>"#;
        let refs = extract_refs(html);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].kind, RefKind::Definition);
        assert_eq!(refs[0].target, "tariff");
    }

    #[test]
    fn test_extract_claim_ref_attribute_order_free() {
        let html = r#"<a data-ref-target="abc-123" class="ref" data-ref-kind="claim">claim</a>"#;
        let refs = extract_refs(html);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].kind, RefKind::Claim);
        assert_eq!(refs[0].target, "abc-123");
    }

    #[test]
    fn test_plain_anchors_ignored() {
        let html = r#"<a href="https://example.com">external</a>"#;
        assert!(extract_refs(html).is_empty());
    }

    #[test]
    fn test_unknown_kind_ignored() {
        let html = r#"<a data-ref-kind="footnote" data-ref-target="x">x</a>"#;
        assert!(extract_refs(html).is_empty());
    }

    #[test]
    fn test_missing_target_ignored() {
        let html = r#"<a data-ref-kind="definition">broken</a>"#;
        assert!(extract_refs(html).is_empty());
    }

    #[test]
    fn test_multiple_refs_in_document_order() {
        let html = concat!(
            r#"<a data-ref-kind="definition" data-ref-target="tariff">a</a> text "#,
            r#"<a data-ref-kind="claim" data-ref-target="id-1">b</a> more "#,
            r#"<a data-ref-kind="definition" data-ref-target="welfare">c</a>"#,
        );
        let refs = extract_refs(html);
        assert_eq!(refs.len(), 3);
        assert_eq!(refs[0].target, "tariff");
        assert_eq!(refs[1].kind, RefKind::Claim);
        assert_eq!(refs[2].target, "welfare");
    }

    #[test]
    fn test_case_insensitive_attributes() {
        let html = r#"<A DATA-REF-KIND="Definition" DATA-REF-TARGET="tariff">t</A>"#;
        let refs = extract_refs(html);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].kind, RefKind::Definition);
    }

    #[test]
    fn test_ref_kind_round_trip() {
        assert_eq!("definition".parse::<RefKind>().unwrap(), RefKind::Definition);
        assert_eq!(RefKind::Claim.to_string(), "claim");
        assert!("footnote".parse::<RefKind>().is_err());
    }
}

//! Slug derivation for the slug index.
//!
//! Slugs are human-readable, scope-unique identifiers derived from a term or
//! title. Reservation (with collision suffixing) happens inside storage
//! transactions; this module owns the pure string rules.

use crate::error::{GraphError, GraphResult};

/// Scope name under which investigation slugs are reserved.
pub const GLOBAL_SCOPE: &str = "global";

/// Maximum candidates tried before reservation gives up with a conflict.
pub const MAX_CANDIDATES: u32 = 1000;

/// Derive a slug from free text: lower-cased, non-alphanumeric runs become
/// single hyphens, leading/trailing hyphens trimmed.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut last_hyphen = true; // suppress leading hyphen
    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_hyphen = false;
        } else if !last_hyphen {
            slug.push('-');
            last_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Whether a caller-supplied slug override is well-formed: non-empty,
/// lowercase ascii alphanumerics and single hyphens, no edge hyphens.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Resolve the slug base for an entity: an explicit override (validated) or
/// the slugified display text. Fails with `ValidationError` if neither yields
/// a usable slug.
pub fn slug_base(field: &str, text: &str, override_slug: Option<&str>) -> GraphResult<String> {
    if let Some(explicit) = override_slug {
        let explicit = explicit.trim();
        if !is_valid_slug(explicit) {
            return Err(GraphError::Validation {
                field: field.to_string(),
                reason: format!("'{}' is not a valid slug", explicit),
            });
        }
        return Ok(explicit.to_string());
    }

    let derived = slugify(text);
    if derived.is_empty() {
        return Err(GraphError::Validation {
            field: field.to_string(),
            reason: "text yields an empty slug".to_string(),
        });
    }
    Ok(derived)
}

/// Deterministic candidate sequence for collision handling:
/// `base`, `base-2`, `base-3`, ...
pub fn candidate(base: &str, attempt: u32) -> String {
    if attempt == 0 {
        base.to_string()
    } else {
        format!("{}-{}", base, attempt + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Trade Policy"), "trade-policy");
        assert_eq!(slugify("Tariffs reduce consumer welfare"), "tariffs-reduce-consumer-welfare");
    }

    #[test]
    fn test_slugify_collapses_punctuation() {
        assert_eq!(slugify("What is a 'tariff'?"), "what-is-a-tariff");
        assert_eq!(slugify("  -- odd -- input --  "), "odd-input");
        assert_eq!(slugify("a/b/c"), "a-b-c");
    }

    #[test]
    fn test_slugify_empty() {
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn test_is_valid_slug() {
        assert!(is_valid_slug("trade-policy"));
        assert!(is_valid_slug("a2"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("-edge"));
        assert!(!is_valid_slug("edge-"));
        assert!(!is_valid_slug("double--hyphen"));
        assert!(!is_valid_slug("Upper"));
        assert!(!is_valid_slug("with space"));
    }

    #[test]
    fn test_slug_base_prefers_override() {
        let base = slug_base("slug", "Trade Policy", Some("custom-name")).unwrap();
        assert_eq!(base, "custom-name");
    }

    #[test]
    fn test_slug_base_rejects_malformed_override() {
        let err = slug_base("slug", "Trade Policy", Some("Not A Slug")).unwrap_err();
        assert!(matches!(err, crate::error::GraphError::Validation { .. }));
    }

    #[test]
    fn test_slug_base_rejects_unsluggable_text() {
        let err = slug_base("term", "???", None).unwrap_err();
        assert!(matches!(err, crate::error::GraphError::Validation { .. }));
    }

    #[test]
    fn test_candidate_sequence() {
        assert_eq!(candidate("tariff", 0), "tariff");
        assert_eq!(candidate("tariff", 1), "tariff-2");
        assert_eq!(candidate("tariff", 2), "tariff-3");
    }
}

//! Document key derivation.
//!
//! A food name maps to its Firestore document id by trimming, lowercasing,
//! replacing `/` and spaces with `_`, and keeping at most
//! [`MAX_DOC_ID_CHARS`] characters. Firestore treats `/` as a path separator,
//! so it must never survive into a key. Ids Firestore reserves (`.`, `..`,
//! and `__*__`) are detected by [`is_reserved`].

/// Longest document id the loader will produce, in characters.
pub const MAX_DOC_ID_CHARS: usize = 100;

/// Derive the document id for `name`, or `None` if nothing remains.
///
/// ```rust
/// use cofid_loader::doc_id::doc_id;
///
/// assert_eq!(doc_id("Apple Pie").as_deref(), Some("apple_pie"));
/// assert_eq!(doc_id("   "), None);
/// ```
pub fn doc_id(name: &str) -> Option<String> {
    let id: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            '/' | ' ' => '_',
            other => other,
        })
        .take(MAX_DOC_ID_CHARS)
        .collect();

    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

/// Whether Firestore refuses `id` as a document id.
///
/// `.` and `..` collapse as URL path segments; `__.*__` is reserved.
pub fn is_reserved(id: &str) -> bool {
    id == "." || id == ".." || (id.len() >= 4 && id.starts_with("__") && id.ends_with("__"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_names_map_to_reserved_ids() {
        assert!(is_reserved(&doc_id(".").unwrap()));
        assert!(is_reserved(&doc_id(" .. ").unwrap()));
        assert!(is_reserved(&doc_id("__init__").unwrap()));
        assert!(is_reserved("____"));
    }

    #[test]
    fn ordinary_ids_are_not_reserved() {
        assert!(!is_reserved("apple_pie"));
        assert!(!is_reserved("..."));
        assert!(!is_reserved("___"));
        assert!(!is_reserved("__x"));
        assert!(!is_reserved("x__"));
        assert!(!is_reserved(".5_fat"));
    }

    #[test]
    fn spaces_become_underscores() {
        assert_eq!(doc_id("Apple Pie").as_deref(), Some("apple_pie"));
    }

    #[test]
    fn slashes_become_underscores() {
        assert_eq!(doc_id("Beans/Lentils").as_deref(), Some("beans_lentils"));
    }

    #[test]
    fn surrounding_whitespace_trimmed() {
        assert_eq!(doc_id("  Rice  ").as_deref(), Some("rice"));
        assert_eq!(doc_id("\tTofu\n").as_deref(), Some("tofu"));
    }

    #[test]
    fn inner_runs_are_kept() {
        assert_eq!(
            doc_id("Milk,  semi-skimmed / pasteurised").as_deref(),
            Some("milk,__semi-skimmed___pasteurised")
        );
    }

    #[test]
    fn blank_yields_none() {
        assert_eq!(doc_id(""), None);
        assert_eq!(doc_id("    "), None);
    }

    #[test]
    fn long_names_truncated_to_limit() {
        let name = "A".repeat(150);
        let id = doc_id(&name).unwrap();
        assert_eq!(id.chars().count(), MAX_DOC_ID_CHARS);
        assert!(id.chars().all(|c| c == 'a'));
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let name = "é".repeat(120);
        let id = doc_id(&name).unwrap();
        assert_eq!(id.chars().count(), MAX_DOC_ID_CHARS);
    }

    #[test]
    fn exactly_limit_untouched() {
        let name = "b".repeat(MAX_DOC_ID_CHARS);
        assert_eq!(doc_id(&name).unwrap(), name);
    }
}

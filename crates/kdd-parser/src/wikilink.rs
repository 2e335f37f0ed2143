//! Wiki-link scanning: `[[Target]]`, `[[domain::Target]]`, `[[Target|Alias]]`.

use kdd_core::domain::reserved_prefixes;
use once_cell::sync::Lazy;
use regex::Regex;

static WIKILINK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\[([^\[\]]*)\]\]").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiLink {
    pub domain: Option<String>,
    pub target: String,
    pub alias: Option<String>,
}

impl WikiLink {
    /// A target is "typed" when it begins with one of the reserved
    /// `KIND-` prefixes; anything else is an entity target.
    pub fn is_typed_reference(&self) -> bool {
        reserved_prefixes().any(|prefix| self.target.starts_with(prefix))
    }
}

/// Scan free text for `[[...]]` occurrences, splitting on `::` first and
/// `|` second. Empty inner contents are ignored.
pub fn parse_wikilinks(text: &str) -> Vec<WikiLink> {
    WIKILINK_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let inner = caps.get(1)?.as_str().trim();
            if inner.is_empty() {
                return None;
            }
            Some(parse_one(inner))
        })
        .collect()
}

fn parse_one(inner: &str) -> WikiLink {
    let (domain, rest) = match inner.split_once("::") {
        Some((d, r)) => (Some(d.trim().to_string()), r),
        None => (None, inner),
    };
    let (target, alias) = match rest.split_once('|') {
        Some((t, a)) => (t.trim().to_string(), Some(a.trim().to_string())),
        None => (rest.trim().to_string(), None),
    };
    WikiLink { domain, target, alias }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_target() {
        let links = parse_wikilinks("See [[KDDDocument]] for details.");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].target, "KDDDocument");
        assert!(links[0].domain.is_none());
        assert!(links[0].alias.is_none());
    }

    #[test]
    fn parses_domain_qualified_target() {
        let links = parse_wikilinks("[[billing::Invoice]]");
        assert_eq!(links[0].domain.as_deref(), Some("billing"));
        assert_eq!(links[0].target, "Invoice");
    }

    #[test]
    fn parses_aliased_target() {
        let links = parse_wikilinks("[[UC-042|the checkout flow]]");
        assert_eq!(links[0].target, "UC-042");
        assert_eq!(links[0].alias.as_deref(), Some("the checkout flow"));
        assert!(links[0].is_typed_reference());
    }

    #[test]
    fn parses_domain_and_alias_together() {
        let links = parse_wikilinks("[[billing::Invoice|the invoice]]");
        assert_eq!(links[0].domain.as_deref(), Some("billing"));
        assert_eq!(links[0].target, "Invoice");
        assert_eq!(links[0].alias.as_deref(), Some("the invoice"));
    }

    #[test]
    fn ignores_empty_brackets() {
        assert!(parse_wikilinks("[[]]").is_empty());
        assert!(parse_wikilinks("[[ ]]").is_empty());
    }

    #[test]
    fn entity_target_is_not_typed() {
        let links = parse_wikilinks("[[KDDDocument]]");
        assert!(!links[0].is_typed_reference());
    }

    #[test]
    fn finds_multiple_links() {
        let links = parse_wikilinks("[[A]] and [[B|alias]] and [[c::C]]");
        assert_eq!(links.len(), 3);
    }
}

// src/scan/link.rs
// =============================================================================
// Link validation for search-result anchors.
//
// A Google result page (the plain HTML one) wraps every organic result in a
// redirect link:
//
//     /url?q=https://www.java.com/&sa=U&ved=...
//
// Everything else on the page (navigation, filters, "next page", ...) is an
// internal link we ignore. From a redirect link we want:
// - the CanonicalDomain, used to crawl each site only once
// - the site root URL, which is what a worker downloads
//
// Rust concepts:
// - once_cell::sync::Lazy: a value computed on first use and shared after
// - Option<T>: "this href was not a result link"
// - Newtypes: CanonicalDomain wraps a String so it can't be mixed up with URLs
// =============================================================================

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use url::Url;

/// Prefix of the search engine's indirect result links
pub const RESULT_LINK_MARKER: &str = "/url?q=";

const WWW: &str = "www.";

// One or more `label.` groups followed by a 2-6 letter top-level label.
// Labels are alphanumeric with interior hyphens, 1-63 characters.
static DOMAIN_NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([a-zA-Z0-9]([a-zA-Z0-9\-]{0,61}[a-zA-Z0-9])?\.)+[a-zA-Z]{2,6}")
        .expect("domain pattern is a valid regex")
});

// Only used to resolve the relative href so we can read its query string
static SEARCH_BASE: Lazy<Url> =
    Lazy::new(|| Url::parse("https://www.google.com/").expect("search base is a valid URL"));

/// Lowercase host name, always `www.`-prefixed.
///
/// `java.com` and `www.java.com` produce the same value, so the crawl only
/// visits that site once.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalDomain(String);

impl CanonicalDomain {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Fallback URL when the href's destination can't be parsed
    pub fn root_url(&self) -> String {
        format!("https://{}/", self.0)
    }
}

impl fmt::Display for CanonicalDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Validates a raw anchor target and returns its canonical domain
//
// The domain pattern runs over the decoded destination (the `q` parameter),
// so an escaped link and a plain link to the same site get the same key.
// Hrefs whose query can't be decoded fall back to the raw text.
//
// Returns None when:
// - the href is not an indirect result link (doesn't start with /url?q=)
// - no domain name can be found in it
//
// Examples:
//   "/url?q=https://java.com/&sa=U"             -> Some("www.java.com")
//   "/url?q=https://www.java.com/&sa=U"         -> Some("www.java.com")
//   "/url?q=https%3A%2F%2Fjava.com%2F&sa=U"     -> Some("www.java.com")
//   "search?q=java&num=20"                      -> None
pub fn validate(raw_href: &str) -> Option<CanonicalDomain> {
    if !raw_href.starts_with(RESULT_LINK_MARKER) {
        return None;
    }

    // Same text destination_url() parses, so the key matches what gets fetched
    let domain = match embedded_destination(raw_href) {
        Some(target) => extract_domain_name(&target)?,
        None => extract_domain_name(raw_href)?,
    };

    if domain.starts_with(WWW) {
        Some(CanonicalDomain(domain))
    } else {
        Some(CanonicalDomain(format!("{}{}", WWW, domain)))
    }
}

// Finds the first domain-looking substring, lowercased and trimmed
fn extract_domain_name(text: &str) -> Option<String> {
    DOMAIN_NAME_PATTERN
        .find(text)
        .map(|m| m.as_str().trim().to_lowercase())
}

// The percent-decoded `q` parameter of a result link
fn embedded_destination(raw_href: &str) -> Option<String> {
    let redirect = SEARCH_BASE.join(raw_href).ok()?;
    let (_, target) = redirect.query_pairs().find(|(key, _)| key == "q")?;
    Some(target.trim().to_string())
}

// Recovers the site root a result link points to
//
// The destination is the `q` query parameter of the redirect link. We only
// keep its origin: one page per site is what gets scanned.
//
// Example:
//   "/url?q=https://java.com/download/&sa=U" -> Some("https://java.com/")
pub fn destination_url(raw_href: &str) -> Option<String> {
    if !raw_href.starts_with(RESULT_LINK_MARKER) {
        return None;
    }

    let target = Url::parse(&embedded_destination(raw_href)?).ok()?;

    match target.scheme() {
        "http" | "https" => {}
        _ => return None,
    }
    target.host_str()?;

    // ascii_serialization() of an http(s) origin is "scheme://host[:port]"
    Some(format!("{}/", target.origin().ascii_serialization()))
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why a regex instead of Url::parse for the domain?
//    - The href is a search-engine artifact, not a clean URL. The pattern
//      also copes with hrefs whose destination is half-escaped or truncated.
//    - The first match wins. "url" and "https" never match because a label
//      must be followed by a dot.
//
// 2. Why Lazy?
//    - Compiling a regex is not free. Lazy compiles it once and every
//      thread (every worker) shares the same compiled pattern.
//    - Regex is Sync, so validate() can be called from any thread.
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_adds_www() {
        let domain = validate("/url?q=https://java.com/&amp;sa=U&amp;ved=2ahAB&amp;usg=APzvKtb");
        assert_eq!(domain.unwrap().as_str(), "www.java.com");
    }

    #[test]
    fn test_validate_keeps_www() {
        let domain = validate("/url?q=https://www.java.com/&amp;sa=U&amp;ved=2ahAB");
        assert_eq!(domain.unwrap().as_str(), "www.java.com");
    }

    #[test]
    fn test_validate_lowercases() {
        let domain = validate("/url?q=https://Docs.Oracle.COM/en/&sa=U");
        assert_eq!(domain.unwrap().as_str(), "www.docs.oracle.com");
    }

    #[test]
    fn test_validate_rejects_internal_links() {
        assert_eq!(validate("search?q=java&amp;num=20&amp;gbv=1&amp;sei=5d9AE"), None);
        assert_eq!(validate("/search?q=java&tbm=isch"), None);
        assert_eq!(validate("https://www.java.com/"), None);
    }

    #[test]
    fn test_validate_rejects_links_without_domain() {
        assert_eq!(validate("/url?q=https://wwww-java/&amp;sa=U&amp;ved=2ahAB"), None);
    }

    #[test]
    fn test_extract_domain_name() {
        assert_eq!(
            extract_domain_name("/url?q=https://java.com/&amp;sa=U"),
            Some("java.com".to_string())
        );
    }

    #[test]
    fn test_www_and_bare_collide() {
        let bare = validate("/url?q=http://example.com/a");
        let www = validate("/url?q=https://www.example.com/b");
        assert_eq!(bare, www);
    }

    #[test]
    fn test_escaped_and_plain_links_share_a_domain() {
        let escaped = "/url?q=https%3A%2F%2Fwww.oracle.com%2Fjava%2F&sa=U";
        let plain = "/url?q=https://www.oracle.com/java/&sa=U";

        assert_eq!(validate(escaped).unwrap().as_str(), "www.oracle.com");
        assert_eq!(validate(escaped), validate(plain));
        assert_eq!(destination_url(escaped), destination_url(plain));
    }

    #[test]
    fn test_destination_url_is_site_root() {
        assert_eq!(
            destination_url("/url?q=https://java.com/download/&sa=U&ved=2ahAB"),
            Some("https://java.com/".to_string())
        );
    }

    #[test]
    fn test_destination_url_decodes_query() {
        assert_eq!(
            destination_url("/url?q=https%3A%2F%2Fwww.oracle.com%2Fjava%2F&sa=U"),
            Some("https://www.oracle.com/".to_string())
        );
    }

    #[test]
    fn test_destination_url_rejects_other_schemes() {
        assert_eq!(destination_url("/url?q=ftp://files.example.com/&sa=U"), None);
        assert_eq!(destination_url("/search?q=java"), None);
    }

    #[test]
    fn test_root_url_fallback() {
        let domain = validate("/url?q=java.com&sa=U").unwrap();
        assert_eq!(domain.root_url(), "https://www.java.com/");
    }
}

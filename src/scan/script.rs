// src/scan/script.rs
// =============================================================================
// This module extracts JavaScript library names from an HTML page.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
//
// For every <script src="..."> we keep the file name of the script:
//
//     <script src="https://code.jquery.com/jquery-3.7.1.min.js?v=2">
//         -> "jquery-3.7.1.min.js"
//
// Rust concepts:
// - Iterators: filter_map() turns "maybe a library" into "only libraries"
// - String slicing: &src[start..end] borrows part of a string, no copy
// =============================================================================

use once_cell::sync::Lazy;
use scraper::{Html, Selector};

const JS_EXTENSION: &str = ".js";

static SCRIPT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("script").expect("'script' is a valid selector"));

// Extracts the library names referenced by a page's script tags
//
// Parameters:
//   html: the page body
//
// Returns: one name per matching script tag, in document order. A page that
// includes the same file twice reports it twice.
//
// Example:
//   html = r#"<script src="/static/js/app.js"></script><script>inline()</script>"#
//   result = ["app.js"]
pub fn extract_libraries(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    document
        .select(&SCRIPT_SELECTOR)
        .filter_map(|element| element.value().attr("src"))
        .filter_map(library_name)
        .collect()
}

// Turns a script src into a library name
//
// Returns None when the src is blank or doesn't point at a .js file.
//
// Examples:
//   "https://cdn.example.com/lib/jquery.min.js"  -> Some("jquery.min.js")
//   "/assets/app.js?v=123#x"                     -> Some("app.js")
//   "//cdn.example.com/bundle.js.gz"             -> Some("bundle.js")
//   "/api/data.json"                             -> None
//   "   "                                        -> None
pub fn library_name(src: &str) -> Option<String> {
    let src = src.trim();
    if src.is_empty() || !src.contains(JS_EXTENSION) {
        return None;
    }

    // Drop the query string and fragment first, they may contain slashes
    let path = match src.find(&['?', '#'][..]) {
        Some(end) => &src[..end],
        None => src,
    };

    let file = match path.rfind('/') {
        Some(slash) => &path[slash + 1..],
        None => path,
    };

    let end = last_extension_end(file)?;
    let name = &file[..end];

    // A bare ".js" has no name in front of the extension
    if name.len() <= JS_EXTENSION.len() {
        return None;
    }
    Some(name.to_string())
}

// Byte offset right after the last ".js" that really ends an extension,
// i.e. is not the start of ".json", ".jsx", ...
fn last_extension_end(file: &str) -> Option<usize> {
    file.match_indices(JS_EXTENSION)
        .map(|(start, _)| start + JS_EXTENSION.len())
        .filter(|&end| {
            file[end..]
                .chars()
                .next()
                .map_or(true, |next| !next.is_ascii_alphanumeric())
        })
        .last()
}

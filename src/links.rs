//! Pattern-based link extraction over aggregated markup.
//!
//! Both passes are single scans over plain text. Nothing here parses HTML:
//! the upstream listing is machine-generated and stable in shape, so a regex
//! over the raw text is enough and keeps working on malformed markup.

use std::sync::LazyLock;

use crate::model::DocumentLink;

pub const DEFAULT_FRAGMENT_HREF_PREFIX: &str = "/resources/safety-data-sheets?t=other&i=";

static DOCUMENT_LINK: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r#"https?://[^\s'"]+\.pdf"#).expect("document link regex is valid")
});

static DEFAULT_FRAGMENT_PATTERN: LazyLock<FragmentIdPattern> = LazyLock::new(|| {
    FragmentIdPattern::new(DEFAULT_FRAGMENT_HREF_PREFIX).expect("fragment regex is valid")
});

/// Every absolute `http(s)` URL ending in `.pdf`, in document order.
///
/// A match is the longest run of non-whitespace, non-quote characters that
/// ends in `.pdf`. Duplicates are kept.
pub fn extract_document_links(text: &str) -> Vec<String> {
    DOCUMENT_LINK
        .find_iter(text)
        .map(|m| m.as_str().to_owned())
        .collect()
}

/// Same as [`extract_document_links`], wrapped as [`DocumentLink`]s.
pub fn extract_document_link_candidates(text: &str) -> Vec<DocumentLink> {
    extract_document_links(text)
        .into_iter()
        .map(DocumentLink::new)
        .collect()
}

/// Fragment identifiers from `href="/resources/safety-data-sheets?t=other&i=<id>"`.
pub fn extract_fragment_ids(text: &str) -> Vec<String> {
    DEFAULT_FRAGMENT_PATTERN.extract(text)
}

/// Matches double-quoted `href` values that start with a fixed prefix and
/// yields what follows the prefix.
#[derive(Debug, Clone)]
pub struct FragmentIdPattern {
    prefix: String,
    regex: regex::Regex,
}

impl FragmentIdPattern {
    pub fn new(href_prefix: &str) -> Result<Self, regex::Error> {
        let regex = regex::Regex::new(&format!(
            r#"href="({}[^"]+)""#,
            regex::escape(href_prefix)
        ))?;
        Ok(Self {
            prefix: href_prefix.to_owned(),
            regex,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Identifiers in document order, duplicates kept, decoded from their
    /// query-string form. Matches that are nothing but punctuation once
    /// trimmed are dropped.
    pub fn extract(&self, text: &str) -> Vec<String> {
        self.regex
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .filter_map(|href| {
                let id = href.as_str().strip_prefix(self.prefix.as_str())?;
                let id = decode_query_value(clean_fragment_id(id));
                (!id.is_empty()).then_some(id)
            })
            .collect()
    }
}

fn clean_fragment_id(id: &str) -> &str {
    // Anything after another query parameter or an anchor is not part of the id.
    let id = id.split(['&', '#']).next().unwrap_or_default();
    id.trim_matches(|c: char| {
        c.is_whitespace() || (c.is_ascii_punctuation() && !matches!(c, '-' | '_' | '%' | '+'))
    })
}

/// `+` and `%XX` escapes as a browser would decode them. The id is form-encoded
/// again when it is sent.
fn decode_query_value(raw: &str) -> String {
    url::form_urlencoded::parse(format!("i={raw}").as_bytes())
        .next()
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_document_links_keeps_document_order() {
        let text = "<a href='https://ex.com/a.pdf'>x</a> and https://ex.com/b.pdf";
        assert_eq!(
            extract_document_links(text),
            vec!["https://ex.com/a.pdf", "https://ex.com/b.pdf"]
        );
    }

    #[test]
    fn extract_document_links_keeps_duplicates_and_stops_at_quotes() {
        let text = r#"<a href="http://ex.com/x y/a.pdf">"https://ex.com/b.pdf"https://ex.com/b.pdf"#;
        assert_eq!(
            extract_document_links(text),
            vec!["https://ex.com/b.pdf", "https://ex.com/b.pdf"]
        );
    }

    #[test]
    fn extract_document_links_takes_longest_run_ending_in_pdf() {
        let text = "see https://ex.com/a.pdf/b.pdf?x=1 now";
        assert_eq!(extract_document_links(text), vec!["https://ex.com/a.pdf/b.pdf"]);
    }

    #[test]
    fn extract_document_links_ignores_relative_and_other_extensions() {
        let text = r#"<a href="/docs/a.pdf">a</a> https://ex.com/b.PDF https://ex.com/c.html"#;
        assert!(extract_document_links(text).is_empty());
    }

    #[test]
    fn extract_document_link_candidates_flags_absolute_links() {
        let links = extract_document_link_candidates("https://ex.com/a.pdf");
        assert_eq!(links.len(), 1);
        assert!(links[0].has_host);
        assert_eq!(links[0].raw, "https://ex.com/a.pdf");
    }

    #[test]
    fn extract_fragment_ids_strips_prefix() {
        let text = r#"href="/resources/safety-data-sheets?t=other&i=123""#;
        assert_eq!(extract_fragment_ids(text), vec!["123"]);
    }

    #[test]
    fn extract_fragment_ids_keeps_order_and_duplicates() {
        let text = r#"
            <a href="/resources/safety-data-sheets?t=other&i=fr">FR</a>
            <a href="/resources/safety-data-sheets?t=other&i=de">DE</a>
            <a href="/resources/safety-data-sheets?t=other&i=fr">FR</a>
        "#;
        assert_eq!(extract_fragment_ids(text), vec!["fr", "de", "fr"]);
    }

    #[test]
    fn extract_fragment_ids_without_matches_is_empty() {
        assert!(extract_fragment_ids("<p>nothing here</p>").is_empty());
        assert!(extract_fragment_ids(r#"href='/resources/safety-data-sheets?t=other&i=1'"#).is_empty());
        assert!(extract_fragment_ids(r#"href="/resources/safety-data-sheets?t=sds&i=1""#).is_empty());
    }

    #[test]
    fn extract_fragment_ids_trims_leftover_punctuation() {
        let text = r#"
            href="/resources/safety-data-sheets?t=other&i=42/"
            href="/resources/safety-data-sheets?t=other&i= 7 "
            href="/resources/safety-data-sheets?t=other&i=es-mx&lang=1"
            href="/resources/safety-data-sheets?t=other&i=9#top"
            href="/resources/safety-data-sheets?t=other&i=?"
        "#;
        assert_eq!(extract_fragment_ids(text), vec!["42", "7", "es-mx", "9"]);
    }

    #[test]
    fn extract_fragment_ids_decodes_query_escapes() {
        let text = r#"
            href="/resources/safety-data-sheets?t=other&i=North+America"
            href="/resources/safety-data-sheets?t=other&i=%C3%A9t%C3%A9"
            href="/resources/safety-data-sheets?t=other&i=a%2Bb"
        "#;
        assert_eq!(
            extract_fragment_ids(text),
            vec!["North America", "été", "a+b"]
        );
    }

    #[test]
    fn fragment_pattern_escapes_custom_prefix() {
        let pattern = FragmentIdPattern::new("/list.php?kind=").expect("build pattern");
        let text = r#"href="/list.php?kind=a1" href="/listXphp?kind=b2""#;
        assert_eq!(pattern.extract(text), vec!["a1"]);
        assert_eq!(pattern.prefix(), "/list.php?kind=");
    }
}

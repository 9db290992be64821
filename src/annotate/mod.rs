//! Text annotation for comment and description fields.
//!
//! Turns untrusted, user-authored text into an HTML fragment that can be
//! embedded in a page as-is:
//! - HTML-significant characters in plain text are escaped
//! - `http://` / `https://` URLs become anchors
//! - `bug N` / `Bug N` references become anchors to `{base}/bug/N`
//!
//! # Passes
//!
//! Annotation runs over a [`Segments`] sequence:
//!
//! 1. The input starts as a single raw segment.
//! 2. The URL pass splits raw segments into escaped text and URL anchors.
//! 3. The bug pass splits the escaped text segments into text and bug
//!    anchors. URL anchors are never rescanned, so a `bug 5` inside a URL
//!    stays part of that URL.
//! 4. The segment texts are joined.
//!
//! URLs are placed into the anchor unescaped. A URL containing `&` therefore
//! produces a bare `&` inside the `href`.

pub mod html;
mod segment;

pub use segment::{Segment, SegmentKind, Segments};

use regex::Regex;
use std::sync::LazyLock;
use tracing::trace;

/// Scheme, dotted host, optional port, optional path.
///
/// The path may hold anything except ASCII whitespace and `"`, but must end
/// on an alphanumeric, `/` or `)` so trailing sentence punctuation stays
/// outside the link.
const URL_PATTERN: &str = concat!(
    r"https?://(?:[a-zA-Z0-9]+\.)*[a-zA-Z0-9]+",
    r"(?::[0-9]+)?",
    r#"(?:/(?:[^\t\n\f\r "]*[0-9a-zA-Z/)])?)?"#,
);

/// Only the first letter may vary in case. Whitespace is the ASCII set
/// `\t \n \f \r` and space; vertical tab and Unicode spaces do not count.
const BUG_REF_PATTERN: &str = r"[bB]ug[\t\n\f\r ]+([0-9]+)";

#[allow(clippy::expect_used)] // Patterns are static and valid
static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(URL_PATTERN).expect("URL pattern is valid"));

#[allow(clippy::expect_used)] // Patterns are static and valid
static BUG_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(BUG_REF_PATTERN).expect("bug reference pattern is valid"));

/// Annotates text against a fixed bug base URL.
///
/// Cheap to clone and safe to share across threads; every call works on its
/// own segment sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotator {
    bug_base_url: String,
}

impl Annotator {
    /// Create an annotator linking bug references under `bug_base_url`.
    ///
    /// The base is used verbatim: no trailing-slash trimming, and an empty
    /// base yields root-relative `/bug/N` links.
    #[must_use]
    pub fn new(bug_base_url: impl Into<String>) -> Self {
        Self {
            bug_base_url: bug_base_url.into(),
        }
    }

    #[must_use]
    pub fn bug_base_url(&self) -> &str {
        &self.bug_base_url
    }

    /// Annotate `raw` and return the HTML fragment.
    #[must_use]
    pub fn annotate(&self, raw: &str) -> String {
        self.segments(raw).join()
    }

    /// Run both passes and return the final segment sequence.
    #[must_use]
    pub fn segments(&self, raw: &str) -> Segments {
        let segments = link_bug_refs(link_urls(Segments::from_raw(raw)), &self.bug_base_url);
        trace!(
            input_len = raw.len(),
            segments = segments.len(),
            "annotated text"
        );
        segments
    }

    /// Anchor markup for bug `number`, showing `text`.
    #[must_use]
    pub fn bug_link(&self, number: &str, text: &str) -> String {
        bug_link(&self.bug_base_url, number, text)
    }
}

/// Annotate `raw`, linking bug references under `bug_base_url`.
///
/// Total: every input produces output, and the empty string maps to the
/// empty string.
#[must_use]
pub fn annotate(raw: &str, bug_base_url: &str) -> String {
    Annotator::new(bug_base_url).annotate(raw)
}

/// Anchor markup for a URL. The URL is used unescaped as both target and
/// body.
#[must_use]
pub fn url_link(url: &str) -> String {
    format!("<a target='_blank' href='{url}'>{url}</a>")
}

/// Anchor markup for bug `number` under `bug_base_url`, showing `text`.
#[must_use]
pub fn bug_link(bug_base_url: &str, number: &str, text: &str) -> String {
    format!("<a target='_blank' href='{bug_base_url}/bug/{number}'>{text}</a>")
}

/// URL pass: escape raw text and turn URLs into anchors.
#[must_use]
pub fn link_urls(segments: Segments) -> Segments {
    segments.split_on(
        &URL_RE,
        |segment| !segment.is_final(),
        |gap| Segment::text(html::escape(gap)),
        |caps| {
            let url = &caps[0];
            Segment::url_link(url_link(url), url)
        },
    )
}

/// Bug pass: link `bug N` references found in escaped text segments.
///
/// Raw segments are not eligible; run [`link_urls`] first.
#[must_use]
pub fn link_bug_refs(segments: Segments, bug_base_url: &str) -> Segments {
    segments.split_on(
        &BUG_REF_RE,
        |segment| segment.kind == SegmentKind::Text,
        |gap| Segment::text(gap),
        |caps| {
            let number = &caps[1];
            Segment::bug_link(bug_link(bug_base_url, number, &caps[0]), number)
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://x";

    fn kinds(segments: &Segments) -> Vec<&'static str> {
        segments
            .iter()
            .map(|segment| match segment.kind {
                SegmentKind::Raw => "raw",
                SegmentKind::Text => "text",
                SegmentKind::UrlLink { .. } => "url",
                SegmentKind::BugLink { .. } => "bug",
            })
            .collect()
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(annotate("", BASE), "");
        assert!(Annotator::new(BASE).segments("").is_empty());
    }

    #[test]
    fn test_plain_text_is_escaped() {
        assert_eq!(
            annotate("if a < b && c > d say \"hi\"", BASE),
            "if a &lt; b &amp;&amp; c &gt; d say &#34;hi&#34;"
        );
    }

    #[test]
    fn test_url_substitution() {
        assert_eq!(
            annotate("See https://example.com/path for info", BASE),
            "See <a target='_blank' href='https://example.com/path'>https://example.com/path</a> for info"
        );
    }

    #[test]
    fn test_bug_reference_substitution() {
        assert_eq!(
            annotate("fixed in bug 42 yesterday", BASE),
            "fixed in <a target='_blank' href='https://x/bug/42'>bug 42</a> yesterday"
        );
    }

    #[test]
    fn test_capitalized_bug_keeps_original_text() {
        assert_eq!(
            annotate("Bug 7", BASE),
            "<a target='_blank' href='https://x/bug/7'>Bug 7</a>"
        );
    }

    #[test]
    fn test_bug_inside_url_is_not_relinked() {
        let out = annotate("see https://x.com/bug 5 page", BASE);
        assert_eq!(
            out,
            "see <a target='_blank' href='https://x.com/bug'>https://x.com/bug</a> 5 page"
        );
        assert!(!out.contains("/bug/5"));
    }

    #[test]
    fn test_bug_fully_inside_url_path() {
        let out = annotate("https://x.com/bug%205/list", BASE);
        assert_eq!(
            out,
            "<a target='_blank' href='https://x.com/bug%205/list'>https://x.com/bug%205/list</a>"
        );
    }

    #[test]
    fn test_escaping_survives_around_links() {
        assert_eq!(
            annotate("a<b> bug 3 https://x.com/p", BASE),
            "a&lt;b&gt; <a target='_blank' href='https://x/bug/3'>bug 3</a> \
             <a target='_blank' href='https://x.com/p'>https://x.com/p</a>"
        );
    }

    #[test]
    fn test_interleaved_matches_keep_order() {
        let annotator = Annotator::new(BASE);
        let segments =
            annotator.segments("one http://a.org/1 two bug 9 three https://b.org/2 four");
        assert_eq!(
            kinds(&segments),
            ["text", "url", "text", "bug", "text", "url", "text"]
        );
        assert_eq!(
            segments.join(),
            "one <a target='_blank' href='http://a.org/1'>http://a.org/1</a> two \
             <a target='_blank' href='https://x/bug/9'>bug 9</a> three \
             <a target='_blank' href='https://b.org/2'>https://b.org/2</a> four"
        );
    }

    #[test]
    fn test_all_segments_final_after_annotation() {
        let segments = Annotator::new(BASE).segments("x <y> http://a.b/c bug 1");
        assert!(segments.iter().all(Segment::is_final));
    }

    #[test]
    fn test_trailing_punctuation_excluded_from_url() {
        assert_eq!(
            annotate("Go to https://example.com/docs.", BASE),
            "Go to <a target='_blank' href='https://example.com/docs'>https://example.com/docs</a>."
        );
        assert_eq!(
            annotate("(see http://a.io/x/y), then", BASE),
            "(see <a target='_blank' href='http://a.io/x/y)'>http://a.io/x/y)</a>, then"
        );
    }

    #[test]
    fn test_url_without_path_and_with_port() {
        assert_eq!(
            annotate("host https://example.com now", BASE),
            "host <a target='_blank' href='https://example.com'>https://example.com</a> now"
        );
        assert_eq!(
            annotate("dev http://localhost:8000/bug/3!", BASE),
            "dev <a target='_blank' href='http://localhost:8000/bug/3'>http://localhost:8000/bug/3</a>!"
        );
    }

    #[test]
    fn test_url_stops_at_double_quote() {
        assert_eq!(
            annotate("\"http://a.com/x\"", BASE),
            "&#34;<a target='_blank' href='http://a.com/x'>http://a.com/x</a>&#34;"
        );
    }

    #[test]
    fn test_url_query_ampersand_is_not_escaped() {
        // Known limitation: the URL is embedded verbatim.
        assert_eq!(
            annotate("http://a.com/q?x=1&y=2", BASE),
            "<a target='_blank' href='http://a.com/q?x=1&y=2'>http://a.com/q?x=1&y=2</a>"
        );
    }

    #[test]
    fn test_bug_case_rule_is_narrow() {
        assert_eq!(annotate("BUG 1 and bUG 2", BASE), "BUG 1 and bUG 2");
    }

    #[test]
    fn test_bug_whitespace_runs() {
        assert_eq!(
            annotate("bug\t \t12", BASE),
            "<a target='_blank' href='https://x/bug/12'>bug\t \t12</a>"
        );
        assert_eq!(annotate("bug12", BASE), "bug12");
    }

    #[test]
    fn test_only_ascii_whitespace_separates_bug_number() {
        assert_eq!(annotate("bug\u{00A0}5", BASE), "bug\u{00A0}5");
        assert_eq!(annotate("bug\u{000B}5", BASE), "bug\u{000B}5");
        assert_eq!(annotate("bug\u{2003}5", BASE), "bug\u{2003}5");
        assert_eq!(
            annotate("bug\u{000C}\r\n5", BASE),
            "<a target='_blank' href='https://x/bug/5'>bug\u{000C}\r\n5</a>"
        );
    }

    #[test]
    fn test_url_path_runs_through_unicode_spaces() {
        assert_eq!(
            annotate("https://a.com/x\u{2003}y z", BASE),
            "<a target='_blank' href='https://a.com/x\u{2003}y'>https://a.com/x\u{2003}y</a> z"
        );
        assert_eq!(
            annotate("https://a.com/x\u{00A0}y\tz", BASE),
            "<a target='_blank' href='https://a.com/x\u{00A0}y'>https://a.com/x\u{00A0}y</a>\tz"
        );
    }

    #[test]
    fn test_bug_without_word_boundary() {
        assert_eq!(
            annotate("debug 5", BASE),
            "de<a target='_blank' href='https://x/bug/5'>bug 5</a>"
        );
    }

    #[test]
    fn test_bug_number_copied_verbatim() {
        let huge = "bug 000123456789012345678901234567890";
        assert_eq!(
            annotate(huge, BASE),
            "<a target='_blank' href='https://x/bug/000123456789012345678901234567890'>\
             bug 000123456789012345678901234567890</a>"
        );
    }

    #[test]
    fn test_empty_base_url() {
        assert_eq!(
            annotate("bug 8", ""),
            "<a target='_blank' href='/bug/8'>bug 8</a>"
        );
    }

    #[test]
    fn test_base_url_used_verbatim() {
        let annotator = Annotator::new("https://bugs.example.com/");
        assert_eq!(annotator.bug_base_url(), "https://bugs.example.com/");
        assert_eq!(
            annotator.annotate("bug 1"),
            "<a target='_blank' href='https://bugs.example.com//bug/1'>bug 1</a>"
        );
    }

    #[test]
    fn test_bug_pass_ignores_raw_segments() {
        let segments = link_bug_refs(Segments::from_raw("bug 1"), BASE);
        assert_eq!(kinds(&segments), ["raw"]);
    }

    #[test]
    fn test_url_pass_alone_escapes_everything() {
        let segments = link_urls(Segments::from_raw("<bug 1>"));
        assert_eq!(kinds(&segments), ["text"]);
        assert_eq!(segments.join(), "&lt;bug 1&gt;");
    }

    #[test]
    fn test_bug_link_records_number() {
        let segments = Annotator::new(BASE).segments("Bug  77");
        let first = segments.iter().next().expect("segment");
        assert_eq!(
            first.kind,
            SegmentKind::BugLink {
                number: "77".to_string()
            }
        );
    }

    #[test]
    fn test_multibyte_text_around_links() {
        assert_eq!(
            annotate("überprüfe bug 3 – danke", BASE),
            "überprüfe <a target='_blank' href='https://x/bug/3'>bug 3</a> – danke"
        );
    }

    #[test]
    fn test_annotator_shared_across_threads() {
        let annotator = std::sync::Arc::new(Annotator::new(BASE));
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let annotator = std::sync::Arc::clone(&annotator);
                std::thread::spawn(move || annotator.annotate(&format!("bug {i}")))
            })
            .collect();
        for (i, handle) in handles.into_iter().enumerate() {
            let html = handle.join().expect("thread panicked");
            assert_eq!(html, format!("<a target='_blank' href='https://x/bug/{i}'>bug {i}</a>"));
        }
    }
}

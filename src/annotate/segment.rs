//! Segment sequences: the intermediate form of an annotation.
//!
//! A [`Segments`] value is an ordered list of [`Segment`]s whose texts,
//! concatenated in order, form the rendered output. Each annotation pass
//! consumes one sequence and returns a new one.

use regex::{Captures, Regex};
use serde::Serialize;

/// What a segment holds and whether later passes may touch it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SegmentKind {
    /// Untrusted input, not yet escaped.
    Raw,
    /// Escaped plain text. Still eligible for bug-reference linking.
    Text,
    /// Anchor produced from a URL.
    UrlLink { url: String },
    /// Anchor produced from a "bug N" reference.
    BugLink { number: String },
}

/// A contiguous run of output text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub text: String,
    #[serde(flatten)]
    pub kind: SegmentKind,
}

impl Segment {
    #[must_use]
    pub fn raw(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: SegmentKind::Raw,
        }
    }

    /// Escaped plain text. The caller is responsible for having escaped it.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: SegmentKind::Text,
        }
    }

    #[must_use]
    pub fn url_link(markup: String, url: impl Into<String>) -> Self {
        Self {
            text: markup,
            kind: SegmentKind::UrlLink { url: url.into() },
        }
    }

    #[must_use]
    pub fn bug_link(markup: String, number: impl Into<String>) -> Self {
        Self {
            text: markup,
            kind: SegmentKind::BugLink {
                number: number.into(),
            },
        }
    }

    /// True once the segment's text is output-ready and must not be escaped
    /// again.
    #[must_use]
    pub const fn is_final(&self) -> bool {
        !matches!(self.kind, SegmentKind::Raw)
    }

    /// True for anchor segments, which no pass may rescan.
    #[must_use]
    pub const fn is_link(&self) -> bool {
        matches!(
            self.kind,
            SegmentKind::UrlLink { .. } | SegmentKind::BugLink { .. }
        )
    }
}

/// Ordered segment sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Segments(Vec<Segment>);

impl Segments {
    /// A fresh sequence holding the whole input as one raw segment.
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        Self(vec![Segment::raw(raw)])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
        self.0.iter()
    }

    /// Number of segments matching `pred`.
    pub fn count_where(&self, pred: impl Fn(&Segment) -> bool) -> usize {
        self.0.iter().filter(|segment| pred(segment)).count()
    }

    /// Concatenate all segment texts in order.
    #[must_use]
    pub fn join(&self) -> String {
        let len = self.0.iter().map(|segment| segment.text.len()).sum();
        let mut out = String::with_capacity(len);
        for segment in &self.0 {
            out.push_str(&segment.text);
        }
        out
    }

    /// Build the next sequence by replacing every segment selected by
    /// `eligible` with the pieces produced by splitting it on `pattern`.
    ///
    /// Unselected segments are carried over untouched. For a selected
    /// segment, each non-empty gap between matches goes through `gap` and
    /// each match goes through `hit`, left to right.
    #[must_use]
    pub fn split_on<E, G, H>(self, pattern: &Regex, eligible: E, gap: G, hit: H) -> Self
    where
        E: Fn(&Segment) -> bool,
        G: Fn(&str) -> Segment,
        H: Fn(&Captures<'_>) -> Segment,
    {
        let mut out = Vec::with_capacity(self.0.len());
        for segment in self.0 {
            if !eligible(&segment) {
                out.push(segment);
                continue;
            }

            let text = segment.text.as_str();
            let mut end = 0;
            for caps in pattern.captures_iter(text) {
                let Some(whole) = caps.get(0) else {
                    continue;
                };
                if whole.start() > end {
                    out.push(gap(&text[end..whole.start()]));
                }
                out.push(hit(&caps));
                end = whole.end();
            }
            if end < text.len() {
                out.push(gap(&text[end..]));
            }
        }
        Self(out)
    }
}

impl<'a> IntoIterator for &'a Segments {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<Vec<Segment>> for Segments {
    fn from(segments: Vec<Segment>) -> Self {
        Self(segments)
    }
}

//! `bagzulla`: HTML annotation of bug-tracker text.
//!
//! The core is [`annotate()`]: it escapes untrusted comment or description
//! text and turns URLs and `bug N` references into links.
//!
//! ```
//! let html = bagzulla::annotate("fixed in bug 42 <really>", "https://bugs.example.com");
//! assert_eq!(
//!     html,
//!     "fixed in <a target='_blank' href='https://bugs.example.com/bug/42'>bug 42</a> &lt;really&gt;"
//! );
//! ```

pub mod annotate;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;

pub use annotate::{Annotator, Segment, SegmentKind, Segments, annotate};
pub use error::{BagzError, ErrorCode, Result, StructuredError};

//! Annotate command implementation.

use crate::annotate::{Annotator, SegmentKind, Segments};
use crate::cli::AnnotateArgs;
use crate::config::{self, CliOverrides};
use crate::error::{BagzError, Result, ResultExt};
use crate::output::OutputContext;
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Serialize)]
struct AnnotateOutput<'a> {
    html: String,
    bug_base_url: &'a str,
    urls: Vec<&'a str>,
    bug_refs: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    segments: Option<&'a Segments>,
}

/// Execute the annotate command.
///
/// # Errors
///
/// Returns an error if the input cannot be read, config cannot be loaded, or
/// output cannot be written.
pub fn execute(args: &AnnotateArgs, cli: &CliOverrides, ctx: &OutputContext) -> Result<()> {
    let project_dir = config::discover_project_dir(None);
    let layer = config::load_config(project_dir.as_deref(), cli)?;
    let annotator = Annotator::new(config::bug_base_url_from_layer(&layer));
    debug!(bug_base_url = annotator.bug_base_url(), "Resolved bug base URL");

    let raw = read_input(args)?;
    let segments = annotator.segments(&raw);

    let urls: Vec<&str> = segments
        .iter()
        .filter_map(|segment| match &segment.kind {
            SegmentKind::UrlLink { url } => Some(url.as_str()),
            _ => None,
        })
        .collect();
    let bug_refs: Vec<&str> = segments
        .iter()
        .filter_map(|segment| match &segment.kind {
            SegmentKind::BugLink { number } => Some(number.as_str()),
            _ => None,
        })
        .collect();
    info!(
        input_len = raw.len(),
        urls = urls.len(),
        bug_refs = bug_refs.len(),
        "Annotated input"
    );

    if ctx.is_json() {
        let output = AnnotateOutput {
            html: segments.join(),
            bug_base_url: annotator.bug_base_url(),
            urls,
            bug_refs,
            segments: args.segments.then_some(&segments),
        };
        return ctx.json_pretty(&output);
    }

    ctx.emit(&segments.join())
}

fn read_input(args: &AnnotateArgs) -> Result<String> {
    if !args.text.is_empty() {
        return Ok(args.text.join(" "));
    }
    let bytes = match args.file.as_deref() {
        Some(path) if path != Path::new("-") => read_file(path)?,
        _ => read_stdin()?,
    };
    Ok(decode(bytes))
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        return Err(BagzError::InputNotFound {
            path: path.to_path_buf(),
        });
    }
    debug!(path = %path.display(), "Reading input file");
    fs::read(path).with_context(|| format!("reading {}", path.display()))
}

fn read_stdin() -> Result<Vec<u8>> {
    debug!("Reading input from stdin");
    let mut bytes = Vec::new();
    io::stdin()
        .lock()
        .read_to_end(&mut bytes)
        .context("reading stdin")?;
    Ok(bytes)
}

/// Decode input as UTF-8, replacing invalid sequences rather than failing.
fn decode(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            warn!(
                valid_up_to = err.utf8_error().valid_up_to(),
                "Input is not valid UTF-8; invalid bytes replaced with U+FFFD"
            );
            String::from_utf8_lossy(err.as_bytes()).into_owned()
        }
    }
}

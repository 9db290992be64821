//! Version command implementation.

use crate::error::Result;
use crate::output::OutputContext;
use serde::Serialize;

#[derive(Serialize)]
struct VersionOutput<'a> {
    version: &'a str,
    build: &'a str,
}

/// Execute the version command.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn execute(ctx: &OutputContext) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    let build = if cfg!(debug_assertions) {
        "dev"
    } else {
        "release"
    };

    if ctx.is_json() {
        return ctx.json_pretty(&VersionOutput { version, build });
    }

    ctx.emit(&format!("bagz version {version} ({build})"))
}

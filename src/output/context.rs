use crate::cli::Cli;
use crate::error::Result;
use std::io::{self, Write};

/// Central output coordinator that respects json/quiet modes.
#[derive(Debug, Clone, Copy)]
pub struct OutputContext {
    mode: OutputMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Plain text
    Plain,
    /// JSON output only
    Json,
    /// Primary results only, no informational lines
    Quiet,
}

impl OutputContext {
    /// Create from CLI global args
    #[must_use]
    pub fn from_args(args: &Cli) -> Self {
        Self::from_flags(args.json, args.quiet)
    }

    /// Create from CLI-style flags. `--json` wins over `--quiet`.
    #[must_use]
    pub const fn from_flags(json: bool, quiet: bool) -> Self {
        let mode = if json {
            OutputMode::Json
        } else if quiet {
            OutputMode::Quiet
        } else {
            OutputMode::Plain
        };
        Self { mode }
    }

    pub const fn mode(&self) -> OutputMode {
        self.mode
    }
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }
    pub fn is_quiet(&self) -> bool {
        self.mode == OutputMode::Quiet
    }

    /// Write a command's primary result. Printed in every non-JSON mode.
    ///
    /// A trailing newline is added unless `content` already ends with one.
    ///
    /// # Errors
    ///
    /// Returns an error if stdout cannot be written.
    pub fn emit(&self, content: &str) -> Result<()> {
        if self.is_json() {
            return Ok(());
        }
        let mut stdout = io::stdout().lock();
        stdout.write_all(content.as_bytes())?;
        if !content.is_empty() && !content.ends_with('\n') {
            stdout.write_all(b"\n")?;
        }
        stdout.flush()?;
        Ok(())
    }

    /// Pretty JSON document, only in JSON mode.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn json_pretty<T: serde::Serialize>(&self, value: &T) -> Result<()> {
        if self.is_json() {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        Ok(())
    }
}

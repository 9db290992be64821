//! Command implementations, one module per subcommand.

pub mod annotate;
pub mod config;
pub mod version;

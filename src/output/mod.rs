//! Output routing for plain, JSON and quiet modes.

pub mod context;

pub use context::{OutputContext, OutputMode};

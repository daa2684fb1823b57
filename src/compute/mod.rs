//! Compute module - Running fragment shaders over integer tables.

mod quad;
mod runner;

pub use quad::*;
pub use runner::*;

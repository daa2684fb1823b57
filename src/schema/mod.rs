//! Schema module - Job configuration for fragment-shader computations.

mod job;

pub use job::*;

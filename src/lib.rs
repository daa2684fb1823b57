//! fragcompute - GPU compute via fragment shading.
//!
//! Small integer tables are uploaded as textures, a fragment shader computes
//! one output cell per pixel over a full-screen quad, and the framebuffer is
//! read back and reinterpreted as the output table.
//!
//! # Architecture
//!
//! - `shader`: `#include` resolution and the compile/link pipeline
//! - `driver`: the graphics API boundary, plus an OpenGL implementation
//! - `table`: integer tables and their textures
//! - `schema`: job configuration
//! - `compute`: the full-screen pass and job runner
//! - `context`: headless EGL context (feature `gl`)
//!
//! # Example
//!
//! ```rust,no_run
//! use fragcompute::{
//!     compute::run_job,
//!     context::HeadlessContext,
//!     driver::GlDriver,
//!     schema::JobConfig,
//! };
//!
//! let config = JobConfig::default();
//! let context = HeadlessContext::new(config.width, config.height).unwrap();
//! let driver = GlDriver::new(&context).unwrap();
//!
//! let output = run_job(&driver, &config).unwrap();
//! println!("{:?}", output.rows().next());
//! ```

pub mod compute;
pub mod driver;
pub mod schema;
pub mod shader;
pub mod table;

#[cfg(feature = "gl")]
pub mod context;

// Re-export commonly used types
pub use compute::{JobError, run_job};
pub use schema::JobConfig;
pub use shader::{ResolveError, ResolvedSource, Shader, ShaderError, resolve};
pub use table::Table;

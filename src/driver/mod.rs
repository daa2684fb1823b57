//! Graphics driver boundary.
//!
//! Everything the shader pipeline and the compute harness need from the GPU
//! goes through [`Driver`]. The trait mirrors the shape of the underlying
//! API: calls are synchronous, compile and link report a status flag plus a
//! driver-formatted log, and nothing panics.
//!
//! Object handles are newtypes around the driver's non-zero integer ids.
//! Stage, program and texture handles are deliberately not `Copy`: the
//! `delete_*` calls consume them, so a handle cannot be released twice.

use std::fmt;
use std::num::NonZeroU32;

use glam::{Mat2, Mat3, Mat4, Vec2, Vec3, Vec4};

use crate::compute::Vertex;

#[cfg(feature = "gl")]
mod gl;

#[cfg(test)]
pub(crate) mod mock;

#[cfg(feature = "gl")]
pub use gl::GlDriver;

/// Error type for driver object creation and readback.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("Failed to create {what}: {message}")]
    Create { what: &'static str, message: String },

    #[error("Pixel readback failed: {message}")]
    ReadPixels { message: String },

    #[error("Context error: {message}")]
    Context { message: String },
}

/// Pipeline stage a shader object is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Vertex,
    Fragment,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageKind::Vertex => f.write_str("vertex"),
            StageKind::Fragment => f.write_str("fragment"),
        }
    }
}

macro_rules! object_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, PartialEq, Eq, Hash)]
        pub struct $name(NonZeroU32);

        impl $name {
            /// Wrap a raw driver id. Only driver implementations should call this.
            pub fn from_raw(id: NonZeroU32) -> Self {
                Self(id)
            }

            /// The raw driver id.
            pub fn raw(&self) -> NonZeroU32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

object_handle!(
    /// A compiled (or compiling) vertex or fragment stage.
    StageId
);
object_handle!(
    /// A program object that stages are attached to and linked into.
    ProgramId
);
object_handle!(
    /// A 2D texture object.
    TextureId
);

/// Location of a named uniform in a linked program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(u32);

impl UniformLocation {
    pub fn from_raw(location: u32) -> Self {
        Self(location)
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

/// A typed uniform value forwarded to the driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat2(Mat2),
    Mat3(Mat3),
    Mat4(Mat4),
}

impl From<bool> for UniformValue {
    /// Booleans are uploaded as integer 0 or 1.
    fn from(value: bool) -> Self {
        UniformValue::Int(i32::from(value))
    }
}

impl From<i32> for UniformValue {
    fn from(value: i32) -> Self {
        UniformValue::Int(value)
    }
}

impl From<f32> for UniformValue {
    fn from(value: f32) -> Self {
        UniformValue::Float(value)
    }
}

/// The graphics API surface used by shaders, tables and the job runner.
pub trait Driver {
    fn create_program(&self) -> Result<ProgramId, DriverError>;
    fn delete_program(&self, program: ProgramId);

    fn create_stage(&self, kind: StageKind) -> Result<StageId, DriverError>;
    /// Set the stage source and compile it. Check [`Driver::compile_status`] afterwards.
    fn compile_stage(&self, stage: &StageId, source: &str);
    fn compile_status(&self, stage: &StageId) -> bool;
    fn stage_info_log(&self, stage: &StageId) -> String;
    fn delete_stage(&self, stage: StageId);

    fn attach_stage(&self, program: &ProgramId, stage: &StageId);
    fn detach_stage(&self, program: &ProgramId, stage: &StageId);
    fn link_program(&self, program: &ProgramId);
    fn link_status(&self, program: &ProgramId) -> bool;
    fn program_info_log(&self, program: &ProgramId) -> String;

    /// Make `program` current, or bind no program with `None`.
    fn use_program(&self, program: Option<&ProgramId>);

    /// Look up a uniform; `None` is the invalid-location sentinel.
    fn uniform_location(&self, program: &ProgramId, name: &str) -> Option<UniformLocation>;
    /// Set a uniform on the current program. A `None` location is a no-op.
    fn set_uniform(&self, location: Option<UniformLocation>, value: UniformValue);

    fn create_texture(&self) -> Result<TextureId, DriverError>;
    /// Upload `pixels` as an RGBA8 image with nearest filtering.
    fn upload_texture(&self, texture: &TextureId, width: u32, height: u32, pixels: &[u8]);
    fn bind_texture(&self, unit: u32, texture: Option<&TextureId>);
    fn delete_texture(&self, texture: TextureId);

    fn viewport(&self, width: u32, height: u32);
    fn clear(&self, color: [f32; 4]);
    fn draw_triangles(&self, vertices: &[Vertex]) -> Result<(), DriverError>;
    /// Read back the framebuffer as tightly packed RGBA8 rows.
    fn read_pixels(&self, width: u32, height: u32) -> Result<Vec<u8>, DriverError>;
}

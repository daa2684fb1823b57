//! Shader loading: `#include` resolution and the compile/link pipeline.

mod program;
mod source;

use std::path::PathBuf;

pub use program::Shader;
pub use source::{ResolveError, ResolvedSource, SkippedInclude, resolve};

use crate::driver::{DriverError, StageKind};

/// Error type for shader loading.
#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    #[error("{stage} shader source could not be loaded: {source}")]
    Resolve {
        stage: StageKind,
        #[source]
        source: ResolveError,
    },

    #[error("{stage} shader source at {path} is empty")]
    EmptySource { stage: StageKind, path: PathBuf },

    #[error("Failed to compile {stage} shader: {log}")]
    Compile { stage: StageKind, log: String },

    #[error("Failed to link shader program: {log}")]
    Link { log: String },

    #[error("Shader program is not linked")]
    NotLinked,

    #[error(transparent)]
    Driver(#[from] DriverError),
}

/// Vertex stage used by [`Shader::default_shader`] and the fragment-only constructors.
pub const DEFAULT_VERTEX_SHADER: &str = r"#version 330 core
layout (location = 0) in vec3 aPos;
layout (location = 1) in vec3 aNorm;
layout (location = 2) in vec2 aTex;
out vec3 FragPos;
out vec3 FragNorm;
out vec2 FragTex;
uniform mat4 mvp;
uniform mat4 model;
void main() {
    gl_Position = mvp * model * vec4(aPos, 1.0);
    FragPos = vec3(model * vec4(aPos, 1.0));
    FragNorm = aNorm;
    FragTex = aTex;
}
";

/// Fragment stage used by [`Shader::default_shader`]: samples `gTexture`.
pub const DEFAULT_FRAGMENT_SHADER: &str = r"#version 330 core
out vec4 FragColor;
uniform sampler2D gTexture;
in vec3 FragPos;
in vec3 FragNorm;
in vec2 FragTex;
void main() {
    FragColor = texture(gTexture, FragTex);
}
";

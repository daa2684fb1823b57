//! Shader program compile/link pipeline and uniform access.

use std::path::Path;

use glam::{Mat2, Mat3, Mat4, Vec2, Vec3, Vec4};

use super::source::resolve;
use super::{DEFAULT_FRAGMENT_SHADER, DEFAULT_VERTEX_SHADER, ShaderError};
use crate::driver::{Driver, ProgramId, StageId, StageKind, UniformLocation, UniformValue};

/// A stage handle that is released when dropped.
struct CompiledStage<'d, D: Driver> {
    driver: &'d D,
    kind: StageKind,
    id: Option<StageId>,
}

impl<'d, D: Driver> CompiledStage<'d, D> {
    /// Create and compile a stage; the handle is released again on failure.
    fn compile(driver: &'d D, kind: StageKind, source: &str) -> Result<Self, ShaderError> {
        let stage = Self {
            driver,
            kind,
            id: Some(driver.create_stage(kind)?),
        };
        let id = stage.id();
        log::debug!("Compiling {} shader {}", kind, id);
        driver.compile_stage(id, source);
        if !driver.compile_status(id) {
            let log = driver.stage_info_log(id);
            log::warn!("Failed to compile {} shader {}: {}", kind, id, log);
            return Err(ShaderError::Compile { stage: kind, log });
        }
        Ok(stage)
    }

    fn id(&self) -> &StageId {
        self.id.as_ref().expect("stage handle is only taken in drop")
    }
}

impl<D: Driver> Drop for CompiledStage<'_, D> {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            log::trace!("Deleting {} shader {}", self.kind, id);
            self.driver.delete_stage(id);
        }
    }
}

/// A linked vertex + fragment program.
///
/// The program object is allocated by [`Shader::new`] and released when the
/// `Shader` is dropped. Stage objects only live for the duration of a load.
///
/// A load that fails marks the shader unlinked: [`Shader::bind`] refuses it
/// until a later load succeeds.
pub struct Shader<'d, D: Driver> {
    driver: &'d D,
    program: Option<ProgramId>,
    linked: bool,
}

impl<'d, D: Driver> Shader<'d, D> {
    /// Create a shader with an empty, unlinked program.
    pub fn new(driver: &'d D) -> Result<Self, ShaderError> {
        let program = driver.create_program()?;
        log::info!("Created shader program {}", program);
        Ok(Self {
            driver,
            program: Some(program),
            linked: false,
        })
    }

    /// Built-in vertex and fragment program.
    ///
    /// Takes a [`crate::compute::Vertex`] stream. Uniforms: `mvp` and
    /// `model` (mat4), `gTexture` (sampler2D).
    pub fn default_shader(driver: &'d D) -> Result<Self, ShaderError> {
        let mut shader = Self::new(driver)?;
        shader.load_from_source(DEFAULT_VERTEX_SHADER, DEFAULT_FRAGMENT_SHADER)?;
        Ok(shader)
    }

    /// Built-in vertex stage plus the given fragment stage.
    ///
    /// The vertex stage writes `FragPos`, `FragNorm` (vec3) and `FragTex`
    /// (vec2) and reads the `mvp` and `model` uniforms.
    pub fn from_fragment_source(driver: &'d D, fragment: &str) -> Result<Self, ShaderError> {
        let mut shader = Self::new(driver)?;
        shader.load_from_source(DEFAULT_VERTEX_SHADER, fragment)?;
        Ok(shader)
    }

    /// Built-in vertex stage plus a fragment stage loaded from `path`.
    pub fn from_fragment_path<P: AsRef<Path>>(driver: &'d D, path: P) -> Result<Self, ShaderError> {
        let fragment = load_stage(StageKind::Fragment, path.as_ref())?;
        Self::from_fragment_source(driver, &fragment)
    }

    /// Compile both stages and link them into this shader's program.
    pub fn load_from_source(&mut self, vertex: &str, fragment: &str) -> Result<(), ShaderError> {
        self.linked = false;
        let driver = self.driver;
        let program = self.program();

        let vertex = CompiledStage::compile(driver, StageKind::Vertex, vertex)?;
        let fragment = CompiledStage::compile(driver, StageKind::Fragment, fragment)?;

        driver.attach_stage(program, vertex.id());
        driver.attach_stage(program, fragment.id());
        driver.link_program(program);
        driver.detach_stage(program, vertex.id());
        driver.detach_stage(program, fragment.id());
        drop(vertex);
        drop(fragment);

        if !driver.link_status(program) {
            let log = driver.program_info_log(program);
            log::warn!("Failed to link shader program {}: {}", program, log);
            return Err(ShaderError::Link { log });
        }

        log::info!("Shader program {} was compiled and linked", program);
        self.linked = true;
        Ok(())
    }

    /// Resolve both stage files (expanding `#include`s) and load them.
    ///
    /// Fails before compiling anything if either stage cannot be resolved or
    /// resolves to an empty source.
    pub fn load_from_path<P: AsRef<Path>, Q: AsRef<Path>>(
        &mut self,
        vertex_path: P,
        fragment_path: Q,
    ) -> Result<(), ShaderError> {
        let (vertex_path, fragment_path) = (vertex_path.as_ref(), fragment_path.as_ref());
        log::info!(
            "Loading shader from paths vertex=\"{}\" fragment=\"{}\"",
            vertex_path.display(),
            fragment_path.display()
        );
        self.linked = false;
        let vertex = load_stage(StageKind::Vertex, vertex_path)?;
        let fragment = load_stage(StageKind::Fragment, fragment_path)?;
        self.load_from_source(&vertex, &fragment)
    }

    pub fn program(&self) -> &ProgramId {
        self.program
            .as_ref()
            .expect("program handle is only taken in drop")
    }

    /// Whether the last load succeeded.
    pub fn is_linked(&self) -> bool {
        self.linked
    }

    pub fn driver(&self) -> &'d D {
        self.driver
    }

    /// Make this program current.
    pub fn bind(&self) -> Result<(), ShaderError> {
        if !self.linked {
            return Err(ShaderError::NotLinked);
        }
        self.driver.use_program(Some(self.program()));
        Ok(())
    }

    /// Bind no program.
    pub fn unbind(&self) {
        self.driver.use_program(None);
    }

    pub fn uniform_location(&self, name: &str) -> Option<UniformLocation> {
        self.driver.uniform_location(self.program(), name)
    }

    /// Set a uniform on the current program; `None` is ignored by the driver.
    pub fn set_uniform(&self, location: Option<UniformLocation>, value: impl Into<UniformValue>) {
        self.driver.set_uniform(location, value.into());
    }

    /// Look up `name` and set it. Unknown names are a no-op.
    pub fn set(&self, name: &str, value: impl Into<UniformValue>) {
        self.set_uniform(self.uniform_location(name), value);
    }

    /// Set an integer uniform to 0 or 1.
    pub fn set_bool(&self, name: &str, value: bool) {
        self.set(name, value);
    }

    pub fn set_int(&self, name: &str, value: i32) {
        self.set(name, value);
    }

    pub fn set_float(&self, name: &str, value: f32) {
        self.set(name, value);
    }

    pub fn set_vec2(&self, name: &str, value: Vec2) {
        self.set(name, UniformValue::Vec2(value));
    }

    pub fn set_vec3(&self, name: &str, value: Vec3) {
        self.set(name, UniformValue::Vec3(value));
    }

    pub fn set_vec4(&self, name: &str, value: Vec4) {
        self.set(name, UniformValue::Vec4(value));
    }

    pub fn set_mat2(&self, name: &str, value: &Mat2) {
        self.set(name, UniformValue::Mat2(*value));
    }

    pub fn set_mat3(&self, name: &str, value: &Mat3) {
        self.set(name, UniformValue::Mat3(*value));
    }

    pub fn set_mat4(&self, name: &str, value: &Mat4) {
        self.set(name, UniformValue::Mat4(*value));
    }
}

impl<D: Driver> Drop for Shader<'_, D> {
    fn drop(&mut self) {
        if let Some(program) = self.program.take() {
            log::info!("Deleting shader program {}", program);
            self.driver.delete_program(program);
        }
    }
}

fn load_stage(stage: StageKind, path: &Path) -> Result<String, ShaderError> {
    let resolved = resolve(path).map_err(|source| ShaderError::Resolve { stage, source })?;
    if resolved.is_empty() {
        return Err(ShaderError::EmptySource {
            stage,
            path: path.to_path_buf(),
        });
    }
    Ok(resolved.text)
}

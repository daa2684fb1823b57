//! OpenGL driver over `glow`.

use glow::HasContext;

use super::{
    Driver, DriverError, ProgramId, StageId, StageKind, TextureId, UniformLocation, UniformValue,
};
use crate::compute::Vertex;
use crate::context::HeadlessContext;

/// [`Driver`] backed by an OpenGL context.
///
/// The GL context must stay current on this thread for as long as the driver
/// is used; [`GlDriver::new`] makes the given context current.
pub struct GlDriver {
    gl: glow::Context,
}

fn stage(id: &StageId) -> glow::NativeShader {
    glow::NativeShader(id.raw())
}

fn program(id: &ProgramId) -> glow::NativeProgram {
    glow::NativeProgram(id.raw())
}

fn texture(id: &TextureId) -> glow::NativeTexture {
    glow::NativeTexture(id.raw())
}

impl GlDriver {
    /// Make `context` current and load the GL entry points through it.
    pub fn new(context: &HeadlessContext) -> Result<Self, DriverError> {
        context.make_current()?;
        // SAFETY: the context was just made current on this thread, and the
        // loader hands out entry points for exactly that context.
        let gl = unsafe {
            glow::Context::from_loader_function(|name| context.proc_address(name))
        };
        log::info!(
            "OpenGL {}.{} ({})",
            gl.version().major,
            gl.version().minor,
            gl.version().vendor_info
        );
        Ok(Self { gl })
    }
}

impl Driver for GlDriver {
    fn create_program(&self) -> Result<ProgramId, DriverError> {
        let program = unsafe { self.gl.create_program() }.map_err(|message| {
            DriverError::Create {
                what: "program",
                message,
            }
        })?;
        Ok(ProgramId::from_raw(program.0))
    }

    fn delete_program(&self, id: ProgramId) {
        unsafe { self.gl.delete_program(program(&id)) }
    }

    fn create_stage(&self, kind: StageKind) -> Result<StageId, DriverError> {
        let shader_type = match kind {
            StageKind::Vertex => glow::VERTEX_SHADER,
            StageKind::Fragment => glow::FRAGMENT_SHADER,
        };
        let shader = unsafe { self.gl.create_shader(shader_type) }.map_err(|message| {
            DriverError::Create {
                what: "shader stage",
                message,
            }
        })?;
        Ok(StageId::from_raw(shader.0))
    }

    fn compile_stage(&self, id: &StageId, source: &str) {
        unsafe {
            self.gl.shader_source(stage(id), source);
            self.gl.compile_shader(stage(id));
        }
    }

    fn compile_status(&self, id: &StageId) -> bool {
        unsafe { self.gl.get_shader_compile_status(stage(id)) }
    }

    fn stage_info_log(&self, id: &StageId) -> String {
        unsafe { self.gl.get_shader_info_log(stage(id)) }
    }

    fn delete_stage(&self, id: StageId) {
        unsafe { self.gl.delete_shader(stage(&id)) }
    }

    fn attach_stage(&self, p: &ProgramId, s: &StageId) {
        unsafe { self.gl.attach_shader(program(p), stage(s)) }
    }

    fn detach_stage(&self, p: &ProgramId, s: &StageId) {
        unsafe { self.gl.detach_shader(program(p), stage(s)) }
    }

    fn link_program(&self, id: &ProgramId) {
        unsafe { self.gl.link_program(program(id)) }
    }

    fn link_status(&self, id: &ProgramId) -> bool {
        unsafe { self.gl.get_program_link_status(program(id)) }
    }

    fn program_info_log(&self, id: &ProgramId) -> String {
        unsafe { self.gl.get_program_info_log(program(id)) }
    }

    fn use_program(&self, id: Option<&ProgramId>) {
        unsafe { self.gl.use_program(id.map(program)) }
    }

    fn uniform_location(&self, id: &ProgramId, name: &str) -> Option<UniformLocation> {
        unsafe { self.gl.get_uniform_location(program(id), name) }
            .map(|location| UniformLocation::from_raw(location.0))
    }

    fn set_uniform(&self, location: Option<UniformLocation>, value: UniformValue) {
        let Some(location) = location.map(|l| glow::NativeUniformLocation(l.raw())) else {
            return;
        };
        let location = Some(&location);
        unsafe {
            match value {
                UniformValue::Int(v) => self.gl.uniform_1_i32(location, v),
                UniformValue::Float(v) => self.gl.uniform_1_f32(location, v),
                UniformValue::Vec2(v) => self.gl.uniform_2_f32_slice(location, &v.to_array()),
                UniformValue::Vec3(v) => self.gl.uniform_3_f32_slice(location, &v.to_array()),
                UniformValue::Vec4(v) => self.gl.uniform_4_f32_slice(location, &v.to_array()),
                UniformValue::Mat2(m) => {
                    self.gl
                        .uniform_matrix_2_f32_slice(location, false, &m.to_cols_array())
                }
                UniformValue::Mat3(m) => {
                    self.gl
                        .uniform_matrix_3_f32_slice(location, false, &m.to_cols_array())
                }
                UniformValue::Mat4(m) => {
                    self.gl
                        .uniform_matrix_4_f32_slice(location, false, &m.to_cols_array())
                }
            }
        }
    }

    fn create_texture(&self) -> Result<TextureId, DriverError> {
        let tex = unsafe { self.gl.create_texture() }.map_err(|message| DriverError::Create {
            what: "texture",
            message,
        })?;
        Ok(TextureId::from_raw(tex.0))
    }

    fn upload_texture(&self, id: &TextureId, width: u32, height: u32, pixels: &[u8]) {
        unsafe {
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture(id)));
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA as i32,
                width as i32,
                height as i32,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(pixels)),
            );
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MAG_FILTER,
                glow::NEAREST as i32,
            );
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::NEAREST as i32,
            );
        }
    }

    fn bind_texture(&self, unit: u32, id: Option<&TextureId>) {
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl.bind_texture(glow::TEXTURE_2D, id.map(texture));
        }
    }

    fn delete_texture(&self, id: TextureId) {
        unsafe { self.gl.delete_texture(texture(&id)) }
    }

    fn viewport(&self, width: u32, height: u32) {
        unsafe { self.gl.viewport(0, 0, width as i32, height as i32) }
    }

    fn clear(&self, [r, g, b, a]: [f32; 4]) {
        unsafe {
            self.gl.clear_color(r, g, b, a);
            self.gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }
    }

    fn draw_triangles(&self, vertices: &[Vertex]) -> Result<(), DriverError> {
        let stride = std::mem::size_of::<Vertex>() as i32;
        unsafe {
            let vbo = self
                .gl
                .create_buffer()
                .map_err(|message| DriverError::Create {
                    what: "vertex buffer",
                    message,
                })?;

            // Core profiles refuse to draw without a vertex array object.
            let vao = if self.gl.version().major >= 3 {
                let vao = match self.gl.create_vertex_array() {
                    Ok(vao) => vao,
                    Err(message) => {
                        self.gl.delete_buffer(vbo);
                        return Err(DriverError::Create {
                            what: "vertex array",
                            message,
                        });
                    }
                };
                self.gl.bind_vertex_array(Some(vao));
                Some(vao)
            } else {
                None
            };

            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            self.gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(vertices),
                glow::STATIC_DRAW,
            );

            for (index, size, offset) in Vertex::ATTRIBUTES {
                self.gl.enable_vertex_attrib_array(index);
                self.gl.vertex_attrib_pointer_f32(
                    index,
                    size,
                    glow::FLOAT,
                    false,
                    stride,
                    offset as i32,
                );
            }

            self.gl
                .draw_arrays(glow::TRIANGLES, 0, vertices.len() as i32);

            for (index, _, _) in Vertex::ATTRIBUTES {
                self.gl.disable_vertex_attrib_array(index);
            }
            self.gl.bind_buffer(glow::ARRAY_BUFFER, None);
            self.gl.delete_buffer(vbo);
            if let Some(vao) = vao {
                self.gl.bind_vertex_array(None);
                self.gl.delete_vertex_array(vao);
            }
        }
        Ok(())
    }

    fn read_pixels(&self, width: u32, height: u32) -> Result<Vec<u8>, DriverError> {
        let mut pixels = vec![0u8; width as usize * height as usize * 4];
        unsafe {
            self.gl.pixel_store_i32(glow::PACK_ALIGNMENT, 1);
            self.gl.read_pixels(
                0,
                0,
                width as i32,
                height as i32,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelPackData::Slice(Some(pixels.as_mut_slice())),
            );
            let error = self.gl.get_error();
            if error != glow::NO_ERROR {
                return Err(DriverError::ReadPixels {
                    message: format!("glReadPixels raised 0x{:04x}", error),
                });
            }
        }
        Ok(pixels)
    }
}

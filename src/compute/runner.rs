//! Job runner - one full-screen pass from input tables to an output table.

use glam::Mat4;

use super::FULLSCREEN_QUAD;
use crate::driver::{Driver, DriverError, UniformValue};
use crate::schema::{ConfigError, JobConfig, TableInput, check_table_names};
use crate::shader::{Shader, ShaderError};
use crate::table::{Table, TableError, TableTexture};

/// Name of the table produced by a pass.
pub const OUTPUT_TABLE: &str = "output";

/// Error type for running a job.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Invalid job configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error("Table error: {0}")]
    Table(#[from] TableError),

    #[error(transparent)]
    Driver(#[from] DriverError),
}

/// Load everything `config` names and render it.
///
/// The driver's context must have a framebuffer of at least
/// `config.width` x `config.height` pixels.
pub fn run_job<D: Driver>(driver: &D, config: &JobConfig) -> Result<Table, JobError> {
    config.validate()?;

    let tables = config
        .inputs
        .iter()
        .map(TableInput::load)
        .collect::<Result<Vec<_>, _>>()?;
    check_table_names(&tables)?;

    let shader = match &config.vertex {
        Some(vertex) => {
            let mut shader = Shader::new(driver)?;
            shader.load_from_path(vertex, &config.fragment)?;
            shader
        }
        None => Shader::from_fragment_path(driver, &config.fragment)?,
    };

    let uniforms = config
        .uniforms
        .iter()
        .map(|(name, value)| (name.as_str(), UniformValue::from(*value)));
    render_pass(&shader, &tables, config.width, config.height, uniforms)
}

/// Draw a full-screen quad with `shader` and read the framebuffer back.
///
/// Table `i` is bound to texture unit `i` under its own name. The `width`
/// and `height` uniforms are set to the output size and `mvp`/`model` to
/// the identity.
pub fn render_pass<'a, D: Driver>(
    shader: &Shader<'_, D>,
    tables: &[Table],
    width: u32,
    height: u32,
    uniforms: impl IntoIterator<Item = (&'a str, UniformValue)>,
) -> Result<Table, JobError> {
    let driver = shader.driver();

    driver.viewport(width, height);
    driver.clear([0.0, 0.0, 0.0, 1.0]);

    shader.bind()?;
    let pixels = draw_bound(shader, tables, width, height, uniforms);
    shader.unbind();
    let pixels = pixels?;

    let output = Table::from_rgba_pixels(OUTPUT_TABLE, width, height, &pixels)?;
    log::info!("Computed {}x{} output table", width, height);
    Ok(output)
}

/// Body of [`render_pass`] that runs while `shader` is the current program.
fn draw_bound<'a, D: Driver>(
    shader: &Shader<'_, D>,
    tables: &[Table],
    width: u32,
    height: u32,
    uniforms: impl IntoIterator<Item = (&'a str, UniformValue)>,
) -> Result<Vec<u8>, JobError> {
    let driver = shader.driver();

    shader.set_int("width", width as i32);
    shader.set_int("height", height as i32);
    shader.set_mat4("mvp", &Mat4::IDENTITY);
    shader.set_mat4("model", &Mat4::IDENTITY);

    let textures = tables
        .iter()
        .map(|table| TableTexture::upload(driver, table))
        .collect::<Result<Vec<_>, _>>()?;
    for (unit, texture) in textures.iter().enumerate() {
        let (w, h) = texture.size();
        log::debug!("Binding table {} ({}x{}) to unit {}", texture.name(), w, h, unit);
        texture.bind(unit as u32, shader);
    }

    for (name, value) in uniforms {
        shader.set(name, value);
    }

    driver.draw_triangles(&FULLSCREEN_QUAD)?;
    Ok(driver.read_pixels(width, height)?)
}

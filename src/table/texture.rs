//! Tables uploaded as 2D textures.

use super::Table;
use crate::driver::{Driver, DriverError, TextureId};
use crate::shader::Shader;

/// A [`Table`] resident on the GPU as an RGBA8 texture with nearest filtering.
pub struct TableTexture<'d, D: Driver> {
    driver: &'d D,
    texture: Option<TextureId>,
    name: String,
    width: u32,
    height: u32,
}

impl<'d, D: Driver> TableTexture<'d, D> {
    pub fn upload(driver: &'d D, table: &Table) -> Result<Self, DriverError> {
        let texture = driver.create_texture()?;
        driver.upload_texture(&texture, table.width(), table.height(), table.as_rgba_bytes());
        log::debug!(
            "Uploaded table {} ({}x{}) to texture {}",
            table.name,
            table.width(),
            table.height(),
            texture
        );
        Ok(Self {
            driver,
            texture: Some(texture),
            name: table.name.clone(),
            width: table.width(),
            height: table.height(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn texture(&self) -> Option<&TextureId> {
        self.texture.as_ref()
    }

    /// Bind the texture to `unit` and point the sampler uniform named after
    /// the table at that unit. `shader` must be the current program.
    pub fn bind(&self, unit: u32, shader: &Shader<'_, D>) {
        self.driver.bind_texture(unit, self.texture.as_ref());
        shader.set_int(&self.name, unit as i32);
    }
}

impl<D: Driver> Drop for TableTexture<'_, D> {
    fn drop(&mut self) {
        if let Some(texture) = self.texture.take() {
            self.driver.delete_texture(texture);
        }
    }
}

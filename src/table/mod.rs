//! Integer tables - the input and output data of a fragment-shader computation.
//!
//! A table is a row-major grid of `i32` cells. On the GPU each cell occupies
//! one RGBA8 texel: the four bytes of the integer are the four channels, so
//! a shader can reassemble the value and the framebuffer readback can be
//! reinterpreted byte-for-byte.

mod texture;

pub use texture::TableTexture;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Largest table side accepted; GL takes sizes as `i32` and drivers cap
/// texture sizes far below that.
pub const MAX_DIMENSION: u32 = 16384;

/// Error type for table construction and file I/O.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("Table '{name}' has {len} cells, expected {width}x{height}")]
    CellCount {
        name: String,
        len: usize,
        width: u32,
        height: u32,
    },

    #[error("Table '{name}' is {width}x{height}, sides are limited to {max}")]
    TooLarge {
        name: String,
        width: u32,
        height: u32,
        max: u32,
    },

    #[error("Cell ({row}, {col}) is outside table '{name}'")]
    OutOfBounds { name: String, row: u32, col: u32 },

    #[error("Failed to access table file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse table file: {0}")]
    Json(#[from] serde_json::Error),
}

/// A named `width` x `height` grid of integers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Sampler uniform the table binds to; defaults to the file stem when loaded from disk.
    #[serde(default)]
    pub name: String,
    width: u32,
    height: u32,
    cells: Vec<i32>,
}

impl Table {
    /// A zero-filled table.
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            cells: vec![0; width as usize * height as usize],
        }
    }

    /// A table over existing row-major cells.
    pub fn from_cells(
        name: impl Into<String>,
        cells: Vec<i32>,
        width: u32,
        height: u32,
    ) -> Result<Self, TableError> {
        let table = Self {
            name: name.into(),
            width,
            height,
            cells,
        };
        table.validate()?;
        Ok(table)
    }

    /// Reinterpret an RGBA8 readback as one integer per pixel.
    pub fn from_rgba_pixels(
        name: impl Into<String>,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<Self, TableError> {
        let name = name.into();
        let expected = width as usize * height as usize;
        if pixels.len() != expected * 4 {
            return Err(TableError::CellCount {
                name,
                len: pixels.len() / 4,
                width,
                height,
            });
        }
        let cells = pixels
            .chunks_exact(4)
            .map(|px| i32::from_ne_bytes([px[0], px[1], px[2], px[3]]))
            .collect();
        Ok(Self {
            name,
            width,
            height,
            cells,
        })
    }

    /// Check that the cell count matches the dimensions.
    pub fn validate(&self) -> Result<(), TableError> {
        if self.width > MAX_DIMENSION || self.height > MAX_DIMENSION {
            return Err(TableError::TooLarge {
                name: self.name.clone(),
                width: self.width,
                height: self.height,
                max: MAX_DIMENSION,
            });
        }
        if self.cells.len() != self.width as usize * self.height as usize {
            return Err(TableError::CellCount {
                name: self.name.clone(),
                len: self.cells.len(),
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[i32] {
        &self.cells
    }

    /// Cell bytes in texture upload order.
    pub fn as_rgba_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.cells.as_slice())
    }

    #[inline]
    fn index(&self, row: u32, col: u32) -> Option<usize> {
        (row < self.height && col < self.width)
            .then(|| row as usize * self.width as usize + col as usize)
    }

    pub fn cell(&self, row: u32, col: u32) -> Option<i32> {
        self.index(row, col).map(|i| self.cells[i])
    }

    pub fn set_cell(&mut self, row: u32, col: u32, value: i32) -> Result<(), TableError> {
        let i = self.index(row, col).ok_or_else(|| TableError::OutOfBounds {
            name: self.name.clone(),
            row,
            col,
        })?;
        self.cells[i] = value;
        Ok(())
    }

    /// Iterate rows top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[i32]> {
        // chunks_exact panics on a zero chunk size
        self.cells.chunks_exact(self.width.max(1) as usize)
    }

    /// Load a table from a JSON file. An unnamed table takes the file stem as its name.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, TableError> {
        let path = path.as_ref();
        let mut table: Table = serde_json::from_str(&fs::read_to_string(path)?)?;
        if table.name.is_empty() {
            table.name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
        }
        table.validate()?;
        log::info!("Table {} loaded from {}", table.name, path.display());
        Ok(table)
    }

    /// Write the table as pretty-printed JSON.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), TableError> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

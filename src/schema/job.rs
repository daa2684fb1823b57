//! Job configuration: what to render and where the tables come from.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::driver::UniformValue;
use crate::table::{MAX_DIMENSION, Table, TableError};

/// Texture units guaranteed by OpenGL 3.3 for fragment shaders.
pub const MAX_TEXTURE_UNITS: usize = 16;

/// Uniforms the runner sets itself; tables may not shadow them.
pub const RESERVED_UNIFORMS: [&str; 4] = ["width", "height", "mvp", "model"];

fn default_output() -> PathBuf {
    PathBuf::from("output.json")
}

/// Top-level job configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Framebuffer (and output table) width in pixels.
    pub width: u32,
    /// Framebuffer (and output table) height in pixels.
    pub height: u32,
    /// Fragment shader computing one output cell per pixel.
    pub fragment: PathBuf,
    /// Optional vertex shader; the built-in one is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertex: Option<PathBuf>,
    /// Input tables, bound to texture units in order.
    #[serde(default)]
    pub inputs: Vec<TableInput>,
    /// Extra scalar uniforms.
    #[serde(default)]
    pub uniforms: BTreeMap<String, UniformConfig>,
    /// Where the output table is written.
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            width: 90,
            height: 90,
            fragment: PathBuf::from("shader.frag"),
            vertex: None,
            inputs: vec![
                TableInput::Inline(Table::new("one", 2, 1)),
                TableInput::File {
                    path: PathBuf::from("two.json"),
                },
            ],
            uniforms: BTreeMap::new(),
            output: default_output(),
        }
    }
}

/// Source of an input table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TableInput {
    /// A table JSON file.
    File { path: PathBuf },
    /// A table written out in the job file.
    Inline(Table),
}

impl TableInput {
    pub fn load(&self) -> Result<Table, TableError> {
        match self {
            TableInput::File { path } => Table::load_json(path),
            TableInput::Inline(table) => {
                table.validate()?;
                Ok(table.clone())
            }
        }
    }
}

/// A scalar uniform value from the job file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UniformConfig {
    Int(i32),
    Float(f32),
}

impl From<UniformConfig> for UniformValue {
    fn from(value: UniformConfig) -> Self {
        match value {
            UniformConfig::Int(v) => UniformValue::Int(v),
            UniformConfig::Float(v) => UniformValue::Float(v),
        }
    }
}

impl JobConfig {
    /// Resolve relative paths against `dir`, usually the job file's directory.
    pub fn rebase(&mut self, dir: &Path) {
        let rebase = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = dir.join(&*path);
            }
        };
        rebase(&mut self.fragment);
        if let Some(vertex) = &mut self.vertex {
            rebase(vertex);
        }
        for input in &mut self.inputs {
            if let TableInput::File { path } = input {
                rebase(path);
            }
        }
        rebase(&mut self.output);
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let side = 1..=MAX_DIMENSION;
        if !side.contains(&self.width) || !side.contains(&self.height) {
            return Err(ConfigError::InvalidDimensions {
                width: self.width,
                height: self.height,
                max: MAX_DIMENSION,
            });
        }
        if self.inputs.len() > MAX_TEXTURE_UNITS {
            return Err(ConfigError::TooManyInputs {
                count: self.inputs.len(),
                max: MAX_TEXTURE_UNITS,
            });
        }
        let mut inline = Vec::new();
        for (i, input) in self.inputs.iter().enumerate() {
            if let TableInput::Inline(table) = input {
                if table.is_empty() {
                    return Err(ConfigError::EmptyTable { input: i });
                }
                table
                    .validate()
                    .map_err(|source| ConfigError::InvalidTable { input: i, source })?;
                inline.push(table);
            }
        }
        check_table_names(inline)?;
        if let Some(name) = self.uniforms.keys().find(|n| RESERVED_UNIFORMS.contains(&n.as_str())) {
            return Err(ConfigError::ReservedName { name: name.clone() });
        }
        Ok(())
    }
}

/// Every table needs a distinct, non-reserved sampler name.
pub fn check_table_names<'a>(tables: impl IntoIterator<Item = &'a Table>) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for table in tables {
        if table.name.is_empty() {
            return Err(ConfigError::UnnamedTable);
        }
        if RESERVED_UNIFORMS.contains(&table.name.as_str()) {
            return Err(ConfigError::ReservedName {
                name: table.name.clone(),
            });
        }
        if !seen.insert(table.name.as_str()) {
            return Err(ConfigError::DuplicateTable {
                name: table.name.clone(),
            });
        }
    }
    Ok(())
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Output size {width}x{height} is invalid, sides must be 1 to {max}")]
    InvalidDimensions { width: u32, height: u32, max: u32 },
    #[error("{count} input tables exceed the {max} available texture units")]
    TooManyInputs { count: usize, max: usize },
    #[error("Input {input} is an empty table")]
    EmptyTable { input: usize },
    #[error("Input {input} is invalid: {source}")]
    InvalidTable {
        input: usize,
        #[source]
        source: TableError,
    },
    #[error("Input tables need a name")]
    UnnamedTable,
    #[error("Table name '{name}' is used more than once")]
    DuplicateTable { name: String },
    #[error("'{name}' is set by the runner and cannot be configured")]
    ReservedName { name: String },
}

//! Shader source loading with textual `#include` expansion.
//!
//! A line of the form `#include "relative/path"` is replaced by the expanded
//! contents of that file, resolved against the directory of the file that
//! contains the directive. Each file is expanded at most once per
//! top-level [`resolve`] call: a second inclusion, including a cyclic one,
//! contributes an empty line and is recorded in [`ResolvedSource::skipped`].

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

const INCLUDE_DIRECTIVE: &str = "#include";

/// Errors that abort resolution of a whole stage.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Failed to open shader source {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read shader source {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path}:{line}: #include target must be a double-quoted path")]
    MalformedInclude { path: PathBuf, line: usize },
}

/// An `#include` that was not expanded because its target was already loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedInclude {
    /// The include target, as joined onto the includer's directory.
    pub path: PathBuf,
    /// File containing the skipped directive.
    pub included_from: PathBuf,
}

/// Flattened source of one shader stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedSource {
    /// Expanded text; every line ends with `\n`.
    pub text: String,
    /// Files read, in the order they were first reached.
    pub loaded: Vec<PathBuf>,
    /// Inclusions skipped because the target was already loaded.
    pub skipped: Vec<SkippedInclude>,
}

impl ResolvedSource {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Expand `path` and everything it includes into a single source string.
pub fn resolve<P: AsRef<Path>>(path: P) -> Result<ResolvedSource, ResolveError> {
    let mut resolved = ResolvedSource::default();
    let mut skipped = Vec::new();
    resolved.text = expand(path.as_ref(), &mut resolved.loaded, &mut skipped)?;
    resolved.skipped = skipped;
    Ok(resolved)
}

/// Parse the target of an include directive.
///
/// Returns `None` when the line is not an include directive at all and
/// `Some(Err(()))` when it is one but the target is not quoted.
fn include_target(line: &str) -> Option<Result<&str, ()>> {
    if !line.starts_with('#') {
        return None;
    }
    let (directive, rest) = line.split_once(' ').unwrap_or((line, ""));
    if directive != INCLUDE_DIRECTIVE {
        return None;
    }
    let target = rest
        .trim()
        .strip_prefix('"')
        .and_then(|t| t.split_once('"'))
        .map(|(target, _)| target)
        .filter(|target| !target.is_empty());
    Some(target.ok_or(()))
}

fn expand(
    path: &Path,
    loaded: &mut Vec<PathBuf>,
    skipped: &mut Vec<SkippedInclude>,
) -> Result<String, ResolveError> {
    let file = File::open(path).map_err(|source| ResolveError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    loaded.push(path.to_path_buf());

    let parent = path.parent().unwrap_or(Path::new(""));
    let mut text = String::new();

    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| ResolveError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        match include_target(&line) {
            None => text.push_str(&line),
            Some(Err(())) => {
                return Err(ResolveError::MalformedInclude {
                    path: path.to_path_buf(),
                    line: index + 1,
                });
            }
            Some(Ok(target)) => {
                let nested = parent.join(target);
                if loaded.iter().any(|l| l.as_os_str() == nested.as_os_str()) {
                    log::info!(
                        "{} already included, skipping (from {})",
                        nested.display(),
                        path.display()
                    );
                    skipped.push(SkippedInclude {
                        path: nested,
                        included_from: path.to_path_buf(),
                    });
                } else {
                    text.push_str(&expand(&nested, loaded, skipped)?);
                }
            }
        }
        text.push('\n');
    }

    Ok(text)
}

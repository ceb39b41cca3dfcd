use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::document::DocumentFormat;
use crate::error::SplitError;

/// A file written by [`FileEmitter::emit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedFile {
    /// Path relative to the emitter's target directory, `/`-separated.
    pub file_name: String,
    pub path: PathBuf,
}

/// Writes document subtrees below one target directory, never overwriting.
#[derive(Debug, Clone)]
pub struct FileEmitter {
    target_dir: PathBuf,
    format: DocumentFormat,
    extension: &'static str,
}

impl FileEmitter {
    /// `extension` only names the emitted files; the body is always rendered as `format`.
    pub fn new(target_dir: impl Into<PathBuf>, format: DocumentFormat, extension: &'static str) -> Self {
        Self {
            target_dir: target_dir.into(),
            format,
            extension,
        }
    }

    /// Serialize `root` to `<target_dir>/<stem>.<ext>`.
    ///
    /// `stem` may contain `/` to place the file in a sub-directory.
    pub fn emit(&self, stem: &str, root: &Value) -> Result<EmittedFile, SplitError> {
        let file_name = format!("{stem}.{}", self.extension);
        let path = self.target_dir.join(&file_name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| SplitError::io(parent, e))?;
        }

        let body = self.format.render(root)?;
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(SplitError::collision(format!(
                    "there already exists a file: {}",
                    path.display()
                )));
            }
            Err(e) => return Err(SplitError::io(&path, e)),
        };
        file.write_all(body.as_bytes())
            .map_err(|e| SplitError::io(&path, e))?;

        log::debug!("wrote {}", path.display());
        Ok(EmittedFile { file_name, path })
    }
}

/// Append `value` as pretty JSON to an auxiliary diagnostics file.
///
/// Failures are logged and swallowed; diagnostics never abort a run.
pub fn append_diagnostics(path: &Path, value: &Value) {
    let result = serde_json::to_string_pretty(value)
        .map_err(std::io::Error::other)
        .and_then(|json| {
            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            writeln!(file, "{json}")
        });
    if let Err(e) = result {
        log::warn!("write diagnostics file error: {e}, file path: {}", path.display());
    }
}

//! Pre-split passes that make a document self-contained.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::document::DocumentFormat;
use crate::error::SplitError;

const X_MS_PATHS_KEY: &str = "x-ms-paths";

/// Resolves references to other files in place, before any splitting.
pub trait RefResolver {
    fn resolve(&self, root: &mut Value, source: &Path) -> Result<(), SplitError>;
}

/// Merges a vendor path-override section into `paths` in place.
pub trait PathsExpander {
    fn expand(&self, root: &mut Value) -> Result<(), SplitError>;
}

/// Inlines every `$ref` that points into another file (`common.json#/definitions/Error`).
///
/// Local references of the source document are left as they are. Local
/// references inside inlined content are resolved against the file they came
/// from. A reference cycle stops at the first repeated target, which keeps its `$ref`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileRefResolver;

#[derive(Default)]
struct ResolveState {
    files: HashMap<PathBuf, Value>,
    stack: Vec<String>,
}

impl ResolveState {
    fn lookup(&mut self, file: &Path, pointer: &str) -> Result<Value, SplitError> {
        if !self.files.contains_key(file) {
            if !file.is_file() {
                return Err(SplitError::MissingInput(format!(
                    "referenced file '{}' does not exist",
                    file.display()
                )));
            }
            let content = fs::read_to_string(file).map_err(|e| SplitError::io(file, e))?;
            let value = DocumentFormat::from_path(file).parse(&content)?;
            self.files.insert(file.to_path_buf(), value);
        }

        let document = &self.files[file];
        let target = if pointer.is_empty() {
            Some(document)
        } else {
            document.pointer(pointer)
        };
        target.cloned().ok_or_else(|| {
            SplitError::SchemaViolation(format!(
                "reference target '{}#{pointer}' not found",
                file.display()
            ))
        })
    }
}

impl FileRefResolver {
    /// File and JSON pointer a reference points at, or `None` when it stays as-is.
    fn target_of(reference: &str, base: &Path, external: bool) -> Option<(PathBuf, String)> {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            return None;
        }
        if let Some(pointer) = reference.strip_prefix('#') {
            return external.then(|| (base.to_path_buf(), pointer.to_string()));
        }
        let (file, pointer) = reference.split_once('#').unwrap_or((reference, ""));
        let dir = base.parent().unwrap_or(Path::new(""));
        Some((dir.join(file), pointer.to_string()))
    }

    fn resolve_node(
        &self,
        node: &mut Value,
        base: &Path,
        external: bool,
        state: &mut ResolveState,
    ) -> Result<(), SplitError> {
        let target = node
            .get("$ref")
            .and_then(Value::as_str)
            .and_then(|reference| Self::target_of(reference, base, external));

        if let Some((file, pointer)) = target {
            let key = format!("{}#{pointer}", file.display());
            if state.stack.contains(&key) {
                log::warn!("circular reference to {key} left unresolved");
                return Ok(());
            }
            let mut replacement = state.lookup(&file, &pointer)?;
            state.stack.push(key);
            self.resolve_node(&mut replacement, &file, true, state)?;
            state.stack.pop();
            *node = replacement;
            return Ok(());
        }

        match node {
            Value::Object(map) => {
                for value in map.values_mut() {
                    self.resolve_node(value, base, external, state)?;
                }
            }
            Value::Array(items) => {
                for value in items {
                    self.resolve_node(value, base, external, state)?;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

impl RefResolver for FileRefResolver {
    fn resolve(&self, root: &mut Value, source: &Path) -> Result<(), SplitError> {
        self.resolve_node(root, source, false, &mut ResolveState::default())
    }
}

/// Moves `x-ms-paths` entries into `paths`.
///
/// An entry keeps its bare path (query suffix dropped) when that path is
/// free, and its full key otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct XMsPathsExpander;

impl PathsExpander for XMsPathsExpander {
    fn expand(&self, root: &mut Value) -> Result<(), SplitError> {
        let Value::Object(root) = root else {
            return Ok(());
        };
        let Some(vendor) = root.shift_remove(X_MS_PATHS_KEY) else {
            return Ok(());
        };
        let Value::Object(vendor) = vendor else {
            return Err(SplitError::SchemaViolation(format!(
                "{X_MS_PATHS_KEY} is not an object"
            )));
        };

        let paths = root
            .entry("paths")
            .or_insert_with(|| Value::Object(Map::new()));
        if paths.is_null() {
            *paths = Value::Object(Map::new());
        }
        let Value::Object(paths) = paths else {
            return Err(SplitError::SchemaViolation("paths is not an object".to_string()));
        };

        for (key, item) in vendor {
            let bare = key.split('?').next().unwrap_or(&key).to_string();
            if paths.contains_key(&bare) {
                paths.insert(key, item);
            } else {
                paths.insert(bare, item);
            }
        }
        Ok(())
    }
}

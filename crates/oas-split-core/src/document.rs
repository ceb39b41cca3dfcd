use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::SplitError;

/// Pseudo-key of a path item holding the parameters shared by its operations.
pub const PARAMETERS_KEY: &str = "parameters";

static OPERATION_ID_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"["']?operationId["']?\s*:\s*["']?([^"',\s}]+)"#).unwrap()
});

/// Serialization format of a description document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Pick the format from a file extension; anything but YAML is read as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => DocumentFormat::Yaml,
            _ => DocumentFormat::Json,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            DocumentFormat::Json => "json",
            DocumentFormat::Yaml => "yaml",
        }
    }

    pub fn parse(self, content: &str) -> Result<Value, SplitError> {
        Ok(match self {
            DocumentFormat::Json => serde_json::from_str(content)?,
            DocumentFormat::Yaml => serde_yaml_ng::from_str(content)?,
        })
    }

    pub fn render(self, value: &Value) -> Result<String, SplitError> {
        Ok(match self {
            DocumentFormat::Json => serde_json::to_string_pretty(value)?,
            DocumentFormat::Yaml => serde_yaml_ng::to_string(value)?,
        })
    }
}

/// operationId → 1-based line of its first occurrence in the source text.
#[derive(Debug, Clone, Default)]
pub struct LineIndex {
    lines: HashMap<String, usize>,
}

impl LineIndex {
    pub fn scan(content: &str) -> Self {
        let mut lines = HashMap::new();
        for (number, line) in content.lines().enumerate() {
            if let Some(caps) = OPERATION_ID_LINE.captures(line) {
                lines.entry(caps[1].to_string()).or_insert(number + 1);
            }
        }
        Self { lines }
    }

    pub fn get(&self, operation_id: &str) -> Option<usize> {
        self.lines.get(operation_id).copied()
    }

    pub fn as_map(&self) -> &HashMap<String, usize> {
        &self.lines
    }
}

/// An ordered in-memory description document loaded from one source file.
#[derive(Debug, Clone)]
pub struct Document {
    pub root: Value,
    pub format: DocumentFormat,
    pub source: PathBuf,
    pub lines: LineIndex,
}

impl Document {
    /// Load a document. Line positions come from the sibling
    /// `<name>_sourceswagger.json` when one exists, else from the file itself.
    pub fn load(path: &Path) -> Result<Self, SplitError> {
        if !path.is_file() {
            return Err(SplitError::MissingInput(format!(
                "source document '{}' does not exist",
                path.display()
            )));
        }
        let content = fs::read_to_string(path).map_err(|e| SplitError::io(path, e))?;
        let format = DocumentFormat::from_path(path);
        let mut document = Self::parse(&content, format, path)?;

        let line_source = source_swagger_path(path);
        if line_source != path {
            let original =
                fs::read_to_string(&line_source).map_err(|e| SplitError::io(&line_source, e))?;
            document.lines = LineIndex::scan(&original);
        }
        Ok(document)
    }

    pub fn parse(content: &str, format: DocumentFormat, source: &Path) -> Result<Self, SplitError> {
        let root = format.parse(content)?;
        if !root.is_object() {
            return Err(SplitError::SchemaViolation(format!(
                "document root of '{}' is not an object",
                source.display()
            )));
        }
        Ok(Self {
            root,
            format,
            source: source.to_path_buf(),
            lines: LineIndex::scan(content),
        })
    }

    /// The `paths` map; a document without one has no operations.
    pub fn paths(&self) -> Result<Map<String, Value>, SplitError> {
        match self.root.get("paths") {
            None | Some(Value::Null) => Ok(Map::new()),
            Some(Value::Object(paths)) => Ok(paths.clone()),
            Some(_) => Err(SplitError::SchemaViolation(format!(
                "paths of '{}' is not an object",
                self.source.display()
            ))),
        }
    }

    /// `info.title`, which every document must declare.
    pub fn info_title(&self) -> Result<String, SplitError> {
        let info = self.root.get("info").ok_or_else(|| {
            SplitError::SchemaViolation(format!("info is not defined in '{}'", self.source.display()))
        })?;
        match info.get("title") {
            Some(Value::String(title)) => Ok(title.clone()),
            Some(other) if !other.is_null() => Ok(other.to_string()),
            _ => Err(SplitError::SchemaViolation(format!(
                "title is not defined in info of '{}'",
                self.source.display()
            ))),
        }
    }

    pub fn info_version(&self) -> Option<String> {
        self.root
            .pointer("/info/version")
            .and_then(Value::as_str)
            .map(String::from)
    }

    /// Extension for files emitted from this document, following the source's spelling.
    pub fn extension(&self) -> &'static str {
        match self.source.extension().and_then(|e| e.to_str()) {
            Some("yml") if self.format == DocumentFormat::Yaml => "yml",
            _ => self.format.extension(),
        }
    }

    /// Human-readable source location of an operation, for error messages.
    pub fn locate(&self, operation_id: &str) -> String {
        match self.lines.get(operation_id) {
            Some(line) => format!("{}:{}", self.source.display(), line),
            None => self.source.display().to_string(),
        }
    }
}

fn source_swagger_path(path: &Path) -> PathBuf {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return path.to_path_buf();
    };
    if !name.ends_with(".json") {
        return path.to_path_buf();
    }
    let sibling = path.with_file_name(name.replace(".json", "_sourceswagger.json"));
    if sibling.is_file() {
        sibling
    } else {
        path.to_path_buf()
    }
}

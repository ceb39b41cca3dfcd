use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SplitError {
    #[error("missing input: {0}")]
    MissingInput(String),

    #[error("schema violation: {0}")]
    SchemaViolation(String),

    #[error("operationId is not defined in operation `{method} {path}`")]
    MissingOperationId { path: String, method: String },

    #[error("naming collision: {message}; {hint}")]
    NamingCollision { message: String, hint: String },

    #[error("link '{link}' does not exist in '{toc}' when merging into the generated toc")]
    LinkNotFound { link: String, toc: String },

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl SplitError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SplitError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn collision(message: impl Into<String>) -> Self {
        SplitError::NamingCollision {
            message: message.into(),
            hint: "add an operation group name mapping for the source document to avoid the conflict"
                .to_string(),
        }
    }
}

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::SplitError;

const OPERATION_ID_DELIMITER: char = '_';

/// Path item keys that hold an operation.
const HTTP_METHODS: &[&str] = &["get", "put", "post", "delete", "options", "head", "patch", "trace"];

/// Derives `(group, operation)` names from `operationId`s shaped `<group>_<verb>`.
#[derive(Debug, Clone, Copy)]
pub struct OperationGrouper<'a> {
    group_name_mapping: &'a IndexMap<String, String>,
}

impl<'a> OperationGrouper<'a> {
    pub fn new(group_name_mapping: &'a IndexMap<String, String>) -> Self {
        Self { group_name_mapping }
    }

    /// Split an operationId into its group key and operation name.
    ///
    /// Anything other than exactly one delimiter uses the (renamed) first
    /// segment as both group and operation name.
    pub fn split_operation_id(&self, operation_id: &str) -> (String, String) {
        let segments: Vec<&str> = operation_id.split(OPERATION_ID_DELIMITER).collect();
        let group = self
            .group_name_mapping
            .get(segments[0])
            .map(String::as_str)
            .unwrap_or(segments[0])
            .to_string();

        if segments.len() != 2 {
            return (group.clone(), group);
        }
        (group, segments[1].to_string())
    }

    pub fn group(
        &self,
        path: &str,
        method: &str,
        operation: &Value,
    ) -> Result<(String, String), SplitError> {
        let operation_id = operation_id(path, method, operation)?;
        Ok(self.split_operation_id(&operation_id))
    }
}

/// The `operationId` of an operation, which is required.
pub fn operation_id(path: &str, method: &str, operation: &Value) -> Result<String, SplitError> {
    match operation.get("operationId") {
        Some(Value::String(id)) => Ok(id.clone()),
        None | Some(Value::Null) => Err(SplitError::MissingOperationId {
            path: path.to_string(),
            method: method.to_string(),
        }),
        Some(other) => Ok(other.to_string()),
    }
}

/// Operations of a path item: its HTTP method entries only.
///
/// `parameters`, `summary`, `servers`, `$ref` and `x-*` keys are not operations.
pub fn operations<'v>(
    path: &str,
    item: &'v Value,
) -> Result<impl Iterator<Item = (&'v String, &'v Value)> + use<'v>, SplitError> {
    let item: &Map<String, Value> = item.as_object().ok_or_else(|| {
        SplitError::SchemaViolation(format!("path item '{path}' is not an object"))
    })?;
    Ok(item
        .iter()
        .filter(|(key, _)| HTTP_METHODS.contains(&key.as_str())))
}

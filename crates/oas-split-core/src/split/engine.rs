use std::collections::HashMap;
use std::path::Path;

use indexmap::{IndexMap, IndexSet};
use serde_json::{Map, Value, json};

use super::grouping::{OperationGrouper, operation_id, operations};
use super::{FileNameInfo, SPLIT_TYPE_OPERATION, SPLIT_TYPE_OPERATION_GROUP, SplitFile};
use crate::casing::{display_name, file_name_segment, formalize_url};
use crate::config::SplitOptions;
use crate::document::{Document, PARAMETERS_KEY};
use crate::emit::FileEmitter;
use crate::error::SplitError;

const TOC_NAME_KEY: &str = "x-internal-toc-name";
const PRODUCT_UID_KEY: &str = "x-internal-product-uid";
const OPERATION_GROUP_NAME_KEY: &str = "x-internal-operation-group-name";
const OPERATION_ID_KEY: &str = "x-internal-operation-id";
const SERVICE_ID_KEY: &str = "x-internal-service-id";
const SERVICE_NAME_KEY: &str = "x-internal-service-name";
const SUB_GROUP_NAME_KEY: &str = "x-internal-sub-group-name";
const SPLIT_MEMBERS_KEY: &str = "x-internal-split-members";
const SPLIT_TYPE_KEY: &str = "x-internal-split-type";
const OPERATION_TITLE_KEY: &str = "x-operationTitle";

/// Service identity written into every file emitted for a document.
#[derive(Debug, Clone, Default)]
pub struct DocumentContext {
    pub service_id: Option<String>,
    pub service_name: Option<String>,
    pub sub_group_name: Option<String>,
}

/// Annotations of one emitted file, kept beside the document instead of on it.
#[derive(Debug, Default)]
struct Annotations<'a> {
    toc_name: &'a str,
    operation_group_name: Option<&'a str>,
    operation_id: Option<&'a str>,
    split_members: Option<Value>,
    split_type: Option<&'static str>,
}

/// Splits one document into operation group files.
pub struct SplitEngine<'a> {
    document: &'a Document,
    emitter: FileEmitter,
    options: &'a SplitOptions,
    operation_group_mapping: &'a IndexMap<String, String>,
    grouper: OperationGrouper<'a>,
    context: DocumentContext,
}

impl<'a> SplitEngine<'a> {
    pub fn new(
        document: &'a Document,
        target_dir: &Path,
        options: &'a SplitOptions,
        operation_group_mapping: &'a IndexMap<String, String>,
        group_name_mapping: &'a IndexMap<String, String>,
        context: DocumentContext,
    ) -> Self {
        let extension = if options.use_yaml_schema {
            "yml"
        } else {
            document.extension()
        };
        Self {
            document,
            emitter: FileEmitter::new(target_dir, document.format, extension),
            options,
            operation_group_mapping,
            grouper: OperationGrouper::new(group_name_mapping),
            context,
        }
    }

    /// Emit one file per operation group and return what was written.
    pub fn generate(&self) -> Result<Vec<FileNameInfo>, SplitError> {
        let paths = self.document.paths()?;
        let groups = self.operation_groups(&paths)?;

        if groups.is_empty() {
            log::info!(
                "Operation groups is empty for file {}",
                self.document.source.display()
            );
            return Ok(Vec::new());
        }

        let mut infos = Vec::with_capacity(groups.len());
        for group in &groups {
            infos.push(self.generate_group(&paths, group)?);
        }
        Ok(infos)
    }

    fn operation_groups(&self, paths: &Map<String, Value>) -> Result<IndexSet<String>, SplitError> {
        let mut groups = IndexSet::new();
        for (path, item) in paths {
            for (method, operation) in operations(path, item)? {
                groups.insert(self.grouper.group(path, method, operation)?.0);
            }
        }
        Ok(groups)
    }

    fn generate_group(
        &self,
        paths: &Map<String, Value>,
        group: &str,
    ) -> Result<FileNameInfo, SplitError> {
        let (mut filtered, shared_parameters) = self.find_paths_by_group(paths, group)?;
        if filtered.is_empty() {
            return Err(SplitError::SchemaViolation(format!(
                "operation group '{group}' could not be found in {}",
                self.document.source.display()
            )));
        }
        merge_path_parameters(&mut filtered, &shared_parameters)?;

        let (toc_name, file_base, mapped_name) = match self.operation_group_mapping.get(group) {
            Some(mapped) => (mapped.clone(), mapped.as_str(), Some(mapped.as_str())),
            None => {
                let stem = Path::new(group)
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or(group);
                (display_name(stem, &self.options.no_split_words), group, None)
            }
        };
        let group_stem = self.file_stem(file_base);

        let mut annotations = Annotations {
            toc_name: &toc_name,
            operation_group_name: mapped_name,
            ..Annotations::default()
        };

        let split = self.options.is_operation_level
            && should_split_to_operation(&filtered, self.options.split_operation_count_greater_than);

        if !split {
            let file = self.emit(&group_stem, filtered, &annotations)?;
            return Ok(FileNameInfo::Leaf(file));
        }

        let mut children = self.generate_operations(&filtered, &group_stem)?;
        children.sort_by(|a, b| a.toc_name.cmp(&b.toc_name));

        let members: Vec<Value> = children
            .iter()
            .map(|child| {
                json!({
                    "displayName": child.toc_name,
                    "relativePath": strip_extension(&child.file_name),
                })
            })
            .collect();
        annotations.split_members = Some(Value::Array(members));
        annotations.split_type = Some(SPLIT_TYPE_OPERATION_GROUP);

        let file = self.emit(&group_stem, Map::new(), &annotations)?;
        Ok(FileNameInfo::Parent { file, children })
    }

    /// Collect the paths holding operations of `group`, plus every shared
    /// path-level parameter list keyed by path.
    fn find_paths_by_group(
        &self,
        paths: &Map<String, Value>,
        group: &str,
    ) -> Result<(Map<String, Value>, HashMap<String, Value>), SplitError> {
        let mut filtered = Map::new();
        let mut shared_parameters = HashMap::new();

        for (path, item) in paths {
            if let Some(parameters) = item.get(PARAMETERS_KEY) {
                shared_parameters.insert(path.clone(), parameters.clone());
            }
            for (method, operation) in operations(path, item)? {
                if self.grouper.group(path, method, operation)?.0 != group {
                    continue;
                }
                let entry = filtered
                    .entry(path.clone())
                    .or_insert_with(|| Value::Object(Map::new()));
                if let Value::Object(item) = entry {
                    item.insert(method.clone(), operation.clone());
                }
            }
        }
        Ok((filtered, shared_parameters))
    }

    /// Emit one file per operation of an already filtered group.
    fn generate_operations(
        &self,
        filtered: &Map<String, Value>,
        group_stem: &str,
    ) -> Result<Vec<SplitFile>, SplitError> {
        let mut children = Vec::new();
        for (path, item) in filtered {
            for (method, operation) in operations(path, item)? {
                let id = operation_id(path, method, operation)?;
                let name = match operation.get(OPERATION_TITLE_KEY).and_then(Value::as_str) {
                    Some(title) => title.to_string(),
                    None => self.grouper.split_operation_id(&id).1,
                };
                let toc_name = display_name(&name, &self.options.no_split_words);
                let stem = format!("{group_stem}/{}", self.file_stem(&name));

                let mut single = Map::new();
                single.insert(method.clone(), operation.clone());
                let mut operation_paths = Map::new();
                operation_paths.insert(path.clone(), Value::Object(single));

                let annotations = Annotations {
                    toc_name: &toc_name,
                    operation_id: Some(&id),
                    split_type: Some(SPLIT_TYPE_OPERATION),
                    ..Annotations::default()
                };
                let file = self.emit(&stem, operation_paths, &annotations).map_err(|e| match e {
                    SplitError::NamingCollision { message, hint } => SplitError::NamingCollision {
                        message: format!("{message} (operation at {})", self.document.locate(&id)),
                        hint,
                    },
                    other => other,
                })?;
                children.push(file);
            }
        }
        Ok(children)
    }

    fn file_stem(&self, name: &str) -> String {
        file_name_segment(
            &formalize_url(name, self.options.formalize_url),
            &self.options.no_split_words,
            "-",
        )
    }

    /// Write a copy of the document restricted to `paths`, carrying `annotations`.
    fn emit(
        &self,
        stem: &str,
        paths: Map<String, Value>,
        annotations: &Annotations<'_>,
    ) -> Result<SplitFile, SplitError> {
        let mut root = match &self.document.root {
            Value::Object(root) => root.clone(),
            _ => Map::new(),
        };
        root.insert("paths".to_string(), Value::Object(paths));
        self.annotate(&mut root, annotations);

        let emitted = self.emitter.emit(stem, &Value::Object(root))?;
        Ok(SplitFile {
            toc_name: annotations.toc_name.to_string(),
            file_name: emitted.file_name,
            path: emitted.path,
            version: self.document.info_version(),
        })
    }

    fn annotate(&self, root: &mut Map<String, Value>, annotations: &Annotations<'_>) {
        let mut set = |key: &str, value: Option<&str>| {
            if let Some(value) = value {
                root.insert(key.to_string(), Value::String(value.to_string()));
            }
        };
        set(SERVICE_ID_KEY, self.context.service_id.as_deref());
        set(SERVICE_NAME_KEY, self.context.service_name.as_deref());
        set(SUB_GROUP_NAME_KEY, self.context.sub_group_name.as_deref());
        set(OPERATION_GROUP_NAME_KEY, annotations.operation_group_name);
        set(OPERATION_ID_KEY, annotations.operation_id);
        set(TOC_NAME_KEY, Some(annotations.toc_name));
        set(PRODUCT_UID_KEY, self.options.product_uid.as_deref());
        set(SPLIT_TYPE_KEY, annotations.split_type);

        if let Some(members) = &annotations.split_members {
            root.insert(SPLIT_MEMBERS_KEY.to_string(), members.clone());
        }
    }
}

/// Whether a group's filtered paths should be split into one file per operation.
///
/// Ties on the path count are broken by the operation count of the first path only.
pub fn should_split_to_operation(paths: &Map<String, Value>, threshold: usize) -> bool {
    let count = paths.len();
    count > threshold
        || (count == threshold
            && paths
                .values()
                .next()
                .and_then(Value::as_object)
                .is_some_and(|operations| operations.len() > threshold))
}

/// Append each path's shared parameters to every operation under it, keeping
/// parameters the operation already declares.
fn merge_path_parameters(
    filtered: &mut Map<String, Value>,
    shared_parameters: &HashMap<String, Value>,
) -> Result<(), SplitError> {
    for (path, item) in filtered.iter_mut() {
        let Some(shared) = shared_parameters.get(path) else {
            continue;
        };
        let shared = shared.as_array().ok_or_else(|| {
            SplitError::SchemaViolation(format!("parameters of path '{path}' is not a list"))
        })?;
        let Value::Object(operations) = item else {
            continue;
        };

        for (method, operation) in operations.iter_mut() {
            let Value::Object(operation) = operation else {
                return Err(SplitError::SchemaViolation(format!(
                    "operation '{method}' of path '{path}' is not an object"
                )));
            };
            let parameters = operation
                .entry(PARAMETERS_KEY)
                .or_insert_with(|| Value::Array(Vec::new()));
            let Value::Array(parameters) = parameters else {
                return Err(SplitError::SchemaViolation(format!(
                    "parameters of operation '{method}' of path '{path}' is not a list"
                )));
            };
            for parameter in shared {
                let key = parameter_key(parameter);
                if !parameters.iter().any(|p| parameter_key(p) == key) {
                    parameters.push(parameter.clone());
                }
            }
        }
    }
    Ok(())
}

/// Identity of a parameter: its `$ref`, or its `(name, in)` pair.
fn parameter_key(parameter: &Value) -> (Option<&Value>, Option<&Value>, Option<&Value>) {
    (
        parameter.get("$ref"),
        parameter.get("name"),
        parameter.get("in"),
    )
}

fn strip_extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(index) if index > 0 => &file_name[..index],
        _ => file_name,
    }
}

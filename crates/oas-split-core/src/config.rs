use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::SplitError;

/// Top-level organization mapping file describing every service to split.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OrgsMappingFile {
    /// Output directory, relative to the target root, receiving the split files and `toc.md`.
    pub target_api_root_dir: String,
    pub organizations: Vec<OrgInfo>,
    #[serde(flatten)]
    pub split: SplitOptions,
    /// Optional file receiving the operationId → line diagnostics of every document.
    pub diagnostics_file: Option<String>,
}

impl Default for OrgsMappingFile {
    fn default() -> Self {
        Self {
            target_api_root_dir: "api".to_string(),
            organizations: Vec::new(),
            split: SplitOptions::default(),
            diagnostics_file: None,
        }
    }
}

/// Splitting behaviour shared by all services unless a service overrides it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SplitOptions {
    pub is_operation_level: bool,
    pub split_operation_count_greater_than: usize,
    /// Emit `.yml` file names instead of the source extension.
    pub use_yaml_schema: bool,
    pub need_resolve_x_ms_paths: bool,
    pub formalize_url: bool,
    /// Extra acronyms kept intact by the identifier tokenizer.
    pub no_split_words: Vec<String>,
    pub product_uid: Option<String>,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            is_operation_level: false,
            split_operation_count_greater_than: 0,
            use_yaml_schema: false,
            need_resolve_x_ms_paths: false,
            formalize_url: true,
            no_split_words: Vec::new(),
            product_uid: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OrgInfo {
    #[serde(rename = "name")]
    pub org_name: String,
    #[serde(rename = "index")]
    pub org_index: Option<String>,
    pub default_toc_title: Option<String>,
    pub services: Vec<ServiceInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServiceInfo {
    pub toc_title: String,
    pub index_file: Option<String>,
    /// Hand-authored conceptual `toc.md` merged under this service.
    pub toc_file: Option<String>,
    pub url_group: String,
    pub service_id: Option<String>,
    pub is_operation_level: Option<bool>,
    pub split_operation_count_greater_than: Option<usize>,
    pub use_yaml_schema: Option<bool>,
    pub swagger_info: Vec<SwaggerInfo>,
}

impl ServiceInfo {
    /// Resolve the split options for this service, applying its overrides.
    pub fn effective_options(&self, defaults: &SplitOptions) -> SplitOptions {
        SplitOptions {
            is_operation_level: self.is_operation_level.unwrap_or(defaults.is_operation_level),
            split_operation_count_greater_than: self
                .split_operation_count_greater_than
                .unwrap_or(defaults.split_operation_count_greater_than),
            use_yaml_schema: self.use_yaml_schema.unwrap_or(defaults.use_yaml_schema),
            ..defaults.clone()
        }
    }

    pub fn service_id(&self) -> &str {
        self.service_id.as_deref().unwrap_or(&self.url_group)
    }
}

/// One source document of a service.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SwaggerInfo {
    pub source: String,
    pub sub_group_toc_title: Option<String>,
    /// Raw group token → display/file name, applied after partitioning.
    pub operation_group_mapping: IndexMap<String, String>,
    /// Raw group token → renamed group token, applied before partitioning.
    pub group_name_mapping: IndexMap<String, String>,
}

/// Load the organization mapping file from YAML or JSON (picked by extension).
pub fn load_config(path: &Path) -> Result<OrgsMappingFile, SplitError> {
    if !path.is_file() {
        return Err(SplitError::MissingInput(format!(
            "mapping file '{}' does not exist",
            path.display()
        )));
    }
    let content = fs::read_to_string(path).map_err(|e| SplitError::io(path, e))?;
    let config = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&content)?,
        _ => serde_yaml_ng::from_str(&content)?,
    };
    Ok(config)
}

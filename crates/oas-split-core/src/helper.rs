use std::path::Path;

use serde_json::{Map, Value};

use crate::config::{SplitOptions, SwaggerInfo};
use crate::document::Document;
use crate::emit::append_diagnostics;
use crate::error::SplitError;
use crate::resolve::{PathsExpander, RefResolver};
use crate::split::{DocumentContext, FileNameInfo, SplitEngine};

/// What splitting one source document produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestFileInfo {
    /// `info.title` of the source document.
    pub toc_title: String,
    pub file_name_infos: Vec<FileNameInfo>,
}

/// Everything one document split needs besides the document itself.
pub struct SplitRequest<'a> {
    pub target_dir: &'a Path,
    pub swagger: &'a SwaggerInfo,
    pub options: &'a SplitOptions,
    pub context: DocumentContext,
    pub ref_resolver: &'a dyn RefResolver,
    pub paths_expander: &'a dyn PathsExpander,
    pub diagnostics_file: Option<&'a Path>,
}

/// Load, resolve and split one source document into `request.target_dir`.
pub fn split(source: &Path, request: SplitRequest<'_>) -> Result<RestFileInfo, SplitError> {
    if !request.target_dir.is_dir() {
        return Err(SplitError::MissingInput(format!(
            "target directory '{}' should exist",
            request.target_dir.display()
        )));
    }

    let mut document = Document::load(source)?;
    request.ref_resolver.resolve(&mut document.root, source)?;
    if request.options.need_resolve_x_ms_paths {
        request.paths_expander.expand(&mut document.root)?;
    }
    let toc_title = document.info_title()?;

    if let Some(diagnostics) = request.diagnostics_file {
        let lines: Map<String, Value> = document
            .lines
            .as_map()
            .iter()
            .map(|(id, line)| (id.clone(), Value::from(*line)))
            .collect();
        append_diagnostics(diagnostics, &Value::Object(lines));
    }

    let engine = SplitEngine::new(
        &document,
        request.target_dir,
        request.options,
        &request.swagger.operation_group_mapping,
        &request.swagger.group_name_mapping,
        request.context,
    );
    let file_name_infos = engine.generate()?;

    Ok(RestFileInfo {
        toc_title,
        file_name_infos,
    })
}

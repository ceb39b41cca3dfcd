use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use oas_split_core::config::{OrgsMappingFile, load_config};
use oas_split_core::resolve::{PathsExpander, RefResolver};
use oas_split_core::{SplitError, TocSynthesizer};
use serde_json::Value;

const PETS: &str = include_str!("fixtures/pets.json");
const COMPUTE: &str = include_str!("fixtures/compute.yaml");
const MAPPING: &str = include_str!("fixtures/mapping.yaml");
const CONCEPTUAL_TOC: &str = include_str!("fixtures/conceptual-toc.md");

/// Source and target trees for one outline run.
struct Workspace {
    _tmp: tempfile::TempDir,
    source: PathBuf,
    target: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("source");
        let target = tmp.path().join("target");
        fs::create_dir_all(&source).unwrap();
        fs::create_dir_all(target.join("docs")).unwrap();

        fs::write(source.join("pets.json"), PETS).unwrap();
        fs::write(source.join("compute.yaml"), COMPUTE).unwrap();
        fs::write(target.join("docs/index.md"), "# Zoo\n").unwrap();
        fs::write(target.join("docs/overview.md"), "# Overview\n").unwrap();
        fs::write(target.join("docs/toc.md"), CONCEPTUAL_TOC).unwrap();

        Self {
            _tmp: tmp,
            source,
            target,
        }
    }

    fn mapping(&self) -> OrgsMappingFile {
        let path = self.source.join("mapping.yaml");
        fs::write(&path, MAPPING).unwrap();
        load_config(&path).unwrap()
    }

    fn run(&self, mapping: &OrgsMappingFile) -> Result<oas_split_core::SplitReport, SplitError> {
        TocSynthesizer::new(&self.source, &self.target, mapping).run()
    }
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn writes_combined_outline() {
    let ws = Workspace::new();
    let report = ws.run(&ws.mapping()).unwrap();

    assert_eq!(report.toc_path, ws.target.join("api/toc.md"));
    assert_eq!(report.rest_file_infos.len(), 2);

    let toc = fs::read_to_string(&report.toc_path).unwrap();
    assert!(toc.ends_with('\n'));
    insta::assert_snapshot!(toc.trim_end(), @r"
    # [Zoo Org](../docs/index.md)
    ## Compute
    ### Management
    #### [List Usages](compute/List-Usages.yaml)
    #### [Resource Skus](compute/Resource-Skus.yaml)
    #### [Virtual Machine Scale Set VMs](compute/Virtual-Machine-Scale-Set-VMs.yaml)
    #### [Virtual Machines](compute/Virtual-Machines.yaml)
    ## [Pets](../docs/index.md)
    ### [Overview](../docs/overview.md)
    ### Concepts
    #### [Links](https://example.com)
    ### Reference
    #### [Pets](pets/Pets.json)
    ##### [Create](pets/Pets/Create.json)
    ##### [Get](pets/Pets/Get.json)
    ##### [List](pets/Pets/List.json)
    ");
}

#[test]
fn emitted_files_carry_service_annotations() {
    let ws = Workspace::new();
    ws.run(&ws.mapping()).unwrap();

    let pets = read_json(&ws.target.join("api/pets/Pets/List.json"));
    assert_eq!(pets["x-internal-service-id"], "pets");
    assert_eq!(pets["x-internal-service-name"], "Pets");
    assert_eq!(pets["x-internal-product-uid"], "zoo-product");
    assert!(pets.get("x-internal-sub-group-name").is_none());

    let content = fs::read_to_string(ws.target.join("api/compute/Resource-Skus.yaml")).unwrap();
    let skus: Value = serde_yaml_ng::from_str(&content).unwrap();
    assert_eq!(skus["x-internal-service-id"], "compute-service");
    assert_eq!(skus["x-internal-sub-group-name"], "Management");

    // Source documents stay untouched.
    let source = read_json(&ws.source.join("pets.json"));
    assert!(source.get("x-internal-toc-name").is_none());
}

#[test]
fn previous_output_is_wiped() {
    let ws = Workspace::new();
    let stale = ws.target.join("api/old/Stale.json");
    fs::create_dir_all(stale.parent().unwrap()).unwrap();
    fs::write(&stale, "{}").unwrap();

    ws.run(&ws.mapping()).unwrap();
    assert!(!stale.exists());

    // A second run over its own output succeeds.
    ws.run(&ws.mapping()).unwrap();
}

#[test]
fn org_without_name_uses_default_toc_title() {
    let ws = Workspace::new();
    let mut mapping = ws.mapping();
    let org = &mut mapping.organizations[0];
    org.org_name = String::new();
    org.default_toc_title = Some("Zoo Reference".to_string());
    org.services.retain(|s| s.toc_title == "Compute");

    let report = ws.run(&mapping).unwrap();
    let toc = fs::read_to_string(&report.toc_path).unwrap();
    let lines: Vec<_> = toc.lines().take(3).collect();
    assert_eq!(
        lines,
        vec!["# [Zoo Reference](../docs/index.md)", "# Compute", "## Management"]
    );
}

#[test]
fn duplicate_title_in_one_service_is_collision() {
    let ws = Workspace::new();
    // Same group as pets.json, but a different extension so the files do not clash.
    fs::write(
        ws.source.join("more-pets.yaml"),
        "info:\n  title: More Pets\npaths:\n  /cats:\n    get:\n      operationId: Pets_ListCats\n",
    )
    .unwrap();
    let mut mapping = ws.mapping();
    let pets = &mut mapping.organizations[0].services[0];
    pets.is_operation_level = Some(false);
    pets.swagger_info.push(oas_split_core::config::SwaggerInfo {
        source: "more-pets.yaml".to_string(),
        ..Default::default()
    });

    let err = ws.run(&mapping).unwrap_err();
    assert!(matches!(err, SplitError::NamingCollision { .. }));
}

#[test]
fn broken_conceptual_link_fails() {
    let ws = Workspace::new();
    fs::remove_file(ws.target.join("docs/overview.md")).unwrap();

    let err = ws.run(&ws.mapping()).unwrap_err();
    match err {
        SplitError::LinkNotFound { link, toc } => {
            assert_eq!(link, "../docs/overview.md");
            assert_eq!(toc, "docs/toc.md");
        }
        other => panic!("expected LinkNotFound, got {other:?}"),
    }
}

#[test]
fn missing_index_file_fails() {
    let ws = Workspace::new();
    fs::remove_file(ws.target.join("docs/index.md")).unwrap();
    assert!(matches!(
        ws.run(&ws.mapping()),
        Err(SplitError::MissingInput(_))
    ));
}

#[test]
fn missing_source_dir_fails() {
    let ws = Workspace::new();
    let mapping = ws.mapping();
    let missing = ws.source.join("nope");
    let err = TocSynthesizer::new(&missing, &ws.target, &mapping)
        .run()
        .unwrap_err();
    assert!(matches!(err, SplitError::MissingInput(_)));
}

/// Records every collaborator call without touching the document.
#[derive(Default)]
struct CallLog {
    calls: RefCell<Vec<String>>,
}

impl RefResolver for CallLog {
    fn resolve(&self, _root: &mut Value, source: &Path) -> Result<(), SplitError> {
        let name = source.file_name().unwrap().to_string_lossy();
        self.calls.borrow_mut().push(format!("ref {name}"));
        Ok(())
    }
}

impl PathsExpander for CallLog {
    fn expand(&self, root: &mut Value) -> Result<(), SplitError> {
        let title = root["info"]["title"].as_str().unwrap_or_default();
        self.calls.borrow_mut().push(format!("xms {title}"));
        Ok(())
    }
}

#[test]
fn collaborators_run_once_per_document_in_order() {
    let ws = Workspace::new();
    let mut mapping = ws.mapping();
    mapping.split.need_resolve_x_ms_paths = true;

    let log = CallLog::default();
    TocSynthesizer::new(&ws.source, &ws.target, &mapping)
        .with_resolvers(&log, &log)
        .run()
        .unwrap();
    assert_eq!(
        log.calls.into_inner(),
        vec![
            "ref compute.yaml",
            "xms ComputeManagementClient",
            "ref pets.json",
            "xms Pets API",
        ]
    );
}

#[test]
fn paths_expander_skipped_unless_enabled() {
    let ws = Workspace::new();
    let mapping = ws.mapping();
    assert!(!mapping.split.need_resolve_x_ms_paths);

    let log = CallLog::default();
    TocSynthesizer::new(&ws.source, &ws.target, &mapping)
        .with_resolvers(&log, &log)
        .run()
        .unwrap();
    assert_eq!(log.calls.into_inner(), vec!["ref compute.yaml", "ref pets.json"]);
}

//! Navigation outline (`toc.md`) synthesis across organizations and services.
//!
//! Every line uses the heading-and-link micro-syntax `#..# [Title](path)`,
//! one heading level per tier: organization, service, sub-group, group, operation.

pub mod conceptual;
pub mod links;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::casing::display_name;
use crate::config::{OrgInfo, OrgsMappingFile, ServiceInfo, SplitOptions};
use crate::error::SplitError;
use crate::helper::{self, RestFileInfo, SplitRequest};
use crate::resolve::{FileRefResolver, PathsExpander, RefResolver, XMsPathsExpander};
use crate::split::DocumentContext;

use links::{index_href, join_link};

pub const TOC_FILE_NAME: &str = "toc.md";

/// One outline entry for a generated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwaggerToc {
    pub title: String,
    pub file_path: String,
    pub children: Vec<SwaggerToc>,
}

/// Sub-group label (empty when none) → entries of one service.
pub type SubTocs = BTreeMap<String, Vec<SwaggerToc>>;

/// Everything a run produced, one entry per split source document.
#[derive(Debug, Clone, Default)]
pub struct SplitReport {
    pub rest_file_infos: Vec<RestFileInfo>,
    pub toc_path: PathBuf,
}

/// Splits every configured document and writes the combined outline.
pub struct TocSynthesizer<'a> {
    source_root: &'a Path,
    target_root: &'a Path,
    mapping: &'a OrgsMappingFile,
    ref_resolver: &'a dyn RefResolver,
    paths_expander: &'a dyn PathsExpander,
}

impl<'a> TocSynthesizer<'a> {
    pub fn new(source_root: &'a Path, target_root: &'a Path, mapping: &'a OrgsMappingFile) -> Self {
        Self {
            source_root,
            target_root,
            mapping,
            ref_resolver: &FileRefResolver,
            paths_expander: &XMsPathsExpander,
        }
    }

    pub fn with_resolvers(
        mut self,
        ref_resolver: &'a dyn RefResolver,
        paths_expander: &'a dyn PathsExpander,
    ) -> Self {
        self.ref_resolver = ref_resolver;
        self.paths_expander = paths_expander;
        self
    }

    pub fn run(&self) -> Result<SplitReport, SplitError> {
        if !self.source_root.is_dir() {
            return Err(SplitError::MissingInput(format!(
                "source directory '{}' does not exist",
                self.source_root.display()
            )));
        }
        let api_dir = prepare_api_dir(&self.target_root.join(&self.mapping.target_api_root_dir))?;

        let mut report = SplitReport {
            toc_path: api_dir.join(TOC_FILE_NAME),
            ..SplitReport::default()
        };
        let mut lines = Vec::new();

        for org in sorted_orgs(&self.mapping.organizations) {
            self.write_org(&org, &api_dir, &mut lines, &mut report)?;
        }

        let mut content = lines.join("\n");
        content.push('\n');
        fs::write(&report.toc_path, content).map_err(|e| SplitError::io(&report.toc_path, e))?;
        log::info!("Done writing {}", report.toc_path.display());
        Ok(report)
    }

    fn write_org(
        &self,
        org: &OrgInfo,
        api_dir: &Path,
        lines: &mut Vec<String>,
        report: &mut SplitReport,
    ) -> Result<(), SplitError> {
        let mut prefix = String::new();
        if !org.org_name.is_empty() {
            lines.push(match &org.org_index {
                Some(index) => format!(
                    "# [{}]({})",
                    org.org_name,
                    index_href(self.target_root, index, api_dir)?
                ),
                None => format!("# {}", org.org_name),
            });
            prefix.push('#');
        } else if let (Some(title), Some(index)) = (&org.default_toc_title, &org.org_index) {
            lines.push(format!("# [{title}]({})", index_href(self.target_root, index, api_dir)?));
        }

        for service in &org.services {
            self.write_service(service, &prefix, api_dir, lines, report)?;
        }
        Ok(())
    }

    fn write_service(
        &self,
        service: &ServiceInfo,
        prefix: &str,
        api_dir: &Path,
        lines: &mut Vec<String>,
        report: &mut SplitReport,
    ) -> Result<(), SplitError> {
        log::info!("Created conceptual toc item '{}'", service.toc_title);
        lines.push(match &service.index_file {
            Some(index) => format!(
                "{prefix}# [{}]({})",
                service.toc_title,
                index_href(self.target_root, index, api_dir)?
            ),
            None => format!("{prefix}# {}", service.toc_title),
        });

        let sub_tocs = if service.swagger_info.is_empty() {
            None
        } else {
            let options = service.effective_options(&self.mapping.split);
            Some(self.split_swaggers(service, &options, api_dir, report)?)
        };

        let mut conceptual_written = false;
        if let Some(toc_file) = &service.toc_file {
            let items = conceptual::read_toc_items(self.target_root, toc_file, api_dir)?;
            for item in &items {
                lines.push(format!("{prefix}#{item}"));
            }
            if !items.is_empty() {
                conceptual_written = true;
                log::info!(
                    "-- Created sub referenced toc items under conceptual toc item '{}'",
                    service.toc_title
                );
            }
        }

        if let Some(sub_tocs) = sub_tocs {
            write_reference_toc(&sub_tocs, prefix, conceptual_written, lines);
        }
        Ok(())
    }

    fn split_swaggers(
        &self,
        service: &ServiceInfo,
        options: &SplitOptions,
        api_dir: &Path,
        report: &mut SplitReport,
    ) -> Result<SubTocs, SplitError> {
        let target_dir = api_dir.join(&service.url_group);
        fs::create_dir_all(&target_dir).map_err(|e| SplitError::io(&target_dir, e))?;
        let diagnostics = self
            .mapping
            .diagnostics_file
            .as_ref()
            .map(|file| self.target_root.join(file));

        let mut sub_tocs = SubTocs::new();
        for swagger in &service.swagger_info {
            let source = self.source_root.join(swagger.source.trim_end());
            let context = DocumentContext {
                service_id: Some(service.service_id().to_string()),
                service_name: Some(service.toc_title.clone()),
                sub_group_name: swagger.sub_group_toc_title.clone(),
            };
            let info = helper::split(
                &source,
                SplitRequest {
                    target_dir: &target_dir,
                    swagger,
                    options,
                    context,
                    ref_resolver: self.ref_resolver,
                    paths_expander: self.paths_expander,
                    diagnostics_file: diagnostics.as_deref(),
                },
            )?;

            let toc_title = display_name(&info.toc_title, &options.no_split_words);
            let sub_group = swagger.sub_group_toc_title.clone().unwrap_or_default();
            let entries = sub_tocs.entry(sub_group).or_default();

            for file_info in &info.file_name_infos {
                let title = file_info.toc_name();
                if entries.iter().any(|toc| toc.title == title) {
                    return Err(SplitError::collision(format!(
                        "sub toc '{title}' under '{toc_title}' has already been added into {TOC_FILE_NAME} from '{}'",
                        swagger.source
                    )));
                }
                let children = file_info
                    .children()
                    .iter()
                    .map(|child| SwaggerToc {
                        title: child.toc_name.clone(),
                        file_path: join_link(&service.url_group, &child.file_name),
                        children: Vec::new(),
                    })
                    .collect();
                entries.push(SwaggerToc {
                    title: title.to_string(),
                    file_path: join_link(&service.url_group, &file_info.file().file_name),
                    children,
                });
            }

            log::info!(
                "Done splitting swagger file from '{}' to '{}'",
                swagger.source,
                service.url_group
            );
            report.rest_file_infos.push(info);
        }
        Ok(sub_tocs)
    }
}

/// Emit the generated part of a service's outline.
fn write_reference_toc(sub_tocs: &SubTocs, prefix: &str, after_conceptual: bool, lines: &mut Vec<String>) {
    let mut reference_prefix = String::new();
    if after_conceptual {
        reference_prefix.push('#');
        lines.push(format!("{prefix}#{reference_prefix} Reference"));
    }

    for (sub_group, entries) in sub_tocs {
        let mut group_prefix = reference_prefix.clone();
        if !sub_group.is_empty() {
            group_prefix.push('#');
            lines.push(format!("{prefix}#{group_prefix} {sub_group}"));
        }

        let mut entries: Vec<&SwaggerToc> = entries.iter().collect();
        entries.sort_by(|a, b| a.title.cmp(&b.title));
        for entry in entries {
            lines.push(format!("{prefix}##{group_prefix} [{}]({})", entry.title, entry.file_path));
            for child in &entry.children {
                lines.push(format!("{prefix}###{group_prefix} [{}]({})", child.title, child.file_path));
            }
        }
    }
}

/// Organizations by name and their services by title, both ordinal and stable.
fn sorted_orgs(orgs: &[OrgInfo]) -> Vec<OrgInfo> {
    let mut orgs = orgs.to_vec();
    orgs.sort_by(|a, b| a.org_name.cmp(&b.org_name));
    for org in &mut orgs {
        org.services.sort_by(|a, b| a.toc_title.cmp(&b.toc_title));
    }
    orgs
}

/// Recreate the api output directory from scratch.
fn prepare_api_dir(api_dir: &Path) -> Result<PathBuf, SplitError> {
    if api_dir.exists() {
        fs::remove_dir_all(api_dir).map_err(|e| SplitError::io(api_dir, e))?;
        log::info!("Done cleaning previous existing {}", api_dir.display());
    }
    fs::create_dir_all(api_dir).map_err(|e| SplitError::io(api_dir, e))?;
    Ok(api_dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(title: &str) -> ServiceInfo {
        ServiceInfo {
            toc_title: title.to_string(),
            ..ServiceInfo::default()
        }
    }

    #[test]
    fn test_sorted_orgs_is_ordinal_and_stable() {
        let orgs = vec![
            OrgInfo {
                org_name: "beta".to_string(),
                services: vec![service("b"), service("B"), service("a")],
                ..OrgInfo::default()
            },
            OrgInfo {
                org_name: "Alpha".to_string(),
                org_index: Some("first".to_string()),
                ..OrgInfo::default()
            },
            OrgInfo {
                org_name: "Alpha".to_string(),
                ..OrgInfo::default()
            },
        ];
        let sorted = sorted_orgs(&orgs);
        let names: Vec<_> = sorted.iter().map(|o| o.org_name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Alpha", "beta"]);
        assert_eq!(sorted[0].org_index.as_deref(), Some("first"));
        let services: Vec<_> = sorted[2].services.iter().map(|s| s.toc_title.as_str()).collect();
        assert_eq!(services, vec!["B", "a", "b"]);
    }

    #[test]
    fn test_reference_toc_levels() {
        let mut sub_tocs = SubTocs::new();
        sub_tocs.insert(
            String::new(),
            vec![
                SwaggerToc {
                    title: "Zebras".to_string(),
                    file_path: "zoo/Zebras.json".to_string(),
                    children: Vec::new(),
                },
                SwaggerToc {
                    title: "Pets".to_string(),
                    file_path: "zoo/Pets.json".to_string(),
                    children: vec![SwaggerToc {
                        title: "Create".to_string(),
                        file_path: "zoo/Pets/Create.json".to_string(),
                        children: Vec::new(),
                    }],
                },
            ],
        );
        sub_tocs.insert(
            "Management".to_string(),
            vec![SwaggerToc {
                title: "Keepers".to_string(),
                file_path: "zoo/Keepers.json".to_string(),
                children: Vec::new(),
            }],
        );

        let mut lines = Vec::new();
        write_reference_toc(&sub_tocs, "#", true, &mut lines);
        assert_eq!(
            lines,
            vec![
                "### Reference",
                "#### [Pets](zoo/Pets.json)",
                "##### [Create](zoo/Pets/Create.json)",
                "#### [Zebras](zoo/Zebras.json)",
                "#### Management",
                "##### [Keepers](zoo/Keepers.json)",
            ]
        );
    }
}

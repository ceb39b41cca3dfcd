use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use indexmap::IndexMap;
use serde_json::{Value, json};

use oas_split_core::casing::display_name;
use oas_split_core::config;
use oas_split_core::document::Document;
use oas_split_core::split::OperationGrouper;
use oas_split_core::split::grouping::{operation_id, operations};
use oas_split_core::{FileNameInfo, SplitReport, TocSynthesizer};

#[derive(Parser)]
#[command(
    name = "oas-split",
    about = "Split OpenAPI documents into per-operation-group files",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split every document of a mapping file and write the outline
    Split {
        /// Directory the mapping's source paths are relative to
        #[arg(short, long)]
        source: PathBuf,

        /// Directory receiving the api output and holding index/toc files
        #[arg(short, long)]
        target: PathBuf,

        /// Organization mapping file (YAML or JSON)
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Show how the operations of one document are grouped
    Groups {
        /// Path to the OpenAPI document (YAML or JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Output format
        #[arg(long, default_value = "yaml")]
        format: GroupsFormat,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Clone, ValueEnum)]
enum GroupsFormat {
    Yaml,
    Json,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Split {
            source,
            target,
            config,
        } => cmd_split(&source, &target, &config),

        Commands::Groups { input, format } => cmd_groups(&input, format),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "oas-split", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn cmd_split(source: &Path, target: &Path, config_path: &Path) -> Result<()> {
    let mapping = config::load_config(config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;

    let report = TocSynthesizer::new(source, target, &mapping)
        .run()
        .with_context(|| format!("failed to split documents from {}", source.display()))?;

    print_summary(&report);
    Ok(())
}

fn print_summary(report: &SplitReport) {
    let mut groups = 0;
    let mut files = 0;
    for info in &report.rest_file_infos {
        for file_info in &info.file_name_infos {
            groups += 1;
            files += 1 + file_info.children().len();
            if let FileNameInfo::Parent { children, .. } = file_info {
                log::debug!(
                    "{} / {}: split into {} operations",
                    info.toc_title,
                    file_info.toc_name(),
                    children.len()
                );
            }
        }
    }
    eprintln!(
        "Split {} documents into {groups} groups ({files} files)",
        report.rest_file_infos.len()
    );
    eprintln!("  wrote {}", report.toc_path.display());
}

fn cmd_groups(input: &Path, format: GroupsFormat) -> Result<()> {
    let document = Document::load(input)?;
    let summary = build_groups_summary(&document)?;

    match format {
        GroupsFormat::Yaml => {
            let yaml = serde_yaml_ng::to_string(&summary)?;
            print!("{yaml}");
        }
        GroupsFormat::Json => {
            let json = serde_json::to_string_pretty(&summary)?;
            println!("{json}");
        }
    }

    Ok(())
}

fn build_groups_summary(document: &Document) -> Result<Value> {
    let no_mapping = IndexMap::new();
    let grouper = OperationGrouper::new(&no_mapping);
    let mut groups: IndexMap<String, Vec<Value>> = IndexMap::new();

    let paths = document.paths()?;
    for (path, item) in &paths {
        for (method, operation) in operations(path, item)? {
            let id = operation_id(path, method, operation)?;
            let (group, name) = grouper.split_operation_id(&id);
            groups.entry(group).or_default().push(json!({
                "name": name,
                "operationId": id,
                "method": method,
                "path": path,
                "line": document.lines.get(&id),
            }));
        }
    }

    let groups: Vec<Value> = groups
        .into_iter()
        .map(|(group, operations)| {
            json!({
                "group": group,
                "title": display_name(&group, &[]),
                "operations": operations,
            })
        })
        .collect();

    Ok(json!({
        "title": document.info_title()?,
        "version": document.info_version(),
        "groups": groups,
    }))
}

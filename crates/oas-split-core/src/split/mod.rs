//! Partitioning of a document's path map into per-group (and per-operation) files.

pub mod engine;
pub mod grouping;

use std::path::PathBuf;

pub use engine::{DocumentContext, SplitEngine, should_split_to_operation};
pub use grouping::OperationGrouper;

/// Value of `x-internal-split-type` on a group file that was split into operations.
pub const SPLIT_TYPE_OPERATION_GROUP: &str = "OperationGroup";
/// Value of `x-internal-split-type` on a per-operation file.
pub const SPLIT_TYPE_OPERATION: &str = "Operation";

/// One emitted file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitFile {
    /// Title shown in the navigation outline.
    pub toc_name: String,
    /// Path relative to the output directory of the document, `/`-separated.
    pub file_name: String,
    pub path: PathBuf,
    pub version: Option<String>,
}

/// Result of emitting one operation group.
///
/// A group is either written as a single file, or split into one file per
/// operation plus a parent file listing them. Children are never split further.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileNameInfo {
    Leaf(SplitFile),
    Parent {
        file: SplitFile,
        children: Vec<SplitFile>,
    },
}

impl FileNameInfo {
    pub fn file(&self) -> &SplitFile {
        match self {
            FileNameInfo::Leaf(file) | FileNameInfo::Parent { file, .. } => file,
        }
    }

    pub fn toc_name(&self) -> &str {
        &self.file().toc_name
    }

    pub fn children(&self) -> &[SplitFile] {
        match self {
            FileNameInfo::Leaf(_) => &[],
            FileNameInfo::Parent { children, .. } => children,
        }
    }
}

//! Merging of hand-authored `toc.md` fragments into the generated outline.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::TOC_FILE_NAME;
use super::links::{join_link, relative_path};
use crate::error::SplitError;

static TOC_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<level>#+)[ \t]*\[(?P<title>.+)\]\((?P<link>.*?)\)[ \t]*#*[ \t]*$").unwrap()
});

/// Read a conceptual toc and rewrite its links relative to `api_dir`.
///
/// Heading lines `#..# [Title](link)` get their link re-rooted and checked
/// for existence. Lines with an empty or absolute link, and lines that are
/// not headings, come back unchanged. Empty lines are dropped.
pub fn read_toc_items(
    target_root: &Path,
    toc_relative_path: &str,
    api_dir: &Path,
) -> Result<Vec<String>, SplitError> {
    let toc_path = target_root.join(toc_relative_path);
    if !toc_path.is_file() {
        return Err(SplitError::SchemaViolation(format!(
            "toc file '{toc_relative_path}' does not exist"
        )));
    }
    let is_toc = toc_path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.eq_ignore_ascii_case(TOC_FILE_NAME));
    if !is_toc {
        return Err(SplitError::SchemaViolation(format!(
            "only '{TOC_FILE_NAME}' is supported as conceptual toc, please update the toc path '{toc_relative_path}'"
        )));
    }

    let toc_dir = toc_path.parent().unwrap_or(target_root);
    let toc_dir_from_api = relative_path(toc_dir, api_dir);
    let content = fs::read_to_string(&toc_path).map_err(|e| SplitError::io(&toc_path, e))?;

    let mut items = Vec::new();
    for line in content.lines().filter(|l| !l.is_empty()) {
        items.push(rewrite_line(line, &toc_dir_from_api, api_dir, toc_relative_path)?);
    }
    Ok(items)
}

fn rewrite_line(
    line: &str,
    toc_dir_from_api: &str,
    api_dir: &Path,
    toc_relative_path: &str,
) -> Result<String, SplitError> {
    let Some(caps) = TOC_LINE.captures(line) else {
        return Ok(line.to_string());
    };
    let link = &caps["link"];
    if link.is_empty() || link.starts_with("http://") || link.starts_with("https://") {
        return Ok(line.to_string());
    }

    let link_from_api = join_link(toc_dir_from_api, link);
    if !api_dir.join(&link_from_api).is_file() {
        return Err(SplitError::LinkNotFound {
            link: link_from_api,
            toc: toc_relative_path.to_string(),
        });
    }
    Ok(format!("{} [{}]({link_from_api})", &caps["level"], &caps["title"]))
}

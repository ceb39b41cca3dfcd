use std::path::{Component, Path, PathBuf};

use crate::error::SplitError;

/// Lexically resolve `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !result.pop() {
                    result.push("..");
                }
            }
            other => result.push(other.as_os_str()),
        }
    }
    result
}

/// `/`-separated path of `target` as seen from the directory `base_dir`.
pub fn relative_path(target: &Path, base_dir: &Path) -> String {
    let target = normalize(target);
    let base = normalize(base_dir);
    let target: Vec<_> = target.components().collect();
    let base: Vec<_> = base.components().collect();

    let common = target
        .iter()
        .zip(&base)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = vec!["..".to_string(); base.len() - common];
    parts.extend(
        target[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    parts.join("/")
}

/// Join outline path segments with `/`, skipping empty ones.
pub fn join_link(dir: &str, file: &str) -> String {
    let dir = dir.trim_end_matches(['/', '\\']);
    if dir.is_empty() {
        file.replace('\\', "/")
    } else {
        format!("{dir}/{file}").replace('\\', "/")
    }
}

/// Link from the api directory to an index file below the target root.
pub fn index_href(target_root: &Path, index: &str, api_dir: &Path) -> Result<String, SplitError> {
    let index_path = target_root.join(index);
    if !index_path.is_file() {
        return Err(SplitError::MissingInput(format!(
            "index file '{}' does not exist",
            index_path.display()
        )));
    }
    Ok(relative_path(&index_path, api_dir))
}

use std::fs;
use std::path::{Path, PathBuf};

use snafu::prelude::*;

use crate::norm::*;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Joins a path relative to the directory of a configuration file.
pub fn resolve_path(root_p: &Path, file_path: &str) -> String {
    let p: PathBuf = [root_p, Path::new(file_path)].iter().collect();
    p.as_path().display().to_string()
}

/// All the files under a directory, recursively, in path order.
/// Hidden files and directories are skipped.
pub fn list_files(dir: &Path) -> ElnormResult<Vec<PathBuf>> {
    let mut res: Vec<PathBuf> = Vec::new();
    collect_files(dir, &mut res)?;
    res.sort();
    Ok(res)
}

fn collect_files(dir: &Path, res: &mut Vec<PathBuf>) -> ElnormResult<()> {
    let path = dir.display().to_string();
    let entries = fs::read_dir(dir).context(OpeningFileSnafu { path: path.clone() })?;
    for entry in entries {
        let entry = entry.context(OpeningFileSnafu { path: path.clone() })?;
        let p = entry.path();
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        if p.is_dir() {
            collect_files(&p, res)?;
        } else {
            res.push(p);
        }
    }
    Ok(())
}

use crate::error::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Regular files directly inside `dir` whose extension matches
/// `extension` (case-insensitive), sorted by path.
///
/// The order is only for stable output; nothing downstream relies on it.
pub fn discover(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for e in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
    {
        let e = e?;
        if !e.file_type().is_file() {
            continue;
        }
        let matches = e
            .path()
            .extension()
            .and_then(|x| x.to_str())
            .is_some_and(|x| x.eq_ignore_ascii_case(extension));
        if matches {
            out.push(e.into_path());
        }
    }
    out.sort();
    Ok(out)
}

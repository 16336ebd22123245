use std::path::{Component, Path, PathBuf};

/// Normalize `path` without touching the filesystem.
///
/// `.` segments vanish and `..` pops the previous segment. Returns `None`
/// when the path would climb above the repository root.
pub fn normalize_lexically(path: &Path) -> Option<PathBuf> {
    let mut out: Vec<&std::ffi::OsStr> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop()?;
            }
            Component::Normal(segment) => out.push(segment),
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(out.iter().collect())
}

/// Directory containing `file`, or the empty path for top-level files.
pub fn parent_dir(file: &Path) -> PathBuf {
    file.parent().map(Path::to_path_buf).unwrap_or_default()
}

/// Walk `levels` directories up from `dir`. Fails above the root.
pub fn ascend(dir: &Path, levels: usize) -> Option<PathBuf> {
    let mut current = dir.to_path_buf();
    for _ in 0..levels {
        if current.as_os_str().is_empty() {
            return None;
        }
        current = parent_dir(&current);
    }
    Some(current)
}

/// Join `segments` below `base`, skipping empty ones.
pub fn join_segments<'a>(base: &Path, segments: impl IntoIterator<Item = &'a str>) -> PathBuf {
    let mut path = base.to_path_buf();
    for segment in segments {
        if !segment.is_empty() {
            path.push(segment);
        }
    }
    path
}

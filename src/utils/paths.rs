use std::path::{Component, Path, PathBuf};

/// Lexically normalise a source path so the same file always maps to the
/// same key: drops `.` components, folds `dir/..`, collapses repeated
/// separators. Does not touch the filesystem, so it works for paths whose
/// file has since been removed.
pub fn normalize_path(path: &str) -> String {
    let mut out = PathBuf::new();

    for component in Path::new(path.trim()).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `/..` is still `/`
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }

    if out.as_os_str().is_empty() {
        return ".".to_string();
    }
    out.to_string_lossy().into_owned()
}

/// Derive a document title from its file name: `quick_brown_fox.txt` -> `quick brown fox`
pub fn title_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().replace('_', " "))
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

//! The ordered directory list the filesystem loader searches.

use std::path::{Component, Path, PathBuf};

/// Build the search path list for one evaluation.
///
/// Order is precedence, first match wins: the working directory, then each
/// library directory resolved against the entry file's directory, then each
/// library directory resolved against the working directory. Absolute
/// library directories appear verbatim in both halves.
pub fn search_paths(working_dir: &Path, entry_dir: &Path, jsonnet_paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut paths = Vec::with_capacity(jsonnet_paths.len() * 2 + 1);
    paths.push(normalize(working_dir));
    paths.extend(jsonnet_paths.iter().map(|dir| resolve(entry_dir, dir)));
    paths.extend(jsonnet_paths.iter().map(|dir| resolve(working_dir, dir)));
    paths
}

fn resolve(base: &Path, dir: &Path) -> PathBuf {
    if dir.is_absolute() {
        normalize(dir)
    } else {
        normalize(&base.join(dir))
    }
}

/// Remove `.` and `..` components without touching the filesystem.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn paths(items: &[&str]) -> Vec<PathBuf> {
        items.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_order_without_library_dirs() {
        let result = search_paths(Path::new("/work"), Path::new("/project"), &[]);
        assert_eq!(result, paths(&["/work"]));
    }

    #[test]
    fn test_order_entry_relative_before_working_relative() {
        let result = search_paths(
            Path::new("/work"),
            Path::new("/project/env"),
            &paths(&["lib", "../vendor"]),
        );
        assert_eq!(
            result,
            paths(&[
                "/work",
                "/project/env/lib",
                "/project/vendor",
                "/work/lib",
                "/vendor",
            ])
        );
    }

    #[test]
    fn test_absolute_dirs_kept_in_both_halves() {
        let result = search_paths(Path::new("/work"), Path::new("/project"), &paths(&["/opt/lib"]));
        assert_eq!(result, paths(&["/work", "/opt/lib", "/opt/lib"]));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("/../x")), PathBuf::from("/x"));
        assert_eq!(normalize(Path::new("../x/./y")), PathBuf::from("../x/y"));
        assert_eq!(normalize(Path::new("a/../../b")), PathBuf::from("../b"));
    }
}

//! Input path resolution: directory expansion by file-name suffix and the
//! directory-name conventions used to name outputs.

use crate::bed::{BedError, Result};
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Suffix identifying parsed mutation files.
pub const MUTATIONS_SUFFIX: &str = "mutations.bed";

/// Expand a mix of files and directories into a sorted, de-duplicated list of
/// absolute file paths. Directories are searched recursively for files whose
/// name ends with `suffix`; explicitly named files are taken as-is.
pub fn collect_files_with_suffix<P: AsRef<Path>>(paths: &[P], suffix: &str) -> Result<Vec<PathBuf>> {
    let mut found = BTreeSet::new();
    for path in paths {
        let path = path.as_ref();
        if path.is_dir() {
            found.extend(files_in_directory(path, suffix, true)?);
        } else {
            found.insert(std::path::absolute(path)?);
        }
    }
    Ok(found.into_iter().collect())
}

/// Files in `dir` whose name ends with `suffix`, sorted by path.
pub fn files_in_directory(dir: &Path, suffix: &str, recursive: bool) -> Result<Vec<PathBuf>> {
    let mut walker = WalkDir::new(dir).sort_by_file_name();
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(io::Error::from)?;
        if entry.file_type().is_file() && entry.file_name().to_string_lossy().ends_with(suffix) {
            files.push(std::path::absolute(entry.path())?);
        }
    }
    Ok(files)
}

/// Final component of a directory path.
pub fn dir_name(dir: &Path) -> Result<String> {
    let dir = std::path::absolute(dir)?;
    dir.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| BedError::InputShape(format!("'{}' has no directory name", dir.display())))
}

/// Name of the directory containing `path`.
pub fn isolated_parent_dir(path: &Path) -> Result<String> {
    let path = std::path::absolute(path)?;
    match path.parent() {
        Some(parent) => dir_name(parent),
        None => Err(BedError::InputShape(format!(
            "'{}' has no parent directory",
            path.display()
        ))),
    }
}

/// Absolute directory containing `path`.
pub fn parent_dir(path: &Path) -> Result<PathBuf> {
    let path = std::path::absolute(path)?;
    path.parent().map(Path::to_path_buf).ok_or_else(|| {
        BedError::InputShape(format!("'{}' has no parent directory", path.display()))
    })
}

/// Resolve nucleosome map arguments to map names: a directory contributes its
/// own name, a file the name of its directory. Sorted and de-duplicated.
pub fn nucleosome_map_names<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<String>> {
    let mut names = BTreeSet::new();
    for path in paths {
        let path = path.as_ref();
        let name = if path.is_dir() {
            dir_name(path)?
        } else {
            isolated_parent_dir(path)?
        };
        names.insert(name);
    }
    Ok(names.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_collect_files_with_suffix() {
        let root = tempdir().unwrap();
        let nested = root.path().join("group_a");
        fs::create_dir(&nested).unwrap();
        fs::write(root.path().join("x_singlenuc_context_mutations.bed"), "").unwrap();
        fs::write(nested.join("y_trinuc_context_mutations.bed"), "").unwrap();
        fs::write(nested.join("y_trinuc_context.bed"), "").unwrap();

        let explicit = root.path().join("x_singlenuc_context_mutations.bed");
        let files =
            collect_files_with_suffix(&[root.path().to_path_buf(), explicit], MUTATIONS_SUFFIX)
                .unwrap();

        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.to_string_lossy().ends_with(MUTATIONS_SUFFIX)));
    }

    #[test]
    fn test_files_in_directory_non_recursive() {
        let root = tempdir().unwrap();
        let nested = root.path().join("deeper");
        fs::create_dir(&nested).unwrap();
        fs::write(root.path().join("bg_mutations.bed"), "").unwrap();
        fs::write(nested.join("other_mutations.bed"), "").unwrap();

        let shallow = files_in_directory(root.path(), MUTATIONS_SUFFIX, false).unwrap();
        assert_eq!(shallow.len(), 1);
        let deep = files_in_directory(root.path(), MUTATIONS_SUFFIX, true).unwrap();
        assert_eq!(deep.len(), 2);
    }

    #[test]
    fn test_isolated_parent_dir() {
        let root = tempdir().unwrap();
        let group = root.path().join("Kucab_2019");
        fs::create_dir(&group).unwrap();
        let file = group.join("subs_final.txt");

        assert_eq!(isolated_parent_dir(&file).unwrap(), "Kucab_2019");
        assert_eq!(dir_name(&group).unwrap(), "Kucab_2019");
        assert_eq!(parent_dir(&file).unwrap(), group);
    }

    #[test]
    fn test_nucleosome_map_names() {
        let root = tempdir().unwrap();
        let map_dir = root.path().join("hg19_MNase_nuc_map");
        fs::create_dir(&map_dir).unwrap();
        let map_file = map_dir.join("hg19_MNase_nuc_map.bed");
        fs::write(&map_file, "").unwrap();

        let names = nucleosome_map_names(&[map_dir.clone(), map_file]).unwrap();
        assert_eq!(names, vec!["hg19_MNase_nuc_map".to_string()]);
    }
}

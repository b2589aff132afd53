// THEORY:
// Discovery is the only stage that touches the directory structure. It walks the
// input root once and emits one `DiscoveredFile` per regular file, carrying the
// full path, the containing directory and the bare name together so that later
// stages never have to keep parallel lists in step. No filtering by extension
// happens here: whether a file is an image is for the probe to decide.
//
// Entries are visited in file-name order within each directory so that two runs
// over the same tree see the same sequence. Symlinks are not followed.

use crate::core_modules::policy::{ErrorPolicy, FileFailure, Stage};
use crate::core_modules::record::DiscoveredFile;
use crate::error::{Result, SieveError};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Walks `root` recursively and returns every regular file beneath it.
///
/// A root that is missing or unreadable is always fatal. A nested directory that
/// cannot be read is handled according to `policy`.
pub fn discover(
    root: &Path,
    policy: ErrorPolicy,
) -> Result<(Vec<DiscoveredFile>, Vec<FileFailure>)> {
    fs::read_dir(root).map_err(|source| SieveError::UnreadableRoot {
        path: root.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    let mut failures = Vec::new();

    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name();

    for entry in walker {
        match entry {
            Ok(entry) if entry.file_type().is_file() => {
                let path = entry.path();
                let dir = path.parent().unwrap_or(root).to_path_buf();
                files.push(DiscoveredFile::new(
                    path.to_path_buf(),
                    dir,
                    entry.file_name().to_os_string(),
                ));
            }
            Ok(_) => {}
            Err(source) => {
                let path = source.path().unwrap_or(root).to_path_buf();
                let error = SieveError::Walk {
                    path: path.clone(),
                    source,
                };
                policy.absorb(error, &path, Stage::Walk, &mut failures)?;
            }
        }
    }

    tracing::debug!(root = %root.display(), files = files.len(), "walk complete");
    Ok((files, failures))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::test_support::{write_bytes, write_image};
    use tempfile::TempDir;

    #[test]
    fn finds_every_regular_file_recursively() {
        let tmp = TempDir::new().unwrap();
        write_image(tmp.path(), "a/b/img1.png", 4, 3);
        write_bytes(tmp.path(), "c/notes.txt", b"not an image");
        write_image(tmp.path(), "top.png", 4, 3);
        fs::create_dir_all(tmp.path().join("empty/nested")).unwrap();

        let (files, failures) = discover(tmp.path(), ErrorPolicy::Abort).unwrap();

        assert!(failures.is_empty());
        let names: Vec<_> = files.iter().map(|f| f.name.to_string_lossy().into_owned()).collect();
        assert_eq!(names, vec!["img1.png", "notes.txt", "top.png"]);
    }

    #[test]
    fn descriptors_stay_consistent() {
        let tmp = TempDir::new().unwrap();
        write_image(tmp.path(), "a/b/img1.png", 4, 3);
        write_image(tmp.path(), "d/img3.png", 4, 3);

        let (files, _) = discover(tmp.path(), ErrorPolicy::Abort).unwrap();

        for file in &files {
            assert_eq!(file.dir.join(&file.name), file.path);
            assert!(file.relative_dir(tmp.path()).is_some());
        }
        assert_eq!(files[0].relative_dir(tmp.path()), Some(Path::new("a/b")));
    }

    #[test]
    fn missing_root_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("does-not-exist");

        let err = discover(&missing, ErrorPolicy::SkipAndLog).unwrap_err();

        assert!(matches!(err, SieveError::UnreadableRoot { .. }));
    }

    #[test]
    fn a_file_is_not_a_root() {
        let tmp = TempDir::new().unwrap();
        write_bytes(tmp.path(), "plain.txt", b"x");

        let err = discover(&tmp.path().join("plain.txt"), ErrorPolicy::Abort).unwrap_err();

        assert!(matches!(err, SieveError::UnreadableRoot { .. }));
    }
}

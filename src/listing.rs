//! Image list files and directory walks.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::encoding::{self, TextEncoding};
use crate::error::LabelOpsError;

pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "webp"];

/// One non-empty line of an image list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListEntry {
    /// The trimmed line exactly as it appeared in the list.
    pub line: String,
    /// The image path, joined onto the source root when relative.
    pub path: PathBuf,
}

/// An ordered image listing.
#[derive(Clone, Debug, Default)]
pub struct ImageListing {
    pub entries: Vec<ListEntry>,
    /// Decoder that accepted the list file, if it came from disk.
    pub encoding: Option<TextEncoding>,
}

impl ImageListing {
    /// Read a list file. Blank lines are skipped; duplicates are kept.
    pub fn read(list_path: &Path, root: Option<&Path>) -> Result<Self, LabelOpsError> {
        if !list_path.is_file() {
            return Err(LabelOpsError::ListNotFound {
                path: list_path.to_path_buf(),
            });
        }

        let decoded = encoding::read_text(list_path)?;
        let mut listing = Self::from_text(&decoded.text, root);
        listing.encoding = Some(decoded.encoding);
        Ok(listing)
    }

    /// Build a listing from already-decoded list text.
    pub fn from_text(text: &str, root: Option<&Path>) -> Self {
        let entries = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| ListEntry {
                line: line.to_string(),
                path: resolve_entry_path(line, root),
            })
            .collect();

        Self {
            entries,
            encoding: None,
        }
    }

    /// Build a listing from image files found on disk.
    pub fn from_paths(paths: Vec<PathBuf>) -> Self {
        let entries = paths
            .into_iter()
            .map(|path| ListEntry {
                line: path.to_string_lossy().into_owned(),
                path,
            })
            .collect();

        Self {
            entries,
            encoding: None,
        }
    }

    /// Drop repeated lines, keeping the first occurrence of each.
    pub fn dedup_first_seen(mut self) -> Self {
        let mut seen = HashSet::new();
        self.entries.retain(|entry| seen.insert(entry.path.clone()));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn resolve_entry_path(line: &str, root: Option<&Path>) -> PathBuf {
    let path = PathBuf::from(line);
    match root {
        Some(root) if path.is_relative() => root.join(path),
        _ => path,
    }
}

/// Recursively collect image files under `dir`, sorted by path.
pub fn walk_images(dir: &Path) -> Result<Vec<PathBuf>, LabelOpsError> {
    if !dir.is_dir() {
        return Err(LabelOpsError::InputDirNotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry.map_err(|source| LabelOpsError::Walk {
            path: dir.to_path_buf(),
            message: source.to_string(),
        })?;

        if entry.file_type().is_file() && has_extension(entry.path(), &IMAGE_EXTENSIONS) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

pub(crate) fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };

    allowed
        .iter()
        .any(|allowed_ext| ext.eq_ignore_ascii_case(allowed_ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn from_text_trims_and_skips_blank_lines() {
        let listing = ImageListing::from_text("  a/x.jpg \n\n\t\nb/y.jpg\r\n", None);
        let lines: Vec<&str> = listing.entries.iter().map(|e| e.line.as_str()).collect();
        assert_eq!(lines, vec!["a/x.jpg", "b/y.jpg"]);
    }

    #[test]
    fn relative_entries_join_the_root() {
        let listing = ImageListing::from_text("a/x.jpg\n/abs/y.jpg\n", Some(Path::new("/data")));
        assert_eq!(listing.entries[0].path, PathBuf::from("/data/a/x.jpg"));
        assert_eq!(listing.entries[0].line, "a/x.jpg");
        assert_eq!(listing.entries[1].path, PathBuf::from("/abs/y.jpg"));
    }

    #[test]
    fn dedup_keeps_first_seen_order() {
        let listing = ImageListing::from_text("b.jpg\na.jpg\nb.jpg\nc.jpg\na.jpg\n", None);
        assert_eq!(listing.len(), 5);

        let folded = listing.dedup_first_seen();
        let lines: Vec<&str> = folded.entries.iter().map(|e| e.line.as_str()).collect();
        assert_eq!(lines, vec!["b.jpg", "a.jpg", "c.jpg"]);
    }

    #[test]
    fn read_missing_list_is_input_not_found() {
        let err = ImageListing::read(Path::new("/no/such/list.txt"), None).unwrap_err();
        assert!(matches!(err, LabelOpsError::ListNotFound { .. }));
    }

    #[test]
    fn read_euc_kr_list() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let list = temp.path().join("list.txt");
        // "한글.jpg" in EUC-KR.
        let mut bytes = vec![0xC7, 0xD1, 0xB1, 0xDB];
        bytes.extend_from_slice(b".jpg\n");
        fs::write(&list, bytes).expect("write list");

        let listing = ImageListing::read(&list, None).expect("read list");
        assert_eq!(listing.encoding, Some(TextEncoding::EucKr));
        assert_eq!(listing.entries[0].line, "한글.jpg");
    }

    #[test]
    fn walk_images_filters_and_sorts() {
        let temp = tempfile::tempdir().expect("create temp dir");
        fs::create_dir_all(temp.path().join("sub")).expect("create sub dir");
        fs::write(temp.path().join("sub/b.JPG"), b"x").expect("write image");
        fs::write(temp.path().join("a.png"), b"x").expect("write image");
        fs::write(temp.path().join("a.txt"), b"x").expect("write label");

        let files = walk_images(temp.path()).expect("walk");
        assert_eq!(
            files,
            vec![temp.path().join("a.png"), temp.path().join("sub/b.JPG")]
        );
    }

    #[test]
    fn walk_missing_dir_fails() {
        let err = walk_images(Path::new("/no/such/dir")).unwrap_err();
        assert!(matches!(err, LabelOpsError::InputDirNotFound { .. }));
    }
}

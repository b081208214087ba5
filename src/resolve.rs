//! Image path → label path resolution.
//!
//! Datasets follow the `JPEGImages/NAME.jpg` ↔ `labels/NAME.txt` sibling
//! convention, but list files are often produced on Windows, so segment
//! matching accepts both `/` and `\` separators regardless of the host.

use std::path::{Path, PathBuf};

pub const IMAGE_DIR_SEGMENT: &str = "JPEGImages";
pub const LABEL_DIR_SEGMENT: &str = "labels";
pub const CORRECTED_LABEL_DIR_SEGMENT: &str = "labels_Correct";
pub const LABEL_EXTENSION: &str = "txt";

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// Candidate label paths for `image`, in lookup order.
///
/// 1. `<dir>/<stem>.txt` next to the image.
/// 2. `JPEGImages` → `labels`, extension → `.txt` (only when the path has a
///    `JPEGImages` directory segment).
/// 3. `JPEGImages` → `labels_Correct`, when `include_corrected` is set.
pub fn label_candidates(image: &Path, include_corrected: bool) -> Vec<PathBuf> {
    let raw = path_text(image);
    let mut candidates = vec![PathBuf::from(with_label_extension(&raw))];

    if let Some(swapped) = replace_dir_segment(&raw, IMAGE_DIR_SEGMENT, LABEL_DIR_SEGMENT) {
        candidates.push(PathBuf::from(with_label_extension(&swapped)));

        if include_corrected {
            if let Some(corrected) =
                replace_dir_segment(&raw, IMAGE_DIR_SEGMENT, CORRECTED_LABEL_DIR_SEGMENT)
            {
                candidates.push(PathBuf::from(with_label_extension(&corrected)));
            }
        }
    }

    candidates
}

/// The first candidate label path that exists as a file.
pub fn resolve_label_path(image: &Path, include_corrected: bool) -> Option<PathBuf> {
    label_candidates(image, include_corrected)
        .into_iter()
        .find(|candidate| candidate.is_file())
}

/// The conventional label location for `image`, whether or not it exists.
///
/// This is the `labels/` sibling when the image lives under `JPEGImages/`,
/// otherwise the `.txt` next to the image.
pub fn expected_label_path(image: &Path) -> PathBuf {
    let raw = path_text(image);
    let base = replace_dir_segment(&raw, IMAGE_DIR_SEGMENT, LABEL_DIR_SEGMENT).unwrap_or(raw);
    PathBuf::from(with_label_extension(&base))
}

/// Does the path contain `segment` as a directory component?
pub fn has_dir_segment(path: &Path, segment: &str) -> bool {
    replace_dir_segment(&path_text(path), segment, segment).is_some()
}

fn path_text(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Replace every directory segment equal to `from` with `to`, keeping the
/// original separators. The final (file name) component is never touched.
/// Returns `None` when no segment matched.
fn replace_dir_segment(path: &str, from: &str, to: &str) -> Option<String> {
    let mut out = String::with_capacity(path.len() + to.len());
    let mut matched = false;

    for piece in path.split_inclusive(is_separator) {
        match piece.char_indices().last() {
            Some((idx, sep)) if is_separator(sep) => {
                if &piece[..idx] == from {
                    out.push_str(to);
                    out.push(sep);
                    matched = true;
                } else {
                    out.push_str(piece);
                }
            }
            _ => out.push_str(piece),
        }
    }

    matched.then_some(out)
}

fn with_label_extension(path: &str) -> String {
    let name_start = path.rfind(is_separator).map(|idx| idx + 1).unwrap_or(0);
    let name = &path[name_start..];

    let stem_end = match name.rfind('.') {
        Some(dot) if dot > 0 => name_start + dot,
        _ => path.len(),
    };

    format!("{}.{}", &path[..stem_end], LABEL_EXTENSION)
}

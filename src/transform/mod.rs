//! Bulk YOLO label transformation.
//!
//! Each label addressed by an image list or a directory walk is read,
//! passed through a [`TransformSpec`], and written either back in place
//! (atomically, with an optional one-time `.bak`) or into a parallel
//! `labels/` tree under a new output root.

mod report;
mod spec;

pub use report::TransformStats;
pub use spec::{parse_class_list, parse_class_mapping, ClassFilter, ShiftSpec, TransformSpec};

use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::LabelOpsError;
use crate::listing::{walk_images, ImageListing};
use crate::progress::RunContext;
use crate::resolve::{resolve_label_path, LABEL_DIR_SEGMENT, LABEL_EXTENSION};
use crate::yolo::{format_label_rows, read_label_file, LabelRow};

pub const SUMMARY_FILE_NAME: &str = "result_summary.txt";
const BACKUP_SUFFIX: &str = ".bak";

/// Where the images to process come from.
#[derive(Clone, Debug)]
pub enum TransformSource {
    /// An image list file; relative lines resolve against `root`.
    List { path: PathBuf, root: Option<PathBuf> },
    /// Every image file under a directory.
    Folder(PathBuf),
}

/// Where transformed labels go.
#[derive(Clone, Debug)]
pub enum TransformTarget {
    /// `<root>/labels/<stem>.txt`; images are not copied.
    OutputRoot(PathBuf),
    /// Overwrite the original label, optionally keeping `<label>.bak`.
    InPlace { backup: bool },
}

/// Options for [`transform_labels`].
#[derive(Clone, Debug)]
pub struct TransformOptions {
    pub source: TransformSource,
    pub target: TransformTarget,
    /// Also look for labels under `labels_Correct/`.
    pub search_corrected: bool,
}

impl TransformOptions {
    /// Directory that receives `result_summary.txt`.
    pub fn summary_dir(&self) -> PathBuf {
        match (&self.target, &self.source) {
            (TransformTarget::OutputRoot(root), _) => root.clone(),
            (TransformTarget::InPlace { .. }, TransformSource::Folder(dir)) => dir.clone(),
            (TransformTarget::InPlace { .. }, TransformSource::List { path, .. }) => path
                .parent()
                .filter(|parent| !parent.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }
}

/// Result of transforming one file's rows.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RowOutcome {
    pub rows: Vec<LabelRow>,
    pub transitions: Vec<(u32, u32)>,
    pub dropped: Vec<u32>,
}

/// Apply `spec` to each row, preserving order.
pub fn transform_rows(spec: &TransformSpec, rows: &[LabelRow]) -> RowOutcome {
    let mut outcome = RowOutcome {
        rows: Vec::with_capacity(rows.len()),
        ..Default::default()
    };

    for row in rows {
        match spec.apply(row.class_id) {
            Some(class_id) => {
                outcome.transitions.push((row.class_id, class_id));
                outcome.rows.push(row.with_class(class_id));
            }
            None => outcome.dropped.push(row.class_id),
        }
    }

    outcome
}

/// Run a transform over every label addressed by `opts.source`.
pub fn transform_labels(
    spec: &TransformSpec,
    opts: &TransformOptions,
    ctx: &mut RunContext,
) -> Result<TransformStats, LabelOpsError> {
    spec.validate()?;

    let listing = match &opts.source {
        TransformSource::List { path, root } => {
            ImageListing::read(path, root.as_deref())?.dedup_first_seen()
        }
        TransformSource::Folder(dir) => ImageListing::from_paths(walk_images(dir)?),
    };

    let labels_dir = match &opts.target {
        TransformTarget::OutputRoot(root) => {
            let dir = root.join(LABEL_DIR_SEGMENT);
            fs::create_dir_all(&dir).map_err(|source| LabelOpsError::Write {
                path: dir.clone(),
                source,
            })?;
            Some(dir)
        }
        TransformTarget::InPlace { .. } => None,
    };

    let mut stats = TransformStats::new(spec.to_string());
    stats.entries = listing.len();

    let mut seen_labels: HashSet<PathBuf> = HashSet::new();
    let mut claimed: HashSet<PathBuf> = HashSet::new();

    ctx.progress.start("label-transform", listing.len());
    for (idx, entry) in listing.entries.iter().enumerate() {
        ctx.checkpoint()?;

        match resolve_label_path(&entry.path, opts.search_corrected) {
            None => {
                log::debug!("no label for {}", entry.path.display());
                stats.files_skipped += 1;
            }
            Some(label_path) if !seen_labels.insert(label_path.clone()) => {
                log::debug!("label {} already handled", label_path.display());
                stats.duplicate_labels += 1;
            }
            Some(label_path) => {
                let destination = match &labels_dir {
                    Some(dir) => Destination::Tree(claim_destination(dir, &label_path, &mut claimed)),
                    None => Destination::InPlace,
                };
                let backup = matches!(opts.target, TransformTarget::InPlace { backup: true });

                if let Err(err) =
                    transform_file(spec, &label_path, &destination, backup, &mut stats)
                {
                    log::warn!("skipping {}: {}", label_path.display(), err);
                    stats.files_failed += 1;
                }
            }
        }

        ctx.progress.advance(idx + 1);
    }
    ctx.progress.finish(listing.len());

    let summary_dir = opts.summary_dir();
    fs::create_dir_all(&summary_dir).map_err(|source| LabelOpsError::Write {
        path: summary_dir.clone(),
        source,
    })?;
    let summary_path = summary_dir.join(SUMMARY_FILE_NAME);
    fs::write(&summary_path, stats.to_string()).map_err(|source| LabelOpsError::Write {
        path: summary_path.clone(),
        source,
    })?;

    Ok(stats)
}

enum Destination {
    InPlace,
    Tree(PathBuf),
}

fn transform_file(
    spec: &TransformSpec,
    label_path: &Path,
    destination: &Destination,
    backup: bool,
    stats: &mut TransformStats,
) -> Result<(), LabelOpsError> {
    if backup {
        let backup_path = backup_path_for(label_path);
        if !backup_path.exists() {
            fs::copy(label_path, &backup_path).map_err(|source| LabelOpsError::Write {
                path: backup_path.clone(),
                source,
            })?;
            stats.backups_created += 1;
        }
    }

    let file = read_label_file(label_path)?;
    let outcome = transform_rows(spec, &file.labels.rows);
    let content = format_label_rows(&outcome.rows);

    match destination {
        Destination::InPlace => write_atomic(label_path, &content)?,
        Destination::Tree(path) => fs::write(path, &content).map_err(|source| {
            LabelOpsError::Write {
                path: path.clone(),
                source,
            }
        })?,
    }

    stats.files_processed += 1;
    stats.rows_in += file.labels.rows.len();
    stats.rows_out += outcome.rows.len();
    stats.malformed_rows += file.labels.dropped;
    if outcome.rows.is_empty() {
        stats.empty_files += 1;
    }
    for transition in outcome.transitions {
        *stats.transitions.entry(transition).or_insert(0) += 1;
    }
    for class_id in outcome.dropped {
        *stats.dropped_by_class.entry(class_id).or_insert(0) += 1;
    }

    Ok(())
}

/// `<label>.bak`, next to the label.
pub fn backup_path_for(label_path: &Path) -> PathBuf {
    let mut name = OsString::from(label_path.as_os_str());
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// Pick `<dir>/<stem>.txt`, or `<stem>_1.txt`, `<stem>_2.txt`, ... when an
/// earlier file in this run already took the name.
fn claim_destination(labels_dir: &Path, label_path: &Path, claimed: &mut HashSet<PathBuf>) -> PathBuf {
    let stem = label_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut candidate = labels_dir.join(format!("{stem}.{LABEL_EXTENSION}"));
    let mut suffix = 1;
    while claimed.contains(&candidate) {
        candidate = labels_dir.join(format!("{stem}_{suffix}.{LABEL_EXTENSION}"));
        suffix += 1;
    }

    claimed.insert(candidate.clone());
    candidate
}

/// Replace `path` with `content` via a sibling temp file and rename, so the
/// original is never left half-written.
fn write_atomic(path: &Path, content: &str) -> Result<(), LabelOpsError> {
    let to_write_err = |source: std::io::Error| LabelOpsError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut temp = NamedTempFile::new_in(dir).map_err(to_write_err)?;
    temp.write_all(content.as_bytes()).map_err(to_write_err)?;
    temp.flush().map_err(to_write_err)?;

    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(temp.path(), metadata.permissions()).map_err(to_write_err)?;
    }

    temp.persist(path)
        .map_err(|err| to_write_err(err.error))?;
    Ok(())
}

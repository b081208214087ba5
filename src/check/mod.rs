//! Dataset integrity check.
//!
//! Classifies every entry of an image listing by the state of its
//! image/label pair, writes one list file per state, and tallies per-class
//! annotation counts over the healthy entries.

mod report;

pub use report::{BucketCounts, CheckReport};

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::LabelOpsError;
use crate::listing::ImageListing;
use crate::progress::RunContext;
use crate::resolve::resolve_label_path;
use crate::yolo::{read_label_file, LabelFile};

/// The state of one image/label pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Bucket {
    /// Both files exist and the label has at least one valid row.
    Normal,
    /// Both files exist and the label has no valid rows.
    EmptyLabel,
    /// The image exists, the label does not.
    NoLabel,
    /// The label exists, the image does not.
    NoImage,
    /// Neither file exists.
    BothMissing,
}

impl Bucket {
    pub const ALL: [Bucket; 5] = [
        Bucket::Normal,
        Bucket::EmptyLabel,
        Bucket::NoLabel,
        Bucket::NoImage,
        Bucket::BothMissing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Normal => "normal",
            Bucket::EmptyLabel => "empty_label",
            Bucket::NoLabel => "no_label",
            Bucket::NoImage => "no_image",
            Bucket::BothMissing => "both_missing",
        }
    }

    /// `<stem>_<bucket>.txt`
    pub fn file_name(&self, stem: &str) -> String {
        format!("{}_{}.txt", stem, self.as_str())
    }

    fn index(&self) -> usize {
        match self {
            Bucket::Normal => 0,
            Bucket::EmptyLabel => 1,
            Bucket::NoLabel => 2,
            Bucket::NoImage => 3,
            Bucket::BothMissing => 4,
        }
    }
}

/// What was learned from the label side of an entry.
#[derive(Debug)]
pub enum LabelState {
    /// No label was read (missing, or the image is missing).
    NotRead,
    Parsed(LabelFile),
    /// The label exists but could not be read or decoded.
    Unreadable(LabelOpsError),
}

/// Classification of a single image path.
#[derive(Debug)]
pub struct EntryCheck {
    pub bucket: Bucket,
    pub label_path: Option<PathBuf>,
    pub label: LabelState,
}

/// Options for [`check_listing`].
#[derive(Clone, Debug, Default)]
pub struct CheckOptions {
    /// Root that relative list entries are resolved against.
    pub root: Option<PathBuf>,
}

/// Classify one image path.
///
/// The label is only opened when the image exists too, since rows are
/// only analyzed for `normal` entries.
pub fn classify_entry(image: &Path) -> EntryCheck {
    let image_exists = image.is_file();
    let label_path = resolve_label_path(image, false);

    let (bucket, label) = match (image_exists, &label_path) {
        (true, Some(path)) => match read_label_file(path) {
            Ok(file) if file.labels.rows.is_empty() => (Bucket::EmptyLabel, LabelState::Parsed(file)),
            Ok(file) => (Bucket::Normal, LabelState::Parsed(file)),
            Err(err) => (Bucket::Normal, LabelState::Unreadable(err)),
        },
        (true, None) => (Bucket::NoLabel, LabelState::NotRead),
        (false, Some(_)) => (Bucket::NoImage, LabelState::NotRead),
        (false, None) => (Bucket::BothMissing, LabelState::NotRead),
    };

    EntryCheck {
        bucket,
        label_path,
        label,
    }
}

/// Classify every entry of `list_path` and write the bucket lists and
/// `<stem>_summary.txt` into `out_dir`.
pub fn check_listing(
    list_path: &Path,
    out_dir: &Path,
    opts: &CheckOptions,
    ctx: &mut RunContext,
) -> Result<CheckReport, LabelOpsError> {
    let listing = ImageListing::read(list_path, opts.root.as_deref())?;
    let stem = list_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "list".to_string());

    fs::create_dir_all(out_dir).map_err(|source| LabelOpsError::Write {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let mut writers = Vec::with_capacity(Bucket::ALL.len());
    for bucket in Bucket::ALL {
        let path = out_dir.join(bucket.file_name(&stem));
        let file = File::create(&path).map_err(|source| LabelOpsError::Write {
            path: path.clone(),
            source,
        })?;
        writers.push((path, BufWriter::new(file)));
    }

    let mut report = CheckReport::new(list_path.display().to_string());
    report.total = listing.len();

    ctx.progress.start("dataset-check", listing.len());
    for (idx, entry) in listing.entries.iter().enumerate() {
        ctx.checkpoint()?;

        let checked = classify_entry(&entry.path);
        record_entry(&mut report, &entry.path, checked.bucket, checked.label);

        let (path, writer) = &mut writers[checked.bucket.index()];
        writeln!(writer, "{}", entry.line).map_err(|source| LabelOpsError::Write {
            path: path.clone(),
            source,
        })?;

        ctx.progress.advance(idx + 1);
    }
    ctx.progress.finish(listing.len());

    for (path, mut writer) in writers {
        writer
            .flush()
            .map_err(|source| LabelOpsError::Write { path, source })?;
    }

    let summary_path = out_dir.join(format!("{stem}_summary.txt"));
    fs::write(&summary_path, report.to_string()).map_err(|source| LabelOpsError::Write {
        path: summary_path.clone(),
        source,
    })?;

    Ok(report)
}

fn record_entry(report: &mut CheckReport, image: &Path, bucket: Bucket, label: LabelState) {
    report.buckets.increment(bucket);

    match (bucket, label) {
        (Bucket::Normal, LabelState::Parsed(file)) => {
            for row in &file.labels.rows {
                *report.classes.entry(row.class_id).or_insert(0) += 1;
            }
            report.total_annotations += file.labels.rows.len();
            report.malformed_rows += file.labels.dropped;
            note_encoding(report, &file);
        }
        (Bucket::EmptyLabel, LabelState::Parsed(file)) => note_encoding(report, &file),
        (_, LabelState::Unreadable(err)) => {
            log::warn!("skipping row analysis for {}: {}", image.display(), err);
            report.unreadable_labels += 1;
        }
        _ => {}
    }
}

fn note_encoding(report: &mut CheckReport, file: &LabelFile) {
    if file.encoding != crate::encoding::TextEncoding::Utf8 {
        *report.encoding_fallbacks.entry(file.encoding).or_insert(0) += 1;
    }
}

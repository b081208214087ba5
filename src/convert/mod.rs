//! Per-image JSON annotations → YOLO label files.
//!
//! Boxes are given as top-left `(x, y)` plus size `(w, h)` in pixels and are
//! normalized against the document's resolution. Without a supplied mapping
//! the class vocabulary is discovered in a first pass over every file and
//! frozen before any label is written.

mod report;
pub mod schema;
mod vocab;

pub use report::ConvertReport;
pub use schema::{AnnotationDocument, RawAnnotation, Resolution, ResolutionSource};
pub use vocab::{ClassVocabulary, CLASSES_FILE_NAME, MAPPING_FILE_NAME};

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::encoding;
use crate::error::LabelOpsError;
use crate::listing::has_extension;
use crate::progress::RunContext;
use crate::yolo::{format_label_rows, LabelRow};

/// Parsed documents are kept between passes only below this total size.
pub const CACHE_LIMIT_BYTES: u64 = 256 * 1024 * 1024;

/// Where the class vocabulary comes from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum MappingSource {
    /// Discover names from the input and rank them lexicographically.
    #[default]
    Discover,
    /// Load the given mapping file.
    File(PathBuf),
    /// Load `class_mapping.json` from the input directory.
    InputDefault,
}

/// Options for [`convert_directory`].
#[derive(Clone, Debug, Default)]
pub struct ConvertOptions {
    pub mapping: MappingSource,
}

/// A YOLO box computed from a top-left pixel box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BoxConversion {
    Converted {
        cx: f64,
        cy: f64,
        w: f64,
        h: f64,
        /// Part of the box lies outside the image.
        out_of_bounds: bool,
    },
    /// Width or height was not positive.
    Rejected,
}

/// Normalize a top-left `[x, y, w, h]` pixel box. No clipping is applied.
pub fn convert_box(coord: [f64; 4], image_w: f64, image_h: f64) -> BoxConversion {
    let [x, y, w, h] = coord;
    if w <= 0.0 || h <= 0.0 {
        return BoxConversion::Rejected;
    }

    let out_of_bounds = x < 0.0 || y < 0.0 || x + w > image_w || y + h > image_h;

    BoxConversion::Converted {
        cx: (x + w / 2.0) / image_w,
        cy: (y + h / 2.0) / image_h,
        w: w / image_w,
        h: h / image_h,
        out_of_bounds,
    }
}

/// Read, decode, and parse one JSON annotation file.
pub fn load_document(path: &Path) -> Result<AnnotationDocument, LabelOpsError> {
    let text = encoding::read_text(path)?.text;
    let value: serde_json::Value =
        serde_json::from_str(&text).map_err(|source| LabelOpsError::JsonParse {
            path: path.to_path_buf(),
            source,
        })?;

    schema::parse_document(&value).map_err(|message| LabelOpsError::JsonSchema {
        path: path.to_path_buf(),
        message,
    })
}

/// JSON files directly inside `dir`, sorted, excluding a mapping file.
pub fn collect_json_files(dir: &Path) -> Result<Vec<PathBuf>, LabelOpsError> {
    if !dir.is_dir() {
        return Err(LabelOpsError::InputDirNotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|source| LabelOpsError::Walk {
            path: dir.to_path_buf(),
            message: source.to_string(),
        })?;

        let is_mapping = entry.file_name() == MAPPING_FILE_NAME;
        if entry.file_type().is_file() && has_extension(entry.path(), &["json"]) && !is_mapping {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

/// Convert every JSON file in `in_dir` into `<out_dir>/<stem>.txt`, and
/// write `classes.txt` plus `class_mapping.json` next to them.
pub fn convert_directory(
    in_dir: &Path,
    out_dir: &Path,
    opts: &ConvertOptions,
    ctx: &mut RunContext,
) -> Result<ConvertReport, LabelOpsError> {
    let files = collect_json_files(in_dir)?;

    let mut report = ConvertReport {
        files_seen: files.len(),
        ..Default::default()
    };

    let mut cache: Option<Vec<Result<AnnotationDocument, String>>> = None;
    let vocabulary = match &opts.mapping {
        MappingSource::File(path) => ClassVocabulary::load(path)?,
        MappingSource::InputDefault => ClassVocabulary::load(&in_dir.join(MAPPING_FILE_NAME))?,
        MappingSource::Discover => {
            report.auto_vocabulary = true;
            let (vocabulary, loaded) = discover_vocabulary(&files, ctx)?;
            cache = loaded;
            vocabulary
        }
    };
    report.classes = vocabulary.len();
    log::info!(
        "using {} class(es): {}",
        vocabulary.len(),
        vocabulary.names_by_id().join(", ")
    );

    fs::create_dir_all(out_dir).map_err(|source| LabelOpsError::Write {
        path: out_dir.to_path_buf(),
        source,
    })?;
    vocabulary.write_files(out_dir)?;

    ctx.progress.start("json-to-yolo", files.len());
    for (idx, path) in files.iter().enumerate() {
        ctx.checkpoint()?;

        let document = match &mut cache {
            Some(cached) => std::mem::replace(&mut cached[idx], Err(String::new())),
            None => load_document(path).map_err(|err| err.to_string()),
        };

        match document {
            Ok(document) => {
                let rows = emit_rows(path, &document, &vocabulary, !report.auto_vocabulary, &mut report);
                let stem = path
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let out_path = out_dir.join(format!("{stem}.txt"));
                fs::write(&out_path, format_label_rows(&rows)).map_err(|source| {
                    LabelOpsError::Write {
                        path: out_path.clone(),
                        source,
                    }
                })?;

                report.files_converted += 1;
                report.annotations_written += rows.len();
                if rows.is_empty() {
                    report.empty_outputs += 1;
                }
            }
            Err(message) => {
                if cache.is_none() {
                    log::warn!("skipping {message}");
                }
                report.files_failed += 1;
            }
        }

        ctx.progress.advance(idx + 1);
    }
    ctx.progress.finish(files.len());

    Ok(report)
}

/// First pass: collect every class name. Parsed documents are returned for
/// reuse when the input is small enough to hold in memory.
fn discover_vocabulary(
    files: &[PathBuf],
    ctx: &mut RunContext,
) -> Result<(ClassVocabulary, Option<Vec<Result<AnnotationDocument, String>>>), LabelOpsError> {
    let total_bytes: u64 = files
        .iter()
        .filter_map(|path| fs::metadata(path).ok())
        .map(|metadata| metadata.len())
        .sum();
    let keep = total_bytes <= CACHE_LIMIT_BYTES;
    if !keep {
        log::debug!("input is {total_bytes} bytes; documents will be re-read");
    }

    let mut names = Vec::new();
    let mut loaded = Vec::with_capacity(if keep { files.len() } else { 0 });

    for path in files {
        ctx.checkpoint()?;

        let document = load_document(path).map_err(|err| err.to_string());
        match &document {
            Ok(document) => names.extend(
                document
                    .annotations
                    .iter()
                    .filter_map(|annotation| annotation.label.clone()),
            ),
            Err(message) => log::warn!("skipping {message}"),
        }

        if keep {
            loaded.push(document);
        }
    }

    Ok((ClassVocabulary::from_names(names), keep.then_some(loaded)))
}

fn emit_rows(
    path: &Path,
    document: &AnnotationDocument,
    vocabulary: &ClassVocabulary,
    supplied: bool,
    report: &mut ConvertReport,
) -> Vec<LabelRow> {
    let resolution = document.resolution;
    match resolution.source {
        ResolutionSource::Given => {}
        ResolutionSource::Missing => {
            log::debug!("{}: no resolution, assuming 1920x1080", path.display());
            report.default_resolution += 1;
        }
        ResolutionSource::Malformed => {
            log::warn!("{}: unreadable resolution, assuming 1920x1080", path.display());
            report.default_resolution += 1;
        }
    }

    let mut rows = Vec::with_capacity(document.annotations.len());
    for (idx, annotation) in document.annotations.iter().enumerate() {
        let (Some(label), Some(coord)) = (&annotation.label, annotation.coord) else {
            log::warn!(
                "{}: annotation {} has no usable class_id or coord",
                path.display(),
                idx
            );
            report.rejected_boxes += 1;
            continue;
        };

        let class_id = match vocabulary.id(label) {
            Some(id) => id,
            None => {
                if supplied {
                    log::warn!("{}: class '{}' is not in the mapping; using 0", path.display(), label);
                }
                report.unknown_labels += 1;
                0
            }
        };

        match convert_box(coord, resolution.width, resolution.height) {
            BoxConversion::Rejected => {
                log::warn!(
                    "{}: annotation {} has non-positive size {}x{}",
                    path.display(),
                    idx,
                    coord[2],
                    coord[3]
                );
                report.rejected_boxes += 1;
            }
            BoxConversion::Converted {
                cx,
                cy,
                w,
                h,
                out_of_bounds,
            } => {
                if out_of_bounds {
                    log::warn!(
                        "{}: annotation {} extends past the {}x{} image",
                        path.display(),
                        idx,
                        resolution.width,
                        resolution.height
                    );
                    report.out_of_bounds += 1;
                }
                rows.push(LabelRow::new(class_id, cx, cy, w, h));
            }
        }
    }

    if let Some(source_id) = &document.source_id {
        log::debug!("{} ({}): {} row(s)", path.display(), source_id, rows.len());
    }

    rows
}

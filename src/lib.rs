//! Labelops: tools for maintaining YOLO object-detection datasets.
//!
//! Three command-line tools share this library:
//!
//! - `dataset-check` sorts an image list into buckets by image/label state
//!   and reports per-class annotation counts.
//! - `label-transform` remaps, shifts, deletes, or selects class ids across
//!   label files, either into a new tree or in place.
//! - `json-to-yolo` converts per-image JSON annotations into YOLO label files.
//!
//! # Modules
//!
//! - [`resolve`]: image path → label path resolution
//! - [`check`]: dataset classification and statistics
//! - [`transform`]: class-id rewriting
//! - [`convert`]: JSON → YOLO conversion
//! - [`yolo`]: YOLO label row parsing and formatting
//! - [`encoding`]: text decoding with legacy Korean encodings as fallbacks
//! - [`error`]: Error types for labelops operations

pub mod check;
pub mod cli;
pub mod convert;
pub mod encoding;
pub mod error;
pub mod listing;
pub mod progress;
pub mod resolve;
pub mod transform;
pub mod yolo;

pub use error::LabelOpsError;

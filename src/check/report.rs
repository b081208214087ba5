//! Dataset check report types and text formatting.
//!
//! The same `Display` output is written to `<stem>_summary.txt` and echoed
//! to the terminal; the struct also serializes to JSON for `--report-format json`.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::Bucket;
use crate::encoding::TextEncoding;

/// The result of classifying an image listing.
#[derive(Clone, Debug, Default, Serialize)]
pub struct CheckReport {
    /// The list file that was analyzed.
    pub listing: String,
    /// Number of non-empty list lines.
    pub total: usize,
    /// Per-bucket entry counts.
    pub buckets: BucketCounts,
    /// Annotation count per class id, over `normal` entries.
    pub classes: BTreeMap<u32, usize>,
    /// Sum of `classes`.
    pub total_annotations: usize,
    /// Label files that existed but could not be read or decoded.
    pub unreadable_labels: usize,
    /// Malformed rows dropped from `normal` labels.
    pub malformed_rows: usize,
    /// Label files that needed a non-UTF-8 decoder, by decoder.
    pub encoding_fallbacks: BTreeMap<TextEncoding, usize>,
}

/// Entry counts for each of the five buckets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BucketCounts {
    pub normal: usize,
    pub empty_label: usize,
    pub no_label: usize,
    pub no_image: usize,
    pub both_missing: usize,
}

impl BucketCounts {
    pub fn get(&self, bucket: Bucket) -> usize {
        match bucket {
            Bucket::Normal => self.normal,
            Bucket::EmptyLabel => self.empty_label,
            Bucket::NoLabel => self.no_label,
            Bucket::NoImage => self.no_image,
            Bucket::BothMissing => self.both_missing,
        }
    }

    pub fn increment(&mut self, bucket: Bucket) {
        let slot = match bucket {
            Bucket::Normal => &mut self.normal,
            Bucket::EmptyLabel => &mut self.empty_label,
            Bucket::NoLabel => &mut self.no_label,
            Bucket::NoImage => &mut self.no_image,
            Bucket::BothMissing => &mut self.both_missing,
        };
        *slot += 1;
    }

    pub fn sum(&self) -> usize {
        Bucket::ALL.iter().map(|bucket| self.get(*bucket)).sum()
    }
}

impl CheckReport {
    pub fn new(listing: impl Into<String>) -> Self {
        Self {
            listing: listing.into(),
            ..Default::default()
        }
    }
}

/// `part / total` as a percentage, or zero when `total` is zero.
pub(crate) fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dataset check: {}", self.listing)?;
        writeln!(f, "Total entries: {}", self.total)?;
        writeln!(f)?;

        writeln!(f, "Entry status:")?;
        for bucket in Bucket::ALL {
            let count = self.buckets.get(bucket);
            writeln!(
                f,
                "  {:<14} {:>8} ({:.2}%)",
                bucket.as_str(),
                count,
                percent(count, self.total)
            )?;
        }
        writeln!(f)?;

        writeln!(f, "Class distribution:")?;
        if self.classes.is_empty() {
            writeln!(f, "  (no annotations)")?;
        }
        for (class_id, count) in &self.classes {
            writeln!(
                f,
                "  class {:<8} {:>8} ({:.2}%)",
                class_id,
                count,
                percent(*count, self.total_annotations)
            )?;
        }
        writeln!(f)?;

        writeln!(f, "Total annotations: {}", self.total_annotations)?;

        if self.unreadable_labels > 0
            || self.malformed_rows > 0
            || !self.encoding_fallbacks.is_empty()
        {
            writeln!(f)?;
            writeln!(f, "Notes:")?;
            if self.unreadable_labels > 0 {
                writeln!(
                    f,
                    "  - {} label file(s) could not be read; counted as normal without rows",
                    self.unreadable_labels
                )?;
            }
            if self.malformed_rows > 0 {
                writeln!(f, "  - {} malformed row(s) ignored", self.malformed_rows)?;
            }
            if !self.encoding_fallbacks.is_empty() {
                let parts: Vec<String> = self
                    .encoding_fallbacks
                    .iter()
                    .map(|(encoding, count)| format!("{encoding}: {count}"))
                    .collect();
                writeln!(f, "  - non-UTF-8 label files ({})", parts.join(", "))?;
            }
        }

        Ok(())
    }
}

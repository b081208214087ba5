//! Counters collected during a label transform run.

use std::collections::BTreeMap;
use std::fmt;

/// Per-run statistics, written to `result_summary.txt`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransformStats {
    /// Human-readable description of the applied transform.
    pub transform: String,
    /// Entries considered after duplicate folding.
    pub entries: usize,
    /// Label files read, transformed, and written.
    pub files_processed: usize,
    /// Entries with no resolvable label file.
    pub files_skipped: usize,
    /// Label files that could not be read, backed up, or written.
    pub files_failed: usize,
    /// Entries whose label was already handled earlier in the run.
    pub duplicate_labels: usize,
    pub rows_in: usize,
    pub rows_out: usize,
    /// Lines dropped because they were not valid rows.
    pub malformed_rows: usize,
    /// `(before, after)` class id pairs for surviving rows.
    pub transitions: BTreeMap<(u32, u32), usize>,
    /// Rows removed by the transform, keyed by their original class id.
    pub dropped_by_class: BTreeMap<u32, usize>,
    /// Processed files left with no rows.
    pub empty_files: usize,
    pub backups_created: usize,
}

impl TransformStats {
    pub fn new(transform: impl Into<String>) -> Self {
        Self {
            transform: transform.into(),
            ..Default::default()
        }
    }

    /// Rows removed by the transform itself (not counting malformed lines).
    pub fn rows_dropped(&self) -> usize {
        self.rows_in - self.rows_out
    }
}

impl fmt::Display for TransformStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Label transform summary")?;
        writeln!(f, "Transform: {}", self.transform)?;
        writeln!(f)?;
        writeln!(f, "Entries:                      {}", self.entries)?;
        writeln!(f, "Files processed:              {}", self.files_processed)?;
        writeln!(f, "Files skipped (no label):     {}", self.files_skipped)?;
        writeln!(f, "Files failed:                 {}", self.files_failed)?;
        writeln!(f, "Duplicate labels skipped:     {}", self.duplicate_labels)?;
        writeln!(f, "Backups created:              {}", self.backups_created)?;
        writeln!(f, "Files with no remaining rows: {}", self.empty_files)?;
        writeln!(f)?;
        writeln!(f, "Rows in:                      {}", self.rows_in)?;
        writeln!(f, "Rows out:                     {}", self.rows_out)?;
        writeln!(f, "Rows dropped:                 {}", self.rows_dropped())?;
        writeln!(f, "Malformed rows ignored:       {}", self.malformed_rows)?;

        if !self.transitions.is_empty() {
            writeln!(f)?;
            writeln!(f, "Class transitions:")?;
            for ((before, after), count) in &self.transitions {
                let marker = if before == after { "" } else { " *" };
                writeln!(f, "  {before} -> {after}: {count}{marker}")?;
            }
        }

        if !self.dropped_by_class.is_empty() {
            writeln!(f)?;
            writeln!(f, "Dropped rows by original class:")?;
            for (class_id, count) in &self.dropped_by_class {
                writeln!(f, "  {class_id}: {count}")?;
            }
        }

        Ok(())
    }
}

//! JSON → YOLO conversion report.

use std::fmt;

use serde::Serialize;

/// Counters for one conversion run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ConvertReport {
    /// JSON files found in the input directory.
    pub files_seen: usize,
    /// Label files written.
    pub files_converted: usize,
    /// JSON files skipped because they could not be read or parsed.
    pub files_failed: usize,
    /// Label files written with no rows.
    pub empty_outputs: usize,
    pub annotations_written: usize,
    /// Annotations dropped for a missing label, unreadable coord, or non-positive size.
    pub rejected_boxes: usize,
    /// Boxes that extend past the image; written anyway.
    pub out_of_bounds: usize,
    /// Labels absent from a supplied mapping; written as class 0.
    pub unknown_labels: usize,
    /// Files converted with the default 1920x1080 resolution.
    pub default_resolution: usize,
    /// Number of classes in the vocabulary.
    pub classes: usize,
    /// Whether the vocabulary was discovered from the input.
    pub auto_vocabulary: bool,
}

impl fmt::Display for ConvertReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let vocabulary = if self.auto_vocabulary {
            "discovered"
        } else {
            "supplied"
        };

        writeln!(
            f,
            "Converted {} of {} JSON file(s), {} annotation(s), {} class(es) ({})",
            self.files_converted, self.files_seen, self.annotations_written, self.classes, vocabulary
        )?;

        let notes = [
            (self.files_failed, "JSON file(s) could not be parsed"),
            (self.empty_outputs, "label file(s) written empty"),
            (self.rejected_boxes, "annotation(s) rejected"),
            (self.out_of_bounds, "box(es) extend past the image"),
            (self.unknown_labels, "label(s) missing from the mapping, written as 0"),
            (self.default_resolution, "file(s) used the default 1920x1080 resolution"),
        ];

        for (count, message) in notes {
            if count > 0 {
                writeln!(f, "  - {count} {message}")?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_omits_zero_notes() {
        let report = ConvertReport {
            files_seen: 2,
            files_converted: 2,
            annotations_written: 4,
            classes: 3,
            auto_vocabulary: true,
            out_of_bounds: 1,
            ..Default::default()
        };

        let text = report.to_string();
        assert!(text.starts_with("Converted 2 of 2 JSON file(s), 4 annotation(s), 3 class(es) (discovered)"));
        assert!(text.contains("  - 1 box(es) extend past the image"));
        assert!(!text.contains("rejected"));
    }
}

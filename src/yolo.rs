//! YOLO label rows: `class_id cx cy w h`, normalized to `[0, 1]`.
//!
//! Reading is lenient. Rows that cannot be parsed are dropped and counted
//! rather than failing the file, since the dataset statistics are defined
//! over valid rows only.

use std::fmt;
use std::path::Path;

use crate::encoding::{self, TextEncoding};
use crate::error::LabelOpsError;

/// One annotation row of a YOLO label file.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabelRow {
    pub class_id: u32,
    pub cx: f64,
    pub cy: f64,
    pub w: f64,
    pub h: f64,
}

impl LabelRow {
    pub fn new(class_id: u32, cx: f64, cy: f64, w: f64, h: f64) -> Self {
        Self {
            class_id,
            cx,
            cy,
            w,
            h,
        }
    }

    pub fn with_class(self, class_id: u32) -> Self {
        Self { class_id, ..self }
    }
}

impl fmt::Display for LabelRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:.6} {:.6} {:.6} {:.6}",
            self.class_id, self.cx, self.cy, self.w, self.h
        )
    }
}

/// Rows parsed from a label file's text.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedLabels {
    pub rows: Vec<LabelRow>,
    /// Non-blank lines that were not valid rows.
    pub dropped: usize,
}

/// A label file read from disk.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelFile {
    pub labels: ParsedLabels,
    pub encoding: TextEncoding,
}

/// Parse a single label line.
///
/// Returns `None` for blank lines, lines with fewer than five tokens, and
/// lines whose tokens do not parse. Tokens beyond the fifth are ignored.
pub fn parse_label_line(line: &str) -> Option<LabelRow> {
    let mut tokens = line.split_whitespace();

    let class_id = tokens.next()?.parse::<u32>().ok()?;
    let cx = parse_f64_token(tokens.next()?)?;
    let cy = parse_f64_token(tokens.next()?)?;
    let w = parse_f64_token(tokens.next()?)?;
    let h = parse_f64_token(tokens.next()?)?;

    Some(LabelRow {
        class_id,
        cx,
        cy,
        w,
        h,
    })
}

fn parse_f64_token(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Parse every line of a label file's text.
pub fn parse_label_text(text: &str) -> ParsedLabels {
    let mut parsed = ParsedLabels::default();

    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_label_line(line) {
            Some(row) => parsed.rows.push(row),
            None => parsed.dropped += 1,
        }
    }

    parsed
}

/// Read and parse a label file using the fixed decoder priority.
pub fn read_label_file(path: &Path) -> Result<LabelFile, LabelOpsError> {
    let decoded = encoding::read_text(path)?;
    Ok(LabelFile {
        labels: parse_label_text(&decoded.text),
        encoding: decoded.encoding,
    })
}

/// Render rows as label file content, one row per line.
pub fn format_label_rows(rows: &[LabelRow]) -> String {
    let mut out = String::with_capacity(rows.len() * 44);
    for row in rows {
        out.push_str(&row.to_string());
        out.push('\n');
    }
    out
}

/// Fuzz-only entrypoint for label-line parsing.
#[cfg(feature = "fuzzing")]
pub fn fuzz_parse_label_line(input: &str) -> Option<String> {
    parse_label_line(input).map(|row| row.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_label_line_accepts_valid_rows() {
        let parsed = parse_label_line("2 0.5 0.25 0.3 0.1").expect("line should produce a row");
        assert_eq!(parsed, LabelRow::new(2, 0.5, 0.25, 0.3, 0.1));
    }

    #[test]
    fn parse_label_line_accepts_any_whitespace_and_extra_tokens() {
        let parsed = parse_label_line("\t7   0.1\t0.2 0.3  0.4 0.9 0.8").expect("row");
        assert_eq!(parsed, LabelRow::new(7, 0.1, 0.2, 0.3, 0.4));
    }

    #[test]
    fn parse_label_line_rejects_short_rows() {
        assert!(parse_label_line("0 0.1 0.2").is_none());
        assert!(parse_label_line("   ").is_none());
    }

    #[test]
    fn parse_label_line_rejects_bad_tokens() {
        assert!(parse_label_line("-1 0.1 0.2 0.3 0.4").is_none());
        assert!(parse_label_line("1.5 0.1 0.2 0.3 0.4").is_none());
        assert!(parse_label_line("car 0.1 0.2 0.3 0.4").is_none());
        assert!(parse_label_line("1 0.1 NaN 0.3 0.4").is_none());
    }

    #[test]
    fn parse_label_text_counts_dropped_rows() {
        let parsed = parse_label_text("0 0.5 0.5 0.2 0.2\n\nbroken\n3 0.3 0.3 0.1 0.1\n0 1\n");
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.dropped, 2);
    }

    #[test]
    fn rows_render_with_six_decimals() {
        let rows = vec![
            LabelRow::new(0, 0.5, 0.5, 0.2, 0.2),
            LabelRow::new(12, 1.0 / 3.0, 0.0, 1.0, 0.125),
        ];
        assert_eq!(
            format_label_rows(&rows),
            "0 0.500000 0.500000 0.200000 0.200000\n12 0.333333 0.000000 1.000000 0.125000\n"
        );
        assert_eq!(format_label_rows(&[]), "");
    }
}

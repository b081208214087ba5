//! Tolerant reader for the per-image JSON annotation layout.
//!
//! Group names are spelled inconsistently across exports
//! (`Raw Data Info`, `Raw data Info.`, `Raw Data Info.`), so each group is
//! found by probing a fixed list of spellings in priority order.

use serde_json::{Map, Value};

pub const SOURCE_INFO_KEYS: [&str; 3] = ["Source Data Info", "Source data Info.", "Source Data Info."];
pub const RAW_INFO_KEYS: [&str; 3] = ["Raw Data Info", "Raw data Info.", "Raw Data Info."];
pub const LEARNING_INFO_KEYS: [&str; 3] = [
    "Learning Data Info",
    "Learning data Info.",
    "Learning Data Info.",
];
pub const ANNOTATION_KEYS: [&str; 2] = ["annotation", "annotations"];
const SOURCE_ID_KEYS: [&str; 2] = ["source_data_ID", "source_data_id"];

pub const DEFAULT_RESOLUTION: (f64, f64) = (1920.0, 1080.0);

/// How the image size was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolutionSource {
    Given,
    /// No `resolution` key; the default was used.
    Missing,
    /// A `resolution` value was present but unusable; the default was used.
    Malformed,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Resolution {
    pub width: f64,
    pub height: f64,
    pub source: ResolutionSource,
}

impl Resolution {
    fn fallback(source: ResolutionSource) -> Self {
        Self {
            width: DEFAULT_RESOLUTION.0,
            height: DEFAULT_RESOLUTION.1,
            source,
        }
    }
}

/// One annotation as found in the document, before conversion.
#[derive(Clone, Debug, PartialEq)]
pub struct RawAnnotation {
    /// The class name; numbers are stringified.
    pub label: Option<String>,
    /// `[x, y, w, h]` with `(x, y)` the top-left corner, in pixels.
    pub coord: Option<[f64; 4]>,
}

/// The fields the converter needs from one JSON file.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnotationDocument {
    pub source_id: Option<String>,
    pub resolution: Resolution,
    pub annotations: Vec<RawAnnotation>,
}

/// Extract an [`AnnotationDocument`] from a parsed JSON value.
///
/// Fails only when the learning-data group or its annotation list is
/// missing; everything else degrades to defaults.
pub fn parse_document(root: &Value) -> Result<AnnotationDocument, String> {
    let root = root
        .as_object()
        .ok_or_else(|| "top-level value is not an object".to_string())?;

    let learning = lookup_any(root, &LEARNING_INFO_KEYS)
        .and_then(Value::as_object)
        .ok_or_else(|| format!("missing '{}' group", LEARNING_INFO_KEYS[0]))?;

    let annotations = lookup_any(learning, &ANNOTATION_KEYS)
        .and_then(Value::as_array)
        .ok_or_else(|| format!("missing '{}' list", ANNOTATION_KEYS[0]))?
        .iter()
        .map(parse_annotation)
        .collect();

    let resolution = match lookup_any(root, &RAW_INFO_KEYS)
        .and_then(Value::as_object)
        .and_then(|raw| raw.get("resolution"))
    {
        Some(value) => parse_resolution(value)
            .unwrap_or_else(|| Resolution::fallback(ResolutionSource::Malformed)),
        None => Resolution::fallback(ResolutionSource::Missing),
    };

    let source_id = lookup_any(root, &SOURCE_INFO_KEYS)
        .and_then(Value::as_object)
        .and_then(|source| lookup_any(source, &SOURCE_ID_KEYS))
        .and_then(scalar_text);

    Ok(AnnotationDocument {
        source_id,
        resolution,
        annotations,
    })
}

fn lookup_any<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| object.get(*key))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn parse_annotation(value: &Value) -> RawAnnotation {
    let Some(object) = value.as_object() else {
        return RawAnnotation {
            label: None,
            coord: None,
        };
    };

    RawAnnotation {
        label: object
            .get("class_id")
            .and_then(scalar_text)
            .map(|label| label.trim().to_string())
            .filter(|label| !label.is_empty()),
        coord: object.get("coord").and_then(parse_coord),
    }
}

/// Accepts `[x, y, w, h]`, `[[x, y, w, h]]`, or the string `"[x, y, w, h]"`.
pub fn parse_coord(value: &Value) -> Option<[f64; 4]> {
    match value {
        Value::String(text) => parse_coord_text(text),
        Value::Array(items) => match items.as_slice() {
            [inner @ Value::Array(_)] => flat_coord(inner),
            [Value::String(text)] => parse_coord_text(text),
            _ => flat_coord(value),
        },
        _ => None,
    }
}

fn flat_coord(value: &Value) -> Option<[f64; 4]> {
    let items = value.as_array()?;
    if items.len() < 4 {
        return None;
    }

    let mut out = [0.0; 4];
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = number(item)?;
    }
    Some(out)
}

fn number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|value| value.is_finite())
}

fn parse_coord_text(text: &str) -> Option<[f64; 4]> {
    let values = split_numbers(text)?;
    if values.len() < 4 {
        return None;
    }
    Some([values[0], values[1], values[2], values[3]])
}

fn split_numbers(text: &str) -> Option<Vec<f64>> {
    text.split(|c: char| c == ',' || c == '[' || c == ']' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| token.parse::<f64>().ok().filter(|value| value.is_finite()))
        .collect()
}

/// Accepts `[W, H]` or `"W, H"` (also `"WxH"`).
pub fn parse_resolution(value: &Value) -> Option<Resolution> {
    let (width, height) = match value {
        Value::Array(items) if items.len() >= 2 => (number(&items[0])?, number(&items[1])?),
        Value::String(text) => {
            let normalized = text.replace(['x', 'X', '*'], ",");
            let values = split_numbers(&normalized)?;
            match values.as_slice() {
                [width, height, ..] => (*width, *height),
                _ => return None,
            }
        }
        _ => return None,
    };

    if width <= 0.0 || height <= 0.0 {
        return None;
    }

    Some(Resolution {
        width,
        height,
        source: ResolutionSource::Given,
    })
}

/// Fuzz-only entrypoint for annotation document parsing.
#[cfg(feature = "fuzzing")]
pub fn fuzz_parse_document(bytes: &[u8]) -> Option<usize> {
    let text = crate::encoding::decode_bytes(bytes)?.text;
    let value: Value = serde_json::from_str(&text).ok()?;
    parse_document(&value).ok().map(|doc| doc.annotations.len())
}

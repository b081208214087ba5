#![allow(dead_code)]

use labelops::transform::{ClassFilter, ShiftSpec, TransformSpec};
use labelops::yolo::LabelRow;
use proptest::collection::{btree_map, btree_set, vec};
use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub const MAX_CLASS: u32 = 40;

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

pub fn arb_row() -> impl Strategy<Value = LabelRow> {
    (
        0..=MAX_CLASS,
        0.0f64..1.0,
        0.0f64..1.0,
        0.001f64..1.0,
        0.001f64..1.0,
    )
        .prop_map(|(class_id, cx, cy, w, h)| LabelRow::new(class_id, cx, cy, w, h))
}

pub fn arb_rows(max_len: usize) -> impl Strategy<Value = Vec<LabelRow>> {
    vec(arb_row(), 0..=max_len)
}

pub fn arb_shift() -> impl Strategy<Value = Option<ShiftSpec>> {
    prop::option::of(
        (0..=MAX_CLASS, -20i64..=20, prop::option::of(0..=MAX_CLASS * 2)).prop_map(
            |(start, value, max)| ShiftSpec {
                // Keep start + value non-negative so the shift validates.
                start: start.max(value.unsigned_abs() as u32),
                value,
                max,
            },
        ),
    )
}

pub fn arb_filter() -> impl Strategy<Value = Option<ClassFilter>> {
    prop_oneof![
        Just(None),
        btree_set(0..=MAX_CLASS * 2, 1..6).prop_map(|ids| Some(ClassFilter::Delete(ids))),
        btree_set(0..=MAX_CLASS * 2, 1..6).prop_map(|ids| Some(ClassFilter::Select(ids))),
    ]
}

pub fn arb_spec() -> impl Strategy<Value = TransformSpec> {
    (
        btree_map(0..=MAX_CLASS, 0..=MAX_CLASS, 0..6),
        arb_shift(),
        arb_filter(),
    )
        .prop_map(|(remap, shift, filter)| TransformSpec {
            remap,
            shift,
            filter,
        })
}

/// A pixel box fully inside a `W×H` image: `(coord, width, height)`.
pub fn arb_inside_box() -> impl Strategy<Value = ([f64; 4], f64, f64)> {
    (16.0f64..4096.0, 16.0f64..4096.0)
        .prop_flat_map(|(width, height)| {
            (
                Just(width),
                Just(height),
                0.0..width - 1.0,
                0.0..height - 1.0,
            )
        })
        .prop_flat_map(|(width, height, x, y)| {
            (
                Just(width),
                Just(height),
                Just(x),
                Just(y),
                0.5..=(width - x - 0.5),
                0.5..=(height - y - 0.5),
            )
        })
        .prop_map(|(width, height, x, y, w, h)| ([x, y, w, h], width, height))
}

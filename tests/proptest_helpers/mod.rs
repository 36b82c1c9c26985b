#![allow(dead_code)]

use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

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

/// Class names as they appear in real corpora: lowercase words, some with
/// digits or underscores.
pub fn arb_class_name() -> BoxedStrategy<String> {
    proptest::string::string_regex("[a-z][a-z0-9_]{0,11}")
        .expect("valid class name regex")
        .boxed()
}

/// Pixel box corners, deliberately including inverted, zero-extent and
/// overhanging boxes relative to a `width` x `height` image.
pub fn arb_pixel_box(width: u32, height: u32) -> BoxedStrategy<(f64, f64, f64, f64)> {
    let w = f64::from(width);
    let h = f64::from(height);
    (
        -0.2 * w..1.2 * w,
        -0.2 * h..1.2 * h,
        -0.2 * w..1.2 * w,
        -0.2 * h..1.2 * h,
    )
        .prop_map(|(x1, y1, x2, y2)| (x1.round(), y1.round(), x2.round(), y2.round()))
        .boxed()
}

/// An image size plus between one and `max_objects` boxes.
pub fn arb_image_with_boxes(
    max_objects: usize,
) -> BoxedStrategy<(u32, u32, Vec<(f64, f64, f64, f64)>)> {
    (1u32..=1024, 1u32..=1024)
        .prop_flat_map(move |(width, height)| {
            (
                Just(width),
                Just(height),
                proptest::collection::vec(arb_pixel_box(width, height), 1..=max_objects),
            )
        })
        .boxed()
}

/// Split file content: identifiers interleaved with blank and
/// whitespace-only lines.
pub fn arb_split_lines(ids: Vec<String>) -> BoxedStrategy<String> {
    let n = ids.len();
    proptest::collection::vec(prop_oneof![Just(""), Just("   "), Just("\t")], n + 1)
        .prop_map(move |blanks| {
            let mut lines = Vec::new();
            for (id, blank) in ids.iter().zip(&blanks) {
                lines.push(blank.to_string());
                lines.push(format!("  {id} "));
            }
            lines.push(blanks[n].to_string());
            lines.join("\n")
        })
        .boxed()
}

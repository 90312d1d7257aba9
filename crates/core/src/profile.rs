//! Document-wide font-size statistics.
//!
//! The body size is the most frequent line size; heading thresholds sit at
//! fixed offsets above it. Sizes are rounded to one decimal place before
//! counting so that rendering noise (11.98 vs 12.0) does not split one
//! logical size into several buckets.

use std::collections::HashMap;

use crate::config::OutlineConfig;
use crate::types::{FontProfile, Line};

/// Bucket key for a size: tenths of a unit.
fn bucket_key(size: f32) -> i32 {
    (size * 10.0).round() as i32
}

fn bucket_size(key: i32) -> f32 {
    key as f32 / 10.0
}

/// `(size, line_count)` pairs for every positive size, largest size first.
pub fn size_histogram(lines: &[Line]) -> Vec<(f32, usize)> {
    let mut counts: HashMap<i32, usize> = HashMap::new();
    for line in lines {
        if line.font_size > 0.0 {
            *counts.entry(bucket_key(line.font_size)).or_insert(0) += 1;
        }
    }

    let mut histogram: Vec<(f32, usize)> = counts
        .into_iter()
        .map(|(k, v)| (bucket_size(k), v))
        .collect();
    histogram.sort_by(|a, b| b.0.total_cmp(&a.0));
    histogram
}

/// Most frequent size; ties go to the size encountered first.
fn mode_size(lines: &[Line]) -> Option<f32> {
    // key -> (count, index of first occurrence)
    let mut counts: HashMap<i32, (usize, usize)> = HashMap::new();
    for (idx, line) in lines.iter().enumerate() {
        if line.font_size > 0.0 {
            counts.entry(bucket_key(line.font_size)).or_insert((0, idx)).0 += 1;
        }
    }

    counts
        .into_iter()
        .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_a.cmp(count_b).then(first_b.cmp(first_a))
        })
        .map(|(key, _)| bucket_size(key))
}

/// Build the profile for one document.
///
/// Never fails: a document without any positive font size gets the
/// configured fallback profile.
pub fn build_font_profile(lines: &[Line], config: &OutlineConfig) -> FontProfile {
    match mode_size(lines) {
        Some(body_size) => FontProfile {
            body_size,
            h1_threshold: body_size + config.h1_offset,
            h2_threshold: body_size + config.h2_offset,
            h3_threshold: body_size + config.h3_offset,
        },
        None => {
            log::debug!("no usable font sizes, using fallback profile");
            config.fallback.into()
        }
    }
}

//! Final outline assembly: dedup, title exclusion, ordering.

use std::collections::HashSet;

use crate::lines::normalize_text;
use crate::types::{HeadingCandidate, OutlineResult};

fn dedup_key(text: &str) -> String {
    normalize_text(text).to_lowercase()
}

/// Package classified headings (in discovery order) with the resolved title.
///
/// - Entries sharing `(lowercased text, page)` keep only the first.
/// - Page-1 entries equal to the title are dropped.
/// - Entries are stably ordered by page; within a page discovery order is kept.
pub fn assemble_outline(title: String, candidates: Vec<HeadingCandidate>) -> OutlineResult {
    let title_key = dedup_key(&title);
    let mut seen: HashSet<(String, usize)> = HashSet::new();

    let mut outline: Vec<HeadingCandidate> = candidates
        .into_iter()
        .filter(|candidate| {
            let key = dedup_key(&candidate.text);
            if candidate.page == 1 && !title_key.is_empty() && key == title_key {
                return false;
            }
            seen.insert((key, candidate.page))
        })
        .collect();

    outline.sort_by_key(|candidate| candidate.page);

    OutlineResult { title, outline }
}

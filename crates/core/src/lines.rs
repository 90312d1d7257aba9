//! Line assembly: positioned runs in, reading-order lines out.
//!
//! ```text
//! TextRun[] --sort (y desc, x asc)--> bands of runs --merge--> Line[]
//! ```
//!
//! A run joins the current line when its baseline lies within the tolerance
//! of the line's anchor (the baseline of the first run placed in it).

use unicode_normalization::UnicodeNormalization;

use crate::types::{DocumentText, Line, PageText, TextRun};

/// Approximate glyph width as a fraction of the font size, used when the
/// extractor did not report a run width.
const APPROX_CHAR_WIDTH_RATIO: f32 = 0.5;

/// Minimum gap between the end of one run and the start of the next before a
/// word space is inserted.
const MIN_WORD_GAP: f32 = 1.5;

/// Two runs with identical text starting this close together are the same
/// glyphs painted twice (a common way of faking bold).
const DUPLICATE_X_TOLERANCE: f32 = 1.0;

// ---------------------------------------------------------------------------
// Spaceless scripts
// ---------------------------------------------------------------------------

/// Returns `true` if `c` belongs to a script written without inter-word
/// spaces (CJK ideographs, kana, Hangul, Thai and neighbours).
pub fn is_spaceless_script_char(c: char) -> bool {
    let cp = c as u32;
    matches!(
        cp,
        // CJK Unified Ideographs + Extension A
        0x4E00..=0x9FFF
        | 0x3400..=0x4DBF
        // Extension B
        | 0x20000..=0x2A6DF
        // Compatibility Ideographs
        | 0xF900..=0xFAFF
        // Hiragana, Katakana, Katakana Phonetic Extensions
        | 0x3040..=0x309F
        | 0x30A0..=0x30FF
        | 0x31F0..=0x31FF
        // Hangul
        | 0xAC00..=0xD7AF
        | 0x1100..=0x11FF
        | 0x3130..=0x318F
        // CJK Symbols and Punctuation, Fullwidth Forms
        | 0x3000..=0x303F
        | 0xFF00..=0xFFEF
        // Thai, Lao, Myanmar, Khmer, Tibetan
        | 0x0E00..=0x0E7F
        | 0x0E80..=0x0EFF
        | 0x1000..=0x109F
        | 0x1780..=0x17FF
        | 0x0F00..=0x0FFF
    )
}

fn boundary_is_spaceless(prev: &str, next: &str) -> bool {
    match (prev.chars().next_back(), next.chars().next()) {
        (Some(l), Some(f)) => is_spaceless_script_char(l) && is_spaceless_script_char(f),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Text normalisation
// ---------------------------------------------------------------------------

/// NFKC-normalise, trim, and collapse internal whitespace to single spaces.
pub fn normalize_text(text: &str) -> String {
    let nfkc: String = text.nfkc().collect();
    nfkc.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Group one page's runs into lines in reading order.
///
/// Lines whose merged text is blank are dropped.
pub fn assemble_lines(runs: &[TextRun], tolerance: f32) -> Vec<Line> {
    let mut sorted: Vec<&TextRun> = runs.iter().collect();
    sorted.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

    let mut lines = Vec::new();
    let mut rest = sorted.into_iter();
    let Some(first) = rest.next() else {
        return lines;
    };
    let mut anchor = first.y;
    let mut band: Vec<&TextRun> = vec![first];

    for run in rest {
        if (run.y - anchor).abs() > tolerance {
            lines.extend(build_line(std::mem::take(&mut band), anchor));
            anchor = run.y;
        }
        band.push(run);
    }

    lines.extend(build_line(band, anchor));
    lines
}

/// Assemble lines for a single page.
pub fn assemble_page(page: &PageText, tolerance: f32) -> Vec<Line> {
    let mut lines = assemble_lines(&page.runs, tolerance);
    for line in &mut lines {
        line.page = page.page;
    }
    lines
}

/// Assemble lines for every page, in page order.
pub fn assemble_document(doc: &DocumentText, tolerance: f32) -> Vec<Line> {
    let mut pages: Vec<&PageText> = doc.pages.iter().collect();
    pages.sort_by_key(|p| p.page);
    pages
        .into_iter()
        .flat_map(|page| assemble_page(page, tolerance))
        .collect()
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn estimated_width(run: &TextRun) -> f32 {
    run.width
        .unwrap_or_else(|| run.text.chars().count() as f32 * run.font_size * APPROX_CHAR_WIDTH_RATIO)
}

/// Merge runs already known to share a baseline band into one [`Line`].
fn build_line(mut runs: Vec<&TextRun>, anchor: f32) -> Option<Line> {
    runs.sort_by(|a, b| a.x.total_cmp(&b.x));

    let mut text = String::new();
    let mut font_size: f32 = 0.0;
    let mut is_bold = false;
    let mut page = 0;
    let mut prev: Option<&TextRun> = None;

    for run in runs {
        if run.text.trim().is_empty() {
            continue;
        }

        if let Some(p) = prev {
            if p.text == run.text && (p.x - run.x).abs() <= DUPLICATE_X_TOLERANCE {
                continue;
            }

            let gap = run.x - (p.x + estimated_width(p));
            let already_spaced = text.ends_with(char::is_whitespace)
                || run.text.starts_with(char::is_whitespace);
            if gap >= MIN_WORD_GAP && !already_spaced && !boundary_is_spaceless(&text, &run.text) {
                text.push(' ');
            }
        } else {
            page = run.page;
        }

        text.push_str(&run.text);
        font_size = font_size.max(run.font_size);
        is_bold |= run.is_bold;
        prev = Some(run);
    }

    let text = normalize_text(&text);
    if text.is_empty() {
        return None;
    }

    Some(Line {
        text,
        font_size,
        is_bold,
        page,
        y_position: anchor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str, x: f32, y: f32, size: f32) -> TextRun {
        TextRun::new(text, size, false, x, y, 1)
    }

    fn bold_run(text: &str, x: f32, y: f32, size: f32) -> TextRun {
        TextRun::new(text, size, true, x, y, 1)
    }

    #[test]
    fn test_empty_runs_yield_no_lines() {
        assert!(assemble_lines(&[], 2.0).is_empty());
    }

    #[test]
    fn test_same_baseline_merges_in_x_order() {
        let runs = vec![run("World", 100.0, 700.0, 12.0), run("Hello", 0.0, 700.0, 12.0)];
        let lines = assemble_lines(&runs, 2.0);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "Hello World");
    }

    #[test]
    fn test_within_tolerance_merges() {
        let runs = vec![run("A", 0.0, 700.0, 12.0), run("B", 50.0, 698.5, 12.0)];
        assert_eq!(assemble_lines(&runs, 2.0).len(), 1);
    }

    #[test]
    fn test_outside_tolerance_splits() {
        let runs = vec![run("A", 0.0, 700.0, 12.0), run("B", 50.0, 697.0, 12.0)];
        assert_eq!(assemble_lines(&runs, 2.0).len(), 2);
    }

    #[test]
    fn test_lines_ordered_top_to_bottom() {
        let runs = vec![
            run("Bottom", 0.0, 600.0, 12.0),
            run("Top", 0.0, 700.0, 12.0),
            run("Middle", 0.0, 650.0, 12.0),
        ];
        let lines = assemble_lines(&runs, 2.0);
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["Top", "Middle", "Bottom"]);
        assert!((lines[0].y_position - 700.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_line_takes_max_size_and_any_bold() {
        let runs = vec![
            run("Chapter", 0.0, 700.0, 12.0),
            bold_run("One", 80.0, 700.0, 18.0),
        ];
        let lines = assemble_lines(&runs, 2.0);
        assert_eq!(lines.len(), 1);
        assert!((lines[0].font_size - 18.0).abs() < f32::EPSILON);
        assert!(lines[0].is_bold);
    }

    #[test]
    fn test_whitespace_only_line_dropped() {
        let runs = vec![run("   ", 0.0, 700.0, 12.0), run("Body", 0.0, 650.0, 12.0)];
        let lines = assemble_lines(&runs, 2.0);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "Body");
    }

    #[test]
    fn test_adjacent_glyph_runs_not_spaced() {
        // Each glyph starts where the previous one ends.
        let runs = vec![
            run("H", 0.0, 700.0, 10.0).with_width(5.0),
            run("i", 5.0, 700.0, 10.0).with_width(5.0),
        ];
        let lines = assemble_lines(&runs, 2.0);
        assert_eq!(lines[0].text, "Hi");
    }

    #[test]
    fn test_split_heading_runs_joined_with_space() {
        let runs = vec![
            bold_run("2.", 72.0, 500.0, 14.0),
            bold_run("Scope", 92.0, 500.0, 14.0),
        ];
        let lines = assemble_lines(&runs, 2.0);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "2. Scope");
    }

    #[test]
    fn test_double_struck_run_dropped() {
        let runs = vec![
            bold_run("2. Scope", 72.0, 500.0, 14.0),
            bold_run("2. Scope", 72.4, 500.2, 14.0),
        ];
        let lines = assemble_lines(&runs, 2.0);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "2. Scope");
    }

    #[test]
    fn test_cjk_runs_not_spaced() {
        let runs = vec![
            run("\u{65E5}\u{672C}", 0.0, 700.0, 12.0).with_width(24.0),
            run("\u{8A9E}", 30.0, 700.0, 12.0).with_width(12.0),
        ];
        let lines = assemble_lines(&runs, 2.0);
        assert_eq!(lines[0].text, "\u{65E5}\u{672C}\u{8A9E}");
    }

    #[test]
    fn test_normalize_text_collapses_and_nfkc() {
        assert_eq!(normalize_text("  a \t b\n c  "), "a b c");
        // U+FB01 LATIN SMALL LIGATURE FI
        assert_eq!(normalize_text("\u{FB01}gure"), "figure");
    }

    #[test]
    fn test_assemble_document_uses_page_numbers() {
        let doc = DocumentText {
            pages: vec![
                PageText {
                    page: 2,
                    height: None,
                    bottom: 0.0,
                    runs: vec![TextRun::new("Second", 12.0, false, 0.0, 700.0, 2)],
                },
                PageText {
                    page: 1,
                    height: None,
                    bottom: 0.0,
                    runs: vec![TextRun::new("First", 12.0, false, 0.0, 700.0, 1)],
                },
            ],
            metadata_title: None,
        };
        let lines = assemble_document(&doc, 2.0);
        assert_eq!(lines.len(), 2);
        assert_eq!((lines[0].text.as_str(), lines[0].page), ("First", 1));
        assert_eq!((lines[1].text.as_str(), lines[1].page), ("Second", 2));
    }

    #[test]
    fn test_nan_coordinates_do_not_break_ordering() {
        let mut runs: Vec<TextRun> = (0..200)
            .map(|i| run("cell", (i % 5) as f32 * 40.0, 700.0 - (i / 5) as f32 * 14.0, 10.0))
            .collect();
        for (i, r) in runs.iter_mut().enumerate() {
            if i % 7 == 0 {
                r.y = f32::NAN;
            }
            if i % 11 == 0 {
                r.x = f32::NAN;
            }
        }
        let lines = assemble_lines(&runs, 2.0);
        assert!(!lines.is_empty());
        assert!(lines.iter().all(|l| !l.text.is_empty()));
    }

    #[test]
    fn test_spaceless_script_chars() {
        assert!(is_spaceless_script_char('\u{4E00}'));
        assert!(is_spaceless_script_char('\u{3042}'));
        assert!(is_spaceless_script_char('\u{AC00}'));
        assert!(is_spaceless_script_char('\u{0E01}'));
        assert!(!is_spaceless_script_char('A'));
        assert!(!is_spaceless_script_char(' '));
    }
}

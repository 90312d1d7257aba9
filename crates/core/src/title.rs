//! Title resolution from the first page and document metadata.
//!
//! Preference order:
//!
//! 1. The topmost bold line at the page's largest size, in the top third of
//!    the page.
//! 2. The metadata title, when it is long enough and does not look like a
//!    file name.
//! 3. All text at the page's largest size, cut at the first sentence
//!    boundary and capped in length.
//! 4. Empty.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::config::OutlineConfig;
use crate::lines::normalize_text;
use crate::types::Line;

/// Sizes closer than this are the same size.
const SIZE_EPSILON: f32 = 0.05;

/// Metadata titles ending in one of these are authoring-tool file names.
const FILENAME_SUFFIXES: &[&str] = &[".doc", ".docx", ".pdf", ".indd", ".txt", ".rtf"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleSource {
    Visual,
    Metadata,
    LargestText,
    None,
}

impl fmt::Display for TitleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TitleSource::Visual => write!(f, "visual"),
            TitleSource::Metadata => write!(f, "metadata"),
            TitleSource::LargestText => write!(f, "largest-text"),
            TitleSource::None => write!(f, "none"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTitle {
    pub text: String,
    pub source: TitleSource,
}

impl ResolvedTitle {
    fn new(text: String, source: TitleSource) -> Self {
        ResolvedTitle { text, source }
    }
}

fn sentence_boundary() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?]\s+").unwrap())
}

fn same_size(a: f32, b: f32) -> bool {
    (a - b).abs() < SIZE_EPSILON
}

/// Resolve the title from page-1 lines (reading order), the baseline that
/// starts the page's top third (see [`crate::PageText::top_third_floor`]),
/// and the optional metadata title.
pub fn resolve_title(
    first_page: &[Line],
    top_third_floor: Option<f32>,
    metadata_title: Option<&str>,
    config: &OutlineConfig,
) -> ResolvedTitle {
    let max_size = first_page
        .iter()
        .map(|l| l.font_size)
        .filter(|s| *s > 0.0)
        .fold(None, |acc: Option<f32>, s| Some(acc.map_or(s, |m| m.max(s))));

    if let Some(max_size) = max_size {
        if let Some(text) = visual_title(first_page, top_third_floor, max_size) {
            return ResolvedTitle::new(text, TitleSource::Visual);
        }
    }

    if let Some(text) = trusted_metadata_title(metadata_title, config) {
        return ResolvedTitle::new(text, TitleSource::Metadata);
    }

    if let Some(max_size) = max_size {
        let text = largest_text_title(first_page, max_size, config.title_max_chars);
        if !text.is_empty() {
            return ResolvedTitle::new(text, TitleSource::LargestText);
        }
    }

    ResolvedTitle::new(String::new(), TitleSource::None)
}

fn visual_title(lines: &[Line], top_third_floor: Option<f32>, max_size: f32) -> Option<String> {
    // Without page bounds the topmost line stands in for the page top.
    let top_third = top_third_floor.unwrap_or_else(|| {
        lines
            .iter()
            .map(|l| l.y_position)
            .fold(f32::MIN, f32::max)
            * 2.0
            / 3.0
    });

    lines
        .iter()
        .filter(|l| l.is_bold && same_size(l.font_size, max_size) && l.y_position >= top_third)
        .max_by(|a, b| {
            a.font_size
                .total_cmp(&b.font_size)
                .then(a.y_position.total_cmp(&b.y_position))
        })
        .map(|l| l.text.clone())
}

fn trusted_metadata_title(metadata_title: Option<&str>, config: &OutlineConfig) -> Option<String> {
    let title = metadata_title?.trim();
    if title.chars().count() <= config.metadata_title_min_chars {
        return None;
    }
    let lower = title.to_lowercase();
    if FILENAME_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix)) {
        log::debug!("ignoring file-name-like metadata title {:?}", title);
        return None;
    }
    Some(title.to_string())
}

fn largest_text_title(lines: &[Line], max_size: f32, max_chars: usize) -> String {
    let joined = lines
        .iter()
        .filter(|l| same_size(l.font_size, max_size))
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let joined = normalize_text(&joined);

    let first_sentence = match sentence_boundary().find(&joined) {
        Some(m) => &joined[..m.start()],
        None => joined.as_str(),
    };

    first_sentence.chars().take(max_chars).collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str, size: f32, bold: bool, y: f32) -> Line {
        Line {
            text: text.to_string(),
            font_size: size,
            is_bold: bold,
            page: 1,
            y_position: y,
        }
    }

    fn resolve(lines: &[Line], meta: Option<&str>) -> ResolvedTitle {
        resolve_title(lines, Some(528.0), meta, &OutlineConfig::default())
    }

    #[test]
    fn test_bold_largest_top_third_wins() {
        let lines = vec![
            line("Annual Report 2024", 24.0, true, 720.0),
            line("Body text on the first page.", 10.0, false, 600.0),
            line("More body text.", 10.0, false, 580.0),
        ];
        let title = resolve(&lines, Some("Some Other Metadata Title"));
        assert_eq!(title.text, "Annual Report 2024");
        assert_eq!(title.source, TitleSource::Visual);
    }

    #[test]
    fn test_topmost_candidate_wins_tie() {
        let lines = vec![
            line("Upper Title", 24.0, true, 760.0),
            line("Lower Title", 24.0, true, 700.0),
        ];
        assert_eq!(resolve(&lines, None).text, "Upper Title");
    }

    #[test]
    fn test_bottom_of_page_not_visual_title() {
        let lines = vec![
            line("Footer Banner", 24.0, true, 100.0),
            line("Body text.", 10.0, false, 600.0),
        ];
        let title = resolve(&lines, Some("A Reliable Metadata Title"));
        assert_eq!(title.text, "A Reliable Metadata Title");
        assert_eq!(title.source, TitleSource::Metadata);
    }

    #[test]
    fn test_non_bold_largest_falls_to_metadata() {
        let lines = vec![line("Big Plain Title", 24.0, false, 720.0)];
        let title = resolve(&lines, Some("  Metadata Title Here  "));
        assert_eq!(title.text, "Metadata Title Here");
    }

    #[test]
    fn test_short_metadata_ignored() {
        let lines = vec![line("Big Plain Title", 24.0, false, 720.0)];
        let title = resolve(&lines, Some("Untitled"));
        assert_eq!(title.text, "Big Plain Title");
        assert_eq!(title.source, TitleSource::LargestText);
    }

    #[test]
    fn test_filename_metadata_ignored() {
        let lines = vec![line("Big Plain Title", 24.0, false, 720.0)];
        let title = resolve(&lines, Some("Microsoft Word - draft_v3.docx"));
        assert_eq!(title.text, "Big Plain Title");
    }

    #[test]
    fn test_largest_text_cut_at_sentence() {
        let lines = vec![
            line("Welcome to the program. Please read", 20.0, false, 720.0),
            line("carefully before continuing", 20.0, false, 690.0),
            line("Body.", 10.0, false, 600.0),
        ];
        assert_eq!(resolve(&lines, None).text, "Welcome to the program");
    }

    #[test]
    fn test_largest_text_joins_lines() {
        let lines = vec![
            line("Understanding", 20.0, false, 720.0),
            line("Heading Inference", 20.0, false, 690.0),
        ];
        assert_eq!(resolve(&lines, None).text, "Understanding Heading Inference");
    }

    #[test]
    fn test_largest_text_capped() {
        let long = "x".repeat(300);
        let lines = vec![line(&long, 20.0, false, 720.0)];
        assert_eq!(resolve(&lines, None).text.chars().count(), 100);
    }

    #[test]
    fn test_nothing_yields_empty() {
        let title = resolve(&[], None);
        assert_eq!(title.text, "");
        assert_eq!(title.source, TitleSource::None);
    }

    #[test]
    fn test_metadata_used_when_page_empty() {
        let title = resolve(&[], Some("Quarterly Business Review"));
        assert_eq!(title.text, "Quarterly Business Review");
    }

    #[test]
    fn test_top_third_follows_media_box_origin() {
        // MediaBox [0 100 612 892]: the top third starts at 100 + 528.
        let page = crate::PageText {
            page: 1,
            height: Some(792.0),
            bottom: 100.0,
            runs: vec![],
        };
        let lines = vec![
            line("Low Banner", 24.0, true, 600.0),
            line("Body text.", 10.0, false, 400.0),
        ];
        let title = resolve_title(
            &lines,
            page.top_third_floor(),
            Some("A Reliable Metadata Title"),
            &OutlineConfig::default(),
        );
        assert_eq!(title.source, TitleSource::Metadata);

        let lines = vec![line("High Banner", 24.0, true, 700.0)];
        let title = resolve_title(&lines, page.top_third_floor(), None, &OutlineConfig::default());
        assert_eq!(title.text, "High Banner");
        assert_eq!(title.source, TitleSource::Visual);
    }

    #[test]
    fn test_unknown_height_uses_topmost_line() {
        let lines = vec![
            line("Document Title", 24.0, true, 700.0),
            line("Body text.", 10.0, false, 400.0),
        ];
        let title = resolve_title(&lines, None, None, &OutlineConfig::default());
        assert_eq!(title.source, TitleSource::Visual);
        assert_eq!(title.text, "Document Title");
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Input: positioned text runs
// ---------------------------------------------------------------------------

/// A single styled run of text as produced by the text-extraction
/// collaborator.
///
/// Coordinates are in PDF user space: `y` grows towards the top of the page,
/// so reading order is descending `y`, then ascending `x`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    #[serde(default)]
    pub font_size: f32,
    #[serde(default)]
    pub is_bold: bool,
    pub x: f32,
    pub y: f32,
    pub page: usize,
    /// Estimated horizontal advance of the run, when the extractor knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
}

impl TextRun {
    pub fn new(text: impl Into<String>, font_size: f32, is_bold: bool, x: f32, y: f32, page: usize) -> Self {
        TextRun {
            text: text.into(),
            font_size: sanitize_size(font_size),
            is_bold,
            x: sanitize_coordinate(x),
            y: sanitize_coordinate(y),
            page,
            width: None,
        }
    }

    pub fn with_width(mut self, width: f32) -> Self {
        self.width = Some(width);
        self
    }
}

/// Malformed sizes (NaN, infinite, negative) are treated as "no size".
pub(crate) fn sanitize_size(size: f32) -> f32 {
    if size.is_finite() && size > 0.0 {
        size
    } else {
        0.0
    }
}

/// Non-finite coordinates collapse to the page origin.
pub(crate) fn sanitize_coordinate(v: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// All runs found on one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageText {
    /// 1-based page number.
    pub page: usize,
    /// Page height in user-space units (MediaBox), if known.
    #[serde(default)]
    pub height: Option<f32>,
    /// Lower edge of the MediaBox; page coordinates start here, not at 0.
    #[serde(default)]
    pub bottom: f32,
    pub runs: Vec<TextRun>,
}

impl PageText {
    /// Baseline at or above which a line sits in the top third of the page.
    pub fn top_third_floor(&self) -> Option<f32> {
        self.height
            .filter(|h| *h > 0.0)
            .map(|h| self.bottom + h * 2.0 / 3.0)
    }
}

/// Everything the heading-inference engine needs to know about a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentText {
    pub pages: Vec<PageText>,
    #[serde(default)]
    pub metadata_title: Option<String>,
}

impl DocumentText {
    pub fn run_count(&self) -> usize {
        self.pages.iter().map(|p| p.runs.len()).sum()
    }

    pub fn first_page(&self) -> Option<&PageText> {
        self.pages.iter().min_by_key(|p| p.page)
    }
}

// ---------------------------------------------------------------------------
// Intermediate: lines and font profile
// ---------------------------------------------------------------------------

/// A logical line assembled from one or more [`TextRun`]s sharing a baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    /// Trimmed, whitespace-collapsed, never empty.
    pub text: String,
    /// Largest size among the constituent runs.
    pub font_size: f32,
    /// `true` if any constituent run is bold.
    pub is_bold: bool,
    pub page: usize,
    pub y_position: f32,
}

/// Body-text size and heading thresholds derived once per document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontProfile {
    pub body_size: f32,
    pub h1_threshold: f32,
    pub h2_threshold: f32,
    pub h3_threshold: f32,
}

impl FontProfile {
    /// Level implied by font size alone, if any threshold is reached.
    pub fn level_for_size(&self, font_size: f32) -> Option<HeadingLevel> {
        if font_size >= self.h1_threshold {
            Some(HeadingLevel::H1)
        } else if font_size >= self.h2_threshold {
            Some(HeadingLevel::H2)
        } else if font_size >= self.h3_threshold {
            Some(HeadingLevel::H3)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Output: outline
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
}

impl HeadingLevel {
    pub fn as_u8(&self) -> u8 {
        match self {
            HeadingLevel::H1 => 1,
            HeadingLevel::H2 => 2,
            HeadingLevel::H3 => 3,
        }
    }
}

impl fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H{}", self.as_u8())
    }
}

/// One entry of the outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingCandidate {
    pub level: HeadingLevel,
    pub text: String,
    pub page: usize,
}

/// The artifact produced per document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineResult {
    pub title: String,
    pub outline: Vec<HeadingCandidate>,
}

impl OutlineResult {
    /// The fallback written for documents that could not be processed.
    pub fn empty() -> Self {
        OutlineResult::default()
    }
}

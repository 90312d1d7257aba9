//! Core library for outliner
//!
//! This crate implements the **Functional Core** of the outliner application:
//! given positioned, styled text runs extracted from a PDF, it infers the
//! document title and a three-level heading outline without consulting any
//! bookmark metadata embedded in the file.
//!
//! # Architecture Overview
//!
//! - **`outliner_core`** (this crate): pure transformation functions, no I/O
//! - **`pdf`**: turns PDF bytes into [`DocumentText`]
//! - **`outliner`**: CLI, batch processing, file output
//!
//! # Pipeline
//!
//! ```text
//! TextRun[] --lines--> Line[] --profile--> FontProfile
//!                         |                    |
//!                         +----> classify <----+
//!                         |         |
//!      page-1 lines --> title       v
//!                         +----> assemble --> OutlineResult
//! ```
//!
//! Every stage is deterministic: the same [`DocumentText`] and
//! [`OutlineConfig`] always produce the same [`OutlineResult`].

pub mod assemble;
pub mod classify;
pub mod config;
pub mod error;
pub mod lines;
pub mod policy;
pub mod profile;
pub mod title;
pub mod types;

pub use classify::{Decision, HeadingClassifier};
pub use config::{FallbackProfile, OutlineConfig};
pub use error::{ConfigError, ExtractionError};
pub use policy::HEADING_POLICY_VERSION;
pub use title::{ResolvedTitle, TitleSource};
pub use types::*;

/// Intermediate results for one document, kept for diagnostics.
#[derive(Debug, Clone)]
pub struct DocumentAnalysis {
    pub profile: FontProfile,
    pub size_histogram: Vec<(f32, usize)>,
    pub title: ResolvedTitle,
    /// Every assembled line with its classification, in page/reading order.
    pub lines: Vec<(Line, Decision)>,
}

impl DocumentAnalysis {
    /// Headings in discovery order, before dedup.
    pub fn candidates(&self) -> Vec<HeadingCandidate> {
        self.lines
            .iter()
            .filter_map(|(line, decision)| {
                decision.level.map(|level| HeadingCandidate {
                    level,
                    text: line.text.clone(),
                    page: line.page,
                })
            })
            .collect()
    }

    pub fn into_outline(self) -> OutlineResult {
        let candidates = self.candidates();
        assemble::assemble_outline(self.title.text, candidates)
    }
}

/// Run every stage except the final assembly.
pub fn analyze_document(
    doc: &DocumentText,
    config: &OutlineConfig,
) -> Result<DocumentAnalysis, ExtractionError> {
    if doc.pages.is_empty() {
        return Err(ExtractionError::NoPages);
    }
    if doc.run_count() == 0 {
        return Err(ExtractionError::EmptyDocument);
    }

    let lines = lines::assemble_document(doc, config.line_tolerance);
    let profile = profile::build_font_profile(&lines, config);
    log::debug!(
        "{} lines, body size {:.1}, thresholds h3 {:.1} / h2 {:.1} / h1 {:.1}",
        lines.len(),
        profile.body_size,
        profile.h3_threshold,
        profile.h2_threshold,
        profile.h1_threshold
    );

    let title = match doc.first_page() {
        Some(first) => {
            let first_lines: Vec<Line> = lines
                .iter()
                .filter(|l| l.page == first.page)
                .cloned()
                .collect();
            title::resolve_title(
                &first_lines,
                first.top_third_floor(),
                doc.metadata_title.as_deref(),
                config,
            )
        }
        None => title::resolve_title(&[], None, doc.metadata_title.as_deref(), config),
    };
    log::debug!("title from {}: {:?}", title.source, title.text);

    let classifier = HeadingClassifier::new(profile, config);
    let size_histogram = profile::size_histogram(&lines);
    let lines = lines
        .into_iter()
        .map(|line| {
            let decision = classifier.explain(&line);
            (line, decision)
        })
        .collect();

    Ok(DocumentAnalysis {
        profile,
        size_histogram,
        title,
        lines,
    })
}

/// Infer the title and outline of one document.
pub fn infer_outline(
    doc: &DocumentText,
    config: &OutlineConfig,
) -> Result<OutlineResult, ExtractionError> {
    let outline = analyze_document(doc, config)?.into_outline();
    log::debug!("{} outline entries", outline.outline.len());
    Ok(outline)
}

/// Like [`infer_outline`], but any failure becomes the empty result.
pub fn infer_outline_or_empty(doc: &DocumentText, config: &OutlineConfig) -> OutlineResult {
    infer_outline(doc, config).unwrap_or_else(|e| {
        log::warn!("{}", e);
        OutlineResult::empty()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const PAGE_HEIGHT: f32 = 792.0;

    fn run(text: &str, size: f32, bold: bool, x: f32, y: f32, page: usize) -> TextRun {
        TextRun::new(text, size, bold, x, y, page)
    }

    fn page(page: usize, runs: Vec<TextRun>) -> PageText {
        PageText {
            page,
            height: Some(PAGE_HEIGHT),
            bottom: 0.0,
            runs,
        }
    }

    fn body(page_no: usize, start_y: f32, count: usize) -> Vec<TextRun> {
        (0..count)
            .map(|i| {
                run(
                    "ordinary body text that fills the page",
                    10.0,
                    false,
                    72.0,
                    start_y - i as f32 * 14.0,
                    page_no,
                )
            })
            .collect()
    }

    fn sample_document() -> DocumentText {
        let mut first = vec![run("Annual Report 2024", 24.0, true, 72.0, 740.0, 1)];
        first.extend(body(1, 680.0, 6));

        let mut second = vec![
            run("1. Introduction", 14.0, true, 72.0, 740.0, 2),
            run("1.1 Background", 12.0, true, 72.0, 700.0, 2),
            run("Page 2", 10.0, false, 300.0, 40.0, 2),
        ];
        second.extend(body(2, 680.0, 8));

        let mut third = vec![
            run("2.", 14.0, true, 72.0, 740.0, 3),
            run("Scope", 14.0, true, 92.0, 740.0, 3),
            run("2. Scope", 14.0, true, 72.0, 600.0, 3),
            run("1.2.3 Details", 10.0, false, 72.0, 560.0, 3),
            run("INTRODUCTION", 15.0, false, 72.0, 500.0, 3),
        ];
        third.extend(body(3, 480.0, 8));

        DocumentText {
            pages: vec![page(1, first), page(2, second), page(3, third)],
            metadata_title: Some("Microsoft Word - report.docx".to_string()),
        }
    }

    #[test]
    fn test_end_to_end_outline() {
        let result = infer_outline(&sample_document(), &OutlineConfig::default()).unwrap();

        assert_eq!(result.title, "Annual Report 2024");
        let entries: Vec<(HeadingLevel, &str, usize)> = result
            .outline
            .iter()
            .map(|h| (h.level, h.text.as_str(), h.page))
            .collect();
        assert_eq!(
            entries,
            vec![
                (HeadingLevel::H1, "1. Introduction", 2),
                (HeadingLevel::H2, "1.1 Background", 2),
                (HeadingLevel::H1, "2. Scope", 3),
                (HeadingLevel::H3, "1.2.3 Details", 3),
                (HeadingLevel::H2, "INTRODUCTION", 3),
            ]
        );
    }

    #[test]
    fn test_title_not_in_outline() {
        let result = infer_outline(&sample_document(), &OutlineConfig::default()).unwrap();
        assert!(!result
            .outline
            .iter()
            .any(|h| h.page == 1 && h.text == result.title));
    }

    #[test]
    fn test_outline_invariants() {
        let result = infer_outline(&sample_document(), &OutlineConfig::default()).unwrap();
        for w in result.outline.windows(2) {
            assert!(w[0].page <= w[1].page);
        }
        let keys: HashSet<_> = result
            .outline
            .iter()
            .map(|h| (h.text.to_lowercase(), h.page))
            .collect();
        assert_eq!(keys.len(), result.outline.len());
    }

    #[test]
    fn test_pipeline_is_deterministic() {
        let doc = sample_document();
        let config = OutlineConfig::default();
        assert_eq!(
            infer_outline(&doc, &config).unwrap(),
            infer_outline(&doc, &config).unwrap()
        );
    }

    #[test]
    fn test_no_pages_is_error() {
        let result = infer_outline(&DocumentText::default(), &OutlineConfig::default());
        assert!(matches!(result, Err(ExtractionError::NoPages)));
    }

    #[test]
    fn test_no_runs_is_empty_document() {
        let doc = DocumentText {
            pages: vec![page(1, vec![])],
            metadata_title: None,
        };
        let result = infer_outline(&doc, &OutlineConfig::default());
        assert!(matches!(result, Err(ExtractionError::EmptyDocument)));
    }

    #[test]
    fn test_failures_downgrade_to_empty() {
        let result = infer_outline_or_empty(&DocumentText::default(), &OutlineConfig::default());
        assert_eq!(result, OutlineResult::empty());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json, serde_json::json!({"title": "", "outline": []}));
    }

    #[test]
    fn test_analysis_reports_profile_and_rules() {
        let analysis = analyze_document(&sample_document(), &OutlineConfig::default()).unwrap();
        assert!((analysis.profile.body_size - 10.0).abs() < 0.01);
        assert_eq!(analysis.title.source, TitleSource::Visual);
        let page_rule = analysis
            .lines
            .iter()
            .find(|(line, _)| line.text == "Page 2")
            .map(|(_, d)| d.rule);
        assert_eq!(page_rule, Some("page-number"));
    }
}

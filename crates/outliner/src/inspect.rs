use std::path::PathBuf;

use outliner_core::{DocumentAnalysis, HEADING_POLICY_VERSION};

use crate::prelude::{println, *};

/// Table cells longer than this are cut.
const MAX_CELL_CHARS: usize = 60;

#[derive(Debug, clap::Parser)]
#[command(name = "inspect")]
#[command(about = "Show the font profile and per-line classification of a PDF")]
pub struct App {
    /// Path to the PDF file
    #[clap(env = "OUTLINER_INPUT")]
    pub path: PathBuf,

    /// Only list lines classified as headings
    #[arg(long, env = "OUTLINER_HEADINGS_ONLY", default_value = "false")]
    pub headings_only: bool,
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    if !app.path.is_file() {
        return Err(Error::NotAFile(app.path).into());
    }
    let config = crate::config::load(&global)?;

    let path = app.path.clone();
    let analysis = tokio::task::spawn_blocking(move || -> Result<DocumentAnalysis> {
        let doc = pdf::extract_document_from_path(&path)
            .wrap_err_with(|| f!("extracting {}", path.display()))?;
        outliner_core::analyze_document(&doc, &config).wrap_err("analyzing document")
    })
    .await
    .wrap_err("inspect worker panicked")??;

    println!("{}", summary(&analysis));
    println!();

    let mut table = new_table();
    table.add_row(prettytable::row!["Page", "Size", "Bold", "Level", "Rule", "Text"]);
    for (line, decision) in &analysis.lines {
        if app.headings_only && decision.level.is_none() {
            continue;
        }
        let bold = if line.is_bold { "yes" } else { "" };
        let level = decision.level.map(|l| l.to_string()).unwrap_or_default();
        table.add_row(prettytable::row![
            line.page,
            f!("{:.1}", line.font_size),
            bold,
            level,
            decision.rule,
            truncate(&line.text, MAX_CELL_CHARS),
        ]);
    }
    table.printstd();

    Ok(())
}

fn summary(analysis: &DocumentAnalysis) -> String {
    let profile = &analysis.profile;
    let sizes = analysis
        .size_histogram
        .iter()
        .map(|(size, count)| f!("{:.1}x{}", size, count))
        .collect::<Vec<_>>()
        .join(", ");
    let headings = analysis
        .lines
        .iter()
        .filter(|(_, d)| d.level.is_some())
        .count();

    [
        f!("Title ({}): {}", analysis.title.source, analysis.title.text),
        f!(
            "Body {:.1} | H3 >= {:.1} | H2 >= {:.1} | H1 >= {:.1}",
            profile.body_size,
            profile.h3_threshold,
            profile.h2_threshold,
            profile.h1_threshold
        ),
        f!("Sizes: {}", sizes),
        f!(
            "Lines: {} ({} headings before dedup), policy v{}",
            analysis.lines.len(),
            headings,
            HEADING_POLICY_VERSION
        ),
    ]
    .join("\n")
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}

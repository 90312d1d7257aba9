use std::path::{Path, PathBuf};

use outliner_core::{ExtractionError, OutlineConfig, OutlineResult};

use crate::prelude::{println, *};

#[derive(Debug, clap::Parser)]
#[command(name = "outline")]
#[command(about = "Infer the outline of a single PDF")]
pub struct App {
    /// Path to the PDF file
    #[clap(env = "OUTLINER_INPUT")]
    pub path: PathBuf,

    /// Write the JSON to this file instead of stdout
    #[arg(short, long, env = "OUTLINER_OUTPUT")]
    pub output: Option<PathBuf>,
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    if !app.path.is_file() {
        return Err(Error::NotAFile(app.path).into());
    }
    let config = crate::config::load(&global)?;

    let path = app.path.clone();
    let result = tokio::task::spawn_blocking(move || outline_file_or_empty(&path, &config))
        .await
        .wrap_err("outline worker panicked")?;

    match app.output {
        Some(out) => {
            write_json(&out, &result)?;
            if global.verbose {
                println!("Wrote {}", out.display());
            }
        }
        None => println!("{}", to_json(&result)?),
    }
    Ok(())
}

/// Read, extract and outline one PDF.
pub fn try_outline_file(
    path: &Path,
    config: &OutlineConfig,
) -> std::result::Result<OutlineResult, ExtractionError> {
    let doc = pdf::extract_document_from_path(path)?;
    log::debug!(
        "{}: {} pages, {} runs",
        path.display(),
        doc.pages.len(),
        doc.run_count()
    );
    outliner_core::infer_outline(&doc, config)
}

/// Like [`try_outline_file`]; any failure becomes the empty result.
pub fn outline_file_or_empty(path: &Path, config: &OutlineConfig) -> OutlineResult {
    try_outline_file(path, config).unwrap_or_else(|e| {
        log::warn!("{}: {}", path.display(), e);
        OutlineResult::empty()
    })
}

pub fn to_json(result: &OutlineResult) -> Result<String> {
    serde_json::to_string_pretty(result).wrap_err("serializing outline")
}

pub fn write_json(path: &Path, result: &OutlineResult) -> Result<()> {
    let mut json = to_json(result)?;
    json.push('\n');
    std::fs::write(path, json).wrap_err_with(|| f!("writing {}", path.display()))
}

use std::collections::HashSet;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use outliner_core::{OutlineConfig, OutlineResult};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::outline::{try_outline_file, write_json};
use crate::prelude::{eprintln, *};

#[derive(Debug, clap::Parser)]
#[command(name = "batch")]
#[command(about = "Infer outlines for every PDF in a directory")]
pub struct App {
    /// Directory containing the PDF files
    #[clap(env = "OUTLINER_INPUT_DIR")]
    pub input_dir: PathBuf,

    /// Directory receiving one `<name>.json` per PDF (created if missing)
    #[clap(env = "OUTLINER_OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Documents processed concurrently [default: number of CPUs]
    #[arg(short, long, env = "OUTLINER_JOBS")]
    pub jobs: Option<usize>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub failed: usize,
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let config = crate::config::load(&global)?;
    let jobs = app.jobs.unwrap_or_else(default_jobs).max(1);

    let pdfs = collect_pdfs(&app.input_dir)?;
    let progress = progress_bar(pdfs.len());

    let summary = process_files(pdfs, &app.output_dir, jobs, Arc::new(config), progress).await?;

    log::info!(
        "processed {} documents, {} failed",
        summary.processed,
        summary.failed
    );
    if global.verbose || summary.failed > 0 {
        eprintln!(
            "Processed {} documents ({} failed) into {}",
            summary.processed,
            summary.failed,
            app.output_dir.display()
        );
    }
    Ok(())
}

fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn progress_bar(len: usize) -> ProgressBar {
    if !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("=> "));
    }
    pb
}

/// Every regular file in `dir` with a `.pdf` extension (any case), sorted.
pub fn collect_pdfs(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::NotADirectory(dir.to_path_buf()).into());
    }

    let mut pdfs = Vec::new();
    for entry in std::fs::read_dir(dir).wrap_err_with(|| f!("listing {}", dir.display()))? {
        let path = entry?.path();
        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf && path.is_file() {
            pdfs.push(path);
        }
    }
    pdfs.sort();
    Ok(pdfs)
}

/// `<output_dir>/<pdf stem>.json`
pub fn output_path(output_dir: &Path, pdf: &Path) -> PathBuf {
    let stem = pdf
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    output_dir.join(f!("{}.json", stem))
}

/// One output path per PDF, in input order. When two inputs share a stem
/// (`a.pdf` and `a.PDF`, compared case-insensitively), the later one is
/// written to `<file name>.json` instead so that no two workers share a file.
pub fn output_paths(output_dir: &Path, pdfs: &[PathBuf]) -> Vec<PathBuf> {
    let mut taken: HashSet<String> = HashSet::new();
    pdfs.iter()
        .map(|pdf| {
            let preferred = output_path(output_dir, pdf);
            if claim(&mut taken, &preferred) {
                return preferred;
            }

            let name = pdf
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "document".to_string());
            let mut candidate = output_dir.join(f!("{}.json", name));
            let mut n = 2;
            while !claim(&mut taken, &candidate) {
                candidate = output_dir.join(f!("{}-{}.json", name, n));
                n += 1;
            }
            log::warn!(
                "{}: output name already used, writing {}",
                pdf.display(),
                candidate.display()
            );
            candidate
        })
        .collect()
}

fn claim(taken: &mut HashSet<String>, path: &Path) -> bool {
    taken.insert(path.to_string_lossy().to_lowercase())
}

/// Outline every file on a bounded pool of blocking workers. A document that
/// cannot be processed still gets a JSON file holding the empty result.
pub async fn process_files(
    pdfs: Vec<PathBuf>,
    output_dir: &Path,
    jobs: usize,
    config: Arc<OutlineConfig>,
    progress: ProgressBar,
) -> Result<BatchSummary> {
    std::fs::create_dir_all(output_dir)
        .wrap_err_with(|| f!("creating {}", output_dir.display()))?;

    if pdfs.is_empty() {
        log::warn!("no PDF files to process");
        progress.finish_and_clear();
        return Ok(BatchSummary::default());
    }

    let semaphore = Arc::new(Semaphore::new(jobs));
    let mut set = JoinSet::new();

    let outputs = output_paths(output_dir, &pdfs);
    for (pdf, out) in pdfs.into_iter().zip(outputs) {
        let semaphore = semaphore.clone();
        let config = config.clone();

        set.spawn(async move {
            // Only fails once the semaphore is closed, which never happens here.
            let _permit = semaphore.acquire_owned().await.ok();

            let worker_pdf = pdf.clone();
            let worker_out = out.clone();
            let succeeded = tokio::task::spawn_blocking(move || {
                process_one(&worker_pdf, &worker_out, &config)
            })
            .await
            .unwrap_or_else(|e| {
                log::error!("{}: worker failed: {}", pdf.display(), e);
                if let Err(e) = write_json(&out, &OutlineResult::empty()) {
                    log::error!("{:#}", e);
                }
                false
            });

            (pdf, succeeded)
        });
    }

    let mut summary = BatchSummary::default();
    while let Some(joined) = set.join_next().await {
        let (pdf, succeeded) = joined.wrap_err("batch task failed")?;
        summary.processed += 1;
        if !succeeded {
            summary.failed += 1;
        }
        if let Some(name) = pdf.file_name() {
            progress.set_message(name.to_string_lossy().into_owned());
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    Ok(summary)
}

/// Returns `false` when the document fell back to the empty result or its
/// JSON could not be written.
fn process_one(pdf: &Path, out: &Path, config: &OutlineConfig) -> bool {
    let (result, succeeded) = match try_outline_file(pdf, config) {
        Ok(result) => (result, true),
        Err(e) => {
            log::warn!("{}: {}", pdf.display(), e);
            (OutlineResult::empty(), false)
        }
    };

    if let Err(e) = write_json(out, &result) {
        log::error!("{:#}", e);
        return false;
    }

    log::info!(
        "{} -> {} ({} headings)",
        pdf.display(),
        out.display(),
        result.outline.len()
    );
    succeeded
}

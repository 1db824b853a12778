//! Batch processing of a setlist directory
//!
//! Discovers audio files, runs [`VocalSeparationService::process`] for each on
//! a rayon pool, and writes one JSON report. Feature extraction runs in
//! parallel; separation is serialized by the shared engine handle. A failing
//! track is recorded in the report and never stops the batch.

use super::processor::sanitize_title;
use super::service::VocalSeparationService;
use crate::discovery::{self, DiscoveredFile};
use crate::error::{Result, VocalprepError};
use crate::export::{self, BatchReport, BatchSummary};
use crate::types::TrackProcessingResult;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Report filename written into the batch output directory
pub const REPORT_FILENAME: &str = "vocalprep.json";

/// Batch run options
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Input path (file or directory)
    pub input: PathBuf,
    /// Base output directory
    pub output_dir: PathBuf,
    /// Scan recursively
    pub recursive: bool,
    /// Worker threads
    pub threads: usize,
    /// Show a progress bar
    pub show_progress: bool,
}

/// Batch outcome
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub summary: BatchSummary,
    /// Report path, if any tracks were found
    pub report_path: Option<PathBuf>,
}

/// Process every supported audio file under `options.input`
pub fn run_batch(service: &VocalSeparationService, options: &BatchOptions) -> Result<BatchOutcome> {
    let batch_start = Instant::now();

    info!("Scanning for audio files...");
    let files = discovery::scan(&options.input, options.recursive)?;

    if files.is_empty() {
        return Ok(BatchOutcome {
            summary: BatchSummary::default(),
            report_path: None,
        });
    }

    let titles = assign_titles(&files);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.threads.max(1))
        .build()
        .map_err(|e| {
            VocalprepError::Io(std::io::Error::other(format!(
                "Failed to configure thread pool: {}",
                e
            )))
        })?;
    debug!("Processing with {} threads", pool.current_num_threads());

    let progress_bar = if options.show_progress {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    let tracks: Vec<TrackProcessingResult> = pool.install(|| {
        files
            .par_iter()
            .zip(titles.par_iter())
            .map(|(file, title)| {
                let result = process_file(service, file, title, options);
                if let Some(ref pb) = progress_bar {
                    pb.inc(1);
                    pb.set_message(result.song_title.clone());
                }
                result
            })
            .collect()
    });

    if let Some(pb) = progress_bar {
        pb.finish_with_message("Processing complete");
    }

    if let Some(engine) = service.engine().engine_name() {
        debug!("Separation engine used: {}", engine);
    }

    let summary = BatchSummary::from_tracks(&tracks);
    info!(
        "Batch completed in {:.2}s: {} separated, {} passed through, {} failed",
        batch_start.elapsed().as_secs_f64(),
        summary.separated,
        summary.passthrough,
        summary.failed
    );

    std::fs::create_dir_all(&options.output_dir)
        .map_err(|e| VocalprepError::output_error(&options.output_dir, e))?;
    let report_path = options.output_dir.join(REPORT_FILENAME);
    export::write_report(&BatchReport::new(summary.clone(), tracks), &report_path)?;

    Ok(BatchOutcome {
        summary,
        report_path: Some(report_path),
    })
}

/// Give every file a title whose sanitized form is unique within the batch
///
/// Tracks with the same name in different folders would otherwise share an
/// output directory. Files are sorted, so the first keeps its stem and later
/// ones get ` 2`, ` 3`, ... appended. Comparison ignores case.
fn assign_titles(files: &[DiscoveredFile]) -> Vec<String> {
    let mut taken = HashSet::new();
    files
        .iter()
        .map(|file| {
            let stem = file.title();
            let mut title = stem.clone();
            let mut n = 2;
            while !taken.insert(sanitize_title(&title).to_lowercase()) {
                title = format!("{} {}", stem, n);
                n += 1;
            }
            if title != stem {
                info!("{}: title '{}' already used, using '{}'", file.path.display(), stem, title);
            }
            title
        })
        .collect()
}

fn process_file(
    service: &VocalSeparationService,
    file: &DiscoveredFile,
    title: &str,
    options: &BatchOptions,
) -> TrackProcessingResult {
    debug!("Processing {} as '{}'", file.path.display(), title);

    let result = service.process(&file.path, title, &options.output_dir);
    if let Some(ref message) = result.error {
        match result.error_kind {
            Some(kind) if !kind.is_recoverable() => error!("{}: {}", file.path.display(), message),
            _ => warn!("{}: {}", file.path.display(), message),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AudioFormat;
    use std::path::Path;

    fn wav(path: &str) -> DiscoveredFile {
        DiscoveredFile {
            path: Path::new(path).to_path_buf(),
            format: AudioFormat::Wav,
            size_bytes: 0,
        }
    }

    #[test]
    fn test_assign_titles_keeps_unique_stems() {
        let files = vec![wav("/set/01 Intro.wav"), wav("/set/02 Hook.wav")];
        assert_eq!(assign_titles(&files), vec!["01 Intro", "02 Hook"]);
    }

    #[test]
    fn test_assign_titles_numbers_duplicates() {
        let files = vec![
            wav("/set/a/Song.wav"),
            wav("/set/b/Song.wav"),
            wav("/set/c/song.wav"),
        ];
        assert_eq!(assign_titles(&files), vec!["Song", "Song 2", "song 3"]);
    }

    #[test]
    fn test_assign_titles_compares_sanitized_names() {
        // "Song?" and "Song" both land in the "Song" directory
        let files = vec![wav("/set/a/Song.wav"), wav("/set/b/Song?.wav"), wav("/set/c/Song 2.wav")];
        assert_eq!(assign_titles(&files), vec!["Song", "Song? 2", "Song 2 2"]);
    }
}

//! Batch driver: fan photos out over a bounded worker pool, fan the results
//! back in, and persist the sorted manifest.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;

use crate::config::Config;
use crate::error::{ConfigError, PipelineError, PipelineResult, Result};
use crate::manifest::Manifest;
use crate::types::{BatchSummary, PhotoOutcome, SkipReason};

use super::discovery::{DiscoveredFile, FileDiscovery};
use super::processor::{CommitGate, PhotoProcessor};

/// Runs every photo in a source directory and writes the manifest.
pub struct BatchDriver {
    config: Config,
    discovery: FileDiscovery,
}

impl BatchDriver {
    /// Create a driver; the configuration is validated up front.
    pub fn new(config: Config) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            discovery: FileDiscovery::new(config.processing.clone()),
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// List the source photos a run over `source_dir` would process.
    ///
    /// A missing directory is fatal.
    pub fn discover(&self, source_dir: &Path) -> Result<Vec<DiscoveredFile>> {
        let files = self.discovery.discover(source_dir)?;
        tracing::info!(
            "Found {} photo(s) ({:.1} MB) in {}",
            files.len(),
            FileDiscovery::total_size(&files) as f64 / 1_000_000.0,
            source_dir.display()
        );
        Ok(files)
    }

    /// Process `source_dir` into `dest_root` and write `dest_root/<manifest>`.
    pub async fn run(&self, source_dir: &Path, dest_root: &Path) -> Result<BatchSummary> {
        self.run_with_progress(source_dir, dest_root, |_, _| {})
            .await
    }

    /// Like [`BatchDriver::run`], calling `on_result` as each photo completes.
    pub async fn run_with_progress<F>(
        &self,
        source_dir: &Path,
        dest_root: &Path,
        on_result: F,
    ) -> Result<BatchSummary>
    where
        F: FnMut(&Path, &PhotoOutcome),
    {
        let files = self.discover(source_dir)?;
        self.run_discovered(files, dest_root, on_result).await
    }

    /// Process already discovered `files` into `dest_root`.
    ///
    /// Photos run concurrently on the blocking pool, at most
    /// `processing.parallel_workers` at a time, and complete in any order.
    /// `on_result` is called exactly once per file. Input defects skip the
    /// photo; a write failure aborts the photos still queued and is returned
    /// without writing a manifest.
    pub async fn run_discovered<F>(
        &self,
        files: Vec<DiscoveredFile>,
        dest_root: &Path,
        mut on_result: F,
    ) -> Result<BatchSummary>
    where
        F: FnMut(&Path, &PhotoOutcome),
    {
        let start = Instant::now();
        let processor = Arc::new(PhotoProcessor::new(&self.config, dest_root)?);
        let semaphore = Arc::new(Semaphore::new(self.config.processing.parallel_workers));
        let timeout = self.config.limits.photo_timeout_ms.map(Duration::from_millis);

        let mut summary = BatchSummary {
            discovered: files.len(),
            ..BatchSummary::default()
        };

        let mut tasks = JoinSet::new();
        let mut pending = HashMap::with_capacity(files.len());
        for file in files {
            let processor = processor.clone();
            let semaphore = semaphore.clone();
            let path = file.path.clone();
            let handle = tasks.spawn(async move {
                match semaphore.acquire_owned().await {
                    Ok(permit) => process_one(processor, path, timeout, permit).await,
                    Err(_) => {
                        tracing::warn!("Worker pool closed before {:?} could run", path);
                        Ok(PhotoOutcome::Skipped(SkipReason::Panicked(
                            "worker pool closed".to_string(),
                        )))
                    }
                }
            });
            pending.insert(handle.id(), file.path);
        }

        let mut records = Vec::with_capacity(summary.discovered);
        while let Some(joined) = tasks.join_next_with_id().await {
            let (path, result) = match joined {
                Ok((id, result)) => (pending.remove(&id).unwrap_or_default(), result),
                Err(e) => {
                    tracing::error!("Batch task failed: {e}");
                    let path = pending.remove(&e.id()).unwrap_or_default();
                    (path, Ok(PhotoOutcome::Skipped(SkipReason::Panicked(e.to_string()))))
                }
            };

            let outcome = match result {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("Aborting batch: {e}");
                    tasks.abort_all();
                    return Err(e.into());
                }
            };
            on_result(&path, &outcome);

            match outcome {
                PhotoOutcome::Done {
                    metadata,
                    written,
                    unchanged,
                } => {
                    summary.variants_written += written;
                    summary.variants_unchanged += unchanged;
                    records.push(metadata);
                }
                PhotoOutcome::Skipped(reason) => {
                    summary.skipped += 1;
                    if reason == SkipReason::TimedOut {
                        summary.timed_out += 1;
                    }
                }
            }
        }

        tracing::info!("{} photos processed", summary.discovered);

        let manifest = Manifest::from_records(records);
        let manifest_path = dest_root.join(&self.config.layout.manifest_name);
        tracing::info!("Saving meta to {}", manifest_path.display());
        manifest.write_to(&manifest_path)?;
        tracing::info!(
            "{} of {} photos written to manifest",
            manifest.len(),
            summary.discovered
        );

        summary.processed = manifest.len();
        summary.manifest_path = manifest_path;
        summary.elapsed = start.elapsed();
        Ok(summary)
    }
}

/// Run one photo on the blocking pool, holding `permit` until the work ends.
///
/// On timeout the photo is abandoned through its [`CommitGate`]: it stops at
/// the next stage boundary and writes nothing. If its writes had already
/// begun, the timeout is ignored and the photo is awaited to completion so
/// its files and any write error are accounted for.
async fn process_one(
    processor: Arc<PhotoProcessor>,
    path: PathBuf,
    timeout: Option<Duration>,
    permit: OwnedSemaphorePermit,
) -> PipelineResult<PhotoOutcome> {
    let gate = Arc::new(CommitGate::new());
    let worker_gate = gate.clone();
    let worker_path = path.clone();
    let mut handle = tokio::task::spawn_blocking(move || {
        let result = processor.process_gated(&worker_path, &worker_gate);
        drop(permit);
        result
    });

    let joined = match timeout {
        Some(limit) => {
            let waited = tokio::time::timeout(limit, &mut handle).await;
            match waited {
                Ok(joined) => joined,
                Err(_) if gate.abandon() => {
                    let err = PipelineError::Timeout {
                        path,
                        stage: "process".to_string(),
                        timeout_ms: limit.as_millis() as u64,
                    };
                    tracing::error!("{err}");
                    return Ok(PhotoOutcome::Skipped(SkipReason::TimedOut));
                }
                Err(_) => {
                    tracing::debug!("{:?} passed its timeout while writing; waiting", path);
                    handle.await
                }
            }
        }
        None => handle.await,
    };

    match joined {
        Ok(result) => result,
        Err(e) => {
            tracing::error!("Worker for {:?} panicked: {e}", path);
            Ok(PhotoOutcome::Skipped(SkipReason::Panicked(e.to_string())))
        }
    }
}

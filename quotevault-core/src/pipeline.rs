//! Job orchestrator: ensure bucket → fetch → transform → encode → upload.
//!
//! Strictly sequential, one attempt per stage. The first failure ends the
//! run in [`Stage::Failed`]; nothing is rolled back (a created bucket stays,
//! a written scratch file stays). The outcome is returned as a value so a
//! scheduler can branch on it without parsing logs.

use crate::config::JobConfig;
use crate::encode::{self, EncodeError};
use crate::quote::{FetchError, QuoteSource};
use crate::snapshot::{self, SnapshotRecord, TransformError};
use crate::store::{self, ObjectStore, StoreError};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Job states, in the order a successful run passes through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    BucketReady,
    Fetched,
    Transformed,
    Encoded,
    Uploaded,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "START",
            Self::BucketReady => "BUCKET_READY",
            Self::Fetched => "FETCHED",
            Self::Transformed => "TRANSFORMED",
            Self::Encoded => "ENCODED",
            Self::Uploaded => "UPLOADED",
            Self::Done => "DONE",
            Self::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// Any stage failure. Flattened to a message once it reaches `run_job`.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct JobReport {
    pub record: SnapshotRecord,
    pub bucket: String,
    pub key: String,
    pub local_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Succeeded(JobReport),
    Failed {
        /// Last stage reached before the failure.
        stage: Stage,
        message: String,
    },
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    /// Terminal state: `Done` or `Failed`.
    pub fn final_stage(&self) -> Stage {
        match self {
            Self::Succeeded(_) => Stage::Done,
            Self::Failed { .. } => Stage::Failed,
        }
    }
}

/// Tracks the current stage so a failure can report where it happened.
struct Progress {
    stage: Stage,
}

impl Progress {
    fn advance(&mut self, next: Stage) {
        tracing::debug!(from = %self.stage, to = %next, "stage transition");
        self.stage = next;
    }
}

/// Run one snapshot job. Never panics on stage failure and never returns
/// an error: every failure is logged as `Job failed: <message>` and
/// reported in the outcome.
pub fn run_job(
    config: &JobConfig,
    source: &dyn QuoteSource,
    store: &dyn ObjectStore,
) -> JobOutcome {
    let mut progress = Progress {
        stage: Stage::Start,
    };

    match run_stages(config, source, store, &mut progress) {
        Ok(report) => {
            progress.advance(Stage::Done);
            tracing::info!(
                "Job completed successfully at {}",
                chrono::Local::now().naive_local()
            );
            JobOutcome::Succeeded(report)
        }
        Err(e) => {
            let message = e.to_string();
            tracing::error!(stage = %progress.stage, "Job failed: {message}");
            JobOutcome::Failed {
                stage: progress.stage,
                message,
            }
        }
    }
}

fn run_stages(
    config: &JobConfig,
    source: &dyn QuoteSource,
    store: &dyn ObjectStore,
    progress: &mut Progress,
) -> Result<JobReport, PipelineError> {
    let dest = &config.destination;

    store::ensure_bucket_exists(store, &dest.bucket, &dest.region)?;
    progress.advance(Stage::BucketReady);

    tracing::debug!(source = source.name(), symbol = %config.symbol, "fetching quote");
    let raw = source.fetch_quote(&config.symbol)?;
    progress.advance(Stage::Fetched);

    let captured_at = chrono::Local::now().fixed_offset();
    let record = snapshot::transform(&raw, &config.symbol, captured_at)?;
    progress.advance(Stage::Transformed);

    let encoded = encode::encode(&record, &config.scratch_dir, &config.file_label)?;
    progress.advance(Stage::Encoded);

    let key = store::upload(store, &encoded.path, &encoded.file_name, dest)?;
    progress.advance(Stage::Uploaded);

    Ok(JobReport {
        record,
        bucket: dest.bucket.clone(),
        key,
        local_path: encoded.path,
    })
}

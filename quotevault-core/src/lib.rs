//! QuoteVault Core — one-shot quote snapshot pipeline.
//!
//! This crate contains every stage of the job:
//! - Configuration value object (defaults, TOML file, environment)
//! - Quote source trait and the Finnhub client
//! - Snapshot transform (raw quote → flat record)
//! - CSV encoding into local scratch storage
//! - Object store trait with S3 and local-directory backends
//! - The orchestrator that sequences the stages and reports the outcome

pub mod config;
pub mod encode;
pub mod pipeline;
pub mod quote;
pub mod snapshot;
pub mod store;

pub use config::{ApiKey, ConfigError, JobConfig, StorageLocation};
pub use encode::{encode, encode_at, EncodeError, EncodedFile};
pub use pipeline::{run_job, JobOutcome, JobReport, PipelineError, Stage};
pub use quote::{FetchError, FinnhubClient, QuoteSource, RawQuote};
pub use snapshot::{transform, SnapshotRecord, TransformError};
pub use store::{
    ensure_bucket_exists, object_key, upload, LocalStore, ObjectStore, S3Store, StoreError,
};

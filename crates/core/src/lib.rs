//! # stagecheck-core
//!
//! Validates the infrastructure template carried by a pipeline job.
//!
//! A job flows through four steps, strictly in order:
//!
//! ```text
//! event ──► download artifact ──► extract zip ──► validate template ──► signal
//!              (ArtifactStore)     (archive)       (TemplateValidator)  (JobReporter)
//! ```
//!
//! [`ValidationHandler::handle_json`] takes the raw invocation payload and
//! [`ValidationHandler::handle`] a parsed event; both send exactly one signal
//! per job. The
//! service traits in [`services`] keep the workflow independent of the
//! cloud SDKs behind them.

#![warn(missing_docs)]

pub mod archive;
pub mod config;
pub mod error;
pub mod event;
pub mod handler;
pub mod scratch;
pub mod services;
pub mod template;

pub use config::HandlerConfig;
pub use error::{Error, ErrorCategory, Result};
pub use event::{ArtifactCredentials, ArtifactRequest, PipelineEvent, PipelineJob, S3Location};
pub use handler::{JobOutcome, ValidationHandler};
pub use services::{ArtifactStore, FailureDetails, JobReporter, SuccessDetails, TemplateValidator};
pub use template::{TemplateParameter, TemplateSummary};

//! sysclean - find and reclaim disposable disk space.
//!
//! The [`engine::ExecutionEngine`] is the single entry point for both front
//! ends: it resolves a task selection against the host's
//! [`platform::PlatformCapabilities`], runs each task in Analyze or Execute
//! mode with failures contained per task, and returns a
//! [`report::ResultReport`].

pub mod app;
pub mod cancel;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod output;
pub mod platform;
pub mod registry;
pub mod report;
pub mod task;
pub mod tasks;
pub mod utils;

pub use cancel::CancelToken;
pub use config::{CleanupConfig, TrashLocation};
pub use engine::{EngineEvent, ExecutionEngine};
pub use error::{InvocationError, TaskError};
pub use platform::{OsFamily, PlatformCapabilities, StorageMedium};
pub use registry::{DefaultTaskFactory, Resolution, TaskFactory, TaskRegistry};
pub use report::{OutcomeStatus, ResultReport, TaskOutcome};
pub use task::{ExecutionMode, ItemError, ScanEntry, ScanResult, Task, TaskId};

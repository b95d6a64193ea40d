//! Background execution of generation jobs.
//!
//! [`ExecutionEngine`] runs one attempt of one job to conclusion and turns
//! every failure into a job state mutation. [`Dispatcher`] feeds job ids to
//! a bounded pool of engine runs, guards against duplicate dispatch and
//! re-enqueues retries after their backoff delay. [`recovery::recover`]
//! re-enqueues unfinished work after a restart.

pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod recovery;

pub use config::WorkerConfig;
pub use dispatcher::Dispatcher;
pub use engine::{ExecutionEngine, ExecutionError, ExecutionOutcome};

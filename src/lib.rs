pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod run;
pub mod view;

pub use api::BenchClient;
pub use config::BenchConfig;
pub use error::AppError;
pub use run::controller::{RunController, RunUpdate, SoftError, UpdateSink};
pub use run::score::ScoreTier;
pub use run::store::{Column, DataType, ResultStore, SortDirection, SortState};
pub use run::stream::{SessionEvent, SessionHandle, StreamSession};
pub use run::types::{
    Envelope, ModelDescriptor, ProgressSnapshot, RunState, TestResult, TokenUsage,
};

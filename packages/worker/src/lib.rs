pub mod config;
pub mod dispatch;
pub mod error;
pub mod intake;
pub mod language;
pub mod pipeline;
pub mod sandbox;
pub mod store;
pub mod workspace;

pub use config::WorkerAppConfig;
pub use dispatch::{DispatchOutcome, Dispatcher};
pub use error::{JudgeError, Result, WorkerError};
pub use language::LanguageRegistry;
pub use pipeline::{JudgePipeline, PipelineSettings};
pub use sandbox::ProcessGroupSandbox;
pub use store::{JudgeStore, MemoryStore, SeaOrmStore};

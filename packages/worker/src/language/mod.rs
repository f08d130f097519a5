//! Language adapters.
//!
//! The pipeline stays language-agnostic. An adapter names the source file,
//! optionally describes a compile step, and builds the run command; adding
//! a language means registering one more adapter.

pub mod bytecode;
pub mod interpreted;
pub mod native;
pub mod registry;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::sandbox::error::SandboxError;
use crate::sandbox::{ExecutionRequest, Invocation, Sandbox, Termination};

pub use bytecode::BytecodeAdapter;
pub use interpreted::InterpretedAdapter;
pub use native::NativeAdapter;
pub use registry::LanguageRegistry;

/// What a successful compile leaves in the workspace: a binary, or a class path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledArtifact {
    pub path: PathBuf,
}

/// A toolchain invocation and the artifact it produces on success.
#[derive(Debug, Clone)]
pub struct CompileStep {
    pub invocation: Invocation,
    pub artifact: CompiledArtifact,
}

#[derive(Debug, Error)]
pub enum CompileError {
    /// The toolchain rejected the source. `diagnostic` is its stderr, verbatim.
    #[error("compilation failed")]
    Failed { diagnostic: String },

    /// The toolchain could not be started at all.
    #[error(transparent)]
    Sandbox(#[from] SandboxError),
}

/// Judge adapter contract for language-specific compile/run stages.
#[async_trait]
pub trait LanguageAdapter: Send + Sync {
    fn language(&self) -> &str;

    /// Canonical source file name inside the workspace.
    fn source_file_name(&self) -> &str;

    /// `None` for interpreted languages.
    fn compile_step(&self, workspace: &Path) -> Option<CompileStep>;

    fn run_command(&self, workspace: &Path, artifact: Option<&CompiledArtifact>) -> Invocation;

    /// Whether RLIMIT_AS is a usable memory bound for this runtime. JVMs
    /// reserve far more address space than they touch, so they opt out.
    fn limits_address_space(&self) -> bool {
        true
    }

    /// Run the compile step, if any, to completion or `timeout`.
    async fn compile(
        &self,
        sandbox: &dyn Sandbox,
        workspace: &Path,
        timeout: Duration,
    ) -> Result<Option<CompiledArtifact>, CompileError> {
        let Some(step) = self.compile_step(workspace) else {
            return Ok(None);
        };

        let request = ExecutionRequest {
            stdin: &[],
            time_limit: timeout,
            address_space_limit: None,
        };
        let execution = sandbox.execute(&step.invocation, &request).await?;

        match execution.termination {
            Termination::Exited(0) => Ok(Some(step.artifact)),
            Termination::TimedOut => Err(CompileError::Failed {
                diagnostic: format!("compilation exceeded {} ms", timeout.as_millis()),
            }),
            _ => Err(CompileError::Failed {
                diagnostic: execution.stderr_lossy(),
            }),
        }
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

use std::path::Path;

use super::{CompileStep, CompiledArtifact, LanguageAdapter, path_arg};
use crate::sandbox::Invocation;

/// Name of the produced executable inside the workspace.
pub const BINARY_NAME: &str = "main";

/// Compile to a native executable, then run that executable directly.
#[derive(Debug, Clone)]
pub struct NativeAdapter {
    language: String,
    source_file: String,
    compiler: String,
    flags: Vec<String>,
}

impl NativeAdapter {
    /// The compile command is `compiler <flags..> <source> -o <binary>`.
    pub fn new<I, S>(
        language: impl Into<String>,
        source_file: impl Into<String>,
        compiler: impl Into<String>,
        flags: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            language: language.into(),
            source_file: source_file.into(),
            compiler: compiler.into(),
            flags: flags.into_iter().map(Into::into).collect(),
        }
    }

    pub fn cpp(compiler: impl Into<String>) -> Self {
        Self::new("cpp", "main.cpp", compiler, ["-std=c++17", "-O2"])
    }

    pub fn c(compiler: impl Into<String>) -> Self {
        Self::new("c", "main.c", compiler, ["-std=c17", "-O2"])
    }
}

impl LanguageAdapter for NativeAdapter {
    fn language(&self) -> &str {
        &self.language
    }

    fn source_file_name(&self) -> &str {
        &self.source_file
    }

    fn compile_step(&self, workspace: &Path) -> Option<CompileStep> {
        let binary = workspace.join(BINARY_NAME);
        let invocation = Invocation::new(&self.compiler, workspace)
            .args(self.flags.iter().cloned())
            .arg(path_arg(&workspace.join(&self.source_file)))
            .arg("-o")
            .arg(path_arg(&binary));
        Some(CompileStep {
            invocation,
            artifact: CompiledArtifact { path: binary },
        })
    }

    fn run_command(&self, workspace: &Path, artifact: Option<&CompiledArtifact>) -> Invocation {
        let binary = artifact
            .map(|a| a.path.clone())
            .unwrap_or_else(|| workspace.join(BINARY_NAME));
        Invocation::new(path_arg(&binary), workspace)
    }
}

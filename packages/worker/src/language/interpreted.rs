use std::path::Path;

use super::{CompileStep, CompiledArtifact, LanguageAdapter, path_arg};
use crate::sandbox::Invocation;

/// Run the source file with an interpreter; there is no compile step.
#[derive(Debug, Clone)]
pub struct InterpretedAdapter {
    language: String,
    source_file: String,
    interpreter: String,
    flags: Vec<String>,
}

impl InterpretedAdapter {
    pub fn new(
        language: impl Into<String>,
        source_file: impl Into<String>,
        interpreter: impl Into<String>,
    ) -> Self {
        Self {
            language: language.into(),
            source_file: source_file.into(),
            interpreter: interpreter.into(),
            flags: Vec::new(),
        }
    }

    /// Arguments placed before the source path.
    pub fn with_flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.flags = flags.into_iter().map(Into::into).collect();
        self
    }

    pub fn python(interpreter: impl Into<String>) -> Self {
        // -B: no .pyc files in the workspace.
        Self::new("python", "main.py", interpreter).with_flags(["-B"])
    }
}

impl LanguageAdapter for InterpretedAdapter {
    fn language(&self) -> &str {
        &self.language
    }

    fn source_file_name(&self) -> &str {
        &self.source_file
    }

    fn compile_step(&self, _workspace: &Path) -> Option<CompileStep> {
        None
    }

    fn run_command(&self, workspace: &Path, _artifact: Option<&CompiledArtifact>) -> Invocation {
        Invocation::new(&self.interpreter, workspace)
            .args(self.flags.iter().cloned())
            .arg(path_arg(&workspace.join(&self.source_file)))
    }
}

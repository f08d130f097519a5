use std::path::Path;

use super::{CompileStep, CompiledArtifact, LanguageAdapter, path_arg};
use crate::sandbox::Invocation;

/// Compile to class files, then start them through a runtime launcher.
#[derive(Debug, Clone)]
pub struct BytecodeAdapter {
    language: String,
    source_file: String,
    main_class: String,
    compiler: String,
    compiler_flags: Vec<String>,
    runtime: String,
    runtime_flags: Vec<String>,
}

impl BytecodeAdapter {
    /// Java: `javac -encoding UTF-8 Main.java`, then `java -cp <workspace> Main`.
    pub fn java(compiler: impl Into<String>, runtime: impl Into<String>) -> Self {
        Self {
            language: "java".into(),
            source_file: "Main.java".into(),
            main_class: "Main".into(),
            compiler: compiler.into(),
            compiler_flags: vec!["-encoding".into(), "UTF-8".into()],
            runtime: runtime.into(),
            runtime_flags: vec!["-XX:+UseSerialGC".into()],
        }
    }
}

impl LanguageAdapter for BytecodeAdapter {
    fn language(&self) -> &str {
        &self.language
    }

    fn source_file_name(&self) -> &str {
        &self.source_file
    }

    fn compile_step(&self, workspace: &Path) -> Option<CompileStep> {
        let invocation = Invocation::new(&self.compiler, workspace)
            .args(self.compiler_flags.iter().cloned())
            .arg(path_arg(&workspace.join(&self.source_file)));
        Some(CompileStep {
            invocation,
            // Class files land next to the source; the workspace is the class path.
            artifact: CompiledArtifact {
                path: workspace.to_path_buf(),
            },
        })
    }

    fn run_command(&self, workspace: &Path, artifact: Option<&CompiledArtifact>) -> Invocation {
        let class_path = artifact
            .map(|a| a.path.clone())
            .unwrap_or_else(|| workspace.to_path_buf());
        Invocation::new(&self.runtime, workspace)
            .args(self.runtime_flags.iter().cloned())
            .arg("-cp")
            .arg(path_arg(&class_path))
            .arg(&self.main_class)
    }

    fn limits_address_space(&self) -> bool {
        false
    }
}

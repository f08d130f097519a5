use std::collections::HashMap;
use std::sync::Arc;

use super::{BytecodeAdapter, InterpretedAdapter, LanguageAdapter, NativeAdapter};
use crate::config::ToolchainConfig;
use crate::error::JudgeError;

/// Table of language tag to adapter.
#[derive(Clone, Default)]
pub struct LanguageRegistry {
    adapters: HashMap<String, Arc<dyn LanguageAdapter>>,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// C, C++, Java and Python using the configured binaries.
    pub fn with_defaults(toolchain: &ToolchainConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(NativeAdapter::cpp(&toolchain.cxx)));
        registry.register(Arc::new(NativeAdapter::c(&toolchain.cc)));
        registry.register(Arc::new(BytecodeAdapter::java(
            &toolchain.javac,
            &toolchain.java,
        )));
        registry.register(Arc::new(InterpretedAdapter::python(&toolchain.python)));

        for (alias, language) in [
            ("c++", "cpp"),
            ("cxx", "cpp"),
            ("cc", "c"),
            ("gcc", "c"),
            ("py", "python"),
            ("python3", "python"),
        ] {
            registry.alias(alias, language);
        }
        registry
    }

    /// Register under the adapter's own tag, replacing any previous entry.
    pub fn register(&mut self, adapter: Arc<dyn LanguageAdapter>) {
        self.adapters
            .insert(adapter.language().to_string(), adapter);
    }

    /// Make `alias` resolve to the adapter registered as `language`.
    /// Returns false if `language` is not registered.
    pub fn alias(&mut self, alias: &str, language: &str) -> bool {
        match self.adapters.get(language).cloned() {
            Some(adapter) => {
                self.adapters.insert(alias.to_string(), adapter);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, language: &str) -> Result<Arc<dyn LanguageAdapter>, JudgeError> {
        self.adapters
            .get(language)
            .cloned()
            .ok_or_else(|| JudgeError::UnsupportedLanguage(language.to_string()))
    }

    /// Registered tags, aliases included, sorted.
    pub fn languages(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.adapters.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}

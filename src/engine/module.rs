//! Processor module loading
//!
//! A module is a unit of code that declares one or more named processors.
//! Registration is the only asynchronous step of a pool build.

use crate::error::{Result, VoicePoolError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Path of the module providing the voice processor
pub const VOICE_MODULE_PATH: &str = "modular_pink_trombone/pink_trombone_processor.js";

/// Name of the processor that implements one voice unit
pub const VOICE_PROCESSOR_NAME: &str = "voice";

/// Processors declared by one loaded module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleManifest {
    pub module: String,
    pub processors: Vec<String>,
}

/// Resolves a module path into the processors it declares
#[allow(async_fn_in_trait)]
pub trait ModuleLoader {
    async fn load(&self, module: &str) -> Result<ModuleManifest>;
}

/// In-memory module table
#[derive(Debug, Clone, Default)]
pub struct BundledModules {
    modules: HashMap<String, Vec<String>>,
}

impl BundledModules {
    /// Create an empty table (every load fails)
    pub fn new() -> Self {
        Self::default()
    }

    /// Table containing the voice processor module
    pub fn with_defaults() -> Self {
        Self::new().with_module(VOICE_MODULE_PATH, &[VOICE_PROCESSOR_NAME])
    }

    /// Add a module declaring the given processors
    pub fn with_module(mut self, module: &str, processors: &[&str]) -> Self {
        self.modules.insert(
            module.to_string(),
            processors.iter().map(|p| p.to_string()).collect(),
        );
        self
    }
}

impl ModuleLoader for BundledModules {
    async fn load(&self, module: &str) -> Result<ModuleManifest> {
        let processors = self
            .modules
            .get(module)
            .cloned()
            .ok_or_else(|| VoicePoolError::ModuleLoad {
                module: module.to_string(),
                reason: "module is not bundled".to_string(),
            })?;

        Ok(ModuleManifest {
            module: module.to_string(),
            processors,
        })
    }
}

/// Loads modules from files below a root directory
///
/// Processors are discovered from `registerProcessor("name", ...)`
/// declarations in the module source.
#[derive(Debug, Clone)]
pub struct FileModuleLoader {
    root: PathBuf,
}

impl FileModuleLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ModuleLoader for FileModuleLoader {
    async fn load(&self, module: &str) -> Result<ModuleManifest> {
        let path = self.root.join(module);
        let source =
            tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| VoicePoolError::ModuleLoad {
                    module: module.to_string(),
                    reason: format!("cannot read {}: {}", path.display(), e),
                })?;

        let processors = declared_processors(&source);
        if processors.is_empty() {
            return Err(VoicePoolError::ModuleLoad {
                module: module.to_string(),
                reason: "module declares no processors".to_string(),
            });
        }

        Ok(ModuleManifest {
            module: module.to_string(),
            processors,
        })
    }
}

/// Extract processor names from `registerProcessor(` calls
fn declared_processors(source: &str) -> Vec<String> {
    const MARKER: &str = "registerProcessor(";

    let mut names = Vec::new();
    let mut rest = source;
    while let Some(pos) = rest.find(MARKER) {
        rest = &rest[pos + MARKER.len()..];
        let trimmed = rest.trim_start();
        let Some(quote) = trimmed.chars().next().filter(|c| matches!(c, '"' | '\'' | '`')) else {
            continue;
        };
        let body = &trimmed[1..];
        if let Some(end) = body.find(quote) {
            let name = &body[..end];
            if !name.is_empty() && !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    }
    names
}

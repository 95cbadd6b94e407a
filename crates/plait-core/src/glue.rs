//! Glue coordination: binding compiled parser types into the host
//! runtime's type system.
//!
//! The driver treats the coordinator as opaque: glue files are loaded
//! eagerly during input loading, and one glue-compilation pass runs
//! after the whole program has resolved.

use std::fs;
use std::path::{Path, PathBuf};

/// External coordinator for glue-description files.
pub trait GlueCoordinator {
    /// Load one glue-description file. Returns false on failure; the
    /// driver turns that into a load error with a fixed diagnostic.
    fn load_glue_file(&mut self, path: &Path) -> bool;

    /// Run the glue-compilation step. Returns false on failure.
    fn compile(&mut self) -> bool;

    /// Identifiers exported to the host, as (source, target) pairs, in
    /// the order they were declared.
    fn exported_ids(&self) -> Vec<(String, String)>;

    /// Record a resolved module for glue generation.
    fn add_module(&mut self, id: &str, path: &Path);
}

/// Reference glue coordinator reading line-oriented `.glue` files.
///
/// Supported directives, one per line, `#` starting a comment:
///
/// ```text
/// export a::Color;
/// export a::Msg as Host::Message;
/// ```
#[derive(Debug, Default)]
pub struct GlueCompiler {
    exports: Vec<(String, String)>,
    modules: Vec<(String, PathBuf)>,
    loaded: Vec<PathBuf>,
    compiled: bool,
}

impl GlueCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the glue-compilation pass has run.
    pub fn is_compiled(&self) -> bool {
        self.compiled
    }

    /// Glue files loaded so far.
    pub fn loaded_files(&self) -> &[PathBuf] {
        &self.loaded
    }

    /// Modules registered after resolution.
    pub fn modules(&self) -> &[(String, PathBuf)] {
        &self.modules
    }

    fn parse(&mut self, text: &str) -> bool {
        for raw in text.lines() {
            let line = raw.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }

            let Some(stmt) = line.strip_suffix(';') else {
                return false;
            };

            let mut words = stmt.split_whitespace();
            if words.next() != Some("export") {
                return false;
            }
            let Some(id) = words.next() else {
                return false;
            };
            let target = match (words.next(), words.next(), words.next()) {
                (None, _, _) => id,
                (Some("as"), Some(target), None) => target,
                _ => return false,
            };

            self.exports.push((id.to_string(), target.to_string()));
        }

        true
    }
}

impl GlueCoordinator for GlueCompiler {
    fn load_glue_file(&mut self, path: &Path) -> bool {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                tracing::debug!(path = %path.display(), %err, "cannot read glue file");
                return false;
            }
        };

        if !self.parse(&text) {
            tracing::debug!(path = %path.display(), "malformed glue directive");
            return false;
        }

        self.loaded.push(path.to_path_buf());
        true
    }

    fn compile(&mut self) -> bool {
        tracing::debug!(
            exports = self.exports.len(),
            modules = self.modules.len(),
            "compiling glue"
        );
        self.compiled = true;
        true
    }

    fn exported_ids(&self) -> Vec<(String, String)> {
        self.exports.clone()
    }

    fn add_module(&mut self, id: &str, path: &Path) {
        self.modules.push((id.to_string(), path.to_path_buf()));
    }
}

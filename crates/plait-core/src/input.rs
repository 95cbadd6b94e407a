//! Extension-based classification of driver inputs.
//!
//! The classifier performs no I/O beyond the extension check; deeper
//! validation belongs to the subsystem an input is dispatched to.

use std::path::Path;

use crate::error::{Error, Result};

/// Extension of glue-description files.
pub const GLUE_EXT: &str = "glue";
/// Extension of Plait source modules.
pub const SOURCE_EXT: &str = "plait";
/// Extension of intermediate-representation modules.
pub const IR_EXT: &str = "pir";
/// Extension of precompiled object modules.
pub const OBJECT_EXT: &str = "pob";

/// How a resolved input file is handled by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Glue-description file, loaded eagerly by the glue coordinator.
    Glue,
    /// Plait source module, queued for the module compiler.
    Source,
    /// Intermediate-representation module, queued for the module
    /// compiler.
    Ir,
    /// Precompiled object module, queued for the module compiler.
    Object,
    /// Native passthrough code, queued for the module compiler.
    Native,
}

impl InputKind {
    /// Classify a path by its extension, case-sensitively.
    pub fn classify(path: &Path) -> Result<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            GLUE_EXT => Ok(Self::Glue),
            SOURCE_EXT => Ok(Self::Source),
            IR_EXT => Ok(Self::Ir),
            OBJECT_EXT => Ok(Self::Object),
            "cc" | "cxx" => Ok(Self::Native),
            _ => Err(Error::UnsupportedInput {
                path: path.to_path_buf(),
            }),
        }
    }
}

//! Registry of type metadata extracted during compilation.
//!
//! The registry is per-run state owned by the driver. Records are keyed
//! by fully-qualified name; insertion order is preserved and is
//! significant for deterministic glue generation.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::Serialize;

use crate::ast::{Linkage, TypeDef, TypeKind};
use crate::error::{Error, Result};

/// Metadata for one compiled type declaration.
#[derive(Debug, Clone, Serialize)]
pub struct TypeRecord {
    /// Fully-qualified name (`module::local`), unique across a
    /// successfully compiled program.
    pub id: String,
    /// Structural definition as reported by the backend.
    pub def: TypeDef,
    pub linkage: Linkage,
    /// False until whole-program resolution has finalized the type's
    /// shape.
    pub is_resolved: bool,
    /// Module that declares the type.
    pub module_id: String,
    /// Source path of the declaring module.
    pub module_path: PathBuf,
}

/// Name-keyed map of every type seen so far during processing.
///
/// A record inserted for an existing name replaces the earlier one
/// while keeping its insertion position: refinement from unresolved to
/// resolved is monotonic, never the reverse.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: IndexMap<String, TypeRecord>,
    public_enums: Vec<TypeRecord>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace, keyed by fully-qualified name.
    pub fn record(&mut self, record: TypeRecord) {
        if let Some(prev) = self.types.get(&record.id) {
            if prev.module_path != record.module_path {
                tracing::warn!(id = %record.id, "type redefined by a different module");
            }
        }
        self.types.insert(record.id.clone(), record);
    }

    /// Track a public enum for automatic export. Entries are never
    /// removed.
    pub fn record_public_enum(&mut self, record: TypeRecord) {
        self.public_enums.push(record);
    }

    /// Exact-name lookup.
    pub fn lookup(&self, id: &str) -> Result<&TypeRecord> {
        self.types
            .get(id)
            .ok_or_else(|| Error::UnknownType(id.to_string()))
    }

    /// Exact-name lookup, additionally enforcing the stored
    /// definition's structural kind.
    pub fn lookup_kind(&self, id: &str, kind: TypeKind) -> Result<&TypeRecord> {
        let record = self.lookup(id)?;
        if record.def.kind() != kind {
            return Err(Error::WrongKind {
                id: id.to_string(),
                expected: kind,
            });
        }
        Ok(record)
    }

    /// All records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeRecord> {
        self.types.values()
    }

    /// Public enums flagged for automatic export, in the order they
    /// were seen.
    pub fn public_enums(&self) -> &[TypeRecord] {
        &self.public_enums
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

//! Metadata extraction passes over compiled module declarations.
//!
//! The driver runs one extraction per module per phase: once right
//! after parsing (types not yet resolved) and once after whole-program
//! resolution. Both passes are read-only walks over the module's
//! declaration tree.

use crate::ast::{walk, Linkage, ModuleUnit, TypeDef};
use crate::registry::TypeRecord;

/// Module names whose declarations never surface in the registry: the
/// compiler's own prelude and the host runtime's support module.
pub const INTERNAL_MODULES: [&str; 3] = ["plait", "plait_rt", "host_rt"];

/// Output of one extraction pass over a single module.
#[derive(Debug, Default)]
pub struct Extraction {
    /// One record per visited type declaration.
    pub types: Vec<TypeRecord>,
    /// Public top-level enums, flagged for automatic export. Filled
    /// only by the pre-resolution pass.
    pub public_enums: Vec<TypeRecord>,
}

/// Walk a module's declarations and produce metadata records.
///
/// Modules constructed in memory (no originating path) and the internal
/// module set yield no records; they are scaffolding, not user-visible
/// types.
pub fn extract_types(unit: &ModuleUnit, resolved: bool) -> Extraction {
    let mut out = Extraction::default();

    let Some(path) = &unit.path else {
        return out;
    };

    if INTERNAL_MODULES.contains(&unit.id.as_str()) {
        return out;
    }

    let make_record = |decl: &crate::ast::Decl| TypeRecord {
        id: format!("{}::{}", unit.id, decl.id),
        def: decl.def.clone(),
        linkage: decl.linkage,
        is_resolved: resolved,
        module_id: unit.id.clone(),
        module_path: path.clone(),
    };

    for decl in walk(&unit.decls) {
        out.types.push(make_record(decl));
    }

    if !resolved {
        for decl in &unit.decls {
            if decl.linkage == Linkage::Public && matches!(decl.def, TypeDef::Enum { .. }) {
                out.public_enums.push(make_record(decl));
            }
        }
    }

    out
}

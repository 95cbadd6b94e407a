//! Declaration model shared between the backend compiler and the driver.
//!
//! The backend reports each compiled module as a [`ModuleUnit`] carrying
//! a tree of [`Decl`]s. Declaration kinds are a tagged variant rather
//! than a dispatch hierarchy, so consumers match exhaustively.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Visibility of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Linkage {
    /// Visible only within the declaring module.
    Private,
    /// Exported from the declaring module.
    Public,
}

/// Structural kind of a type definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Enum,
    Unit,
    Struct,
    Opaque,
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Enum => "enum",
            Self::Unit => "unit",
            Self::Struct => "struct",
            Self::Opaque => "opaque",
        };
        f.write_str(name)
    }
}

/// Structural definition of a declared type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeDef {
    /// Enumeration with named labels.
    Enum { labels: Vec<String> },
    /// Unit (parser) type describing a format's layout.
    Unit { fields: Vec<String> },
    /// Plain record type.
    Struct { fields: Vec<String> },
    /// Definition the backend did not expose structurally.
    Opaque(String),
}

impl TypeDef {
    /// Structural kind, used for registry kind checks.
    pub fn kind(&self) -> TypeKind {
        match self {
            Self::Enum { .. } => TypeKind::Enum,
            Self::Unit { .. } => TypeKind::Unit,
            Self::Struct { .. } => TypeKind::Struct,
            Self::Opaque(_) => TypeKind::Opaque,
        }
    }
}

/// One type declaration in a module's declaration tree.
#[derive(Debug, Clone)]
pub struct Decl {
    /// Local identifier within the module.
    pub id: String,
    pub linkage: Linkage,
    pub def: TypeDef,
    /// Declarations nested inside this one.
    pub children: Vec<Decl>,
}

/// Handle to a compiled module. Owned by the backend compiler; the
/// driver borrows it only for the duration of a hook invocation.
#[derive(Debug, Clone)]
pub struct ModuleUnit {
    /// Qualified module name.
    pub id: String,
    /// Originating source path. `None` marks a module constructed
    /// purely in memory.
    pub path: Option<PathBuf>,
    /// Extension tag used for dispatch, without the leading dot.
    pub extension: String,
    /// Top-level declarations.
    pub decls: Vec<Decl>,
}

/// Depth-first pre-order walk over a declaration tree.
///
/// Each declaration is yielded exactly once; the tree is finite and
/// acyclic per module, so the walk terminates.
pub fn walk(decls: &[Decl]) -> Walk<'_> {
    Walk {
        stack: decls.iter().rev().collect(),
    }
}

/// Iterator state for [`walk`].
pub struct Walk<'a> {
    stack: Vec<&'a Decl>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Decl;

    fn next(&mut self) -> Option<Self::Item> {
        let decl = self.stack.pop()?;
        // Push children in reverse so siblings come out left-to-right.
        for child in decl.children.iter().rev() {
            self.stack.push(child);
        }
        Some(decl)
    }
}

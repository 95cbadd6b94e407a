//! Compilation driver for the Plait parser-description language.
//!
//! This crate provides:
//! - Path resolution across a configurable search-path list
//! - Extension-based classification and dispatch of driver inputs
//! - Metadata extraction passes over compiled module declarations
//! - A name-keyed type registry with automatic export of public enums
//! - The pipeline driver orchestrating the backend module compiler and
//!   the glue-compilation step that binds parsers into the host runtime
//!
//! The backend compiler, the glue coordinator, and the host runtime are
//! external collaborators behind the [`driver::ModuleCompiler`],
//! [`glue::GlueCoordinator`], and [`runtime::HostRuntime`] traits. A
//! reference backend and glue reader are included for development and
//! tests.

pub mod ast;
pub mod backend;
pub mod driver;
pub mod error;
pub mod extract;
pub mod glue;
pub mod input;
pub mod paths;
pub mod registry;
pub mod runtime;

pub use ast::{Decl, Linkage, ModuleUnit, TypeDef, TypeKind};
pub use backend::ReferenceCompiler;
pub use driver::{CompileHooks, Driver, ModuleCompiler, PipelineState, TypeObserver};
pub use error::{Error, Result};
pub use extract::INTERNAL_MODULES;
pub use glue::{GlueCompiler, GlueCoordinator};
pub use input::InputKind;
pub use paths::SearchPaths;
pub use registry::{TypeRecord, TypeRegistry};
pub use runtime::{FileStream, HostRuntime, NullRuntime};

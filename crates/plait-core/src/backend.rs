//! Reference backend: a minimal module compiler for development and
//! tests.
//!
//! Real deployments implement [`ModuleCompiler`] against a full Plait
//! toolchain. This backend reads just enough of a module to drive the
//! metadata pipeline: the module header and its top-level type
//! declarations. Non-source inputs are accepted and carried along as
//! opaque passthrough.
//!
//! Recognized module syntax, `#` starting a comment:
//!
//! ```text
//! module dns;
//!
//! public type Color = enum { red, green, blue };
//! public type Header = unit { id: uint16, flags: Flags };
//! type Flags = struct { qr, opcode };
//! type Port = uint16;
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::ast::{Decl, Linkage, ModuleUnit, TypeDef};
use crate::driver::{CompileHooks, ModuleCompiler};
use crate::error::{Error, Result};
use crate::input::{InputKind, SOURCE_EXT};

/// Minimal whole-program compiler over `.plait` inputs.
#[derive(Debug, Default)]
pub struct ReferenceCompiler {
    inputs: Vec<(PathBuf, InputKind)>,
}

impl ReferenceCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inputs queued so far, in load order.
    pub fn inputs(&self) -> &[(PathBuf, InputKind)] {
        &self.inputs
    }
}

impl ModuleCompiler for ReferenceCompiler {
    fn add_input(&mut self, path: &Path, kind: InputKind) -> Result<()> {
        self.inputs.push((path.to_path_buf(), kind));
        Ok(())
    }

    fn has_inputs(&self) -> bool {
        !self.inputs.is_empty()
    }

    fn compile(&mut self, hooks: &mut dyn CompileHooks) -> Result<()> {
        let mut units = Vec::new();

        for (path, kind) in &self.inputs {
            if *kind != InputKind::Source {
                // Passthrough inputs carry no declarations of interest.
                continue;
            }

            let source = fs::read_to_string(path).map_err(|err| Error::Compile {
                message: format!("cannot read {}: {err}", path.display()),
                context: None,
            })?;
            units.push(parse_module(&source, path)?);
        }

        // Every module is parsed before any module is resolved.
        for unit in &units {
            hooks.module_parsed(unit);
        }
        for unit in &units {
            hooks.module_resolved(unit);
        }

        hooks.compilation_finished()
    }
}

/// Parse one module's header and top-level declarations.
fn parse_module(source: &str, path: &Path) -> Result<ModuleUnit> {
    let mut module_id: Option<String> = None;
    let mut decls = Vec::new();

    let (stmts, trailing) = statements(source);
    if let Some(tail) = trailing {
        return Err(syntax_error(
            path,
            &format!("missing ';' after '{}'", tail.trim()),
        ));
    }

    for stmt in stmts {
        let stmt = stmt.trim();
        if stmt.is_empty() {
            continue;
        }

        if let Some(id) = stmt.strip_prefix("module ") {
            let id = id.trim();
            if id.is_empty() || module_id.is_some() {
                return Err(syntax_error(path, "malformed module declaration"));
            }
            module_id = Some(id.to_string());
            continue;
        }

        decls.push(parse_decl(stmt, path)?);
    }

    let Some(id) = module_id else {
        return Err(syntax_error(path, "missing module declaration"));
    };

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or(SOURCE_EXT)
        .to_string();

    Ok(ModuleUnit {
        id,
        path: Some(path.to_path_buf()),
        extension,
        decls,
    })
}

/// Split comment-stripped source into statements terminated by `;` at
/// brace depth zero. The second element carries any unterminated
/// trailing text.
fn statements(source: &str) -> (Vec<String>, Option<String>) {
    let mut text = String::with_capacity(source.len());
    for line in source.lines() {
        text.push_str(line.split('#').next().unwrap_or(""));
        text.push('\n');
    }

    let mut out = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for ch in text.chars() {
        match ch {
            '{' => {
                depth += 1;
                current.push(ch);
            }
            '}' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            ';' if depth == 0 => {
                out.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }

    let trailing = if current.trim().is_empty() {
        None
    } else {
        Some(current)
    };

    (out, trailing)
}

fn parse_decl(stmt: &str, path: &Path) -> Result<Decl> {
    let (linkage, rest) = if let Some(rest) = stmt.strip_prefix("public ") {
        (Linkage::Public, rest)
    } else if let Some(rest) = stmt.strip_prefix("private ") {
        (Linkage::Private, rest)
    } else {
        (Linkage::Private, stmt)
    };

    let Some(rest) = rest.trim_start().strip_prefix("type ") else {
        return Err(syntax_error(path, &format!("unrecognized statement '{}'", stmt.trim())));
    };

    let Some((id, def_text)) = rest.split_once('=') else {
        return Err(syntax_error(path, &format!("missing '=' in type declaration '{}'", rest.trim())));
    };

    let id = id.trim();
    if id.is_empty() || id.contains(char::is_whitespace) {
        return Err(syntax_error(path, "malformed type name"));
    }

    Ok(Decl {
        id: id.to_string(),
        linkage,
        def: parse_def(def_text.trim()),
        children: Vec::new(),
    })
}

fn parse_def(text: &str) -> TypeDef {
    let Some((keyword, body)) = text.split_once('{') else {
        return TypeDef::Opaque(text.to_string());
    };

    let body = body.rsplit_once('}').map(|(b, _)| b).unwrap_or(body);
    let items: Vec<String> = body
        .split(',')
        .map(item_name)
        .filter(|item| !item.is_empty())
        .collect();

    match keyword.trim() {
        "enum" => TypeDef::Enum { labels: items },
        "unit" => TypeDef::Unit { fields: items },
        "struct" => TypeDef::Struct { fields: items },
        _ => TypeDef::Opaque(text.to_string()),
    }
}

/// Item name: the part before any `:` type annotation or `=` value.
fn item_name(item: &str) -> String {
    item.split([':', '='])
        .next()
        .unwrap_or("")
        .trim()
        .to_string()
}

fn syntax_error(path: &Path, message: &str) -> Error {
    Error::Compile {
        message: format!("{}: {message}", path.display()),
        context: None,
    }
}

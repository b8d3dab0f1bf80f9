// VC-8 Script Emitter
//
// Walks the optimized model and produces the output text: constants,
// declarations, lookup tables, and routines, in that fixed order. Emission
// is deterministic - identical input produces byte-identical output - since
// downstream tooling maps generated line numbers back to authored source.
//
// The emitter is split across several impl files, one per emission concern:
//   emitter_decls.rs    - constants, variable declarations, lookup tables
//   emitter_routines.rs - routines and statement bodies
//   emitter_exprs.rs    - expression printing and name resolution

use crate::error::CompilerError;
use crate::ir::{walk_expr, walk_exprs, ExprKind, InputMode, SourceLoc};
use crate::mapping::MappingTable;
use crate::model::{Entity, Model, Pool};

/// Dialect revision stamped into the output header.
pub const DIALECT_VERSION: u32 = 1;

/// Emit output text for an (already optimized) model.
pub fn emit(model: &Model) -> Result<String, CompilerError> {
    let mut emitter = Emitter::new(model, false);
    emitter.generate()?;
    Ok(emitter.out)
}

/// Emit output text plus the line-to-source mapping table.
pub fn emit_with_mapping(model: &Model) -> Result<(String, MappingTable), CompilerError> {
    let mut emitter = Emitter::new(model, true);
    emitter.generate()?;
    let mapping = emitter.mapping.take().expect("mapping was requested");
    Ok((emitter.out, mapping))
}

/// Name resolution context while emitting statements.
pub(crate) enum EmitScope<'a> {
    /// Only globals are visible.
    Global,
    /// Entity hooks: fields and position resolve to the entity's storage.
    Entity(usize, &'a Entity),
    /// Pool hooks: state fields resolve to the shared-index arrays.
    Pool(&'a Pool),
}

pub(crate) struct Emitter<'a> {
    pub(crate) model: &'a Model,
    pub(crate) out: String,
    /// 1-based number of the next line to be written.
    next_line: u32,
    indent: usize,
    pub(crate) mapping: Option<MappingTable>,
    /// Distinct input sources, first-seen order.
    pub(crate) input_sources: Vec<String>,
    /// Sources appearing in any just-pressed/just-released condition; these
    /// get one previous-frame snapshot each, regardless of use count.
    pub(crate) edge_sources: Vec<String>,
    pub(crate) uses_tweens: bool,
}

impl<'a> Emitter<'a> {
    pub(crate) fn new(model: &'a Model, with_mapping: bool) -> Emitter<'a> {
        let mapping = with_mapping.then(|| {
            MappingTable::new(&model.name, &format!("{}.vcs", identifier(&model.name)))
        });
        Emitter {
            model,
            out: String::new(),
            next_line: 1,
            indent: 0,
            mapping,
            input_sources: Vec::new(),
            edge_sources: Vec::new(),
            uses_tweens: false,
        }
    }

    pub(crate) fn generate(&mut self) -> Result<(), CompilerError> {
        log::debug!("emitter: generating text for model '{}'", self.model.name);
        self.scan_model();
        self.write_header();
        self.write_constants()?;
        self.write_declarations();
        self.write_tables();
        self.write_routines()?;
        log::info!(
            "emitter: model '{}' -> {} lines",
            self.model.name,
            self.next_line - 1
        );
        Ok(())
    }

    /// Pre-pass over every expression in the model: which input sources are
    /// read at all, which need edge snapshots, and whether any tween starts.
    fn scan_model(&mut self) {
        let mut sources: Vec<String> = Vec::new();
        let mut edges: Vec<String> = Vec::new();
        let mut uses_tweens = false;

        {
            let mut note_input = |source: &str, mode: InputMode| {
                if !sources.iter().any(|s| s == source) {
                    sources.push(source.to_string());
                }
                if mode != InputMode::Held && !edges.iter().any(|s| s == source) {
                    edges.push(source.to_string());
                }
            };
            let mut visit = |expr: &crate::ir::Expr| {
                if let ExprKind::Input { source, mode } = &expr.kind {
                    note_input(source, *mode);
                }
            };

            for (_, stmts) in self.model.statement_lists() {
                walk_exprs(stmts, &mut visit);
                crate::ir::walk_stmts(stmts, &mut |stmt| {
                    if matches!(stmt.kind, crate::ir::StmtKind::TweenStart { .. }) {
                        uses_tweens = true;
                    }
                });
            }
            for (_, condition) in self.model.free_expressions() {
                walk_expr(condition, &mut visit);
            }
        }

        self.input_sources = sources;
        self.edge_sources = edges;
        self.uses_tweens = uses_tweens;
    }

    // --- Line writer ---------------------------------------------------

    /// Current indentation as text.
    fn pad(&self) -> String {
        "    ".repeat(self.indent)
    }

    /// Write one line of output.
    pub(crate) fn line(&mut self, text: &str) {
        if text.is_empty() {
            self.out.push('\n');
        } else {
            self.out.push_str(&self.pad());
            self.out.push_str(text);
            self.out.push('\n');
        }
        self.next_line += 1;
    }

    /// Write one line and record its mapping entry when the statement
    /// carries a source location.
    pub(crate) fn stmt_line(&mut self, text: &str, loc: Option<&SourceLoc>) {
        if let (Some(mapping), Some(loc)) = (self.mapping.as_mut(), loc) {
            mapping.record(self.next_line, loc);
        }
        self.line(text);
    }

    pub(crate) fn blank(&mut self) {
        self.line("");
    }

    /// Open a brace block and indent.
    pub(crate) fn open(&mut self, text: &str) {
        self.line(&format!("{} {{", text));
        self.indent += 1;
    }

    /// Open a brace block, mapping the opening line.
    pub(crate) fn open_mapped(&mut self, text: &str, loc: Option<&SourceLoc>) {
        if let (Some(mapping), Some(loc)) = (self.mapping.as_mut(), loc) {
            mapping.record(self.next_line, loc);
        }
        self.open(text);
    }

    /// Close the innermost brace block.
    pub(crate) fn close(&mut self) {
        self.indent -= 1;
        self.line("}");
    }

    /// Re-open the innermost block with a continuation header, e.g.
    /// `} else if ... {`.
    pub(crate) fn reopen(&mut self, text: &str) {
        self.indent -= 1;
        self.open(&format!("}} {}", text));
    }
}

/// Lowercased identifier-safe form of a model name.
pub(crate) fn identifier(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push('_');
        }
    }
    out
}

/// Uppercased constant-safe form of a model name.
pub(crate) fn constant(name: &str) -> String {
    identifier(name).to_ascii_uppercase()
}

#[cfg(test)]
#[path = "emitter_tests.rs"]
mod tests;

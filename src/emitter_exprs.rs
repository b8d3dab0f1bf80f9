/// emitter_exprs.rs
/// Expression printing with minimal parenthesization, and name resolution
/// from IR identifiers to emitted storage names.
use crate::emitter::{constant, identifier, EmitScope, Emitter};
use crate::error::CompilerError;
use crate::ir::{AssignTarget, Expr, ExprKind, InputMode};
use crate::model::{Entity, PositionBinding};
use crate::optimizer::{precedence, right_operand_sensitive, COMPARE_PRECEDENCE, TERNARY_PRECEDENCE};

/// Binding strength of atom-shaped nodes; they never take parentheses.
const ATOM_PRECEDENCE: u8 = 10;
/// Unary operators bind tighter than any binary operator.
const UNARY_PRECEDENCE: u8 = 9;

impl Emitter<'_> {
    pub(crate) fn entity_prefix(&self, ordinal: usize, entity: &Entity) -> String {
        format!("e{}_{}", ordinal, identifier(&entity.name))
    }

    /// Print a top-level expression. Never wrapped in parentheses.
    pub(crate) fn expr_text(
        &self,
        expr: &Expr,
        scope: &EmitScope,
    ) -> Result<String, CompilerError> {
        self.print_expr(expr, scope, 0, false)
    }

    /// Print a child expression under a parent of strength `parent_prec`.
    /// Parentheses appear only when this node binds strictly looser, or
    /// equally on a side where the parent's associativity does not permit
    /// omission (`parens_on_equal`).
    pub(crate) fn print_expr(
        &self,
        expr: &Expr,
        scope: &EmitScope,
        parent_prec: u8,
        parens_on_equal: bool,
    ) -> Result<String, CompilerError> {
        let (text, prec) = match &expr.kind {
            ExprKind::Literal { value, .. } => (value.to_string(), ATOM_PRECEDENCE),

            ExprKind::Var { name, .. } => (self.resolve_var(name, scope)?, ATOM_PRECEDENCE),

            ExprKind::Index { array, index, .. } => {
                let index_text = self.print_expr(index, scope, 0, false)?;
                (self.resolve_array(array, &index_text)?, ATOM_PRECEDENCE)
            }

            ExprKind::Binary { op, lhs, rhs } => {
                let prec = precedence(*op);
                let left = self.print_expr(lhs, scope, prec, false)?;
                let right = self.print_expr(rhs, scope, prec, right_operand_sensitive(*op))?;
                (format!("{} {} {}", left, op.symbol(), right), prec)
            }

            ExprKind::Compare { op, lhs, rhs } => {
                // Comparisons are non-associative: nested comparisons keep
                // parentheses on both sides.
                let left = self.print_expr(lhs, scope, COMPARE_PRECEDENCE, true)?;
                let right = self.print_expr(rhs, scope, COMPARE_PRECEDENCE, true)?;
                (
                    format!("{} {} {}", left, op.symbol(), right),
                    COMPARE_PRECEDENCE,
                )
            }

            ExprKind::Unary { op, operand } => {
                let inner = self.print_expr(operand, scope, UNARY_PRECEDENCE, false)?;
                (format!("{}{}", op.symbol(), inner), UNARY_PRECEDENCE)
            }

            ExprKind::Ternary {
                cond,
                then_val,
                else_val,
            } => {
                let c = self.print_expr(cond, scope, TERNARY_PRECEDENCE + 1, false)?;
                let t = self.print_expr(then_val, scope, TERNARY_PRECEDENCE + 1, false)?;
                let e = self.print_expr(else_val, scope, TERNARY_PRECEDENCE + 1, false)?;
                (format!("{} ? {} : {}", c, t, e), TERNARY_PRECEDENCE)
            }

            ExprKind::Call { name, args } => {
                let mut printed = Vec::with_capacity(args.len());
                for arg in args {
                    printed.push(self.print_expr(arg, scope, 0, false)?);
                }
                (
                    format!("{}({})", identifier(name), printed.join(", ")),
                    ATOM_PRECEDENCE,
                )
            }

            ExprKind::Input { source, mode } => {
                let pad = format!("pad_{}", identifier(source));
                let prev = format!("prev_pad_{}", identifier(source));
                match mode {
                    InputMode::Held => (pad, ATOM_PRECEDENCE),
                    // Edge reads compare against the previous-frame snapshot
                    // maintained once per source in frame_end().
                    InputMode::JustPressed => (
                        format!("{} & ~{}", pad, prev),
                        precedence(crate::ir::BinaryOp::BitAnd),
                    ),
                    InputMode::JustReleased => (
                        format!("{} & ~{}", prev, pad),
                        precedence(crate::ir::BinaryOp::BitAnd),
                    ),
                }
            }

            ExprKind::SweepCollides { pool, other } => {
                for name in [pool, other] {
                    if self.model.pool(name).is_none() {
                        return Err(CompilerError::UnknownPool(name.clone()));
                    }
                }
                (
                    format!("sweep_hit(POOL_{}, POOL_{})", constant(pool), constant(other)),
                    ATOM_PRECEDENCE,
                )
            }
        };

        let needs_parens =
            prec < parent_prec || (prec == parent_prec && parens_on_equal);
        if needs_parens {
            Ok(format!("({})", text))
        } else {
            Ok(text)
        }
    }

    /// Map an IR variable name to its emitted storage name under the scope.
    pub(crate) fn resolve_var(
        &self,
        name: &str,
        scope: &EmitScope,
    ) -> Result<String, CompilerError> {
        match scope {
            EmitScope::Entity(ordinal, entity) => {
                let prefix = self.entity_prefix(*ordinal, entity);
                if name == "x" || name == "y" {
                    return Ok(match &entity.position {
                        PositionBinding::Allocated => format!("{}_{}", prefix, name),
                        PositionBinding::External { x, y } => {
                            identifier(if name == "x" { x } else { y })
                        }
                    });
                }
                if entity.fields.iter().any(|f| f.name == name) {
                    return Ok(format!("{}_{}", prefix, identifier(name)));
                }
                if self.model.variable(name).is_some() {
                    return Ok(identifier(name));
                }
                Err(CompilerError::UnknownVariable(name.to_string()))
            }
            EmitScope::Pool(pool) => {
                if pool.state_fields.iter().any(|f| f.name == name) {
                    return Ok(format!(
                        "pool_{}_{}[i]",
                        identifier(&pool.name),
                        identifier(name)
                    ));
                }
                if name == "i" {
                    return Ok("i".to_string());
                }
                if self.model.variable(name).is_some() {
                    return Ok(identifier(name));
                }
                Err(CompilerError::UnknownVariable(name.to_string()))
            }
            EmitScope::Global => {
                if self.model.variable(name).is_some() {
                    return Ok(identifier(name));
                }
                Err(CompilerError::UnknownVariable(name.to_string()))
            }
        }
    }

    /// Map a `<pool>.<field>` array reference to its emitted array access.
    pub(crate) fn resolve_array(
        &self,
        array: &str,
        index_text: &str,
    ) -> Result<String, CompilerError> {
        let Some((pool_name, field)) = array.split_once('.') else {
            return Err(CompilerError::UnknownArray(array.to_string()));
        };
        let Some(pool) = self.model.pool(pool_name) else {
            return Err(CompilerError::UnknownPool(pool_name.to_string()));
        };
        if pool.field(field).is_none() {
            return Err(CompilerError::UnknownArray(array.to_string()));
        }
        Ok(format!(
            "pool_{}_{}[{}]",
            identifier(pool_name),
            identifier(field),
            index_text
        ))
    }

    /// Print an assignment target.
    pub(crate) fn target_text(
        &self,
        target: &AssignTarget,
        scope: &EmitScope,
    ) -> Result<String, CompilerError> {
        match target {
            AssignTarget::Var(name) => self.resolve_var(name, scope),
            AssignTarget::Index { array, index } => {
                let index_text = self.print_expr(index, scope, 0, false)?;
                self.resolve_array(array, &index_text)
            }
        }
    }
}

// IR Optimizer
//
// Pure, bottom-up rewriting of expression trees to a fixed point: constant
// folding in the target's declared widths, identity/annihilator elimination,
// strength reduction, comparison/ternary folding, and dead-branch pruning at
// the statement level. Every rewrite must be observably equivalent under the
// target's fixed-width wraparound arithmetic for all run-time values of free
// variables.
//
// The operator precedence table lives here because the emitter's
// minimal-parenthesization printer shares it with the folder.

use crate::ir::*;
use crate::model::Model;
use lazy_static::lazy_static;
use std::collections::HashMap;

lazy_static! {
    /// Binding strength of every binary operator; higher binds tighter.
    static ref PRECEDENCE: HashMap<BinaryOp, u8> = {
        let mut table = HashMap::new();
        table.insert(BinaryOp::Mul, 8);
        table.insert(BinaryOp::Div, 8);
        table.insert(BinaryOp::Mod, 8);
        table.insert(BinaryOp::Add, 7);
        table.insert(BinaryOp::Sub, 7);
        table.insert(BinaryOp::Shl, 6);
        table.insert(BinaryOp::Shr, 6);
        table.insert(BinaryOp::BitAnd, 4);
        table.insert(BinaryOp::BitXor, 3);
        table.insert(BinaryOp::BitOr, 2);
        table
    };
}

/// Precedence level of comparison operators (between shifts and bitwise AND).
pub const COMPARE_PRECEDENCE: u8 = 5;
/// Ternary binds loosest of all operators.
pub const TERNARY_PRECEDENCE: u8 = 1;

pub fn precedence(op: BinaryOp) -> u8 {
    PRECEDENCE[&op]
}

/// Whether a right operand of equal precedence still needs parentheses.
/// True for the non-commutative operators where regrouping changes the
/// result: `a - (b - c)`, `a / (b / c)`, `a % (b % c)`, shifts.
pub fn right_operand_sensitive(op: BinaryOp) -> bool {
    matches!(
        op,
        BinaryOp::Sub | BinaryOp::Div | BinaryOp::Mod | BinaryOp::Shl | BinaryOp::Shr
    )
}

/// Rewrite an expression to its fixed point. Pure and total: if no rule
/// applies the input comes back unchanged. Malformed IR is a caller bug.
pub fn optimize(expr: &Expr) -> Expr {
    let mut current = expr.clone();
    loop {
        let (next, changed) = rewrite(&current);
        current = next;
        if !changed {
            return current;
        }
    }
}

/// One bottom-up pass; reports whether anything fired so the driver can
/// iterate to the fixed point (bounded - the tree only shrinks).
fn rewrite(expr: &Expr) -> (Expr, bool) {
    let loc = expr.loc.clone();
    match &expr.kind {
        ExprKind::Literal { .. }
        | ExprKind::Var { .. }
        | ExprKind::Input { .. }
        | ExprKind::SweepCollides { .. } => (expr.clone(), false),

        ExprKind::Index { array, index, ty } => {
            let (index, changed) = rewrite(index);
            (
                Expr {
                    kind: ExprKind::Index {
                        array: array.clone(),
                        index: Box::new(index),
                        ty: *ty,
                    },
                    loc,
                },
                changed,
            )
        }

        ExprKind::Binary { op, lhs, rhs } => {
            let (lhs, lc) = rewrite(lhs);
            let (rhs, rc) = rewrite(rhs);
            let rebuilt = Expr {
                kind: ExprKind::Binary {
                    op: *op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                loc,
            };
            match simplify_binary(&rebuilt) {
                Some(simpler) => (simpler, true),
                None => (rebuilt, lc || rc),
            }
        }

        ExprKind::Unary { op, operand } => {
            let (operand, changed) = rewrite(operand);
            if let Some((value, ty)) = operand.as_literal() {
                let folded = match op {
                    UnaryOp::Neg => Expr::literal(ty.wrap(-(value as i64)), ty),
                    UnaryOp::BitNot => Expr::literal(ty.wrap(!(value as i64)), ty),
                    UnaryOp::Not => Expr::literal(i32::from(value == 0), NumType::U8),
                };
                return (Expr { loc, ..folded }, true);
            }
            (
                Expr {
                    kind: ExprKind::Unary {
                        op: *op,
                        operand: Box::new(operand),
                    },
                    loc,
                },
                changed,
            )
        }

        ExprKind::Compare { op, lhs, rhs } => {
            let (lhs, lc) = rewrite(lhs);
            let (rhs, rc) = rewrite(rhs);
            if let (Some((a, _)), Some((b, _))) = (lhs.as_literal(), rhs.as_literal()) {
                let holds = match op {
                    CompareOp::Eq => a == b,
                    CompareOp::Ne => a != b,
                    CompareOp::Lt => a < b,
                    CompareOp::Le => a <= b,
                    CompareOp::Gt => a > b,
                    CompareOp::Ge => a >= b,
                };
                let folded = Expr::literal(i32::from(holds), NumType::U8);
                return (Expr { loc, ..folded }, true);
            }
            (
                Expr {
                    kind: ExprKind::Compare {
                        op: *op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    },
                    loc,
                },
                lc || rc,
            )
        }

        ExprKind::Ternary {
            cond,
            then_val,
            else_val,
        } => {
            let (cond, cc) = rewrite(cond);
            let (then_val, tc) = rewrite(then_val);
            let (else_val, ec) = rewrite(else_val);
            if let Some((value, _)) = cond.as_literal() {
                let taken = if value != 0 { then_val } else { else_val };
                return (Expr { loc, ..taken }, true);
            }
            (
                Expr {
                    kind: ExprKind::Ternary {
                        cond: Box::new(cond),
                        then_val: Box::new(then_val),
                        else_val: Box::new(else_val),
                    },
                    loc,
                },
                cc || tc || ec,
            )
        }

        ExprKind::Call { name, args } => {
            let mut changed = false;
            let args = args
                .iter()
                .map(|arg| {
                    let (arg, c) = rewrite(arg);
                    changed |= c;
                    arg
                })
                .collect();
            (
                Expr {
                    kind: ExprKind::Call {
                        name: name.clone(),
                        args,
                    },
                    loc,
                },
                changed,
            )
        }
    }
}

/// Try the binary-node rules in order: constant folding, identity and
/// annihilator elimination, strength reduction. Returns None when the node
/// is already minimal.
fn simplify_binary(expr: &Expr) -> Option<Expr> {
    let ExprKind::Binary { op, lhs, rhs } = &expr.kind else {
        return None;
    };
    let loc = expr.loc.clone();

    // Constant folding. Division and modulo by a literal zero are left as
    // runtime expressions so the target's own fault behavior applies.
    if let (Some((a, aty)), Some((b, bty))) = (lhs.as_literal(), rhs.as_literal()) {
        if let Some(folded) = fold_literals(*op, a, aty, b, bty) {
            return Some(Expr { loc, ..folded });
        }
    }

    let lhs_lit = lhs.as_literal().map(|(v, _)| v);
    let rhs_lit = rhs.as_literal().map(|(v, _)| v);

    // Identity and annihilator elimination. Dropping a side is sound:
    // expressions are pure reads on this target.
    match op {
        BinaryOp::Add | BinaryOp::BitOr | BinaryOp::BitXor => {
            if lhs_lit == Some(0) {
                return Some(Expr { loc, ..(**rhs).clone() });
            }
            if rhs_lit == Some(0) {
                return Some(Expr { loc, ..(**lhs).clone() });
            }
        }
        BinaryOp::Sub | BinaryOp::Shl | BinaryOp::Shr => {
            if rhs_lit == Some(0) {
                return Some(Expr { loc, ..(**lhs).clone() });
            }
        }
        BinaryOp::Mul => {
            if lhs_lit == Some(1) {
                return Some(Expr { loc, ..(**rhs).clone() });
            }
            if rhs_lit == Some(1) {
                return Some(Expr { loc, ..(**lhs).clone() });
            }
            if lhs_lit == Some(0) || rhs_lit == Some(0) {
                let ty = expr.num_type().unwrap_or(NumType::U8);
                return Some(Expr {
                    loc,
                    ..Expr::literal(0, ty)
                });
            }
        }
        BinaryOp::Div => {
            if rhs_lit == Some(1) {
                return Some(Expr { loc, ..(**lhs).clone() });
            }
        }
        BinaryOp::BitAnd => {
            if lhs_lit == Some(0) || rhs_lit == Some(0) {
                let ty = expr.num_type().unwrap_or(NumType::U8);
                return Some(Expr {
                    loc,
                    ..Expr::literal(0, ty)
                });
            }
        }
        BinaryOp::Mod => {}
    }

    // Strength reduction: multiply/divide by a power of two becomes a shift,
    // but only for unsigned operands - an arithmetic right shift is not
    // division for negative values.
    let unsigned = |e: &Expr| e.num_type().is_some_and(|t| !t.is_signed());
    match op {
        BinaryOp::Mul => {
            if let Some(shift) = rhs_lit.and_then(power_of_two_exponent) {
                if unsigned(lhs) {
                    return Some(Expr {
                        loc,
                        ..Expr::binary(
                            BinaryOp::Shl,
                            (**lhs).clone(),
                            Expr::literal(shift, NumType::U8),
                        )
                    });
                }
            }
            if let Some(shift) = lhs_lit.and_then(power_of_two_exponent) {
                if unsigned(rhs) {
                    return Some(Expr {
                        loc,
                        ..Expr::binary(
                            BinaryOp::Shl,
                            (**rhs).clone(),
                            Expr::literal(shift, NumType::U8),
                        )
                    });
                }
            }
        }
        BinaryOp::Div => {
            if let Some(shift) = rhs_lit.and_then(power_of_two_exponent) {
                if unsigned(lhs) {
                    return Some(Expr {
                        loc,
                        ..Expr::binary(
                            BinaryOp::Shr,
                            (**lhs).clone(),
                            Expr::literal(shift, NumType::U8),
                        )
                    });
                }
            }
        }
        _ => {}
    }

    None
}

/// log2 of a literal when it is a power of two worth shifting by.
fn power_of_two_exponent(value: i32) -> Option<i32> {
    (value >= 2 && (value & (value - 1)) == 0).then(|| value.trailing_zeros() as i32)
}

/// Fold two literals in the operator's declared width. Returns None only
/// for division/modulo by zero.
fn fold_literals(op: BinaryOp, a: i32, aty: NumType, b: i32, bty: NumType) -> Option<Expr> {
    if matches!(op, BinaryOp::Div | BinaryOp::Mod) && b == 0 {
        return None;
    }
    let ty = NumType::unify(aty, bty);
    let shift = (b.clamp(0, 31)) as u32;
    let raw: i64 = match op {
        BinaryOp::Add => a as i64 + b as i64,
        BinaryOp::Sub => a as i64 - b as i64,
        BinaryOp::Mul => a as i64 * b as i64,
        BinaryOp::Div => (a / b) as i64,
        BinaryOp::Mod => (a % b) as i64,
        BinaryOp::BitAnd => (a as i64) & (b as i64),
        BinaryOp::BitOr => (a as i64) | (b as i64),
        BinaryOp::BitXor => (a as i64) ^ (b as i64),
        BinaryOp::Shl => (a as i64) << shift,
        BinaryOp::Shr => {
            if aty.is_signed() {
                (a >> shift) as i64
            } else {
                ((a as u32) >> shift) as i64
            }
        }
    };
    Some(Expr::literal(ty.wrap(raw), ty))
}

/// Optimize a statement list. Statements usually map one-to-one; a branch
/// chain whose first live arm is literally true splices its body in place.
pub fn optimize_block(stmts: &[Stmt]) -> Vec<Stmt> {
    stmts.iter().flat_map(optimize_stmt).collect()
}

fn optimize_target(target: &AssignTarget) -> AssignTarget {
    match target {
        AssignTarget::Var(name) => AssignTarget::Var(name.clone()),
        AssignTarget::Index { array, index } => AssignTarget::Index {
            array: array.clone(),
            index: optimize(index),
        },
    }
}

/// Optimize one statement. Returns the replacement sequence: one statement
/// for most kinds, possibly several (or none) when dead-branch pruning
/// collapses an `if` chain.
pub fn optimize_stmt(stmt: &Stmt) -> Vec<Stmt> {
    let loc = stmt.loc.clone();
    match &stmt.kind {
        StmtKind::Assign { target, op, value } => vec![Stmt {
            kind: StmtKind::Assign {
                target: optimize_target(target),
                op: *op,
                value: optimize(value),
            },
            loc,
        }],

        StmtKind::If { arms, else_body } => {
            let mut live_arms: Vec<IfArm> = Vec::new();
            let mut final_else = optimize_block(else_body);

            // Each arm is pruned against ITS OWN condition. Iterating the
            // (condition, body) pairs together is load-bearing: reusing the
            // first arm's condition for later arms is a known
            // miscompilation class.
            for arm in arms {
                let condition = optimize(&arm.condition);
                let body = optimize_block(&arm.body);
                match condition.as_literal() {
                    // Literal false: the arm can never run.
                    Some((0, _)) => continue,
                    // Literal true: later arms and the old else are
                    // unreachable. With no live arms before it the chain
                    // degenerates to this body.
                    Some((_, _)) => {
                        if live_arms.is_empty() {
                            return body;
                        }
                        final_else = body;
                        return vec![Stmt {
                            kind: StmtKind::If {
                                arms: live_arms,
                                else_body: final_else,
                            },
                            loc,
                        }];
                    }
                    None => live_arms.push(IfArm { condition, body }),
                }
            }

            if live_arms.is_empty() {
                return final_else;
            }
            vec![Stmt {
                kind: StmtKind::If {
                    arms: live_arms,
                    else_body: final_else,
                },
                loc,
            }]
        }

        StmtKind::Loop { var, count, body } => vec![Stmt {
            kind: StmtKind::Loop {
                var: var.clone(),
                count: optimize(count),
                body: optimize_block(body),
            },
            loc,
        }],

        StmtKind::Expr(expr) => vec![Stmt {
            kind: StmtKind::Expr(optimize(expr)),
            loc,
        }],

        StmtKind::TweenStart {
            target,
            to,
            duration_frames,
            easing,
        } => vec![Stmt {
            kind: StmtKind::TweenStart {
                target: optimize_target(target),
                to: *to,
                duration_frames: *duration_frames,
                easing: *easing,
            },
            loc,
        }],

        StmtKind::SceneGoto { .. }
        | StmtKind::AnimPlay { .. }
        | StmtKind::AnimStop { .. }
        | StmtKind::Despawn => vec![stmt.clone()],
    }
}

/// Produce a copy of the model with every embedded statement list and
/// condition expression optimized. The input model is untouched.
pub fn optimize_model(model: &Model) -> Model {
    log::debug!("optimizer: rewriting model '{}'", model.name);
    let mut out = model.clone();

    for entity in &mut out.entities {
        entity.on_frame = optimize_block(&entity.on_frame);
    }
    for pool in &mut out.pools {
        pool.on_spawn = optimize_block(&pool.on_spawn);
        pool.on_frame = optimize_block(&pool.on_frame);
        pool.on_despawn = optimize_block(&pool.on_despawn);
        pool.despawn_when = pool.despawn_when.as_ref().map(optimize);
    }
    for scene in &mut out.scenes {
        scene.on_enter = optimize_block(&scene.on_enter);
        scene.on_frame = optimize_block(&scene.on_frame);
    }
    for machine in &mut out.state_machines {
        for state in &mut machine.states {
            state.on_enter = optimize_block(&state.on_enter);
            state.on_exit = optimize_block(&state.on_exit);
            for transition in &mut state.transitions {
                transition.condition = optimize(&transition.condition);
            }
        }
    }
    out
}

#[cfg(test)]
#[path = "optimizer_tests.rs"]
mod tests;

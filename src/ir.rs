// Intermediate Representation
//
// The IR is a small closed set of expression and statement shapes sitting
// between the authored game model and the emitted VC-8 script text. Every
// consumer (optimizer, validator, emitter) matches these variants
// exhaustively, so adding a kind is a compile-time obligation everywhere.

use serde::Serialize;
use std::fmt;

/// Primitive storage types of the target. Everything the generated code
/// touches is one of these four widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NumType {
    U8,
    I8,
    U16,
    I16,
}

impl NumType {
    pub fn bits(&self) -> u32 {
        match self {
            NumType::U8 | NumType::I8 => 8,
            NumType::U16 | NumType::I16 => 16,
        }
    }

    pub fn bytes(&self) -> usize {
        (self.bits() / 8) as usize
    }

    pub fn is_signed(&self) -> bool {
        matches!(self, NumType::I8 | NumType::I16)
    }

    pub fn min_value(&self) -> i32 {
        match self {
            NumType::U8 | NumType::U16 => 0,
            NumType::I8 => i8::MIN as i32,
            NumType::I16 => i16::MIN as i32,
        }
    }

    pub fn max_value(&self) -> i32 {
        match self {
            NumType::U8 => u8::MAX as i32,
            NumType::I8 => i8::MAX as i32,
            NumType::U16 => u16::MAX as i32,
            NumType::I16 => i16::MAX as i32,
        }
    }

    /// Wrap an arbitrary intermediate result to this type's representable
    /// range, matching the target ALU (plain binary, no saturation).
    pub fn wrap(&self, value: i64) -> i32 {
        match self {
            NumType::U8 => (value as u8) as i32,
            NumType::I8 => (value as u8) as i8 as i32,
            NumType::U16 => (value as u16) as i32,
            NumType::I16 => (value as u16) as i16 as i32,
        }
    }

    /// Width a binary operator computes in when its operands disagree:
    /// widest bits win, and the result is signed only if both sides are.
    pub fn unify(a: NumType, b: NumType) -> NumType {
        let bits = a.bits().max(b.bits());
        let signed = a.is_signed() && b.is_signed();
        match (bits, signed) {
            (8, false) => NumType::U8,
            (8, true) => NumType::I8,
            (16, false) => NumType::U16,
            (_, _) => NumType::I16,
        }
    }

    /// Type keyword in the output dialect.
    pub fn keyword(&self) -> &'static str {
        match self {
            NumType::U8 => "byte",
            NumType::I8 => "sbyte",
            NumType::U16 => "word",
            NumType::I16 => "sword",
        }
    }
}

impl fmt::Display for NumType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Location in the authored source, carried through optimization so the
/// emitter can map output lines back to where an author wrote the statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceLoc {
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub symbol: Option<String>,
    pub snippet: Option<String>,
}

impl SourceLoc {
    pub fn new(file: &str, line: u32, column: u32) -> Self {
        SourceLoc {
            file: file.to_string(),
            line,
            column,
            symbol: None,
            snippet: None,
        }
    }

    pub fn with_symbol(mut self, symbol: &str) -> Self {
        self.symbol = Some(symbol.to_string());
        self
    }

    pub fn with_snippet(mut self, snippet: &str) -> Self {
        self.snippet = Some(snippet.to_string());
        self
    }
}

/// Binary arithmetic/bitwise operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
        }
    }
}

/// Comparison operators; they evaluate to 0 or 1 on the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    BitNot,
    Not,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::BitNot => "~",
            UnaryOp::Not => "!",
        }
    }
}

/// How an input read samples its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Current-frame value only.
    Held,
    /// High this frame, low last frame. Needs a previous-frame snapshot.
    JustPressed,
    /// Low this frame, high last frame. Needs a previous-frame snapshot.
    JustReleased,
}

/// Expression node. The kind determines which slots are populated; the tree
/// is acyclic and owned by its containing statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub loc: Option<SourceLoc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal {
        value: i32,
        ty: NumType,
    },
    Var {
        name: String,
        ty: NumType,
    },
    /// Indexed read of a pool field array, named `<pool>.<field>`.
    Index {
        array: String,
        index: Box<Expr>,
        ty: NumType,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Compare {
        op: CompareOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Ternary {
        cond: Box<Expr>,
        then_val: Box<Expr>,
        else_val: Box<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
    /// Controller/button read.
    Input {
        source: String,
        mode: InputMode,
    },
    /// Swept-AABB overlap query between two pools.
    SweepCollides {
        pool: String,
        other: String,
    },
}

impl Expr {
    pub fn literal(value: i32, ty: NumType) -> Expr {
        Expr {
            kind: ExprKind::Literal { value, ty },
            loc: None,
        }
    }

    pub fn var(name: &str, ty: NumType) -> Expr {
        Expr {
            kind: ExprKind::Var {
                name: name.to_string(),
                ty,
            },
            loc: None,
        }
    }

    pub fn index(array: &str, index: Expr, ty: NumType) -> Expr {
        Expr {
            kind: ExprKind::Index {
                array: array.to_string(),
                index: Box::new(index),
                ty,
            },
            loc: None,
        }
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr {
            kind: ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            loc: None,
        }
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Expr {
        Expr {
            kind: ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            loc: None,
        }
    }

    pub fn compare(op: CompareOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr {
            kind: ExprKind::Compare {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            loc: None,
        }
    }

    pub fn ternary(cond: Expr, then_val: Expr, else_val: Expr) -> Expr {
        Expr {
            kind: ExprKind::Ternary {
                cond: Box::new(cond),
                then_val: Box::new(then_val),
                else_val: Box::new(else_val),
            },
            loc: None,
        }
    }

    pub fn call(name: &str, args: Vec<Expr>) -> Expr {
        Expr {
            kind: ExprKind::Call {
                name: name.to_string(),
                args,
            },
            loc: None,
        }
    }

    pub fn input(source: &str, mode: InputMode) -> Expr {
        Expr {
            kind: ExprKind::Input {
                source: source.to_string(),
                mode,
            },
            loc: None,
        }
    }

    pub fn sweep_collides(pool: &str, other: &str) -> Expr {
        Expr {
            kind: ExprKind::SweepCollides {
                pool: pool.to_string(),
                other: other.to_string(),
            },
            loc: None,
        }
    }

    pub fn at(mut self, loc: SourceLoc) -> Expr {
        self.loc = Some(loc);
        self
    }

    /// Literal value if this node folded all the way down.
    pub fn as_literal(&self) -> Option<(i32, NumType)> {
        match self.kind {
            ExprKind::Literal { value, ty } => Some((value, ty)),
            _ => None,
        }
    }

    /// Storage type of the value this expression produces, when the node
    /// shape pins it down. Comparisons, logical nots, inputs and collision
    /// queries are 0/1 bytes on the target.
    pub fn num_type(&self) -> Option<NumType> {
        match &self.kind {
            ExprKind::Literal { ty, .. } => Some(*ty),
            ExprKind::Var { ty, .. } => Some(*ty),
            ExprKind::Index { ty, .. } => Some(*ty),
            ExprKind::Binary { lhs, rhs, .. } => match (lhs.num_type(), rhs.num_type()) {
                (Some(a), Some(b)) => Some(NumType::unify(a, b)),
                (Some(a), None) | (None, Some(a)) => Some(a),
                (None, None) => None,
            },
            ExprKind::Unary { operand, .. } => operand.num_type(),
            ExprKind::Compare { .. } => Some(NumType::U8),
            ExprKind::Ternary { then_val, .. } => then_val.num_type(),
            ExprKind::Call { .. } => None,
            ExprKind::Input { .. } => Some(NumType::U8),
            ExprKind::SweepCollides { .. } => Some(NumType::U8),
        }
    }
}

/// Assignment flavors the dialect supports directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Set,
    AddAssign,
    SubAssign,
}

impl AssignOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            AssignOp::Set => "=",
            AssignOp::AddAssign => "+=",
            AssignOp::SubAssign => "-=",
        }
    }
}

/// Left-hand side of an assignment or tween.
#[derive(Debug, Clone, PartialEq)]
pub enum AssignTarget {
    Var(String),
    Index { array: String, index: Expr },
}

/// One (condition, body) pair of a branch chain. Each arm owns its own
/// condition; consumers must never test a later arm against the first
/// arm's condition.
#[derive(Debug, Clone, PartialEq)]
pub struct IfArm {
    pub condition: Expr,
    pub body: Vec<Stmt>,
}

/// Tween easing curves known to the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
}

impl Easing {
    pub fn constant_name(&self) -> &'static str {
        match self {
            Easing::Linear => "EASE_LINEAR",
            Easing::EaseIn => "EASE_IN",
            Easing::EaseOut => "EASE_OUT",
            Easing::EaseInOut => "EASE_IN_OUT",
        }
    }
}

/// Statement node.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub loc: Option<SourceLoc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Assign {
        target: AssignTarget,
        op: AssignOp,
        value: Expr,
    },
    /// Branch chain: ordered arms plus an optional trailing else body.
    If {
        arms: Vec<IfArm>,
        else_body: Vec<Stmt>,
    },
    /// Counted loop: `var` runs 0..count.
    Loop {
        var: String,
        count: Expr,
        body: Vec<Stmt>,
    },
    /// Expression evaluated for effect (runtime calls).
    Expr(Expr),
    SceneGoto {
        scene: String,
    },
    AnimPlay {
        sprite: String,
        animation: String,
    },
    AnimStop {
        sprite: String,
    },
    TweenStart {
        target: AssignTarget,
        to: i32,
        duration_frames: u32,
        easing: Easing,
    },
    /// Deactivate the current pool slot. Only meaningful inside a pool
    /// lifecycle hook.
    Despawn,
}

impl Stmt {
    pub fn assign(target: AssignTarget, op: AssignOp, value: Expr) -> Stmt {
        Stmt {
            kind: StmtKind::Assign { target, op, value },
            loc: None,
        }
    }

    pub fn if_chain(arms: Vec<IfArm>, else_body: Vec<Stmt>) -> Stmt {
        Stmt {
            kind: StmtKind::If { arms, else_body },
            loc: None,
        }
    }

    pub fn loop_counted(var: &str, count: Expr, body: Vec<Stmt>) -> Stmt {
        Stmt {
            kind: StmtKind::Loop {
                var: var.to_string(),
                count,
                body,
            },
            loc: None,
        }
    }

    pub fn expr(expr: Expr) -> Stmt {
        Stmt {
            kind: StmtKind::Expr(expr),
            loc: None,
        }
    }

    pub fn scene_goto(scene: &str) -> Stmt {
        Stmt {
            kind: StmtKind::SceneGoto {
                scene: scene.to_string(),
            },
            loc: None,
        }
    }

    pub fn anim_play(sprite: &str, animation: &str) -> Stmt {
        Stmt {
            kind: StmtKind::AnimPlay {
                sprite: sprite.to_string(),
                animation: animation.to_string(),
            },
            loc: None,
        }
    }

    pub fn anim_stop(sprite: &str) -> Stmt {
        Stmt {
            kind: StmtKind::AnimStop {
                sprite: sprite.to_string(),
            },
            loc: None,
        }
    }

    pub fn tween(target: AssignTarget, to: i32, duration_frames: u32, easing: Easing) -> Stmt {
        Stmt {
            kind: StmtKind::TweenStart {
                target,
                to,
                duration_frames,
                easing,
            },
            loc: None,
        }
    }

    pub fn despawn() -> Stmt {
        Stmt {
            kind: StmtKind::Despawn,
            loc: None,
        }
    }

    pub fn at(mut self, loc: SourceLoc) -> Stmt {
        self.loc = Some(loc);
        self
    }
}

/// Depth-first walk over a statement list, visiting nested bodies.
pub fn walk_stmts<'a>(stmts: &'a [Stmt], visit: &mut impl FnMut(&'a Stmt)) {
    for stmt in stmts {
        visit(stmt);
        match &stmt.kind {
            StmtKind::If { arms, else_body } => {
                for arm in arms {
                    walk_stmts(&arm.body, visit);
                }
                walk_stmts(else_body, visit);
            }
            StmtKind::Loop { body, .. } => walk_stmts(body, visit),
            _ => {}
        }
    }
}

/// Depth-first walk over one expression tree.
pub fn walk_expr<'a>(expr: &'a Expr, visit: &mut impl FnMut(&'a Expr)) {
    visit(expr);
    match &expr.kind {
        ExprKind::Index { index, .. } => walk_expr(index, visit),
        ExprKind::Binary { lhs, rhs, .. } | ExprKind::Compare { lhs, rhs, .. } => {
            walk_expr(lhs, visit);
            walk_expr(rhs, visit);
        }
        ExprKind::Unary { operand, .. } => walk_expr(operand, visit),
        ExprKind::Ternary {
            cond,
            then_val,
            else_val,
        } => {
            walk_expr(cond, visit);
            walk_expr(then_val, visit);
            walk_expr(else_val, visit);
        }
        ExprKind::Call { args, .. } => {
            for arg in args {
                walk_expr(arg, visit);
            }
        }
        ExprKind::Literal { .. }
        | ExprKind::Var { .. }
        | ExprKind::Input { .. }
        | ExprKind::SweepCollides { .. } => {}
    }
}

/// Depth-first walk over every expression reachable from a statement list,
/// including conditions and nested operands.
pub fn walk_exprs<'a>(stmts: &'a [Stmt], visit: &mut impl FnMut(&'a Expr)) {
    walk_stmts(stmts, &mut |stmt| match &stmt.kind {
        StmtKind::Assign { target, value, .. } => {
            if let AssignTarget::Index { index, .. } = target {
                walk_expr(index, visit);
            }
            walk_expr(value, visit);
        }
        StmtKind::If { arms, .. } => {
            for arm in arms {
                walk_expr(&arm.condition, visit);
            }
        }
        StmtKind::Loop { count, .. } => walk_expr(count, visit),
        StmtKind::Expr(expr) => walk_expr(expr, visit),
        StmtKind::TweenStart { target, .. } => {
            if let AssignTarget::Index { index, .. } = target {
                walk_expr(index, visit);
            }
        }
        StmtKind::SceneGoto { .. }
        | StmtKind::AnimPlay { .. }
        | StmtKind::AnimStop { .. }
        | StmtKind::Despawn => {}
    });
}

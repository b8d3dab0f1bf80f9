// Optimizer Tests

#[cfg(test)]
mod optimizer_tests {
    use crate::ir::*;
    use crate::optimizer::{optimize, optimize_block, optimize_stmt};

    fn lit(value: i32) -> Expr {
        Expr::literal(value, NumType::U8)
    }

    fn lit16(value: i32) -> Expr {
        Expr::literal(value, NumType::U16)
    }

    fn x() -> Expr {
        Expr::var("x", NumType::U8)
    }

    /// Evaluate a u8-typed expression tree over one free variable, with
    /// 8-bit wraparound, for equivalence checks against the rewritten form.
    fn eval(expr: &Expr, x_value: u8) -> i32 {
        match &expr.kind {
            ExprKind::Literal { value, .. } => *value,
            ExprKind::Var { .. } => x_value as i32,
            ExprKind::Binary { op, lhs, rhs } => {
                let a = eval(lhs, x_value);
                let b = eval(rhs, x_value);
                let raw = match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    BinaryOp::Mod => a % b,
                    BinaryOp::BitAnd => a & b,
                    BinaryOp::BitOr => a | b,
                    BinaryOp::BitXor => a ^ b,
                    BinaryOp::Shl => a << b,
                    BinaryOp::Shr => a >> b,
                };
                raw & 0xFF
            }
            other => panic!("eval does not support {:?}", other),
        }
    }

    #[test]
    fn folds_arithmetic() {
        assert_eq!(
            optimize(&Expr::binary(BinaryOp::Add, lit(5), lit(3))),
            lit(8)
        );
        assert_eq!(
            optimize(&Expr::binary(BinaryOp::Mul, lit(6), lit(7))),
            lit(42)
        );
        assert_eq!(
            optimize(&Expr::binary(BinaryOp::Div, lit(42), lit(6))),
            lit(7)
        );
    }

    #[test]
    fn folds_bitwise() {
        assert_eq!(
            optimize(&Expr::binary(BinaryOp::BitAnd, lit(0xFF), lit(0x0F))),
            lit(15)
        );
        assert_eq!(
            optimize(&Expr::binary(BinaryOp::BitOr, lit(0xF0), lit(0x0F))),
            lit(0xFF)
        );
        assert_eq!(
            optimize(&Expr::binary(BinaryOp::BitXor, lit(0xFF), lit(0x0F))),
            lit(0xF0)
        );
    }

    #[test]
    fn folding_wraps_at_declared_width() {
        // u8 wraps at 256
        assert_eq!(
            optimize(&Expr::binary(BinaryOp::Add, lit(200), lit(100))),
            lit(44)
        );
        // u16 wraps at 65536
        assert_eq!(
            optimize(&Expr::binary(BinaryOp::Add, lit16(40000), lit16(40000))),
            lit16(14464)
        );
        // i8 wraps two's-complement
        assert_eq!(
            optimize(&Expr::binary(
                BinaryOp::Add,
                Expr::literal(100, NumType::I8),
                Expr::literal(100, NumType::I8)
            )),
            Expr::literal(-56, NumType::I8)
        );
    }

    #[test]
    fn division_by_literal_zero_is_never_folded() {
        let expr = Expr::binary(BinaryOp::Div, lit(5), lit(0));
        assert_eq!(optimize(&expr), expr);
        let expr = Expr::binary(BinaryOp::Mod, lit(5), lit(0));
        assert_eq!(optimize(&expr), expr);
    }

    #[test]
    fn identity_elimination() {
        assert_eq!(optimize(&Expr::binary(BinaryOp::Add, x(), lit(0))), x());
        assert_eq!(optimize(&Expr::binary(BinaryOp::Add, lit(0), x())), x());
        assert_eq!(optimize(&Expr::binary(BinaryOp::Sub, x(), lit(0))), x());
        assert_eq!(optimize(&Expr::binary(BinaryOp::Mul, x(), lit(1))), x());
        assert_eq!(optimize(&Expr::binary(BinaryOp::Mul, lit(1), x())), x());
        assert_eq!(optimize(&Expr::binary(BinaryOp::Div, x(), lit(1))), x());
        assert_eq!(optimize(&Expr::binary(BinaryOp::BitOr, x(), lit(0))), x());
        assert_eq!(optimize(&Expr::binary(BinaryOp::BitXor, lit(0), x())), x());
    }

    #[test]
    fn annihilator_elimination_drops_the_read() {
        assert_eq!(optimize(&Expr::binary(BinaryOp::Mul, x(), lit(0))), lit(0));
        assert_eq!(optimize(&Expr::binary(BinaryOp::Mul, lit(0), x())), lit(0));
        assert_eq!(
            optimize(&Expr::binary(BinaryOp::BitAnd, x(), lit(0))),
            lit(0)
        );
    }

    #[test]
    fn strength_reduction_for_unsigned_operands() {
        let reduced = optimize(&Expr::binary(BinaryOp::Mul, x(), lit(8)));
        assert_eq!(reduced, Expr::binary(BinaryOp::Shl, x(), lit(3)));

        let reduced = optimize(&Expr::binary(BinaryOp::Mul, lit(4), x()));
        assert_eq!(reduced, Expr::binary(BinaryOp::Shl, x(), lit(2)));

        let reduced = optimize(&Expr::binary(BinaryOp::Div, x(), lit(2)));
        assert_eq!(reduced, Expr::binary(BinaryOp::Shr, x(), lit(1)));
    }

    #[test]
    fn no_strength_reduction_for_signed_operands() {
        // An arithmetic right shift is not division for negative values.
        let signed = Expr::var("s", NumType::I8);
        let expr = Expr::binary(BinaryOp::Div, signed.clone(), lit(2));
        assert_eq!(optimize(&expr), expr);

        let expr = Expr::binary(BinaryOp::Mul, signed, lit(4));
        assert_eq!(optimize(&expr), expr);
    }

    #[test]
    fn strength_reduction_is_value_equivalent_for_all_u8() {
        let double = optimize(&Expr::binary(BinaryOp::Mul, x(), lit(2)));
        let halve = optimize(&Expr::binary(BinaryOp::Div, x(), lit(2)));
        for v in 0..=255u8 {
            assert_eq!(eval(&double, v), ((v as i32) * 2) & 0xFF, "v = {}", v);
            assert_eq!(eval(&halve, v), (v as i32) / 2, "v = {}", v);
        }
    }

    #[test]
    fn optimize_is_idempotent() {
        let samples = vec![
            Expr::binary(
                BinaryOp::Add,
                Expr::binary(BinaryOp::Mul, x(), lit(4)),
                Expr::binary(BinaryOp::Add, lit(2), lit(3)),
            ),
            Expr::binary(BinaryOp::Div, x(), lit(0)),
            Expr::ternary(Expr::compare(CompareOp::Lt, x(), lit(10)), lit(1), lit(2)),
            Expr::unary(UnaryOp::BitNot, Expr::binary(BinaryOp::Add, x(), lit(0))),
        ];
        for expr in samples {
            let once = optimize(&expr);
            assert_eq!(optimize(&once), once, "not a fixed point: {:?}", expr);
        }
    }

    #[test]
    fn folds_comparisons_and_ternaries() {
        assert_eq!(
            optimize(&Expr::compare(CompareOp::Eq, lit(3), lit(3))),
            lit(1)
        );
        assert_eq!(
            optimize(&Expr::compare(CompareOp::Gt, lit(2), lit(9))),
            lit(0)
        );
        // The whole conditional collapses once its condition folds.
        let expr = Expr::ternary(
            Expr::compare(CompareOp::Le, lit(1), lit(2)),
            x(),
            lit(99),
        );
        assert_eq!(optimize(&expr), x());
    }

    #[test]
    fn folds_unary_operators() {
        assert_eq!(optimize(&Expr::unary(UnaryOp::Neg, lit(5))), lit(251));
        assert_eq!(optimize(&Expr::unary(UnaryOp::BitNot, lit(0x0F))), lit(0xF0));
        assert_eq!(optimize(&Expr::unary(UnaryOp::Not, lit(0))), lit(1));
        assert_eq!(optimize(&Expr::unary(UnaryOp::Not, lit(7))), lit(0));
    }

    #[test]
    fn nested_trees_fold_bottom_up() {
        // (2 + 3) * (x + 0) -> x * 5 -> no further change
        let expr = Expr::binary(
            BinaryOp::Mul,
            Expr::binary(BinaryOp::Add, lit(2), lit(3)),
            Expr::binary(BinaryOp::Add, x(), lit(0)),
        );
        assert_eq!(optimize(&expr), Expr::binary(BinaryOp::Mul, lit(5), x()));
    }

    #[test]
    fn source_locations_survive_folding() {
        let loc = SourceLoc::new("game.gm", 12, 3);
        let expr = Expr::binary(BinaryOp::Add, lit(5), lit(3)).at(loc.clone());
        assert_eq!(optimize(&expr).loc, Some(loc));
    }

    // --- Dead-branch pruning -------------------------------------------

    fn assign_marker(name: &str) -> Stmt {
        Stmt::assign(
            AssignTarget::Var(name.to_string()),
            AssignOp::Set,
            lit(1),
        )
    }

    #[test]
    fn literal_false_arm_is_removed() {
        let chain = Stmt::if_chain(
            vec![
                IfArm {
                    condition: lit(0),
                    body: vec![assign_marker("a")],
                },
                IfArm {
                    condition: Expr::compare(CompareOp::Eq, x(), lit(1)),
                    body: vec![assign_marker("b")],
                },
            ],
            vec![],
        );
        let out = optimize_stmt(&chain);
        assert_eq!(out.len(), 1);
        let StmtKind::If { arms, .. } = &out[0].kind else {
            panic!("expected if chain, got {:?}", out[0]);
        };
        assert_eq!(arms.len(), 1);
        // The surviving arm keeps ITS OWN condition and body: this is the
        // regression guard against testing every arm with the first entry.
        assert_eq!(
            arms[0].condition,
            Expr::compare(CompareOp::Eq, x(), lit(1))
        );
        assert_eq!(arms[0].body, vec![assign_marker("b")]);
    }

    #[test]
    fn literal_true_first_arm_degenerates_to_its_body() {
        let chain = Stmt::if_chain(
            vec![
                IfArm {
                    condition: Expr::compare(CompareOp::Eq, lit(1), lit(1)),
                    body: vec![assign_marker("a")],
                },
                IfArm {
                    condition: x(),
                    body: vec![assign_marker("b")],
                },
            ],
            vec![assign_marker("c")],
        );
        assert_eq!(optimize_stmt(&chain), vec![assign_marker("a")]);
    }

    #[test]
    fn literal_true_later_arm_truncates_the_chain() {
        let chain = Stmt::if_chain(
            vec![
                IfArm {
                    condition: x(),
                    body: vec![assign_marker("a")],
                },
                IfArm {
                    condition: lit(1),
                    body: vec![assign_marker("b")],
                },
                IfArm {
                    condition: Expr::var("never", NumType::U8),
                    body: vec![assign_marker("c")],
                },
            ],
            vec![assign_marker("d")],
        );
        let out = optimize_stmt(&chain);
        assert_eq!(out.len(), 1);
        let StmtKind::If { arms, else_body } = &out[0].kind else {
            panic!("expected if chain");
        };
        assert_eq!(arms.len(), 1);
        assert_eq!(arms[0].condition, x());
        // The always-true arm became the final else; later arms and the old
        // else are gone.
        assert_eq!(else_body, &vec![assign_marker("b")]);
    }

    #[test]
    fn fully_dead_chain_collapses_to_else() {
        let chain = Stmt::if_chain(
            vec![IfArm {
                condition: lit(0),
                body: vec![assign_marker("a")],
            }],
            vec![assign_marker("e")],
        );
        assert_eq!(optimize_stmt(&chain), vec![assign_marker("e")]);
    }

    #[test]
    fn blocks_splice_degenerated_chains() {
        let stmts = vec![
            assign_marker("before"),
            Stmt::if_chain(
                vec![IfArm {
                    condition: lit(1),
                    body: vec![assign_marker("inner1"), assign_marker("inner2")],
                }],
                vec![],
            ),
            assign_marker("after"),
        ];
        let out = optimize_block(&stmts);
        assert_eq!(
            out,
            vec![
                assign_marker("before"),
                assign_marker("inner1"),
                assign_marker("inner2"),
                assign_marker("after"),
            ]
        );
    }

    #[test]
    fn loop_counts_and_bodies_are_optimized() {
        let stmt = Stmt::loop_counted(
            "i",
            Expr::binary(BinaryOp::Add, lit(4), lit(4)),
            vec![Stmt::assign(
                AssignTarget::Var("x".to_string()),
                AssignOp::AddAssign,
                Expr::binary(BinaryOp::Mul, x(), lit(1)),
            )],
        );
        let out = optimize_stmt(&stmt);
        let StmtKind::Loop { count, body, .. } = &out[0].kind else {
            panic!("expected loop");
        };
        assert_eq!(count, &lit(8));
        let StmtKind::Assign { value, .. } = &body[0].kind else {
            panic!("expected assign");
        };
        assert_eq!(value, &x());
    }
}

/// emitter_routines.rs
/// Routine bodies: entity frame hooks, pool update/spawn loops, state
/// machine dispatch, scene lifecycles, the per-frame driver and the
/// input-snapshot epilogue.
use crate::emitter::{constant, identifier, EmitScope, Emitter};
use crate::error::CompilerError;
use crate::ir::{BinaryOp, Stmt, StmtKind};
use crate::optimizer::precedence;

impl Emitter<'_> {
    pub(crate) fn write_routines(&mut self) -> Result<(), CompilerError> {
        for (n, entity) in self.model.entities.iter().enumerate() {
            let prefix = self.entity_prefix(n, entity);
            self.open(&format!("routine {}_frame()", prefix));
            self.emit_block(&entity.on_frame, &EmitScope::Entity(n, entity))?;
            self.close();
            self.blank();
        }

        for pool in &self.model.pools {
            self.write_pool_update(pool)?;
            self.write_pool_spawn(pool)?;
        }

        for machine in &self.model.state_machines {
            self.write_machine_step(machine)?;
        }

        for scene in &self.model.scenes {
            self.write_scene_routines(scene)?;
        }

        self.write_game_frame();
        self.write_frame_end();
        Ok(())
    }

    /// Per-pool update: one loop over the shared index, an active guard,
    /// the on_frame hook, then the despawn condition and hook.
    fn write_pool_update(&mut self, pool: &crate::model::Pool) -> Result<(), CompilerError> {
        let name = identifier(&pool.name);
        let scope = EmitScope::Pool(pool);

        self.open(&format!("routine pool_{}_update()", name));
        self.open(&format!("for i = 0 to {}_CAP - 1", constant(&pool.name)));
        self.open(&format!("if pool_{}_active[i]", name));

        self.emit_block(&pool.on_frame, &scope)?;

        if let Some(condition) = &pool.despawn_when {
            let text = self.expr_text(condition, &scope)?;
            self.open_mapped(&format!("if {}", text), condition.loc.as_ref());
            self.emit_block(&pool.on_despawn, &scope)?;
            self.line(&format!("pool_{}_active[i] = 0;", name));
            self.close();
        }

        self.close();
        self.close();
        self.close();
        self.blank();
        Ok(())
    }

    /// Spawn claims the first inactive slot, runs the hook, and returns.
    fn write_pool_spawn(&mut self, pool: &crate::model::Pool) -> Result<(), CompilerError> {
        let name = identifier(&pool.name);
        let scope = EmitScope::Pool(pool);

        self.open(&format!("routine pool_{}_spawn()", name));
        self.open(&format!("for i = 0 to {}_CAP - 1", constant(&pool.name)));
        self.open(&format!("if pool_{}_active[i] == 0", name));
        self.line(&format!("pool_{}_active[i] = 1;", name));
        self.emit_block(&pool.on_spawn, &scope)?;
        self.line("return;");
        self.close();
        self.close();
        self.close();
        self.blank();
        Ok(())
    }

    /// State dispatch: a branch chain over the state index. Each state's
    /// transitions test their own conditions in declaration order; a taken
    /// transition runs exit hooks, switches state, runs enter hooks and
    /// returns.
    fn write_machine_step(
        &mut self,
        machine: &crate::model::StateMachine,
    ) -> Result<(), CompilerError> {
        if machine.states.is_empty() {
            return Ok(());
        }
        let name = identifier(&machine.name);
        let upper = constant(&machine.name);

        self.open(&format!("routine fsm_{}_step()", name));
        for (n, state) in machine.states.iter().enumerate() {
            let header = format!(
                "if fsm_{}_state == FSM_{}_{}",
                name,
                upper,
                constant(&state.name)
            );
            if n == 0 {
                self.open(&header);
            } else {
                self.reopen(&format!("else {}", header));
            }

            for transition in &state.transitions {
                let target = machine.state(&transition.target).ok_or_else(|| {
                    CompilerError::EmitError(format!(
                        "state machine '{}' transitions to unknown state '{}'",
                        machine.name, transition.target
                    ))
                })?;
                let cond = self.expr_text(&transition.condition, &EmitScope::Global)?;
                self.open_mapped(&format!("if {}", cond), transition.condition.loc.as_ref());
                self.emit_block(&state.on_exit, &EmitScope::Global)?;
                self.line(&format!(
                    "fsm_{}_state = FSM_{}_{};",
                    name,
                    upper,
                    constant(&target.name)
                ));
                self.emit_block(&target.on_enter, &EmitScope::Global)?;
                self.line("return;");
                self.close();
            }
        }
        self.close();
        self.close();
        self.blank();
        Ok(())
    }

    fn write_scene_routines(&mut self, scene: &crate::model::Scene) -> Result<(), CompilerError> {
        let name = identifier(&scene.name);

        self.open(&format!("routine scene_{}_enter()", name));
        self.emit_block(&scene.on_enter, &EmitScope::Global)?;
        self.close();
        self.blank();

        self.open(&format!("routine scene_{}_frame()", name));
        self.emit_block(&scene.on_frame, &EmitScope::Global)?;
        for member in &scene.entities {
            let ordinal = self
                .model
                .entities
                .iter()
                .position(|e| &e.name == member)
                .ok_or_else(|| {
                    CompilerError::EmitError(format!(
                        "scene '{}' references unknown entity '{}'",
                        scene.name, member
                    ))
                })?;
            let prefix = self.entity_prefix(ordinal, &self.model.entities[ordinal]);
            self.line(&format!("{}_frame();", prefix));
        }
        for member in &scene.pools {
            if self.model.pool(member).is_none() {
                return Err(CompilerError::EmitError(format!(
                    "scene '{}' references unknown pool '{}'",
                    scene.name, member
                )));
            }
            self.line(&format!("pool_{}_update();", identifier(member)));
        }
        self.close();
        self.blank();
        Ok(())
    }

    /// Per-frame driver: dispatch to the active scene, step every machine,
    /// then refresh input snapshots.
    fn write_game_frame(&mut self) {
        self.open("routine game_frame()");
        for (n, scene) in self.model.scenes.iter().enumerate() {
            let header = format!("if current_scene == SCENE_{}", constant(&scene.name));
            if n == 0 {
                self.open(&header);
            } else {
                self.reopen(&format!("else {}", header));
            }
            self.line(&format!("scene_{}_frame();", identifier(&scene.name)));
        }
        if !self.model.scenes.is_empty() {
            self.close();
        }
        for machine in &self.model.state_machines {
            if !machine.states.is_empty() {
                self.line(&format!("fsm_{}_step();", identifier(&machine.name)));
            }
        }
        self.line("frame_end();");
        self.close();
        self.blank();
    }

    /// Previous-frame snapshots: exactly one per distinct edge-read source.
    fn write_frame_end(&mut self) {
        self.open("routine frame_end()");
        let edges = self.edge_sources.clone();
        for source in &edges {
            let id = identifier(source);
            self.line(&format!("prev_pad_{} = pad_{};", id, id));
        }
        self.close();
    }

    pub(crate) fn emit_block(
        &mut self,
        stmts: &[Stmt],
        scope: &EmitScope,
    ) -> Result<(), CompilerError> {
        for stmt in stmts {
            self.emit_stmt(stmt, scope)?;
        }
        Ok(())
    }

    fn emit_stmt(&mut self, stmt: &Stmt, scope: &EmitScope) -> Result<(), CompilerError> {
        match &stmt.kind {
            StmtKind::Assign { target, op, value } => {
                let text = format!(
                    "{} {} {};",
                    self.target_text(target, scope)?,
                    op.symbol(),
                    self.expr_text(value, scope)?
                );
                self.stmt_line(&text, stmt.loc.as_ref());
            }

            StmtKind::If { arms, else_body } => {
                // Arms are parallel (condition, body) pairs; each header is
                // printed from its own arm's condition.
                if arms.is_empty() {
                    return self.emit_block(else_body, scope);
                }
                for (n, arm) in arms.iter().enumerate() {
                    let cond = self.expr_text(&arm.condition, scope)?;
                    if n == 0 {
                        self.open_mapped(&format!("if {}", cond), stmt.loc.as_ref());
                    } else {
                        self.reopen(&format!("else if {}", cond));
                    }
                    self.emit_block(&arm.body, scope)?;
                }
                if !else_body.is_empty() {
                    self.reopen("else");
                    self.emit_block(else_body, scope)?;
                }
                self.close();
            }

            StmtKind::Loop { var, count, body } => {
                // Loop bound is inclusive in the dialect: 0 to count - 1.
                // A literal count of zero (or less) never enters the body,
                // and `for i = 0 to -1` is not a valid bound, so the whole
                // loop is dropped.
                if !matches!(count.as_literal(), Some((n, _)) if n <= 0) {
                    let bound = match count.as_literal() {
                        Some((n, _)) => (n - 1).to_string(),
                        None => format!(
                            "{} - 1",
                            self.print_expr(count, scope, precedence(BinaryOp::Sub), false)?
                        ),
                    };
                    self.open_mapped(
                        &format!("for {} = 0 to {}", identifier(var), bound),
                        stmt.loc.as_ref(),
                    );
                    self.emit_block(body, scope)?;
                    self.close();
                }
            }

            StmtKind::Expr(expr) => {
                let text = format!("{};", self.expr_text(expr, scope)?);
                self.stmt_line(&text, stmt.loc.as_ref());
            }

            StmtKind::SceneGoto { scene } => {
                if self.model.scene(scene).is_none() {
                    return Err(CompilerError::UnknownScene(scene.clone()));
                }
                let text = format!("scene_goto(SCENE_{});", constant(scene));
                self.stmt_line(&text, stmt.loc.as_ref());
            }

            StmtKind::AnimPlay { sprite, animation } => {
                if self.model.sprite(sprite).is_none() {
                    return Err(CompilerError::UnknownSprite(sprite.clone()));
                }
                if self.model.animation(animation).is_none() {
                    return Err(CompilerError::UnknownAnimation(animation.clone()));
                }
                let text = format!(
                    "anim_play(SPR_{}, ANIM_{});",
                    constant(sprite),
                    constant(animation)
                );
                self.stmt_line(&text, stmt.loc.as_ref());
            }

            StmtKind::AnimStop { sprite } => {
                if self.model.sprite(sprite).is_none() {
                    return Err(CompilerError::UnknownSprite(sprite.clone()));
                }
                let text = format!("anim_stop(SPR_{});", constant(sprite));
                self.stmt_line(&text, stmt.loc.as_ref());
            }

            StmtKind::TweenStart {
                target,
                to,
                duration_frames,
                easing,
            } => {
                let text = format!(
                    "tween_start({}, {}, {}, {});",
                    self.target_text(target, scope)?,
                    to,
                    duration_frames,
                    easing.constant_name()
                );
                self.stmt_line(&text, stmt.loc.as_ref());
            }

            StmtKind::Despawn => {
                let EmitScope::Pool(pool) = scope else {
                    return Err(CompilerError::DespawnOutsidePool);
                };
                let text = format!("pool_{}_active[i] = 0;", identifier(&pool.name));
                self.stmt_line(&text, stmt.loc.as_ref());
            }
        }
        Ok(())
    }
}

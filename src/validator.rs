// Static Validator
//
// A batch of independent semantic checks over the model. Checks never
// short-circuit each other and never mutate anything; each appends
// categorized diagnostics. A model is valid iff no check produced an error.
//
// Scan order inside every check is declaration order, so repeated runs over
// the same model produce identical diagnostic lists.

use crate::diagnostics::{Diagnostic, DiagnosticCategory, ValidationResult};
use crate::ir::{walk_expr, walk_exprs, walk_stmts, AssignTarget, ExprKind, StmtKind};
use crate::limits;
use crate::model::{Model, PaletteKind, Pool, Symbol};
use crate::suggestions::suggestion_text;
use indexmap::IndexSet;

/// Run every check against the model.
pub fn validate(model: &Model) -> ValidationResult {
    log::debug!("validator: checking model '{}'", model.name);
    let mut v = Validator {
        model,
        result: ValidationResult::new(),
    };
    v.check_resource_budgets();
    v.check_state_machines();
    v.check_duplicate_names();
    v.check_references();
    v.check_array_bounds();
    v.check_tween_ranges();
    v.check_physics_ranges();
    v.check_palettes();
    v.check_assets();
    log::debug!(
        "validator: {} error(s), {} warning(s)",
        v.result.errors.len(),
        v.result.warnings.len()
    );
    v.result
}

struct Validator<'a> {
    model: &'a Model,
    result: ValidationResult,
}

impl<'a> Validator<'a> {
    fn error(&mut self, category: DiagnosticCategory, message: String) {
        self.result.push(Diagnostic::error(category, message));
    }

    fn warning(&mut self, category: DiagnosticCategory, message: String) {
        self.result.push(Diagnostic::warning(category, message));
    }

    fn reference_error(
        &mut self,
        category: DiagnosticCategory,
        message: String,
        missing: &str,
        known: &[String],
    ) {
        self.result.push(
            Diagnostic::error(category, message).with_suggestion(suggestion_text(missing, known)),
        );
    }

    // --- Resource budgets --------------------------------------------------

    /// Three independent axes: hardware object slots, video-memory tiles,
    /// working-memory bytes. At the ceiling is a warning; beyond it is an
    /// error.
    fn check_resource_budgets(&mut self) {
        let oam = self.count_oam_slots();
        self.budget_axis("object slot", oam, limits::OAM_SLOT_WARN, limits::OAM_SLOT_LIMIT);

        let tiles = self.count_vram_tiles();
        self.budget_axis(
            "video-memory tile",
            tiles,
            limits::VRAM_TILE_WARN,
            limits::VRAM_TILE_LIMIT,
        );

        let wram = self.count_wram_bytes();
        self.budget_axis(
            "working-memory byte",
            wram,
            limits::WRAM_BYTE_WARN,
            limits::WRAM_BYTE_LIMIT,
        );
    }

    fn budget_axis(&mut self, unit: &str, used: usize, warn: usize, limit: usize) {
        log::debug!("validator: {} usage {} (warn {}, limit {})", unit, used, warn, limit);
        if used > limit {
            self.error(
                DiagnosticCategory::ResourceBudget,
                format!(
                    "{} budget exceeded: {} used, hardware limit is {}",
                    unit, used, limit
                ),
            );
        } else if used == limit {
            self.warning(
                DiagnosticCategory::ResourceBudget,
                format!("{} usage is at the hardware limit ({} of {})", unit, used, limit),
            );
        } else if used >= warn {
            self.warning(
                DiagnosticCategory::ResourceBudget,
                format!("{} usage is high: {} of {}", unit, used, limit),
            );
        }
    }

    /// One slot per entity that draws a sprite, plus every slot of a pool
    /// that carries sprite metadata. Logic-only pools cost nothing here.
    fn count_oam_slots(&self) -> usize {
        let entity_slots = self
            .model
            .entities
            .iter()
            .filter(|e| e.sprite.is_some())
            .count();
        let pool_slots: usize = self
            .model
            .pools
            .iter()
            .filter(|p| p.sprite.is_some())
            .map(|p| p.capacity)
            .sum();
        entity_slots + pool_slots
    }

    /// Tile area per sprite, times one base frame plus every animation frame.
    fn count_vram_tiles(&self) -> usize {
        self.model
            .sprites
            .iter()
            .map(|sprite| {
                let frames: usize = sprite
                    .animations
                    .iter()
                    .filter_map(|name| self.model.animation(name))
                    .map(|anim| anim.frames.len())
                    .sum();
                sprite.tile_area() * (1 + frames)
            })
            .sum()
    }

    fn count_wram_bytes(&self) -> usize {
        let globals: usize = self.model.variables.iter().map(|v| v.ty.bytes()).sum();
        let entities: usize = self
            .model
            .entities
            .iter()
            .map(|e| {
                let fields: usize = e.fields.iter().map(|f| f.ty.bytes()).sum();
                let position = match e.position {
                    crate::model::PositionBinding::Allocated => 2,
                    crate::model::PositionBinding::External { .. } => 0,
                };
                fields + position
            })
            .sum();
        let pools: usize = self.model.pools.iter().map(Pool::wram_bytes).sum();
        let nav: usize = self.model.nav_grids.iter().map(|g| g.cell_count()).sum();
        let save = self.save_buffer_size();
        let machines = self.model.state_machines.len();
        globals + entities + pools + nav + save + machines
    }

    fn save_buffer_size(&self) -> usize {
        match &self.model.save_layout {
            None => 0,
            Some(layout) => {
                let data: usize = layout
                    .variables
                    .iter()
                    .filter_map(|name| self.model.variable(name))
                    .map(|v| v.ty.bytes())
                    .sum();
                data + limits::SAVE_CHECKSUM_BYTES
            }
        }
    }

    // --- State machines ----------------------------------------------------

    fn check_state_machines(&mut self) {
        for machine in &self.model.state_machines {
            if machine.states.is_empty() {
                self.error(
                    DiagnosticCategory::StateMachine,
                    format!("state machine '{}' has no states", machine.name),
                );
                continue;
            }

            let state_names: Vec<String> =
                machine.states.iter().map(|s| s.name.clone()).collect();

            for state in &machine.states {
                for transition in &state.transitions {
                    if machine.state(&transition.target).is_none() {
                        let message = format!(
                            "state machine '{}': state '{}' transitions to undeclared state '{}'",
                            machine.name, state.name, transition.target
                        );
                        self.reference_error(
                            DiagnosticCategory::StateMachine,
                            message,
                            &transition.target,
                            &state_names,
                        );
                    }
                }
            }

            // Reachability from the implicit start state (first declared).
            let mut reachable: IndexSet<&str> = IndexSet::new();
            let mut work = vec![machine.states[0].name.as_str()];
            while let Some(name) = work.pop() {
                if !reachable.insert(name) {
                    continue;
                }
                if let Some(state) = machine.state(name) {
                    for transition in &state.transitions {
                        work.push(transition.target.as_str());
                    }
                }
            }
            for state in &machine.states {
                if !reachable.contains(state.name.as_str()) {
                    self.warning(
                        DiagnosticCategory::StateMachine,
                        format!(
                            "state machine '{}': state '{}' is unreachable from start state '{}'",
                            machine.name, state.name, machine.states[0].name
                        ),
                    );
                }
            }
        }
    }

    // --- Duplicate names ---------------------------------------------------

    fn check_duplicate_names(&mut self) {
        let model = self.model;
        self.duplicates("variable", model.variables.iter().map(|v| v.name.as_str()));
        self.duplicates("sprite", model.sprites.iter().map(|s| s.name.as_str()));
        self.duplicates("animation", model.animations.iter().map(|a| a.name.as_str()));
        self.duplicates("entity", model.entities.iter().map(|e| e.name.as_str()));
        self.duplicates("pool", model.pools.iter().map(|p| p.name.as_str()));
        self.duplicates("scene", model.scenes.iter().map(|s| s.name.as_str()));
        self.duplicates(
            "state machine",
            model.state_machines.iter().map(|m| m.name.as_str()),
        );
        self.duplicates("palette", model.palettes.iter().map(|p| p.name.as_str()));
        self.duplicates(
            "audio group",
            model.audio_groups.iter().map(|g| g.name.as_str()),
        );
        self.duplicates("nav grid", model.nav_grids.iter().map(|g| g.name.as_str()));

        // Per-entity and per-pool field namespaces are independent of the
        // globals and of each other.
        for entity in &model.entities {
            let label = format!("entity '{}' field", entity.name);
            self.duplicates(&label, entity.fields.iter().map(|f| f.name.as_str()));
        }
        for pool in &model.pools {
            let label = format!("pool '{}' field", pool.name);
            self.duplicates(&label, pool.state_fields.iter().map(|f| f.name.as_str()));
        }
        for machine in &model.state_machines {
            let label = format!("machine '{}' state", machine.name);
            self.duplicates(&label, machine.states.iter().map(|s| s.name.as_str()));
        }
    }

    fn duplicates<'n>(&mut self, namespace: &str, names: impl Iterator<Item = &'n str>) {
        let mut seen: IndexSet<&str> = IndexSet::new();
        let mut reported: IndexSet<&str> = IndexSet::new();
        for name in names {
            if !seen.insert(name) && reported.insert(name) {
                self.error(
                    DiagnosticCategory::DuplicateName,
                    format!("duplicate {} name '{}'", namespace, name),
                );
            }
        }
    }

    // --- Reference resolution ----------------------------------------------

    fn check_references(&mut self) {
        let scenes = self.model.scene_names();
        let sprites = self.model.sprite_names();
        let animations = self.model.animation_names();

        // Declaration-level references.
        for sprite in &self.model.sprites {
            for anim in &sprite.animations {
                if self.model.animation(anim).is_none() {
                    let message = format!(
                        "sprite '{}' references unknown animation '{}'",
                        sprite.name, anim
                    );
                    self.reference_error(
                        DiagnosticCategory::AnimationReference,
                        message,
                        anim,
                        &animations,
                    );
                }
            }
        }
        for entity in &self.model.entities {
            if let Some(sprite) = &entity.sprite {
                if self.model.sprite(sprite).is_none() {
                    let message = format!(
                        "entity '{}' references unknown sprite '{}'",
                        entity.name, sprite
                    );
                    self.reference_error(
                        DiagnosticCategory::SpriteReference,
                        message,
                        sprite,
                        &sprites,
                    );
                }
            }
        }
        for pool in &self.model.pools {
            if let Some(sprite) = &pool.sprite {
                if self.model.sprite(sprite).is_none() {
                    let message =
                        format!("pool '{}' references unknown sprite '{}'", pool.name, sprite);
                    self.reference_error(
                        DiagnosticCategory::SpriteReference,
                        message,
                        sprite,
                        &sprites,
                    );
                }
            }
            if let Some(anim) = &pool.animation {
                if self.model.animation(anim).is_none() {
                    let message = format!(
                        "pool '{}' references unknown animation '{}'",
                        pool.name, anim
                    );
                    self.reference_error(
                        DiagnosticCategory::AnimationReference,
                        message,
                        anim,
                        &animations,
                    );
                }
            }
        }
        for scene in &self.model.scenes {
            for entity in &scene.entities {
                if self.model.entity(entity).is_none() {
                    let known: Vec<String> =
                        self.model.entities.iter().map(|e| e.name.clone()).collect();
                    let message = format!(
                        "scene '{}' lists unknown entity '{}'",
                        scene.name, entity
                    );
                    self.reference_error(
                        DiagnosticCategory::SceneReference,
                        message,
                        entity,
                        &known,
                    );
                }
            }
            for pool in &scene.pools {
                if self.model.pool(pool).is_none() {
                    let known: Vec<String> =
                        self.model.pools.iter().map(|p| p.name.clone()).collect();
                    let message =
                        format!("scene '{}' lists unknown pool '{}'", scene.name, pool);
                    self.reference_error(
                        DiagnosticCategory::SceneReference,
                        message,
                        pool,
                        &known,
                    );
                }
            }
        }

        // Statement-level references, gathered first so the borrow on the
        // model ends before diagnostics are pushed.
        let mut found: Vec<(DiagnosticCategory, String, String, &[String])> = Vec::new();
        for (context, stmts) in self.model.statement_lists() {
            walk_stmts(stmts, &mut |stmt| match &stmt.kind {
                StmtKind::SceneGoto { scene } => {
                    if self.model.scene(scene).is_none() {
                        found.push((
                            DiagnosticCategory::SceneReference,
                            format!("{} jumps to unknown scene '{}'", context, scene),
                            scene.clone(),
                            &scenes,
                        ));
                    }
                }
                StmtKind::AnimPlay { sprite, animation } => {
                    if self.model.sprite(sprite).is_none() {
                        found.push((
                            DiagnosticCategory::SpriteReference,
                            format!("{} plays animation on unknown sprite '{}'", context, sprite),
                            sprite.clone(),
                            &sprites,
                        ));
                    }
                    if self.model.animation(animation).is_none() {
                        found.push((
                            DiagnosticCategory::AnimationReference,
                            format!("{} plays unknown animation '{}'", context, animation),
                            animation.clone(),
                            &animations,
                        ));
                    }
                }
                StmtKind::AnimStop { sprite } => {
                    if self.model.sprite(sprite).is_none() {
                        found.push((
                            DiagnosticCategory::SpriteReference,
                            format!("{} stops animation on unknown sprite '{}'", context, sprite),
                            sprite.clone(),
                            &sprites,
                        ));
                    }
                }
                _ => {}
            });
        }
        for (category, message, missing, known) in found {
            self.reference_error(category, message, &missing, known);
        }
    }

    // --- Array bounds ------------------------------------------------------

    /// Indexed reads/writes name a pool field as `<pool>.<field>`. A literal
    /// index must stay below the pool's capacity. Despawn conditions and
    /// transition conditions are indexed reads too, so both walks cover
    /// `free_expressions` alongside `statement_lists`.
    fn check_array_bounds(&mut self) {
        let mut found: Vec<Diagnostic> = Vec::new();
        {
            let mut check_access = |context: &str, array: &str, literal_index: Option<i32>| {
                let Some((pool_name, field)) = array.split_once('.') else {
                    found.push(Diagnostic::error(
                        DiagnosticCategory::ArrayBounds,
                        format!(
                            "{} indexes '{}', which is not a '<pool>.<field>' array",
                            context, array
                        ),
                    ));
                    return;
                };
                let Some(pool) = self.model.pool(pool_name) else {
                    found.push(Diagnostic::error(
                        DiagnosticCategory::ArrayBounds,
                        format!("{} indexes array of unknown pool '{}'", context, pool_name),
                    ));
                    return;
                };
                if pool.field(field).is_none() {
                    found.push(Diagnostic::error(
                        DiagnosticCategory::ArrayBounds,
                        format!(
                            "{} indexes unknown field '{}' of pool '{}'",
                            context, field, pool_name
                        ),
                    ));
                    return;
                }
                if let Some(index) = literal_index {
                    if index < 0 || index as usize >= pool.capacity {
                        found.push(Diagnostic::error(
                            DiagnosticCategory::ArrayBounds,
                            format!(
                                "{} indexes '{}' at {}, outside capacity {}",
                                context, array, index, pool.capacity
                            ),
                        ));
                    }
                }
            };

            for (context, stmts) in self.model.statement_lists() {
                walk_exprs(stmts, &mut |expr| {
                    if let ExprKind::Index { array, index, .. } = &expr.kind {
                        check_access(&context, array, index.as_literal().map(|(v, _)| v));
                    }
                });
                walk_stmts(stmts, &mut |stmt| {
                    let target = match &stmt.kind {
                        StmtKind::Assign { target, .. } => Some(target),
                        StmtKind::TweenStart { target, .. } => Some(target),
                        _ => None,
                    };
                    if let Some(AssignTarget::Index { array, index }) = target {
                        check_access(&context, array, index.as_literal().map(|(v, _)| v));
                    }
                });
            }
            for (context, condition) in self.model.free_expressions() {
                walk_expr(condition, &mut |expr| {
                    if let ExprKind::Index { array, index, .. } = &expr.kind {
                        check_access(&context, array, index.as_literal().map(|(v, _)| v));
                    }
                });
            }
        }
        for diagnostic in found {
            self.result.push(diagnostic);
        }
    }

    // --- Range checks ------------------------------------------------------

    fn check_tween_ranges(&mut self) {
        const LONG_TWEEN_FRAMES: u32 = 600;

        let mut found: Vec<Diagnostic> = Vec::new();
        for (context, stmts) in self.model.statement_lists() {
            walk_stmts(stmts, &mut |stmt| {
                let StmtKind::TweenStart {
                    target,
                    to,
                    duration_frames,
                    ..
                } = &stmt.kind
                else {
                    return;
                };

                if *duration_frames == 0 {
                    found.push(Diagnostic::error(
                        DiagnosticCategory::TweenRange,
                        format!("{} starts a tween with zero duration", context),
                    ));
                } else if *duration_frames > LONG_TWEEN_FRAMES {
                    found.push(Diagnostic::warning(
                        DiagnosticCategory::TweenRange,
                        format!(
                            "{} starts an unusually long tween ({} frames)",
                            context, duration_frames
                        ),
                    ));
                }

                if let Some(symbol) = self.tween_target_symbol(target) {
                    if *to < symbol.ty.min_value() || *to > symbol.ty.max_value() {
                        found.push(Diagnostic::error(
                            DiagnosticCategory::TweenRange,
                            format!(
                                "{} tweens '{}' to {}, outside its {} range {}..={}",
                                context,
                                symbol.name,
                                to,
                                symbol.ty,
                                symbol.ty.min_value(),
                                symbol.ty.max_value()
                            ),
                        ));
                    }
                }
            });
        }
        for diagnostic in found {
            self.result.push(diagnostic);
        }
    }

    fn tween_target_symbol(&self, target: &AssignTarget) -> Option<&Symbol> {
        match target {
            AssignTarget::Var(name) => self.model.variable(name),
            AssignTarget::Index { array, .. } => {
                let (pool_name, field) = array.split_once('.')?;
                self.model.pool(pool_name)?.field(field)
            }
        }
    }

    fn check_physics_ranges(&mut self) {
        const GRAVITY_SANE_ABS: i32 = 64;

        for entity in &self.model.entities {
            let Some(physics) = &entity.physics else {
                continue;
            };
            if physics.mass <= 0 {
                self.error(
                    DiagnosticCategory::PhysicsRange,
                    format!(
                        "entity '{}' has non-positive mass {}",
                        entity.name, physics.mass
                    ),
                );
            }
            if physics.gravity.abs() > GRAVITY_SANE_ABS {
                self.warning(
                    DiagnosticCategory::PhysicsRange,
                    format!(
                        "entity '{}' has extreme gravity {} (sane range is -{}..={})",
                        entity.name, physics.gravity, GRAVITY_SANE_ABS, GRAVITY_SANE_ABS
                    ),
                );
            }
            if physics.friction < 0 || physics.friction > 255 {
                self.warning(
                    DiagnosticCategory::PhysicsRange,
                    format!(
                        "entity '{}' has friction {} outside 0..=255",
                        entity.name, physics.friction
                    ),
                );
            }
        }
    }

    // --- Palettes ----------------------------------------------------------

    fn check_palettes(&mut self) {
        for kind in [PaletteKind::Background, PaletteKind::Sprite] {
            let of_kind: Vec<_> = self
                .model
                .palettes
                .iter()
                .filter(|p| p.kind == kind)
                .collect();
            if of_kind.len() > limits::PALETTES_PER_KIND {
                self.error(
                    DiagnosticCategory::PaletteLimit,
                    format!(
                        "{} {} palettes declared, hardware has {} slots",
                        of_kind.len(),
                        kind.label(),
                        limits::PALETTES_PER_KIND
                    ),
                );
            }

            let mut claimed: Vec<(usize, &str)> = Vec::new();
            for palette in &of_kind {
                if let Some(slot) = palette.slot {
                    if slot >= limits::PALETTES_PER_KIND {
                        self.error(
                            DiagnosticCategory::PaletteLimit,
                            format!(
                                "palette '{}' claims slot {}, valid {} slots are 0..={}",
                                palette.name,
                                slot,
                                kind.label(),
                                limits::PALETTES_PER_KIND - 1
                            ),
                        );
                    } else if let Some((_, owner)) =
                        claimed.iter().find(|(s, _)| *s == slot)
                    {
                        self.error(
                            DiagnosticCategory::PaletteLimit,
                            format!(
                                "palette '{}' claims {} slot {}, already claimed by '{}'",
                                palette.name,
                                kind.label(),
                                slot,
                                owner
                            ),
                        );
                    } else {
                        claimed.push((slot, palette.name.as_str()));
                    }
                }
            }
        }

        for palette in &self.model.palettes {
            if palette.colors.len() > limits::COLORS_PER_PALETTE {
                self.error(
                    DiagnosticCategory::PaletteLimit,
                    format!(
                        "palette '{}' has {} colors, hardware allows {} plus the backdrop",
                        palette.name,
                        palette.colors.len(),
                        limits::COLORS_PER_PALETTE
                    ),
                );
            }
        }

        // Sprite -> palette references live here: they are capacity
        // concerns, not scene/sprite graph concerns.
        let palette_names: Vec<String> =
            self.model.palettes.iter().map(|p| p.name.clone()).collect();
        for sprite in &self.model.sprites {
            if let Some(palette) = &sprite.palette {
                if !palette_names.contains(palette) {
                    let message = format!(
                        "sprite '{}' references unknown palette '{}'",
                        sprite.name, palette
                    );
                    self.reference_error(
                        DiagnosticCategory::PaletteLimit,
                        message,
                        palette,
                        &palette_names,
                    );
                }
            }
        }
    }

    // --- Assets ------------------------------------------------------------

    fn check_assets(&mut self) {
        let mut found: Vec<Diagnostic> = Vec::new();
        for sprite in &self.model.sprites {
            let Some(asset) = &sprite.asset else {
                continue;
            };
            if !asset.valid {
                for reason in &asset.errors {
                    found.push(Diagnostic::error(
                        DiagnosticCategory::AssetFormat,
                        format!("sprite '{}' asset rejected: {}", sprite.name, reason),
                    ));
                }
            } else if asset.width != sprite.width || asset.height != sprite.height {
                found.push(Diagnostic::warning(
                    DiagnosticCategory::AssetFormat,
                    format!(
                        "sprite '{}' is declared {}x{} but its asset is {}x{}",
                        sprite.name, sprite.width, sprite.height, asset.width, asset.height
                    ),
                ));
            }
        }
        for diagnostic in found {
            self.result.push(diagnostic);
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;

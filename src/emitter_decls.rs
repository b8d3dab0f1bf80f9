/// emitter_decls.rs
/// Header, constants, variable declarations and lookup tables.
use crate::emitter::{constant, identifier, Emitter};
use crate::error::CompilerError;
use crate::limits;
use crate::model::{PaletteKind, PositionBinding};

impl Emitter<'_> {
    pub(crate) fn write_header(&mut self) {
        self.line(&format!(
            "// {} - generated by retroforge (vc8-script dialect {})",
            self.model.name,
            crate::emitter::DIALECT_VERSION
        ));
        self.line("// do not edit; regenerate from the game model");
        self.blank();
    }

    pub(crate) fn write_constants(&mut self) -> Result<(), CompilerError> {
        for (n, scene) in self.model.scenes.iter().enumerate() {
            self.line(&format!("const SCENE_{} = {};", constant(&scene.name), n));
        }
        for (n, sprite) in self.model.sprites.iter().enumerate() {
            self.line(&format!("const SPR_{} = {};", constant(&sprite.name), n));
        }
        for (n, anim) in self.model.animations.iter().enumerate() {
            self.line(&format!("const ANIM_{} = {};", constant(&anim.name), n));
        }
        for (n, pool) in self.model.pools.iter().enumerate() {
            self.line(&format!("const POOL_{} = {};", constant(&pool.name), n));
            self.line(&format!(
                "const {}_CAP = {};",
                constant(&pool.name),
                pool.capacity
            ));
        }
        for machine in &self.model.state_machines {
            for (n, state) in machine.states.iter().enumerate() {
                self.line(&format!(
                    "const FSM_{}_{} = {};",
                    constant(&machine.name),
                    constant(&state.name),
                    n
                ));
            }
        }

        if self.uses_tweens {
            self.line("const EASE_LINEAR = 0;");
            self.line("const EASE_IN = 1;");
            self.line("const EASE_OUT = 2;");
            self.line("const EASE_IN_OUT = 3;");
        }

        for (n, entity) in self.model.entities.iter().enumerate() {
            if let Some(physics) = &entity.physics {
                let prefix = format!("E{}_{}", n, constant(&entity.name));
                self.line(&format!("const {}_GRAVITY = {};", prefix, physics.gravity));
                self.line(&format!("const {}_FRICTION = {};", prefix, physics.friction));
                self.line(&format!("const {}_MASS = {};", prefix, physics.mass));
            }
        }

        if let Some(layout) = &self.model.save_layout {
            let mut offset = 0usize;
            for name in &layout.variables {
                let symbol = self
                    .model
                    .variable(name)
                    .ok_or_else(|| CompilerError::UnknownVariable(name.clone()))?;
                self.line(&format!("const SAVE_OFF_{} = {};", constant(name), offset));
                offset += symbol.ty.bytes();
            }
            self.line(&format!(
                "const SAVE_SIZE = {};",
                offset + limits::SAVE_CHECKSUM_BYTES
            ));
        }

        for group in &self.model.audio_groups {
            self.line(&format!(
                "const AUDIO_{}_MASK = {};",
                constant(&group.name),
                group.channel_mask()
            ));
            self.line(&format!(
                "const AUDIO_{}_VOL = {};",
                constant(&group.name),
                group.volume
            ));
        }

        for grid in &self.model.nav_grids {
            self.line(&format!(
                "const NAV_{}_W = {};",
                constant(&grid.name),
                grid.width
            ));
            self.line(&format!(
                "const NAV_{}_H = {};",
                constant(&grid.name),
                grid.height
            ));
        }

        self.blank();
        Ok(())
    }

    pub(crate) fn write_declarations(&mut self) {
        if !self.model.scenes.is_empty() {
            self.line("byte current_scene = 0;");
        }

        for variable in &self.model.variables {
            self.line(&format!(
                "{} {} = {};",
                variable.ty.keyword(),
                identifier(&variable.name),
                variable.default.unwrap_or(0)
            ));
        }

        // One stable ordinal-derived prefix per entity. Externally bound
        // positions reuse the bound variables; no shadow storage.
        for (n, entity) in self.model.entities.iter().enumerate() {
            let prefix = self.entity_prefix(n, entity);
            if let PositionBinding::Allocated = entity.position {
                self.line(&format!("byte {}_x = 0;", prefix));
                self.line(&format!("byte {}_y = 0;", prefix));
            }
            for field in &entity.fields {
                self.line(&format!(
                    "{} {}_{} = {};",
                    field.ty.keyword(),
                    prefix,
                    identifier(&field.name),
                    field.default.unwrap_or(0)
                ));
            }
        }

        // Input sources: one current-value byte each, refreshed by the
        // runtime; one previous-frame snapshot only where an edge condition
        // needs it.
        let sources = self.input_sources.clone();
        for source in &sources {
            self.line(&format!("byte pad_{} = 0;", identifier(source)));
        }
        let edges = self.edge_sources.clone();
        for source in &edges {
            self.line(&format!("byte prev_pad_{} = 0;", identifier(source)));
        }

        for machine in &self.model.state_machines {
            if machine.states.is_empty() {
                continue;
            }
            self.line(&format!(
                "byte fsm_{}_state = FSM_{}_{};",
                identifier(&machine.name),
                constant(&machine.name),
                constant(&machine.states[0].name)
            ));
        }

        // Pool state: one fixed-size array per field, sized by the capacity
        // constant and indexed by the shared loop variable.
        for pool in &self.model.pools {
            for field in &pool.state_fields {
                self.line(&format!(
                    "{} pool_{}_{}[{}_CAP];",
                    field.ty.keyword(),
                    identifier(&pool.name),
                    identifier(&field.name),
                    constant(&pool.name)
                ));
            }
        }

        for grid in &self.model.nav_grids {
            self.line(&format!(
                "byte nav_{}[NAV_{}_W * NAV_{}_H];",
                identifier(&grid.name),
                constant(&grid.name),
                constant(&grid.name)
            ));
        }

        self.blank();
    }

    pub(crate) fn write_tables(&mut self) {
        // Zero-length arrays are illegal in the dialect; an empty animation
        // degrades to a single placeholder frame.
        for anim in &self.model.animations {
            let frames: Vec<String> = if anim.frames.is_empty() {
                vec!["0".to_string()]
            } else {
                anim.frames.iter().map(|f| f.to_string()).collect()
            };
            self.line(&format!(
                "table anim_{}_frames = {{ {} }};",
                identifier(&anim.name),
                frames.join(", ")
            ));
            self.line(&format!(
                "const ANIM_{}_LEN = {};",
                constant(&anim.name),
                frames.len()
            ));
            self.line(&format!(
                "const ANIM_{}_STEP = {};",
                constant(&anim.name),
                anim.frame_duration
            ));
        }

        for kind in [PaletteKind::Background, PaletteKind::Sprite] {
            let mut taken: Vec<usize> = Vec::new();
            for palette in self.model.palettes.iter().filter(|p| p.kind == kind) {
                let slot = palette.slot.unwrap_or_else(|| {
                    (0..).find(|candidate| !taken.contains(candidate)).unwrap()
                });
                taken.push(slot);
                let colors: Vec<String> =
                    palette.colors.iter().map(|c| c.to_string()).collect();
                self.line(&format!(
                    "table pal_{} = {{ {} }};",
                    identifier(&palette.name),
                    colors.join(", ")
                ));
                self.line(&format!(
                    "const PAL_{}_SLOT = {};",
                    constant(&palette.name),
                    slot
                ));
            }
        }

        self.blank();
    }
}

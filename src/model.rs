// Game Model
//
// The validated, immutable description of a game as handed over by the
// authoring layer. The pipeline never mutates a Model it was given; the
// optimizer produces a rewritten copy for the emitter.
//
// Construction contracts (capacity > 0, non-empty channel sets, volume in
// range) panic immediately: violating them is an authoring-layer bug, not a
// user-correctable model deficiency. Everything else - duplicate names,
// dangling references, budget overruns - is the validator's job and surfaces
// as diagnostics.

use crate::asset::AssetCheck;
use crate::ir::{Expr, NumType, Stmt};
use crate::limits;

/// A named storage location with a fixed primitive type.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub ty: NumType,
    pub default: Option<i32>,
}

impl Symbol {
    pub fn new(name: &str, ty: NumType) -> Symbol {
        Symbol {
            name: name.to_string(),
            ty,
            default: None,
        }
    }

    pub fn with_default(mut self, value: i32) -> Symbol {
        self.default = Some(value);
        self
    }
}

/// A drawable sprite and its animation set references.
#[derive(Debug, Clone)]
pub struct Sprite {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub palette: Option<String>,
    pub animations: Vec<String>,
    /// Structural result from the asset collaborator, if the sprite is
    /// backed by a raster file.
    pub asset: Option<AssetCheck>,
}

impl Sprite {
    pub fn new(name: &str, width: u32, height: u32) -> Sprite {
        Sprite {
            name: name.to_string(),
            width,
            height,
            palette: None,
            animations: Vec::new(),
            asset: None,
        }
    }

    pub fn with_palette(mut self, palette: &str) -> Sprite {
        self.palette = Some(palette.to_string());
        self
    }

    pub fn with_animations(mut self, animations: &[&str]) -> Sprite {
        self.animations = animations.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_asset(mut self, asset: AssetCheck) -> Sprite {
        self.asset = Some(asset);
        self
    }

    /// Footprint in 8x8 tiles (partial tiles round up).
    pub fn tile_area(&self) -> usize {
        let tw = self.width.div_ceil(limits::TILE_SIZE) as usize;
        let th = self.height.div_ceil(limits::TILE_SIZE) as usize;
        tw * th
    }
}

/// Frame sequence played on a sprite.
#[derive(Debug, Clone)]
pub struct Animation {
    pub name: String,
    pub frames: Vec<u8>,
    /// Display frames each animation frame is held for.
    pub frame_duration: u32,
    pub looping: bool,
}

impl Animation {
    pub fn new(name: &str, frames: Vec<u8>) -> Animation {
        Animation {
            name: name.to_string(),
            frames,
            frame_duration: 1,
            looping: true,
        }
    }

    pub fn with_duration(mut self, frame_duration: u32) -> Animation {
        self.frame_duration = frame_duration;
        self
    }

    pub fn one_shot(mut self) -> Animation {
        self.looping = false;
        self
    }
}

/// Where an entity's position lives.
#[derive(Debug, Clone, PartialEq)]
pub enum PositionBinding {
    /// The emitter allocates two scalars (x, y) for this entity.
    Allocated,
    /// Position is read/written through externally owned variables;
    /// no shadow storage is allocated.
    External { x: String, y: String },
}

/// Tunables for the fixed-point physics helpers.
#[derive(Debug, Clone)]
pub struct Physics {
    pub gravity: i32,
    pub friction: i32,
    pub mass: i32,
}

/// A singular named game object (player, boss, HUD cursor).
#[derive(Debug, Clone)]
pub struct Entity {
    pub name: String,
    pub sprite: Option<String>,
    pub position: PositionBinding,
    pub fields: Vec<Symbol>,
    pub physics: Option<Physics>,
    pub on_frame: Vec<Stmt>,
}

impl Entity {
    pub fn new(name: &str) -> Entity {
        Entity {
            name: name.to_string(),
            sprite: None,
            position: PositionBinding::Allocated,
            fields: Vec::new(),
            physics: None,
            on_frame: Vec::new(),
        }
    }

    pub fn with_sprite(mut self, sprite: &str) -> Entity {
        self.sprite = Some(sprite.to_string());
        self
    }

    pub fn with_external_position(mut self, x: &str, y: &str) -> Entity {
        self.position = PositionBinding::External {
            x: x.to_string(),
            y: y.to_string(),
        };
        self
    }

    pub fn with_field(mut self, field: Symbol) -> Entity {
        self.fields.push(field);
        self
    }

    pub fn with_physics(mut self, physics: Physics) -> Entity {
        self.physics = Some(physics);
        self
    }

    pub fn with_on_frame(mut self, stmts: Vec<Stmt>) -> Entity {
        self.on_frame = stmts;
        self
    }
}

/// A fixed-capacity homogeneous collection. Instances are addressed by one
/// shared loop index at emission time, never by individual names.
#[derive(Debug, Clone)]
pub struct Pool {
    pub name: String,
    pub capacity: usize,
    /// State fields; index 0 is always the implicit `active` flag.
    pub state_fields: Vec<Symbol>,
    pub sprite: Option<String>,
    pub animation: Option<String>,
    pub on_spawn: Vec<Stmt>,
    pub on_frame: Vec<Stmt>,
    pub on_despawn: Vec<Stmt>,
    pub despawn_when: Option<Expr>,
}

impl Pool {
    /// Contract: capacity must be positive.
    pub fn new(name: &str, capacity: usize) -> Pool {
        assert!(capacity > 0, "pool '{}' must have capacity > 0", name);
        Pool {
            name: name.to_string(),
            capacity,
            state_fields: vec![Symbol::new("active", NumType::U8)],
            sprite: None,
            animation: None,
            on_spawn: Vec::new(),
            on_frame: Vec::new(),
            on_despawn: Vec::new(),
            despawn_when: None,
        }
    }

    pub fn with_field(mut self, field: Symbol) -> Pool {
        self.state_fields.push(field);
        self
    }

    pub fn with_sprite(mut self, sprite: &str) -> Pool {
        self.sprite = Some(sprite.to_string());
        self
    }

    pub fn with_animation(mut self, animation: &str) -> Pool {
        self.animation = Some(animation.to_string());
        self
    }

    pub fn with_on_spawn(mut self, stmts: Vec<Stmt>) -> Pool {
        self.on_spawn = stmts;
        self
    }

    pub fn with_on_frame(mut self, stmts: Vec<Stmt>) -> Pool {
        self.on_frame = stmts;
        self
    }

    pub fn with_on_despawn(mut self, stmts: Vec<Stmt>) -> Pool {
        self.on_despawn = stmts;
        self
    }

    pub fn with_despawn_when(mut self, condition: Expr) -> Pool {
        self.despawn_when = Some(condition);
        self
    }

    pub fn field(&self, name: &str) -> Option<&Symbol> {
        self.state_fields.iter().find(|f| f.name == name)
    }

    /// Working-memory bytes this pool occupies.
    pub fn wram_bytes(&self) -> usize {
        let per_instance: usize = self.state_fields.iter().map(|f| f.ty.bytes()).sum();
        self.capacity * (per_instance + limits::POOL_INSTANCE_OVERHEAD)
    }
}

/// A screen of the game: membership plus lifecycle statement lists.
#[derive(Debug, Clone)]
pub struct Scene {
    pub name: String,
    pub entities: Vec<String>,
    pub pools: Vec<String>,
    pub on_enter: Vec<Stmt>,
    pub on_frame: Vec<Stmt>,
}

impl Scene {
    pub fn new(name: &str) -> Scene {
        Scene {
            name: name.to_string(),
            entities: Vec::new(),
            pools: Vec::new(),
            on_enter: Vec::new(),
            on_frame: Vec::new(),
        }
    }

    pub fn with_entities(mut self, names: &[&str]) -> Scene {
        self.entities = names.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_pools(mut self, names: &[&str]) -> Scene {
        self.pools = names.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_on_enter(mut self, stmts: Vec<Stmt>) -> Scene {
        self.on_enter = stmts;
        self
    }

    pub fn with_on_frame(mut self, stmts: Vec<Stmt>) -> Scene {
        self.on_frame = stmts;
        self
    }
}

/// Transition edge out of a state.
#[derive(Debug, Clone)]
pub struct Transition {
    pub condition: Expr,
    pub target: String,
}

/// Named node of a state machine.
#[derive(Debug, Clone)]
pub struct State {
    pub name: String,
    pub on_enter: Vec<Stmt>,
    pub on_exit: Vec<Stmt>,
    pub transitions: Vec<Transition>,
}

impl State {
    pub fn new(name: &str) -> State {
        State {
            name: name.to_string(),
            on_enter: Vec::new(),
            on_exit: Vec::new(),
            transitions: Vec::new(),
        }
    }

    pub fn with_on_enter(mut self, stmts: Vec<Stmt>) -> State {
        self.on_enter = stmts;
        self
    }

    pub fn with_on_exit(mut self, stmts: Vec<Stmt>) -> State {
        self.on_exit = stmts;
        self
    }

    pub fn with_transition(mut self, condition: Expr, target: &str) -> State {
        self.transitions.push(Transition {
            condition,
            target: target.to_string(),
        });
        self
    }
}

/// Named state graph. The first declared state is the start state.
/// Edge validity and reachability are validator checks, not construction
/// contracts.
#[derive(Debug, Clone)]
pub struct StateMachine {
    pub name: String,
    pub states: Vec<State>,
}

impl StateMachine {
    pub fn new(name: &str, states: Vec<State>) -> StateMachine {
        StateMachine {
            name: name.to_string(),
            states,
        }
    }

    pub fn state(&self, name: &str) -> Option<&State> {
        self.states.iter().find(|s| s.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteKind {
    Background,
    Sprite,
}

impl PaletteKind {
    pub fn label(&self) -> &'static str {
        match self {
            PaletteKind::Background => "background",
            PaletteKind::Sprite => "sprite",
        }
    }
}

/// Hardware palette: up to three colors plus the shared backdrop.
#[derive(Debug, Clone)]
pub struct Palette {
    pub name: String,
    pub kind: PaletteKind,
    /// Explicit hardware slot, or None to take the next free one.
    pub slot: Option<usize>,
    pub colors: Vec<u8>,
}

impl Palette {
    pub fn new(name: &str, kind: PaletteKind, colors: Vec<u8>) -> Palette {
        Palette {
            name: name.to_string(),
            kind,
            slot: None,
            colors,
        }
    }

    pub fn with_slot(mut self, slot: usize) -> Palette {
        self.slot = Some(slot);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioChannel {
    Pulse1,
    Pulse2,
    Triangle,
    Noise,
}

impl AudioChannel {
    /// Bit position in the runtime channel mask.
    pub fn bit(&self) -> u8 {
        match self {
            AudioChannel::Pulse1 => 0,
            AudioChannel::Pulse2 => 1,
            AudioChannel::Triangle => 2,
            AudioChannel::Noise => 3,
        }
    }
}

/// Mixer group claiming a set of hardware channels.
#[derive(Debug, Clone)]
pub struct AudioGroup {
    pub name: String,
    pub channels: Vec<AudioChannel>,
    pub volume: u8,
}

impl AudioGroup {
    /// Contract: at least one channel, at most the hardware set, volume in
    /// range.
    pub fn new(name: &str, channels: Vec<AudioChannel>, volume: u8) -> AudioGroup {
        assert!(
            !channels.is_empty(),
            "audio group '{}' must claim at least one channel",
            name
        );
        assert!(
            channels.len() <= limits::AUDIO_CHANNEL_LIMIT,
            "audio group '{}' claims more than {} channels",
            name,
            limits::AUDIO_CHANNEL_LIMIT
        );
        assert!(
            volume <= limits::AUDIO_VOLUME_MAX,
            "audio group '{}' volume {} out of range 0..={}",
            name,
            volume,
            limits::AUDIO_VOLUME_MAX
        );
        AudioGroup {
            name: name.to_string(),
            channels,
            volume,
        }
    }

    pub fn channel_mask(&self) -> u8 {
        self.channels.iter().fold(0, |mask, ch| mask | (1 << ch.bit()))
    }
}

/// Walkability grid for pathfinding; one working-memory byte per cell.
#[derive(Debug, Clone)]
pub struct NavGrid {
    pub name: String,
    pub width: usize,
    pub height: usize,
}

impl NavGrid {
    pub fn new(name: &str, width: usize, height: usize) -> NavGrid {
        assert!(
            width > 0 && height > 0,
            "nav grid '{}' must have positive dimensions",
            name
        );
        NavGrid {
            name: name.to_string(),
            width,
            height,
        }
    }

    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }
}

/// Ordered list of persisted variables. Offsets are assigned in declaration
/// order; a checksum trails the buffer.
#[derive(Debug, Clone)]
pub struct SaveLayout {
    pub variables: Vec<String>,
}

impl SaveLayout {
    pub fn new(variables: &[&str]) -> SaveLayout {
        SaveLayout {
            variables: variables.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// The whole authored game. Built once, then read-only.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub name: String,
    pub variables: Vec<Symbol>,
    pub sprites: Vec<Sprite>,
    pub animations: Vec<Animation>,
    pub entities: Vec<Entity>,
    pub pools: Vec<Pool>,
    pub scenes: Vec<Scene>,
    pub state_machines: Vec<StateMachine>,
    pub palettes: Vec<Palette>,
    pub audio_groups: Vec<AudioGroup>,
    pub nav_grids: Vec<NavGrid>,
    pub save_layout: Option<SaveLayout>,
}

impl Model {
    pub fn new(name: &str) -> Model {
        Model {
            name: name.to_string(),
            ..Model::default()
        }
    }

    pub fn variable(&self, name: &str) -> Option<&Symbol> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn sprite(&self, name: &str) -> Option<&Sprite> {
        self.sprites.iter().find(|s| s.name == name)
    }

    pub fn animation(&self, name: &str) -> Option<&Animation> {
        self.animations.iter().find(|a| a.name == name)
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    pub fn pool(&self, name: &str) -> Option<&Pool> {
        self.pools.iter().find(|p| p.name == name)
    }

    pub fn scene(&self, name: &str) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.name == name)
    }

    pub fn sprite_names(&self) -> Vec<String> {
        self.sprites.iter().map(|s| s.name.clone()).collect()
    }

    pub fn animation_names(&self) -> Vec<String> {
        self.animations.iter().map(|a| a.name.clone()).collect()
    }

    pub fn scene_names(&self) -> Vec<String> {
        self.scenes.iter().map(|s| s.name.clone()).collect()
    }

    /// All statement lists in the model, paired with a stable label used in
    /// logs and internal errors. Order is declaration order so every
    /// consumer scans the model identically.
    pub fn statement_lists(&self) -> Vec<(String, &Vec<Stmt>)> {
        let mut lists = Vec::new();
        for entity in &self.entities {
            lists.push((format!("entity '{}' on_frame", entity.name), &entity.on_frame));
        }
        for pool in &self.pools {
            lists.push((format!("pool '{}' on_spawn", pool.name), &pool.on_spawn));
            lists.push((format!("pool '{}' on_frame", pool.name), &pool.on_frame));
            lists.push((format!("pool '{}' on_despawn", pool.name), &pool.on_despawn));
        }
        for scene in &self.scenes {
            lists.push((format!("scene '{}' on_enter", scene.name), &scene.on_enter));
            lists.push((format!("scene '{}' on_frame", scene.name), &scene.on_frame));
        }
        for machine in &self.state_machines {
            for state in &machine.states {
                lists.push((
                    format!("machine '{}' state '{}' on_enter", machine.name, state.name),
                    &state.on_enter,
                ));
                lists.push((
                    format!("machine '{}' state '{}' on_exit", machine.name, state.name),
                    &state.on_exit,
                ));
            }
        }
        lists
    }

    /// Expressions that live outside any statement list: pool despawn
    /// conditions and state-machine transition conditions. Labeled the same
    /// way as `statement_lists` so expression-level checks cover both.
    pub fn free_expressions(&self) -> Vec<(String, &Expr)> {
        let mut exprs = Vec::new();
        for pool in &self.pools {
            if let Some(condition) = &pool.despawn_when {
                exprs.push((format!("pool '{}' despawn_when", pool.name), condition));
            }
        }
        for machine in &self.state_machines {
            for state in &machine.states {
                for transition in &state.transitions {
                    exprs.push((
                        format!(
                            "machine '{}' state '{}' transition to '{}'",
                            machine.name, state.name, transition.target
                        ),
                        &transition.condition,
                    ));
                }
            }
        }
        exprs
    }
}

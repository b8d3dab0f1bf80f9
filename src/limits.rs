// VC-8 hardware profile
//
// Fixed budgets for the target console. The validator accounts against these
// before any text is emitted; the emitter assumes a model that fits them.

/// Hard ceiling on object-attribute-memory slots (hardware sprite entries).
pub const OAM_SLOT_LIMIT: usize = 64;
/// High-water mark at which OAM usage draws a warning.
pub const OAM_SLOT_WARN: usize = 48;

/// Working memory available to generated code, in bytes.
pub const WRAM_BYTE_LIMIT: usize = 2048;
pub const WRAM_BYTE_WARN: usize = 1536;

/// Tile entries in the video memory bank.
pub const VRAM_TILE_LIMIT: usize = 256;
pub const VRAM_TILE_WARN: usize = 224;

/// Palettes per kind (background and sprite each get this many slots).
pub const PALETTES_PER_KIND: usize = 4;
/// Colors per palette, not counting the shared backdrop.
pub const COLORS_PER_PALETTE: usize = 3;

/// Tiles are square; sprite and asset dimensions must be multiples of this.
pub const TILE_SIZE: u32 = 8;
/// Largest raster asset dimension the mapper can address.
pub const MAX_ASSET_DIM: u32 = 256;

/// Fixed per-instance bookkeeping the runtime keeps for every pool slot.
pub const POOL_INSTANCE_OVERHEAD: usize = 1;

/// Sound channels a mixer group may claim.
pub const AUDIO_CHANNEL_LIMIT: usize = 4;
/// Mixer volume range is 0..=AUDIO_VOLUME_MAX.
pub const AUDIO_VOLUME_MAX: u8 = 15;

/// Checksum bytes appended to the save buffer.
pub const SAVE_CHECKSUM_BYTES: usize = 2;

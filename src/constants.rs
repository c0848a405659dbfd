//! Simulation constants shared across systems.
//!
//! Tunable behaviour weights live in the configuration store (see
//! [`crate::config`]); the values here are structural and do not change at
//! runtime.

/// Nominal duration of one fixed simulation tick in seconds (60 Hz).
pub const REFERENCE_DT: f32 = 1.0 / 60.0;

/// Vectors shorter than this are treated as having no direction.
///
/// Two agents sharing a coordinate would otherwise normalise to `NaN`.
pub const NORMALISE_EPSILON: f32 = 1e-6;

/// Factor applied to the loss-risk threshold while risk is already signalled.
pub const HYSTERESIS_FACTOR: f32 = 2.0;

/// Camera zoom used while nothing is endangered.
pub const DEFAULT_ZOOM: f32 = 1.0;

/// Global time scale used while nothing is endangered.
pub const DEFAULT_TIME_SCALE: f32 = 1.0;

/// Distance, in tiles, between a level edge and the entry point on the far side.
pub const ENTRY_INSET_TILES: f32 = 2.0;

/// Distance, in tiles, the player slides during a cross-scene push.
pub const TRANSITION_SLIDE_TILES: f32 = 3.25;

/// Default tile width in world units.
pub const TILE_WIDTH: f32 = 32.0;

/// Default tile height in world units.
pub const TILE_HEIGHT: f32 = 32.0;

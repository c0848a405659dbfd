//! The active level aggregate.
//!
//! A [`Level`] owns everything the per-tick step functions read or write:
//! the tile grid, the player, the follower and enemy pools, and the exits to
//! neighbouring levels. Exactly one level is active at a time and it is
//! replaced wholesale on a transition.
//!
//! Levels are authored as rows of glyphs:
//!
//! | Glyph | Meaning |
//! |---|---|
//! | `.` | open ground |
//! | `@` | player spawn |
//! | `+` | follower spawn |
//! | `x` | enemy spawn |
//! | `*` | rock (obstacle) |
//! | `%` | safe zone (obstacle enemies do not steer around) |
//! | `,` | transition tile |
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use glam::{UVec2, Vec2};
use hashbrown::HashMap;
use log::{debug, info};
use serde::Deserialize;
use thiserror::Error;

use crate::agent::{Agent, AgentId, AgentKind};
use crate::config::{scalar, ConfigStore};
use crate::transition::{Direction, EntryPoint};
use crate::{TILE_HEIGHT, TILE_WIDTH};

/// Errors raised while building a level from its authored form.
#[derive(Debug, Error)]
pub enum LevelError {
    /// The level has no rows or no columns.
    #[error("level `{id}` has an empty map")]
    EmptyMap {
        /// Identifier of the offending level.
        id: String,
    },
    /// A row is not as wide as the first row.
    #[error("level `{id}` row {row} has {found} tiles, expected {expected}")]
    RaggedRow {
        /// Identifier of the offending level.
        id: String,
        /// Zero-based row index.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of this row.
        found: usize,
    },
    /// A glyph has no tile definition.
    #[error("level `{id}` has unknown glyph {glyph:?} at column {col}, row {row}")]
    UnknownGlyph {
        /// Identifier of the offending level.
        id: String,
        /// The unrecognised character.
        glyph: char,
        /// Zero-based column.
        col: usize,
        /// Zero-based row.
        row: usize,
    },
    /// A tile dimension is zero, negative or not finite.
    #[error("level `{id}` has invalid tile size {width}x{height}")]
    InvalidTileSize {
        /// Identifier of the offending level.
        id: String,
        /// Authored tile width.
        width: f32,
        /// Authored tile height.
        height: f32,
    },
    /// Neither a `@` spawn nor a hand-off position was available.
    #[error("level `{id}` has no player spawn")]
    MissingPlayerSpawn {
        /// Identifier of the offending level.
        id: String,
    },
    /// The requested level is not part of the level set.
    #[error("unknown level `{0}`")]
    UnknownLevel(String),
    /// The level file could not be read.
    #[error("failed to read level file {path}: {source}")]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// The level file is not valid JSON.
    #[error("invalid level JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Identifier of a level within a level set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
pub struct LevelId(pub String);

impl LevelId {
    /// Borrows the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LevelId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl std::fmt::Display for LevelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Terrain type of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileKind {
    /// Open, traversable ground.
    Ground,
    /// Non-traversable rock.
    Rock,
    /// Non-traversable refuge that enemies do not steer around.
    SafeZone,
    /// Ground that triggers a level-edge crossing when the player overlaps it.
    Transition,
}

impl TileKind {
    /// Whether agents should steer around this tile.
    #[must_use]
    pub const fn is_obstacle(self) -> bool {
        matches!(self, Self::Rock | Self::SafeZone)
    }
}

/// One cell of the level grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    /// Grid coordinate (column, row); row 0 is the top edge.
    pub coord: UVec2,
    /// Terrain type.
    pub kind: TileKind,
    /// World-space centre of the tile.
    pub centre: Vec2,
}

/// Grid and world dimensions of a level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelBounds {
    /// Number of tile columns.
    pub width_tiles: u32,
    /// Number of tile rows.
    pub height_tiles: u32,
    /// World size of one tile.
    pub tile_size: Vec2,
}

impl LevelBounds {
    /// World-space size of the whole level.
    #[must_use]
    pub fn world_size(&self) -> Vec2 {
        #[expect(
            clippy::cast_precision_loss,
            reason = "Level dimensions are small tile counts."
        )]
        let tiles = Vec2::new(self.width_tiles as f32, self.height_tiles as f32);
        tiles * self.tile_size
    }

    /// Grid coordinate of the tile containing `point`, if inside the level.
    ///
    /// Degenerate tile sizes contain no points.
    #[must_use]
    pub fn tile_at(&self, point: Vec2) -> Option<UVec2> {
        if !valid_tile_size(self.tile_size) {
            return None;
        }
        let cell = (point / self.tile_size).floor();
        if !cell.is_finite() || cell.x < 0.0 || cell.y < 0.0 {
            return None;
        }
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "Cell is floored and checked non-negative above."
        )]
        let coord = UVec2::new(cell.x as u32, cell.y as u32);
        (coord.x < self.width_tiles && coord.y < self.height_tiles).then_some(coord)
    }
}

fn valid_tile_size(size: Vec2) -> bool {
    size.is_finite() && size.x > 0.0 && size.y > 0.0
}

fn default_tile_width() -> f32 {
    TILE_WIDTH
}

fn default_tile_height() -> f32 {
    TILE_HEIGHT
}

/// Authored description of a level.
#[derive(Debug, Clone, Deserialize)]
pub struct LevelSpec {
    /// Unique level identifier.
    pub id: String,
    /// Glyph rows, top row first.
    pub rows: Vec<String>,
    /// Neighbouring level per edge.
    #[serde(default)]
    pub exits: BTreeMap<Direction, String>,
    /// Tile width in world units.
    #[serde(default = "default_tile_width")]
    pub tile_width: f32,
    /// Tile height in world units.
    #[serde(default = "default_tile_height")]
    pub tile_height: f32,
}

/// A collection of authored levels keyed by identifier.
#[derive(Debug, Clone, Default)]
pub struct LevelSet {
    specs: HashMap<LevelId, LevelSpec>,
}

impl LevelSet {
    /// Builds a set from already-parsed specs.
    pub fn new(specs: impl IntoIterator<Item = LevelSpec>) -> Self {
        Self {
            specs: specs
                .into_iter()
                .map(|spec| (LevelId(spec.id.clone()), spec))
                .collect(),
        }
    }

    /// Parses a JSON array of level specs.
    ///
    /// # Errors
    /// Returns [`LevelError::Json`] when the text is not a valid array of levels.
    pub fn from_json(text: &str) -> Result<Self, LevelError> {
        let specs: Vec<LevelSpec> = serde_json::from_str(text)?;
        Ok(Self::new(specs))
    }

    /// Reads and parses a JSON array of level specs from `path`.
    ///
    /// # Errors
    /// Returns [`LevelError`] when the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let path_ref = path.as_ref();
        let text = fs::read_to_string(path_ref).map_err(|source| LevelError::Io {
            path: path_ref.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Looks up the authored level `id`.
    ///
    /// # Errors
    /// Returns [`LevelError::UnknownLevel`] when `id` is not in the set.
    pub fn get(&self, id: &LevelId) -> Result<&LevelSpec, LevelError> {
        self.specs
            .get(id)
            .ok_or_else(|| LevelError::UnknownLevel(id.0.clone()))
    }

    /// Number of levels in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Whether the set contains no levels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

/// The active level: tiles, agents and exits.
#[derive(Debug, Clone)]
pub struct Level {
    id: LevelId,
    bounds: LevelBounds,
    tiles: Vec<Tile>,
    exits: HashMap<Direction, LevelId>,
    /// The input-driven herder.
    pub player: Agent,
    /// Herded followers.
    pub followers: Vec<Agent>,
    /// Roaming enemies.
    pub enemies: Vec<Agent>,
    pending_removal: Vec<AgentId>,
}

impl Level {
    /// Builds a level from its authored form.
    ///
    /// Initial speed caps come from `store`. When `entry` is given (a
    /// transition hand-off) it overrides the `@` spawn.
    ///
    /// # Errors
    /// Returns [`LevelError`] for empty or ragged maps, unknown glyphs, or a
    /// missing player spawn.
    pub fn from_spec<S: ConfigStore + ?Sized>(
        spec: &LevelSpec,
        store: &S,
        entry: Option<EntryPoint>,
    ) -> Result<Self, LevelError> {
        let width = spec.rows.first().map_or(0, |row| row.chars().count());
        if width == 0 {
            return Err(LevelError::EmptyMap {
                id: spec.id.clone(),
            });
        }
        let tile_size = Vec2::new(spec.tile_width, spec.tile_height);
        if !valid_tile_size(tile_size) {
            return Err(LevelError::InvalidTileSize {
                id: spec.id.clone(),
                width: spec.tile_width,
                height: spec.tile_height,
            });
        }
        let bounds = LevelBounds {
            width_tiles: to_u32(width),
            height_tiles: to_u32(spec.rows.len()),
            tile_size,
        };

        let mut tiles = Vec::with_capacity(width * spec.rows.len());
        let mut player_spawn = None;
        let mut follower_spawns = Vec::new();
        let mut enemy_spawns = Vec::new();

        for (row, line) in spec.rows.iter().enumerate() {
            let found = line.chars().count();
            if found != width {
                return Err(LevelError::RaggedRow {
                    id: spec.id.clone(),
                    row,
                    expected: width,
                    found,
                });
            }
            for (col, glyph) in line.chars().enumerate() {
                let coord = UVec2::new(to_u32(col), to_u32(row));
                let centre = (coord.as_vec2() + Vec2::splat(0.5)) * tile_size;
                let kind = match glyph {
                    '.' => TileKind::Ground,
                    '@' => {
                        player_spawn.get_or_insert(centre);
                        TileKind::Ground
                    }
                    '+' => {
                        follower_spawns.push(centre);
                        TileKind::Ground
                    }
                    'x' => {
                        enemy_spawns.push(centre);
                        TileKind::Ground
                    }
                    '*' => TileKind::Rock,
                    '%' => TileKind::SafeZone,
                    ',' => TileKind::Transition,
                    other => {
                        return Err(LevelError::UnknownGlyph {
                            id: spec.id.clone(),
                            glyph: other,
                            col,
                            row,
                        })
                    }
                };
                tiles.push(Tile {
                    coord,
                    kind,
                    centre,
                });
            }
        }

        let player_position = entry
            .map(|e| e.resolve(&bounds))
            .or(player_spawn)
            .ok_or_else(|| LevelError::MissingPlayerSpawn {
                id: spec.id.clone(),
            })?;

        let mut next_id = 0_u32;
        let mut spawn = |kind: AgentKind, position: Vec2, max_velocity: f32| {
            let agent = Agent::new(AgentId(next_id), kind, position, max_velocity);
            next_id += 1;
            agent
        };
        let player = spawn(
            AgentKind::Player,
            player_position,
            scalar(store, "player.max_velocity"),
        );
        let follower_cap = scalar(store, "follower.max_velocity");
        let followers: Vec<Agent> = follower_spawns
            .into_iter()
            .map(|p| spawn(AgentKind::Follower, p, follower_cap))
            .collect();
        let enemy_cap = scalar(store, "enemy.max_velocity");
        let enemies: Vec<Agent> = enemy_spawns
            .into_iter()
            .map(|p| spawn(AgentKind::Enemy, p, enemy_cap))
            .collect();

        let exits = spec
            .exits
            .iter()
            .map(|(&direction, id)| (direction, LevelId(id.clone())))
            .collect();

        info!(
            "loaded level `{}` ({}x{} tiles, {} followers, {} enemies)",
            spec.id,
            bounds.width_tiles,
            bounds.height_tiles,
            followers.len(),
            enemies.len()
        );

        Ok(Self {
            id: LevelId(spec.id.clone()),
            bounds,
            tiles,
            exits,
            player,
            followers,
            enemies,
            pending_removal: Vec::new(),
        })
    }

    /// Identifier of this level.
    #[must_use]
    pub const fn id(&self) -> &LevelId {
        &self.id
    }

    /// Grid and world dimensions.
    #[must_use]
    pub const fn bounds(&self) -> LevelBounds {
        self.bounds
    }

    /// All tiles, row-major from the top-left corner.
    #[must_use]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// The tile at grid coordinate `coord`.
    #[must_use]
    pub fn tile(&self, coord: UVec2) -> Option<&Tile> {
        if coord.x >= self.bounds.width_tiles || coord.y >= self.bounds.height_tiles {
            return None;
        }
        let index = coord.y as usize * self.bounds.width_tiles as usize + coord.x as usize;
        self.tiles.get(index)
    }

    /// The tile under `point`, if inside the level.
    #[must_use]
    pub fn tile_under(&self, point: Vec2) -> Option<&Tile> {
        self.bounds.tile_at(point).and_then(|coord| self.tile(coord))
    }

    /// Destination of the exit across `direction`, if mapped.
    #[must_use]
    pub fn exit(&self, direction: Direction) -> Option<&LevelId> {
        self.exits.get(&direction)
    }

    /// Exits keyed by edge.
    #[must_use]
    pub const fn exits(&self) -> &HashMap<Direction, LevelId> {
        &self.exits
    }

    /// Looks up any agent by identifier.
    #[must_use]
    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        if self.player.id == id {
            return Some(&self.player);
        }
        self.followers
            .iter()
            .chain(&self.enemies)
            .find(|agent| agent.id == id)
    }

    /// Schedules `id` for removal at the end of the tick.
    ///
    /// The agent stays in its pool (and visible to queries) until
    /// [`Level::flush_removals`] runs. The player cannot be removed.
    pub fn mark_removed(&mut self, id: AgentId) {
        if id != self.player.id && !self.pending_removal.contains(&id) {
            self.pending_removal.push(id);
        }
    }

    /// Whether `id` is scheduled for removal this tick.
    #[must_use]
    pub fn is_marked_removed(&self, id: AgentId) -> bool {
        self.pending_removal.contains(&id)
    }

    /// Removes every agent marked this tick and returns them.
    pub fn flush_removals(&mut self) -> Vec<Agent> {
        if self.pending_removal.is_empty() {
            return Vec::new();
        }
        let pending = std::mem::take(&mut self.pending_removal);
        let mut removed = Vec::new();
        for pool in [&mut self.followers, &mut self.enemies] {
            let (gone, kept): (Vec<Agent>, Vec<Agent>) = std::mem::take(pool)
                .into_iter()
                .partition(|agent| pending.contains(&agent.id));
            *pool = kept;
            removed.extend(gone);
        }
        for agent in &removed {
            debug!("removed {:?} {:?} from level `{}`", agent.kind, agent.id, self.id);
        }
        removed
    }
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

//! Level-edge crossings.
//!
//! When the player overlaps a transition tile, [`resolve_transition`] decides
//! which edge was crossed and where the player enters the neighbouring level.
//! It mutates nothing: building the next level and animating the push between
//! scenes belong to the caller.
use glam::{UVec2, Vec2};
use hashbrown::HashMap;
use log::error;
use serde::Deserialize;
use thiserror::Error;

use crate::level::{LevelBounds, LevelId};
use crate::{ENTRY_INSET_TILES, TRANSITION_SLIDE_TILES};

/// Edge of a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// The left (x = 0) edge.
    Left,
    /// The top (y = 0) edge.
    Up,
    /// The right edge.
    Right,
    /// The bottom edge.
    Down,
}

/// Scene push animation played while crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushAnimation {
    /// New scene slides in from the left.
    PushRight,
    /// New scene slides in from the top.
    PushDown,
    /// New scene slides in from the right.
    PushLeft,
    /// New scene slides in from the bottom.
    PushUp,
}

/// One axis of an entry position in the destination level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntryCoord {
    /// An absolute world coordinate.
    At(f32),
    /// Just inside the far edge of the destination, whatever its size.
    FarEdge,
}

/// Where the player appears in the destination level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryPoint {
    /// Horizontal placement.
    pub x: EntryCoord,
    /// Vertical placement.
    pub y: EntryCoord,
}

impl EntryPoint {
    /// Resolves the entry against the destination level's dimensions.
    #[must_use]
    pub fn resolve(&self, bounds: &LevelBounds) -> Vec2 {
        let size = bounds.world_size();
        let inset = bounds.tile_size * ENTRY_INSET_TILES;
        let axis = |coord: EntryCoord, extent: f32, inset_axis: f32| match coord {
            EntryCoord::At(value) => value,
            EntryCoord::FarEdge => extent - inset_axis,
        };
        Vec2::new(
            axis(self.x, size.x, inset.x),
            axis(self.y, size.y, inset.y),
        )
    }
}

/// Errors raised while resolving or consuming a transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The transition tile does not lie on any level edge.
    #[error("transition tile at {col},{row} is not on a level edge")]
    NotOnEdge {
        /// Tile column.
        col: u32,
        /// Tile row.
        row: u32,
    },
    /// The level has no neighbour mapped across the crossed edge.
    #[error("no destination level mapped for direction {0:?}")]
    MissingDestination(Direction),
}

/// Outcome of a level-edge crossing, consumed once by the next scene.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionRecord {
    /// Edge that was crossed.
    pub direction: Direction,
    /// Level to load, if the crossed edge is mapped.
    pub next_level: Option<LevelId>,
    /// Player placement in the destination.
    pub entry: EntryPoint,
    /// Scene push animation to play.
    pub animation: PushAnimation,
    /// Distance both scenes' players slide over the whole push.
    pub slide: Vec2,
}

impl TransitionRecord {
    /// The destination level.
    ///
    /// # Errors
    /// Returns [`TransitionError::MissingDestination`] when the crossed edge
    /// has no mapped neighbour.
    pub fn destination(&self) -> Result<&LevelId, TransitionError> {
        self.next_level
            .as_ref()
            .ok_or(TransitionError::MissingDestination(self.direction))
    }

    /// Player positions in the old and new scenes at `progress` in `[0, 1]`.
    ///
    /// The old scene's player slides out from `old_start` while the new
    /// scene's player slides in to `new_start`.
    #[must_use]
    pub fn slide_at(&self, progress: f32, old_start: Vec2, new_start: Vec2) -> (Vec2, Vec2) {
        let t = progress.clamp(0.0, 1.0);
        (
            old_start + self.slide * t,
            new_start + self.slide * (t - 1.0),
        )
    }
}

/// Edge crossed by a transition tile at `tile`, by first matching rule.
///
/// Rules are checked in the order left, up, right, down, so a corner tile
/// resolves to the first edge in that order.
#[must_use]
pub fn edge_direction(tile: UVec2, bounds: &LevelBounds) -> Option<Direction> {
    if tile.x == 0 {
        Some(Direction::Left)
    } else if tile.y == 0 {
        Some(Direction::Up)
    } else if tile.x + 1 >= bounds.width_tiles {
        Some(Direction::Right)
    } else if tile.y + 1 >= bounds.height_tiles {
        Some(Direction::Down)
    } else {
        None
    }
}

/// Resolves a crossing of the transition tile at `tile`.
///
/// The entry point mirrors the crossed edge: leaving through the left edge
/// enters just inside the right edge of the destination at the same height,
/// and so on. A missing exit mapping is logged and reported through
/// [`TransitionRecord::next_level`] being `None`.
///
/// # Errors
/// Returns [`TransitionError::NotOnEdge`] for interior tiles.
pub fn resolve_transition(
    tile: UVec2,
    bounds: &LevelBounds,
    player: Vec2,
    exits: &HashMap<Direction, LevelId>,
) -> Result<TransitionRecord, TransitionError> {
    let direction = edge_direction(tile, bounds).ok_or(TransitionError::NotOnEdge {
        col: tile.x,
        row: tile.y,
    })?;
    let inset = bounds.tile_size * ENTRY_INSET_TILES;
    let slide = bounds.tile_size * TRANSITION_SLIDE_TILES;

    let (entry, animation, slide_vector) = match direction {
        Direction::Left => (
            EntryPoint {
                x: EntryCoord::FarEdge,
                y: EntryCoord::At(player.y),
            },
            PushAnimation::PushRight,
            Vec2::new(-slide.x, 0.0),
        ),
        Direction::Up => (
            EntryPoint {
                x: EntryCoord::At(player.x),
                y: EntryCoord::FarEdge,
            },
            PushAnimation::PushDown,
            Vec2::new(0.0, -slide.y),
        ),
        Direction::Right => (
            EntryPoint {
                x: EntryCoord::At(inset.x),
                y: EntryCoord::At(player.y),
            },
            PushAnimation::PushLeft,
            Vec2::new(slide.x, 0.0),
        ),
        Direction::Down => (
            EntryPoint {
                x: EntryCoord::At(player.x),
                y: EntryCoord::At(inset.y),
            },
            PushAnimation::PushUp,
            Vec2::new(0.0, slide.y),
        ),
    };

    let next_level = exits.get(&direction).cloned();
    if next_level.is_none() {
        error!("missing next level for direction {direction:?}");
    }

    Ok(TransitionRecord {
        direction,
        next_level,
        entry,
        animation,
        slide: slide_vector,
    })
}

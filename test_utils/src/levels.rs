//! Convenience constructors for levels, agents and tuning used in tests.

use glam::Vec2;
use sheepdog::level::LevelSpec;
use sheepdog::transition::Direction;
use sheepdog::{Agent, AgentId, AgentKind, Level, Tuning};

/// Tile size used by every test level, in world units.
pub const TEST_TILE: f32 = 10.0;

/// Builds a level spec from glyph rows with `TEST_TILE`-sized tiles.
///
/// # Examples
/// ```
/// use sheepdog::transition::Direction;
/// use test_utils::levels::level_spec;
///
/// let spec = level_spec("meadow", &["@.,"], &[(Direction::Right, "ridge")]);
/// assert_eq!(spec.rows.len(), 1);
/// assert_eq!(spec.exits.len(), 1);
/// ```
pub fn level_spec(id: &str, rows: &[&str], exits: &[(Direction, &str)]) -> LevelSpec {
    LevelSpec {
        id: id.to_owned(),
        rows: rows.iter().map(|&row| row.to_owned()).collect(),
        exits: exits
            .iter()
            .map(|&(direction, target)| (direction, target.to_owned()))
            .collect(),
        tile_width: TEST_TILE,
        tile_height: TEST_TILE,
    }
}

/// Parses a level with no exits from glyph rows.
///
/// # Panics
/// Panics if the rows do not form a valid level.
///
/// # Examples
/// ```
/// use sheepdog::Tuning;
/// use test_utils::levels::level_from_rows;
///
/// let level = level_from_rows(&["@+x"], &Tuning::default());
/// assert_eq!(level.followers.len(), 1);
/// assert_eq!(level.enemies.len(), 1);
/// ```
pub fn level_from_rows(rows: &[&str], tuning: &Tuning) -> Level {
    Level::from_spec(&level_spec("test", rows, &[]), tuning, None)
        .unwrap_or_else(|e| panic!("test level should parse: {e}"))
}

/// Creates a resting agent at `(x, y)`.
///
/// # Examples
/// ```
/// use sheepdog::AgentKind;
/// use test_utils::levels::agent_at;
///
/// let enemy = agent_at(7, AgentKind::Enemy, 3.0, 4.0);
/// assert_eq!(enemy.id.into_inner(), 7);
/// ```
pub fn agent_at(id: u32, kind: AgentKind, x: f32, y: f32) -> Agent {
    Agent::new(AgentId(id), kind, Vec2::new(x, y), 100.0)
}

/// A tuning store with every behaviour off except the given keys.
///
/// # Examples
/// ```
/// use sheepdog::config::{scalar, Tuning};
/// use test_utils::levels::tuning_with;
///
/// let tuning = tuning_with(&[("follower.killer_factor", 1.0)]);
/// assert!((scalar(&tuning, "follower.killer_factor") - 1.0).abs() < f32::EPSILON);
/// assert!(scalar(&tuning, "follower.cohere_factor").abs() < f32::EPSILON);
/// ```
pub fn tuning_with(pairs: &[(&str, f32)]) -> Tuning {
    let mut tuning = Tuning::disabled();
    for &(name, value) in pairs {
        tuning.set(name, value);
    }
    tuning
}

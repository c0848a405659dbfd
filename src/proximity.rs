//! Spatial overlap queries used by steering.
//!
//! Queries are typed by agent kind rather than filtered by tags afterwards.
//! The queried region is an axis-aligned square of side `radius` centred on
//! the point (half extent `radius / 2`), the same rectangle overlap the
//! physics layer offers. It is a coarse pre-filter: behaviours that need a
//! true radius test apply it themselves.
use glam::Vec2;

use crate::agent::{AgentId, AgentKind};
use crate::level::Level;

/// An agent returned by a proximity query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbour {
    /// Identifier of the agent.
    pub id: AgentId,
    /// Position at query time.
    pub position: Vec2,
}

/// Which obstacle tiles an obstacle query returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObstacleFilter {
    /// Every non-traversable tile.
    All,
    /// Non-traversable tiles other than safe zones.
    ExcludeSafeZones,
}

/// Spatial queries over the active level.
#[cfg_attr(test, mockall::automock)]
pub trait Proximity {
    /// Agents of `kind` whose centre lies in the query square around `point`.
    fn agents_near(&self, kind: AgentKind, point: Vec2, radius: f32) -> Vec<Neighbour>;

    /// Centres of obstacle tiles in the query square around `point`.
    fn obstacles_near(&self, point: Vec2, radius: f32, filter: ObstacleFilter) -> Vec<Vec2>;
}

/// Whether `candidate` falls in the query square of side `radius` around `point`.
#[must_use]
pub fn in_region(candidate: Vec2, point: Vec2, radius: f32) -> bool {
    let half = radius * 0.5;
    let offset = (candidate - point).abs();
    offset.x <= half && offset.y <= half
}

/// Brute-force [`Proximity`] over a level's pools and tile grid.
#[derive(Debug, Clone, Copy)]
pub struct LevelProximity<'a> {
    level: &'a Level,
}

impl<'a> LevelProximity<'a> {
    /// Wraps `level` for querying.
    #[must_use]
    pub const fn new(level: &'a Level) -> Self {
        Self { level }
    }
}

impl Proximity for LevelProximity<'_> {
    fn agents_near(&self, kind: AgentKind, point: Vec2, radius: f32) -> Vec<Neighbour> {
        let pool: &[crate::agent::Agent] = match kind {
            AgentKind::Player => std::slice::from_ref(&self.level.player),
            AgentKind::Follower => &self.level.followers,
            AgentKind::Enemy => &self.level.enemies,
        };
        pool.iter()
            .filter(|agent| in_region(agent.position, point, radius))
            .map(|agent| Neighbour {
                id: agent.id,
                position: agent.position,
            })
            .collect()
    }

    fn obstacles_near(&self, point: Vec2, radius: f32, filter: ObstacleFilter) -> Vec<Vec2> {
        self.level
            .tiles()
            .iter()
            .filter(|tile| tile.kind.is_obstacle())
            .filter(|tile| {
                filter == ObstacleFilter::All || tile.kind != crate::level::TileKind::SafeZone
            })
            .filter(|tile| in_region(tile.centre, point, radius))
            .map(|tile| tile.centre)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Tuning;
    use crate::level::LevelSpec;
    use rstest::rstest;

    fn level(rows: &[&str]) -> Level {
        let spec = LevelSpec {
            id: "test".to_owned(),
            rows: rows.iter().map(|&r| r.to_owned()).collect(),
            exits: std::collections::BTreeMap::new(),
            tile_width: 10.0,
            tile_height: 10.0,
        };
        Level::from_spec(&spec, &Tuning::default(), None)
            .unwrap_or_else(|e| panic!("test level should parse: {e}"))
    }

    #[rstest]
    #[case::inside(Vec2::new(4.0, -4.0), true)]
    #[case::on_boundary(Vec2::new(5.0, 5.0), true)]
    #[case::outside_x(Vec2::new(6.0, 0.0), false)]
    #[case::outside_y(Vec2::new(0.0, -6.0), false)]
    fn region_is_a_square_of_side_radius(#[case] candidate: Vec2, #[case] expected: bool) {
        assert_eq!(in_region(candidate, Vec2::ZERO, 10.0), expected);
    }

    #[test]
    fn agent_queries_are_typed_by_kind() {
        let level = level(&["@+x+"]);
        let proximity = LevelProximity::new(&level);
        let centre = Vec2::new(15.0, 5.0);

        let followers = proximity.agents_near(AgentKind::Follower, centre, 100.0);
        assert_eq!(followers.len(), 2);
        let enemies = proximity.agents_near(AgentKind::Enemy, centre, 100.0);
        assert_eq!(enemies.len(), 1);
        let player = proximity.agents_near(AgentKind::Player, centre, 20.0);
        assert_eq!(player.len(), 1);
        let near_only = proximity.agents_near(AgentKind::Follower, centre, 10.0);
        assert_eq!(near_only.len(), 1);
    }

    #[test]
    fn obstacle_queries_can_skip_safe_zones() {
        let level = level(&["*@%"]);
        let proximity = LevelProximity::new(&level);
        let centre = Vec2::new(15.0, 5.0);

        assert_eq!(
            proximity
                .obstacles_near(centre, 40.0, ObstacleFilter::All)
                .len(),
            2
        );
        assert_eq!(
            proximity.obstacles_near(centre, 40.0, ObstacleFilter::ExcludeSafeZones),
            vec![Vec2::new(5.0, 5.0)]
        );
    }
}

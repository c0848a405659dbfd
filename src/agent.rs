//! Moving entities under steering control.
//!
//! Position, velocity and acceleration belong to the physics body; steering
//! only ever writes [`Agent::acceleration`]. The two speed caps are the
//! Velocity Governor's: `max_velocity_target` is set by steering each tick and
//! `max_velocity_current` is the smoothed cap actually enforced.
use glam::Vec2;
use log::debug;

/// Stable identifier of an agent within a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(pub u32);

impl AgentId {
    /// Returns the raw identifier.
    #[must_use]
    pub const fn into_inner(self) -> u32 {
        self.0
    }
}

/// Role an agent plays in the herding game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentKind {
    /// The input-driven herder.
    Player,
    /// Herded prey that flocks around the player.
    Follower,
    /// Roaming predator that hunts followers.
    Enemy,
}

/// A moving body in the current level.
#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    /// Identifier unique within the owning level.
    pub id: AgentId,
    /// Role of the agent.
    pub kind: AgentKind,
    /// World-space centre of the body.
    pub position: Vec2,
    /// Current velocity, integrated by the physics step.
    pub velocity: Vec2,
    /// Acceleration requested for the next integration.
    pub acceleration: Vec2,
    /// Speed cap requested by steering for this tick.
    pub max_velocity_target: f32,
    /// Smoothed speed cap enforced by the physics step.
    pub max_velocity_current: f32,
    /// Seconds of remaining cooldown; steering is suspended while positive.
    pub cooldown: f32,
}

impl Agent {
    /// Creates a resting agent whose caps both start at `max_velocity`.
    #[must_use]
    pub fn new(id: AgentId, kind: AgentKind, position: Vec2, max_velocity: f32) -> Self {
        debug!("creating {kind:?} {id:?} at {position}");
        Self {
            id,
            kind,
            position,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            max_velocity_target: max_velocity,
            max_velocity_current: max_velocity,
            cooldown: 0.0,
        }
    }

    /// Whether steering is currently suspended for this agent.
    #[must_use]
    pub fn in_cooldown(&self) -> bool {
        self.cooldown > 0.0
    }

    /// Suspends steering for `seconds`, keeping the longer of two cooldowns.
    pub fn start_cooldown(&mut self, seconds: f32) {
        self.cooldown = self.cooldown.max(seconds);
        self.acceleration = Vec2::ZERO;
    }

    /// Counts down the cooldown by `dt` seconds.
    pub fn tick_cooldown(&mut self, dt: f32) {
        if self.cooldown > 0.0 {
            self.cooldown = (self.cooldown - dt).max(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_agent_starts_at_rest_with_matching_caps() {
        let agent = Agent::new(AgentId(3), AgentKind::Follower, Vec2::new(1.0, 2.0), 80.0);
        assert_eq!(agent.velocity, Vec2::ZERO);
        assert_eq!(agent.acceleration, Vec2::ZERO);
        assert!((agent.max_velocity_current - agent.max_velocity_target).abs() < f32::EPSILON);
        assert!(!agent.in_cooldown());
    }

    #[test]
    fn cooldown_counts_down_to_zero() {
        let mut agent = Agent::new(AgentId(1), AgentKind::Enemy, Vec2::ZERO, 50.0);
        agent.acceleration = Vec2::X;
        agent.start_cooldown(0.5);
        assert!(agent.in_cooldown());
        assert_eq!(agent.acceleration, Vec2::ZERO);

        agent.tick_cooldown(0.3);
        assert!(agent.in_cooldown());
        agent.tick_cooldown(0.3);
        assert!(!agent.in_cooldown());
        assert!(agent.cooldown.abs() < f32::EPSILON);
    }

    #[test]
    fn shorter_cooldown_does_not_cut_a_longer_one() {
        let mut agent = Agent::new(AgentId(1), AgentKind::Enemy, Vec2::ZERO, 50.0);
        agent.start_cooldown(2.0);
        agent.start_cooldown(0.5);
        assert!((agent.cooldown - 2.0).abs() < f32::EPSILON);
    }
}

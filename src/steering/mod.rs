//! Per-tick behaviour blending for followers and enemies.
//!
//! Each agent accumulates up to seven independently gated contributions into
//! a single direction. A contribution is only evaluated when its factor is
//! positive, and only counts when its geometric precondition holds. The
//! resulting acceleration points along the summed direction with a fixed
//! magnitude; when nothing fired the agent coasts with zero acceleration.
//!
//! Planning reads the level and writes nothing, so agents can be evaluated in
//! any order. [`steer_followers`] and [`steer_enemies`] plan every agent
//! first and then write the accelerations back.

pub mod enemy;
pub mod follower;

pub use enemy::{enemy_steering, plan_enemies, steer_enemies};
pub use follower::{follower_steering, plan_followers, steer_followers};

use glam::Vec2;

use crate::agent::Agent;
use crate::vector_math::normalize;

/// Acceleration and speed cap produced for one agent this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringOutcome {
    /// Acceleration to hand to the physics body.
    pub acceleration: Vec2,
    /// Speed cap for the Velocity Governor to ramp toward.
    pub max_velocity_target: f32,
    /// Whether the flee or pursue bonus is active.
    pub boosted: bool,
}

/// Running sum of weighted behaviour directions.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Blend {
    sum: Vec2,
    fired: bool,
}

impl Blend {
    /// Adds `direction × factor` when a direction is present.
    pub(crate) fn add(&mut self, direction: Option<Vec2>, factor: f32) {
        if let Some(unit) = direction {
            self.sum += unit * factor;
            self.fired = true;
        }
    }

    /// Converts the blend into an acceleration of length `magnitude`.
    ///
    /// Only the direction of the sum matters. A blend that never fired, or
    /// whose contributions cancel out, yields zero.
    pub(crate) fn acceleration(self, magnitude: f32) -> Vec2 {
        if !self.fired {
            return Vec2::ZERO;
        }
        normalize(self.sum).map_or(Vec2::ZERO, |unit| {
            let theta = unit.y.atan2(unit.x);
            Vec2::from_angle(theta) * magnitude
        })
    }
}

/// Writes planned outcomes back onto `agents`.
///
/// `None` marks an agent in cooldown: its acceleration is forced to zero and
/// its speed target is left alone.
pub(crate) fn apply_outcomes(agents: &mut [Agent], outcomes: Vec<Option<SteeringOutcome>>) {
    for (agent, outcome) in agents.iter_mut().zip(outcomes) {
        match outcome {
            Some(planned) => {
                agent.acceleration = planned.acceleration;
                agent.max_velocity_target = planned.max_velocity_target;
            }
            None => agent.acceleration = Vec2::ZERO,
        }
    }
}

//! Physics helper functions.
//!
//! A small explicit-Euler integrator standing in for the rendering engine's
//! arcade physics during headless runs. It consumes the acceleration written
//! by steering and enforces the cap maintained by the Velocity Governor; it
//! never chooses either.

use glam::Vec2;

use crate::agent::Agent;
use crate::config::MotionParams;
use crate::level::{Level, LevelBounds};
use crate::REFERENCE_DT;

/// Velocity multiplier applied over `dt` for a per-tick `drag` fraction.
///
/// `drag` is the fraction of velocity lost over one reference tick and is
/// clamped to `[0, 1]`; the result is frame-rate independent.
///
/// # Examples
///
/// ```
/// use sheepdog::physics::damping;
/// let retained = damping(0.5, 1.0 / 60.0);
/// assert!((retained - 0.5).abs() < 1e-6);
/// assert!((damping(0.0, 1.0) - 1.0).abs() < f32::EPSILON);
/// ```
#[must_use]
pub fn damping(drag: f32, dt: f32) -> f32 {
    (1.0 - drag.clamp(0.0, 1.0)).powf(dt / REFERENCE_DT)
}

/// Advances a single body by `dt` seconds.
///
/// Velocity gains `acceleration × dt`, is damped by `drag` and then clamped
/// to the enforced cap before the position moves.
pub fn integrate(agent: &mut Agent, dt: f32, drag: f32) {
    if dt <= 0.0 {
        return;
    }
    let accelerated = agent.velocity + agent.acceleration * dt;
    let damped = accelerated * damping(drag, dt);
    agent.velocity = damped.clamp_length_max(agent.max_velocity_current.max(0.0));
    agent.position += agent.velocity * dt;
}

/// Keeps a body inside the level, stopping motion into the wall it hit.
pub fn confine(agent: &mut Agent, bounds: &LevelBounds) {
    let max = bounds.world_size();
    let clamped = agent.position.clamp(Vec2::ZERO, max);
    if (clamped.x - agent.position.x).abs() > 0.0 {
        agent.velocity.x = 0.0;
    }
    if (clamped.y - agent.position.y).abs() > 0.0 {
        agent.velocity.y = 0.0;
    }
    agent.position = clamped;
}

/// Integrates every body in `level` by `dt` seconds.
pub fn step_physics(level: &mut Level, dt: f32, params: &MotionParams) {
    let bounds = level.bounds();
    integrate(&mut level.player, dt, params.player_drag);
    confine(&mut level.player, &bounds);
    for follower in &mut level.followers {
        integrate(follower, dt, params.follower_drag);
        confine(follower, &bounds);
    }
    for enemy in &mut level.enemies {
        integrate(enemy, dt, params.enemy_drag);
        confine(enemy, &bounds);
    }
}

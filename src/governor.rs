//! Velocity Governor.
//!
//! Smooths each steered agent's enforced speed cap toward the target chosen by
//! steering, so flee and pursue bonuses ramp in and out instead of stepping.
//! This is the only code that writes [`Agent::max_velocity_current`].
use crate::agent::Agent;
use crate::config::GovernorParams;
use crate::level::Level;

/// Moves `current` toward `target` by one governor step of `dt` seconds.
///
/// The step factor `lerp × dt / reference_dt` is clamped to `[0, 1]`, so a
/// long frame lands on the target instead of overshooting it. Non-positive
/// `dt` or `reference_dt` leaves the cap unchanged.
///
/// # Examples
///
/// ```
/// use sheepdog::config::GovernorParams;
/// use sheepdog::governor::ramp_cap;
///
/// let params = GovernorParams { lerp: 0.5, reference_dt: 0.1 };
/// assert!((ramp_cap(0.0, 10.0, 0.1, &params) - 5.0).abs() < 1e-6);
/// ```
#[must_use]
pub fn ramp_cap(current: f32, target: f32, dt: f32, params: &GovernorParams) -> f32 {
    if dt <= 0.0 || params.reference_dt <= 0.0 {
        return current;
    }
    let factor = (params.lerp * dt / params.reference_dt).clamp(0.0, 1.0);
    current + (target - current) * factor
}

fn govern(agents: &mut [Agent], dt: f32, params: &GovernorParams) {
    for agent in agents {
        agent.max_velocity_current =
            ramp_cap(agent.max_velocity_current, agent.max_velocity_target, dt, params);
    }
}

/// Applies one governor step to every follower and enemy in `level`.
///
/// The player is driven directly by input and is not governed.
pub fn step_velocity_governor(level: &mut Level, dt: f32, params: &GovernorParams) {
    govern(&mut level.followers, dt, params);
    govern(&mut level.enemies, dt, params);
}

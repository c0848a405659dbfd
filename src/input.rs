//! Player movement intent.
//!
//! World coordinates grow downwards (row 0 is the top of the map), so "up"
//! maps to negative `y`.
use glam::Vec2;

use crate::agent::Agent;

/// Directional key states driving the player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[expect(
    clippy::struct_excessive_bools,
    reason = "This struct represents the pressed state of exactly four directional keys."
)]
pub struct MoveIntent {
    /// Whether an "up" key is held.
    pub up: bool,
    /// Whether a "down" key is held.
    pub down: bool,
    /// Whether a "left" key is held.
    pub left: bool,
    /// Whether a "right" key is held.
    pub right: bool,
}

/// Unit direction for `intent`, or zero when no key is held.
///
/// Opposing keys do not cancel: up wins over down and right wins over left.
/// Diagonals are normalised so holding two keys is not faster.
///
/// # Examples
///
/// ```
/// use sheepdog::input::{move_direction, MoveIntent};
///
/// let up = move_direction(MoveIntent { up: true, ..Default::default() });
/// assert!((up.y + 1.0).abs() < f32::EPSILON);
///
/// let diagonal = move_direction(MoveIntent { up: true, right: true, ..Default::default() });
/// assert!((diagonal.length() - 1.0).abs() < 0.001);
/// ```
#[must_use]
pub fn move_direction(intent: MoveIntent) -> Vec2 {
    let x = if intent.right {
        1.0
    } else if intent.left {
        -1.0
    } else {
        0.0
    };
    let y = if intent.up {
        -1.0
    } else if intent.down {
        1.0
    } else {
        0.0
    };
    let raw = Vec2::new(x, y);
    raw.normalize_or_zero()
}

/// Writes the player's acceleration and speed cap for this tick.
///
/// The player is not governed: its cap is applied directly.
pub fn drive_player(player: &mut Agent, intent: MoveIntent, acceleration: f32, max_velocity: f32) {
    player.acceleration = move_direction(intent) * acceleration;
    player.max_velocity_target = max_velocity;
    player.max_velocity_current = max_velocity;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentId, AgentKind};
    use rstest::rstest;

    #[rstest]
    #[case::no_keys(MoveIntent::default(), Vec2::ZERO)]
    #[case::up_only(MoveIntent { up: true, ..Default::default() }, Vec2::new(0.0, -1.0))]
    #[case::down_only(MoveIntent { down: true, ..Default::default() }, Vec2::new(0.0, 1.0))]
    #[case::left_only(MoveIntent { left: true, ..Default::default() }, Vec2::new(-1.0, 0.0))]
    #[case::right_only(MoveIntent { right: true, ..Default::default() }, Vec2::new(1.0, 0.0))]
    #[case::right_beats_left(MoveIntent { left: true, right: true, ..Default::default() }, Vec2::new(1.0, 0.0))]
    #[case::up_beats_down(MoveIntent { up: true, down: true, ..Default::default() }, Vec2::new(0.0, -1.0))]
    fn cardinal_and_opposing_directions(#[case] intent: MoveIntent, #[case] expected: Vec2) {
        let actual = move_direction(intent);
        assert!(
            (actual - expected).length() < 0.001,
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn diagonal_is_scaled_by_root_half() {
        let dir = move_direction(MoveIntent {
            down: true,
            right: true,
            ..Default::default()
        });
        assert!((dir.x - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
        assert!((dir.y - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
    }

    #[test]
    fn drive_player_sets_acceleration_and_cap() {
        let mut player = Agent::new(AgentId(0), AgentKind::Player, Vec2::ZERO, 10.0);
        drive_player(
            &mut player,
            MoveIntent {
                left: true,
                ..Default::default()
            },
            900.0,
            160.0,
        );
        assert_eq!(player.acceleration, Vec2::new(-900.0, 0.0));
        assert!((player.max_velocity_current - 160.0).abs() < f32::EPSILON);
    }
}

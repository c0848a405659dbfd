//! Follower behaviour blend.
//!
//! Followers seek the player, cohere with and spread from each other, steer
//! around obstacles and enemies, and flee the nearest enemy inside the killer
//! radius. Fleeing grants a temporary acceleration and speed bonus that is
//! recomputed from configuration every tick and never accumulates.
use glam::Vec2;
use log::debug;

use super::{apply_outcomes, Blend, SteeringOutcome};
use crate::agent::{Agent, AgentKind};
use crate::config::{ConfigStore, FollowerParams};
use crate::level::Level;
use crate::proximity::{LevelProximity, Neighbour, ObstacleFilter, Proximity};
use crate::vector_math::{avoid_many, avoid_nearest, normalize, toward_centroid};

fn positions(neighbours: &[Neighbour]) -> Vec<Vec2> {
    neighbours.iter().map(|n| n.position).collect()
}

/// Plans the steering of a single follower.
///
/// `player` is the player's current position; it is both a seek target and
/// an always-considered repeller for spreading.
pub fn follower_steering<P: Proximity + ?Sized>(
    follower: &Agent,
    player: Vec2,
    proximity: &P,
    params: &FollowerParams,
) -> SteeringOutcome {
    let origin = follower.position;
    let mut blend = Blend::default();

    if params.player.enabled() {
        let to_player = player - origin;
        if to_player.length() < params.player.radius {
            blend.add(normalize(to_player), params.player.factor);
        }
    }

    let cohere_group = params
        .cohere
        .enabled()
        .then(|| proximity.agents_near(AgentKind::Follower, origin, params.cohere.radius));
    if let Some(group) = cohere_group.as_deref() {
        if group.len() > 1 {
            blend.add(
                toward_centroid(&positions(group), origin).ok().flatten(),
                params.cohere.factor,
            );
        }
    }

    if params.spread.enabled() {
        let crowd = match cohere_group {
            Some(group) if params.cohere.radius > params.spread.radius => group,
            _ => proximity.agents_near(AgentKind::Follower, origin, params.spread.radius),
        };
        let mut repellers: Vec<Vec2> = crowd
            .iter()
            .filter(|n| n.id != follower.id)
            .map(|n| n.position)
            .collect();
        repellers.push(player);
        blend.add(
            avoid_many(&repellers, origin, params.spread.radius),
            params.spread.factor,
        );
    }

    if params.obstacle.enabled() {
        let obstacles = proximity.obstacles_near(origin, params.obstacle.radius, ObstacleFilter::All);
        blend.add(
            avoid_many(&obstacles, origin, params.obstacle.radius),
            params.obstacle.factor,
        );
    }

    if params.enemy.enabled() {
        let enemies = proximity.agents_near(AgentKind::Enemy, origin, params.enemy.radius);
        blend.add(
            avoid_many(&positions(&enemies), origin, params.enemy.radius),
            params.enemy.factor,
        );
    }

    let mut acceleration = params.acceleration;
    let mut max_velocity_target = params.max_velocity;
    let mut boosted = false;
    if params.killer.enabled() {
        let killers = proximity.agents_near(AgentKind::Enemy, origin, params.killer.radius);
        if !killers.is_empty() {
            blend.add(
                avoid_nearest(&positions(&killers), origin).ok().flatten(),
                params.killer.factor,
            );
            acceleration += params.flee_acceleration;
            max_velocity_target += params.flee_max_velocity;
            boosted = true;
            debug!("{:?} fleeing {} enemies", follower.id, killers.len());
        }
    }

    SteeringOutcome {
        acceleration: blend.acceleration(acceleration),
        max_velocity_target,
        boosted,
    }
}

/// Plans every follower against `proximity`; `None` marks a cooldown.
pub fn plan_followers<P: Proximity + ?Sized>(
    level: &Level,
    proximity: &P,
    params: &FollowerParams,
) -> Vec<Option<SteeringOutcome>> {
    let player = level.player.position;
    level
        .followers
        .iter()
        .map(|follower| {
            (!follower.in_cooldown())
                .then(|| follower_steering(follower, player, proximity, params))
        })
        .collect()
}

/// Steers every follower in `level` using parameters read from `store`.
pub fn steer_followers<S: ConfigStore + ?Sized>(level: &mut Level, store: &S) {
    let params = FollowerParams::read(store);
    let outcomes = plan_followers(level, &LevelProximity::new(level), &params);
    apply_outcomes(&mut level.followers, outcomes);
}

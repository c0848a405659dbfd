//! Enemy behaviour blend.
//!
//! Enemies keep their distance from the player, flock with their own kind,
//! drift toward the follower swarm and chase the nearest follower in reach.
//! Safe-zone tiles are not treated as obstacles, so enemies can press right
//! up against them.
use glam::Vec2;
use log::debug;

use super::{apply_outcomes, Blend, SteeringOutcome};
use crate::agent::{Agent, AgentKind};
use crate::config::{ConfigStore, EnemyParams};
use crate::level::Level;
use crate::proximity::{LevelProximity, Neighbour, ObstacleFilter, Proximity};
use crate::vector_math::{avoid_many, avoid_one, normalize, seek_nearest, toward_centroid};

fn positions(neighbours: &[Neighbour]) -> Vec<Vec2> {
    neighbours.iter().map(|n| n.position).collect()
}

/// Plans the steering of a single enemy.
pub fn enemy_steering<P: Proximity + ?Sized>(
    enemy: &Agent,
    player: Vec2,
    proximity: &P,
    params: &EnemyParams,
) -> SteeringOutcome {
    let origin = enemy.position;
    let mut blend = Blend::default();

    if params.avoid_player.enabled() {
        blend.add(
            avoid_one(player, origin, params.avoid_player.radius),
            params.avoid_player.factor,
        );
    }

    if params.player.enabled() {
        let to_player = player - origin;
        if to_player.length() < params.player.radius {
            blend.add(normalize(to_player), params.player.factor);
        }
    }

    let pack = params
        .cohere
        .enabled()
        .then(|| proximity.agents_near(AgentKind::Enemy, origin, params.cohere.radius));
    if let Some(group) = pack.as_deref() {
        if group.len() > 1 {
            blend.add(
                toward_centroid(&positions(group), origin).ok().flatten(),
                params.cohere.factor,
            );
        }
    }

    if params.spread.enabled() {
        let crowd = match pack {
            Some(group) if params.cohere.radius > params.spread.radius => group,
            _ => proximity.agents_near(AgentKind::Enemy, origin, params.spread.radius),
        };
        let others: Vec<Vec2> = crowd
            .iter()
            .filter(|n| n.id != enemy.id)
            .map(|n| n.position)
            .collect();
        blend.add(
            avoid_many(&others, origin, params.spread.radius),
            params.spread.factor,
        );
    }

    if params.obstacle.enabled() {
        let obstacles = proximity.obstacles_near(
            origin,
            params.obstacle.radius,
            ObstacleFilter::ExcludeSafeZones,
        );
        blend.add(
            avoid_many(&obstacles, origin, params.obstacle.radius),
            params.obstacle.factor,
        );
    }

    if params.follower.enabled() {
        let swarm = proximity.agents_near(AgentKind::Follower, origin, params.follower.radius);
        if !swarm.is_empty() {
            blend.add(
                toward_centroid(&positions(&swarm), origin).ok().flatten(),
                params.follower.factor,
            );
        }
    }

    let mut acceleration = params.acceleration;
    let mut max_velocity_target = params.max_velocity;
    let mut boosted = false;
    if params.victim.enabled() {
        let victims = proximity.agents_near(AgentKind::Follower, origin, params.victim.radius);
        if !victims.is_empty() {
            blend.add(
                seek_nearest(&positions(&victims), origin).ok().flatten(),
                params.victim.factor,
            );
            acceleration += params.pursue_acceleration;
            max_velocity_target += params.pursue_max_velocity;
            boosted = true;
            debug!("{:?} pursuing among {} followers", enemy.id, victims.len());
        }
    }

    SteeringOutcome {
        acceleration: blend.acceleration(acceleration),
        max_velocity_target,
        boosted,
    }
}

/// Plans every enemy against `proximity`; `None` marks a cooldown.
pub fn plan_enemies<P: Proximity + ?Sized>(
    level: &Level,
    proximity: &P,
    params: &EnemyParams,
) -> Vec<Option<SteeringOutcome>> {
    let player = level.player.position;
    level
        .enemies
        .iter()
        .map(|enemy| (!enemy.in_cooldown()).then(|| enemy_steering(enemy, player, proximity, params)))
        .collect()
}

/// Steers every enemy in `level` using parameters read from `store`.
pub fn steer_enemies<S: ConfigStore + ?Sized>(level: &mut Level, store: &S) {
    let params = EnemyParams::read(store);
    let outcomes = plan_enemies(level, &LevelProximity::new(level), &params);
    apply_outcomes(&mut level.enemies, outcomes);
}

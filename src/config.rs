//! Behaviour tuning store.
//!
//! Every steering radius and weight is looked up by name through
//! [`ConfigStore`]. Step functions read a fresh parameter snapshot each tick,
//! so values changed with [`Tuning::set`] take effect on the next tick. A
//! factor of `0.0` disables its behaviour entirely; missing keys read as
//! `0.0` for that reason.
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use hashbrown::{HashMap, HashSet};
use log::warn;
use serde_json::Value;
use thiserror::Error;

use crate::REFERENCE_DT;

/// Source of named scalar tuning values.
#[cfg_attr(test, mockall::automock)]
pub trait ConfigStore {
    /// Looks up `name`, returning `None` when the key is unknown.
    fn get(&self, name: &str) -> Option<f32>;
}

/// Reads `name` from `store`, treating unknown keys as `0.0`.
pub fn scalar<S: ConfigStore + ?Sized>(store: &S, name: &str) -> f32 {
    store.get(name).unwrap_or(0.0)
}

/// Errors raised while loading a tuning file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The tuning file could not be read.
    #[error("failed to read tuning file {path}: {source}")]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// The tuning document is not valid JSON.
    #[error("invalid tuning JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The document root is not a JSON object.
    #[error("tuning document must be a JSON object")]
    NotAnObject,
    /// A leaf value is not a number.
    #[error("tuning value `{key}` is not a number")]
    NotANumber {
        /// Dotted key of the offending value.
        key: String,
    },
}

/// Built-in tuning values keyed by dotted name.
pub const DEFAULTS: &[(&str, f32)] = &[
    ("player.acceleration", 900.0),
    ("player.max_velocity", 160.0),
    ("player.drag", 0.02),
    ("follower.acceleration", 600.0),
    ("follower.max_velocity", 110.0),
    ("follower.drag", 0.05),
    ("follower.player_radius", 160.0),
    ("follower.player_factor", 1.0),
    ("follower.cohere_radius", 96.0),
    ("follower.cohere_factor", 0.4),
    ("follower.spread_radius", 40.0),
    ("follower.spread_factor", 1.2),
    ("follower.obstacle_radius", 48.0),
    ("follower.obstacle_factor", 1.5),
    ("follower.enemy_radius", 128.0),
    ("follower.enemy_factor", 1.0),
    ("follower.killer_radius", 64.0),
    ("follower.killer_factor", 2.0),
    ("follower.flee_acceleration", 300.0),
    ("follower.flee_max_velocity", 60.0),
    ("enemy.acceleration", 420.0),
    ("enemy.max_velocity", 95.0),
    ("enemy.drag", 0.05),
    ("enemy.avoid_player_radius", 96.0),
    ("enemy.avoid_player_factor", 1.5),
    ("enemy.player_radius", 0.0),
    ("enemy.player_factor", 0.0),
    ("enemy.cohere_radius", 128.0),
    ("enemy.cohere_factor", 0.2),
    ("enemy.spread_radius", 48.0),
    ("enemy.spread_factor", 1.0),
    ("enemy.obstacle_radius", 48.0),
    ("enemy.obstacle_factor", 1.5),
    ("enemy.follower_radius", 320.0),
    ("enemy.follower_factor", 0.5),
    ("enemy.victim_radius", 96.0),
    ("enemy.victim_factor", 2.0),
    ("enemy.pursue_acceleration", 200.0),
    ("enemy.pursue_max_velocity", 50.0),
    ("enemy.capture_radius", 12.0),
    ("enemy.cooldown", 1.0),
    ("governor.lerp", 0.1),
    ("governor.reference_dt", REFERENCE_DT),
    ("loss_risk.threshold", 48.0),
    ("loss_risk.body_margin", 16.0),
    ("loss_risk.linger", 1.0),
    ("loss_risk.zoom", 2.0),
    ("loss_risk.time_scale", 0.3),
    ("loss_risk.zoom_duration", 0.4),
    ("loss_risk.restore_duration", 0.6),
];

/// In-memory tuning store seeded from [`DEFAULTS`].
#[derive(Debug)]
pub struct Tuning {
    values: HashMap<String, f32>,
    reported_missing: Mutex<HashSet<String>>,
}

impl Default for Tuning {
    fn default() -> Self {
        Self::from_pairs(DEFAULTS.iter().copied())
    }
}

impl Clone for Tuning {
    fn clone(&self) -> Self {
        Self {
            values: self.values.clone(),
            reported_missing: Mutex::default(),
        }
    }
}

impl Tuning {
    /// Creates a store holding only the given pairs.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, f32)>) -> Self {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.to_owned(), v))
                .collect(),
            reported_missing: Mutex::default(),
        }
    }

    /// Creates a store with every key present and set to `0.0`.
    ///
    /// Useful as a base when only a few behaviours should be active.
    #[must_use]
    pub fn disabled() -> Self {
        Self::from_pairs(DEFAULTS.iter().map(|&(k, _)| (k, 0.0)))
    }

    /// Loads defaults overlaid with the JSON document at `path`.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let text = fs::read_to_string(path_ref).map_err(|source| ConfigError::Io {
            path: path_ref.to_path_buf(),
            source,
        })?;
        let mut tuning = Self::default();
        tuning.merge_json(&text)?;
        Ok(tuning)
    }

    /// Overlays values from a JSON object.
    ///
    /// Nested objects are flattened into dotted keys, so
    /// `{"follower": {"cohere_radius": 80}}` sets `follower.cohere_radius`.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when the text is not a JSON object of numbers.
    pub fn merge_json(&mut self, text: &str) -> Result<(), ConfigError> {
        let root: Value = serde_json::from_str(text)?;
        let Value::Object(map) = root else {
            return Err(ConfigError::NotAnObject);
        };
        let mut flat = Vec::new();
        flatten_into(&mut flat, "", &map)?;
        self.values.extend(flat);
        Ok(())
    }

    /// Sets `name` to `value`, taking effect on the next tick.
    pub fn set(&mut self, name: &str, value: f32) {
        self.values.insert(name.to_owned(), value);
    }
}

fn flatten_into(
    out: &mut Vec<(String, f32)>,
    prefix: &str,
    map: &serde_json::Map<String, Value>,
) -> Result<(), ConfigError> {
    for (key, value) in map {
        let dotted = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Object(inner) => flatten_into(out, &dotted, inner)?,
            Value::Number(number) => {
                let Some(float) = number.as_f64() else {
                    return Err(ConfigError::NotANumber { key: dotted });
                };
                #[expect(
                    clippy::cast_possible_truncation,
                    reason = "Tuning values are authored at f32 precision."
                )]
                out.push((dotted, float as f32));
            }
            _ => return Err(ConfigError::NotANumber { key: dotted }),
        }
    }
    Ok(())
}

impl ConfigStore for Tuning {
    fn get(&self, name: &str) -> Option<f32> {
        let found = self.values.get(name).copied();
        if found.is_none() {
            let mut reported = self
                .reported_missing
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if reported.insert(name.to_owned()) {
                warn!("tuning key `{name}` is not set; treating it as 0");
            }
        }
        found
    }
}

/// Radius and weight of one steering behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Behaviour {
    /// Query radius in world units.
    pub radius: f32,
    /// Weight of the behaviour's unit vector; `0.0` disables it.
    pub factor: f32,
}

impl Behaviour {
    fn read<S: ConfigStore + ?Sized>(store: &S, prefix: &str, name: &str) -> Self {
        Self {
            radius: scalar(store, &format!("{prefix}.{name}_radius")),
            factor: scalar(store, &format!("{prefix}.{name}_factor")),
        }
    }

    /// Whether the behaviour should be evaluated at all.
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.factor > 0.0
    }
}

/// Follower steering parameters for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FollowerParams {
    /// Base steering acceleration.
    pub acceleration: f32,
    /// Base speed cap.
    pub max_velocity: f32,
    /// Seek the player.
    pub player: Behaviour,
    /// Steer toward nearby followers.
    pub cohere: Behaviour,
    /// Steer away from crowding followers and the player.
    pub spread: Behaviour,
    /// Steer away from obstacle tiles.
    pub obstacle: Behaviour,
    /// Steer away from nearby enemies.
    pub enemy: Behaviour,
    /// Flee the nearest enemy.
    pub killer: Behaviour,
    /// Extra acceleration while fleeing.
    pub flee_acceleration: f32,
    /// Extra speed cap while fleeing.
    pub flee_max_velocity: f32,
}

impl FollowerParams {
    /// Reads a fresh snapshot from `store`.
    pub fn read<S: ConfigStore + ?Sized>(store: &S) -> Self {
        const P: &str = "follower";
        Self {
            acceleration: scalar(store, "follower.acceleration"),
            max_velocity: scalar(store, "follower.max_velocity"),
            player: Behaviour::read(store, P, "player"),
            cohere: Behaviour::read(store, P, "cohere"),
            spread: Behaviour::read(store, P, "spread"),
            obstacle: Behaviour::read(store, P, "obstacle"),
            enemy: Behaviour::read(store, P, "enemy"),
            killer: Behaviour::read(store, P, "killer"),
            flee_acceleration: scalar(store, "follower.flee_acceleration"),
            flee_max_velocity: scalar(store, "follower.flee_max_velocity"),
        }
    }
}

/// Enemy steering parameters for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EnemyParams {
    /// Base steering acceleration.
    pub acceleration: f32,
    /// Base speed cap.
    pub max_velocity: f32,
    /// Steer away from the player.
    pub avoid_player: Behaviour,
    /// Steer toward the player.
    pub player: Behaviour,
    /// Steer toward nearby enemies.
    pub cohere: Behaviour,
    /// Steer away from crowding enemies.
    pub spread: Behaviour,
    /// Steer away from obstacle tiles other than safe zones.
    pub obstacle: Behaviour,
    /// Drift toward the centroid of nearby followers.
    pub follower: Behaviour,
    /// Pursue the nearest follower.
    pub victim: Behaviour,
    /// Extra acceleration while pursuing.
    pub pursue_acceleration: f32,
    /// Extra speed cap while pursuing.
    pub pursue_max_velocity: f32,
}

impl EnemyParams {
    /// Reads a fresh snapshot from `store`.
    pub fn read<S: ConfigStore + ?Sized>(store: &S) -> Self {
        const P: &str = "enemy";
        Self {
            acceleration: scalar(store, "enemy.acceleration"),
            max_velocity: scalar(store, "enemy.max_velocity"),
            avoid_player: Behaviour::read(store, P, "avoid_player"),
            player: Behaviour::read(store, P, "player"),
            cohere: Behaviour::read(store, P, "cohere"),
            spread: Behaviour::read(store, P, "spread"),
            obstacle: Behaviour::read(store, P, "obstacle"),
            follower: Behaviour::read(store, P, "follower"),
            victim: Behaviour::read(store, P, "victim"),
            pursue_acceleration: scalar(store, "enemy.pursue_acceleration"),
            pursue_max_velocity: scalar(store, "enemy.pursue_max_velocity"),
        }
    }
}

/// Velocity Governor parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GovernorParams {
    /// Fraction of the remaining gap closed per reference tick.
    pub lerp: f32,
    /// Nominal tick duration the lerp factor is expressed against.
    pub reference_dt: f32,
}

impl Default for GovernorParams {
    fn default() -> Self {
        Self {
            lerp: 0.1,
            reference_dt: REFERENCE_DT,
        }
    }
}

impl GovernorParams {
    /// Reads a fresh snapshot from `store`.
    pub fn read<S: ConfigStore + ?Sized>(store: &S) -> Self {
        Self {
            lerp: scalar(store, "governor.lerp"),
            reference_dt: scalar(store, "governor.reference_dt"),
        }
    }
}

/// Loss-Risk Controller parameters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LossRiskParams {
    /// Margin-adjusted distance below which a follower is endangered.
    pub threshold: f32,
    /// Body-size margin subtracted from centre distances.
    pub body_margin: f32,
    /// Seconds to hold the zoom after safety returns.
    pub linger: f32,
    /// Camera zoom while a follower is endangered.
    pub zoom: f32,
    /// Global time scale while a follower is endangered.
    pub time_scale: f32,
    /// Seconds taken to pan and zoom in.
    pub zoom_duration: f32,
    /// Seconds taken to restore the default framing.
    pub restore_duration: f32,
}

impl LossRiskParams {
    /// Reads a fresh snapshot from `store`.
    pub fn read<S: ConfigStore + ?Sized>(store: &S) -> Self {
        Self {
            threshold: scalar(store, "loss_risk.threshold"),
            body_margin: scalar(store, "loss_risk.body_margin"),
            linger: scalar(store, "loss_risk.linger"),
            zoom: scalar(store, "loss_risk.zoom"),
            time_scale: scalar(store, "loss_risk.time_scale"),
            zoom_duration: scalar(store, "loss_risk.zoom_duration"),
            restore_duration: scalar(store, "loss_risk.restore_duration"),
        }
    }
}

/// Player movement and per-kind physics parameters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionParams {
    /// Player acceleration while a direction is held.
    pub player_acceleration: f32,
    /// Player speed cap.
    pub player_max_velocity: f32,
    /// Fraction of velocity the player keeps after one second without input.
    pub player_drag: f32,
    /// Fraction of velocity a follower keeps after one second.
    pub follower_drag: f32,
    /// Fraction of velocity an enemy keeps after one second.
    pub enemy_drag: f32,
    /// Centre distance at which an enemy catches a follower.
    pub capture_radius: f32,
    /// Seconds an enemy stays inert after a catch.
    pub capture_cooldown: f32,
}

impl MotionParams {
    /// Reads a fresh snapshot from `store`.
    pub fn read<S: ConfigStore + ?Sized>(store: &S) -> Self {
        Self {
            player_acceleration: scalar(store, "player.acceleration"),
            player_max_velocity: scalar(store, "player.max_velocity"),
            player_drag: scalar(store, "player.drag"),
            follower_drag: scalar(store, "follower.drag"),
            enemy_drag: scalar(store, "enemy.drag"),
            capture_radius: scalar(store, "enemy.capture_radius"),
            capture_cooldown: scalar(store, "enemy.cooldown"),
        }
    }
}

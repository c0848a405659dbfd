//! Per-tick orchestration of the herding game.
//!
//! [`Simulation`] owns the active [`Level`] together with the state that lives
//! and dies with it (loss-risk controller, tween scheduler, camera) and runs
//! one fixed tick in the order the step functions expect:
//!
//! 1. player input
//! 2. follower steering, then enemy steering
//! 3. physics integration
//! 4. Velocity Governor
//! 5. captures, then the deferred removal flush
//! 6. Loss-Risk Controller
//! 7. tweens and camera, on unscaled time
//! 8. level-edge transitions
//!
//! Gameplay runs on `dt × time_scale`, so the loss-risk slow-down affects
//! agents but never the camera animation that announces it.
use glam::UVec2;
use log::{error, info};

use crate::agent::AgentId;
use crate::camera::CameraRig;
use crate::config::{ConfigStore, EnemyParams, FollowerParams, GovernorParams, MotionParams, Tuning};
use crate::governor::step_velocity_governor;
use crate::input::{drive_player, MoveIntent};
use crate::level::{Level, LevelError, LevelId, LevelSet, TileKind};
use crate::loss_risk::{step_loss_risk, LossRiskController, LossRiskEvent};
use crate::physics::step_physics;
use crate::steering::{steer_enemies, steer_followers};
use crate::transition::{resolve_transition, EntryPoint, TransitionRecord};
use crate::tween::Scheduler;
use crate::vector_math::closest;

/// What happened during one tick.
#[derive(Debug, Default)]
pub struct TickReport {
    /// Followers caught by enemies this tick.
    pub captured: Vec<AgentId>,
    /// Loss-risk notifications.
    pub loss_risk: Vec<LossRiskEvent>,
    /// A level-edge crossing resolved this tick.
    pub transition: Option<TransitionRecord>,
    /// The level that became active, if the crossing completed.
    pub entered: Option<LevelId>,
    /// Why a resolved crossing could not load its destination.
    pub load_error: Option<LevelError>,
}

/// Pairs each free enemy with a follower inside `capture_radius`.
///
/// Caught followers are marked for removal and the catching enemy enters
/// cooldown. A follower can only be caught once per tick.
pub fn resolve_captures(level: &mut Level, params: &MotionParams) -> Vec<AgentId> {
    let mut captured: Vec<AgentId> = Vec::new();
    let mut catchers: Vec<usize> = Vec::new();
    for (index, enemy) in level.enemies.iter().enumerate() {
        if enemy.in_cooldown() {
            continue;
        }
        let prey: Vec<_> = level
            .followers
            .iter()
            .filter(|f| !captured.contains(&f.id))
            .collect();
        let positions: Vec<_> = prey.iter().map(|f| f.position).collect();
        let Ok((nearest, distance)) = closest(&positions, enemy.position) else {
            break;
        };
        if distance > params.capture_radius {
            continue;
        }
        if let Some(victim) = prey.get(nearest) {
            captured.push(victim.id);
            catchers.push(index);
        }
    }
    for index in catchers {
        if let Some(enemy) = level.enemies.get_mut(index) {
            enemy.start_cooldown(params.capture_cooldown);
        }
    }
    for id in &captured {
        level.mark_removed(*id);
    }
    captured
}

/// The running game: level set, active level and its attached state.
#[derive(Debug)]
pub struct Simulation {
    levels: LevelSet,
    tuning: Tuning,
    level: Level,
    loss_risk: LossRiskController,
    scheduler: Scheduler,
    camera: CameraRig,
    intent: MoveIntent,
    blocked_tile: Option<UVec2>,
    ticks: u64,
}

impl Simulation {
    /// Starts on level `start` of `levels`.
    ///
    /// # Errors
    /// Returns [`LevelError`] when `start` is unknown or fails to build.
    pub fn new(levels: LevelSet, start: &LevelId, tuning: Tuning) -> Result<Self, LevelError> {
        let level = Level::from_spec(levels.get(start)?, &tuning, None)?;
        let camera = CameraRig::at(level.player.position);
        Ok(Self {
            levels,
            tuning,
            level,
            loss_risk: LossRiskController::new(),
            scheduler: Scheduler::new(),
            camera,
            intent: MoveIntent::default(),
            blocked_tile: None,
            ticks: 0,
        })
    }

    /// The active level.
    #[must_use]
    pub const fn level(&self) -> &Level {
        &self.level
    }

    /// Mutable access to the active level.
    pub fn level_mut(&mut self) -> &mut Level {
        &mut self.level
    }

    /// The tuning store, re-read every tick.
    #[must_use]
    pub const fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Mutable access to the tuning store for live edits.
    pub fn tuning_mut(&mut self) -> &mut Tuning {
        &mut self.tuning
    }

    /// Camera state.
    #[must_use]
    pub const fn camera(&self) -> &CameraRig {
        &self.camera
    }

    /// Loss-risk controller of the active level.
    #[must_use]
    pub const fn loss_risk(&self) -> &LossRiskController {
        &self.loss_risk
    }

    /// Number of ticks run so far.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Sets the player's movement intent for subsequent ticks.
    pub fn set_intent(&mut self, intent: MoveIntent) {
        self.intent = intent;
    }

    /// Replaces the active level, dropping all state attached to the old one.
    ///
    /// # Errors
    /// Returns [`LevelError`] when `id` is unknown or fails to build; the
    /// current level stays active in that case.
    pub fn load(&mut self, id: &LevelId, entry: Option<EntryPoint>) -> Result<(), LevelError> {
        let next = Level::from_spec(self.levels.get(id)?, &self.tuning, entry)?;
        info!("leaving level `{}` for `{id}`", self.level.id());
        self.level = next;
        self.loss_risk = LossRiskController::new();
        self.scheduler.clear();
        self.camera = CameraRig::at(self.level.player.position);
        self.blocked_tile = None;
        Ok(())
    }

    /// Runs one fixed tick of `dt` unscaled seconds.
    pub fn fixed_update(&mut self, dt: f32) -> TickReport {
        self.ticks += 1;
        let mut report = TickReport::default();
        let scaled = dt * self.camera.time_scale;
        let motion = MotionParams::read(&self.tuning);

        drive_player(
            &mut self.level.player,
            self.intent,
            motion.player_acceleration,
            motion.player_max_velocity,
        );
        for agent in self.level.followers.iter_mut().chain(&mut self.level.enemies) {
            agent.tick_cooldown(scaled);
        }

        steer_followers(&mut self.level, &self.tuning);
        steer_enemies(&mut self.level, &self.tuning);
        step_physics(&mut self.level, scaled, &motion);
        step_velocity_governor(&mut self.level, scaled, &GovernorParams::read(&self.tuning));

        report.captured = resolve_captures(&mut self.level, &motion);
        self.level.flush_removals();

        report.loss_risk = step_loss_risk(
            &mut self.loss_risk,
            &self.level,
            &self.tuning,
            &mut self.camera,
            &mut self.scheduler,
        );

        let samples = self.scheduler.advance(dt);
        self.camera.apply(&samples);
        self.camera.track(&self.level);

        self.check_transition(&mut report);
        report
    }

    fn check_transition(&mut self, report: &mut TickReport) {
        let under = self
            .level
            .tile_under(self.level.player.position)
            .filter(|tile| tile.kind == TileKind::Transition)
            .map(|tile| tile.coord);
        let Some(coord) = under else {
            self.blocked_tile = None;
            return;
        };
        if self.blocked_tile == Some(coord) {
            return;
        }

        let record = match resolve_transition(
            coord,
            &self.level.bounds(),
            self.level.player.position,
            self.level.exits(),
        ) {
            Ok(record) => record,
            Err(err) => {
                error!("ignoring transition tile: {err}");
                self.blocked_tile = Some(coord);
                return;
            }
        };

        match record.destination().cloned() {
            Ok(destination) => match self.load(&destination, Some(record.entry)) {
                Ok(()) => report.entered = Some(destination),
                Err(err) => {
                    error!("failed to enter level `{destination}`: {err}");
                    self.blocked_tile = Some(coord);
                    report.load_error = Some(err);
                }
            },
            Err(_) => self.blocked_tile = Some(coord),
        }
        report.transition = Some(record);
    }
}

/// Whether `store` keeps every steering behaviour switched off.
///
/// Used by diagnostics to explain why agents are idle.
#[must_use]
pub fn steering_disabled<S: ConfigStore + ?Sized>(store: &S) -> bool {
    let follower = FollowerParams::read(store);
    let enemy = EnemyParams::read(store);
    [
        follower.player,
        follower.cohere,
        follower.spread,
        follower.obstacle,
        follower.enemy,
        follower.killer,
        enemy.avoid_player,
        enemy.player,
        enemy.cohere,
        enemy.spread,
        enemy.obstacle,
        enemy.follower,
        enemy.victim,
    ]
    .iter()
    .all(|behaviour| !behaviour.enabled())
}

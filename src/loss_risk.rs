//! Loss-Risk Controller.
//!
//! Watches the gap between followers and enemies and raises a tension effect
//! when a follower is about to be caught: the camera leaves the player, pans
//! and zooms onto the most endangered follower, and gameplay slows down. When
//! the danger passes the effect lingers briefly, then eases back to normal.
//!
//! The controller is evaluated once per tick after physics, so it always sees
//! post-motion positions. It owns no animation itself; it drives the
//! [`CameraRig`] through the [`Scheduler`].
use glam::Vec2;
use log::{debug, info, warn};

use crate::agent::AgentId;
use crate::camera::{CameraRig, Focus};
use crate::config::{ConfigStore, LossRiskParams};
use crate::level::Level;
use crate::tween::{Channel, Scheduler, TimerId};
use crate::vector_math::closest;
use crate::{DEFAULT_TIME_SCALE, DEFAULT_ZOOM, HYSTERESIS_FACTOR};

/// Phase of the tension effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LossRiskPhase {
    /// Nothing is endangered; normal framing and pacing.
    #[default]
    Safe,
    /// Danger detected; the camera is still zooming in.
    AtRisk,
    /// Fully zoomed onto the endangered follower.
    Zoomed,
    /// Danger has passed; lingering, then easing back to normal.
    Recovering,
}

impl LossRiskPhase {
    /// Whether the controller is currently signalling risk.
    #[must_use]
    pub const fn is_signalling(self) -> bool {
        matches!(self, Self::AtRisk | Self::Zoomed)
    }
}

/// Snapshot recomputed every tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LossRiskState {
    /// Current phase.
    pub phase: LossRiskPhase,
    /// Smallest margin-adjusted follower-to-enemy distance, if both exist.
    pub min_distance: Option<f32>,
    /// Follower achieving `min_distance`.
    pub endangered_follower: Option<AgentId>,
    /// Enemy closest to that follower.
    pub nearest_enemy: Option<AgentId>,
}

/// Notable changes reported by [`LossRiskController::step`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LossRiskEvent {
    /// A follower came within the threshold while everything was safe.
    Endangered {
        /// The most endangered follower.
        follower: AgentId,
        /// Its nearest enemy.
        enemy: AgentId,
        /// Margin-adjusted distance between them.
        distance: f32,
    },
    /// A different follower became the most endangered.
    Retargeted {
        /// The new focus.
        follower: AgentId,
    },
    /// The last follower disappeared while risk was signalled.
    FinalFollowerLost {
        /// Where that follower was last seen.
        last_position: Vec2,
    },
    /// The effect has fully unwound.
    Recovered,
}

/// The follower most at risk this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assessment {
    /// Follower with the smallest margin-adjusted distance.
    pub follower: AgentId,
    /// Its position.
    pub follower_position: Vec2,
    /// Enemy nearest to it.
    pub enemy: AgentId,
    /// Distance between them minus the body margin.
    pub distance: f32,
}

/// Finds the follower closest to any enemy.
///
/// Ties keep the first follower in pool order. Returns `None` when either pool
/// is empty.
#[must_use]
pub fn most_endangered(level: &Level, body_margin: f32) -> Option<Assessment> {
    let enemy_positions: Vec<Vec2> = level.enemies.iter().map(|e| e.position).collect();
    let mut best: Option<Assessment> = None;
    for follower in &level.followers {
        let Ok((index, raw)) = closest(&enemy_positions, follower.position) else {
            return None;
        };
        let Some(enemy) = level.enemies.get(index) else {
            continue;
        };
        let distance = raw - body_margin;
        if best.is_none_or(|current| distance < current.distance) {
            best = Some(Assessment {
                follower: follower.id,
                follower_position: follower.position,
                enemy: enemy.id,
                distance,
            });
        }
    }
    best
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Recovery {
    Lingering(TimerId),
    Restoring,
}

/// Hysteretic state machine behind the tension effect.
///
/// Created with each level and dropped when it unloads.
#[derive(Debug, Clone, Default)]
pub struct LossRiskController {
    state: LossRiskState,
    recovery: Option<Recovery>,
    last_seen: Option<Vec2>,
    final_lost_reported: bool,
}

impl LossRiskController {
    /// A controller in the safe phase.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest snapshot.
    #[must_use]
    pub const fn state(&self) -> &LossRiskState {
        &self.state
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> LossRiskPhase {
        self.state.phase
    }

    fn set_phase(&mut self, phase: LossRiskPhase) {
        if self.state.phase != phase {
            info!("loss risk {:?} -> {phase:?}", self.state.phase);
            self.state.phase = phase;
        }
    }

    /// Re-evaluates the level and drives the camera accordingly.
    pub fn step(
        &mut self,
        level: &Level,
        params: &LossRiskParams,
        camera: &mut CameraRig,
        scheduler: &mut Scheduler,
    ) -> Vec<LossRiskEvent> {
        let mut events = Vec::new();

        if level.enemies.is_empty() {
            self.state.min_distance = None;
            self.state.endangered_follower = None;
            self.state.nearest_enemy = None;
            if self.state.phase != LossRiskPhase::Safe {
                self.finish(level, camera, scheduler, &mut events);
            }
            return events;
        }

        let assessment = most_endangered(level, params.body_margin);
        self.state.min_distance = assessment.map(|a| a.distance);
        self.state.endangered_follower = assessment.map(|a| a.follower);
        self.state.nearest_enemy = assessment.map(|a| a.enemy);

        let signalling = self.state.phase.is_signalling();
        let Some(found) = assessment else {
            if signalling {
                self.report_final_loss(&mut events);
            } else {
                self.recover(level, params, camera, scheduler, &mut events);
            }
            return events;
        };
        self.last_seen = Some(found.follower_position);

        let limit = if signalling {
            params.threshold * HYSTERESIS_FACTOR
        } else {
            params.threshold
        };

        if found.distance < limit {
            if signalling {
                self.hold(found, params, camera, scheduler, &mut events);
            } else {
                self.engage(found, params, camera, scheduler, &mut events);
            }
        } else if signalling {
            self.recovery = Some(Recovery::Lingering(scheduler.after(params.linger)));
            self.set_phase(LossRiskPhase::Recovering);
        } else {
            self.recover(level, params, camera, scheduler, &mut events);
        }
        events
    }

    fn engage(
        &mut self,
        found: Assessment,
        params: &LossRiskParams,
        camera: &mut CameraRig,
        scheduler: &mut Scheduler,
        events: &mut Vec<LossRiskEvent>,
    ) {
        if let Some(Recovery::Lingering(timer)) = self.recovery.take() {
            scheduler.cancel(timer);
        }
        let already_framed = camera.focus == Focus::Agent(found.follower);
        if !already_framed {
            camera.pan_to(Focus::Agent(found.follower), params.zoom_duration, scheduler);
        }
        camera.ease_to(params.zoom, params.time_scale, params.zoom_duration, scheduler);
        self.final_lost_reported = false;
        self.set_phase(LossRiskPhase::AtRisk);
        events.push(LossRiskEvent::Endangered {
            follower: found.follower,
            enemy: found.enemy,
            distance: found.distance,
        });
    }

    fn hold(
        &mut self,
        found: Assessment,
        params: &LossRiskParams,
        camera: &mut CameraRig,
        scheduler: &mut Scheduler,
        events: &mut Vec<LossRiskEvent>,
    ) {
        if camera.focus != Focus::Agent(found.follower) {
            debug!("loss risk retargeting to {:?}", found.follower);
            camera.pan_to(Focus::Agent(found.follower), params.zoom_duration, scheduler);
            events.push(LossRiskEvent::Retargeted {
                follower: found.follower,
            });
        }
        if self.state.phase == LossRiskPhase::AtRisk && scheduler.is_idle(Channel::Zoom) {
            self.set_phase(LossRiskPhase::Zoomed);
        }
    }

    fn recover(
        &mut self,
        level: &Level,
        params: &LossRiskParams,
        camera: &mut CameraRig,
        scheduler: &mut Scheduler,
        events: &mut Vec<LossRiskEvent>,
    ) {
        match self.recovery {
            Some(Recovery::Lingering(timer)) if scheduler.take_due(timer) => {
                camera.pan_to(Focus::Player, params.restore_duration, scheduler);
                camera.ease_to(
                    DEFAULT_ZOOM,
                    DEFAULT_TIME_SCALE,
                    params.restore_duration,
                    scheduler,
                );
                self.recovery = Some(Recovery::Restoring);
            }
            Some(Recovery::Restoring)
                if [Channel::Zoom, Channel::Pan, Channel::TimeScale]
                    .into_iter()
                    .all(|channel| scheduler.is_idle(channel)) =>
            {
                self.recovery = None;
                self.final_lost_reported = false;
                self.set_phase(LossRiskPhase::Safe);
                events.push(LossRiskEvent::Recovered);
            }
            None if self.state.phase == LossRiskPhase::Recovering => {
                self.finish(level, camera, scheduler, events);
            }
            _ => {}
        }
    }

    fn report_final_loss(&mut self, events: &mut Vec<LossRiskEvent>) {
        if self.final_lost_reported {
            return;
        }
        self.final_lost_reported = true;
        let last_position = self.last_seen.unwrap_or(Vec2::ZERO);
        warn!("final follower lost near {last_position}");
        events.push(LossRiskEvent::FinalFollowerLost { last_position });
    }

    fn finish(
        &mut self,
        level: &Level,
        camera: &mut CameraRig,
        scheduler: &mut Scheduler,
        events: &mut Vec<LossRiskEvent>,
    ) {
        if let Some(Recovery::Lingering(timer)) = self.recovery.take() {
            scheduler.cancel(timer);
        }
        camera.reset(level, scheduler);
        self.final_lost_reported = false;
        self.set_phase(LossRiskPhase::Safe);
        events.push(LossRiskEvent::Recovered);
    }
}

/// Runs one controller step with parameters read from `store`.
pub fn step_loss_risk<S: ConfigStore + ?Sized>(
    controller: &mut LossRiskController,
    level: &Level,
    store: &S,
    camera: &mut CameraRig,
    scheduler: &mut Scheduler,
) -> Vec<LossRiskEvent> {
    controller.step(level, &LossRiskParams::read(store), camera, scheduler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Tuning;
    use crate::level::LevelSpec;
    use approx::assert_relative_eq;
    use rstest::{fixture, rstest};

    fn level(rows: &[&str]) -> Level {
        let spec = LevelSpec {
            id: "pasture".to_owned(),
            rows: rows.iter().map(|&r| r.to_owned()).collect(),
            exits: std::collections::BTreeMap::new(),
            tile_width: 10.0,
            tile_height: 10.0,
        };
        Level::from_spec(&spec, &Tuning::default(), None)
            .unwrap_or_else(|e| panic!("test level should parse: {e}"))
    }

    fn place_enemy(level: &mut Level, x: f32) {
        if let Some(enemy) = level.enemies.first_mut() {
            enemy.position = Vec2::new(x, 5.0);
        }
    }

    #[fixture]
    fn params() -> LossRiskParams {
        LossRiskParams {
            threshold: 100.0,
            body_margin: 0.0,
            linger: 0.5,
            zoom: 2.0,
            time_scale: 0.25,
            zoom_duration: 0.2,
            restore_duration: 0.2,
        }
    }

    struct Harness {
        controller: LossRiskController,
        camera: CameraRig,
        scheduler: Scheduler,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                controller: LossRiskController::new(),
                camera: CameraRig::default(),
                scheduler: Scheduler::new(),
            }
        }

        fn tick(&mut self, level: &Level, params: &LossRiskParams, dt: f32) -> Vec<LossRiskEvent> {
            let events = self
                .controller
                .step(level, params, &mut self.camera, &mut self.scheduler);
            let samples = self.scheduler.advance(dt);
            self.camera.apply(&samples);
            self.camera.track(level);
            events
        }
    }

    #[test]
    fn ties_keep_the_first_follower() {
        let level = level(&["+.x.+@"]);
        let found = most_endangered(&level, 5.0)
            .unwrap_or_else(|| panic!("both pools are populated"));
        assert_eq!(Some(found.follower), level.followers.first().map(|f| f.id));
        assert_relative_eq!(found.distance, 15.0);
    }

    #[rstest]
    fn close_enemy_raises_risk_and_removal_restores_safety(params: LossRiskParams) {
        let mut level = level(&["@+....x..."]);
        place_enemy(&mut level, 65.0);
        let mut harness = Harness::new();

        let events = harness.tick(&level, &params, 0.1);
        assert!(matches!(
            events.as_slice(),
            [LossRiskEvent::Endangered { distance, .. }] if (*distance - 50.0).abs() < 1e-4
        ));
        assert!(harness.controller.phase().is_signalling());
        assert!(!harness.camera.follows_player());

        level.enemies.clear();
        let events = harness.tick(&level, &params, 0.1);
        assert_eq!(harness.controller.phase(), LossRiskPhase::Safe);
        assert_eq!(events, vec![LossRiskEvent::Recovered]);
        assert!(harness.camera.follows_player());
        assert_relative_eq!(harness.camera.time_scale, DEFAULT_TIME_SCALE);
    }

    #[rstest]
    fn zoom_completion_moves_to_zoomed(params: LossRiskParams) {
        let mut level = level(&["@+....x..."]);
        place_enemy(&mut level, 65.0);
        let mut harness = Harness::new();
        harness.tick(&level, &params, 0.1);
        assert_eq!(harness.controller.phase(), LossRiskPhase::AtRisk);
        harness.tick(&level, &params, 0.2);
        harness.tick(&level, &params, 0.1);
        assert_eq!(harness.controller.phase(), LossRiskPhase::Zoomed);
        assert_relative_eq!(harness.camera.zoom, 2.0);
        assert_relative_eq!(harness.camera.time_scale, 0.25);
    }

    #[rstest]
    fn hysteresis_holds_risk_between_one_and_two_thresholds(params: LossRiskParams) {
        let mut level = level(&["@+....x..........................."]);
        place_enemy(&mut level, 65.0);
        let mut harness = Harness::new();
        harness.tick(&level, &params, 0.5);
        harness.tick(&level, &params, 0.5);
        assert_eq!(harness.controller.phase(), LossRiskPhase::Zoomed);

        place_enemy(&mut level, 165.0);
        harness.tick(&level, &params, 0.1);
        assert_ne!(harness.controller.phase(), LossRiskPhase::Safe);
        assert!(harness.controller.phase().is_signalling());

        place_enemy(&mut level, 265.0);
        harness.tick(&level, &params, 0.1);
        assert_eq!(harness.controller.phase(), LossRiskPhase::Recovering);
    }

    #[rstest]
    fn safe_controller_uses_the_plain_threshold(params: LossRiskParams) {
        let mut level = level(&["@+....x..........................."]);
        place_enemy(&mut level, 165.0);
        let mut harness = Harness::new();
        let events = harness.tick(&level, &params, 0.1);
        assert!(events.is_empty());
        assert_eq!(harness.controller.phase(), LossRiskPhase::Safe);
    }

    #[rstest]
    fn recovery_lingers_then_eases_back(params: LossRiskParams) {
        let mut level = level(&["@+....x..........................."]);
        place_enemy(&mut level, 65.0);
        let mut harness = Harness::new();
        harness.tick(&level, &params, 0.3);

        place_enemy(&mut level, 300.0);
        harness.tick(&level, &params, 0.3);
        assert_eq!(harness.controller.phase(), LossRiskPhase::Recovering);
        harness.tick(&level, &params, 0.3);
        assert_eq!(harness.controller.phase(), LossRiskPhase::Recovering);

        // Linger elapsed: restore tweens start.
        harness.tick(&level, &params, 0.3);
        assert!(harness.camera.follows_player());
        let events = harness.tick(&level, &params, 0.1);
        assert_eq!(events, vec![LossRiskEvent::Recovered]);
        assert_eq!(harness.controller.phase(), LossRiskPhase::Safe);
        assert_relative_eq!(harness.camera.zoom, DEFAULT_ZOOM);
    }

    #[rstest]
    fn renewed_danger_during_recovery_re_engages(params: LossRiskParams) {
        let mut level = level(&["@+....x..........................."]);
        place_enemy(&mut level, 65.0);
        let mut harness = Harness::new();
        harness.tick(&level, &params, 0.3);
        place_enemy(&mut level, 300.0);
        harness.tick(&level, &params, 0.1);
        assert_eq!(harness.controller.phase(), LossRiskPhase::Recovering);

        place_enemy(&mut level, 65.0);
        let events = harness.tick(&level, &params, 0.1);
        assert!(matches!(events.as_slice(), [LossRiskEvent::Endangered { .. }]));
        assert_eq!(harness.controller.phase(), LossRiskPhase::AtRisk);
    }

    #[rstest]
    fn closer_follower_takes_the_focus(params: LossRiskParams) {
        let mut level = level(&["@+...x..+........................."]);
        place_enemy(&mut level, 45.0);
        let mut harness = Harness::new();
        harness.tick(&level, &params, 0.1);
        let first = level.followers.first().map(|f| f.id);
        assert_eq!(harness.controller.state().endangered_follower, first);

        place_enemy(&mut level, 80.0);
        let events = harness.tick(&level, &params, 0.1);
        let second = level
            .followers
            .get(1)
            .map(|f| f.id)
            .unwrap_or_else(|| panic!("two followers"));
        assert_eq!(events, vec![LossRiskEvent::Retargeted { follower: second }]);
    }

    #[rstest]
    fn losing_the_last_follower_keeps_the_zoom(params: LossRiskParams) {
        let mut level = level(&["@+....x..."]);
        place_enemy(&mut level, 65.0);
        let mut harness = Harness::new();
        harness.tick(&level, &params, 0.5);

        level.followers.clear();
        let events = harness.tick(&level, &params, 0.5);
        assert_eq!(
            events,
            vec![LossRiskEvent::FinalFollowerLost {
                last_position: Vec2::new(15.0, 5.0)
            }]
        );
        assert!(harness.controller.phase().is_signalling());
        assert!(harness.tick(&level, &params, 0.5).is_empty());
        assert_eq!(harness.camera.position, Vec2::new(15.0, 5.0));
    }
}

//! Behavioural test: the loss-risk effect engages, holds and unwinds.
//!
//! Agents are frozen (every speed cap is zero) so only the enemy positions
//! the scenarios set decide what the controller sees.

#[path = "support/rspec_runner.rs"]
mod rspec_runner;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use glam::Vec2;
use rspec::block::Context as Scenario;
use rspec_runner::run_serial;
use sheepdog::camera::Focus;
use sheepdog::{LevelId, LevelSet, LossRiskEvent, LossRiskPhase, Simulation, REFERENCE_DT};
use test_utils::levels::{level_spec, tuning_with};

/// Ticks comfortably longer than the zoom tween.
const ZOOM_TICKS: usize = 30;
/// Ticks comfortably longer than linger plus restore.
const RECOVERY_TICKS: usize = 90;

/// Fixture owning a simulation with one follower and one enemy.
#[derive(Debug, Clone)]
struct LossRiskFixture {
    simulation: Arc<Mutex<Simulation>>,
    events: Arc<Mutex<Vec<LossRiskEvent>>>,
}

fn build_simulation() -> Simulation {
    // Follower at x = 25, enemy at x = 55: 30 units apart.
    let levels = LevelSet::new([level_spec(
        "pasture",
        &["@.+..x........................"],
        &[],
    )]);
    let tuning = tuning_with(&[
        ("loss_risk.threshold", 48.0),
        ("loss_risk.body_margin", 0.0),
        ("loss_risk.linger", 0.5),
        ("loss_risk.zoom", 2.0),
        ("loss_risk.time_scale", 0.5),
        ("loss_risk.zoom_duration", 0.2),
        ("loss_risk.restore_duration", 0.2),
    ]);
    Simulation::new(levels, &LevelId::from("pasture"), tuning)
        .unwrap_or_else(|e| panic!("test level should load: {e}"))
}

impl LossRiskFixture {
    fn bootstrap() -> Self {
        Self {
            simulation: Arc::new(Mutex::new(build_simulation())),
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn simulation(&self) -> MutexGuard<'_, Simulation> {
        self.simulation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn events(&self) -> MutexGuard<'_, Vec<LossRiskEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts the scenario over on a fresh simulation.
    fn reset(&self) {
        *self.simulation() = build_simulation();
        self.events().clear();
    }

    fn run(&self, ticks: usize) {
        for _ in 0..ticks {
            let report = self.simulation().fixed_update(REFERENCE_DT);
            self.events().extend(report.loss_risk);
        }
    }

    fn move_enemy_to(&self, x: f32) {
        let mut sim = self.simulation();
        for enemy in &mut sim.level_mut().enemies {
            enemy.position.x = x;
        }
    }

    fn remove_enemies(&self) {
        self.simulation().level_mut().enemies.clear();
    }

    fn phase(&self) -> LossRiskPhase {
        self.simulation().loss_risk().phase()
    }

    fn count(&self, predicate: impl Fn(&LossRiskEvent) -> bool) -> usize {
        self.events().iter().filter(|&event| predicate(event)).count()
    }
}

fn engage(scenario: &mut Scenario<LossRiskFixture>) {
    scenario.when("an enemy closes within the threshold", |ctx| {
        ctx.before_each(|state| {
            state.reset();
            state.run(1);
        });

        ctx.then("the effect engages once and frames the follower", |state| {
            assert_eq!(state.phase(), LossRiskPhase::AtRisk);
            assert_eq!(
                state.count(|e| matches!(e, LossRiskEvent::Endangered { .. })),
                1
            );
            let sim = state.simulation();
            let follower = sim.level().followers.first().map(|f| f.id);
            assert_eq!(
                Some(sim.camera().focus),
                follower.map(Focus::Agent),
                "camera should focus the endangered follower"
            );
        });
    });

    scenario.when("the zoom tween completes", |ctx| {
        ctx.before_each(|state| {
            state.reset();
            state.run(ZOOM_TICKS);
        });

        ctx.then("the controller reports the zoomed phase", |state| {
            assert_eq!(state.phase(), LossRiskPhase::Zoomed);
            let sim = state.simulation();
            assert!((sim.camera().zoom - 2.0).abs() < 1e-3);
            assert!((sim.camera().time_scale - 0.5).abs() < 1e-3);
        });
    });
}

fn hysteresis(scenario: &mut Scenario<LossRiskFixture>) {
    scenario.when("the enemy backs off inside twice the threshold", |ctx| {
        ctx.before_each(|state| {
            state.reset();
            state.run(ZOOM_TICKS);
            // 70 units apart: above 48 but under the hysteretic 96.
            state.move_enemy_to(95.0);
            state.run(5);
        });

        ctx.then("risk stays signalled", |state| {
            assert_eq!(state.phase(), LossRiskPhase::Zoomed);
            assert_eq!(state.count(|e| *e == LossRiskEvent::Recovered), 0);
        });
    });

    scenario.when("the enemy backs off beyond twice the threshold", |ctx| {
        ctx.before_each(|state| {
            state.reset();
            state.run(ZOOM_TICKS);
            state.move_enemy_to(295.0);
            state.run(1);
        });

        ctx.then("the controller starts recovering", |state| {
            assert_eq!(state.phase(), LossRiskPhase::Recovering);
        });
    });
}

fn recovery(scenario: &mut Scenario<LossRiskFixture>) {
    scenario.when("the danger stays away long enough", |ctx| {
        ctx.before_each(|state| {
            state.reset();
            state.run(ZOOM_TICKS);
            state.move_enemy_to(295.0);
            state.run(RECOVERY_TICKS);
        });

        ctx.then("the camera returns to the player at normal pace", |state| {
            assert_eq!(state.phase(), LossRiskPhase::Safe);
            assert_eq!(state.count(|e| *e == LossRiskEvent::Recovered), 1);
            let sim = state.simulation();
            assert_eq!(sim.camera().focus, Focus::Player);
            assert!((sim.camera().zoom - 1.0).abs() < 1e-3);
            assert!((sim.camera().time_scale - 1.0).abs() < 1e-3);
        });
    });

    scenario.when("every enemy disappears", |ctx| {
        ctx.before_each(|state| {
            state.reset();
            state.run(ZOOM_TICKS);
            state.remove_enemies();
            state.run(1);
        });

        ctx.then("the effect resets immediately", |state| {
            assert_eq!(state.phase(), LossRiskPhase::Safe);
            assert_eq!(state.count(|e| *e == LossRiskEvent::Recovered), 1);
            let sim = state.simulation();
            assert_eq!(sim.camera().focus, Focus::Player);
            assert_eq!(sim.loss_risk().state().min_distance, None);
        });
    });
}

fn final_loss(scenario: &mut Scenario<LossRiskFixture>) {
    scenario.when("the last follower vanishes while zoomed", |ctx| {
        ctx.before_each(|state| {
            state.reset();
            state.run(ZOOM_TICKS);
            state.simulation().level_mut().followers.clear();
            state.run(3);
        });

        ctx.then("the loss is reported once at its last position", |state| {
            let reported: Vec<Vec2> = state
                .events()
                .iter()
                .filter_map(|e| match e {
                    LossRiskEvent::FinalFollowerLost { last_position } => Some(*last_position),
                    _ => None,
                })
                .collect();
            assert_eq!(reported, vec![Vec2::new(25.0, 5.0)]);
            assert!(state.phase().is_signalling());
        });
    });
}

#[test]
fn loss_risk_effect_lifecycle() {
    let fixture = LossRiskFixture::bootstrap();

    run_serial(&rspec::given(
        "a follower grazing next to an enemy",
        fixture,
        |scenario: &mut Scenario<LossRiskFixture>| {
            engage(scenario);
            hysteresis(scenario);
            recovery(scenario);
            final_loss(scenario);
        },
    ));
}

//! Bevy plugin running the herding simulation on the fixed schedule.
//!
//! The simulation itself is engine-agnostic; this module only hosts it. One
//! [`Simulation`] tick runs per `FixedUpdate`, the camera rig is mirrored onto
//! the entity tagged [`CameraController`], and failures are surfaced as
//! [`SheepdogError`] events that an observer logs.

use bevy::ecs::prelude::On;
use bevy::prelude::*;
use log::{error, warn};
use thiserror::Error;

use crate::camera::CameraRig;
use crate::config::Tuning;
use crate::input::MoveIntent;
use crate::level::{LevelId, LevelSet};
use crate::loss_risk::LossRiskEvent;
use crate::simulation::Simulation;
use crate::REFERENCE_DT;

/// Marker component for the camera driven by the simulation.
#[derive(Component, Reflect, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[reflect(Component, Default)]
pub struct CameraController;

/// Player movement intent fed into the next simulation tick.
///
/// Hosts translate their own input devices into this resource.
#[derive(Resource, Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveInput(pub MoveIntent);

/// Where a [`SheepdogError`] arose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheepdogErrorContext {
    /// Building the simulation when the plugin was added.
    Init,
    /// Loading a destination level after a crossing.
    LevelLoad,
}

/// Event raised when the simulation hits an error path.
#[derive(Event, Debug, Clone, Error)]
#[error("{context:?}: {detail}")]
pub struct SheepdogError {
    /// Where the failure occurred.
    pub context: SheepdogErrorContext,
    /// Description of the underlying error.
    pub detail: String,
}

impl SheepdogError {
    /// Convenience constructor used by systems to emit error events.
    pub fn new(context: SheepdogErrorContext, detail: impl Into<String>) -> Self {
        Self {
            context,
            detail: detail.into(),
        }
    }
}

/// Event raised when the last follower is caught while risk is signalled.
///
/// Hosts use it to start their level-loss flow.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct FinalFollowerLost {
    /// Where the follower was last seen.
    pub last_position: Vec2,
}

/// The hosted simulation plus running totals for diagnostics.
#[derive(Resource, Debug)]
pub struct SimulationState {
    /// The simulation advanced by [`simulation_tick_system`].
    pub simulation: Simulation,
    /// Followers caught since the plugin started.
    pub captured: usize,
    /// Levels entered through edge crossings, oldest first.
    pub entered: Vec<LevelId>,
}

impl SimulationState {
    /// Wraps a freshly built simulation.
    #[must_use]
    pub const fn new(simulation: Simulation) -> Self {
        Self {
            simulation,
            captured: 0,
            entered: Vec::new(),
        }
    }
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "Observer systems must accept On<T> by value for Events V2."
)]
fn log_sheepdog_error(event: On<SheepdogError>) {
    let SheepdogError { context, detail } = event.event();
    error!("sheepdog error during {context:?}: {detail}");
}

/// Advances the simulation by one fixed step.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy systems require parameters by value, not by reference."
)]
pub fn simulation_tick_system(
    mut state: ResMut<SimulationState>,
    input: Res<MoveInput>,
    time: Res<Time>,
    mut commands: Commands,
) {
    state.simulation.set_intent(input.0);
    let report = state.simulation.fixed_update(time.delta_secs());

    state.captured += report.captured.len();
    if let Some(id) = report.entered {
        state.entered.push(id);
    }
    if let Some(err) = report.load_error {
        commands.trigger(SheepdogError::new(
            SheepdogErrorContext::LevelLoad,
            err.to_string(),
        ));
    }
    for event in report.loss_risk {
        if let LossRiskEvent::FinalFollowerLost { last_position } = event {
            commands.trigger(FinalFollowerLost { last_position });
        }
    }
}

/// Maps the rig onto a transform: world rows grow downward, Bevy's `y` grows
/// upward, and zooming in shrinks the camera scale.
#[must_use]
pub fn camera_transform(rig: &CameraRig) -> Transform {
    let zoom = if rig.zoom > 0.0 { rig.zoom } else { 1.0 };
    Transform::from_xyz(rig.position.x, -rig.position.y, 0.0)
        .with_scale(Vec3::new(1.0 / zoom, 1.0 / zoom, 1.0))
}

/// Mirrors the simulation camera onto every [`CameraController`] entity.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy systems require parameters by value, not by reference."
)]
pub fn sync_camera_system(
    state: Res<SimulationState>,
    mut cameras: Query<&mut Transform, With<CameraController>>,
) {
    let target = camera_transform(state.simulation.camera());
    for mut transform in &mut cameras {
        *transform = target;
    }
}

/// Spawns the controlled camera entity if the host has not provided one.
fn camera_setup(mut commands: Commands, cameras: Query<&CameraController>) {
    if cameras.is_empty() {
        commands.spawn((
            CameraController,
            Transform::default(),
            Name::new("SheepdogCamera"),
        ));
    }
}

/// Plugin hosting the herding simulation.
///
/// # Examples
///
/// ```ignore
/// use bevy::prelude::*;
/// use sheepdog::{LevelId, LevelSet, SheepdogPlugin, Tuning};
///
/// let levels = LevelSet::from_path("levels.json")?;
/// App::new()
///     .add_plugins(MinimalPlugins)
///     .add_plugins(SheepdogPlugin::new(levels, LevelId::from("meadow"), Tuning::default()))
///     .run();
/// ```
#[derive(Debug, Clone)]
pub struct SheepdogPlugin {
    levels: LevelSet,
    start: LevelId,
    tuning: Tuning,
}

impl SheepdogPlugin {
    /// Configures the plugin to start on `start` of `levels`.
    #[must_use]
    pub const fn new(levels: LevelSet, start: LevelId, tuning: Tuning) -> Self {
        Self {
            levels,
            start,
            tuning,
        }
    }
}

impl Plugin for SheepdogPlugin {
    fn build(&self, app: &mut App) {
        app.add_observer(log_sheepdog_error);

        let simulation = match Simulation::new(
            self.levels.clone(),
            &self.start,
            self.tuning.clone(),
        ) {
            Ok(simulation) => simulation,
            Err(e) => {
                warn!("sheepdog plugin disabled: start level failed to load");
                app.world_mut()
                    .trigger(SheepdogError::new(SheepdogErrorContext::Init, e.to_string()));
                return;
            }
        };

        app.register_type::<CameraController>();
        app.insert_resource(SimulationState::new(simulation));
        app.init_resource::<MoveInput>();
        app.insert_resource(Time::<Fixed>::from_seconds(f64::from(REFERENCE_DT)));
        app.add_systems(Startup, camera_setup);
        app.add_systems(FixedUpdate, simulation_tick_system);
        app.add_systems(Update, sync_camera_system);
    }
}

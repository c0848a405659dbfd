//! Camera framing and global time scale.
//!
//! [`CameraRig`] is the engine-agnostic camera: what it looks at, how far it
//! is zoomed, and how fast gameplay runs. Tween samples from the
//! [`Scheduler`](crate::tween::Scheduler) move zoom, time scale and pan
//! progress; [`CameraRig::track`] then places the camera between its previous
//! framing and the live position of its focus.
use glam::Vec2;

use crate::agent::AgentId;
use crate::level::Level;
use crate::tween::{Channel, Ease, Sample, Scheduler, Tween};
use crate::{DEFAULT_TIME_SCALE, DEFAULT_ZOOM};

/// What the camera keeps in frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Focus {
    /// Normal gameplay: follow the player.
    Player,
    /// Follow a specific agent, holding its last position once it is gone.
    Agent(AgentId),
}

/// Engine-agnostic camera state.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraRig {
    /// Current focus.
    pub focus: Focus,
    /// World position at the centre of the view.
    pub position: Vec2,
    /// Zoom factor; larger values magnify.
    pub zoom: f32,
    /// Multiplier applied to gameplay time.
    pub time_scale: f32,
    pan_from: Vec2,
    pan_progress: f32,
    last_target: Vec2,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self::at(Vec2::ZERO)
    }
}

impl CameraRig {
    /// A rig following the player, currently framed on `position`.
    #[must_use]
    pub const fn at(position: Vec2) -> Self {
        Self {
            focus: Focus::Player,
            position,
            zoom: DEFAULT_ZOOM,
            time_scale: DEFAULT_TIME_SCALE,
            pan_from: position,
            pan_progress: 1.0,
            last_target: position,
        }
    }

    /// Whether the camera is following the player.
    #[must_use]
    pub fn follows_player(&self) -> bool {
        self.focus == Focus::Player
    }

    /// Switches focus, panning from the current framing over `duration`.
    pub fn pan_to(&mut self, focus: Focus, duration: f32, scheduler: &mut Scheduler) {
        self.focus = focus;
        self.pan_from = self.position;
        self.pan_progress = 0.0;
        scheduler.animate(Channel::Pan, Tween::new(0.0, 1.0, duration, Ease::QuadInOut));
    }

    /// Tweens zoom and time scale toward the given values.
    pub fn ease_to(&mut self, zoom: f32, time_scale: f32, duration: f32, scheduler: &mut Scheduler) {
        scheduler.animate(
            Channel::Zoom,
            Tween::new(self.zoom, zoom, duration, Ease::QuadOut),
        );
        scheduler.animate(
            Channel::TimeScale,
            Tween::new(self.time_scale, time_scale, duration, Ease::Linear),
        );
    }

    /// Applies tween samples produced by the scheduler.
    pub fn apply(&mut self, samples: &[Sample]) {
        for sample in samples {
            match sample.channel {
                Channel::Zoom => self.zoom = sample.value,
                Channel::Pan => self.pan_progress = sample.value,
                Channel::TimeScale => self.time_scale = sample.value.max(0.0),
            }
        }
    }

    /// Recomputes the camera position from the focus in `level`.
    pub fn track(&mut self, level: &Level) {
        let target = match self.focus {
            Focus::Player => Some(level.player.position),
            Focus::Agent(id) => level.agent(id).map(|agent| agent.position),
        };
        if let Some(found) = target {
            self.last_target = found;
        }
        self.position = self.pan_from.lerp(self.last_target, self.pan_progress);
    }

    /// Snaps back to default framing on the player, stopping any effects.
    pub fn reset(&mut self, level: &Level, scheduler: &mut Scheduler) {
        for channel in [Channel::Zoom, Channel::Pan, Channel::TimeScale] {
            scheduler.stop(channel);
        }
        *self = Self::at(level.player.position);
    }
}

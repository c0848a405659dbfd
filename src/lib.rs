#![cfg_attr(docsrs, feature(doc_cfg))]
//! Library crate providing the core Sheepdog game logic.
//!
//! A player herds followers through tile-based levels past roaming enemies.
//! The step functions here are engine-agnostic and operate on an explicit
//! [`Level`]; [`SheepdogPlugin`] hosts them inside a Bevy app.
pub mod agent;
pub mod camera;
pub mod config;
pub mod constants;
pub mod governor;
pub mod input;
pub mod level;
pub mod logging;
pub mod loss_risk;
pub mod physics;
pub mod plugin;
pub mod proximity;
pub mod simulation;
pub mod steering;
pub mod transition;
pub mod tween;
pub mod vector_math;
pub use constants::*;

// Re-export commonly used items
pub use agent::{Agent, AgentId, AgentKind};
pub use camera::{CameraRig, Focus};
pub use config::{ConfigStore, Tuning};
pub use governor::step_velocity_governor;
pub use level::{Level, LevelError, LevelId, LevelSet, LevelSpec};
pub use logging::init as init_logging;
pub use loss_risk::{step_loss_risk, LossRiskController, LossRiskEvent, LossRiskPhase};
pub use plugin::{CameraController, MoveInput, SheepdogPlugin, SimulationState};
pub use proximity::{LevelProximity, Proximity};
pub use simulation::{Simulation, TickReport};
pub use steering::{steer_enemies, steer_followers};
pub use transition::{resolve_transition, Direction, TransitionRecord};

pub mod prelude {
    //! Prelude exports used in documentation examples.
    //!
    //! ```rust,no_run
    //! use sheepdog::prelude::*;
    //! ```

    pub use crate::input::MoveIntent;
    pub use crate::step_velocity_governor;
    pub use crate::Level;
    pub use crate::LevelSet;
    pub use crate::Simulation;
    pub use crate::Tuning;
    pub use crate::{steer_enemies, steer_followers};
}

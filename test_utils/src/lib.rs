//! Shared fixtures for Sheepdog tests.
//!
//! Level builders keep test maps readable as glyph rows, and the error
//! capture records `SheepdogError` events raised inside a Bevy app.
pub mod errors;
pub mod levels;

pub use errors::{install_error_observer, CapturedErrors};
pub use levels::{agent_at, level_from_rows, level_spec, tuning_with};

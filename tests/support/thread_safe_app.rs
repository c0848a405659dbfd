//! Bevy `App` wrapper that can live inside an rspec fixture.

use bevy::prelude::App;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// An `App` that is only ever touched through [`SharedApp`]'s mutex.
#[derive(Debug)]
pub struct ThreadSafeApp(pub App);

impl Deref for ThreadSafeApp {
    type Target = App;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for ThreadSafeApp {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

// SAFETY: rspec requires fixtures to be `Send + Sync` but `run_serial` drives
// every example on the test thread, and each access goes through the mutex in
// `SharedApp`. The app is never observed from two threads at once.
unsafe impl Send for ThreadSafeApp {}
unsafe impl Sync for ThreadSafeApp {}

/// Fixture handle for a headless app running `SheepdogPlugin`.
pub type SharedApp = Arc<Mutex<ThreadSafeApp>>;

/// Locks `app`, continuing past a poisoned mutex left by a failed example.
pub fn lock_app(app: &SharedApp) -> MutexGuard<'_, ThreadSafeApp> {
    app.lock().unwrap_or_else(PoisonError::into_inner)
}

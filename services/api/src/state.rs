//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds the shared resources
//! created once at startup: the agent runner and the warm session pool.

use crate::warm::SessionWarmer;
use flight_core::runner::Runner;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub runner: Arc<Runner>,
    pub warmer: Arc<SessionWarmer>,
}

//! Flight Agent Core
//!
//! The building blocks shared by the flight service: the agent runtime
//! abstraction and its event vocabulary, the session store, the runner that
//! ties runs to live sessions, and the Gemini-backed agent implementation.

pub mod agent;
pub mod gemini;
pub mod runner;
pub mod session;

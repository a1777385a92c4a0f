//! Flight Agent API Library Crate
//!
//! This library contains the web service around the flight agent: configuration,
//! the warm session pool, the request handler, and routing. The `api` binary is
//! a thin wrapper around this library.

pub mod config;
pub mod handlers;
pub mod models;
pub mod router;
pub mod state;
pub mod warm;

#[cfg(test)]
mod test_support;

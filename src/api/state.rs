//! Application state for the roster engine API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use crate::config::PolicyLoader;
use crate::engine::Engine;

/// Shared application state.
///
/// Contains resources that are shared across all request handlers:
/// the engine (with its store, directory, and presence sink) and the
/// loaded entitlement policy.
#[derive(Clone)]
pub struct AppState {
    /// The engine driving every mutation and query.
    engine: Arc<Engine>,
    /// The loaded entitlement policy.
    policy: Arc<PolicyLoader>,
}

impl AppState {
    /// Creates a new application state with the given engine and policy loader.
    pub fn new(engine: Engine, policy: PolicyLoader) -> Self {
        Self {
            engine: Arc::new(engine),
            policy: Arc::new(policy),
        }
    }

    /// Returns a reference to the engine.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Returns a reference to the policy loader.
    pub fn policy(&self) -> &PolicyLoader {
        &self.policy
    }
}

//! Policy configuration for the workforce engine.
//!
//! Entitlement defaults, proration factors, and rounding precision are
//! explicit values loaded once from YAML and passed into engine calls,
//! never ambient process-wide state.
//!
//! # Example
//!
//! ```no_run
//! use roster_engine::config::PolicyLoader;
//!
//! let policy = PolicyLoader::load("./config/roster").unwrap();
//! println!("Default entitlement: {} days", policy.policy().default_vacation_days);
//! ```

mod loader;
mod types;

pub use loader::PolicyLoader;
pub use types::EnginePolicy;

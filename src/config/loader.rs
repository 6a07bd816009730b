//! Policy loading functionality.

use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};

use super::types::EnginePolicy;

/// Loads and provides access to the engine policy.
///
/// # Directory Structure
///
/// ```text
/// config/roster/
/// └── policy.yaml   # Entitlement defaults and rounding precision
/// ```
///
/// # Example
///
/// ```no_run
/// use roster_engine::config::PolicyLoader;
///
/// let loader = PolicyLoader::load("./config/roster")?;
/// let policy = loader.policy();
/// # Ok::<(), roster_engine::error::EngineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct PolicyLoader {
    policy: EnginePolicy,
}

impl PolicyLoader {
    /// Loads the policy from the specified directory.
    ///
    /// Returns an error if `policy.yaml` is missing or contains invalid
    /// YAML.
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let policy_path = path.as_ref().join("policy.yaml");
        let path_str = policy_path.display().to_string();

        let contents = fs::read_to_string(&policy_path).map_err(|_| EngineError::PolicyNotFound {
            path: path_str.clone(),
        })?;

        let policy =
            serde_yaml::from_str(&contents).map_err(|e| EngineError::PolicyParseError {
                path: path_str,
                message: e.to_string(),
            })?;

        Ok(Self { policy })
    }

    /// Builds a loader around an already-constructed policy (used by tests).
    pub fn from_policy(policy: EnginePolicy) -> Self {
        Self { policy }
    }

    /// Returns the loaded policy.
    pub fn policy(&self) -> &EnginePolicy {
        &self.policy
    }
}

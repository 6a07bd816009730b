//! Subject model and related types.
//!
//! A subject is a worker tracked by the engine. Subject records are owned
//! by an external identity service; the engine only reads them.

use serde::{Deserialize, Serialize};

/// Represents the employment arrangement of a subject.
///
/// The category drives leave entitlement proration: permanent workers
/// receive the full default entitlement, flex workers a fixed fraction,
/// and freelancers none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentCategory {
    /// Permanent employment with the full default entitlement.
    Permanent,
    /// Flexible-hours employment; entitlement is prorated.
    FlexWorker,
    /// Freelance engagement; no leave entitlement.
    Freelancer,
}

/// Represents the role a subject holds within their company.
///
/// Bulk allocation runs cover employees and managers only; admins and
/// freelancers are excluded from default runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectRole {
    /// A regular employee.
    Employee,
    /// A manager.
    Manager,
    /// An administrator account.
    Admin,
}

/// Live status of a subject as seen by external presence readers.
///
/// Transitions are emitted best-effort on clock actions; delivery failure
/// never fails the underlying state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceState {
    /// The subject has an open clock session.
    Working,
    /// The subject has no open clock session.
    Off,
}

/// Represents a worker tracked by the engine.
///
/// # Example
///
/// ```
/// use roster_engine::models::{EmploymentCategory, Subject, SubjectRole};
///
/// let subject = Subject {
///     id: "worker_001".to_string(),
///     employment_category: EmploymentCategory::Permanent,
///     role: SubjectRole::Employee,
///     company_id: "acme".to_string(),
///     active: true,
/// };
/// assert!(subject.is_allocatable());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// Opaque identifier supplied by the identity service.
    pub id: String,
    /// The employment arrangement.
    pub employment_category: EmploymentCategory,
    /// The role within the company.
    pub role: SubjectRole,
    /// The company the subject is affiliated with.
    pub company_id: String,
    /// Whether the subject is currently active.
    pub active: bool,
}

impl Subject {
    /// Returns true if a default bulk allocation run covers this subject.
    ///
    /// Active employees and managers are covered; admins are not, and
    /// inactive subjects are skipped regardless of role.
    pub fn is_allocatable(&self) -> bool {
        self.active && matches!(self.role, SubjectRole::Employee | SubjectRole::Manager)
    }
}

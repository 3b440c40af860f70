//! Roles and the capabilities they grant.
//!
//! Every privileged operation asks for one [`Capability`]; the mapping from
//! roles lives only here.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::PresenceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
    Student,
    Lecturer,
    Staff,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Capability {
    /// Open a QR session for a schedule the caller teaches.
    IssueSession,
    /// Open a QR session for any schedule.
    IssueAnySession,
    ScanSession,
    CampusTap,
    ManualOverride,
    /// Read another person's attendance.
    ViewOthers,
    WorkCheck,
    ManageShifts,
    ManageGeofences,
    ManageSchedules,
}

impl Role {
    pub fn can(self, capability: Capability) -> bool {
        use Capability::*;
        use Role::*;
        match capability {
            IssueSession | ManualOverride | ViewOthers => matches!(self, Lecturer | Staff | Admin),
            IssueAnySession | ManageShifts | ManageGeofences | ManageSchedules => {
                matches!(self, Staff | Admin)
            }
            ScanSession => matches!(self, Student),
            CampusTap => true,
            WorkCheck => matches!(self, Lecturer | Staff),
        }
    }
}

/// The authenticated caller as seen by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: i64,
    pub role: Role,
}

impl Actor {
    pub fn new(id: i64, role: Role) -> Self {
        Self { id, role }
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.role.can(capability)
    }

    pub fn require(&self, capability: Capability) -> Result<(), PresenceError> {
        if self.can(capability) {
            Ok(())
        } else {
            Err(PresenceError::Forbidden(format!(
                "role {} lacks capability {}",
                self.role, capability
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!(Role::from_str("Lecturer").unwrap(), Role::Lecturer);
        assert_eq!(Role::from_str("ADMIN").unwrap(), Role::Admin);
        assert!(Role::from_str("janitor").is_err());
    }

    #[test]
    fn capability_matrix() {
        assert!(Role::Lecturer.can(Capability::IssueSession));
        assert!(!Role::Lecturer.can(Capability::IssueAnySession));
        assert!(Role::Staff.can(Capability::IssueAnySession));
        assert!(!Role::Student.can(Capability::IssueSession));
        assert!(Role::Student.can(Capability::ScanSession));
        assert!(!Role::Admin.can(Capability::ScanSession));
        assert!(Role::Admin.can(Capability::CampusTap));
        assert!(Role::Staff.can(Capability::WorkCheck));
        assert!(!Role::Admin.can(Capability::WorkCheck));
        assert!(!Role::Lecturer.can(Capability::ManageShifts));
    }

    #[test]
    fn require_names_role_and_capability() {
        let err = Actor::new(1, Role::Student)
            .require(Capability::ManualOverride)
            .unwrap_err();
        assert_eq!(err.to_string(), "role student lacks capability manual_override");
    }
}

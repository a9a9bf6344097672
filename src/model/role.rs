#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Role {
    SuperAdmin = 1,
    Hr = 2,
    Manager = 3,
    Employee = 4,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::SuperAdmin),
            2 => Some(Role::Hr),
            3 => Some(Role::Manager),
            4 => Some(Role::Employee),
            _ => None,
        }
    }

    pub fn id(&self) -> u8 {
        *self as u8
    }

    /// Position in the approval hierarchy. Higher rank dominates lower.
    fn rank(&self) -> u8 {
        match self {
            Role::SuperAdmin => 4,
            Role::Hr => 3,
            Role::Manager => 2,
            Role::Employee => 1,
        }
    }

    /// Strict dominance: a role can act on requests from strictly lower roles.
    pub fn dominates(&self, other: Role) -> bool {
        self.rank() > other.rank()
    }

    /// Approval eligibility for a leave request raised by `requester`.
    /// SuperAdmin approves unconditionally; everyone else must strictly
    /// dominate the requester.
    pub fn can_approve(&self, requester: Role) -> bool {
        *self == Role::SuperAdmin || self.dominates(requester)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hierarchy_is_strict() {
        assert!(Role::Manager.dominates(Role::Employee));
        assert!(Role::Hr.dominates(Role::Manager));
        assert!(Role::SuperAdmin.dominates(Role::Hr));
        assert!(!Role::Employee.dominates(Role::Employee));
        assert!(!Role::Manager.dominates(Role::Hr));
    }

    #[test]
    fn equal_ranks_never_approve_each_other() {
        for role in [Role::Hr, Role::Manager, Role::Employee] {
            assert!(!role.can_approve(role));
        }
    }

    #[test]
    fn super_admin_approves_unconditionally() {
        for requester in [Role::SuperAdmin, Role::Hr, Role::Manager, Role::Employee] {
            assert!(Role::SuperAdmin.can_approve(requester));
        }
    }

    #[test]
    fn employee_requests_need_manager_or_above() {
        assert!(Role::Manager.can_approve(Role::Employee));
        assert!(Role::Hr.can_approve(Role::Manager));
        assert!(!Role::Employee.can_approve(Role::Employee));
        assert!(!Role::Manager.can_approve(Role::Hr));
    }

    #[test]
    fn role_ids_round_trip() {
        for id in 1..=4u8 {
            assert_eq!(Role::from_id(id).unwrap().id(), id);
        }
        assert!(Role::from_id(0).is_none());
        assert!(Role::from_id(5).is_none());
    }
}

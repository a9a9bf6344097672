use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Per-user, per-leave-type, per-year allotment ledger.
/// Invariant: `remaining_days = total_days - used_days` after every
/// committed mutation; both columns are always written in the same UPDATE.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveBalance {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 42)]
    pub user_id: u64,
    #[schema(example = 1)]
    pub leave_type_id: u64,
    #[schema(example = 2026)]
    pub year: u16,
    #[schema(example = 20)]
    pub total_days: i32,
    #[schema(example = 5)]
    pub used_days: i32,
    #[schema(example = 15)]
    pub remaining_days: i32,
}

impl LeaveBalance {
    pub fn is_consistent(&self) -> bool {
        self.remaining_days == self.total_days - self.used_days
    }

    /// Whether `days` more can be deducted without going negative.
    pub fn can_deduct(&self, days: i32) -> bool {
        self.used_days + days <= self.total_days
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balance(total: i32, used: i32) -> LeaveBalance {
        LeaveBalance {
            id: 1,
            user_id: 42,
            leave_type_id: 1,
            year: 2026,
            total_days: total,
            used_days: used,
            remaining_days: total - used,
        }
    }

    #[test]
    fn remaining_equals_total_minus_used() {
        assert!(balance(20, 0).is_consistent());
        assert!(balance(20, 20).is_consistent());
        let mut broken = balance(20, 5);
        broken.remaining_days = 20;
        assert!(!broken.is_consistent());
    }

    #[test]
    fn deduction_never_exceeds_total() {
        let b = balance(20, 18);
        assert!(b.can_deduct(2));
        assert!(!b.can_deduct(3));
        assert!(balance(20, 20).can_deduct(0));
    }
}

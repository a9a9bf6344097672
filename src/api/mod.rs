pub mod attendance;
pub mod audit_log;
pub mod employee;
pub mod leave;
pub mod leave_balance;
pub mod leave_type;
pub mod organization;
pub mod payroll;
pub mod project;

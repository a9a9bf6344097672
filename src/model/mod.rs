pub mod attendance;
pub mod audit;
pub mod employee;
pub mod leave;
pub mod leave_balance;
pub mod organization;
pub mod payroll;
pub mod project;
pub mod role;

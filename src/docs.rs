use crate::api::attendance::{AttendanceFilter, AttendanceListResponse, MarkAbsent};
use crate::api::audit_log::{AuditLogQuery, PaginatedAuditResponse};
use crate::api::employee::{CreateEmployee, EmployeeListResponse, EmployeeQuery, UpdateEmployee};
use crate::api::leave::{CreateLeave, LeaveFilter, LeaveListResponse};
use crate::api::leave_balance::{BalanceFilter, BalanceListResponse, UpsertBalance};
use crate::api::leave_type::{CreateLeaveType, UpdateLeaveType};
use crate::api::organization::CreateOrganization;
use crate::api::payroll::{CreatePayroll, PaginatedPayrollResponse, PayrollQuery, UpdatePayroll};
use crate::api::project::{CreateProject, CreateTask, UpdateProject, UpdateTask};
use crate::model::attendance::Attendance;
use crate::model::audit::AuditEntry;
use crate::model::employee::{Employee, EmployeeProfile, ProfilePayload};
use crate::model::leave::{LeaveRequest, LeaveType};
use crate::model::leave_balance::LeaveBalance;
use crate::model::organization::Organization;
use crate::model::payroll::Payroll;
use crate::model::project::{Project, ProjectTask};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "PeopleHub API",
        version = "1.0.0",
        description = r#"
## PeopleHub

Multi-organization HR backend: employees, attendance, leave, payroll,
projects, and an append-only audit trail.

### Key Features
- **Employee Management**
  - Server-generated employee codes, soft delete/restore, rich profiles
- **Attendance**
  - Opens on login, closes on logout or explicit check-out; day
    classification into full day / half day / incomplete
- **Leave Management**
  - Typed leave with yearly balances; approvals deduct atomically
- **Payroll**
  - One record per employee per month, net salary computed server-side
- **Projects & Tasks**
  - Organization-scoped projects with assignable tasks
- **Audit Trail**
  - Every tracked mutation recorded with before/after snapshots

### Security
JWT Bearer authentication with refresh-token rotation. Role hierarchy:
Super Admin > HR > Manager > Employee. Non-admin access never crosses
organization boundaries.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::organization::create_organization,
        crate::api::organization::list_organizations,
        crate::api::organization::get_organization,

        crate::api::employee::create_employee,
        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,
        crate::api::employee::restore_employee,
        crate::api::employee::get_profile,
        crate::api::employee::put_profile,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::list_attendance,
        crate::api::attendance::mark_absent,

        crate::api::leave::create_leave,
        crate::api::leave::leave_list,
        crate::api::leave::get_leave,
        crate::api::leave::approve_leave,
        crate::api::leave::reject_leave,
        crate::api::leave::cancel_leave,

        crate::api::leave_type::create_leave_type,
        crate::api::leave_type::list_leave_types,
        crate::api::leave_type::update_leave_type,
        crate::api::leave_type::delete_leave_type,

        crate::api::leave_balance::upsert_balance,
        crate::api::leave_balance::list_balances,

        crate::api::payroll::create_payroll,
        crate::api::payroll::update_payroll,
        crate::api::payroll::get_payroll,
        crate::api::payroll::list_payrolls,

        crate::api::project::create_project,
        crate::api::project::list_projects,
        crate::api::project::get_project,
        crate::api::project::update_project,
        crate::api::project::create_task,
        crate::api::project::list_tasks,
        crate::api::project::update_task,

        crate::api::audit_log::list_audit_log
    ),
    components(
        schemas(
            CreateOrganization,
            Organization,
            CreateEmployee,
            UpdateEmployee,
            EmployeeQuery,
            EmployeeListResponse,
            Employee,
            EmployeeProfile,
            ProfilePayload,
            AttendanceFilter,
            AttendanceListResponse,
            MarkAbsent,
            Attendance,
            CreateLeave,
            LeaveFilter,
            LeaveListResponse,
            LeaveRequest,
            CreateLeaveType,
            UpdateLeaveType,
            LeaveType,
            UpsertBalance,
            BalanceFilter,
            BalanceListResponse,
            LeaveBalance,
            CreatePayroll,
            UpdatePayroll,
            PayrollQuery,
            PaginatedPayrollResponse,
            Payroll,
            CreateProject,
            UpdateProject,
            CreateTask,
            UpdateTask,
            Project,
            ProjectTask,
            AuditLogQuery,
            PaginatedAuditResponse,
            AuditEntry
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Organization", description = "Organization management APIs"),
        (name = "Employee", description = "Employee management APIs"),
        (name = "Attendance", description = "Attendance tracking APIs"),
        (name = "Leave", description = "Leave request APIs"),
        (name = "LeaveType", description = "Leave type catalog APIs"),
        (name = "LeaveBalance", description = "Yearly leave balance APIs"),
        (name = "Payroll", description = "Payroll management APIs"),
        (name = "Project", description = "Project and task APIs"),
        (name = "Audit", description = "Audit trail APIs"),
    )
)]
pub struct ApiDoc;

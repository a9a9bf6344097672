use crate::{
    api::{
        attendance, audit_log, employee, leave, leave_balance, leave_type, organization, payroll,
        project,
    },
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter.clone())
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter)
            .service(
                web::scope("/organizations")
                    .service(
                        web::resource("")
                            .route(web::post().to(organization::create_organization))
                            .route(web::get().to(organization::list_organizations)),
                    )
                    .service(
                        web::resource("/{id}").route(web::get().to(organization::get_organization)),
                    ),
            )
            .service(
                web::scope("/employees")
                    // /employees
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    // /employees/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(employee::get_employee))
                            .route(web::put().to(employee::update_employee))
                            .route(web::delete().to(employee::delete_employee)),
                    )
                    .service(
                        web::resource("/{id}/restore")
                            .route(web::post().to(employee::restore_employee)),
                    )
                    .service(
                        web::resource("/{id}/profile")
                            .route(web::get().to(employee::get_profile))
                            .route(web::put().to(employee::put_profile)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    .service(web::resource("").route(web::get().to(attendance::list_attendance)))
                    .service(
                        web::resource("/check-in").route(web::post().to(attendance::check_in)),
                    )
                    .service(
                        web::resource("/check-out").route(web::put().to(attendance::check_out)),
                    )
                    .service(
                        web::resource("/{user_id}/absent")
                            .route(web::put().to(attendance::mark_absent)),
                    ),
            )
            .service(
                web::scope("/leave")
                    .service(
                        web::resource("")
                            .route(web::get().to(leave::leave_list))
                            .route(web::post().to(leave::create_leave)),
                    )
                    .service(web::resource("/{id}").route(web::get().to(leave::get_leave)))
                    .service(
                        web::resource("/{id}/approve").route(web::put().to(leave::approve_leave)),
                    )
                    .service(
                        web::resource("/{id}/reject").route(web::put().to(leave::reject_leave)),
                    )
                    .service(
                        web::resource("/{id}/cancel").route(web::put().to(leave::cancel_leave)),
                    ),
            )
            .service(
                web::scope("/leave-types")
                    .service(
                        web::resource("")
                            .route(web::post().to(leave_type::create_leave_type))
                            .route(web::get().to(leave_type::list_leave_types)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(leave_type::update_leave_type))
                            .route(web::delete().to(leave_type::delete_leave_type)),
                    ),
            )
            .service(
                web::resource("/leave-balances")
                    .route(web::put().to(leave_balance::upsert_balance))
                    .route(web::get().to(leave_balance::list_balances)),
            )
            .service(
                web::scope("/payroll")
                    .service(
                        web::resource("")
                            .route(web::post().to(payroll::create_payroll))
                            .route(web::get().to(payroll::list_payrolls)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(payroll::get_payroll))
                            .route(web::put().to(payroll::update_payroll)),
                    ),
            )
            .service(
                web::scope("/projects")
                    .service(
                        web::resource("")
                            .route(web::post().to(project::create_project))
                            .route(web::get().to(project::list_projects)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(project::get_project))
                            .route(web::put().to(project::update_project)),
                    )
                    .service(
                        web::resource("/{id}/tasks")
                            .route(web::post().to(project::create_task))
                            .route(web::get().to(project::list_tasks)),
                    ),
            )
            .service(web::resource("/tasks/{id}").route(web::put().to(project::update_task)))
            .service(web::resource("/audit-log").route(web::get().to(audit_log::list_audit_log))),
    );
}

// LOGIN
//  ├─ access_token (15 min), refresh_token (7 days)
//  ├─ opens today's attendance row for non-admin users
//  └─ Authorization: Bearer access_token on every protected call
//
// LOGOUT (refresh token)
//  ├─ revokes the refresh token
//  └─ closes today's attendance row

use crate::config::Config;
use crate::{
    model::role::Role,
    models::{Claims, TokenType},
};
use actix_web::{FromRequest, HttpRequest, dev::Payload, error::ErrorUnauthorized, web::Data};
use futures::future::{Ready, ready};
use jsonwebtoken::decode;
use jsonwebtoken::{DecodingKey, Validation};

pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,
    pub organization_id: u64,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ErrorUnauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(actix_web::error::ErrorInternalServerError(
                    "Config missing",
                )));
            }
        };

        let data = match decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &Validation::default(),
        ) {
            Ok(d) => d,
            Err(_) => return ready(Err(ErrorUnauthorized("Invalid token"))),
        };

        // Refresh tokens only buy new pairs; they never open protected routes
        if data.claims.token_type != TokenType::Access {
            return ready(Err(ErrorUnauthorized("Access token required")));
        }

        let role = match Role::from_id(data.claims.role) {
            Some(r) => r,
            None => return ready(Err(ErrorUnauthorized("Invalid role"))),
        };

        ready(Ok(AuthUser {
            user_id: data.claims.user_id,
            username: data.claims.sub,
            role,
            organization_id: data.claims.organization_id,
            employee_id: data.claims.employee_id,
        }))
    }
}

impl AuthUser {
    pub fn require_super_admin(&self) -> actix_web::Result<()> {
        if self.role == Role::SuperAdmin {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Super Admin only"))
        }
    }

    pub fn require_hr_or_admin(&self) -> actix_web::Result<()> {
        if matches!(self.role, Role::SuperAdmin | Role::Hr) {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("HR/Super Admin only"))
        }
    }

    pub fn require_manager_or_above(&self) -> actix_web::Result<()> {
        if matches!(self.role, Role::SuperAdmin | Role::Hr | Role::Manager) {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Manager or above only"))
        }
    }

    /// Organization scoping: SuperAdmin crosses organizations, everyone
    /// else is confined to their own.
    pub fn can_access_org(&self, organization_id: u64) -> bool {
        self.role == Role::SuperAdmin || self.organization_id == organization_id
    }

    pub fn require_org(&self, organization_id: u64) -> actix_web::Result<()> {
        if self.can_access_org(organization_id) {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden(
                "Outside your organization",
            ))
        }
    }

    /// Organization filter for list queries: SuperAdmin sees every
    /// organization, everyone else only their own.
    pub fn org_filter(&self) -> Option<u64> {
        if self.role == Role::SuperAdmin {
            None
        } else {
            Some(self.organization_id)
        }
    }

    /// Organization a create targets. SuperAdmin may name any
    /// organization; everyone else stays in their own.
    pub fn target_org(&self, requested: Option<u64>) -> actix_web::Result<u64> {
        match requested {
            Some(org) => {
                self.require_org(org)?;
                Ok(org)
            }
            None => Ok(self.organization_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{TokenIdentity, generate_access_token, generate_refresh_token};
    use actix_web::test::TestRequest;

    fn test_config() -> Config {
        Config {
            database_url: "mysql://unused".into(),
            jwt_secret: "test-secret".into(),
            server_addr: "127.0.0.1:0".into(),
            access_token_ttl: 900,
            refresh_token_ttl: 604_800,
            rate_login_per_min: 60,
            rate_register_per_min: 30,
            rate_refresh_per_min: 30,
            rate_protected_per_min: 1000,
            api_prefix: "/api".into(),
            log_dir: "logs".into(),
        }
    }

    fn identity() -> TokenIdentity {
        TokenIdentity {
            user_id: 42,
            username: "jdoe".into(),
            role: Role::Hr.id(),
            organization_id: 1,
            employee_id: None,
        }
    }

    fn user(role: Role, organization_id: u64) -> AuthUser {
        AuthUser {
            user_id: 42,
            username: "jdoe".into(),
            role,
            organization_id,
            employee_id: None,
        }
    }

    async fn extract(token: &str) -> Result<AuthUser, actix_web::Error> {
        let req = TestRequest::default()
            .app_data(Data::new(test_config()))
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_http_request();
        AuthUser::from_request(&req, &mut Payload::None).await
    }

    #[actix_web::test]
    async fn access_token_is_extracted() {
        let config = test_config();
        let token = generate_access_token(&identity(), &config.jwt_secret, 900);
        let auth = extract(&token).await.unwrap();
        assert_eq!(auth.user_id, 42);
        assert_eq!(auth.role, Role::Hr);
    }

    #[actix_web::test]
    async fn refresh_token_is_rejected_on_protected_routes() {
        let config = test_config();
        let (token, _) = generate_refresh_token(&identity(), &config.jwt_secret, 604_800);
        assert!(extract(&token).await.is_err());
    }

    #[test]
    fn super_admin_lists_are_unscoped() {
        assert_eq!(user(Role::SuperAdmin, 1).org_filter(), None);
        assert_eq!(user(Role::Hr, 1).org_filter(), Some(1));
        assert_eq!(user(Role::Employee, 7).org_filter(), Some(7));
    }

    #[test]
    fn super_admin_may_create_in_any_org() {
        assert_eq!(user(Role::SuperAdmin, 1).target_org(Some(9)).unwrap(), 9);
        assert_eq!(user(Role::SuperAdmin, 1).target_org(None).unwrap(), 1);
    }

    #[test]
    fn other_roles_create_only_in_their_own_org() {
        let hr = user(Role::Hr, 1);
        assert_eq!(hr.target_org(None).unwrap(), 1);
        assert_eq!(hr.target_org(Some(1)).unwrap(), 1);
        assert!(hr.target_org(Some(2)).is_err());
    }
}

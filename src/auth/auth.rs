use crate::auth::jwt::{Claims, TokenType, verify_token};
use crate::config::Config;
use crate::model::role::Role;
use actix_web::{
    FromRequest, HttpMessage, HttpRequest,
    dev::Payload,
    error::{ErrorForbidden, ErrorInternalServerError, ErrorUnauthorized},
    web::Data,
};
use futures::future::{Ready, ready};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

impl AuthUser {
    /// Builds the user from verified access-token claims.
    pub fn from_claims(claims: Claims) -> Result<Self, &'static str> {
        if claims.token_type != TokenType::Access {
            return Err("Access token required");
        }

        let role = Role::from_id(claims.role).ok_or("Invalid role")?;

        Ok(AuthUser {
            user_id: claims.user_id,
            username: claims.sub,
            role,
            employee_id: claims.employee_id,
        })
    }

    pub fn require_admin(&self) -> actix_web::Result<()> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(ErrorForbidden("Admin only"))
        }
    }

    pub fn require_hr_or_admin(&self) -> actix_web::Result<()> {
        if self.is_hr_or_admin() {
            Ok(())
        } else {
            Err(ErrorForbidden("HR/Admin only"))
        }
    }

    pub fn is_hr_or_admin(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Hr)
    }
}

pub(crate) fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // the auth middleware already verified the token on protected scopes
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let token = match bearer_token(req) {
            Some(t) => t,
            None => return ready(Err(ErrorUnauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => return ready(Err(ErrorInternalServerError("Config missing"))),
        };

        let claims = match verify_token(token, &config.jwt_secret) {
            Ok(c) => c,
            Err(_) => return ready(Err(ErrorUnauthorized("Invalid token"))),
        };

        ready(AuthUser::from_claims(claims).map_err(ErrorUnauthorized))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: u8, token_type: TokenType) -> Claims {
        Claims {
            user_id: 1,
            sub: "asha".into(),
            role,
            exp: 0,
            jti: "jti".into(),
            token_type,
            employee_id: Some(1001),
        }
    }

    #[test]
    fn refresh_tokens_cannot_authenticate_requests() {
        assert!(AuthUser::from_claims(claims(3, TokenType::Refresh)).is_err());
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!(AuthUser::from_claims(claims(42, TokenType::Access)).is_err());
    }

    #[test]
    fn role_gates() {
        let hr = AuthUser::from_claims(claims(2, TokenType::Access)).unwrap();
        assert!(hr.require_hr_or_admin().is_ok());
        assert!(hr.require_admin().is_err());

        let employee = AuthUser::from_claims(claims(3, TokenType::Access)).unwrap();
        assert!(!employee.is_hr_or_admin());
    }
}

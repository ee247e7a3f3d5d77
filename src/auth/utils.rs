use crate::{
    auth::Claims,
    errors::{AppError, AppResult},
};

pub fn require_admin(claims: &Claims) -> AppResult<()> {
    if !claims.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can perform this action".to_string(),
        ));
    }
    Ok(())
}

pub fn require_self_or_admin(claims: &Claims, user_id: &str) -> AppResult<()> {
    if !claims.is_admin() && claims.sub != user_id {
        return Err(AppError::Forbidden(
            "You can only access your own resources".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::claims::TokenType, models::domain::UserRole};

    fn create_test_claims(user_id: &str, role: UserRole) -> Claims {
        Claims {
            sub: user_id.to_string(),
            role,
            token_type: TokenType::Access,
            iat: 0,
            exp: 9999999999,
            jti: "test".to_string(),
        }
    }

    #[test]
    fn test_require_admin_success() {
        let claims = create_test_claims("admin", UserRole::Admin);
        assert!(require_admin(&claims).is_ok());
    }

    #[test]
    fn test_require_admin_failure() {
        let claims = create_test_claims("student", UserRole::Student);
        assert!(matches!(require_admin(&claims), Err(AppError::Forbidden(_))));
    }

    #[test]
    fn test_require_self_or_admin_as_self() {
        let claims = create_test_claims("john", UserRole::Student);
        assert!(require_self_or_admin(&claims, "john").is_ok());
    }

    #[test]
    fn test_require_self_or_admin_as_admin() {
        let claims = create_test_claims("admin", UserRole::Admin);
        assert!(require_self_or_admin(&claims, "other_user").is_ok());
    }

    #[test]
    fn test_require_self_or_admin_failure() {
        let claims = create_test_claims("john", UserRole::Student);
        assert!(require_self_or_admin(&claims, "jane").is_err());
    }
}

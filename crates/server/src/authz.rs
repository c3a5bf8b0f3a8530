//! Authorization policy.
//!
//! One pure decision function gates every protected route, backed by a single
//! role lookup per request (done by the extractors in
//! [`crate::middleware::auth`]). Route handlers never re-check roles inline.

use loomcart_core::Role;

use crate::error::AppError;

/// Access level a route requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredLevel {
    /// Only admins.
    AdminOnly,
    /// Managers and admins.
    ManagerOrAdmin,
    /// Any verified principal; handlers scope data to the caller's own email.
    AuthenticatedSelf,
}

/// Decide whether `role` clears `level`.
///
/// # Errors
///
/// Returns `AppError::Forbidden` with a static reason when the role is
/// below the required level.
pub fn authorize(role: Role, level: RequiredLevel) -> Result<(), AppError> {
    match level {
        RequiredLevel::AdminOnly => {
            if role.is_admin() {
                Ok(())
            } else {
                Err(AppError::Forbidden("Admin only access".to_owned()))
            }
        }
        RequiredLevel::ManagerOrAdmin => {
            if role.is_manager_or_admin() {
                Ok(())
            } else {
                Err(AppError::Forbidden(
                    "Forbidden: Manager/Admin only".to_owned(),
                ))
            }
        }
        RequiredLevel::AuthenticatedSelf => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_clears_everything() {
        for level in [
            RequiredLevel::AdminOnly,
            RequiredLevel::ManagerOrAdmin,
            RequiredLevel::AuthenticatedSelf,
        ] {
            assert!(authorize(Role::Admin, level).is_ok());
        }
    }

    #[test]
    fn test_manager_denied_admin_only() {
        assert!(matches!(
            authorize(Role::Manager, RequiredLevel::AdminOnly),
            Err(AppError::Forbidden(_))
        ));
        assert!(authorize(Role::Manager, RequiredLevel::ManagerOrAdmin).is_ok());
        assert!(authorize(Role::Manager, RequiredLevel::AuthenticatedSelf).is_ok());
    }

    #[test]
    fn test_buyer_denied_elevated_levels() {
        assert!(matches!(
            authorize(Role::Buyer, RequiredLevel::AdminOnly),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            authorize(Role::Buyer, RequiredLevel::ManagerOrAdmin),
            Err(AppError::Forbidden(_))
        ));
        assert!(authorize(Role::Buyer, RequiredLevel::AuthenticatedSelf).is_ok());
    }

    #[test]
    fn test_denial_reasons_are_static() {
        let Err(AppError::Forbidden(reason)) = authorize(Role::Buyer, RequiredLevel::AdminOnly)
        else {
            panic!("expected forbidden");
        };
        assert_eq!(reason, "Admin only access");

        let Err(AppError::Forbidden(reason)) =
            authorize(Role::Buyer, RequiredLevel::ManagerOrAdmin)
        else {
            panic!("expected forbidden");
        };
        assert_eq!(reason, "Forbidden: Manager/Admin only");
    }
}

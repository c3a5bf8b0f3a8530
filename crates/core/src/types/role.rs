//! Principal access roles.

use serde::{Deserialize, Serialize};

/// Access level assigned to a principal.
///
/// Every registered principal starts as a [`Role::Buyer`]; an admin may
/// promote them afterwards. Stored as lowercase text in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Default role: may place and view their own orders.
    #[default]
    Buyer,
    /// Seller: manages their own catalog and the orders sold through it.
    Manager,
    /// Full access, bypasses ownership scoping.
    Admin,
}

impl Role {
    /// Whether this role carries manager-level (seller) access.
    #[must_use]
    pub const fn is_manager_or_admin(self) -> bool {
        matches!(self, Self::Manager | Self::Admin)
    }

    /// Whether this role carries admin access.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buyer => write!(f, "buyer"),
            Self::Manager => write!(f, "manager"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buyer" => Ok(Self::Buyer),
            "manager" => Ok(Self::Manager),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

// SQLx support (with postgres feature): roles live in a TEXT column.
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Role {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Role {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(s.parse()?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Role {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.to_string(), buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_buyer() {
        assert_eq!(Role::default(), Role::Buyer);
    }

    #[test]
    fn test_display_from_str_roundtrip() {
        for role in [Role::Buyer, Role::Manager, Role::Admin] {
            let back: Role = role.to_string().parse().unwrap();
            assert_eq!(back, role);
        }
    }

    #[test]
    fn test_from_str_rejects_unknown() {
        assert!("superuser".parse::<Role>().is_err());
        assert!("Admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Manager).unwrap(), "\"manager\"");
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn test_level_checks() {
        assert!(!Role::Buyer.is_manager_or_admin());
        assert!(Role::Manager.is_manager_or_admin());
        assert!(Role::Admin.is_manager_or_admin());
        assert!(Role::Admin.is_admin());
        assert!(!Role::Manager.is_admin());
    }
}

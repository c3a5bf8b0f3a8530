//! Order lifecycle and payment statuses.

use serde::{Deserialize, Serialize};

/// Error parsing a status value supplied by a client.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid status: {0}")]
pub struct StatusParseError(pub String);

/// Lifecycle stage of an order.
///
/// `pending` is the only non-terminal state: a manager approves or rejects a
/// pending order and there is no path back. Stored as lowercase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl OrderStatus {
    /// Whether this status has left `pending` and can no longer change
    /// through the fixed approve/reject transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }

    /// Parse a client-supplied status, case-insensitively.
    ///
    /// The update and filter endpoints accept any casing ("Approved",
    /// "APPROVED") but only values inside the enumerated domain.
    ///
    /// # Errors
    ///
    /// Returns [`StatusParseError`] for values outside the domain.
    pub fn parse(s: &str) -> Result<Self, StatusParseError> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(StatusParseError(s.to_owned())),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// Payment state of an order.
///
/// Derived at creation from the client-declared payment-required flag:
/// `unpaid` when online payment is expected, `cod` (cash on delivery)
/// otherwise. `paid` is representable but is never set by this service -
/// there is no processor webhook reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Cod,
}

impl PaymentStatus {
    /// Derive the initial payment status for a new order.
    #[must_use]
    pub const fn from_payment_required(payment_required: bool) -> Self {
        if payment_required {
            Self::Unpaid
        } else {
            Self::Cod
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unpaid => write!(f, "unpaid"),
            Self::Paid => write!(f, "paid"),
            Self::Cod => write!(f, "cod"),
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(Self::Unpaid),
            "paid" => Ok(Self::Paid),
            "cod" => Ok(Self::Cod),
            _ => Err(StatusParseError(s.to_owned())),
        }
    }
}

// SQLx support (with postgres feature): both statuses live in TEXT columns.
macro_rules! text_codec {
    ($ty:ty, $parse:expr) => {
        #[cfg(feature = "postgres")]
        impl sqlx::Type<sqlx::Postgres> for $ty {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $ty {
            fn decode(
                value: sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
                Ok($parse(&s)?)
            }
        }

        #[cfg(feature = "postgres")]
        impl sqlx::Encode<'_, sqlx::Postgres> for $ty {
            fn encode_by_ref(
                &self,
                buf: &mut sqlx::postgres::PgArgumentBuffer,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.to_string(), buf)
            }
        }
    };
}

text_codec!(OrderStatus, OrderStatus::parse);
text_codec!(PaymentStatus, str::parse::<PaymentStatus>);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_parse_case_insensitive() {
        assert_eq!(OrderStatus::parse("pending").unwrap(), OrderStatus::Pending);
        assert_eq!(OrderStatus::parse("Approved").unwrap(), OrderStatus::Approved);
        assert_eq!(OrderStatus::parse("REJECTED").unwrap(), OrderStatus::Rejected);
    }

    #[test]
    fn test_order_status_parse_rejects_outside_domain() {
        assert!(OrderStatus::parse("shipped").is_err());
        assert!(OrderStatus::parse("").is_err());
    }

    #[test]
    fn test_order_status_terminality() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(OrderStatus::Approved.is_terminal());
        assert!(OrderStatus::Rejected.is_terminal());
    }

    #[test]
    fn test_payment_status_derivation() {
        assert_eq!(
            PaymentStatus::from_payment_required(true),
            PaymentStatus::Unpaid
        );
        assert_eq!(
            PaymentStatus::from_payment_required(false),
            PaymentStatus::Cod
        );
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(serde_json::to_string(&PaymentStatus::Cod).unwrap(), "\"cod\"");
        let status: OrderStatus = serde_json::from_str("\"approved\"").unwrap();
        assert_eq!(status, OrderStatus::Approved);
    }

    #[test]
    fn test_display_roundtrip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Approved,
            OrderStatus::Rejected,
        ] {
            assert_eq!(OrderStatus::parse(&status.to_string()).unwrap(), status);
        }
        for status in [PaymentStatus::Unpaid, PaymentStatus::Paid, PaymentStatus::Cod] {
            let back: PaymentStatus = status.to_string().parse().unwrap();
            assert_eq!(back, status);
        }
    }
}

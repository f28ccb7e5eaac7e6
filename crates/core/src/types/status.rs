//! Status enums for various entities.
//!
//! All of these are stored as lowercase snake_case text in the table store.

use serde::{Deserialize, Serialize};

/// Error returned when parsing an enum value from its stored text form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value}")]
pub struct ParseStatusError {
    kind: &'static str,
    value: String,
}

impl ParseStatusError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

/// Lifecycle status of a recorded sale.
///
/// Transitions follow a fixed table:
///
/// ```text
/// pending ──▶ processing ──▶ completed
///    │             │
///    └─────┬───────┘
///          ▼
///      cancelled
/// ```
///
/// Re-saving the current status is always allowed. `completed` and
/// `cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Cancelled,
}

impl TransactionStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::Processing,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Whether a transaction currently in `self` may be moved to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Pending | Self::Processing | Self::Cancelled)
                | (Self::Processing, Self::Processing | Self::Completed | Self::Cancelled)
                | (Self::Completed, Self::Completed)
                | (Self::Cancelled, Self::Cancelled)
        )
    }

    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Stored text form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseStatusError::new("transaction status", s))
    }
}

/// How a transaction was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    CreditCard,
    DebitCard,
    Gcash,
    Paymaya,
}

impl PaymentMethod {
    /// Every accepted payment method.
    pub const ALL: [Self; 5] = [
        Self::Cash,
        Self::CreditCard,
        Self::DebitCard,
        Self::Gcash,
        Self::Paymaya,
    ];

    /// Stored text form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::CreditCard => "credit_card",
            Self::DebitCard => "debit_card",
            Self::Gcash => "gcash",
            Self::Paymaya => "paymaya",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| ParseStatusError::new("payment method", s))
    }
}

/// Standing of a buyer record in the back-office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BuyerStatus {
    #[default]
    Active,
    Inactive,
    Blocked,
}

impl std::fmt::Display for BuyerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Inactive => write!(f, "inactive"),
            Self::Blocked => write!(f, "blocked"),
        }
    }
}

impl std::str::FromStr for BuyerStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "blocked" => Ok(Self::Blocked),
            _ => Err(ParseStatusError::new("buyer status", s)),
        }
    }
}

/// Role carried on a user's profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Regular storefront customer.
    #[default]
    Buyer,
    /// Back-office staff with access to the admin API.
    Admin,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buyer => write!(f, "buyer"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buyer" => Ok(Self::Buyer),
            "admin" => Ok(Self::Admin),
            _ => Err(ParseStatusError::new("user role", s)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use TransactionStatus::{Cancelled, Completed, Pending, Processing};

    #[test]
    fn test_forward_transitions() {
        assert!(Pending.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Processing.can_transition_to(Cancelled));
    }

    #[test]
    fn test_rejected_transitions() {
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Processing.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Processing));
    }

    #[test]
    fn test_same_status_always_allowed() {
        for status in TransactionStatus::ALL {
            assert!(status.can_transition_to(status));
        }
    }

    #[test]
    fn test_terminal() {
        assert!(Completed.is_terminal());
        assert!(Cancelled.is_terminal());
        assert!(!Pending.is_terminal());
    }

    #[test]
    fn test_status_text_forms() {
        assert_eq!("processing".parse::<TransactionStatus>().unwrap(), Processing);
        assert!("shipped".parse::<TransactionStatus>().is_err());
        assert_eq!(
            serde_json::to_value(PaymentMethod::CreditCard).unwrap(),
            serde_json::json!("credit_card")
        );
        assert_eq!(PaymentMethod::Gcash.to_string(), "gcash");
        assert_eq!(BuyerStatus::Blocked.to_string(), "blocked");
    }

    #[test]
    fn test_payment_and_buyer_status_parse() {
        assert_eq!(
            "debit_card".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::DebitCard
        );
        assert!("bitcoin".parse::<PaymentMethod>().is_err());
        assert_eq!("inactive".parse::<BuyerStatus>().unwrap(), BuyerStatus::Inactive);
        assert!("vip".parse::<BuyerStatus>().is_err());
    }

    #[test]
    fn test_user_role_roundtrip() {
        assert_eq!("admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!(UserRole::Buyer.to_string(), "buyer");
        assert!("owner".parse::<UserRole>().is_err());
    }
}

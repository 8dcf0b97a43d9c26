//! Status enums for orders and payments.

use serde::{Deserialize, Serialize};

/// Order status.
///
/// Maps to WooCommerce's built-in order status values, which are serialized
/// in kebab-case on the wire (`on-hold`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    OnHold,
    Completed,
    Cancelled,
    Refunded,
    Failed,
}

impl OrderStatus {
    /// Returns the wire representation used in order update payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::OnHold => "on-hold",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
            Self::Failed => "failed",
        }
    }

    /// Whether the order is still awaiting payment.
    #[must_use]
    pub const fn is_awaiting_payment(self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "on-hold" => Ok(Self::OnHold),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "refunded" => Ok(Self::Refunded),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Payment status.
///
/// Maps to Planet Pay's payment status values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    New,
    Pending,
    Authorized,
    Completed,
    Rejected,
    Cancelled,
}

impl PaymentStatus {
    /// Whether the gateway will not change this status again.
    #[must_use]
    pub const fn is_final(self) -> bool {
        matches!(self, Self::Completed | Self::Rejected | Self::Cancelled)
    }

    /// Whether the payment has been captured.
    #[must_use]
    pub const fn is_successful(self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Payment channel offered at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentChannel {
    Card,
    Blik,
    Transfer,
}

impl PaymentChannel {
    /// Returns the wire representation used in payment create payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Card => "CARD",
            Self::Blik => "BLIK",
            Self::Transfer => "TRANSFER",
        }
    }
}

impl std::fmt::Display for PaymentChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CARD" => Ok(Self::Card),
            "BLIK" => Ok(Self::Blik),
            "TRANSFER" => Ok(Self::Transfer),
            _ => Err(format!("invalid payment channel: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_wire_format() {
        let json = serde_json::to_string(&OrderStatus::OnHold).unwrap();
        assert_eq!(json, "\"on-hold\"");

        let parsed: OrderStatus = serde_json::from_str("\"processing\"").unwrap();
        assert_eq!(parsed, OrderStatus::Processing);
    }

    #[test]
    fn test_order_status_round_trips_as_str() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::OnHold,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
            OrderStatus::Refunded,
            OrderStatus::Failed,
        ] {
            let parsed: OrderStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_payment_status_wire_format() {
        let json = serde_json::to_string(&PaymentStatus::Authorized).unwrap();
        assert_eq!(json, "\"AUTHORIZED\"");

        let parsed: PaymentStatus = serde_json::from_str("\"COMPLETED\"").unwrap();
        assert_eq!(parsed, PaymentStatus::Completed);
    }

    #[test]
    fn test_payment_status_finality() {
        assert!(!PaymentStatus::New.is_final());
        assert!(!PaymentStatus::Pending.is_final());
        assert!(!PaymentStatus::Authorized.is_final());
        assert!(PaymentStatus::Completed.is_final());
        assert!(PaymentStatus::Rejected.is_final());
        assert!(PaymentStatus::Cancelled.is_final());

        assert!(PaymentStatus::Completed.is_successful());
        assert!(!PaymentStatus::Rejected.is_successful());
    }

    #[test]
    fn test_payment_channel_parse() {
        let channel: PaymentChannel = "BLIK".parse().unwrap();
        assert_eq!(channel, PaymentChannel::Blik);
        assert!("blik".parse::<PaymentChannel>().is_err());
    }
}

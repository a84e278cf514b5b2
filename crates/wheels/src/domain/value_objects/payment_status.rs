//! PaymentStatus - normalized state of a gateway transaction

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    /// Map the bank's `TransactionStatus` field
    pub fn from_bank_status(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "paid" => PaymentStatus::Completed,
            "failed" | "cancelled" | "canceled" | "rejected" | "expired" => PaymentStatus::Failed,
            _ => PaymentStatus::Pending,
        }
    }

    pub fn is_final(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Completed => write!(f, "completed"),
            PaymentStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(PaymentStatus::Pending),
            "completed" => Ok(PaymentStatus::Completed),
            "failed" => Ok(PaymentStatus::Failed),
            _ => Err(format!("Unknown payment status: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_status_mapping() {
        assert_eq!(PaymentStatus::from_bank_status("Paid"), PaymentStatus::Completed);
        assert_eq!(PaymentStatus::from_bank_status("Failed"), PaymentStatus::Failed);
        assert_eq!(PaymentStatus::from_bank_status("Initiated"), PaymentStatus::Pending);
        assert_eq!(PaymentStatus::from_bank_status(""), PaymentStatus::Pending);
    }

    #[test]
    fn test_round_trip_through_display() {
        for status in [PaymentStatus::Pending, PaymentStatus::Completed, PaymentStatus::Failed] {
            assert_eq!(status.to_string().parse::<PaymentStatus>().unwrap(), status);
        }
    }
}

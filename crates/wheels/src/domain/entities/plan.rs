//! Featured listing plans

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::errors::DomainError;
use crate::domain::value_objects::Money;

/// A paid plan that features a listing for a number of days
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeaturedPlan {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Price in whole rupees
    pub price: i64,
    pub duration_days: u32,
    /// Higher sorts first in browse results
    pub priority_level: u32,
}

impl FeaturedPlan {
    fn new(
        id: &str,
        name: &str,
        description: &str,
        price: i64,
        duration_days: u32,
        priority_level: u32,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            price,
            duration_days,
            priority_level,
        }
    }

    /// All plans, cheapest first
    pub fn catalog() -> Vec<FeaturedPlan> {
        vec![
            Self::new(
                "basic",
                "Basic Feature",
                "Get your listing featured for 7 days",
                500,
                7,
                0,
            ),
            Self::new(
                "premium",
                "Premium Feature",
                "Get your listing featured for 15 days with priority placement",
                1000,
                15,
                1,
            ),
            Self::new(
                "platinum",
                "Platinum Feature",
                "Get your listing featured for 30 days with top placement and special badge",
                2000,
                30,
                2,
            ),
        ]
    }

    pub fn find(id: &str) -> Result<FeaturedPlan, DomainError> {
        Self::catalog()
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| DomainError::not_found("FeaturedPlan", id))
    }

    pub fn amount(&self) -> Result<Money, DomainError> {
        Money::from_major_units(self.price)
    }

    pub fn price_label(&self) -> String {
        format!("Rs. {}", self.price)
    }

    pub fn featured_until(&self, start: DateTime<Utc>) -> DateTime<Utc> {
        start + Duration::days(i64::from(self.duration_days))
    }
}

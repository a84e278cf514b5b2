//! Featured Plan Routes

use axum::{routing::get, Json, Router};

use wheels::FeaturedPlan;

use crate::AppState;

/// List featured listing plans, cheapest first
#[utoipa::path(
    get,
    path = "/api/payments/plans",
    responses(
        (status = 200, description = "Featured plans", body = Vec<FeaturedPlan>)
    ),
    tag = "Payments"
)]
pub async fn list_plans() -> Json<Vec<FeaturedPlan>> {
    Json(FeaturedPlan::catalog())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/payments/plans", get(list_plans))
}

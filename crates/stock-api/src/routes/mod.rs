//! REST API 라우트.

pub mod health;
pub mod stocks;

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::state::AppState;

pub use health::{health_check, HealthResponse};
pub use stocks::{
    stocks_router, DateRangeDto, PriceDto, PricesQuery, RangeQuery, SwingDto, SwingsQuery,
};

/// API 라우터 생성.
///
/// - `/health`
/// - `/api/stocks/*`
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/stocks", stocks_router())
}

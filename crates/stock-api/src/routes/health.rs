//! 헬스 체크 endpoint.

use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 헬스 체크 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// 항상 `ok`
    pub status: String,
}

/// 서버 생존 확인.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "서버 정상", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

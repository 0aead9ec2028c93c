//! API 에러 응답 타입.

use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use stock_data::DataError;
use tracing::error;
use utoipa::ToSchema;

/// API 에러 응답 본문.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// 안정적인 에러 코드 (예: `INVALID_TIMEFRAME`)
    pub code: String,
    /// 사람이 읽을 수 있는 메시지
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// 핸들러 결과 타입.
pub type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

/// 400 응답.
pub fn bad_request(code: &str, message: impl Into<String>) -> (StatusCode, Json<ApiError>) {
    (StatusCode::BAD_REQUEST, Json(ApiError::new(code, message)))
}

/// 저장소 조회 실패 → 502 응답.
pub fn data_fetch_error(err: DataError) -> (StatusCode, Json<ApiError>) {
    error!(error = %err, "가격 데이터 조회 실패");
    (
        StatusCode::BAD_GATEWAY,
        Json(ApiError::new(
            "DATA_FETCH_ERROR",
            format!("가격 데이터 조회 실패: {}", err),
        )),
    )
}

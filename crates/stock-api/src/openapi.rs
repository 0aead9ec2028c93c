//! OpenAPI 문서화 설정.
//!
//! utoipa를 사용하여 REST API의 OpenAPI 3.0 문서를 생성합니다.
//! Swagger UI는 `/swagger-ui` 경로에서 사용 가능합니다.
//!
//! 새로운 endpoint를 추가할 때:
//!
//! 1. 응답/요청 타입에 `#[derive(ToSchema)]` 추가
//! 2. 핸들러에 `#[utoipa::path(...)]` 어노테이션 추가
//! 3. 이 파일의 `components(schemas(...))` 및 `paths(...)` 섹션에 추가

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::error::ApiError;
use crate::routes::{health, stocks, DateRangeDto, HealthResponse, PriceDto, SwingDto};

// ==================== OpenAPI 정의 ====================

/// Stock Viewer API 문서.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Stock Viewer API",
        version = "0.3.0",
        description = r#"
저장된 주가 OHLCV 데이터 조회 API.

- 일봉은 저장된 값을 그대로 반환합니다.
- 주봉/월봉은 일봉에서 즉석 집계하며 `date`는 버킷 시작일(월요일/1일)입니다.
- 스윙 포인트는 `/prices`와 같은 캔들 시퀀스에서 계산합니다.
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "로컬 개발 서버"),
    ),
    tags(
        (name = "health", description = "헬스 체크 - 서버 상태 확인"),
        (name = "stocks", description = "주가 - 심볼, 캔들, 범위, 스윙 포인트 조회")
    ),
    // ==================== 스키마 등록 ====================
    components(
        schemas(
            HealthResponse,
            ApiError,
            PriceDto,
            DateRangeDto,
            SwingDto,
        )
    ),
    // ==================== 경로 등록 ====================
    paths(
        health::health_check,
        stocks::get_symbols,
        stocks::get_prices,
        stocks::get_range,
        stocks::get_swings,
    )
)]
pub struct ApiDoc;

// ==================== Swagger UI 라우터 ====================

/// Swagger UI 라우터 생성.
///
/// 다음 경로에 문서 UI를 마운트합니다:
/// - `/swagger-ui` - Swagger UI 대화형 문서
/// - `/api-docs/openapi.json` - OpenAPI JSON 문서
pub fn swagger_ui_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}

// ==================== 테스트 ====================

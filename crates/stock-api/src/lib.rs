//! Stock Viewer 조회 API.
//!
//! 수집기가 저장한 가격 데이터를 읽기 전용으로 제공합니다.
//!
//! - [`routes`]: `/health`, `/api/stocks/*` 핸들러
//! - [`openapi`]: OpenAPI 문서 및 Swagger UI
//! - [`config`]: 환경변수 기반 서버 설정

pub mod config;
pub mod error;
pub mod openapi;
pub mod routes;
pub mod state;
pub mod utils;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use state::AppState;

//! 도메인 에러 타입.

use thiserror::Error;

/// 도메인 계층 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 지원하지 않는 타임프레임 코드
    #[error("잘못된 타임프레임: '{0}' (허용: D, W, M)")]
    InvalidTimeframe(String),

    /// 불변식을 위반한 가격 행
    #[error("잘못된 가격 행 [{symbol} {date}]: {reason}")]
    InvalidRow {
        symbol: String,
        date: chrono::NaiveDate,
        reason: String,
    },
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CoreError>;

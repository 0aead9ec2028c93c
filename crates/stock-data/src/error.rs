//! 저장소 에러 타입.

use thiserror::Error;

/// 데이터 계층 에러.
#[derive(Debug, Error)]
pub enum DataError {
    /// DB 연결 실패
    #[error("DB 연결 실패: {0}")]
    ConnectionError(String),

    /// 조회 쿼리 실패
    #[error("조회 실패: {0}")]
    QueryError(String),

    /// 저장(트랜잭션) 실패
    #[error("저장 실패: {0}")]
    InsertError(String),

    /// 배치 내 불변식 위반 행 (배치 전체 거부)
    #[error("배치 거부: {0}")]
    InvalidRow(#[from] stock_core::CoreError),

    /// DB 레코드를 도메인 타입으로 변환 실패
    #[error("레코드 변환 실패: {0}")]
    InvalidRecord(String),
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, DataError>;

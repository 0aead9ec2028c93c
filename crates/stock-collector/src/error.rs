//! 에러 타입 정의.

use std::fmt;

use stock_data::DataError;
use stock_provider::{FetchError, ParseError};

/// Collector 에러 타입
///
/// `(symbol, timeframe)` 단위 실패는 해당 단위에서만 집계되고,
/// `Config`만 실행 전체를 중단합니다.
#[derive(Debug)]
pub enum CollectorError {
    /// 프로바이더 요청 실패 (재시도 소진 또는 요청 거부)
    Fetch(FetchError),
    /// 페이로드 정규화 실패
    Parse(ParseError),
    /// 저장소 에러 (배치 전체 롤백)
    Store(DataError),
    /// 설정 에러
    Config(String),
    /// 취소 신호로 실행하지 않은 단위
    Cancelled,
}

impl fmt::Display for CollectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch(e) => write!(f, "Fetch error: {}", e),
            Self::Parse(e) => write!(f, "Parse error: {}", e),
            Self::Store(e) => write!(f, "Store error: {}", e),
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl std::error::Error for CollectorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Fetch(e) => Some(e),
            Self::Parse(e) => Some(e),
            Self::Store(e) => Some(e),
            Self::Config(_) | Self::Cancelled => None,
        }
    }
}

impl From<FetchError> for CollectorError {
    fn from(err: FetchError) -> Self {
        Self::Fetch(err)
    }
}

impl From<ParseError> for CollectorError {
    fn from(err: ParseError) -> Self {
        Self::Parse(err)
    }
}

impl From<DataError> for CollectorError {
    fn from(err: DataError) -> Self {
        Self::Store(err)
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;

//! 프로바이더 에러 타입.

use thiserror::Error;

/// 시계열 요청 에러.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Rate limit (HTTP 429 또는 200 응답 본문의 안내 메시지)
    #[error("Rate limit 초과: {0}")]
    RateLimited(String),

    /// 네트워크/타임아웃 등 전송 계층 오류
    #[error("네트워크 오류: {0}")]
    Transport(String),

    /// 성공이 아닌 HTTP 상태
    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    /// 프로바이더가 거부한 요청 (잘못된 심볼/함수)
    #[error("잘못된 요청: {0}")]
    InvalidRequest(String),

    /// 재시도 예산 소진
    #[error("{attempts}회 시도 후 실패: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<FetchError>,
    },
}

impl FetchError {
    /// 재시도 가능한 에러인지 확인.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::RateLimited(_)
            | FetchError::Transport(_)
            | FetchError::HttpStatus { .. } => true,
            FetchError::InvalidRequest(_) | FetchError::Exhausted { .. } => false,
        }
    }

    /// Rate limit 에러인지 확인.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            FetchError::RateLimited(_) => true,
            FetchError::HttpStatus { status, .. } => *status == 429,
            FetchError::Exhausted { last, .. } => last.is_rate_limited(),
            _ => false,
        }
    }
}

/// 페이로드 정규화 에러.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON 문법 오류
    #[error("JSON 파싱 실패: {0}")]
    InvalidJson(String),

    /// 타임프레임별 시계열 섹션 없음
    #[error("시계열 섹션 없음: '{key}'")]
    MissingSeries { key: String },
}

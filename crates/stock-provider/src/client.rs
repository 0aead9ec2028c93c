//! Alpha Vantage 시계열 클라이언트.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use stock_core::Timeframe;
use tracing::{debug, instrument, warn};

use crate::error::FetchError;
use crate::payload::{function_name, ProviderPayload};
use crate::retry::{with_retry, RetryConfig};

/// 기본 API 엔드포인트.
pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";

// ============================================================================
// 데이터 소스 추상화
// ============================================================================

/// `(symbol, timeframe)` 단위로 원본 시계열 페이로드를 가져오는 소스.
///
/// 성공 시 파싱하지 않은 본문을 그대로 반환합니다.
#[async_trait]
pub trait TimeSeriesSource: Send + Sync {
    async fn fetch(&self, symbol: &str, timeframe: Timeframe) -> Result<String, FetchError>;
}

// ============================================================================
// 설정
// ============================================================================

/// Alpha Vantage 클라이언트 설정.
pub struct AlphaVantageConfig {
    pub api_key: SecretString,
    pub base_url: String,
    pub timeout: Duration,
    pub retry: RetryConfig,
}

impl std::fmt::Debug for AlphaVantageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlphaVantageConfig")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

impl AlphaVantageConfig {
    /// 기본 엔드포인트, 20초 타임아웃, 기본 재시도 설정.
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(20),
            retry: RetryConfig::default(),
        }
    }
}

// ============================================================================
// 클라이언트
// ============================================================================

/// Alpha Vantage REST 클라이언트.
pub struct AlphaVantageClient {
    client: Client,
    config: AlphaVantageConfig,
}

impl AlphaVantageClient {
    /// 새 클라이언트 생성.
    pub fn new(config: AlphaVantageConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// 재시도 없이 한 번 요청합니다.
    ///
    /// 응답 본문은 [`ProviderPayload`]로 분류해 rate limit/요청 거부를 에러로 바꿉니다.
    pub async fn fetch_once(&self, symbol: &str, timeframe: Timeframe) -> Result<String, FetchError> {
        let mut query: Vec<(&str, &str)> = vec![
            ("function", function_name(timeframe)),
            ("symbol", symbol),
            ("apikey", self.config.api_key.expose_secret()),
        ];
        if timeframe == Timeframe::Daily {
            query.push(("outputsize", "compact"));
        }

        let response = self
            .client
            .get(&self.config.base_url)
            .query(&query)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited(format!("HTTP {}", status.as_u16())));
        }
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("unknown").to_string(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.without_url().to_string()))?;

        match ProviderPayload::classify(&body) {
            ProviderPayload::Series => Ok(body),
            ProviderPayload::RateLimited(msg) => {
                debug!(symbol, timeframe = %timeframe, "응답 본문에 rate limit 안내 포함");
                Err(FetchError::RateLimited(msg))
            }
            ProviderPayload::Rejected(msg) => {
                warn!(symbol, timeframe = %timeframe, error = %msg, "프로바이더가 요청을 거부함");
                Err(FetchError::InvalidRequest(msg))
            }
        }
    }
}

#[async_trait]
impl TimeSeriesSource for AlphaVantageClient {
    #[instrument(skip(self))]
    async fn fetch(&self, symbol: &str, timeframe: Timeframe) -> Result<String, FetchError> {
        with_retry(&self.config.retry, || self.fetch_once(symbol, timeframe)).await
    }
}

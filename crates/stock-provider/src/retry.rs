//! 프로바이더 요청 재시도 유틸리티.
//!
//! Rate limit, 네트워크 오류 등 일시적인 오류에 대해 지수 백오프로 재시도합니다.
//! 시도는 항상 순차적이며 동시에 두 요청을 보내지 않습니다.
//!
//! # 예시
//!
//! ```rust,ignore
//! use stock_provider::retry::{with_retry, RetryConfig};
//!
//! let config = RetryConfig::with_max_retries(3);
//! let body = with_retry(&config, || client.fetch_once("AAPL", Timeframe::Daily)).await?;
//! ```

use std::{future::Future, time::Duration};

use tracing::{debug, warn};

use crate::FetchError;

/// 재시도 설정.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// 최대 재시도 횟수 (초기 시도 제외).
    pub max_retries: u32,
    /// 첫 재시도 전 대기 시간.
    pub base_delay: Duration,
    /// 최대 대기 시간.
    pub max_delay: Duration,
    /// 백오프 배수.
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// 기본 백오프(2초 시작, 30초 상한)에 재시도 횟수만 지정.
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// 재시도 없음 (단일 시도).
    pub fn no_retry() -> Self {
        Self::with_max_retries(0)
    }

    /// `attempt`번째 실패(1부터 시작) 후 대기 시간.
    ///
    /// 기본 설정에서 2s, 4s, 8s, 16s, 30s, 30s ...
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(63) as i32;
        let secs = self.base_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        Duration::from_secs_f64(secs)
    }
}

/// 재시도가 포함된 비동기 작업 실행.
///
/// # Returns
/// * `Ok(T)` - 작업 성공 결과
/// * `Err(e)` - 재시도 불가능한 에러는 그대로 반환
/// * `Err(FetchError::Exhausted)` - 재시도 예산 소진 시 마지막 에러를 감싸서 반환
pub async fn with_retry<T, F, Fut>(config: &RetryConfig, operation: F) -> Result<T, FetchError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt: u32 = 0;
    let mut total_delay = Duration::ZERO;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!(
                        attempts = attempt,
                        total_delay_ms = total_delay.as_millis() as u64,
                        "재시도 후 성공"
                    );
                }
                return Ok(result);
            }
            Err(e) => {
                // 파라미터 자체가 잘못된 요청은 재시도해도 결과가 같음
                if !e.is_retryable() {
                    debug!(error = %e, "재시도 불가능한 에러, 즉시 실패 반환");
                    return Err(e);
                }

                if attempt > config.max_retries {
                    warn!(
                        error = %e,
                        attempts = attempt,
                        max_retries = config.max_retries,
                        "최대 재시도 횟수 초과"
                    );
                    return Err(FetchError::Exhausted {
                        attempts: attempt,
                        last: Box::new(e),
                    });
                }

                let delay = config.delay_for(attempt);
                total_delay += delay;

                if e.is_rate_limited() {
                    warn!(
                        error = %e,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Rate limit 감지, 대기 후 재시도"
                    );
                } else {
                    warn!(
                        error = %e,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "요청 실패, 대기 후 재시도"
                    );
                }

                tokio::time::sleep(delay).await;
            }
        }
    }
}
